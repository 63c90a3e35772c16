//! Multi-image streaming actions.
//!
//! Both strategies render one section per image, in input order. The
//! sequential strategy records any failure of one image inline and moves
//! on, whatever its category; the server-driven strategy aborts only when
//! its single request fails.

use futures::StreamExt;

use super::{action_name, request_error, Orchestrator, Outcome, NO_IMAGE_MESSAGE};
use crate::api::{batch_image_form, single_image_form, Endpoint, ImageFile};
use crate::error::{ClientError, ClientResult};
use crate::ndjson::{event_stream, EventKind, StreamEvent};
use crate::render::{error_markdown, RenderDocument};
use crate::traits::{Headers, HttpClient, RequestBody};

impl<C: HttpClient> Orchestrator<C> {
    /// Stream a description for each selected image, one request at a time.
    pub async fn describe_images_stream_batch(&self) -> ClientResult<Outcome> {
        if self.session.is_busy() {
            return Ok(Outcome::Skipped);
        }
        let files = self.session.selected_files();
        if files.is_empty() {
            self.session.alert(NO_IMAGE_MESSAGE);
            return Ok(Outcome::Skipped);
        }

        let mut doc = RenderDocument::batch(files.iter().map(|f| Some(f.name.clone())));
        let total = files.len();
        let Some(_guard) = self
            .session
            .try_begin(&Self::progress_label(0, total, &doc))
        else {
            return Ok(Outcome::Skipped);
        };

        tracing::info!("Describing {} images sequentially", total);
        let prompt = self.session.prompt();
        self.renderer.flush(&doc.to_markdown());

        let mut first_fragment = true;
        let mut failures = 0;
        for (index, file) in files.iter().enumerate() {
            self.session
                .set_status_base(&Self::progress_label(index, total, &doc));

            if let Err(err) = self
                .stream_section(&mut doc, index, file, &prompt, &mut first_fragment)
                .await
            {
                tracing::warn!(
                    "Image {} ({}) failed [{}]: {}",
                    index + 1,
                    file.name,
                    err.category(),
                    err
                );
                doc.set_error(index, &err.user_message());
                self.renderer.schedule(doc.to_markdown());
                failures += 1;
            }
        }

        self.renderer.flush(&doc.to_markdown());
        tracing::info!(
            "Sequential batch finished: {} ok, {} failed",
            total - failures,
            failures
        );
        if failures == 0 {
            self.session.clear_inputs();
        }
        Ok(Outcome::Completed)
    }

    /// Stream one image's description into its section.
    async fn stream_section(
        &self,
        doc: &mut RenderDocument,
        index: usize,
        file: &ImageFile,
        prompt: &str,
        first_fragment: &mut bool,
    ) -> ClientResult<()> {
        let endpoint = Endpoint::DescribeImageStream;
        let body = RequestBody::Multipart(single_image_form(
            file,
            prompt,
            self.config.max_new_tokens,
        ));
        let response = self
            .client
            .post_stream(&self.url(endpoint), body, &Headers::new())
            .await
            .map_err(|e| request_error(action_name(endpoint), e))?;

        let mut events = event_stream(response.body);
        while let Some(value) = events.next().await {
            let event = StreamEvent::from_value(&value?);
            if let Some(message) = event.failure() {
                return Err(ClientError::backend(message));
            }
            if let Some(fragment) = event.fragment() {
                if *first_fragment {
                    self.session.hide_spinner();
                    *first_fragment = false;
                }
                doc.append(index, fragment);
                self.renderer.schedule(doc.to_markdown());
            }
        }
        Ok(())
    }

    /// Send every selected image in one request and let the backend stream
    /// per-image progress and results.
    pub async fn describe_images_batch_stream(&self) -> ClientResult<Outcome> {
        if self.session.is_busy() {
            return Ok(Outcome::Skipped);
        }
        let files = self.session.selected_files();
        if files.is_empty() {
            self.session.alert(NO_IMAGE_MESSAGE);
            return Ok(Outcome::Skipped);
        }
        let Some(_guard) = self.session.try_begin("Describing images") else {
            return Ok(Outcome::Skipped);
        };

        tracing::info!("Describing {} images via batch stream", files.len());
        let prompt = self.session.prompt();
        let body = RequestBody::Multipart(batch_image_form(
            &files,
            &prompt,
            self.config.max_new_tokens,
        ));

        let mut doc = RenderDocument::batch(files.iter().map(|f| Some(f.name.clone())));
        self.renderer.flush(&doc.to_markdown());

        match self.consume_batch_stream(&mut doc, body).await {
            Ok(failures) => {
                self.renderer.flush(&doc.to_markdown());
                if failures == 0 {
                    self.session.clear_inputs();
                }
                Ok(Outcome::Completed)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Apply batch stream events to `doc`. Returns the number of failed
    /// results.
    async fn consume_batch_stream(
        &self,
        doc: &mut RenderDocument,
        body: RequestBody,
    ) -> ClientResult<usize> {
        let endpoint = Endpoint::DescribeImageBatchStream;
        let response = self
            .client
            .post_stream(&self.url(endpoint), body, &Headers::new())
            .await
            .map_err(|e| request_error(action_name(endpoint), e))?;

        let total = doc.len();
        let mut first_result = true;
        let mut failures = 0;
        let mut events = event_stream(response.body);

        while let Some(value) = events.next().await {
            let event = StreamEvent::from_value(&value?);
            let slot = event.index.filter(|&i| i < total);

            match &event.kind {
                Some(EventKind::Meta) => {
                    tracing::debug!(
                        "Batch meta: count={:?} model={:?}",
                        event.count,
                        event.model
                    );
                }
                Some(EventKind::Progress) => {
                    let Some(index) = slot else {
                        tracing::debug!("Dropping progress event with index {:?}", event.index);
                        continue;
                    };
                    if let Some(name) = event.filename.as_deref() {
                        doc.rename(index, name);
                    }
                    self.session
                        .set_status_base(&Self::progress_label(index, total, doc));
                }
                Some(EventKind::Result) => {
                    let Some(index) = slot else {
                        tracing::debug!("Dropping result event with index {:?}", event.index);
                        continue;
                    };
                    if first_result {
                        self.session.hide_spinner();
                        first_result = false;
                    }
                    if let Some(name) = event.filename.as_deref() {
                        doc.rename(index, name);
                    }
                    let text = match event.failure() {
                        Some(error) => {
                            failures += 1;
                            error_markdown(error)
                        }
                        None => event.response.clone().unwrap_or_default(),
                    };
                    doc.replace(index, text);
                    self.renderer.schedule(doc.to_markdown());
                }
                Some(EventKind::Done) => {
                    self.renderer.flush(&doc.to_markdown());
                }
                Some(EventKind::Other(kind)) => {
                    tracing::debug!("Ignoring batch event of type '{}'", kind);
                }
                None => {
                    if let Some(message) = event.failure() {
                        return Err(ClientError::backend(message));
                    }
                }
            }
        }

        Ok(failures)
    }
}
