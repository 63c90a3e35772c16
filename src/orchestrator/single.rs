//! Single-request actions.

use futures::StreamExt;

use super::{action_name, request_error, Orchestrator, Outcome, NO_IMAGE_MESSAGE};
use crate::api::{
    batch_image_form, prompt_body, single_image_form, BatchResponse, DescribeResponse, Endpoint,
};
use crate::config::BatchStrategy;
use crate::error::{ClientError, ClientResult};
use crate::ndjson::{event_stream, StreamEvent};
use crate::render::RenderDocument;
use crate::traits::{Headers, HttpClient, RequestBody};

impl<C: HttpClient> Orchestrator<C> {
    /// Stream an answer to the prompt from `/predict`.
    pub async fn run(&self) -> ClientResult<Outcome> {
        let Some(_guard) = self.session.try_begin("Generating") else {
            return Ok(Outcome::Skipped);
        };

        let prompt = self.session.prompt();
        tracing::info!("Generating answer ({} chars of prompt)", prompt.len());
        let result = self
            .stream_answer(Endpoint::Predict, prompt_body(&prompt))
            .await;
        self.settle(result)
    }

    /// Stream an answer, picking the endpoint from the selected files.
    ///
    /// Without files the prompt goes to `/predictstream`; one file goes to
    /// `/describeimagestream`; several files run as a batch using the
    /// configured strategy.
    pub async fn runstream(&self) -> ClientResult<Outcome> {
        let files = self.session.selected_files();
        if files.len() > 1 {
            return match self.config.batch_strategy {
                BatchStrategy::Sequential => self.describe_images_stream_batch().await,
                BatchStrategy::Server => self.describe_images_batch_stream().await,
            };
        }

        let (label, endpoint) = match files.first() {
            Some(_) => ("Describing image", Endpoint::DescribeImageStream),
            None => ("Generating", Endpoint::PredictStream),
        };
        let Some(_guard) = self.session.try_begin(label) else {
            return Ok(Outcome::Skipped);
        };

        let prompt = self.session.prompt();
        let body = match files.first() {
            Some(file) => RequestBody::Multipart(single_image_form(
                file,
                &prompt,
                self.config.max_new_tokens,
            )),
            None => prompt_body(&prompt),
        };

        tracing::info!("Streaming from {}", endpoint);
        let result = self.stream_answer(endpoint, body).await;
        self.settle(result)
    }

    /// Describe the first selected image with one buffered request.
    pub async fn describe_image(&self) -> ClientResult<Outcome> {
        if self.session.is_busy() {
            return Ok(Outcome::Skipped);
        }
        let files = self.session.selected_files();
        let Some(file) = files.first() else {
            self.session.alert(NO_IMAGE_MESSAGE);
            return Ok(Outcome::Skipped);
        };
        let Some(_guard) = self.session.try_begin("Describing image") else {
            return Ok(Outcome::Skipped);
        };

        let prompt = self.session.prompt();
        let body = RequestBody::Multipart(single_image_form(
            file,
            &prompt,
            self.config.max_new_tokens,
        ));
        tracing::info!("Describing {} ({} bytes)", file.name, file.len());

        let result: ClientResult<()> = async {
            let data: DescribeResponse = self.post_json(Endpoint::DescribeImage, body).await?;
            self.renderer.flush(&data.to_markdown());
            Ok(())
        }
        .await;
        self.settle(result)
    }

    /// Describe every selected image with one buffered batch request.
    pub async fn describe_images_batch(&self) -> ClientResult<Outcome> {
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

        let prompt = self.session.prompt();
        let body = RequestBody::Multipart(batch_image_form(
            &files,
            &prompt,
            self.config.max_new_tokens,
        ));
        tracing::info!("Describing {} images in one request", files.len());

        let result: ClientResult<()> = async {
            let data: BatchResponse = self.post_json(Endpoint::DescribeImageBatch, body).await?;

            let mut doc = RenderDocument::batch(files.iter().map(|f| Some(f.name.clone())));
            if data.results.len() != files.len() {
                tracing::warn!(
                    "Batch returned {} results for {} images",
                    data.results.len(),
                    files.len()
                );
            }
            for (index, item) in data.results.iter().enumerate().take(doc.len()) {
                if let Some(name) = item.filename.as_deref() {
                    doc.rename(index, name);
                }
                match item.error.as_deref().filter(|e| !e.is_empty()) {
                    Some(error) => doc.set_error(index, error),
                    None => doc.replace(index, item.response.clone().unwrap_or_default()),
                };
            }
            self.renderer.flush(&doc.to_markdown());
            Ok(())
        }
        .await;
        self.settle(result)
    }

    /// POST a buffered request and decode a JSON answer.
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: RequestBody,
    ) -> ClientResult<T> {
        let response = self
            .client
            .post(&self.url(endpoint), body, &Headers::new())
            .await?;
        if !response.is_success() {
            return Err(ClientError::status(
                action_name(endpoint),
                response.status,
                response.text(),
            ));
        }
        Ok(response.json()?)
    }

    /// Stream one answer into a single-section document.
    ///
    /// The spinner is hidden on the first fragment; the busy state lasts
    /// until the stream ends. An `error` event aborts.
    async fn stream_answer(&self, endpoint: Endpoint, body: RequestBody) -> ClientResult<()> {
        let response = self
            .client
            .post_stream(&self.url(endpoint), body, &Headers::new())
            .await
            .map_err(|e| request_error(action_name(endpoint), e))?;

        let mut doc = RenderDocument::single();
        let mut events = event_stream(response.body);
        let mut first_fragment = true;

        while let Some(value) = events.next().await {
            let event = StreamEvent::from_value(&value?);
            if let Some(message) = event.failure() {
                return Err(ClientError::backend(message));
            }
            if let Some(fragment) = event.fragment() {
                if first_fragment {
                    self.session.hide_spinner();
                    first_fragment = false;
                }
                doc.append(0, fragment);
                self.renderer.schedule(doc.to_markdown());
            }
        }

        self.renderer.flush(&doc.to_markdown());
        tracing::info!("Stream from {} complete", endpoint);
        Ok(())
    }

    /// Clear inputs on success, paint the error otherwise.
    fn settle(&self, result: ClientResult<()>) -> ClientResult<Outcome> {
        match result {
            Ok(()) => {
                self.session.clear_inputs();
                Ok(Outcome::Completed)
            }
            Err(err) => Err(self.fail(err)),
        }
    }
}
