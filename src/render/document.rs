//! Ordered sections of accumulated Markdown.

/// Shown in a batch section that has no text yet.
pub const WAITING_PLACEHOLDER: &str = "_Waiting…_";

/// Inline failure marker.
pub fn error_markdown(message: &str) -> String {
    format!("**Error:** {}", message)
}

/// One unit of accumulated Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Display name; `None` for the single unnamed answer
    pub name: Option<String>,
    pub text: String,
}

/// The document painted on the answer surface.
///
/// A single-answer document has one unnamed section and composes to its
/// text. A batch document has one named section per input image and
/// composes each as a level-3 heading followed by its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDocument {
    sections: Vec<Section>,
    batch: bool,
}

impl RenderDocument {
    /// Single-answer document.
    pub fn single() -> Self {
        Self {
            sections: vec![Section {
                name: None,
                text: String::new(),
            }],
            batch: false,
        }
    }

    /// Batch document with one section per name, in order.
    ///
    /// Missing or blank names become `(image N)`, 1-based.
    pub fn batch<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let sections = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let name = name
                    .map(Into::into)
                    .filter(|n: &String| !n.trim().is_empty())
                    .unwrap_or_else(|| placeholder_name(i));
                Section {
                    name: Some(name),
                    text: String::new(),
                }
            })
            .collect();
        Self {
            sections,
            batch: true,
        }
    }

    pub fn is_batch(&self) -> bool {
        self.batch
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.sections.get(index).map(|s| s.text.as_str())
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.sections.get(index).and_then(|s| s.name.as_deref())
    }

    /// Append a fragment. Returns false when `index` is out of range.
    pub fn append(&mut self, index: usize, fragment: &str) -> bool {
        match self.sections.get_mut(index) {
            Some(section) => {
                section.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Overwrite a section's text. Returns false when `index` is out of range.
    pub fn replace(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.sections.get_mut(index) {
            Some(section) => {
                section.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Overwrite a section's text with an error marker.
    pub fn set_error(&mut self, index: usize, message: &str) -> bool {
        self.replace(index, error_markdown(message))
    }

    /// Correct a section's display name. Blank names are ignored.
    pub fn rename(&mut self, index: usize, name: &str) {
        if name.trim().is_empty() {
            return;
        }
        if let Some(section) = self.sections.get_mut(index) {
            section.name = Some(name.to_string());
        }
    }

    /// Compose the whole document as Markdown.
    pub fn to_markdown(&self) -> String {
        if !self.batch {
            return self
                .sections
                .first()
                .map(|s| s.text.clone())
                .unwrap_or_default();
        }

        self.sections
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let name = section
                    .name
                    .clone()
                    .unwrap_or_else(|| placeholder_name(i));
                let text = if section.text.is_empty() {
                    WAITING_PLACEHOLDER
                } else {
                    section.text.as_str()
                };
                format!("### {}\n\n{}", name, text)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn placeholder_name(index: usize) -> String {
    format!("(image {})", index + 1)
}
