//! Typed view over decoded stream values.

use serde_json::Value;

/// Value of the `type` field on batch stream events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Meta,
    Progress,
    Result,
    Done,
    Other(String),
}

impl EventKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "meta" => EventKind::Meta,
            "progress" => EventKind::Progress,
            "result" => EventKind::Result,
            "done" => EventKind::Done,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// One decoded stream event.
///
/// Extraction is lenient: fields with the wrong JSON type are treated as
/// absent, and a non-object value yields an empty event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamEvent {
    pub kind: Option<EventKind>,
    pub response: Option<String>,
    pub error: Option<String>,
    pub index: Option<usize>,
    pub filename: Option<String>,
    pub model: Option<String>,
    pub caption: Option<String>,
    pub count: Option<usize>,
}

impl StreamEvent {
    pub fn from_value(value: &Value) -> Self {
        let string = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let unsigned = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };

        Self {
            kind: value.get("type").and_then(Value::as_str).map(EventKind::parse),
            response: string("response"),
            error: string("error"),
            index: unsigned("index"),
            filename: string("filename"),
            model: string("model"),
            caption: string("caption"),
            count: unsigned("count"),
        }
    }

    /// Non-empty text fragment carried by this event.
    pub fn fragment(&self) -> Option<&str> {
        self.response.as_deref().filter(|s| !s.is_empty())
    }

    /// Non-empty failure marker carried by this event.
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is(&self, kind: &EventKind) -> bool {
        self.kind.as_ref() == Some(kind)
    }
}

impl From<&Value> for StreamEvent {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}
