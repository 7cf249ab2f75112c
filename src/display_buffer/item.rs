//! Display items flowing from the voice session into the transcript view.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields assigned by the buffer on acceptance; callers may not supply them.
pub(crate) const RESERVED_FIELDS: [&str; 2] = ["id", "timestamp"];

/// Error if caller metadata tries to set a buffer-assigned field.
pub(crate) fn check_reserved_fields(metadata: &Map<String, Value>) -> Result<(), String> {
    match RESERVED_FIELDS.iter().find(|field| metadata.contains_key(**field)) {
        Some(field) => Err(format!(
            "field '{}' is assigned by the display buffer and cannot be supplied",
            field
        )),
        None => Ok(()),
    }
}

/// Kind of content carried by a display item.
///
/// The buffer stores and deduplicates every kind the same way; only the
/// renderer interprets `content` differently (LaTeX for math, a description
/// or reference token for diagrams and images).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DisplayItemKind {
    Text,
    Math,
    Diagram,
    Image,
}

impl DisplayItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayItemKind::Text => "text",
            DisplayItemKind::Math => "math",
            DisplayItemKind::Diagram => "diagram",
            DisplayItemKind::Image => "image",
        }
    }
}

/// An item offered to the buffer. `id` and `timestamp` are assigned on
/// acceptance, so they are not part of the candidate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "CandidateFields")]
pub struct Candidate {
    #[serde(rename = "type")]
    pub kind: DisplayItemKind,
    pub content: String,
    pub speaker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Extra caller fields, passed through untouched
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct CandidateFields {
    #[serde(rename = "type")]
    kind: DisplayItemKind,
    content: String,
    speaker: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

impl TryFrom<CandidateFields> for Candidate {
    type Error = String;

    fn try_from(fields: CandidateFields) -> Result<Self, Self::Error> {
        check_reserved_fields(&fields.metadata)?;
        Ok(Self {
            kind: fields.kind,
            content: fields.content,
            speaker: fields.speaker,
            confidence: fields.confidence,
            metadata: fields.metadata,
        })
    }
}

impl Candidate {
    pub fn new(kind: DisplayItemKind, content: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            speaker: speaker.into(),
            confidence: None,
            metadata: Map::new(),
        }
    }

    pub fn text(content: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self::new(DisplayItemKind::Text, content, speaker)
    }

    pub fn math(content: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self::new(DisplayItemKind::Math, content, speaker)
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// An accepted item, as returned by `TranscriptDisplayBuffer::get_items`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DisplayItemKind,
    pub content: String,
    pub speaker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Acceptance time in Unix epoch milliseconds
    pub timestamp: u64,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl DisplayItem {
    pub(crate) fn accept(candidate: Candidate, id: String, timestamp: u64) -> Self {
        // Candidates built in code bypass deserialization checks
        let mut metadata = candidate.metadata;
        for field in RESERVED_FIELDS {
            metadata.remove(field);
        }

        Self {
            id,
            kind: candidate.kind,
            content: candidate.content,
            speaker: candidate.speaker,
            confidence: candidate.confidence,
            timestamp,
            metadata,
        }
    }
}
