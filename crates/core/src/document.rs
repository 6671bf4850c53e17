//! Document domain types.
//!
//! A [`DocumentDraft`] is what the source adapter produces from one input.
//! The document store turns drafts into [`DocumentRecord`]s by assigning each
//! a fresh [`DocumentId`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a document within one store. Assigned by the store,
/// strictly increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    /// Accepts both `doc-7` and `7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix("doc-").unwrap_or(s.trim());
        digits.parse().map(Self)
    }
}

/// Where a document came from. Drives preview and context formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Binary file persisted through the storage gateway
    File,
    /// URL reference, not fetched
    Url,
    /// Pasted text held inline
    Text,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::File => "file",
            Self::Url => "url",
            Self::Text => "text",
        };
        f.write_str(label)
    }
}

/// A normalized document that has not been admitted to a store yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    /// Display name (filename, URL host, or text label)
    pub name: String,

    /// Origin of the document
    pub kind: DocumentKind,

    /// MIME type, present for file documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Bytes charged against the store budget
    pub size_bytes: u64,

    /// Where the raw bytes live (storage locator or the URL itself)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,

    /// Literal text payload for text documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_content: Option<String>,
}

impl DocumentDraft {
    /// A file persisted at `locator`.
    pub fn file(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: DocumentKind::File,
            mime_type: Some(mime_type.into()),
            size_bytes,
            locator: Some(locator.into()),
            inline_content: None,
        }
    }

    /// A URL reference. Costs nothing against the budget until fetched.
    pub fn url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DocumentKind::Url,
            mime_type: None,
            size_bytes: 0,
            locator: Some(url.into()),
            inline_content: None,
        }
    }

    /// Pasted text. Size is the UTF-8 byte length of `text`.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: name.into(),
            kind: DocumentKind::Text,
            mime_type: None,
            size_bytes: text.len() as u64,
            locator: None,
            inline_content: Some(text),
        }
    }
}

/// A document admitted to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Store-assigned identifier
    pub id: DocumentId,

    /// Display name (filename, URL host, or text label)
    pub name: String,

    /// Origin of the document
    pub kind: DocumentKind,

    /// MIME type, present for file documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Bytes charged against the store budget
    pub size_bytes: u64,

    /// Where the raw bytes live (storage locator or the URL itself)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,

    /// Literal text payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_content: Option<String>,

    /// When the store admitted the document
    pub added_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Admit a draft under the given id.
    pub fn from_draft(id: DocumentId, draft: DocumentDraft) -> Self {
        Self {
            id,
            name: draft.name,
            kind: draft.kind,
            mime_type: draft.mime_type,
            size_bytes: draft.size_bytes,
            locator: draft.locator,
            inline_content: draft.inline_content,
            added_at: Utc::now(),
        }
    }

    /// What the assistant gets to see for this document: the inline
    /// content when present, otherwise the locator.
    pub fn descriptor(&self) -> &str {
        self.inline_content
            .as_deref()
            .or(self.locator.as_deref())
            .unwrap_or_default()
    }
}

/// Render a byte count for humans, base 1024: `0 Bytes`, `512 Bytes`,
/// `1.5 KB`, `2 MB`. At most two decimals, trailing zeros trimmed.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rendered, UNITS[unit])
}
