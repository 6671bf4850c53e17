//! Context assembly — what the assistant is allowed to know this turn.
//!
//! Every document becomes one entry `"<name>: <descriptor>"`, where the
//! descriptor is the inline content when present and the locator
//! otherwise. Entries are joined with `\n` in store order.
//!
//! # Bound
//!
//! The output never exceeds `max_chars` characters (Unicode scalar values).
//! When not everything fits, the longest prefix of entries that fits is
//! kept and a truncation marker is appended if there is room for it. An
//! entry is never cut mid-content, and a later entry is never included in
//! place of an earlier one that did not fit.
//!
//! # Determinism
//!
//! Identical records and bounds always produce identical output.

use ragdesk_config::ContextConfig;
use ragdesk_core::document::DocumentRecord;
use serde::{Deserialize, Serialize};

/// Marker appended after truncation. `{n}` is the number of omitted documents.
pub const DEFAULT_TRUNCATION_MARKER: &str = "[... {n} more document(s) omitted]";

/// The assembled context, ready for a backend call.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub metadata: AssemblyMetadata,
}

/// What made it into the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// Characters in the assembled text
    pub chars: usize,
    /// Configured bound
    pub max_chars: usize,
    /// Documents whose entry is in the text
    pub documents_included: usize,
    /// Documents offered
    pub documents_total: usize,
    /// Whether the truncation marker was appended
    pub marker_appended: bool,
}

impl AssemblyMetadata {
    pub fn documents_omitted(&self) -> usize {
        self.documents_total - self.documents_included
    }
}

/// The context assembler. Stateless, so one instance can be reused.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_chars: usize,
    truncation_marker: String,
}

impl ContextAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            truncation_marker: DEFAULT_TRUNCATION_MARKER.into(),
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.max_chars).with_truncation_marker(&config.truncation_marker)
    }

    pub fn with_truncation_marker(mut self, marker: impl Into<String>) -> Self {
        self.truncation_marker = marker.into();
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn assemble(&self, records: &[DocumentRecord]) -> AssembledContext {
        let mut text = String::new();
        let mut used = 0;
        let mut included = 0;

        for record in records {
            let entry = format_entry(record);
            let separator = usize::from(included > 0);
            let cost = separator + entry.chars().count();
            if used + cost > self.max_chars {
                break;
            }
            if separator == 1 {
                text.push('\n');
            }
            text.push_str(&entry);
            used += cost;
            included += 1;
        }

        let omitted = records.len() - included;
        let mut marker_appended = false;
        if omitted > 0 {
            let marker = self.truncation_marker.replace("{n}", &omitted.to_string());
            let separator = usize::from(included > 0);
            let cost = separator + marker.chars().count();
            if !marker.is_empty() && used + cost <= self.max_chars {
                if separator == 1 {
                    text.push('\n');
                }
                text.push_str(&marker);
                used += cost;
                marker_appended = true;
            }
        }

        AssembledContext {
            text,
            metadata: AssemblyMetadata {
                chars: used,
                max_chars: self.max_chars,
                documents_included: included,
                documents_total: records.len(),
                marker_appended,
            },
        }
    }
}

/// Assemble `records` into at most `max_chars` characters with the default marker.
pub fn assemble(records: &[DocumentRecord], max_chars: usize) -> String {
    ContextAssembler::new(max_chars).assemble(records).text
}

fn format_entry(record: &DocumentRecord) -> String {
    format!("{}: {}", record.name, record.descriptor())
}
