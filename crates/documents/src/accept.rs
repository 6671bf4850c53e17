//! Which file types the adapter will take.

use ragdesk_config::DocumentsConfig;

/// A list of MIME patterns. `type/*` matches every subtype; anything else
/// must match exactly (case-insensitive, parameters ignored). An empty
/// policy accepts everything.
#[derive(Debug, Clone, Default)]
pub struct AcceptPolicy {
    patterns: Vec<String>,
}

impl AcceptPolicy {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.into().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Accept every MIME type.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self::new(config.accepted_mime_types.iter().cloned())
    }

    pub fn accepts(&self, mime_type: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        self.patterns.iter().any(|pattern| match pattern.strip_suffix("/*") {
            Some(top) => essence
                .split_once('/')
                .is_some_and(|(t, sub)| t == top && !sub.is_empty()),
            None => *pattern == essence,
        })
    }
}
