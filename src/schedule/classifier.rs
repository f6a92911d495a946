// src/schedule/classifier.rs
use crate::config::{normalize, SegmentationConfig};

/// What a page's header says about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_schedule_page: bool,
    pub is_continuation: bool,
}

/// Marker matching on header text, case- and whitespace-insensitive.
///
/// Both flags are plain substring membership on the same normalized text;
/// neither implies nor excludes the other.
pub struct PageClassifier {
    schedule_marker: String,
    continuation_marker: String,
}

impl PageClassifier {
    pub fn new(cfg: &SegmentationConfig) -> Self {
        // Normalize again so hand-built configs behave like parsed ones.
        Self {
            schedule_marker: normalize(&cfg.schedule_marker),
            continuation_marker: normalize(&cfg.continuation_marker),
        }
    }

    pub fn classify(&self, header_text: &str) -> Classification {
        let normalized = normalize(header_text);
        if normalized.is_empty() {
            return Classification::default();
        }
        Classification {
            is_schedule_page: normalized.contains(&self.schedule_marker),
            is_continuation: normalized.contains(&self.continuation_marker),
        }
    }
}
