use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetEntry {
    pub status: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub memo: Option<String>,
}

impl PresetEntry {
    pub fn memo_text(&self) -> &str {
        self.memo.as_deref().unwrap_or("")
    }
}

/// A named template of one or more segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub entries: Vec<PresetEntry>,
    /// Index into `entries` of the segment that picks the display color.
    #[serde(default)]
    pub representative_index: usize,
}

/// Preset with the colors the grid uses to draw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetView {
    #[serde(flatten)]
    pub preset: Preset,
    pub background_color: String,
    pub text_color: String,
}

/// An ad hoc composite preset kept by a planner for a limited time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryPreset {
    pub preset: Preset,
    pub created_at: DateTime<Utc>,
}
