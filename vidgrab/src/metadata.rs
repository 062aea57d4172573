use serde::{Deserialize, Deserializer};
use serde_json::Value;

const UNKNOWN_TITLE: &str = "Unknown";
const NO_RESOLUTION: &str = "not available";

/// Subset of the library's info dict that is shown before downloading.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "duration", default, deserialize_with = "whole_seconds")]
    pub duration_seconds: u64,
    #[serde(default)]
    pub view_count: ViewCount,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ViewCount {
    Count(u64),
    Text(String),
    #[default]
    Missing,
    /// Anything else the library reports, shown as-is.
    Other(Value),
}

impl VideoMetadata {
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|x| !x.trim().is_empty())
            .unwrap_or(UNKNOWN_TITLE)
    }
}

fn whole_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Value::deserialize(deserializer)? {
        Value::Number(x) => x.as_f64(),
        Value::String(x) => x.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(seconds
        .filter(|x| x.is_finite() && *x > 0.0)
        .map_or(0, |x| x as u64))
}

pub fn format_duration(seconds: u64) -> String {
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

pub fn format_views(views: &ViewCount) -> String {
    match views {
        ViewCount::Count(x) => group_thousands(*x),
        ViewCount::Text(x) => match x.trim().parse::<u64>() {
            Ok(x) => group_thousands(x),
            Err(_) => x.to_owned(),
        },
        ViewCount::Missing => "0".to_owned(),
        ViewCount::Other(x) => x.to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    grouped
}

pub fn format_metadata(meta: &VideoMetadata) -> Vec<String> {
    let resolution = meta
        .resolution
        .as_deref()
        .filter(|x| !x.trim().is_empty())
        .unwrap_or(NO_RESOLUTION);

    vec![
        "--- VIDEO INFORMATION ---".to_owned(),
        String::new(),
        format!("Title: {}", meta.display_title()),
        format!("Duration: {}", format_duration(meta.duration_seconds)),
        format!("Views: {}", format_views(&meta.view_count)),
        format!("Resolution: {}", resolution),
        String::new(),
        "-".repeat(30),
    ]
}
