//! Shape of the `content/toc` response.
//!
//! Fields below the top-level module list are read leniently: a value of the
//! wrong type reads as absent, and a list entry that is not an object is
//! dropped, so one odd topic cannot discard the rest of the course.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const ACTIVITY_FILE: i64 = 1;
pub const ACTIVITY_LINK: i64 = 2;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TocDocument {
    #[serde(default)]
    pub modules: Vec<TocModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TocModule {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<RichText>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub modules: Vec<TocModule>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub topics: Vec<TocTopic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TocTopic {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<RichText>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    /// A missing or non-integer value is treated as an unknown activity.
    #[serde(default, deserialize_with = "lenient")]
    pub activity_type: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RichText {
    #[serde(default, deserialize_with = "lenient")]
    pub html: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

impl TocModule {
    pub fn description_html(&self) -> Option<String> {
        self.description.as_ref().and_then(|d| d.html.clone())
    }
}

impl TocTopic {
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    pub fn description_html(&self) -> Option<String> {
        self.description.as_ref().and_then(|d| d.html.clone())
    }
}
