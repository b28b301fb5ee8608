//! Chart snapshot documents as stored on disk.
//!
//! Documents and entries keep their raw JSON objects so untouched keys, key order and
//! placeholder values round-trip unchanged. Metadata is read through accessors that apply
//! the presence rules and return `Option`, so callers never compare against placeholder text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder title written by the chart exporter for tracks it could not resolve.
pub const MISSING_TITLE: &str = "—";

const ENTRIES_KEY: &str = "entries";

/// Returns `true` when a stored string counts as a real value.
///
/// Empty strings, whitespace and the missing-title placeholder are all treated as absent.
pub fn is_present(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != MISSING_TITLE
}

fn present_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| is_present(s))
}

/// Entry fields that can be copied between snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataField {
    /// Cover art URL.
    ImageUrl,
    /// Canonical Spotify link.
    SpotifyUrl,
    /// Track title.
    Title,
    /// Ordered artist names.
    Artists,
}

impl MetadataField {
    /// JSON key used for this field inside an entry.
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::ImageUrl => "image_url",
            MetadataField::SpotifyUrl => "spotify_url",
            MetadataField::Title => "title",
            MetadataField::Artists => "artists",
        }
    }
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A present metadata value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Single string field (`title`, `image_url`, `spotify_url`).
    Text(String),
    /// List field (`artists`).
    List(Vec<String>),
}

impl FieldValue {
    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// One track's record within a weekly chart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartEntry {
    record: Map<String, Value>,
}

impl ChartEntry {
    /// Raw JSON object backing this entry.
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Stable external track identifier, if set.
    pub fn track_id(&self) -> Option<&str> {
        present_str(self.record.get("track_id"))
    }

    /// Rank within the snapshot.
    pub fn placement(&self) -> Option<i64> {
        self.record.get("placement").and_then(Value::as_i64)
    }

    /// Track title, `None` when empty or the missing-title placeholder.
    pub fn title(&self) -> Option<&str> {
        present_str(self.record.get("title"))
    }

    /// Artist names with blank and `"—"` names dropped; empty when unknown.
    ///
    /// Propagating artists writes this filtered list, never the placeholder names.
    pub fn artists(&self) -> Vec<&str> {
        self.record
            .get("artists")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|name| is_present(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cover art URL, `None` when empty or blank.
    pub fn image_url(&self) -> Option<&str> {
        present_str(self.record.get("image_url"))
    }

    /// Canonical Spotify link, `None` when empty or blank.
    pub fn spotify_url(&self) -> Option<&str> {
        present_str(self.record.get("spotify_url"))
    }

    /// Title for log lines.
    pub fn display_title(&self) -> &str {
        self.title().unwrap_or("Unknown")
    }

    /// Read a metadata field, returning `None` when it is absent.
    pub fn field(&self, field: MetadataField) -> Option<FieldValue> {
        match field {
            MetadataField::ImageUrl => self.image_url().map(|v| FieldValue::Text(v.to_string())),
            MetadataField::SpotifyUrl => {
                self.spotify_url().map(|v| FieldValue::Text(v.to_string()))
            }
            MetadataField::Title => self.title().map(|v| FieldValue::Text(v.to_string())),
            MetadataField::Artists => {
                let artists = self.artists();
                if artists.is_empty() {
                    None
                } else {
                    Some(FieldValue::List(
                        artists.into_iter().map(str::to_string).collect(),
                    ))
                }
            }
        }
    }

    /// Overwrite a metadata field. Existing keys keep their position in the record.
    pub fn set_field(&mut self, field: MetadataField, value: &FieldValue) {
        self.record.insert(field.key().to_string(), value.to_json());
    }

    /// Overwrite the title.
    pub fn set_title(&mut self, title: &str) {
        self.set_field(MetadataField::Title, &FieldValue::Text(title.to_string()));
    }

    /// Overwrite the artist list.
    pub fn set_artists(&mut self, artists: &[String]) {
        self.set_field(MetadataField::Artists, &FieldValue::List(artists.to_vec()));
    }

    /// Overwrite the Spotify link.
    pub fn set_spotify_url(&mut self, url: &str) {
        self.set_field(MetadataField::SpotifyUrl, &FieldValue::Text(url.to_string()));
    }
}

/// A weekly chart snapshot document.
///
/// Top-level keys other than `entries` are kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ChartDocument {
    header: Map<String, Value>,
    /// Chart rows in file order.
    pub entries: Vec<ChartEntry>,
}

impl ChartDocument {
    /// Week label stored in the document (e.g. `2026-W04`).
    pub fn week(&self) -> Option<&str> {
        self.header.get("week").and_then(Value::as_str)
    }
}

impl TryFrom<Map<String, Value>> for ChartDocument {
    type Error = serde_json::Error;

    fn try_from(mut header: Map<String, Value>) -> Result<Self, Self::Error> {
        let entries = match header.get_mut(ENTRIES_KEY) {
            Some(value) => serde_json::from_value(value.take())?,
            None => Vec::new(),
        };
        Ok(Self { header, entries })
    }
}

impl From<ChartDocument> for Map<String, Value> {
    fn from(doc: ChartDocument) -> Self {
        let ChartDocument { mut header, entries } = doc;
        if header.contains_key(ENTRIES_KEY) || !entries.is_empty() {
            let entries = entries
                .into_iter()
                .map(|entry| Value::Object(entry.record))
                .collect();
            header.insert(ENTRIES_KEY.to_string(), Value::Array(entries));
        }
        header
    }
}
