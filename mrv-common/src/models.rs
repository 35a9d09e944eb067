//! Typed entity models
//!
//! Rows arrive from the backend as JSON objects. The `data` payloads are
//! modelled as explicit optional-field schemas: only the fields listed here
//! are consulted, unknown fields are ignored, and absent/null fields take the
//! documented default.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::gateway::Row;

pub const TABLE_MOVIES: &str = "movies";
pub const TABLE_REVIEWS: &str = "reviews";
pub const TABLE_WORKFLOW_EXECUTIONS: &str = "workflow_executions";
pub const TABLE_DIGESTS: &str = "digests";

/// Review as stored in the `reviews` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(deserialize_with = "id_string")]
    pub review_id: String,

    /// ems_id of the owning movie
    #[serde(deserialize_with = "id_string")]
    pub movie_id: String,

    #[serde(default, deserialize_with = "payload_or_default")]
    pub data: ReviewData,

    #[serde(default)]
    pub fetched_at: Option<String>,

    /// Workflow execution that produced this review
    #[serde(default, deserialize_with = "opt_id_string")]
    pub workflow_exec_id: Option<String>,
}

/// Review payload
///
/// Defaults: every string field is absent, `isTopCritic` is false. A field
/// holding the wrong JSON type reads as absent rather than rejecting the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewData {
    /// Primary source URL
    #[serde(deserialize_with = "lenient")]
    pub review_url: Option<String>,
    /// Fallback source URL, consulted when `reviewUrl` is absent or empty
    #[serde(deserialize_with = "lenient")]
    pub publication_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub publication_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub critic_name: Option<String>,
    #[serde(deserialize_with = "truthy_flag")]
    pub is_top_critic: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub creation_date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub quote: Option<String>,
    /// Score as published; free-form ("3/4", "B+", 8)
    pub original_score: Option<Value>,
}

impl ReviewData {
    /// Source URL: `reviewUrl`, then `publicationUrl`; empty strings count as absent
    pub fn source_url(&self) -> Option<&str> {
        non_empty(self.review_url.as_deref()).or_else(|| non_empty(self.publication_url.as_deref()))
    }

    pub fn publication_name(&self) -> Option<&str> {
        non_empty(self.publication_name.as_deref())
    }

    pub fn is_top_critic(&self) -> bool {
        self.is_top_critic.unwrap_or(false)
    }

    /// Parsed creation date, None when absent or unparseable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.creation_date.as_deref().and_then(parse_timestamp)
    }
}

/// Movie as stored in the `movies` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(deserialize_with = "id_string")]
    pub ems_id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "payload_or_default")]
    pub data: MovieData,

    #[serde(default)]
    pub fetched_at: Option<String>,

    #[serde(default, deserialize_with = "opt_id_string")]
    pub workflow_exec_id: Option<String>,
}

/// Movie payload; only the title is consulted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieData {
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
}

impl Movie {
    /// Column title, then payload title
    pub fn display_title(&self) -> Option<&str> {
        non_empty(self.title.as_deref()).or_else(|| non_empty(self.data.title.as_deref()))
    }
}

/// Workflow execution row (a batch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(deserialize_with = "id_string")]
    pub exec_id: String,

    pub workflow_id: String,

    #[serde(default)]
    pub timestamp: Option<String>,

    /// Set on sub-executions spawned by a parent execution
    #[serde(default, deserialize_with = "opt_id_string")]
    pub parent_exec_id: Option<String>,
}

impl Batch {
    pub fn is_parent(&self) -> bool {
        self.parent_exec_id.as_deref().map_or(true, str::is_empty)
    }

    /// Run date as YYYY-MM-DD (UTC), empty when the timestamp is unparseable
    pub fn run_date(&self) -> String {
        self.timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Per-topic digest row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    #[serde(deserialize_with = "id_string")]
    pub movie_id: String,

    pub topic: String,

    #[serde(default)]
    pub summary: String,
}

/// Digest topics in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    StoryScreenplay,
    Direction,
    ActingPerformance,
    CinematographyVisuals,
    MusicSoundDesign,
    EditingRhythm,
    ThemesSubtext,
    AudienceAppeal,
    BuzzCulturalReaction,
    OverallImpression,
}

impl Topic {
    pub const ALL: [Topic; 10] = [
        Topic::StoryScreenplay,
        Topic::Direction,
        Topic::ActingPerformance,
        Topic::CinematographyVisuals,
        Topic::MusicSoundDesign,
        Topic::EditingRhythm,
        Topic::ThemesSubtext,
        Topic::AudienceAppeal,
        Topic::BuzzCulturalReaction,
        Topic::OverallImpression,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Topic::StoryScreenplay => "story_screenplay",
            Topic::Direction => "direction",
            Topic::ActingPerformance => "acting_performance",
            Topic::CinematographyVisuals => "cinematography_visuals",
            Topic::MusicSoundDesign => "music_sound_design",
            Topic::EditingRhythm => "editing_rhythm",
            Topic::ThemesSubtext => "themes_subtext",
            Topic::AudienceAppeal => "audience_appeal",
            Topic::BuzzCulturalReaction => "buzz_cultural_reaction",
            Topic::OverallImpression => "overall_impression",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Topic::StoryScreenplay => "Story & Screenplay",
            Topic::Direction => "Direction",
            Topic::ActingPerformance => "Acting Performance",
            Topic::CinematographyVisuals => "Cinematography & Visuals",
            Topic::MusicSoundDesign => "Music & Sound Design",
            Topic::EditingRhythm => "Editing & Rhythm",
            Topic::ThemesSubtext => "Themes & Subtext",
            Topic::AudienceAppeal => "Audience Appeal",
            Topic::BuzzCulturalReaction => "Buzz & Cultural Reaction",
            Topic::OverallImpression => "Overall Impression",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

/// Ingestion workflow type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Movies,
    Reviews,
}

impl WorkflowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowKind::Movies => "movies",
            WorkflowKind::Reviews => "reviews",
        }
    }

    /// Table holding the records this workflow produces
    pub fn item_table(self) -> &'static str {
        match self {
            WorkflowKind::Movies => TABLE_MOVIES,
            WorkflowKind::Reviews => TABLE_REVIEWS,
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movies" => Ok(WorkflowKind::Movies),
            "reviews" => Ok(WorkflowKind::Reviews),
            other => Err(format!("Unknown workflow type: {}", other)),
        }
    }
}

/// Decode rows into typed entities, skipping rows that don't fit the schema
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(Value::Object(row)) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(table = %table, error = %e, "Skipping row that failed to decode");
                None
            }
        })
        .collect()
}

/// Parse backend timestamps (RFC 3339, naive date-time, or bare date) as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Identifiers may be stored as text or integers; normalize to text
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

/// Payload objects; null or a non-object payload reads as the default
fn payload_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Optional payload field; a value of the wrong type reads as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Boolean flags written by loosely typed producers
///
/// Strings other than "", "false" and "0" are true, numbers are true when
/// non-zero. Arrays and objects read as absent.
fn truthy_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => {
            let s = s.trim();
            Some(!(s.is_empty() || s.eq_ignore_ascii_case("false") || s == "0"))
        }
        Value::Number(n) => Some(n.as_f64().is_some_and(|n| n != 0.0)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_review_decodes_numeric_ids_and_null_data() {
        let reviews: Vec<Review> = decode_rows(
            TABLE_REVIEWS,
            vec![row(json!({"review_id": 42, "movie_id": "m1", "data": null}))],
        );
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_id, "42");
        assert_eq!(reviews[0].data, ReviewData::default());
        assert!(reviews[0].workflow_exec_id.is_none());
    }

    #[test]
    fn test_undecodable_rows_are_skipped() {
        let reviews: Vec<Review> = decode_rows(
            TABLE_REVIEWS,
            vec![
                row(json!({"movie_id": "m1"})),
                row(json!({"review_id": "r2", "movie_id": "m1"})),
            ],
        );
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_id, "r2");
    }

    #[test]
    fn test_source_url_falls_back_to_publication_url() {
        let data: ReviewData = serde_json::from_value(json!({
            "reviewUrl": "",
            "publicationUrl": "https://example.com/a",
            "isTopCritic": null
        }))
        .unwrap();
        assert_eq!(data.source_url(), Some("https://example.com/a"));
        assert!(!data.is_top_critic());
    }

    #[test]
    fn test_payload_type_drift_keeps_row() {
        let reviews: Vec<Review> = decode_rows(
            TABLE_REVIEWS,
            vec![
                row(json!({"review_id": "r1", "movie_id": "m1",
                    "data": {"reviewUrl": "https://nyt.com/a", "isTopCritic": "true"}})),
                row(json!({"review_id": "r2", "movie_id": "m1",
                    "data": {"reviewUrl": "https://nyt.com/b", "creationDate": 1700000000, "isTopCritic": 0}})),
                row(json!({"review_id": "r3", "movie_id": "m1",
                    "data": {"reviewUrl": ["https://nyt.com/c"], "publicationUrl": "https://nyt.com/c", "quote": 7}})),
                row(json!({"review_id": "r4", "movie_id": "m1", "data": "not an object"})),
            ],
        );
        assert_eq!(reviews.len(), 4);
        assert!(reviews[0].data.is_top_critic());
        assert_eq!(reviews[1].data.creation_date, None);
        assert_eq!(reviews[1].data.source_url(), Some("https://nyt.com/b"));
        assert!(!reviews[1].data.is_top_critic());
        assert_eq!(reviews[2].data.source_url(), Some("https://nyt.com/c"));
        assert_eq!(reviews[2].data.quote, None);
        assert_eq!(reviews[3].data, ReviewData::default());
    }

    #[test]
    fn test_movie_title_drift_keeps_row() {
        let movies: Vec<Movie> = decode_rows(
            TABLE_MOVIES,
            vec![row(json!({"ems_id": "m1", "title": "Heat", "data": {"title": 1995}}))],
        );
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].display_title(), Some("Heat"));
        assert_eq!(movies[0].data.title, None);
    }

    #[test]
    fn test_topic_order_and_lookup() {
        assert_eq!(Topic::ALL[0].key(), "story_screenplay");
        assert_eq!(Topic::ALL[9], Topic::OverallImpression);
        assert_eq!(Topic::from_key("direction"), Some(Topic::Direction));
        assert_eq!(Topic::from_key("trivia"), None);
        assert_eq!(Topic::MusicSoundDesign.label(), "Music & Sound Design");
    }

    #[test]
    fn test_batch_run_date_and_parent() {
        let batch = Batch {
            exec_id: "e1".to_string(),
            workflow_id: "wf".to_string(),
            timestamp: Some("2024-03-05T23:10:00+00:00".to_string()),
            parent_exec_id: None,
        };
        assert_eq!(batch.run_date(), "2024-03-05");
        assert!(batch.is_parent());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-01-02T03:04:05.123456+00:00").is_some());
        assert!(parse_timestamp("2024-01-02 03:04:05").is_some());
        assert!(parse_timestamp("2024-01-02").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_workflow_kind_parse() {
        assert_eq!("reviews".parse::<WorkflowKind>(), Ok(WorkflowKind::Reviews));
        assert!("batches".parse::<WorkflowKind>().is_err());
        assert_eq!(WorkflowKind::Movies.item_table(), "movies");
    }
}
