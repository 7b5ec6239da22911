//! Core message types for the fetch stage.
//!
//! One `FetchRequest` produces zero or more `ProgressEvent`s followed by
//! exactly one `FetchResult`, all correlated by the request's `RequestId`.
//! The terminal result is always the last message observed for an id.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::SeasonDataset;

/// Unique identifier correlating one fetch request to its progress events
/// and its single terminal result. No two in-flight requests share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        RequestId(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display only first 8 characters for readability in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        RequestId(uuid)
    }
}

impl std::ops::Deref for RequestId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// One season-dataset retrieval, immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Season whose runs should be downloaded
    pub season_id: u32,

    /// Optional period filter
    pub period_id: Option<u32>,

    /// Optional dungeon filter
    pub dungeon_id: Option<u32>,

    /// Optional cap on the number of runs returned
    pub limit: Option<u32>,

    /// Base URL of the dataset API (e.g. <https://api.example.com>)
    pub api_base_url: String,

    /// Correlation token assigned by the coordinator
    pub request_id: RequestId,
}

impl FetchRequest {
    /// Build the target URL for this request.
    ///
    /// Optional parameters are included in the query string only when
    /// present; when none are, the URL carries no `?` suffix.
    pub fn url(&self) -> String {
        let mut url = format!(
            "{}/meta/composition-data/{}",
            self.api_base_url, self.season_id
        );

        let mut query = Vec::new();
        if let Some(period_id) = self.period_id {
            query.push(format!("period_id={}", period_id));
        }
        if let Some(dungeon_id) = self.dungeon_id {
            query.push(format!("dungeon_id={}", dungeon_id));
        }
        if let Some(limit) = self.limit {
            query.push(format!("limit={}", limit));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        url
    }
}

/// Stage of a fetch, in lifecycle order.
///
/// Stage values within one request are monotonically non-decreasing:
/// `requesting(5) < downloading(15..85) < parsing(90) < finalizing(98)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStage {
    Requesting,
    Downloading,
    Parsing,
    Finalizing,
}

impl std::fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressStage::Requesting => write!(f, "requesting"),
            ProgressStage::Downloading => write!(f, "downloading"),
            ProgressStage::Parsing => write!(f, "parsing"),
            ProgressStage::Finalizing => write!(f, "finalizing"),
        }
    }
}

/// Throttled progress telemetry for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub request_id: RequestId,
    pub stage: ProgressStage,
    /// Percentage in [0, 100]
    pub progress: u8,
}

// Wire shape: {"type": "progress", "request_id": ..., "stage": ..., "progress": ...}
impl Serialize for ProgressEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProgressEvent", 4)?;
        state.serialize_field("type", "progress")?;
        state.serialize_field("request_id", &self.request_id)?;
        state.serialize_field("stage", &self.stage)?;
        state.serialize_field("progress", &self.progress)?;
        state.end()
    }
}

/// Outcome of one fetch: the parsed dataset, or a human-readable failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(SeasonDataset),
    Failure(String),
}

/// Terminal result of one fetch request. Exactly one is produced per
/// `request_id`, and it is always the last message for that id.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub request_id: RequestId,
    pub outcome: FetchOutcome,
}

// Wire shape: {"success": true, "request_id": ..., "season_data": ...}
//          or {"success": false, "request_id": ..., "error": ...}
impl Serialize for FetchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FetchResult", 3)?;
        match &self.outcome {
            FetchOutcome::Success(season_data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("request_id", &self.request_id)?;
                state.serialize_field("season_data", season_data)?;
            }
            FetchOutcome::Failure(error) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("request_id", &self.request_id)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// Item type of the fetch task's outbound channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FetchMessage {
    Progress(ProgressEvent),
    Result(FetchResult),
}

impl FetchMessage {
    /// The request this message belongs to.
    pub fn request_id(&self) -> RequestId {
        match self {
            FetchMessage::Progress(event) => event.request_id,
            FetchMessage::Result(result) => result.request_id,
        }
    }

    /// True for the terminal result message.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchMessage::Result(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(season_id: u32) -> FetchRequest {
        FetchRequest {
            season_id,
            period_id: None,
            dungeon_id: None,
            limit: None,
            api_base_url: "https://api.example.com".to_string(),
            request_id: RequestId::new(),
        }
    }

    #[test]
    fn test_url_without_optional_params_has_no_query() {
        let url = request(14).url();
        assert_eq!(url, "https://api.example.com/meta/composition-data/14");
        assert!(!url.contains('?'));
    }

    #[test]
    fn test_url_includes_only_present_params() {
        let mut req = request(14);
        req.period_id = Some(1001);
        req.limit = Some(500);
        assert_eq!(
            req.url(),
            "https://api.example.com/meta/composition-data/14?period_id=1001&limit=500"
        );
    }

    #[test]
    fn test_url_with_all_params() {
        let mut req = request(9);
        req.period_id = Some(1001);
        req.dungeon_id = Some(42);
        req.limit = Some(100);
        assert_eq!(
            req.url(),
            "https://api.example.com/meta/composition-data/9?period_id=1001&dungeon_id=42&limit=100"
        );
    }

    #[test]
    fn test_progress_event_wire_shape() {
        let id = RequestId::new();
        let event = ProgressEvent {
            request_id: id,
            stage: ProgressStage::Downloading,
            progress: 42,
        };
        let value = serde_json::to_value(FetchMessage::Progress(event)).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["stage"], "downloading");
        assert_eq!(value["progress"], 42);
        assert_eq!(value["request_id"], serde_json::json!(id.0));
    }

    #[test]
    fn test_failure_result_wire_shape() {
        let id = RequestId::new();
        let result = FetchResult {
            request_id: id,
            outcome: FetchOutcome::Failure("HTTP 404: Not Found".to_string()),
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "HTTP 404: Not Found");
        assert!(value.get("season_data").is_none());
    }

    #[test]
    fn test_stage_ordering() {
        assert!(ProgressStage::Requesting < ProgressStage::Downloading);
        assert!(ProgressStage::Downloading < ProgressStage::Parsing);
        assert!(ProgressStage::Parsing < ProgressStage::Finalizing);
    }
}
