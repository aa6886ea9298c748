use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub type JobId = u64;

/// Job status as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportRef {
    pub id: u64,
}

/// Entry of a job's `tasks` array. Step-specific keys such as `chunks` are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /jobs/{id}`. Fields the monitor does not use are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobState,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reports: Vec<ReportRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<TaskRecord>,
}

impl JobRecord {
    pub fn new(id: JobId, status: JobState) -> Self {
        Self {
            id,
            status,
            progress: 0.0,
            started_at: None,
            reports: Vec::new(),
            tasks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {0} is already finished")]
    Conflict(JobId),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Errors the next poll tick may recover from.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Network(_) | GatewayError::HttpStatus(_) | GatewayError::Decode(_)
        )
    }
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 ones, which are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| {
        parse_timestamp(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {value:?}")))
    })
    .transpose()
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_server_job_payload() {
        let body = r#"{
            "id": 12,
            "name": "Report on tides",
            "type": "research",
            "status": "running",
            "user_id": 3,
            "progress": 33.5,
            "tasks": [
                {"step": "upload", "status": "completed", "path": "/tmp/a.pdf"},
                {"step": "index_document", "status": "completed", "chunks": 14},
                {"step": "extract_text", "status": "failed", "error": "unreadable pdf"}
            ],
            "created_at": "2026-03-01T11:59:00",
            "started_at": "2026-03-01T12:00:00.250000",
            "updated_at": "2026-03-01T12:01:00",
            "reports": [{"id": 99, "title": "Tides"}]
        }"#;

        let record: JobRecord = serde_json::from_str(body).unwrap();

        assert_eq!(record.id, 12);
        assert_eq!(record.status, JobState::Running);
        assert_eq!(record.progress, 33.5);
        assert_eq!(
            record.started_at,
            Some(
                Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
                    + chrono::Duration::milliseconds(250)
            )
        );
        assert_eq!(record.reports, vec![ReportRef { id: 99 }]);
        let steps: Vec<&str> = record.tasks.iter().map(|task| task.step.as_str()).collect();
        assert_eq!(steps, ["upload", "index_document", "extract_text"]);
        assert_eq!(record.tasks[2].error.as_deref(), Some("unreadable pdf"));
    }

    #[test]
    fn task_entries_tolerate_missing_keys() {
        let body = r#"{"id": 3, "status": "running", "tasks": [{"step": "save_file"}]}"#;
        let record: JobRecord = serde_json::from_str(body).unwrap();
        assert_eq!(
            record.tasks,
            vec![TaskRecord {
                step: "save_file".to_string(),
                status: None,
                progress: None,
                error: None,
            }]
        );
    }

    #[test]
    fn optional_fields_default() {
        let body = r#"{"id": 1, "status": "pending", "started_at": null, "reports": null, "tasks": null}"#;
        let record: JobRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record, JobRecord::new(1, JobState::Pending));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = serde_json::from_str::<JobRecord>(r#"{"id": 1, "status": "paused"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn timestamps_with_offsets_are_normalized() {
        assert_eq!(
            parse_timestamp("2026-03-01T14:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2026-03-01T12:00:00"),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
