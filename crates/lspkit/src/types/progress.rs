//! Progress tokens, `$/progress` payloads and work-done progress values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROGRESS_METHOD: &str = "$/progress";
pub const WORK_DONE_PROGRESS_CREATE_METHOD: &str = "window/workDoneProgress/create";
pub const WORK_DONE_PROGRESS_CANCEL_METHOD: &str = "window/workDoneProgress/cancel";

/// Opaque correlation key supplied by the peer; never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressToken {
    Number(i64),
    String(String),
}

impl From<i64> for ProgressToken {
    fn from(n: i64) -> Self {
        ProgressToken::Number(n)
    }
}

impl From<&str> for ProgressToken {
    fn from(s: &str) -> Self {
        ProgressToken::String(s.to_string())
    }
}

impl std::fmt::Display for ProgressToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressToken::Number(n) => write!(f, "{n}"),
            ProgressToken::String(s) => write!(f, "{s}"),
        }
    }
}

/// Envelope of a `$/progress` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressParams {
    pub token: ProgressToken,
    pub value: Value,
}

impl ProgressParams {
    pub fn new<V: Serialize>(token: ProgressToken, value: &V) -> serde_json::Result<Self> {
        Ok(Self {
            token,
            value: serde_json::to_value(value)?,
        })
    }
}

/// Parameter shapes that may carry a token for partial results.
pub trait PartialParams {
    fn partial_token(&self) -> Option<&ProgressToken>;
}

/// Mixin for requests that accept a client-initiated work-done token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDoneProgressParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_done_token: Option<ProgressToken>,
}

impl PartialParams for WorkDoneProgressParams {
    fn partial_token(&self) -> Option<&ProgressToken> {
        self.work_done_token.as_ref()
    }
}

/// Mixin for requests that can stream partial results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialResultParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_result_token: Option<ProgressToken>,
}

impl PartialParams for PartialResultParams {
    fn partial_token(&self) -> Option<&ProgressToken> {
        self.partial_result_token.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDoneProgressOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_done_progress: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkDoneProgressCreateParams {
    pub token: ProgressToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkDoneProgressCancelParams {
    pub token: ProgressToken,
}

/// Work-done progress value, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkDoneProgress {
    Begin(WorkDoneProgressBegin),
    Report(WorkDoneProgressReport),
    End(WorkDoneProgressEnd),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDoneProgressBegin {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDoneProgressReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkDoneProgressEnd {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_accepts_string_and_number() {
        let a: ProgressToken = serde_json::from_value(json!(5)).unwrap();
        let b: ProgressToken = serde_json::from_value(json!("tok")).unwrap();
        assert_eq!(a, ProgressToken::Number(5));
        assert_eq!(b, ProgressToken::String("tok".to_string()));
    }

    #[test]
    fn test_work_done_kind_tag() {
        let begin = WorkDoneProgress::Begin(WorkDoneProgressBegin {
            title: "Indexing".to_string(),
            percentage: Some(0),
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(&begin).unwrap(),
            json!({"kind": "begin", "title": "Indexing", "percentage": 0})
        );

        let end: WorkDoneProgress = serde_json::from_value(json!({"kind": "end"})).unwrap();
        assert_eq!(end, WorkDoneProgress::End(WorkDoneProgressEnd::default()));
    }

    #[test]
    fn test_partial_result_token_mixin() {
        let params: PartialResultParams =
            serde_json::from_value(json!({"partialResultToken": "p-1"})).unwrap();
        assert_eq!(params.partial_token(), Some(&ProgressToken::from("p-1")));

        let empty = PartialResultParams::default();
        assert!(empty.partial_token().is_none());
    }
}
