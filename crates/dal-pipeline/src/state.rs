use std::fmt;
use std::time::Duration;

use dal_types::{Fingerprint, TxHash};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, PipelineError};

/// The working stages of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Storing,
    Anchoring,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Storing => "storing",
            Self::Anchoring => "anchoring",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a submission.
///
/// ```text
/// Idle -> Validating -> Storing -> Anchoring -> Succeeded
///              |            |           |
///              +------------+-----------+----> Failed
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    Storing,
    Anchoring,
    Succeeded {
        fingerprint: Fingerprint,
        tx_hash: TxHash,
    },
    Failed {
        kind: ErrorKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        fingerprint: Option<Fingerprint>,
    },
}

impl SubmissionState {
    pub fn failed(error: &PipelineError) -> Self {
        Self::Failed {
            kind: error.kind(),
            message: error.to_string(),
            fingerprint: error.stored_fingerprint().cloned(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Storing => "storing",
            Self::Anchoring => "anchoring",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether `next` directly follows this state. No transition skips a
    /// stage and terminal states have no successors.
    pub fn can_advance_to(&self, next: &SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Storing)
                | (Validating, Failed { .. })
                | (Storing, Anchoring)
                | (Storing, Failed { .. })
                | (Anchoring, Succeeded { .. })
                | (Anchoring, Failed { .. })
        )
    }
}

/// Wall-clock time spent in one stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> SubmissionState {
        SubmissionState::Failed {
            kind: ErrorKind::StoreUnavailable,
            message: "down".into(),
            fingerprint: None,
        }
    }

    fn succeeded() -> SubmissionState {
        SubmissionState::Succeeded {
            fingerprint: Fingerprint::from_content(b"x"),
            tx_hash: TxHash::from_hash([1; 32]),
        }
    }

    #[test]
    fn happy_path_transitions() {
        let path = [
            SubmissionState::Idle,
            SubmissionState::Validating,
            SubmissionState::Storing,
            SubmissionState::Anchoring,
            succeeded(),
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn no_stage_is_skipped() {
        assert!(!SubmissionState::Idle.can_advance_to(&SubmissionState::Storing));
        assert!(!SubmissionState::Validating.can_advance_to(&SubmissionState::Anchoring));
        assert!(!SubmissionState::Storing.can_advance_to(&succeeded()));
        assert!(!SubmissionState::Idle.can_advance_to(&failed()));
    }

    #[test]
    fn terminal_states_have_no_successors() {
        assert!(succeeded().is_terminal());
        assert!(failed().is_terminal());
        assert!(!succeeded().can_advance_to(&failed()));
        assert!(!failed().can_advance_to(&SubmissionState::Validating));
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_value(SubmissionState::Anchoring).unwrap();
        assert_eq!(json, serde_json::json!({"state": "anchoring"}));

        let json = serde_json::to_value(failed()).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["kind"], "StoreUnavailable");
        assert!(json.get("fingerprint").is_none());
    }
}
