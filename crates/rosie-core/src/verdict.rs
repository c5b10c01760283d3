use serde::{Deserialize, Serialize};

/// Outcome of one classifier for one reimbursement.
///
/// Every classifier answers with this type. There is no numeric inlier/outlier
/// sign anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The reimbursement warrants human review.
    Flagged,
    NotFlagged,
}

impl Verdict {
    pub fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flagged => "flagged",
            Self::NotFlagged => "not_flagged",
        }
    }
}

impl From<bool> for Verdict {
    fn from(flagged: bool) -> Self {
        if flagged { Self::Flagged } else { Self::NotFlagged }
    }
}

/// Number of flagged verdicts.
pub fn count_flagged(verdicts: &[Verdict]) -> usize {
    verdicts.iter().filter(|v| v.is_flagged()).count()
}
