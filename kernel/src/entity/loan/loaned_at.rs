use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanedAt(OffsetDateTime);

impl LoanedAt {
    pub fn new(time: impl Into<OffsetDateTime>) -> Self {
        Self(time.into())
    }
}

impl AsRef<OffsetDateTime> for LoanedAt {
    fn as_ref(&self) -> &OffsetDateTime {
        &self.0
    }
}

impl From<LoanedAt> for OffsetDateTime {
    fn from(time: LoanedAt) -> Self {
        time.0
    }
}
