use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DueAt(OffsetDateTime);

impl DueAt {
    pub fn new(time: impl Into<OffsetDateTime>) -> Self {
        Self(time.into())
    }
}

impl AsRef<OffsetDateTime> for DueAt {
    fn as_ref(&self) -> &OffsetDateTime {
        &self.0
    }
}

impl From<DueAt> for OffsetDateTime {
    fn from(time: DueAt) -> Self {
        time.0
    }
}
