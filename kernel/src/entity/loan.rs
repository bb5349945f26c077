mod due_at;
mod id;
mod loaned_at;

pub use self::{due_at::*, id::*, loaned_at::*};
use crate::entity::{BookId, UserId};
use serde::{Deserialize, Serialize};

/// One record per checkout event. `active` flips to `false` exactly once and
/// never back; a renewed checkout is a new `Loan` with a fresh id.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    id: LoanId,
    book_id: BookId,
    user_id: UserId,
    loaned_at: LoanedAt,
    due_at: DueAt,
    active: bool,
}

impl Loan {
    pub fn new(
        id: LoanId,
        book_id: BookId,
        user_id: UserId,
        loaned_at: LoanedAt,
        due_at: DueAt,
        active: bool,
    ) -> Self {
        Self {
            id,
            book_id,
            user_id,
            loaned_at,
            due_at,
            active,
        }
    }

    pub fn id(&self) -> &LoanId {
        &self.id
    }

    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn loaned_at(&self) -> &LoanedAt {
        &self.loaned_at
    }

    pub fn due_at(&self) -> &DueAt {
        &self.due_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn into_ended(self) -> Self {
        Self {
            active: false,
            ..self
        }
    }
}
