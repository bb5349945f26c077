use time::OffsetDateTime;
use uuid::Uuid;

use kernel::prelude::entity::Loan;
use kernel::prelude::policy::LoanPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanDto {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub loaned_at: OffsetDateTime,
    pub due_at: OffsetDateTime,
    pub active: bool,
}

impl From<Loan> for LoanDto {
    fn from(loan: Loan) -> Self {
        Self {
            id: *loan.id().as_ref(),
            book_id: *loan.book_id().as_ref(),
            user_id: *loan.user_id().as_ref(),
            loaned_at: *loan.loaned_at().as_ref(),
            due_at: *loan.due_at().as_ref(),
            active: loan.is_active(),
        }
    }
}

/// Listing projection: a loan enriched with its book title and the
/// read-time overdue classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanViewDto {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_title: Option<String>,
    pub user_id: Uuid,
    pub loaned_at: OffsetDateTime,
    pub due_at: OffsetDateTime,
    pub overdue: bool,
}

impl LoanViewDto {
    pub(crate) fn project(
        loan: Loan,
        book_title: Option<String>,
        policy: &LoanPolicy,
        now: OffsetDateTime,
    ) -> Self {
        let overdue = policy.is_overdue(&loan, now);
        Self {
            id: *loan.id().as_ref(),
            book_id: *loan.book_id().as_ref(),
            book_title,
            user_id: *loan.user_id().as_ref(),
            loaned_at: *loan.loaned_at().as_ref(),
            due_at: *loan.due_at().as_ref(),
            overdue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAccessOutcome {
    Ended,
    /// The loan was already inactive; nothing changed. Distinguishable from
    /// success but not a failure.
    AlreadyInactive,
}

pub struct CheckoutDto {
    pub book_id: Uuid,
    pub user_id: Uuid,
}

pub struct EndAccessDto {
    pub loan_id: Uuid,
    pub requester_id: Uuid,
}

pub struct DeleteLoanDto {
    pub loan_id: Uuid,
}

pub struct GetActiveLoansDto {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardDto {
    pub total_books: i64,
    pub total_active_loans: i64,
    pub total_users: i64,
    /// `total_books - total_active_loans`. A rough signal, not an inventory
    /// count; unlimited-copy access has no real notion of a book being
    /// "taken".
    pub available_books: i64,
    pub due_within_three_days: i64,
    pub most_borrowed: Option<MostBorrowedDto>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MostBorrowedDto {
    pub book_id: Uuid,
    pub title: String,
    pub loan_count: i64,
}
