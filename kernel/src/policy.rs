use time::{Duration, OffsetDateTime};

use crate::entity::{DueAt, Loan, LoanedAt};

pub const LOAN_PERIOD_DAYS: i64 = 14;
pub const DUE_SOON_DAYS: i64 = 3;

/// Pure decision rules for the loan lifecycle. No storage access; every
/// function is a function of its arguments and nothing else.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LoanPolicy {
    loan_period: Duration,
    due_soon_window: Duration,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period: Duration::days(LOAN_PERIOD_DAYS),
            due_soon_window: Duration::days(DUE_SOON_DAYS),
        }
    }
}

impl LoanPolicy {
    pub fn new(loan_period: Duration, due_soon_window: Duration) -> Self {
        Self {
            loan_period,
            due_soon_window,
        }
    }

    /// Expiry is a fixed offset from the checkout instant, not a calendar
    /// computation, so month boundaries and leap years need no special case.
    pub fn due_date(&self, loaned_at: &LoanedAt) -> DueAt {
        DueAt::new(*loaned_at.as_ref() + self.loan_period)
    }

    /// Sole admission rule: the pair may check out iff it holds no active
    /// loan. A different user holding the same book does not block; access
    /// is unlimited-copy digital, not physical inventory.
    pub fn admits(&self, held: Option<&Loan>) -> bool {
        !held.map_or(false, Loan::is_active)
    }

    /// Derived at read time against the caller's clock, never stored. Two
    /// reads with different clocks may disagree.
    pub fn is_overdue(&self, loan: &Loan, now: OffsetDateTime) -> bool {
        loan.is_active() && *loan.due_at().as_ref() < now
    }

    /// Active, not yet overdue, and expiring within the due-soon window.
    pub fn is_due_soon(&self, loan: &Loan, now: OffsetDateTime) -> bool {
        let due = *loan.due_at().as_ref();
        loan.is_active() && due >= now && due <= now + self.due_soon_window
    }
}

pub trait DependOnLoanPolicy: 'static + Sync + Send {
    fn loan_policy(&self) -> &LoanPolicy;
}

#[cfg(test)]
mod test {
    use time::macros::datetime;
    use time::Duration;
    use uuid::Uuid;

    use crate::entity::{BookId, DueAt, Loan, LoanId, LoanedAt, UserId};
    use crate::policy::LoanPolicy;

    fn loan(loaned_at: LoanedAt, due_at: DueAt, active: bool) -> Loan {
        Loan::new(
            LoanId::new(Uuid::new_v4()),
            BookId::new(Uuid::new_v4()),
            UserId::new(Uuid::new_v4()),
            loaned_at,
            due_at,
            active,
        )
    }

    #[test]
    fn due_date_is_exactly_fourteen_days() {
        let policy = LoanPolicy::default();
        let loaned_at = LoanedAt::new(datetime!(2024-02-20 12:00 UTC));

        let due = policy.due_date(&loaned_at);

        // Crosses 2024-02-29 without drifting.
        assert_eq!(*due.as_ref(), datetime!(2024-03-05 12:00 UTC));
        assert_eq!(
            *due.as_ref() - *loaned_at.as_ref(),
            Duration::days(14)
        );
    }

    #[test]
    fn due_date_crosses_year_boundary() {
        let policy = LoanPolicy::default();
        let loaned_at = LoanedAt::new(datetime!(2023-12-25 08:30 UTC));

        let due = policy.due_date(&loaned_at);

        assert_eq!(*due.as_ref(), datetime!(2024-01-08 08:30 UTC));
    }

    #[test]
    fn loan_period_is_configurable() {
        let policy = LoanPolicy::new(Duration::days(7), Duration::days(3));
        let loaned_at = LoanedAt::new(datetime!(2024-06-01 00:00 UTC));

        let due = policy.due_date(&loaned_at);

        assert_eq!(*due.as_ref(), datetime!(2024-06-08 00:00 UTC));
    }

    #[test]
    fn admits_when_pair_holds_nothing() {
        let policy = LoanPolicy::default();
        assert!(policy.admits(None));
    }

    #[test]
    fn rejects_when_pair_holds_active_loan() {
        let policy = LoanPolicy::default();
        let held = loan(
            LoanedAt::new(datetime!(2024-06-01 00:00 UTC)),
            DueAt::new(datetime!(2024-06-15 00:00 UTC)),
            true,
        );
        assert!(!policy.admits(Some(&held)));
    }

    #[test]
    fn ended_loan_does_not_block_admission() {
        let policy = LoanPolicy::default();
        let held = loan(
            LoanedAt::new(datetime!(2024-06-01 00:00 UTC)),
            DueAt::new(datetime!(2024-06-15 00:00 UTC)),
            false,
        );
        assert!(policy.admits(Some(&held)));
    }

    #[test]
    fn overdue_when_due_date_passed() {
        let policy = LoanPolicy::default();
        let subject = loan(
            LoanedAt::new(datetime!(2024-06-01 00:00 UTC)),
            DueAt::new(datetime!(2024-06-15 00:00 UTC)),
            true,
        );

        assert!(!policy.is_overdue(&subject, datetime!(2024-06-14 23:59 UTC)));
        assert!(policy.is_overdue(&subject, datetime!(2024-06-15 00:01 UTC)));
    }

    #[test]
    fn overdue_is_monotonic_while_active() {
        let policy = LoanPolicy::default();
        let subject = loan(
            LoanedAt::new(datetime!(2024-06-01 00:00 UTC)),
            DueAt::new(datetime!(2024-06-15 00:00 UTC)),
            true,
        );

        let t1 = datetime!(2024-06-16 00:00 UTC);
        let t2 = datetime!(2024-07-16 00:00 UTC);
        assert!(policy.is_overdue(&subject, t1));
        assert!(policy.is_overdue(&subject, t2));
    }

    #[test]
    fn ended_loan_is_never_overdue() {
        let policy = LoanPolicy::default();
        let subject = loan(
            LoanedAt::new(datetime!(2024-06-01 00:00 UTC)),
            DueAt::new(datetime!(2024-06-15 00:00 UTC)),
            false,
        );

        assert!(!policy.is_overdue(&subject, datetime!(2024-07-01 00:00 UTC)));
    }

    #[test]
    fn due_soon_window_edges() {
        let policy = LoanPolicy::default();
        let subject = loan(
            LoanedAt::new(datetime!(2024-06-01 00:00 UTC)),
            DueAt::new(datetime!(2024-06-15 00:00 UTC)),
            true,
        );

        // Inside the three-day window.
        assert!(policy.is_due_soon(&subject, datetime!(2024-06-13 00:00 UTC)));
        // Exactly on the edge.
        assert!(policy.is_due_soon(&subject, datetime!(2024-06-12 00:00 UTC)));
        // Too far out.
        assert!(!policy.is_due_soon(&subject, datetime!(2024-06-11 23:59 UTC)));
        // Already overdue loans are not "due soon".
        assert!(!policy.is_due_soon(&subject, datetime!(2024-06-15 00:01 UTC)));
    }
}
