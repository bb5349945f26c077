use crate::entity::{IsAdmin, Loan, UserId};

/// Identity of the party requesting an operation, resolved once at the
/// boundary and passed explicitly into every authorization-bearing call.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Caller {
    id: UserId,
    admin: IsAdmin,
}

impl Caller {
    pub fn new(id: UserId, admin: IsAdmin) -> Self {
        Self { id, admin }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn is_admin(&self) -> bool {
        self.admin.into()
    }

    /// A loan may be ended by its borrower or by an admin, nobody else.
    pub fn may_end(&self, loan: &Loan) -> bool {
        self.is_admin() || loan.user_id() == &self.id
    }
}

#[cfg(test)]
mod test {
    use crate::entity::{
        BookId, Caller, DueAt, IsAdmin, Loan, LoanId, LoanedAt, UserId,
    };
    use time::macros::datetime;
    use uuid::Uuid;

    fn loan_for(user_id: UserId) -> Loan {
        Loan::new(
            LoanId::new(Uuid::new_v4()),
            BookId::new(Uuid::new_v4()),
            user_id,
            LoanedAt::new(datetime!(2024-01-10 09:00 UTC)),
            DueAt::new(datetime!(2024-01-24 09:00 UTC)),
            true,
        )
    }

    #[test]
    fn owner_may_end_own_loan() {
        let user_id = UserId::new(Uuid::new_v4());
        let loan = loan_for(user_id.clone());
        let caller = Caller::new(user_id, IsAdmin::new(false));
        assert!(caller.may_end(&loan));
    }

    #[test]
    fn admin_may_end_any_loan() {
        let loan = loan_for(UserId::new(Uuid::new_v4()));
        let caller = Caller::new(UserId::new(Uuid::new_v4()), IsAdmin::new(true));
        assert!(caller.may_end(&loan));
    }

    #[test]
    fn stranger_may_not_end_loan() {
        let loan = loan_for(UserId::new(Uuid::new_v4()));
        let caller = Caller::new(UserId::new(Uuid::new_v4()), IsAdmin::new(false));
        assert!(!caller.may_end(&loan));
    }
}
