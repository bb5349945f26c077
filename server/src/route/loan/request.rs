use crate::controller::Intake;
use application::transfer::{CheckoutDto, DeleteLoanDto, EndAccessDto, GetActiveLoansDto};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    book_id: Uuid,
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EndAccessRequest {
    requester_id: Uuid,
}

#[derive(Debug)]
pub struct DeleteLoanRequest {
    loan_id: Uuid,
}

impl DeleteLoanRequest {
    pub fn new(loan_id: Uuid) -> Self {
        Self { loan_id }
    }
}

#[derive(Debug)]
pub struct UserLoansRequest {
    user_id: Uuid,
}

impl UserLoansRequest {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

pub struct LoanTransformer;

impl Intake<CheckoutRequest> for LoanTransformer {
    type To = CheckoutDto;
    fn emit(&self, CheckoutRequest { book_id, user_id }: CheckoutRequest) -> Self::To {
        Self::To { book_id, user_id }
    }
}

impl Intake<(Uuid, EndAccessRequest)> for LoanTransformer {
    type To = EndAccessDto;
    fn emit(&self, (loan_id, req): (Uuid, EndAccessRequest)) -> Self::To {
        Self::To {
            loan_id,
            requester_id: req.requester_id,
        }
    }
}

impl Intake<DeleteLoanRequest> for LoanTransformer {
    type To = DeleteLoanDto;
    fn emit(&self, req: DeleteLoanRequest) -> Self::To {
        Self::To {
            loan_id: req.loan_id,
        }
    }
}

impl Intake<UserLoansRequest> for LoanTransformer {
    type To = GetActiveLoansDto;
    fn emit(&self, req: UserLoansRequest) -> Self::To {
        Self::To {
            user_id: req.user_id,
        }
    }
}

impl Intake<()> for LoanTransformer {
    type To = ();
    fn emit(&self, input: ()) -> Self::To {
        input
    }
}
