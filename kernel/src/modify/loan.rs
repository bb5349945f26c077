use crate::database::Transaction;
use crate::entity::{Loan, LoanId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait LoanModifier<Connection: Transaction>: 'static + Sync + Send {
    /// Fails with `KernelError::AlreadyActive` when the pair already holds an
    /// active loan, no matter how the concurrent checkouts interleave.
    async fn create(
        &self,
        con: &mut Connection,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError>;

    /// Flips `active` off. The one state transition a loan ever makes.
    async fn end(&self, con: &mut Connection, id: &LoanId)
        -> error_stack::Result<(), KernelError>;

    async fn delete(
        &self,
        con: &mut Connection,
        id: &LoanId,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnLoanModifier<Connection: Transaction>: 'static + Sync + Send {
    type LoanModifier: LoanModifier<Connection>;
    fn loan_modifier(&self) -> &Self::LoanModifier;
}
