use crate::database::Transaction;
use crate::entity::{BookId, Loan, LoanId, UserId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait LoanQuery<Connection: Transaction>: Sync + Send + 'static {
    async fn find_by_id(
        &self,
        con: &mut Connection,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError>;

    /// The admission-control lookup: the at-most-one active loan a
    /// `(book, user)` pair may hold.
    async fn find_active_by_book_and_user(
        &self,
        con: &mut Connection,
        book_id: &BookId,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Loan>, KernelError>;

    async fn find_active_by_user(
        &self,
        con: &mut Connection,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<Loan>, KernelError>;

    async fn find_all(&self, con: &mut Connection) -> error_stack::Result<Vec<Loan>, KernelError>;

    async fn find_active(
        &self,
        con: &mut Connection,
    ) -> error_stack::Result<Vec<Loan>, KernelError>;

    /// Book with the highest historical checkout count, counting ended loans
    /// too. Ties break toward the lowest book id so the answer is stable.
    async fn most_borrowed(
        &self,
        con: &mut Connection,
    ) -> error_stack::Result<Option<(BookId, i64)>, KernelError>;
}

pub trait DependOnLoanQuery<Connection: Transaction>: Sync + Send + 'static {
    type LoanQuery: LoanQuery<Connection>;
    fn loan_query(&self) -> &Self::LoanQuery;
}
