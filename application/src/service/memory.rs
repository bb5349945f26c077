//! In-memory stand-ins for the kernel interfaces, for service tests that
//! should run without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use error_stack::Report;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{BookQuery, LoanQuery, UserQuery};
use kernel::interface::query::{DependOnBookQuery, DependOnLoanQuery, DependOnUserQuery};
use kernel::interface::update::{BookModifier, LoanModifier, UserModifier};
use kernel::interface::update::{DependOnBookModifier, DependOnLoanModifier, DependOnUserModifier};
use kernel::prelude::entity::{Book, BookId, Loan, LoanId, User, UserId};
use kernel::prelude::policy::{DependOnLoanPolicy, LoanPolicy};
use kernel::KernelError;

#[derive(Default)]
struct MemoryState {
    books: HashMap<Uuid, Book>,
    users: HashMap<Uuid, User>,
    loans: Vec<Loan>,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    policy: LoanPolicy,
}

impl MemoryDatabase {
    pub(crate) fn seed_book(&self, book: Book) {
        self.state
            .lock()
            .unwrap()
            .books
            .insert(*book.id().as_ref(), book);
    }

    pub(crate) fn seed_user(&self, user: User) {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(*user.id().as_ref(), user);
    }

    pub(crate) fn seed_loan(&self, loan: Loan) {
        self.state.lock().unwrap().loans.push(loan);
    }

    pub(crate) fn loan(&self, id: &LoanId) -> Option<Loan> {
        self.state
            .lock()
            .unwrap()
            .loans
            .iter()
            .find(|loan| loan.id() == id)
            .cloned()
    }

    pub(crate) fn loan_count(&self) -> usize {
        self.state.lock().unwrap().loans.len()
    }
}

pub(crate) struct MemoryTransaction;

#[async_trait::async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl DatabaseConnection<MemoryTransaction> for MemoryDatabase {
    async fn transact(&self) -> error_stack::Result<MemoryTransaction, KernelError> {
        Ok(MemoryTransaction)
    }
}

#[async_trait::async_trait]
impl LoanQuery<MemoryTransaction> for MemoryDatabase {
    async fn find_by_id(
        &self,
        _con: &mut MemoryTransaction,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        Ok(self.loan(id))
    }

    async fn find_active_by_book_and_user(
        &self,
        _con: &mut MemoryTransaction,
        book_id: &BookId,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .loans
            .iter()
            .find(|loan| {
                loan.is_active() && loan.book_id() == book_id && loan.user_id() == user_id
            })
            .cloned())
    }

    async fn find_active_by_user(
        &self,
        _con: &mut MemoryTransaction,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .loans
            .iter()
            .filter(|loan| loan.is_active() && loan.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn find_all(
        &self,
        _con: &mut MemoryTransaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        Ok(self.state.lock().unwrap().loans.clone())
    }

    async fn find_active(
        &self,
        _con: &mut MemoryTransaction,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .loans
            .iter()
            .filter(|loan| loan.is_active())
            .cloned()
            .collect())
    }

    async fn most_borrowed(
        &self,
        _con: &mut MemoryTransaction,
    ) -> error_stack::Result<Option<(BookId, i64)>, KernelError> {
        let state = self.state.lock().unwrap();
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for loan in &state.loans {
            *counts.entry(*loan.book_id().as_ref()).or_insert(0) += 1;
        }
        // Highest count wins; equal counts fall back to the lowest book id.
        Ok(counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(id, count)| (BookId::new(id), count)))
    }
}

#[async_trait::async_trait]
impl LoanModifier<MemoryTransaction> for MemoryDatabase {
    async fn create(
        &self,
        _con: &mut MemoryTransaction,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError> {
        let mut state = self.state.lock().unwrap();
        // Mirrors the partial unique index of the real storage layer.
        let duplicate = loan.is_active()
            && state.loans.iter().any(|held| {
                held.is_active()
                    && held.book_id() == loan.book_id()
                    && held.user_id() == loan.user_id()
            });
        if duplicate {
            return Err(Report::new(KernelError::AlreadyActive));
        }
        state.loans.push(loan.clone());
        Ok(())
    }

    async fn end(
        &self,
        _con: &mut MemoryTransaction,
        id: &LoanId,
    ) -> error_stack::Result<(), KernelError> {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.loans.iter().position(|loan| loan.id() == id) {
            let ended = state.loans[pos].clone().into_ended();
            state.loans[pos] = ended;
        }
        Ok(())
    }

    async fn delete(
        &self,
        _con: &mut MemoryTransaction,
        id: &LoanId,
    ) -> error_stack::Result<(), KernelError> {
        self.state
            .lock()
            .unwrap()
            .loans
            .retain(|loan| loan.id() != id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl BookQuery<MemoryTransaction> for MemoryDatabase {
    async fn find_by_id(
        &self,
        _con: &mut MemoryTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        Ok(self.state.lock().unwrap().books.get(id.as_ref()).cloned())
    }

    async fn find_all(
        &self,
        _con: &mut MemoryTransaction,
        title_filter: Option<&str>,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .books
            .values()
            .filter(|book| match title_filter {
                Some(filter) => book
                    .title()
                    .as_ref()
                    .to_lowercase()
                    .contains(&filter.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn count(
        &self,
        _con: &mut MemoryTransaction,
    ) -> error_stack::Result<i64, KernelError> {
        Ok(self.state.lock().unwrap().books.len() as i64)
    }
}

#[async_trait::async_trait]
impl BookModifier<MemoryTransaction> for MemoryDatabase {
    async fn create(
        &self,
        _con: &mut MemoryTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        self.seed_book(book.clone());
        Ok(())
    }

    async fn delete(
        &self,
        _con: &mut MemoryTransaction,
        id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        self.state.lock().unwrap().books.remove(id.as_ref());
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserQuery<MemoryTransaction> for MemoryDatabase {
    async fn find_by_id(
        &self,
        _con: &mut MemoryTransaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        Ok(self.state.lock().unwrap().users.get(id.as_ref()).cloned())
    }

    async fn count(
        &self,
        _con: &mut MemoryTransaction,
    ) -> error_stack::Result<i64, KernelError> {
        Ok(self.state.lock().unwrap().users.len() as i64)
    }
}

#[async_trait::async_trait]
impl UserModifier<MemoryTransaction> for MemoryDatabase {
    async fn create(
        &self,
        _con: &mut MemoryTransaction,
        user: &User,
    ) -> error_stack::Result<(), KernelError> {
        self.seed_user(user.clone());
        Ok(())
    }

    async fn delete(
        &self,
        _con: &mut MemoryTransaction,
        id: &UserId,
    ) -> error_stack::Result<(), KernelError> {
        self.state.lock().unwrap().users.remove(id.as_ref());
        Ok(())
    }
}

impl DependOnLoanPolicy for MemoryDatabase {
    fn loan_policy(&self) -> &LoanPolicy {
        &self.policy
    }
}

impl DependOnLoanQuery<MemoryTransaction> for MemoryDatabase {
    type LoanQuery = Self;
    fn loan_query(&self) -> &Self {
        self
    }
}

impl DependOnLoanModifier<MemoryTransaction> for MemoryDatabase {
    type LoanModifier = Self;
    fn loan_modifier(&self) -> &Self {
        self
    }
}

impl DependOnBookQuery<MemoryTransaction> for MemoryDatabase {
    type BookQuery = Self;
    fn book_query(&self) -> &Self {
        self
    }
}

impl DependOnBookModifier<MemoryTransaction> for MemoryDatabase {
    type BookModifier = Self;
    fn book_modifier(&self) -> &Self {
        self
    }
}

impl DependOnUserQuery<MemoryTransaction> for MemoryDatabase {
    type UserQuery = Self;
    fn user_query(&self) -> &Self {
        self
    }
}

impl DependOnUserModifier<MemoryTransaction> for MemoryDatabase {
    type UserModifier = Self;
    fn user_modifier(&self) -> &Self {
        self
    }
}
