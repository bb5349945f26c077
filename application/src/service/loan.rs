use error_stack::Report;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{
    BookQuery, DependOnBookQuery, DependOnLoanQuery, DependOnUserQuery, LoanQuery, UserQuery,
};
use kernel::interface::update::{DependOnLoanModifier, LoanModifier};
use kernel::prelude::entity::{BookId, Caller, Loan, LoanId, LoanedAt, UserId};
use kernel::prelude::policy::{DependOnLoanPolicy, LoanPolicy};
use kernel::KernelError;

use crate::transfer::{
    CheckoutDto, DashboardDto, DeleteLoanDto, EndAccessDto, EndAccessOutcome, GetActiveLoansDto,
    LoanDto, LoanViewDto, MostBorrowedDto,
};

/// State-changing half of the loan ledger: checkout, end-access, delete.
/// Every method runs inside one transaction; an early return rolls back.
#[async_trait::async_trait]
pub trait HandleLoanService<Connection: Transaction>:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection<Connection>
    + DependOnLoanQuery<Connection>
    + DependOnLoanModifier<Connection>
    + DependOnBookQuery<Connection>
    + DependOnUserQuery<Connection>
    + DependOnLoanPolicy
{
    async fn checkout(&self, dto: CheckoutDto) -> error_stack::Result<LoanDto, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let book_id = BookId::new(dto.book_id);
        let user_id = UserId::new(dto.user_id);

        self.book_query()
            .find_by_id(&mut con, &book_id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound))?;
        self.user_query()
            .find_by_id(&mut con, &user_id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound))?;

        let held = self
            .loan_query()
            .find_active_by_book_and_user(&mut con, &book_id, &user_id)
            .await?;
        if !self.loan_policy().admits(held.as_ref()) {
            return Err(Report::new(KernelError::AlreadyActive));
        }

        let loaned_at = LoanedAt::new(OffsetDateTime::now_utc());
        let due_at = self.loan_policy().due_date(&loaned_at);
        let loan = Loan::new(
            LoanId::new(Uuid::new_v4()),
            book_id,
            user_id,
            loaned_at,
            due_at,
            true,
        );

        // The partial unique index turns a checkout race into AlreadyActive
        // here instead of letting both admission checks pass.
        self.loan_modifier().create(&mut con, &loan).await?;
        con.commit().await?;

        info!(
            loan_id = %loan.id().as_ref(),
            book_id = %dto.book_id,
            user_id = %dto.user_id,
            "book checked out"
        );
        Ok(LoanDto::from(loan))
    }

    async fn end_access(
        &self,
        dto: EndAccessDto,
    ) -> error_stack::Result<EndAccessOutcome, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let requester_id = UserId::new(dto.requester_id);
        let requester = self
            .user_query()
            .find_by_id(&mut con, &requester_id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound))?;
        let caller = Caller::new(requester_id, requester.admin());

        let loan_id = LoanId::new(dto.loan_id);
        let loan = self
            .loan_query()
            .find_by_id(&mut con, &loan_id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound))?;

        if !loan.is_active() {
            return Ok(EndAccessOutcome::AlreadyInactive);
        }
        if !caller.may_end(&loan) {
            return Err(Report::new(KernelError::Unauthorized));
        }

        self.loan_modifier().end(&mut con, &loan_id).await?;
        con.commit().await?;

        info!(loan_id = %dto.loan_id, requester_id = %dto.requester_id, "access ended");
        Ok(EndAccessOutcome::Ended)
    }

    /// Removes the record outright, active or not. Admin-only; the caller's
    /// authorization layer enforces that before we get here.
    async fn delete_loan(&self, dto: DeleteLoanDto) -> error_stack::Result<(), KernelError> {
        let mut con = self.database_connection().transact().await?;

        let loan_id = LoanId::new(dto.loan_id);
        self.loan_query()
            .find_by_id(&mut con, &loan_id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound))?;

        self.loan_modifier().delete(&mut con, &loan_id).await?;
        con.commit().await?;

        info!(loan_id = %dto.loan_id, "loan record deleted");
        Ok(())
    }
}

impl<Connection: Transaction, T> HandleLoanService<Connection> for T where
    T: DependOnDatabaseConnection<Connection>
        + DependOnLoanQuery<Connection>
        + DependOnLoanModifier<Connection>
        + DependOnBookQuery<Connection>
        + DependOnUserQuery<Connection>
        + DependOnLoanPolicy
{
}

/// Read-side projections over the ledger. Empty data yields empty lists and
/// zeroed summaries, never an error.
#[async_trait::async_trait]
pub trait GetLoanService<Connection: Transaction>:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection<Connection>
    + DependOnLoanQuery<Connection>
    + DependOnBookQuery<Connection>
    + DependOnUserQuery<Connection>
    + DependOnLoanPolicy
{
    async fn active_loans_for_user(
        &self,
        dto: GetActiveLoansDto,
    ) -> error_stack::Result<Vec<LoanViewDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let now = OffsetDateTime::now_utc();

        let user_id = UserId::new(dto.user_id);
        let loans = self
            .loan_query()
            .find_active_by_user(&mut con, &user_id)
            .await?;
        enrich(&mut con, self.book_query(), self.loan_policy(), loans, now).await
    }

    async fn all_loans(&self) -> error_stack::Result<Vec<LoanViewDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let now = OffsetDateTime::now_utc();

        let loans = self.loan_query().find_all(&mut con).await?;
        enrich(&mut con, self.book_query(), self.loan_policy(), loans, now).await
    }

    async fn active_loans(&self) -> error_stack::Result<Vec<LoanViewDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let now = OffsetDateTime::now_utc();

        let loans = self.loan_query().find_active(&mut con).await?;
        enrich(&mut con, self.book_query(), self.loan_policy(), loans, now).await
    }

    async fn overdue_loans(&self) -> error_stack::Result<Vec<LoanViewDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let now = OffsetDateTime::now_utc();

        let policy = self.loan_policy();
        let loans = self
            .loan_query()
            .find_active(&mut con)
            .await?
            .into_iter()
            .filter(|loan| policy.is_overdue(loan, now))
            .collect();
        enrich(&mut con, self.book_query(), policy, loans, now).await
    }

    async fn dashboard(&self) -> error_stack::Result<DashboardDto, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let now = OffsetDateTime::now_utc();

        let total_books = self.book_query().count(&mut con).await?;
        let total_users = self.user_query().count(&mut con).await?;

        let active = self.loan_query().find_active(&mut con).await?;
        let total_active_loans = active.len() as i64;
        let due_within_three_days = active
            .iter()
            .filter(|loan| self.loan_policy().is_due_soon(loan, now))
            .count() as i64;

        let most_borrowed = match self.loan_query().most_borrowed(&mut con).await? {
            Some((book_id, loan_count)) => self
                .book_query()
                .find_by_id(&mut con, &book_id)
                .await?
                .map(|book| MostBorrowedDto {
                    book_id: *book_id.as_ref(),
                    title: book.into_title().into(),
                    loan_count,
                }),
            None => None,
        };

        Ok(DashboardDto {
            total_books,
            total_active_loans,
            total_users,
            available_books: total_books - total_active_loans,
            due_within_three_days,
            most_borrowed,
        })
    }
}

impl<Connection: Transaction, T> GetLoanService<Connection> for T where
    T: DependOnDatabaseConnection<Connection>
        + DependOnLoanQuery<Connection>
        + DependOnBookQuery<Connection>
        + DependOnUserQuery<Connection>
        + DependOnLoanPolicy
{
}

/// Joins each loan with its book title for display. The title lives with the
/// catalog, so a row whose book has since vanished carries `None`.
async fn enrich<Connection, Q>(
    con: &mut Connection,
    books: &Q,
    policy: &LoanPolicy,
    loans: Vec<Loan>,
    now: OffsetDateTime,
) -> error_stack::Result<Vec<LoanViewDto>, KernelError>
where
    Connection: Transaction,
    Q: BookQuery<Connection>,
{
    let mut views = Vec::with_capacity(loans.len());
    for loan in loans {
        let title = books
            .find_by_id(con, loan.book_id())
            .await?
            .map(|book| String::from(book.into_title()));
        views.push(LoanViewDto::project(loan, title, policy, now));
    }
    Ok(views)
}

#[cfg(test)]
mod test {
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use kernel::prelude::entity::{
        Book, BookId, BookTitle, DueAt, IsAdmin, Loan, LoanId, LoanedAt, User, UserId, UserName,
    };
    use kernel::KernelError;

    use crate::service::memory::MemoryDatabase;
    use crate::service::{GetLoanService, HandleLoanService};
    use crate::transfer::{
        CheckoutDto, DeleteLoanDto, EndAccessDto, EndAccessOutcome, GetActiveLoansDto,
    };

    fn library() -> (MemoryDatabase, Uuid, Uuid) {
        let db = MemoryDatabase::default();
        let book_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        db.seed_book(Book::new(BookId::new(book_id), BookTitle::new("Dune")));
        db.seed_user(User::new(
            UserId::new(user_id),
            UserName::new("paul"),
            IsAdmin::new(false),
        ));
        (db, book_id, user_id)
    }

    fn seeded_loan(book_id: Uuid, user_id: Uuid, loaned_at: OffsetDateTime, active: bool) -> Loan {
        Loan::new(
            LoanId::new(Uuid::new_v4()),
            BookId::new(book_id),
            UserId::new(user_id),
            LoanedAt::new(loaned_at),
            DueAt::new(loaned_at + Duration::days(14)),
            active,
        )
    }

    #[tokio::test]
    async fn checkout_creates_active_loan_with_exact_due_date() {
        let (db, book_id, user_id) = library();

        let loan = db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();

        assert!(loan.active);
        assert_eq!(loan.book_id, book_id);
        assert_eq!(loan.user_id, user_id);
        assert_eq!(loan.due_at - loan.loaned_at, Duration::days(14));
    }

    #[tokio::test]
    async fn duplicate_checkout_is_rejected() {
        let (db, book_id, user_id) = library();

        db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();
        let rejected = db
            .checkout(CheckoutDto { book_id, user_id })
            .await
            .expect_err("second checkout of the same pair must fail");

        assert!(matches!(
            rejected.current_context(),
            KernelError::AlreadyActive
        ));
        assert_eq!(db.loan_count(), 1);
    }

    #[tokio::test]
    async fn same_book_is_admitted_for_a_different_user() {
        let (db, book_id, user_id) = library();
        let other_id = Uuid::new_v4();
        db.seed_user(User::new(
            UserId::new(other_id),
            UserName::new("chani"),
            IsAdmin::new(false),
        ));

        db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();
        db.checkout(CheckoutDto {
            book_id,
            user_id: other_id,
        })
        .await
        .unwrap();

        assert_eq!(db.loan_count(), 2);
    }

    #[tokio::test]
    async fn checkout_of_unknown_book_is_not_found() {
        let (db, _, user_id) = library();

        let rejected = db
            .checkout(CheckoutDto {
                book_id: Uuid::new_v4(),
                user_id,
            })
            .await
            .expect_err("unknown book must be rejected");

        assert!(matches!(rejected.current_context(), KernelError::NotFound));
    }

    #[tokio::test]
    async fn checkout_of_unknown_user_is_not_found() {
        let (db, book_id, _) = library();

        let rejected = db
            .checkout(CheckoutDto {
                book_id,
                user_id: Uuid::new_v4(),
            })
            .await
            .expect_err("unknown user must be rejected");

        assert!(matches!(rejected.current_context(), KernelError::NotFound));
    }

    #[tokio::test]
    async fn end_access_is_a_distinguishable_noop_the_second_time() {
        let (db, book_id, user_id) = library();
        let loan = db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();

        let first = db
            .end_access(EndAccessDto {
                loan_id: loan.id,
                requester_id: user_id,
            })
            .await
            .unwrap();
        let second = db
            .end_access(EndAccessDto {
                loan_id: loan.id,
                requester_id: user_id,
            })
            .await
            .unwrap();

        assert_eq!(first, EndAccessOutcome::Ended);
        assert_eq!(second, EndAccessOutcome::AlreadyInactive);
        assert_eq!(db.loan_count(), 1);
        assert!(!db.loan(&LoanId::new(loan.id)).unwrap().is_active());
    }

    #[tokio::test]
    async fn end_access_by_a_stranger_is_unauthorized() {
        let (db, book_id, user_id) = library();
        let stranger_id = Uuid::new_v4();
        db.seed_user(User::new(
            UserId::new(stranger_id),
            UserName::new("feyd"),
            IsAdmin::new(false),
        ));
        let loan = db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();

        let rejected = db
            .end_access(EndAccessDto {
                loan_id: loan.id,
                requester_id: stranger_id,
            })
            .await
            .expect_err("stranger must not end another user's loan");

        assert!(matches!(
            rejected.current_context(),
            KernelError::Unauthorized
        ));
        assert!(db.loan(&LoanId::new(loan.id)).unwrap().is_active());
    }

    #[tokio::test]
    async fn admin_force_end_allows_a_fresh_checkout() {
        let (db, book_id, user_id) = library();
        let admin_id = Uuid::new_v4();
        db.seed_user(User::new(
            UserId::new(admin_id),
            UserName::new("irulan"),
            IsAdmin::new(true),
        ));
        let first = db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();

        let outcome = db
            .end_access(EndAccessDto {
                loan_id: first.id,
                requester_id: admin_id,
            })
            .await
            .unwrap();
        assert_eq!(outcome, EndAccessOutcome::Ended);

        let second = db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(db.loan_count(), 2);
    }

    #[tokio::test]
    async fn end_access_of_unknown_loan_is_not_found() {
        let (db, _, user_id) = library();

        let rejected = db
            .end_access(EndAccessDto {
                loan_id: Uuid::new_v4(),
                requester_id: user_id,
            })
            .await
            .expect_err("unknown loan must be rejected");

        assert!(matches!(rejected.current_context(), KernelError::NotFound));
    }

    #[tokio::test]
    async fn end_access_by_unknown_requester_is_not_found() {
        let (db, book_id, user_id) = library();
        let loan = db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();

        let rejected = db
            .end_access(EndAccessDto {
                loan_id: loan.id,
                requester_id: Uuid::new_v4(),
            })
            .await
            .expect_err("unknown requester must be rejected");

        assert!(matches!(rejected.current_context(), KernelError::NotFound));
    }

    #[tokio::test]
    async fn delete_removes_the_record_regardless_of_state() {
        let (db, book_id, user_id) = library();
        let loan = db.checkout(CheckoutDto { book_id, user_id }).await.unwrap();

        db.delete_loan(DeleteLoanDto { loan_id: loan.id })
            .await
            .unwrap();

        assert_eq!(db.loan_count(), 0);
        assert!(db.all_loans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_of_unknown_loan_is_not_found() {
        let (db, _, _) = library();

        let rejected = db
            .delete_loan(DeleteLoanDto {
                loan_id: Uuid::new_v4(),
            })
            .await
            .expect_err("unknown loan must be rejected");

        assert!(matches!(rejected.current_context(), KernelError::NotFound));
    }

    #[tokio::test]
    async fn overdue_listing_follows_the_clock() {
        let (db, book_id, user_id) = library();
        let loan = seeded_loan(
            book_id,
            user_id,
            OffsetDateTime::now_utc() - Duration::days(15),
            true,
        );
        let loan_id = *loan.id().as_ref();
        db.seed_loan(loan);

        let overdue = db.overdue_loans().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, loan_id);
        assert!(overdue[0].overdue);
        assert_eq!(overdue[0].book_title.as_deref(), Some("Dune"));

        db.end_access(EndAccessDto {
            loan_id,
            requester_id: user_id,
        })
        .await
        .unwrap();

        assert!(db.overdue_loans().await.unwrap().is_empty());
        // The record itself survives for auditing.
        assert_eq!(db.all_loans().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn active_loans_for_user_are_overdue_annotated() {
        let (db, book_id, user_id) = library();
        let other_book = Uuid::new_v4();
        db.seed_book(Book::new(BookId::new(other_book), BookTitle::new("Hyperion")));

        let late = seeded_loan(
            book_id,
            user_id,
            OffsetDateTime::now_utc() - Duration::days(15),
            true,
        );
        let late_id = *late.id().as_ref();
        db.seed_loan(late);
        let current = db
            .checkout(CheckoutDto {
                book_id: other_book,
                user_id,
            })
            .await
            .unwrap();

        let views = db
            .active_loans_for_user(GetActiveLoansDto { user_id })
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        let late_view = views.iter().find(|view| view.id == late_id).unwrap();
        let current_view = views.iter().find(|view| view.id == current.id).unwrap();
        assert!(late_view.overdue);
        assert!(!current_view.overdue);
        assert_eq!(current_view.book_title.as_deref(), Some("Hyperion"));
    }

    #[tokio::test]
    async fn dashboard_reports_available_books() {
        let db = MemoryDatabase::default();
        let mut book_ids = Vec::new();
        for index in 0..10 {
            let id = Uuid::new_v4();
            db.seed_book(Book::new(
                BookId::new(id),
                BookTitle::new(format!("book {index}")),
            ));
            book_ids.push(id);
        }
        for book_id in book_ids.iter().take(3) {
            let user_id = Uuid::new_v4();
            db.seed_user(User::new(
                UserId::new(user_id),
                UserName::new("reader"),
                IsAdmin::new(false),
            ));
            db.checkout(CheckoutDto {
                book_id: *book_id,
                user_id,
            })
            .await
            .unwrap();
        }

        let summary = db.dashboard().await.unwrap();

        assert_eq!(summary.total_books, 10);
        assert_eq!(summary.total_active_loans, 3);
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.available_books, 7);
    }

    #[tokio::test]
    async fn dashboard_counts_loans_expiring_within_three_days() {
        let (db, book_id, user_id) = library();
        let now = OffsetDateTime::now_utc();

        // Due in two days: counted.
        db.seed_loan(seeded_loan(book_id, user_id, now - Duration::days(12), true));
        // Due in five days: not counted.
        db.seed_loan(seeded_loan(
            Uuid::new_v4(),
            user_id,
            now - Duration::days(9),
            true,
        ));
        // Already overdue: not counted.
        db.seed_loan(seeded_loan(
            Uuid::new_v4(),
            user_id,
            now - Duration::days(15),
            true,
        ));

        let summary = db.dashboard().await.unwrap();

        assert_eq!(summary.total_active_loans, 3);
        assert_eq!(summary.due_within_three_days, 1);
    }

    #[tokio::test]
    async fn most_borrowed_tie_breaks_toward_the_lowest_book_id() {
        let db = MemoryDatabase::default();
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        db.seed_book(Book::new(BookId::new(low), BookTitle::new("first")));
        db.seed_book(Book::new(BookId::new(high), BookTitle::new("second")));

        let reader = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        // Two historical loans each, all ended; history still counts.
        for book_id in [low, high, low, high] {
            db.seed_loan(seeded_loan(book_id, reader, now - Duration::days(30), false));
        }

        let summary = db.dashboard().await.unwrap();

        let most_borrowed = summary.most_borrowed.unwrap();
        assert_eq!(most_borrowed.book_id, low);
        assert_eq!(most_borrowed.title, "first");
        assert_eq!(most_borrowed.loan_count, 2);
    }

    #[tokio::test]
    async fn empty_library_yields_a_zeroed_dashboard() {
        let db = MemoryDatabase::default();

        let summary = db.dashboard().await.unwrap();

        assert_eq!(summary.total_books, 0);
        assert_eq!(summary.total_active_loans, 0);
        assert_eq!(summary.total_users, 0);
        assert_eq!(summary.available_books, 0);
        assert_eq!(summary.due_within_three_days, 0);
        assert!(summary.most_borrowed.is_none());
        assert!(db.all_loans().await.unwrap().is_empty());
    }
}
