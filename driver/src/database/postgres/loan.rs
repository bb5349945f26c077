use error_stack::Report;
use sqlx::types::time::OffsetDateTime;
use sqlx::types::Uuid;
use sqlx::PgConnection;

use kernel::interface::query::LoanQuery;
use kernel::interface::update::LoanModifier;
use kernel::prelude::entity::{BookId, DueAt, Loan, LoanId, LoanedAt, UserId};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::ConvertError;

pub struct PostgresLoanRepository;

#[async_trait::async_trait]
impl LoanQuery<PostgresConnection> for PostgresLoanRepository {
    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        PgLoanInternal::find_by_id(con, id).await
    }

    async fn find_active_by_book_and_user(
        &self,
        con: &mut PostgresConnection,
        book_id: &BookId,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        PgLoanInternal::find_active_by_book_and_user(con, book_id, user_id).await
    }

    async fn find_active_by_user(
        &self,
        con: &mut PostgresConnection,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        PgLoanInternal::find_active_by_user(con, user_id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        PgLoanInternal::find_all(con).await
    }

    async fn find_active(
        &self,
        con: &mut PostgresConnection,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        PgLoanInternal::find_active(con).await
    }

    async fn most_borrowed(
        &self,
        con: &mut PostgresConnection,
    ) -> error_stack::Result<Option<(BookId, i64)>, KernelError> {
        PgLoanInternal::most_borrowed(con).await
    }
}

#[async_trait::async_trait]
impl LoanModifier<PostgresConnection> for PostgresLoanRepository {
    async fn create(
        &self,
        con: &mut PostgresConnection,
        loan: &Loan,
    ) -> error_stack::Result<(), KernelError> {
        PgLoanInternal::create(con, loan).await
    }

    async fn end(
        &self,
        con: &mut PostgresConnection,
        id: &LoanId,
    ) -> error_stack::Result<(), KernelError> {
        PgLoanInternal::end(con, id).await
    }

    async fn delete(
        &self,
        con: &mut PostgresConnection,
        id: &LoanId,
    ) -> error_stack::Result<(), KernelError> {
        PgLoanInternal::delete(con, id).await
    }
}

#[derive(sqlx::FromRow)]
struct LoanRow {
    id: Uuid,
    book_id: Uuid,
    user_id: Uuid,
    loaned_at: OffsetDateTime,
    due_at: OffsetDateTime,
    active: bool,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Loan::new(
            LoanId::new(row.id),
            BookId::new(row.book_id),
            UserId::new(row.user_id),
            LoanedAt::new(row.loaned_at),
            DueAt::new(row.due_at),
            row.active,
        )
    }
}

#[derive(sqlx::FromRow)]
struct BorrowCountRow {
    book_id: Uuid,
    loan_count: i64,
}

static UNIQUE_VIOLATION: &str = "23505";

pub(in crate::database) struct PgLoanInternal;

impl PgLoanInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &LoanId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        let row = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, user_id, loaned_at, due_at, active
            FROM loans
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Loan::from))
    }

    async fn find_active_by_book_and_user(
        con: &mut PgConnection,
        book_id: &BookId,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Loan>, KernelError> {
        let row = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, user_id, loaned_at, due_at, active
            FROM loans
            WHERE book_id = $1 AND user_id = $2 AND active
            "#,
        )
        .bind(book_id.as_ref())
        .bind(user_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Loan::from))
    }

    async fn find_active_by_user(
        con: &mut PgConnection,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<Loan>, KernelError> {
        let rows = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, user_id, loaned_at, due_at, active
            FROM loans
            WHERE user_id = $1 AND active
            ORDER BY loaned_at
            "#,
        )
        .bind(user_id.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Loan::from).collect())
    }

    async fn find_all(con: &mut PgConnection) -> error_stack::Result<Vec<Loan>, KernelError> {
        let rows = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, user_id, loaned_at, due_at, active
            FROM loans
            ORDER BY loaned_at
            "#,
        )
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Loan::from).collect())
    }

    async fn find_active(con: &mut PgConnection) -> error_stack::Result<Vec<Loan>, KernelError> {
        let rows = sqlx::query_as::<_, LoanRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, user_id, loaned_at, due_at, active
            FROM loans
            WHERE active
            ORDER BY loaned_at
            "#,
        )
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Loan::from).collect())
    }

    async fn most_borrowed(
        con: &mut PgConnection,
    ) -> error_stack::Result<Option<(BookId, i64)>, KernelError> {
        let row = sqlx::query_as::<_, BorrowCountRow>(
            // language=postgresql
            r#"
            SELECT book_id, COUNT(*) AS loan_count
            FROM loans
            GROUP BY book_id
            ORDER BY loan_count DESC, book_id
            LIMIT 1
            "#,
        )
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(|row| (BookId::new(row.book_id), row.loan_count)))
    }

    async fn create(con: &mut PgConnection, loan: &Loan) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO loans (id, book_id, user_id, loaned_at, due_at, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(loan.id().as_ref())
        .bind(loan.book_id().as_ref())
        .bind(loan.user_id().as_ref())
        .bind(loan.loaned_at().as_ref())
        .bind(loan.due_at().as_ref())
        .bind(loan.is_active())
        .execute(con)
        .await
        .map_err(|error| {
            // The partial unique index catches checkouts that interleave
            // between the admission check and this insert.
            let context = match &error {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    KernelError::AlreadyActive
                }
                _ => KernelError::Internal,
            };
            Report::from(error).change_context(context)
        })?;
        Ok(())
    }

    async fn end(con: &mut PgConnection, id: &LoanId) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            UPDATE loans
            SET active = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn delete(con: &mut PgConnection, id: &LoanId) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            DELETE FROM loans
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use kernel::interface::database::DatabaseConnection;
    use kernel::interface::query::LoanQuery;
    use kernel::interface::update::{BookModifier, LoanModifier, UserModifier};
    use kernel::prelude::entity::{
        Book, BookId, BookTitle, DueAt, IsAdmin, Loan, LoanId, LoanedAt, User, UserId, UserName,
    };
    use kernel::KernelError;

    use crate::database::postgres::{
        PostgresBookRepository, PostgresDatabase, PostgresLoanRepository, PostgresUserRepository,
    };

    fn fresh_loan(book_id: BookId, user_id: UserId) -> Loan {
        let loaned_at = OffsetDateTime::now_utc();
        Loan::new(
            LoanId::new(Uuid::new_v4()),
            book_id,
            user_id,
            LoanedAt::new(loaned_at),
            DueAt::new(loaned_at + Duration::days(14)),
            true,
        )
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn loan_round_trip() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        let mut con = db.transact().await?;

        let book_id = BookId::new(Uuid::new_v4());
        let book = Book::new(book_id.clone(), BookTitle::new("title".to_string()));
        PostgresBookRepository.create(&mut con, &book).await?;

        let user_id = UserId::new(Uuid::new_v4());
        let user = User::new(
            user_id.clone(),
            UserName::new("name".to_string()),
            IsAdmin::new(false),
        );
        PostgresUserRepository.create(&mut con, &user).await?;

        let loan = fresh_loan(book_id.clone(), user_id.clone());
        PostgresLoanRepository.create(&mut con, &loan).await?;

        let found = PostgresLoanRepository
            .find_active_by_book_and_user(&mut con, &book_id, &user_id)
            .await?;
        assert_eq!(found, Some(loan.clone()));

        PostgresLoanRepository.end(&mut con, loan.id()).await?;

        let found = PostgresLoanRepository
            .find_active_by_book_and_user(&mut con, &book_id, &user_id)
            .await?;
        assert!(found.is_none());

        let found = PostgresLoanRepository.find_by_id(&mut con, loan.id()).await?;
        assert_eq!(found.map(|l| l.is_active()), Some(false));

        PostgresLoanRepository.delete(&mut con, loan.id()).await?;
        let found = PostgresLoanRepository.find_by_id(&mut con, loan.id()).await?;
        assert!(found.is_none());

        // Dropped without commit; nothing sticks.
        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn duplicate_active_loan_is_rejected_by_index(
    ) -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        let mut con = db.transact().await?;

        let book_id = BookId::new(Uuid::new_v4());
        let book = Book::new(book_id.clone(), BookTitle::new("title".to_string()));
        PostgresBookRepository.create(&mut con, &book).await?;

        let user_id = UserId::new(Uuid::new_v4());
        let user = User::new(
            user_id.clone(),
            UserName::new("name".to_string()),
            IsAdmin::new(false),
        );
        PostgresUserRepository.create(&mut con, &user).await?;

        let first = fresh_loan(book_id.clone(), user_id.clone());
        PostgresLoanRepository.create(&mut con, &first).await?;

        let second = fresh_loan(book_id, user_id);
        let rejected = PostgresLoanRepository
            .create(&mut con, &second)
            .await
            .expect_err("second active loan for the pair must violate the index");
        assert!(matches!(
            rejected.current_context(),
            KernelError::AlreadyActive
        ));

        Ok(())
    }
}
