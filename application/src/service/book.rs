use error_stack::Report;
use tracing::info;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{BookQuery, DependOnBookQuery};
use kernel::interface::update::{BookModifier, DependOnBookModifier};
use kernel::prelude::entity::{Book, BookId, BookTitle};
use kernel::KernelError;

use crate::transfer::{BookDto, CreateBookDto, DeleteBookDto, GetAllBooksDto, GetBookDto};

#[async_trait::async_trait]
pub trait GetBookService<Connection: Transaction>:
    'static + Sync + Send + DependOnDatabaseConnection<Connection> + DependOnBookQuery<Connection>
{
    async fn get_book(&self, dto: GetBookDto) -> error_stack::Result<Option<BookDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let book = self
            .book_query()
            .find_by_id(&mut con, &BookId::new(dto.id))
            .await?;
        Ok(book.map(BookDto::from))
    }

    async fn get_all_books(
        &self,
        dto: GetAllBooksDto,
    ) -> error_stack::Result<Vec<BookDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let books = self
            .book_query()
            .find_all(&mut con, dto.title.as_deref())
            .await?;
        Ok(books.into_iter().map(BookDto::from).collect())
    }
}

impl<Connection: Transaction, T> GetBookService<Connection> for T where
    T: DependOnDatabaseConnection<Connection> + DependOnBookQuery<Connection>
{
}

#[async_trait::async_trait]
pub trait HandleBookService<Connection: Transaction>:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection<Connection>
    + DependOnBookQuery<Connection>
    + DependOnBookModifier<Connection>
{
    async fn create_book(&self, dto: CreateBookDto) -> error_stack::Result<BookDto, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let book = Book::new(BookId::new(Uuid::new_v4()), BookTitle::new(dto.title));
        self.book_modifier().create(&mut con, &book).await?;
        con.commit().await?;

        info!(book_id = %book.id().as_ref(), "book added to catalog");
        Ok(BookDto::from(book))
    }

    async fn delete_book(&self, dto: DeleteBookDto) -> error_stack::Result<(), KernelError> {
        let mut con = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        self.book_query()
            .find_by_id(&mut con, &id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound))?;

        self.book_modifier().delete(&mut con, &id).await?;
        con.commit().await?;

        info!(book_id = %dto.id, "book removed from catalog");
        Ok(())
    }
}

impl<Connection: Transaction, T> HandleBookService<Connection> for T where
    T: DependOnDatabaseConnection<Connection>
        + DependOnBookQuery<Connection>
        + DependOnBookModifier<Connection>
{
}
