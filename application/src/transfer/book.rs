use uuid::Uuid;

use kernel::prelude::entity::Book;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDto {
    pub id: Uuid,
    pub title: String,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: *book.id().as_ref(),
            title: book.into_title().into(),
        }
    }
}

pub struct GetBookDto {
    pub id: Uuid,
}

pub struct GetAllBooksDto {
    pub title: Option<String>,
}

pub struct CreateBookDto {
    pub title: String,
}

pub struct DeleteBookDto {
    pub id: Uuid,
}
