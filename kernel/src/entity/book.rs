mod id;
mod title;

pub use self::{id::*, title::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    title: BookTitle,
}

impl Book {
    pub fn new(id: BookId, title: BookTitle) -> Self {
        Self { id, title }
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn title(&self) -> &BookTitle {
        &self.title
    }

    pub fn into_title(self) -> BookTitle {
        self.title
    }
}
