use crate::controller::Intake;
use application::transfer::{CreateBookDto, DeleteBookDto, GetAllBooksDto, GetBookDto};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    title: String,
}

#[derive(Debug, Deserialize)]
pub struct GetAllBooksRequest {
    title: Option<String>,
}

#[derive(Debug)]
pub struct GetBookRequest {
    id: Uuid,
}

impl GetBookRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

#[derive(Debug)]
pub struct DeleteBookRequest {
    id: Uuid,
}

impl DeleteBookRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

pub struct BookTransformer;

impl Intake<CreateBookRequest> for BookTransformer {
    type To = CreateBookDto;
    fn emit(&self, input: CreateBookRequest) -> Self::To {
        Self::To { title: input.title }
    }
}

impl Intake<GetAllBooksRequest> for BookTransformer {
    type To = GetAllBooksDto;
    fn emit(&self, input: GetAllBooksRequest) -> Self::To {
        Self::To { title: input.title }
    }
}

impl Intake<GetBookRequest> for BookTransformer {
    type To = GetBookDto;
    fn emit(&self, input: GetBookRequest) -> Self::To {
        Self::To { id: input.id }
    }
}

impl Intake<DeleteBookRequest> for BookTransformer {
    type To = DeleteBookDto;
    fn emit(&self, input: DeleteBookRequest) -> Self::To {
        Self::To { id: input.id }
    }
}
