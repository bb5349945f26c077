use crate::controller::Exhaust;
use application::transfer::{DashboardDto, MostBorrowedDto};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    total_books: i64,
    total_active_loans: i64,
    total_users: i64,
    available_books: i64,
    due_within_three_days: i64,
    most_borrowed: Option<MostBorrowedResponse>,
}

#[derive(Debug, Serialize)]
pub struct MostBorrowedResponse {
    book_id: Uuid,
    title: String,
    loan_count: i64,
}

impl From<MostBorrowedDto> for MostBorrowedResponse {
    fn from(dto: MostBorrowedDto) -> Self {
        Self {
            book_id: dto.book_id,
            title: dto.title,
            loan_count: dto.loan_count,
        }
    }
}

impl From<DashboardDto> for DashboardResponse {
    fn from(dto: DashboardDto) -> Self {
        Self {
            total_books: dto.total_books,
            total_active_loans: dto.total_active_loans,
            total_users: dto.total_users,
            available_books: dto.available_books,
            due_within_three_days: dto.due_within_three_days,
            most_borrowed: dto.most_borrowed.map(MostBorrowedResponse::from),
        }
    }
}

impl IntoResponse for DashboardResponse {
    fn into_response(self) -> Response {
        (axum::http::StatusCode::OK, axum::Json(self)).into_response()
    }
}

pub struct DashboardPresenter;

impl Exhaust<DashboardDto> for DashboardPresenter {
    type To = DashboardResponse;
    fn emit(&self, input: DashboardDto) -> Self::To {
        DashboardResponse::from(input)
    }
}
