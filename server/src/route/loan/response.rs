use crate::controller::Exhaust;
use application::transfer::{EndAccessOutcome, LoanDto, LoanViewDto};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    id: Uuid,
    book_id: Uuid,
    user_id: Uuid,
    loaned_at: OffsetDateTime,
    due_at: OffsetDateTime,
    active: bool,
}

impl From<LoanDto> for LoanResponse {
    fn from(dto: LoanDto) -> Self {
        Self {
            id: dto.id,
            book_id: dto.book_id,
            user_id: dto.user_id,
            loaned_at: dto.loaned_at,
            due_at: dto.due_at,
            active: dto.active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckedOutResponse(LoanResponse);

impl IntoResponse for CheckedOutResponse {
    fn into_response(self) -> Response {
        (axum::http::StatusCode::CREATED, axum::Json(self.0)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct LoanViewResponse {
    id: Uuid,
    book_id: Uuid,
    book_title: Option<String>,
    user_id: Uuid,
    loaned_at: OffsetDateTime,
    due_at: OffsetDateTime,
    overdue: bool,
}

impl From<LoanViewDto> for LoanViewResponse {
    fn from(dto: LoanViewDto) -> Self {
        Self {
            id: dto.id,
            book_id: dto.book_id,
            book_title: dto.book_title,
            user_id: dto.user_id,
            loaned_at: dto.loaned_at,
            due_at: dto.due_at,
            overdue: dto.overdue,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EndAccessResponse {
    outcome: &'static str,
}

impl IntoResponse for EndAccessResponse {
    fn into_response(self) -> Response {
        (axum::http::StatusCode::OK, axum::Json(self)).into_response()
    }
}

pub struct LoanPresenter;

impl Exhaust<()> for LoanPresenter {
    type To = ();
    fn emit(&self, input: ()) -> Self::To {
        input
    }
}

impl Exhaust<LoanDto> for LoanPresenter {
    type To = CheckedOutResponse;
    fn emit(&self, input: LoanDto) -> Self::To {
        CheckedOutResponse(LoanResponse::from(input))
    }
}

impl Exhaust<Vec<LoanViewDto>> for LoanPresenter {
    type To = axum::Json<Vec<LoanViewResponse>>;
    fn emit(&self, input: Vec<LoanViewDto>) -> Self::To {
        axum::Json::from(
            input
                .into_iter()
                .map(LoanViewResponse::from)
                .collect::<Vec<_>>(),
        )
    }
}

impl Exhaust<EndAccessOutcome> for LoanPresenter {
    type To = EndAccessResponse;
    fn emit(&self, input: EndAccessOutcome) -> Self::To {
        EndAccessResponse {
            outcome: match input {
                EndAccessOutcome::Ended => "ended",
                EndAccessOutcome::AlreadyInactive => "already_inactive",
            },
        }
    }
}
