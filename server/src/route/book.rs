mod request;
mod response;

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::route::book::request::{
    BookTransformer, CreateBookRequest, DeleteBookRequest, GetAllBooksRequest, GetBookRequest,
};
use crate::route::book::response::{BookPresenter, BookResponse};
use crate::route::{ensure_admin, AdminQuery};
use application::service::{GetBookService, HandleBookService};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

pub trait BookRouter {
    fn route_book(self) -> Self;
}

impl BookRouter for Router<AppModule> {
    fn route_book(self) -> Self {
        self.route(
            "/books",
            get(
                |State(module): State<AppModule>, Query(req): Query<GetAllBooksRequest>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(req)
                        .handle(|dto| module.pgpool().get_all_books(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>,
                 Query(admin): Query<AdminQuery>,
                 Json(req): Json<CreateBookRequest>| async move {
                    ensure_admin(&module, admin.requester_id).await?;
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(req)
                        .handle(|dto| module.pgpool().create_book(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/books/:id",
            get(
                |State(module): State<AppModule>, Path(id): Path<Uuid>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(GetBookRequest::new(id))
                        .handle(|dto| module.pgpool().get_book(dto))
                        .await
                        .map_err(ErrorStatus::from)
                        .map(|res| {
                            res.map(BookResponse::into_response)
                                .unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
                        })
                },
            )
            .delete(
                |State(module): State<AppModule>,
                 Path(id): Path<Uuid>,
                 Query(admin): Query<AdminQuery>| async move {
                    ensure_admin(&module, admin.requester_id).await?;
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(DeleteBookRequest::new(id))
                        .handle(|dto| module.pgpool().delete_book(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
