mod request;
mod response;

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::route::loan::request::{LoanTransformer, UserLoansRequest};
use crate::route::loan::response::LoanPresenter;
use crate::route::user::request::{CreateUserRequest, UserTransformer};
use crate::route::user::response::UserPresenter;
use application::service::{GetLoanService, HandleUserService};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

pub trait UserRouter {
    fn route_user(self) -> Self;
}

impl UserRouter for Router<AppModule> {
    fn route_user(self) -> Self {
        self.route(
            "/users",
            post(
                |State(module): State<AppModule>, Json(req): Json<CreateUserRequest>| async move {
                    Controller::new(UserTransformer, UserPresenter)
                        .intake(req)
                        .handle(|dto| module.pgpool().create_user(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/users/:id/loans",
            get(
                |State(module): State<AppModule>, Path(id): Path<Uuid>| async move {
                    Controller::new(LoanTransformer, LoanPresenter)
                        .intake(UserLoansRequest::new(id))
                        .handle(|dto| module.pgpool().active_loans_for_user(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
