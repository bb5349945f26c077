pub(in crate::route) mod request;
pub(in crate::route) mod response;

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::route::loan::request::{
    CheckoutRequest, DeleteLoanRequest, EndAccessRequest, LoanTransformer,
};
use crate::route::loan::response::LoanPresenter;
use crate::route::{ensure_admin, AdminQuery};
use application::service::{GetLoanService, HandleLoanService};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

pub trait LoanRouter {
    fn route_loan(self) -> Self;
}

impl LoanRouter for Router<AppModule> {
    fn route_loan(self) -> Self {
        self.route(
            "/loans",
            get(
                |State(module): State<AppModule>, Query(admin): Query<AdminQuery>| async move {
                    ensure_admin(&module, admin.requester_id).await?;
                    Controller::new(LoanTransformer, LoanPresenter)
                        .intake(())
                        .handle(|()| module.pgpool().all_loans())
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>, Json(req): Json<CheckoutRequest>| async move {
                    Controller::new(LoanTransformer, LoanPresenter)
                        .intake(req)
                        .handle(|dto| module.pgpool().checkout(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/active",
            get(
                |State(module): State<AppModule>, Query(admin): Query<AdminQuery>| async move {
                    ensure_admin(&module, admin.requester_id).await?;
                    Controller::new(LoanTransformer, LoanPresenter)
                        .intake(())
                        .handle(|()| module.pgpool().active_loans())
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/overdue",
            get(
                |State(module): State<AppModule>, Query(admin): Query<AdminQuery>| async move {
                    ensure_admin(&module, admin.requester_id).await?;
                    Controller::new(LoanTransformer, LoanPresenter)
                        .intake(())
                        .handle(|()| module.pgpool().overdue_loans())
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/:id/end",
            post(
                |State(module): State<AppModule>,
                 Path(id): Path<Uuid>,
                 Query(req): Query<EndAccessRequest>| async move {
                    Controller::new(LoanTransformer, LoanPresenter)
                        .intake((id, req))
                        .handle(|dto| module.pgpool().end_access(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/:id",
            axum::routing::delete(
                |State(module): State<AppModule>,
                 Path(id): Path<Uuid>,
                 Query(admin): Query<AdminQuery>| async move {
                    ensure_admin(&module, admin.requester_id).await?;
                    Controller::new(LoanTransformer, LoanPresenter)
                        .intake(DeleteLoanRequest::new(id))
                        .handle(|dto| module.pgpool().delete_loan(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
