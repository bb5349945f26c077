mod response;

use crate::controller::{Controller, Intake};
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::route::dashboard::response::DashboardPresenter;
use crate::route::{ensure_admin, AdminQuery};
use application::service::GetLoanService;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;

pub trait DashboardRouter {
    fn route_dashboard(self) -> Self;
}

pub struct DashboardTransformer;

impl Intake<()> for DashboardTransformer {
    type To = ();
    fn emit(&self, input: ()) -> Self::To {
        input
    }
}

impl DashboardRouter for Router<AppModule> {
    fn route_dashboard(self) -> Self {
        self.route(
            "/dashboard",
            get(
                |State(module): State<AppModule>, Query(admin): Query<AdminQuery>| async move {
                    ensure_admin(&module, admin.requester_id).await?;
                    Controller::new(DashboardTransformer, DashboardPresenter)
                        .intake(())
                        .handle(|()| module.pgpool().dashboard())
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
