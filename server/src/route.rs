use error_stack::Report;
use serde::Deserialize;
use uuid::Uuid;

use application::service::GetUserService;
use application::transfer::GetUserDto;
use kernel::KernelError;

use crate::error::ErrorStatus;
use crate::handler::AppModule;

mod book;
mod dashboard;
mod loan;
mod user;

pub use self::{book::*, dashboard::*, loan::*, user::*};

#[derive(Debug, Deserialize)]
pub(crate) struct AdminQuery {
    pub(crate) requester_id: Uuid,
}

/// Gate for the administrative surface. Loan-level authorization (owner or
/// admin may end access) lives inside the ledger operation itself; this only
/// keeps non-admins off the admin routes.
pub(crate) async fn ensure_admin(
    module: &AppModule,
    requester_id: Uuid,
) -> Result<(), ErrorStatus> {
    let user = module
        .pgpool()
        .get_user(GetUserDto { id: requester_id })
        .await
        .map_err(ErrorStatus::from)?;
    match user {
        Some(user) if user.admin => Ok(()),
        _ => Err(ErrorStatus::from(Report::new(KernelError::Unauthorized))),
    }
}
