mod id;
mod is_admin;
mod name;

pub use self::{id::*, is_admin::*, name::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: UserName,
    admin: IsAdmin,
}

impl User {
    pub fn new(id: UserId, name: UserName, admin: IsAdmin) -> Self {
        Self { id, name, admin }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn admin(&self) -> IsAdmin {
        self.admin
    }
}
