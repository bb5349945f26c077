use uuid::Uuid;

use kernel::prelude::entity::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub admin: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: *user.id().as_ref(),
            admin: user.admin().into(),
            name: String::from(user.name().as_ref()),
        }
    }
}

pub struct GetUserDto {
    pub id: Uuid,
}

pub struct CreateUserDto {
    pub name: String,
    pub admin: bool,
}
