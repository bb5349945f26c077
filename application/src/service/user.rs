use tracing::info;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{DependOnUserQuery, UserQuery};
use kernel::interface::update::{DependOnUserModifier, UserModifier};
use kernel::prelude::entity::{IsAdmin, User, UserId, UserName};
use kernel::KernelError;

use crate::transfer::{CreateUserDto, GetUserDto, UserDto};

#[async_trait::async_trait]
pub trait GetUserService<Connection: Transaction>:
    'static + Sync + Send + DependOnDatabaseConnection<Connection> + DependOnUserQuery<Connection>
{
    async fn get_user(&self, dto: GetUserDto) -> error_stack::Result<Option<UserDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let user = self
            .user_query()
            .find_by_id(&mut con, &UserId::new(dto.id))
            .await?;
        Ok(user.map(UserDto::from))
    }
}

impl<Connection: Transaction, T> GetUserService<Connection> for T where
    T: DependOnDatabaseConnection<Connection> + DependOnUserQuery<Connection>
{
}

#[async_trait::async_trait]
pub trait HandleUserService<Connection: Transaction>:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection<Connection>
    + DependOnUserModifier<Connection>
{
    async fn create_user(&self, dto: CreateUserDto) -> error_stack::Result<UserDto, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let user = User::new(
            UserId::new(Uuid::new_v4()),
            UserName::new(dto.name),
            IsAdmin::new(dto.admin),
        );
        self.user_modifier().create(&mut con, &user).await?;
        con.commit().await?;

        info!(user_id = %user.id().as_ref(), "user registered");
        Ok(UserDto::from(user))
    }
}

impl<Connection: Transaction, T> HandleUserService<Connection> for T where
    T: DependOnDatabaseConnection<Connection> + DependOnUserModifier<Connection>
{
}
