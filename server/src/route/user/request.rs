use crate::controller::Intake;
use application::transfer::CreateUserDto;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    name: String,
    #[serde(default)]
    admin: bool,
}

pub struct UserTransformer;

impl Intake<CreateUserRequest> for UserTransformer {
    type To = CreateUserDto;
    fn emit(&self, input: CreateUserRequest) -> Self::To {
        Self::To {
            name: input.name,
            admin: input.admin,
        }
    }
}
