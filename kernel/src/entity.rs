mod book;
mod caller;
mod loan;
mod user;

pub use self::{book::*, caller::*, loan::*, user::*};
