pub mod application;
pub mod user;

pub use application::{Application, ApplicationChanges, ApplicationFilter, NewApplication};
pub use user::{NewUser, User, UserProfile};
