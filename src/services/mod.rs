pub mod application_service;
pub mod user_service;

pub use application_service::{ApplicationOptions, ApplicationOptionsQuery, ApplicationService};
pub use user_service::{LoginRequest, RegisterRequest, UserService, UserServiceError};
