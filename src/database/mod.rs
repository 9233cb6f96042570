pub mod applications;
pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod users;

pub use applications::{ApplicationStore, PgApplicationRepository};
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{QueryDeadlines, RepositoryError, RepositoryResult};
pub use users::{PgUserRepository, UserStore};
