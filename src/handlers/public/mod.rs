// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and liveness. Everything here validates its own input
// because there is no trusted caller context.

pub mod auth;
pub mod health;

pub use health::health_get;
