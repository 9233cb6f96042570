// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here receives the caller as `Extension<AuthUser>`, injected
// by `jwt_auth_middleware`, and scopes all work to that user id.

pub mod applications;
pub mod auth;
