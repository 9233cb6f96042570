// handlers/protected/auth/mod.rs - caller identity endpoints

pub mod me;
pub mod verify;

pub use me::me_get;
pub use verify::verify_get;
