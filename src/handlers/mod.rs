pub mod admin;
pub mod auth;
pub mod complaint;
pub mod export;
pub mod health;

pub use auth::*;
