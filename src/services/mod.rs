pub mod auth;
pub mod bootstrap_admin;
pub mod complaint;
pub mod dashboard;
pub mod export;
pub mod feed;
pub mod stats;
