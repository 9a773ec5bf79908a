pub mod auth;
pub mod client;
pub mod fetch;

pub use client::{HiveApi, HiveClient};
