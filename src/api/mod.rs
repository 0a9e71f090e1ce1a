pub mod error;
pub mod health;
pub mod incidents;
pub mod openapi;
pub mod questions;
