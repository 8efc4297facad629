#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod db;
mod error;
mod postgres_store;
mod store;

#[cfg(feature = "test-util")]
mod memory_store;

pub use db::*;
pub use error::*;
pub use postgres_store::*;
pub use store::*;

#[cfg(feature = "test-util")]
pub use memory_store::*;
