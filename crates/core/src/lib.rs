//! `pinjam-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no presentation concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod table;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ItemCode, LoanId};
pub use table::KeyedTable;
