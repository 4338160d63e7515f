//! Inventory domain module.
//!
//! Items and their on-shelf stock. Pure domain logic only (no IO).

pub mod item;

pub use item::{InventoryStore, Item};
