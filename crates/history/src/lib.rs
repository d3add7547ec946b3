#![doc = include_str!("../README.md")]

pub mod key;
pub mod store;

pub use key::project_key;
pub use store::HistoryStore;
