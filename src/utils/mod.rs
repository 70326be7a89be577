//! Browser utilities.
//!
//! - [`history`] - pathname ↔ address translation and history updates

pub mod history;
