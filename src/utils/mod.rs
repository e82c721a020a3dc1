//! Shared helpers: path arithmetic and watch-mode file categories.

pub mod category;
pub mod path;
