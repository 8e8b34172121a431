//! Core engine — configuration, definitions, catalogs, and execution.

pub mod accessor;
pub mod catalog;
pub mod config;
pub mod definition;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod manifest_file;
pub mod recipe;
pub mod types;
