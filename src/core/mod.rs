pub mod common;
pub mod config;
pub mod indexing;
pub mod query;
pub mod table;
