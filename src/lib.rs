//! # VCT Team Builder
//!
//! Builds a five-player VALORANT roster from a static statistics file with
//! the help of a hosted language model.
//!
//! ## Architecture
//!
//! - **models**: Player records, roles and decoded team structures
//! - **storage**: Lazily-loaded player statistics document
//! - **context**: Category filter, KDA ranking and truncation
//! - **agents**: Prompt construction, AI backends and the Team Builder agent
//! - **parse**: Decoder for the model's free-text reply
//! - **calculate**: Map preference distribution and team map averages
//! - **validate**: Optional role and IGL checks
//! - **render**: HTML view models and templates
//! - **api**: HTTP endpoints
//! - **config**: Configuration loading and validation

pub mod agents;
pub mod api;
pub mod calculate;
pub mod config;
pub mod context;
pub mod models;
pub mod parse;
pub mod render;
pub mod storage;
pub mod validate;

pub use models::*;
