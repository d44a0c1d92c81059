pub mod adapter;
pub mod api_connection;
pub mod cli;
pub mod config;
pub mod prompts;
pub mod ratings;
pub mod samples;
pub mod server;
pub mod verdict;

pub use adapter::{AdapterConfig, FailureReason, PipelineResult, RecipeAdapter, RestrictionSet, Stage};
