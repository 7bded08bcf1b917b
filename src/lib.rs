pub mod models;
pub mod error;
pub mod format;
pub mod columns;
pub mod export;
pub mod feed;
pub mod status;
pub mod config;
pub mod generation;
pub mod prompts;
pub mod builder;
pub mod optimiser;

pub use builder::{AdBuilder, KeywordOptions};
pub use error::{BuilderError, Result};
pub use optimiser::{FeedOptimiser, OptimisationSettings};
