pub mod config;
pub mod error;
pub mod feed;
pub mod header;
pub mod markdown;
pub mod pagination;
pub mod pipeline;
pub mod post;
pub mod social;
pub mod taxonomy;
pub mod templates;
pub mod transformer;
pub mod types;
pub mod utils;
