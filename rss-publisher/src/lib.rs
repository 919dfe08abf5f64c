pub mod types;
pub mod config;
pub mod traits;
pub mod rss_utils;
pub mod activity;
pub mod classifier;
pub mod normalizer;
pub mod llm_adapter;
pub mod sideloader;
pub mod assembler;
pub mod publisher;
pub mod operator;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod post_manager;
pub mod memory;

pub use types::*;
pub use config::PublisherConfig;
pub use activity::ActivityLog;
pub use classifier::TitleClassifier;
pub use llm_adapter::{AiSuggestionClient, GeminiTextService};
pub use sideloader::ImageSideloader;
pub use assembler::{ItemOutcome, PostAssembler};
pub use publisher::{Capabilities, Publisher, RunSummary};
pub use operator::{Operator, OperatorResponse};
pub use fetcher::{Fetcher, HttpImageDownloader};
pub use parser::FeedParser;
pub use sources::RssFeedSource;
pub use post_manager::PostManager;
