pub mod client;
pub mod config;
pub mod error;
pub mod streaming;

pub use client::CohereProvider;
pub use config::CohereConfig;
