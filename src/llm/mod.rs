pub mod analyzer;
#[cfg(feature = "github-models")]
pub mod client;
pub mod extractor;
pub mod prompts;
pub mod response;
pub mod service;
#[cfg(feature = "github-models")]
pub mod types;

pub use analyzer::*;
#[cfg(feature = "github-models")]
pub use client::*;
pub use extractor::*;
pub use response::*;
pub use service::*;
