mod client;
mod error;
mod lang;
mod types;

pub use client::SubtitleApiClient;
pub use error::Error;
pub use lang::{canonical_language, parse_target_languages};
pub use types::*;
