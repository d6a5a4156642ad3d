pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::YelpClient;
pub use error::SearchError;
pub use normalize::normalize_business;
pub use types::SearchQuery;
