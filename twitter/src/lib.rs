mod auth;
mod client;
pub mod endpoint;
mod error;
mod response_helpers;
mod session;
mod tweet;

pub use auth::LoginInfo;
pub use client::{AuthenticatedTwitterClient, TwitterClient};
pub use endpoint::search::{FetchResult, Product, SearchQuery};
pub use error::TwitterError;
pub use session::Session;
pub use tweet::{parse_created_at, Media, MediaKind, Page, Tweet, User};
