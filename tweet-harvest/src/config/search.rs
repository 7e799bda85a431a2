use serde::Deserialize;
use twitter::{Product, SearchQuery};

static DEFAULT_QUERY: &str =
    "(#Covid) lang:en until:2025-01-01 since:2024-01-01 -filter:retweets -filter:replies";

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct SearchConfig {
    pub query: String,
    pub product: Product,
    /// Stop once this many tweets have been written
    pub minimum_tweets: u64,
    pub page_size: u32,
    /// Inclusive range of seconds to wait between pages
    pub delay_secs: [u64; 2],
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_owned(),
            product: Product::Top,
            minimum_tweets: 20,
            page_size: 20,
            delay_secs: [8, 15],
        }
    }
}

impl SearchConfig {
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            raw_query: self.query.clone(),
            product: self.product,
            count: self.page_size,
        }
    }
}
