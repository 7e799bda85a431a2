use async_trait::async_trait;
use twitter::{AuthenticatedTwitterClient, FetchResult, SearchQuery};

/// Where the harvester gets its pages from.
#[async_trait]
pub trait SearchSource {
    /// Fetch the page after `cursor`, or the first page when `cursor` is `None`.
    async fn fetch(&self, cursor: Option<&str>) -> FetchResult;

    /// Human readable description for logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: SearchSource + Sync + ?Sized> SearchSource for &T {
    async fn fetch(&self, cursor: Option<&str>) -> FetchResult {
        (**self).fetch(cursor).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A fixed query against the live search timeline.
pub struct TwitterSearch {
    client: AuthenticatedTwitterClient,
    query: SearchQuery,
}

impl TwitterSearch {
    pub fn new(client: AuthenticatedTwitterClient, query: SearchQuery) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl SearchSource for TwitterSearch {
    async fn fetch(&self, cursor: Option<&str>) -> FetchResult {
        self.client.search(&self.query, cursor).await
    }

    fn describe(&self) -> String {
        format!("{} ({:?})", self.query.raw_query, self.query.product)
    }
}
