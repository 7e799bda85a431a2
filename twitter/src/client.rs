use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{header, Client, ClientBuilder, RequestBuilder};
use url::Url;

use crate::auth::{login, LoginInfo};
use crate::endpoint::search::{search_timeline, FetchResult, SearchQuery};
use crate::error::TwitterError;
use crate::session::Session;

/// Public bearer token of the X web app.
pub(crate) static BEARER: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

static USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

static API_BASE: &str = "https://api.x.com";

/// Unauthenticated client, holds the cookie jar every later request shares.
pub struct TwitterClient {
    pub(crate) http: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl TwitterClient {
    pub fn new() -> Result<Self, TwitterError> {
        Self::with_base_url(API_BASE)
    }

    /// Create a client that talks to `base_url` instead of the public api host
    pub fn with_base_url(base_url: &str) -> Result<Self, TwitterError> {
        let jar = Arc::new(Jar::default());
        let http = ClientBuilder::new()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            jar,
            base_url: Url::parse(base_url)?,
        })
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, TwitterError> {
        Ok(self.base_url.join(path)?)
    }

    /// Headers every web api call carries.
    pub(crate) fn api_request(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req
            .header(header::AUTHORIZATION, format!("Bearer {}", BEARER))
            .header("x-twitter-active-user", "yes")
            .header("x-twitter-client-language", "en");
        match self.session().get("ct0") {
            Some(ct0) => req.header("x-csrf-token", ct0),
            None => req,
        }
    }

    pub(crate) fn session(&self) -> Session {
        self.jar
            .cookies(&self.base_url)
            .and_then(|h| h.to_str().ok().map(Session::from_cookie_header))
            .unwrap_or_default()
    }

    fn load_session(&self, session: &Session) {
        for (name, value) in &session.cookies {
            self.jar
                .add_cookie_str(&format!("{}={}", name, value), &self.base_url);
        }
    }
}

#[derive(Debug)]
pub struct AuthenticatedTwitterClient {
    client: TwitterClient,
}

impl AuthenticatedTwitterClient {
    /// Log in with username, email and password.
    pub async fn login(
        client: TwitterClient,
        login_info: &LoginInfo,
    ) -> Result<AuthenticatedTwitterClient, TwitterError> {
        login(&client, login_info).await?;
        Self::authenticated(client)
    }

    /// Reuse the cookies of an earlier login.
    pub fn restore(
        client: TwitterClient,
        session: &Session,
    ) -> Result<AuthenticatedTwitterClient, TwitterError> {
        client.load_session(session);
        Self::authenticated(client)
    }

    fn authenticated(client: TwitterClient) -> Result<AuthenticatedTwitterClient, TwitterError> {
        if !client.session().is_authenticated() {
            return Err(TwitterError::Auth(
                "session is missing the auth_token or ct0 cookie".to_owned(),
            ));
        }
        Ok(Self { client })
    }

    /// Current session cookies, for saving to disk.
    pub fn session(&self) -> Session {
        self.client.session()
    }

    /// Fetch one page of search results, continuing from `cursor` if given.
    pub async fn search(&self, query: &SearchQuery, cursor: Option<&str>) -> FetchResult {
        search_timeline(&self.client, query, cursor).await
    }
}
