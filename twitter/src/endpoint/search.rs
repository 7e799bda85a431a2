use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::FEATURES;
use crate::client::TwitterClient;
use crate::error::TwitterError;
use crate::response_helpers::{api_error_message, check_rate_limit};
use crate::tweet::{Page, RawTweet};

static SEARCH_TIMELINE: &str = "/graphql/flaR-PUMshxFWZWPNpq4zA/SearchTimeline";

/// Ranking of search results.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Product {
    #[default]
    Top,
    Latest,
    Media,
}

#[derive(Clone, Debug)]
pub struct SearchQuery {
    /// Query in the search box syntax, e.g. `rust lang:en -filter:replies`
    pub raw_query: String,
    pub product: Product,
    pub count: u32,
}

/// Outcome of one search page request.
#[derive(Debug)]
pub enum FetchResult {
    Page(Page),
    /// Rate limited until the given time.
    RateLimited(OffsetDateTime),
    Failed(TwitterError),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Variables<'a> {
    raw_query: &'a str,
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
    query_source: &'static str,
    product: Product,
}

pub(crate) async fn search_timeline(
    client: &TwitterClient,
    query: &SearchQuery,
    cursor: Option<&str>,
) -> FetchResult {
    match request_page(client, query, cursor).await {
        Ok(r) => r,
        Err(e) => FetchResult::Failed(e),
    }
}

async fn request_page(
    client: &TwitterClient,
    query: &SearchQuery,
    cursor: Option<&str>,
) -> Result<FetchResult, TwitterError> {
    let variables = serde_json::to_string(&Variables {
        raw_query: &query.raw_query,
        count: query.count,
        cursor,
        query_source: "typed_query",
        product: query.product,
    })?;

    let resp = client
        .api_request(client.http.get(client.url(SEARCH_TIMELINE)?))
        .header("x-twitter-auth-type", "OAuth2Session")
        .query(&[("variables", variables.as_str()), ("features", FEATURES)])
        .send()
        .await?;

    if let Some(reset) = check_rate_limit(&resp) {
        return Ok(FetchResult::RateLimited(reset));
    }

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(TwitterError::Status { status, body });
    }

    let parsed: SearchResponse = serde_json::from_str(&body)?;
    Ok(FetchResult::Page(parse_page(parsed, &body)?))
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    data: Option<SearchData>,
}

#[derive(Deserialize, Debug)]
struct SearchData {
    search_by_raw_query: SearchByRawQuery,
}

#[derive(Deserialize, Debug)]
struct SearchByRawQuery {
    search_timeline: SearchTimeline,
}

#[derive(Deserialize, Debug)]
struct SearchTimeline {
    timeline: Timeline,
}

#[derive(Deserialize, Debug)]
struct Timeline {
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum Instruction {
    TimelineAddEntries {
        #[serde(default)]
        entries: Vec<Entry>,
    },
    TimelineReplaceEntry {
        entry: Entry,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Entry {
    entry_id: String,
    content: EntryContent,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EntryContent {
    item_content: Option<ItemContent>,
    value: Option<String>,
    cursor_type: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ItemContent {
    tweet_results: Option<TweetResults>,
}

#[derive(Deserialize, Debug)]
struct TweetResults {
    result: Option<serde_json::Value>,
}

fn parse_page(resp: SearchResponse, body: &str) -> Result<Page, TwitterError> {
    let data = match resp.data {
        Some(d) => d,
        None => {
            let msg = api_error_message(body).unwrap_or_else(|| "no data in response".to_owned());
            return Err(TwitterError::Api(msg));
        }
    };

    let mut page = Page::default();
    let entries = data
        .search_by_raw_query
        .search_timeline
        .timeline
        .instructions
        .into_iter()
        .flat_map(|i| match i {
            Instruction::TimelineAddEntries { entries } => entries,
            Instruction::TimelineReplaceEntry { entry } => vec![entry],
            Instruction::Other => vec![],
        });

    for entry in entries {
        if entry.content.cursor_type.as_deref() == Some("Bottom")
            || entry.entry_id.starts_with("cursor-bottom")
        {
            page.cursor = entry.content.value;
            continue;
        }

        let result = entry
            .content
            .item_content
            .and_then(|c| c.tweet_results)
            .and_then(|r| r.result);
        let Some(result) = result else {
            continue;
        };

        // A malformed tweet only loses that tweet, not the page
        match serde_json::from_value::<RawTweet>(result) {
            Ok(raw) => page.tweets.extend(raw.into_tweet()),
            Err(e) => {
                tracing::warn!(entry_id = %entry.entry_id, error = %e, "skipping malformed tweet")
            }
        }
    }

    Ok(page)
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{AuthenticatedTwitterClient, Session};

    fn tweet_entry(id: &str, text: &str) -> Value {
        json!({
            "entryId": format!("tweet-{}", id),
            "content": {
                "entryType": "TimelineTimelineItem",
                "itemContent": {
                    "itemType": "TimelineTweet",
                    "tweet_results": {"result": {
                        "__typename": "Tweet",
                        "rest_id": id,
                        "legacy": {"full_text": text, "retweet_count": 1, "favorite_count": 2}
                    }}
                }
            }
        })
    }

    fn cursor_entry(kind: &str, value: &str) -> Value {
        json!({
            "entryId": format!("cursor-{}-0", kind.to_lowercase()),
            "content": {"entryType": "TimelineTimelineCursor", "value": value, "cursorType": kind}
        })
    }

    fn response(instructions: Value) -> Value {
        json!({"data": {"search_by_raw_query": {"search_timeline": {"timeline": {
            "instructions": instructions
        }}}}})
    }

    fn parse(v: Value) -> Result<Page, TwitterError> {
        let body = v.to_string();
        parse_page(serde_json::from_str(&body).unwrap(), &body)
    }

    #[test]
    fn first_page() {
        let page = parse(response(json!([
            {"type": "TimelineClearCache"},
            {"type": "TimelineAddEntries", "entries": [
                tweet_entry("1", "one"),
                tweet_entry("2", "two"),
                cursor_entry("Top", "TOP"),
                cursor_entry("Bottom", "BOTTOM"),
            ]}
        ])))
        .unwrap();

        assert_eq!(page.tweets.len(), 2);
        assert_eq!(page.tweets[1].text.as_deref(), Some("two"));
        assert_eq!(page.cursor.as_deref(), Some("BOTTOM"));
    }

    #[test]
    fn later_page_replaces_cursor() {
        let page = parse(response(json!([
            {"type": "TimelineAddEntries", "entries": [tweet_entry("3", "three")]},
            {"type": "TimelineReplaceEntry", "entry_id_to_replace": "cursor-top-0",
             "entry": cursor_entry("Top", "TOP2")},
            {"type": "TimelineReplaceEntry", "entry_id_to_replace": "cursor-bottom-0",
             "entry": cursor_entry("Bottom", "BOTTOM2")}
        ])))
        .unwrap();

        assert_eq!(page.tweets.len(), 1);
        assert_eq!(page.cursor.as_deref(), Some("BOTTOM2"));
    }

    #[test]
    fn malformed_tweet_skipped() {
        let mut bad = tweet_entry("4", "four");
        bad["content"]["itemContent"]["tweet_results"]["result"]["legacy"]["retweet_count"] =
            json!("many");
        let page = parse(response(json!([
            {"type": "TimelineAddEntries", "entries": [bad, tweet_entry("5", "five")]}
        ])))
        .unwrap();

        assert_eq!(page.tweets.len(), 1);
        assert_eq!(page.tweets[0].id.as_deref(), Some("5"));
    }

    #[test]
    fn unparsable_timestamp_keeps_tweet() {
        let mut odd = tweet_entry("6", "six");
        odd["content"]["itemContent"]["tweet_results"]["result"]["legacy"]["created_at"] =
            json!("not a date");
        let page = parse(response(json!([
            {"type": "TimelineAddEntries", "entries": [odd]}
        ])))
        .unwrap();

        assert_eq!(page.tweets.len(), 1);
        assert_eq!(page.tweets[0].text.as_deref(), Some("six"));
        assert_eq!(page.tweets[0].favorite_count, Some(2));
        assert!(page.tweets[0].created_at.is_none());
    }

    #[test]
    fn errors_without_data() {
        let res = parse(json!({"errors": [{"message": "Query: Unspecified"}]}));
        assert!(matches!(res, Err(TwitterError::Api(m)) if m == "Query: Unspecified"));
    }

    fn client(uri: &str) -> AuthenticatedTwitterClient {
        let session = Session {
            cookies: [("ct0", "csrf"), ("auth_token", "secret")]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        };
        let client = TwitterClient::with_base_url(uri).unwrap();
        AuthenticatedTwitterClient::restore(client, &session).unwrap()
    }

    fn query() -> SearchQuery {
        SearchQuery {
            raw_query: "(#Covid) lang:en".to_owned(),
            product: Product::Top,
            count: 20,
        }
    }

    #[tokio::test]
    async fn sends_cursor_and_csrf() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_TIMELINE))
            .and(header("x-csrf-token", "csrf"))
            .and(query_param_contains("variables", r#""cursor":"BOTTOM""#))
            .and(query_param_contains("variables", r#""product":"Top""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(response(json!([
                {"type": "TimelineAddEntries", "entries": [tweet_entry("9", "nine")]}
            ]))))
            .expect(1)
            .mount(&server)
            .await;

        match client(&server.uri()).search(&query(), Some("BOTTOM")).await {
            FetchResult::Page(p) => assert_eq!(p.tweets.len(), 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_TIMELINE))
            .respond_with(
                ResponseTemplate::new(429).insert_header("x-rate-limit-reset", "1735689600"),
            )
            .mount(&server)
            .await;

        match client(&server.uri()).search(&query(), None).await {
            FetchResult::RateLimited(reset) => {
                assert_eq!(reset.unix_timestamp(), 1_735_689_600)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    async fn assert_fallback_reset(template: ResponseTemplate) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_TIMELINE))
            .respond_with(template)
            .mount(&server)
            .await;

        let before = OffsetDateTime::now_utc();
        match client(&server.uri()).search(&query(), None).await {
            FetchResult::RateLimited(reset) => {
                let wait = reset - before;
                assert!(
                    wait >= time::Duration::seconds(55) && wait <= time::Duration::seconds(65),
                    "waited {}",
                    wait
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rate_limited_without_reset_header() {
        assert_fallback_reset(ResponseTemplate::new(429)).await;
    }

    #[tokio::test]
    async fn rate_limited_with_garbage_reset_header() {
        assert_fallback_reset(
            ResponseTemplate::new(429).insert_header("x-rate-limit-reset", "soon"),
        )
        .await;
    }

    #[tokio::test]
    async fn server_error_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_TIMELINE))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let res = client(&server.uri()).search(&query(), None).await;
        assert!(matches!(
            res,
            FetchResult::Failed(TwitterError::Status { status, .. }) if status.as_u16() == 403
        ));
    }
}
