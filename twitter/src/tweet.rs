use serde::{Deserialize, Deserializer};
use time::macros::format_description;
use time::OffsetDateTime;

/// A tweet as returned by a search timeline.
///
/// Every field is optional: the timeline omits pieces of a tweet depending on
/// visibility and account state, and consumers pick their own defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tweet {
    pub id: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub retweet_count: Option<u64>,
    pub favorite_count: Option<u64>,
    pub media: Vec<Media>,
    pub user: Option<User>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub name: Option<String>,
    pub screen_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Media {
    pub kind: MediaKind,
    /// Image URL. For videos and gifs this is the thumbnail.
    pub url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
    Other(String),
}

impl From<&str> for MediaKind {
    fn from(s: &str) -> Self {
        match s {
            "photo" => Self::Photo,
            "video" => Self::Video,
            "animated_gif" => Self::AnimatedGif,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// One page of search results and the cursor for the page after it.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub tweets: Vec<Tweet>,
    pub cursor: Option<String>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }
}

// Shapes below mirror the GraphQL `tweet_results.result` object

#[derive(Deserialize, Debug)]
pub(crate) struct RawTweet {
    #[serde(rename = "__typename")]
    typename: Option<String>,
    rest_id: Option<String>,
    core: Option<RawCore>,
    legacy: Option<RawLegacy>,
    note_tweet: Option<RawNoteTweet>,
    /// Set on `TweetWithVisibilityResults` wrappers
    tweet: Option<Box<RawTweet>>,
}

#[derive(Deserialize, Debug)]
struct RawCore {
    user_results: Option<RawUserResults>,
}

#[derive(Deserialize, Debug)]
struct RawUserResults {
    result: Option<RawUser>,
}

#[derive(Deserialize, Debug)]
struct RawUser {
    legacy: Option<RawUserLegacy>,
    core: Option<RawUserCore>,
    avatar: Option<RawAvatar>,
}

#[derive(Deserialize, Debug)]
struct RawUserLegacy {
    name: Option<String>,
    screen_name: Option<String>,
    profile_image_url_https: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawUserCore {
    name: Option<String>,
    screen_name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawAvatar {
    image_url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawLegacy {
    id_str: Option<String>,
    full_text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_created_at")]
    created_at: Option<OffsetDateTime>,
    retweet_count: Option<u64>,
    favorite_count: Option<u64>,
    extended_entities: Option<RawExtendedEntities>,
}

#[derive(Deserialize, Debug)]
struct RawNoteTweet {
    note_tweet_results: Option<RawNoteTweetResults>,
}

#[derive(Deserialize, Debug)]
struct RawNoteTweetResults {
    result: Option<RawNoteTweetResult>,
}

#[derive(Deserialize, Debug)]
struct RawNoteTweetResult {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawExtendedEntities {
    #[serde(default)]
    media: Vec<RawMedia>,
}

#[derive(Deserialize, Debug)]
struct RawMedia {
    #[serde(rename = "type")]
    media_type: Option<String>,
    media_url_https: Option<String>,
    media_url: Option<String>,
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.and_then(|s| match parse_created_at(&s) {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::warn!(created_at = %s, error = %e, "unparsable tweet timestamp");
            None
        }
    }))
}

/// Parse the `Wed Oct 10 20:19:24 +0000 2018` form used by `created_at`.
pub fn parse_created_at(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(
        s,
        format_description!(
            "[weekday repr:short] [month repr:short] [day] [hour repr:24]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
        ),
    )
}

impl RawTweet {
    /// Convert into a [`Tweet`], or `None` for tombstones and unavailable tweets.
    pub(crate) fn into_tweet(self) -> Option<Tweet> {
        if let Some(inner) = self.tweet {
            return inner.into_tweet();
        }
        if let Some(t) = self.typename.as_deref() {
            if t == "TweetTombstone" || t == "TweetUnavailable" {
                return None;
            }
        }

        let user = self
            .core
            .and_then(|c| c.user_results)
            .and_then(|u| u.result)
            .map(RawUser::into_user);

        let note_text = self
            .note_tweet
            .and_then(|n| n.note_tweet_results)
            .and_then(|r| r.result)
            .and_then(|r| r.text);

        let mut tweet = Tweet {
            id: self.rest_id,
            text: note_text,
            user,
            ..Default::default()
        };

        if let Some(legacy) = self.legacy {
            tweet.id = tweet.id.or(legacy.id_str);
            tweet.text = tweet.text.or(legacy.full_text);
            tweet.created_at = legacy.created_at;
            tweet.retweet_count = legacy.retweet_count;
            tweet.favorite_count = legacy.favorite_count;
            tweet.media = legacy
                .extended_entities
                .map(|e| e.media)
                .unwrap_or_default()
                .into_iter()
                .map(|m| Media {
                    kind: m.media_type.as_deref().unwrap_or_default().into(),
                    url: m.media_url_https.or(m.media_url),
                })
                .collect();
        }

        Some(tweet)
    }
}

impl RawUser {
    fn into_user(self) -> User {
        let (legacy_name, legacy_screen_name, legacy_image) = match self.legacy {
            Some(l) => (l.name, l.screen_name, l.profile_image_url_https),
            None => (None, None, None),
        };
        let (core_name, core_screen_name) = match self.core {
            Some(c) => (c.name, c.screen_name),
            None => (None, None),
        };

        User {
            name: core_name.or(legacy_name),
            screen_name: core_screen_name.or(legacy_screen_name),
            profile_image_url: self.avatar.and_then(|a| a.image_url).or(legacy_image),
        }
    }
}
