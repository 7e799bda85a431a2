use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tweet_harvest_common::download_asset;
use twitter::{Media, MediaKind, Tweet, User};

use crate::config::Config;

/// Column names, in the order [`OutputRecord`] serializes its fields.
pub const HEADER: [&str; 10] = [
    "Tweet_count",
    "Username",
    "Text",
    "Created At",
    "Retweets",
    "Likes",
    "Tweet_ID",
    "Profile_Pic",
    "Media_Files",
    "T_co_Links",
];

static MISSING: &str = "N/A";

/// One CSV row.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct OutputRecord {
    pub sequence: u64,
    pub username: String,
    pub text: String,
    pub created_at: String,
    pub retweets: u64,
    pub likes: u64,
    pub tweet_id: String,
    pub profile_pic: String,
    pub media_files: String,
    pub t_co_links: String,
}

impl OutputRecord {
    /// Project the text fields of `tweet`, leaving the asset paths empty.
    pub fn from_tweet(tweet: &Tweet, sequence: u64) -> Self {
        let text = clean_text(tweet.text.as_deref());
        let t_co_links = extract_links(&text).join("|");

        Self {
            sequence,
            username: author_name(tweet).to_owned(),
            created_at: tweet
                .created_at
                .and_then(|t| t.format(&Rfc3339).ok())
                .unwrap_or_else(|| MISSING.to_owned()),
            retweets: tweet.retweet_count.unwrap_or(0),
            likes: tweet.favorite_count.unwrap_or(0),
            tweet_id: tweet_id(tweet, sequence),
            profile_pic: String::new(),
            media_files: String::new(),
            t_co_links,
            text,
        }
    }
}

fn author_name(tweet: &Tweet) -> &str {
    tweet
        .user
        .as_ref()
        .and_then(|u| u.name.as_deref())
        .unwrap_or(MISSING)
}

fn tweet_id(tweet: &Tweet, sequence: u64) -> String {
    match &tweet.id {
        Some(id) => id.clone(),
        None => format!("unknown_{}", sequence),
    }
}

/// Tweet text on one line.
pub fn clean_text(text: Option<&str>) -> String {
    text.unwrap_or_default().replace('\n', " ")
}

/// All `t.co` short links in `text`, in order of appearance.
pub fn extract_links(text: &str) -> Vec<&str> {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"https?://t\.co/\w+").unwrap());
    LINK_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Author name reduced to word characters, spaces become underscores.
pub fn safe_name(name: &str) -> String {
    static UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
    UNSAFE_RE.replace_all(name, "").replace(' ', "_")
}

/// Full resolution variant of a profile image URL.
pub fn full_size_profile_url(url: &str) -> String {
    url.replace("_normal", "")
}

fn media_label(media: &Media) -> &'static str {
    match media.kind {
        MediaKind::Photo => "photo",
        MediaKind::Video => "video_thumb",
        MediaKind::AnimatedGif => "gif_thumb",
        MediaKind::Other(_) => "unknown",
    }
}

/// Downloads the images a record points to.
pub struct AssetDownloader {
    client: Client,
    profile_dir: PathBuf,
    media_dir: PathBuf,
    enabled: bool,
}

impl AssetDownloader {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.download.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            profile_dir: config.output.profile_dir.clone(),
            media_dir: config.output.media_dir.clone(),
            enabled: config.download.enabled,
        })
    }

    /// Create the download directories.
    pub async fn prepare(&self) -> Result<()> {
        if self.enabled {
            tokio::fs::create_dir_all(&self.profile_dir).await?;
            tokio::fs::create_dir_all(&self.media_dir).await?;
        }
        Ok(())
    }

    /// Project `tweet` and download its profile picture and media.
    pub async fn project(&self, tweet: &Tweet, sequence: u64) -> OutputRecord {
        let mut record = OutputRecord::from_tweet(tweet, sequence);
        if !self.enabled {
            return record;
        }

        if let Some(user) = tweet.user.as_ref() {
            self.download_profile_pic(user, &mut record).await;
        }

        let mut media_paths = vec![];
        for (i, media) in tweet.media.iter().enumerate() {
            let Some(url) = media.url.as_deref() else {
                tracing::debug!(index = i, kind = ?media.kind, "media without url");
                continue;
            };
            let file_name = format!("{}_{}_{}.jpg", record.tweet_id, media_label(media), i);
            let path = self.download(url, self.media_dir.join(file_name)).await;
            if !path.is_empty() {
                media_paths.push(path);
            }
        }
        record.media_files = media_paths.join("|");

        record
    }

    async fn download_profile_pic(&self, user: &User, record: &mut OutputRecord) {
        let Some(url) = user.profile_image_url.as_deref() else {
            return;
        };
        // Names made only of symbols fall back to the handle
        let mut name = safe_name(&record.username);
        if name.is_empty() {
            name = user.screen_name.as_deref().map(safe_name).unwrap_or_default();
        }
        let file_name = format!("{}_{}.jpg", name, record.tweet_id);
        record.profile_pic = self
            .download(&full_size_profile_url(url), self.profile_dir.join(file_name))
            .await;
    }

    async fn download(&self, url: &str, path: impl AsRef<Path>) -> String {
        download_asset(&self.client, url, path)
            .await
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
