use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

use self::output::{DownloadConfig, OutputConfig};
use self::search::SearchConfig;

pub mod output;
pub mod search;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CredentialsConfig {
    pub fn login_info(&self) -> twitter::LoginInfo {
        twitter::LoginInfo {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub strategy: SessionStrategy,
    /// Where a login saves its cookies and a restore reads them from
    #[serde(default, deserialize_with = "deserialize_path_option")]
    pub file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStrategy {
    #[default]
    Login,
    Restore,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let conf_contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        Self::parse(&conf_contents)
            .with_context(|| format!("Failed to parse {}", path.as_ref().display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let conf: Config = toml::from_str(s)?;
        conf.validate()?;
        Ok(conf)
    }

    fn validate(&self) -> Result<()> {
        let [low, high] = self.search.delay_secs;
        if low > high {
            return Err(anyhow!("search.delay_secs must be [min, max], got [{low}, {high}]"));
        }
        if self.search.page_size == 0 {
            return Err(anyhow!("search.page_size must be at least 1"));
        }
        if self.session.strategy == SessionStrategy::Restore && self.session.file.is_none() {
            return Err(anyhow!("session.file is required to restore a session"));
        }
        Ok(())
    }
}

fn expand_home(path: PathBuf) -> Result<PathBuf, String> {
    #[cfg(unix)]
    {
        use home_dir::HomeDirExt;
        path.expand_home().map_err(|e| e.to_string())
    }
    #[cfg(not(unix))]
    {
        Ok(path)
    }
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let s: PathBuf = Deserialize::deserialize(deserializer)?;
    expand_home(s).map_err(D::Error::custom)
}

fn deserialize_path_option<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_path(deserializer).map(Some)
}

#[cfg(test)]
mod test {
    use super::*;
    use twitter::Product;

    static MINIMAL: &str = r#"
        [credentials]
        username = "jane"
        email = "jane@example.com"
        password = "hunter2"
    "#;

    #[test]
    fn defaults() {
        let conf = Config::parse(MINIMAL).unwrap();
        assert_eq!(conf.session.strategy, SessionStrategy::Login);
        assert!(conf.session.file.is_none());
        assert_eq!(conf.search.minimum_tweets, 20);
        assert_eq!(conf.search.product, Product::Top);
        assert_eq!(conf.search.delay_secs, [8, 15]);
        assert!(conf.search.query.contains("-filter:retweets"));
        assert_eq!(conf.output.csv, PathBuf::from("tweets.csv"));
        assert_eq!(conf.output.profile_dir, PathBuf::from("profile_pics"));
        assert_eq!(conf.output.media_dir, PathBuf::from("downloaded_images"));
        assert!(conf.download.enabled);
    }

    #[test]
    fn missing_credential_is_fatal() {
        let res = Config::parse(
            r#"
            [credentials]
            username = "jane"
            password = "hunter2"
            "#,
        );
        let msg = format!("{:#}", res.unwrap_err());
        assert!(msg.contains("email"), "{}", msg);
    }

    #[test]
    fn overrides() {
        let conf = Config::parse(&format!(
            r#"{MINIMAL}
            [session]
            strategy = "restore"
            file = "/tmp/session.json"

            [search]
            query = "rust lang:en"
            product = "Latest"
            minimum_tweets = 5
            delay_secs = [0, 1]

            [download]
            enabled = false
            "#
        ))
        .unwrap();
        assert_eq!(conf.session.strategy, SessionStrategy::Restore);
        assert_eq!(conf.session.file, Some(PathBuf::from("/tmp/session.json")));
        assert_eq!(conf.search.query, "rust lang:en");
        assert_eq!(conf.search.product, Product::Latest);
        assert_eq!(conf.search.minimum_tweets, 5);
        assert!(!conf.download.enabled);
    }

    #[test]
    fn restore_needs_file() {
        let res = Config::parse(&format!("{MINIMAL}\n[session]\nstrategy = \"restore\"\n"));
        assert!(res.is_err());
    }

    #[test]
    fn inverted_delay_rejected() {
        let res = Config::parse(&format!("{MINIMAL}\n[search]\ndelay_secs = [15, 8]\n"));
        assert!(res.is_err());
    }
}
