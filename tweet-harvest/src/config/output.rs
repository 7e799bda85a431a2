use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct OutputConfig {
    /// Truncated and given its header once the session is established, so a
    /// failed login leaves the previous run's file untouched.
    #[serde(default = "default_csv", deserialize_with = "super::deserialize_path")]
    pub csv: PathBuf,
    #[serde(
        default = "default_profile_dir",
        deserialize_with = "super::deserialize_path"
    )]
    pub profile_dir: PathBuf,
    #[serde(
        default = "default_media_dir",
        deserialize_with = "super::deserialize_path"
    )]
    pub media_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: default_csv(),
            profile_dir: default_profile_dir(),
            media_dir: default_media_dir(),
        }
    }
}

fn default_csv() -> PathBuf {
    PathBuf::from("tweets.csv")
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("profile_pics")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("downloaded_images")
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct DownloadConfig {
    /// Download profile pictures and media thumbnails
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 30,
        }
    }
}
