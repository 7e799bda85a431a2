use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::TwitterError;

/// Cookies of an authenticated session, as saved to and restored from disk.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub cookies: BTreeMap<String, String>,
}

impl Session {
    /// Parse a `Cookie` header value of the form `a=1; b=2`.
    pub(crate) fn from_cookie_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                if name.is_empty() {
                    return None;
                }
                Some((name.to_owned(), value.to_owned()))
            })
            .collect();
        Self { cookies }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Both cookies the web api needs to accept a session.
    pub(crate) fn is_authenticated(&self) -> bool {
        self.get("auth_token").is_some() && self.get("ct0").is_some()
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self, TwitterError> {
        let path = path.as_ref();
        let err = |msg: String| TwitterError::Session {
            path: path.to_path_buf(),
            msg,
        };
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| err(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| err(e.to_string()))
    }

    pub async fn write(&self, path: impl AsRef<Path>) -> Result<(), TwitterError> {
        let path = path.as_ref();
        let err = |msg: String| TwitterError::Session {
            path: path.to_path_buf(),
            msg,
        };
        let contents = serde_json::to_string_pretty(self).map_err(|e| err(e.to_string()))?;
        fs::write(path, contents)
            .await
            .map_err(|e| err(e.to_string()))
    }
}
