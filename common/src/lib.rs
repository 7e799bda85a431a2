use std::path::{Path, PathBuf};

use reqwest::Client;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("server returned an empty body")]
    Empty,

    #[error("unable to write {path:?}: {error}")]
    Write {
        path: PathBuf,
        error: std::io::Error,
    },
}

/// Fetch `url` once and write the body to `path`.
///
/// Only a 2xx response with a non-empty body counts as a download. Every
/// other outcome is logged and reported as `None`, nothing is retried.
pub async fn download_asset(
    client: &Client,
    url: &str,
    path: impl AsRef<Path>,
) -> Option<PathBuf> {
    let path = path.as_ref();

    tracing::debug!(%url, "downloading asset");
    match fetch_to_file(client, url, path).await {
        Ok(()) => {
            tracing::info!(%url, path = %path.display(), "downloaded asset");
            Some(path.to_path_buf())
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "asset unavailable");
            None
        }
    }
}

async fn fetch_to_file(client: &Client, url: &str, path: &Path) -> Result<(), AssetError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(AssetError::Status(resp.status()));
    }

    let body = resp.bytes().await?;
    if body.is_empty() {
        return Err(AssetError::Empty);
    }

    let write_err = |error| AssetError::Write {
        path: path.to_path_buf(),
        error,
    };
    let mut file = fs::File::create(path).await.map_err(write_err)?;
    file.write_all(&body).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn writes_successful_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pic.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pic.jpg");
        let client = Client::new();
        let res = download_asset(&client, &format!("{}/pic.jpg", server.uri()), &dest).await;

        assert_eq!(res.as_deref(), Some(dest.as_path()));
        assert_eq!(std::fs::read(&dest).unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pic.jpg");
        let client = Client::new();
        let res = download_asset(&client, &format!("{}/pic.jpg", server.uri()), &dest).await;

        assert!(res.is_none());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn empty_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pic.jpg");
        let client = Client::new();
        let res = download_asset(&client, &format!("{}/pic.jpg", server.uri()), &dest).await;

        assert!(res.is_none());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn transport_error_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pic.jpg");
        let client = Client::new();
        // Nothing listens on port 9 of the loopback interface
        let res = download_asset(&client, "http://127.0.0.1:9/pic.jpg", &dest).await;

        assert!(res.is_none());
    }
}
