use anyhow::{Context, Result};
use twitter::{AuthenticatedTwitterClient, Session, TwitterClient};

use crate::config::{Config, SessionStrategy};

/// Log in or restore a saved session, whichever the config asks for.
///
/// There is no fallback between the two: a failed restore does not log in.
pub async fn establish(
    client: TwitterClient,
    config: &Config,
) -> Result<AuthenticatedTwitterClient> {
    match config.session.strategy {
        SessionStrategy::Login => {
            tracing::info!(username = %config.credentials.username, "logging in");
            let client =
                AuthenticatedTwitterClient::login(client, &config.credentials.login_info())
                    .await
                    .context("Failed to log in")?;
            tracing::info!("logged in successfully");

            if let Some(file) = &config.session.file {
                client
                    .session()
                    .write(file)
                    .await
                    .context("Failed to save session")?;
                tracing::info!(file = %file.display(), "saved session");
            }
            Ok(client)
        }
        SessionStrategy::Restore => {
            let file = config
                .session
                .file
                .as_ref()
                .context("session.file is required to restore a session")?;
            let session = Session::read(file)
                .await
                .context("Failed to restore session")?;
            let client = AuthenticatedTwitterClient::restore(client, &session)
                .context("Failed to restore session")?;
            tracing::info!(file = %file.display(), "restored session");
            Ok(client)
        }
    }
}
