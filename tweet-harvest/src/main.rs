use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tweet_harvest::config::Config;
use tweet_harvest::harvester::Harvester;
use tweet_harvest::session;
use tweet_harvest::source::TwitterSearch;
use twitter::TwitterClient;

/// Harvest X search results into a CSV file
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Config file location
    #[clap(short, long, default_value_os_t = default_config_path(), value_parser)]
    config: PathBuf,
}

fn default_config_path() -> PathBuf {
    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }
    directories::ProjectDirs::from("", "", "Tweet Harvest")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or(local)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(_) => process::exit(0),
        Err(err) => {
            tracing::error!("{:#}", err);
            process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let conf = Config::read(&args.config)?;

    let client = session::establish(TwitterClient::new()?, &conf).await?;
    let source = TwitterSearch::new(client, conf.search.search_query());
    let summary = Harvester::new(source, &conf).await?.run().await;

    tracing::info!(
        records = summary.records_written,
        pages = summary.pages_fetched,
        rate_limit_waits = summary.rate_limit_waits,
        stop = ?summary.stop,
        "harvest finished"
    );
    Ok(())
}
