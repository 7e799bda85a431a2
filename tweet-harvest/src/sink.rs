use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::record::{OutputRecord, HEADER};

/// Append-only CSV file of harvested tweets.
///
/// The file is truncated and given its header on creation, then reopened in
/// append mode for every row so a crash never loses a written record.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let header = encode(|w| w.write_record(HEADER))?;
        fs::write(&path, header)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self { path })
    }

    pub async fn append(&self, record: &OutputRecord) -> Result<()> {
        let row = encode(|w| w.serialize(record))?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(&row).await?;
        file.flush().await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Run `f` against an in-memory CSV writer and return the bytes it wrote.
fn encode<F>(f: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(vec![]);
    f(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to encode csv row: {}", e.error()))
}
