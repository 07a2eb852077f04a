use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::CmsClient;
use crate::error::{CmsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    /// The destination already existed; nothing was fetched.
    Skipped,
}

impl CmsClient {
    /// Stream `url` into `dest` unless `dest` already exists.
    ///
    /// Bytes go to a `.part` sibling first and are renamed into place once
    /// the body is complete, so an interrupted transfer never leaves a file
    /// that a later run would skip.
    pub async fn download_file(&self, url: &str, dest: &Path) -> Result<DownloadOutcome> {
        if tokio::fs::try_exists(dest).await? {
            return Ok(DownloadOutcome::Skipped);
        }

        let part = part_path(dest);
        match self.stream_to(url, &part).await {
            Ok(bytes) => {
                commit(&part, dest).await?;
                debug!(%url, bytes, "Downloaded");
                Ok(DownloadOutcome::Downloaded { bytes })
            }
            Err(reason) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(CmsError::Download {
                    url: url.to_string(),
                    path: dest.to_path_buf(),
                    reason: reason.to_string(),
                })
            }
        }
    }

    async fn stream_to(&self, url: &str, part: &Path) -> Result<u64> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(part).await?;
        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(bytes)
    }
}

/// Move a finished `.part` file into place, removing it if that fails.
async fn commit(part: &Path, dest: &Path) -> Result<()> {
    if let Err(e) = tokio::fs::rename(part, dest).await {
        let _ = tokio::fs::remove_file(part).await;
        return Err(e.into());
    }
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
