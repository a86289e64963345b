//! File sinks at the end of the output and error channels.
//!
//! Each sink owns its receiver, writes until every sender is gone, flushes,
//! and returns the number of bytes written.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

use crate::domain::ErrorReport;

/// A created, buffered output file waiting for its channel.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create (or truncate) `path`, making parent directories as needed.
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let file = File::create(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every chunk received.
    pub async fn record_bytes(mut self, mut rx: mpsc::Receiver<Vec<u8>>) -> std::io::Result<u64> {
        let mut written = 0u64;

        while let Some(chunk) = rx.recv().await {
            self.writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        self.writer.flush().await?;
        tracing::debug!(path = %self.path.display(), bytes = written, "Sink closed");
        Ok(written)
    }

    /// Write every error report received, one message line followed by the
    /// offending bytes.
    pub async fn record_errors(
        mut self,
        mut rx: mpsc::Receiver<ErrorReport>,
    ) -> std::io::Result<u64> {
        let mut written = 0u64;

        while let Some(report) = rx.recv().await {
            let bytes = report.to_bytes();
            self.writer.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }

        self.writer.flush().await?;
        tracing::debug!(path = %self.path.display(), bytes = written, "Error sink closed");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_bytes_creates_dir_and_writes_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let (tx, rx) = mpsc::channel(2);

        let sink = tokio::spawn(FileSink::create(&path).await.unwrap().record_bytes(rx));
        for chunk in ["{\"data\": [ ", "{\"id\":\"A\"}", " ] } "] {
            tx.send(chunk.as_bytes().to_vec()).await.unwrap();
        }
        drop(tx);

        let written = sink.await.unwrap().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"data\": [ {\"id\":\"A\"} ] } ");
        assert_eq!(written, content.len() as u64);
    }

    #[tokio::test]
    async fn test_record_errors_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        let (tx, rx) = mpsc::channel(2);

        let sink = tokio::spawn(FileSink::create(&path).await.unwrap().record_errors(rx));
        tx.send(ErrorReport::new("first", b"body-1".to_vec()))
            .await
            .unwrap();
        tx.send(ErrorReport::new("second", Vec::new())).await.unwrap();
        drop(tx);

        tokio_test::assert_ok!(sink.await.unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nbody-1\nsecond\n\n");
    }

    #[tokio::test]
    async fn test_create_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = FileSink::create(&blocker.join("out.json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_truncates_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, b"stale content").unwrap();

        let sink = FileSink::create(&path).await.unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }
}
