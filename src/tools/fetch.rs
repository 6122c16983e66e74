//! Streaming download with percent progress, followed by extraction.

use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::extract::extract_zip_to_dir;
use crate::error::{Error, IoContext, Result};

/// Connection timeout: time to establish TCP connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read timeout: maximum time to wait for data between chunks
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for tool downloads
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cm-modkit/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Expected download size, as announced by `Content-Length`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalSize {
    Known(u64),
    Unknown,
}

impl From<Option<u64>> for TotalSize {
    fn from(len: Option<u64>) -> Self {
        match len {
            // A zero length gives no usable denominator either
            Some(0) | None => TotalSize::Unknown,
            Some(n) => TotalSize::Known(n),
        }
    }
}

/// Turns byte counts into a non-decreasing 0-100 percentage.
///
/// With an unknown total the percentage stays at 0 until `finish`.
#[derive(Debug)]
pub struct ProgressTracker {
    total: TotalSize,
    downloaded: u64,
    percent: u8,
}

impl ProgressTracker {
    pub fn new(total: TotalSize) -> Self {
        Self {
            total,
            downloaded: 0,
            percent: 0,
        }
    }

    /// Record `bytes` more and return the current percentage
    pub fn advance(&mut self, bytes: u64) -> u8 {
        self.downloaded += bytes;
        if let TotalSize::Known(total) = self.total {
            let pct = (self.downloaded.saturating_mul(100) / total).min(100) as u8;
            self.percent = self.percent.max(pct);
        }
        self.percent
    }

    pub fn finish(&mut self) -> u8 {
        self.percent = 100;
        self.percent
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }
}

/// Write every chunk of `stream` to `file`, sending the percentage after
/// each chunk and 100 once the stream ends.
///
/// A closed progress receiver is ignored; the download carries on without
/// an observer.
pub async fn stream_to_file<S, B, E>(
    mut stream: S,
    total: TotalSize,
    file: &mut File,
    progress: &UnboundedSender<u8>,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut tracker = ProgressTracker::new(total);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Network(format!("Failed to read chunk: {}", e)))?;
        let bytes = chunk.as_ref();
        file.write_all(bytes)
            .await
            .io_context(|| "Failed to write chunk".to_string())?;

        let _ = progress.send(tracker.advance(bytes.len() as u64));
    }

    file.flush()
        .await
        .io_context(|| "Failed to flush file".to_string())?;

    let _ = progress.send(tracker.finish());
    Ok(tracker.downloaded())
}

/// Download `url` to `archive_path`, extract it into `install_dir`, then
/// delete the archive.
///
/// On a network or extraction failure the (partial) archive is left where
/// it is and nothing is retried. Returns `install_dir`.
pub async fn fetch_and_install(
    client: &HttpClient,
    url: &str,
    archive_path: &Path,
    install_dir: &Path,
    progress: UnboundedSender<u8>,
) -> Result<PathBuf> {
    info!("Downloading {}", url);

    let response = client
        .inner()
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Network(format!("Connection failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(format!("HTTP {} for {}", status.as_u16(), url)));
    }

    let total = TotalSize::from(response.content_length());
    debug!("Expected size: {:?}", total);

    if let Some(parent) = archive_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .io_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = File::create(archive_path)
        .await
        .io_context(|| format!("Failed to create {}", archive_path.display()))?;

    let written = match stream_to_file(response.bytes_stream(), total, &mut file, &progress).await
    {
        Ok(n) => n,
        Err(e) => {
            warn!("Download failed, partial archive kept at {}", archive_path.display());
            return Err(e);
        }
    };
    drop(file);

    info!("Downloaded {} bytes to {}", written, archive_path.display());

    let archive = archive_path.to_path_buf();
    let target = install_dir.to_path_buf();
    let extracted = tokio::task::spawn_blocking(move || extract_zip_to_dir(&archive, &target))
        .await
        .map_err(|e| Error::Io {
            context: "Extraction task failed".to_string(),
            source: std::io::Error::other(e),
        })??;

    info!("Extracted {} files into {}", extracted, install_dir.display());

    tokio::fs::remove_file(archive_path)
        .await
        .io_context(|| format!("Failed to delete {}", archive_path.display()))?;

    Ok(install_dir.to_path_buf())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tools::extract::tests::build_zip;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::unbounded_channel;

    /// Serve one canned HTTP response on loopback and return its URL
    pub(crate) async fn serve_once(status: &str, body: Vec<u8>, content_length: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;

            let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
            if content_length {
                head.push_str(&format!("Content-Length: {}\r\n", body.len()));
            }
            head.push_str("\r\n");

            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/tool.zip", addr)
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<u8>) -> Vec<u8> {
        let mut values = Vec::new();
        while let Ok(v) = rx.try_recv() {
            values.push(v);
        }
        values
    }

    fn assert_progress(values: &[u8]) {
        assert!(!values.is_empty());
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
        assert!(values.iter().all(|v| *v <= 100));
        assert_eq!(*values.last().unwrap(), 100);
    }

    #[test]
    fn test_tracker_known_total() {
        let mut tracker = ProgressTracker::new(TotalSize::Known(400));
        assert_eq!(tracker.advance(100), 25);
        assert_eq!(tracker.advance(1), 25);
        assert_eq!(tracker.advance(299), 100);
        // More bytes than announced never exceed 100
        assert_eq!(tracker.advance(50), 100);
    }

    #[test]
    fn test_tracker_unknown_total() {
        assert_eq!(TotalSize::from(None), TotalSize::Unknown);
        assert_eq!(TotalSize::from(Some(0)), TotalSize::Unknown);

        let mut tracker = ProgressTracker::new(TotalSize::Unknown);
        assert_eq!(tracker.advance(1024), 0);
        assert_eq!(tracker.advance(1024), 0);
        assert_eq!(tracker.finish(), 100);
        assert_eq!(tracker.downloaded(), 2048);
    }

    #[tokio::test]
    async fn test_stream_progress_is_monotonic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        let mut file = File::create(&path).await.unwrap();
        let chunks: Vec<std::result::Result<Vec<u8>, String>> =
            (0..10).map(|i| Ok(vec![i as u8; 1000])).collect();
        let (tx, mut rx) = unbounded_channel();

        let written = stream_to_file(
            futures::stream::iter(chunks),
            TotalSize::Known(10_000),
            &mut file,
            &tx,
        )
        .await
        .unwrap();

        assert_eq!(written, 10_000);
        let values = drain(&mut rx);
        assert_eq!(values.len(), 11);
        assert_eq!(values[0], 10);
        assert_progress(&values);
        assert_eq!(std::fs::read(&path).unwrap().len(), 10_000);
    }

    #[tokio::test]
    async fn test_stream_error_is_network_error() {
        let dir = TempDir::new().unwrap();
        let mut file = File::create(dir.path().join("out.bin")).await.unwrap();
        let chunks: Vec<std::result::Result<Vec<u8>, String>> =
            vec![Ok(vec![1; 10]), Err("connection reset".to_string())];
        let (tx, mut rx) = unbounded_channel();

        let err = stream_to_file(
            futures::stream::iter(chunks),
            TotalSize::Known(20),
            &mut file,
            &tx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert_eq!(drain(&mut rx), vec![50]);
    }

    #[tokio::test]
    async fn test_fetch_and_install() {
        let dir = TempDir::new().unwrap();
        let body = build_zip(&[
            ("UABEAvalonia.exe", b"MZ".as_slice()),
            ("lib/x.dll", b"dll".as_slice()),
        ]);
        let url = serve_once("200 OK", body, true).await;

        let archive = dir.path().join("UABEA.zip");
        let install = dir.path().join("additional_programs/UABEA");
        let (tx, mut rx) = unbounded_channel();

        let client = HttpClient::new().unwrap();
        let out = fetch_and_install(&client, &url, &archive, &install, tx)
            .await
            .unwrap();

        assert_eq!(out, install);
        assert!(install.join("UABEAvalonia.exe").exists());
        assert!(install.join("lib/x.dll").exists());
        assert!(!archive.exists());
        assert_progress(&drain(&mut rx));
    }

    #[tokio::test]
    async fn test_fetch_without_content_length() {
        let dir = TempDir::new().unwrap();
        let exe = vec![0u8; 5000];
        let body = build_zip(&[("AssetStudioGUI.exe", exe.as_slice())]);
        let url = serve_once("200 OK", body, false).await;

        let archive = dir.path().join("AssetStudio.zip");
        let install = dir.path().join("AssetStudio");
        let (tx, mut rx) = unbounded_channel();

        let client = HttpClient::new().unwrap();
        fetch_and_install(&client, &url, &archive, &install, tx)
            .await
            .unwrap();

        let values = drain(&mut rx);
        assert_progress(&values);
        assert!(values[..values.len() - 1].iter().all(|v| *v == 0));
        assert!(install.join("AssetStudioGUI.exe").exists());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let dir = TempDir::new().unwrap();
        let url = serve_once("404 Not Found", b"missing".to_vec(), true).await;
        let archive = dir.path().join("UABEA.zip");
        let install = dir.path().join("UABEA");
        let (tx, _rx) = unbounded_channel();

        let client = HttpClient::new().unwrap();
        let err = fetch_and_install(&client, &url, &archive, &install, tx)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert!(!install.exists());
    }

    #[tokio::test]
    async fn test_bad_archive_is_kept() {
        let dir = TempDir::new().unwrap();
        let url = serve_once("200 OK", b"not a zip at all".to_vec(), true).await;
        let archive = dir.path().join("UABEA.zip");
        let install = dir.path().join("UABEA");
        let (tx, _rx) = unbounded_channel();

        let client = HttpClient::new().unwrap();
        let err = fetch_and_install(&client, &url, &archive, &install, tx)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Archive { .. }));
        assert!(archive.exists());
        assert!(!install.exists());
    }
}
