//! Bounded, redirect-following download of a remote sound file.
//!
//! The body is streamed into a `.part` file beside the destination and only
//! renamed into place once the whole transfer succeeded. Every other exit
//! path drops the partial file.

use crate::error::FetchError;
use crate::http::{check_scheme, parse_download_url};
use crate::transport::{HttpTransport, TransportResponse, UreqTransport};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Extension used when the URL path has none.
pub const DEFAULT_EXTENSION: &str = "mp3";

const CHUNK_SIZE: usize = 8 * 1024;

/// Size and redirect bounds for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_bytes: u64,
    pub max_redirects: u32,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            max_redirects: 5,
        }
    }
}

/// Downloads remote sounds into a destination directory.
pub struct Fetcher<T: HttpTransport = UreqTransport> {
    transport: T,
    destination_dir: PathBuf,
    limits: FetchLimits,
}

impl Fetcher<UreqTransport> {
    /// Fetcher over the real network. `destination_dir` must already exist.
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self::with_transport(UreqTransport::new(), destination_dir)
    }
}

impl<T: HttpTransport> Fetcher<T> {
    pub fn with_transport(transport: T, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            destination_dir: destination_dir.into(),
            limits: FetchLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: FetchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    pub fn limits(&self) -> FetchLimits {
        self.limits
    }

    /// Download `url` and return the path of the saved file.
    ///
    /// Redirects restart the request against the new location, up to
    /// `max_redirects` times.
    pub fn download(&self, url: &str) -> Result<PathBuf, FetchError> {
        let mut current = parse_download_url(url)?;
        let mut redirects = 0u32;

        loop {
            log::debug!("Fetching {}", current);
            let response = self
                .transport
                .get(&current)
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            match response.status {
                200 => return self.save_body(&current, response),
                status if is_redirect(status) => {
                    let Some(location) = response.location else {
                        return Err(FetchError::Redirect {
                            status,
                            url: current.to_string(),
                        });
                    };
                    if redirects >= self.limits.max_redirects {
                        return Err(FetchError::TooManyRedirects {
                            limit: self.limits.max_redirects,
                        });
                    }
                    redirects += 1;

                    let next = current.join(&location).map_err(|e| FetchError::InvalidUrl {
                        url: location.clone(),
                        reason: e.to_string(),
                    })?;
                    check_scheme(&next)?;
                    log::info!("Redirect {} ({}): {} -> {}", redirects, status, current, next);
                    current = next;
                }
                status => {
                    return Err(FetchError::Status {
                        status,
                        url: current.to_string(),
                    });
                }
            }
        }
    }

    fn save_body(&self, url: &Url, response: TransportResponse) -> Result<PathBuf, FetchError> {
        let limit = self.limits.max_bytes;
        if let Some(declared) = response.content_length
            && declared > limit
        {
            log::warn!("{} declares {} bytes, over the {} limit", url, declared, limit);
            return Err(FetchError::SizeExceeded { limit });
        }

        let destination = self.destination_dir.join(destination_file_name(url));
        let mut partial = PartialFile::create(&destination)?;
        let mut body = response.body;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut received: u64 = 0;

        loop {
            let n = match body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(FetchError::Transport(format!(
                        "reading body of '{}' failed: {}",
                        url, e
                    )));
                }
            };

            received += n as u64;
            if received > limit {
                log::warn!("{} exceeded the {} byte limit, aborting", url, limit);
                return Err(FetchError::SizeExceeded { limit });
            }
            partial.write_all(&buf[..n])?;
        }

        let path = partial.commit()?;
        log::info!("Downloaded {} ({} bytes) to {}", url, received, path.display());
        Ok(path)
    }
}

impl<T: HttpTransport + 'static> Fetcher<T> {
    /// Run [`Fetcher::download`] on tokio's blocking pool.
    pub async fn download_async(self: Arc<Self>, url: String) -> Result<PathBuf, FetchError> {
        tokio::task::spawn_blocking(move || self.download(&url))
            .await
            .map_err(|e| FetchError::Transport(format!("download task failed: {e}")))?
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// `<UTC timestamp>-<random>.<ext>`, with the extension taken from the URL path.
pub fn destination_file_name(url: &Url) -> String {
    let extension = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| Path::new(last).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}.{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S%3f"),
        &token[..8],
        extension
    )
}

/// A `.part` file that removes itself unless committed.
struct PartialFile {
    writer: Option<BufWriter<File>>,
    part_path: PathBuf,
    destination: PathBuf,
}

impl PartialFile {
    fn create(destination: &Path) -> std::io::Result<Self> {
        let mut part_name = destination.as_os_str().to_os_string();
        part_name.push(".part");
        let part_path = PathBuf::from(part_name);
        let file = File::create(&part_path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            part_path,
            destination: destination.to_path_buf(),
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(bytes),
            None => Err(std::io::Error::other("partial file already closed")),
        }
    }

    /// Flush, close and move the file onto its final path.
    fn commit(mut self) -> std::io::Result<PathBuf> {
        if let Some(writer) = self.writer.take() {
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&self.part_path, &self.destination)?;
        Ok(self.destination.clone())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Close before removing; Windows refuses to delete open files.
        self.writer.take();
        if self.part_path.exists()
            && let Err(e) = fs::remove_file(&self.part_path)
        {
            log::warn!(
                "Failed to remove partial download {}: {}",
                self.part_path.display(),
                e
            );
        }
    }
}
