use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::app::{ProgressEvent, ProgressSink};
use crate::error::ProvisionError;

pub trait ArchiveClient: Send + Sync {
    /// Streams `url` into `destination` in chunks of at most `chunk_size` bytes,
    /// reporting progress after every chunk. Returns the number of bytes written.
    fn download(
        &self,
        url: &str,
        destination: &Path,
        chunk_size: usize,
        sink: &dyn ProgressSink,
    ) -> Result<u64, ProvisionError>;
}

#[derive(Clone)]
pub struct HttpArchiveClient {
    client: Client,
}

impl HttpArchiveClient {
    pub fn new() -> Result<Self, ProvisionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("aura-data/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ProvisionError::ClientSetup(err.to_string()))?,
        );
        // Connecting is bounded, reading the body is not.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| ProvisionError::ClientSetup(err.to_string()))?;
        Ok(Self { client })
    }
}

impl ArchiveClient for HttpArchiveClient {
    fn download(
        &self,
        url: &str,
        destination: &Path,
        chunk_size: usize,
        sink: &dyn ProgressSink,
    ) -> Result<u64, ProvisionError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| network_error(url, err.to_string()))?;
        if !response.status().is_success() {
            return Err(ProvisionError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let total = response.content_length();
        debug!("content length of {url}: {total:?}");

        let mut file = File::create(destination).map_err(|err| {
            ProvisionError::Filesystem(format!("create {}: {err}", destination.display()))
        })?;
        let mut buffer = vec![0u8; chunk_size.max(1)];
        let mut downloaded = 0u64;
        loop {
            let read = match response.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(network_error(url, err.to_string())),
            };
            file.write_all(&buffer[..read])
                .map_err(|err| ProvisionError::Filesystem(err.to_string()))?;
            downloaded += read as u64;
            sink.event(ProgressEvent::Progress { downloaded, total });
        }
        file.flush()
            .map_err(|err| ProvisionError::Filesystem(err.to_string()))?;
        Ok(downloaded)
    }
}

fn network_error(url: &str, message: String) -> ProvisionError {
    ProvisionError::Network {
        url: url.to_string(),
        message,
    }
}
