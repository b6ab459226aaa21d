use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Per-attempt request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Download attempts before giving up and falling back to the cache.
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("server returned status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Capability interface for the remote endpoint. The production
/// implementation is [`HttpClient`]; tests substitute scripted fakes.
pub trait RemoteClient: Send + Sync {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP client with a fixed per-attempt timeout.
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new() -> anyhow::Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("skywall/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { inner })
    }
}

impl RemoteClient for HttpClient {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .inner
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Download `url` into `dest`, retrying up to [`MAX_ATTEMPTS`] times.
///
/// The file is only written after a full successful response, so `dest`
/// never holds a partial body. Returns the last error when every attempt
/// fails; the caller degrades to the cache fallback.
pub fn download_with_retry(
    client: &dyn RemoteClient,
    url: &str,
    dest: &Path,
) -> Result<(), FetchError> {
    let mut last_error = None;

    for attempt in 1..=MAX_ATTEMPTS {
        match client.get_bytes(url) {
            Ok(body) => {
                fs::write(dest, &body).map_err(|source| FetchError::Write {
                    path: dest.display().to_string(),
                    source,
                })?;
                info!(url, dest = %dest.display(), bytes = body.len(), "downloaded wallpaper");
                return Ok(());
            }
            Err(e) => {
                warn!(url, attempt, max = MAX_ATTEMPTS, error = %e, "download attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(FetchError::Network("no attempts made".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails a fixed number of times, then serves distinct bodies per attempt.
    pub struct FlakyClient {
        pub failures: u32,
        calls: AtomicU32,
    }

    impl FlakyClient {
        pub fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl RemoteClient for FlakyClient {
        fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(FetchError::Status(502))
            } else {
                Ok(format!("body-{call}").into_bytes())
            }
        }
    }

    #[test]
    fn succeeds_on_third_attempt_with_that_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wall.jpg");
        let client = FlakyClient::new(2);

        download_with_retry(&client, "http://example/uhd", &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"body-3");
    }

    #[test]
    fn gives_up_after_three_failures() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wall.jpg");
        let client = FlakyClient::new(10);

        let err = download_with_retry(&client, "http://example/uhd", &dest).unwrap_err();

        assert!(matches!(err, FetchError::Status(502)));
        assert!(!dest.exists());
        assert_eq!(client.calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[test]
    fn first_attempt_success_writes_first_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wall.jpg");
        let client = FlakyClient::new(0);

        download_with_retry(&client, "http://example/1080p", &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"body-1");
    }
}
