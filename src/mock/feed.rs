//! Mock feed transport

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::feed::{FeedError, FeedTransport, RemoteAddress, UploadDisposition};

/// Failure to inject for a mock operation
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Fail as a per-upload timeout
    Timeout,
    /// Fail as a transport error with the given detail
    Transport(String),
}

impl MockFailure {
    fn to_error(&self, timeout: Duration) -> FeedError {
        match self {
            MockFailure::Timeout => FeedError::Timeout(timeout),
            MockFailure::Transport(detail) => FeedError::Transport(detail.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct Gauge {
    current: usize,
    max: usize,
}

/// Configurable in-memory feed
///
/// Remote objects live in a map keyed by the address's display form.
/// Failures are injected per address and operation; every call is
/// counted so tests can assert what the publisher actually did.
#[derive(Debug, Default)]
pub struct MockFeed {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    upload_failures: Mutex<HashMap<String, MockFailure>>,
    exists_failures: Mutex<HashMap<String, MockFailure>>,
    fetch_failures: Mutex<HashMap<String, MockFailure>>,
    upload_delay: Mutex<Option<Duration>>,
    uploads: Mutex<Vec<(String, bool)>>,
    exists_calls: Mutex<u32>,
    fetch_calls: Mutex<u32>,
    gauge: Mutex<Gauge>,
}

impl MockFeed {
    /// Create an empty mock feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing remote object
    pub fn preload(&self, remote: &RemoteAddress, content: Vec<u8>) {
        self.objects.lock().unwrap().insert(remote.to_string(), content);
    }

    /// Content of a remote object, if present
    pub fn object(&self, remote: &RemoteAddress) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(&remote.to_string()).cloned()
    }

    /// Inject a failure for uploads to one address
    pub fn fail_upload(&self, remote: &RemoteAddress, failure: MockFailure) {
        self.upload_failures
            .lock()
            .unwrap()
            .insert(remote.to_string(), failure);
    }

    /// Inject a failure for existence checks on one address
    pub fn fail_exists(&self, remote: &RemoteAddress, failure: MockFailure) {
        self.exists_failures
            .lock()
            .unwrap()
            .insert(remote.to_string(), failure);
    }

    /// Inject a failure for content fetches from one address
    pub fn fail_fetch(&self, remote: &RemoteAddress, failure: MockFailure) {
        self.fetch_failures
            .lock()
            .unwrap()
            .insert(remote.to_string(), failure);
    }

    /// Delay every upload, widening the window concurrency is observable in
    pub fn delay_uploads(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    /// Number of upload calls made
    pub fn upload_calls(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    /// Addresses uploaded to, with the overwrite flag each call carried
    pub fn uploads(&self) -> Vec<(String, bool)> {
        self.uploads.lock().unwrap().clone()
    }

    /// Number of existence checks made
    pub fn exists_calls(&self) -> u32 {
        *self.exists_calls.lock().unwrap()
    }

    /// Number of content fetches made
    pub fn fetch_calls(&self) -> u32 {
        *self.fetch_calls.lock().unwrap()
    }

    /// Highest number of uploads ever in flight at once
    pub fn max_observed_concurrency(&self) -> usize {
        self.gauge.lock().unwrap().max
    }

    fn enter_upload(&self) {
        let mut gauge = self.gauge.lock().unwrap();
        gauge.current += 1;
        gauge.max = gauge.max.max(gauge.current);
    }

    fn exit_upload(&self) {
        self.gauge.lock().unwrap().current -= 1;
    }
}

impl FeedTransport for MockFeed {
    fn upload(
        &self,
        local_path: &Path,
        remote: &RemoteAddress,
        overwrite: bool,
        timeout: Duration,
    ) -> Result<UploadDisposition, FeedError> {
        let key = remote.to_string();
        self.uploads.lock().unwrap().push((key.clone(), overwrite));
        self.enter_upload();

        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let result = (|| {
            if let Some(failure) = self.upload_failures.lock().unwrap().get(&key) {
                return Err(failure.to_error(timeout));
            }

            let mut objects = self.objects.lock().unwrap();
            if objects.contains_key(&key) && !overwrite {
                return Ok(UploadDisposition::AlreadyExists);
            }

            let content = fs::read(local_path)?;
            objects.insert(key.clone(), content);
            Ok(UploadDisposition::Uploaded)
        })();

        self.exit_upload();
        result
    }

    fn exists(&self, remote: &RemoteAddress) -> Result<bool, FeedError> {
        *self.exists_calls.lock().unwrap() += 1;

        let key = remote.to_string();
        if let Some(failure) = self.exists_failures.lock().unwrap().get(&key) {
            return Err(failure.to_error(Duration::ZERO));
        }

        Ok(self.objects.lock().unwrap().contains_key(&key))
    }

    fn fetch_content(&self, remote: &RemoteAddress) -> Result<Vec<u8>, FeedError> {
        *self.fetch_calls.lock().unwrap() += 1;

        let key = remote.to_string();
        if let Some(failure) = self.fetch_failures.lock().unwrap().get(&key) {
            return Err(failure.to_error(Duration::ZERO));
        }

        self.objects
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedKind;
    use tempfile::TempDir;

    #[test]
    fn test_preload_and_fetch() {
        let feed = MockFeed::new();
        let addr = RemoteAddress::new(FeedKind::BlobContainer, "a.bin");

        feed.preload(&addr, b"seeded".to_vec());

        assert!(feed.exists(&addr).unwrap());
        assert_eq!(feed.fetch_content(&addr).unwrap(), b"seeded");
        assert_eq!(feed.exists_calls(), 1);
        assert_eq!(feed.fetch_calls(), 1);
    }

    #[test]
    fn test_upload_respects_overwrite_flag() {
        let work = TempDir::new().unwrap();
        let local = work.path().join("a.bin");
        fs::write(&local, b"new").unwrap();

        let feed = MockFeed::new();
        let addr = RemoteAddress::new(FeedKind::BlobContainer, "a.bin");
        feed.preload(&addr, b"old".to_vec());

        let disposition = feed
            .upload(&local, &addr, false, Duration::from_secs(1))
            .unwrap();
        assert_eq!(disposition, UploadDisposition::AlreadyExists);
        assert_eq!(feed.object(&addr).unwrap(), b"old");

        let disposition = feed
            .upload(&local, &addr, true, Duration::from_secs(1))
            .unwrap();
        assert_eq!(disposition, UploadDisposition::Uploaded);
        assert_eq!(feed.object(&addr).unwrap(), b"new");
    }

    #[test]
    fn test_injected_upload_timeout() {
        let work = TempDir::new().unwrap();
        let local = work.path().join("a.bin");
        fs::write(&local, b"x").unwrap();

        let feed = MockFeed::new();
        let addr = RemoteAddress::new(FeedKind::BlobContainer, "a.bin");
        feed.fail_upload(&addr, MockFailure::Timeout);

        let err = feed
            .upload(&local, &addr, false, Duration::from_secs(7))
            .unwrap_err();
        assert!(matches!(err, FeedError::Timeout(d) if d == Duration::from_secs(7)));
        assert!(feed.object(&addr).is_none());
    }
}
