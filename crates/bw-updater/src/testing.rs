use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use url::Url;

use crate::http::{FetchError, HeadResponse, HttpClient};
use crate::reload::{ReloadError, ReloadSignal};

/// Scripted [`HttpClient`] that counts requests.
pub struct FakeClient {
    reachable: bool,
    head_status: u16,
    get_status: u16,
    failing_sink: bool,
    etag: Mutex<Option<String>>,
    body: Mutex<Vec<u8>>,
    head_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl FakeClient {
    pub fn serving(body: &[u8]) -> Self {
        Self {
            reachable: true,
            head_status: 200,
            get_status: 200,
            failing_sink: false,
            etag: Mutex::new(None),
            body: Mutex::new(body.to_vec()),
            head_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::serving(b"")
        }
    }

    pub fn with_etag(self, etag: &str) -> Self {
        self.set_etag(Some(etag));
        self
    }

    pub fn with_head_status(mut self, status: u16) -> Self {
        self.head_status = status;
        self
    }

    pub fn with_get_status(mut self, status: u16) -> Self {
        self.get_status = status;
        self
    }

    pub fn failing_sink(mut self) -> Self {
        self.failing_sink = true;
        self
    }

    pub fn set_etag(&self, etag: Option<&str>) {
        *self.etag.lock().unwrap() = etag.map(str::to_string);
    }

    pub fn set_body(&self, body: &[u8]) {
        *self.body.lock().unwrap() = body.to_vec();
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for FakeClient {
    async fn head(&self, _url: &Url) -> Result<HeadResponse, FetchError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(FetchError::Unreachable("connection refused".to_string()));
        }
        Ok(HeadResponse {
            status: self.head_status,
            etag: self.etag.lock().unwrap().clone(),
        })
    }

    async fn download(&self, _url: &Url, sink: &mut (dyn Write + Send)) -> Result<u64, FetchError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(FetchError::Unreachable("connection refused".to_string()));
        }
        if !(200..300).contains(&self.get_status) {
            return Err(FetchError::Status(self.get_status));
        }
        if self.failing_sink {
            return Err(FetchError::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        let body = self.body.lock().unwrap().clone();
        sink.write_all(&body)?;
        Ok(body.len() as u64)
    }
}

/// [`ReloadSignal`] that only counts calls.
#[derive(Default)]
pub struct CountingReload {
    calls: AtomicUsize,
}

impl CountingReload {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReloadSignal for CountingReload {
    fn reload(&self) -> Result<(), ReloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
