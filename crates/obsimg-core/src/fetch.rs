//! Blocking HTTP access to the build service.
//!
//! All network reads go through the [`Fetch`] trait so callers can count or
//! stub them in tests. [`HttpFetcher`] is the `reqwest` implementation.

use std::io::{Read, Write};

use reqwest::blocking::Client;
use tracing::{debug, trace};

use crate::ResolveError;

/// Read size for streamed artifact downloads.
const CHUNK_SIZE: usize = 64 * 1024;

/// One GET per call, no retries.
pub trait Fetch {
    /// Fetch the full body of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Network`] on transport failure or a
    /// non-success status.
    fn get(&self, url: &str) -> Result<Vec<u8>, ResolveError>;

    /// Stream the body of `url` into `sink`, reporting `(received, total)`
    /// as bytes arrive. Returns the number of bytes written.
    ///
    /// The default implementation reads the whole body with [`Fetch::get`]
    /// and reports once.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Network`] on transport failure and
    /// [`ResolveError::Io`] if `sink` rejects a write.
    fn download(
        &self,
        url: &str,
        sink: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, ResolveError> {
        let body = self.get(url)?;
        sink.write_all(&body)?;
        let len = body.len() as u64;
        progress(len, Some(len));
        Ok(len)
    }

    /// Fetch `url` as UTF-8 text.
    fn get_text(&self, url: &str) -> Result<String, ResolveError> {
        let body = self.get(url)?;
        String::from_utf8(body).map_err(|e| ResolveError::parse(url, e))
    }
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn get(&self, url: &str) -> Result<Vec<u8>, ResolveError> {
        (**self).get(url)
    }

    fn download(
        &self,
        url: &str,
        sink: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, ResolveError> {
        (**self).download(url, sink, progress)
    }
}

/// [`Fetch`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response, ResolveError> {
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .map_err(|e| ResolveError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::network(url, format!("HTTP {status}")));
        }

        trace!("{url} -> {status}");
        Ok(response)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, ResolveError> {
        let response = self.send(url)?;
        let bytes = response.bytes().map_err(|e| ResolveError::network(url, e))?;
        Ok(bytes.to_vec())
    }

    fn download(
        &self,
        url: &str,
        sink: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, ResolveError> {
        let mut response = self.send(url)?;
        let total = response.content_length();

        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut received: u64 = 0;
        progress(0, total);

        loop {
            let n = response
                .read(&mut chunk)
                .map_err(|e| ResolveError::network(url, e))?;
            if n == 0 {
                break;
            }
            sink.write_all(&chunk[..n])?;
            received += n as u64;
            progress(received, total);
        }

        sink.flush()?;
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn get_returns_body() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/file.txt")
            .match_header("user-agent", crate::USER_AGENT)
            .with_status(200)
            .with_body("hello")
            .create();

        let fetcher = HttpFetcher::new();
        let body = fetcher.get_text(&format!("{}/file.txt", server.url())).unwrap();
        assert_eq!(body, "hello");
    }

    #[test]
    fn non_success_status_is_network_error() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/missing").with_status(404).create();

        let url = format!("{}/missing", server.url());
        let err = HttpFetcher::new().get(&url).unwrap_err();
        match err {
            ResolveError::Network { url: failed, reason } => {
                assert_eq!(failed, url);
                assert!(reason.contains("404"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn download_streams_into_sink() {
        let mut server = Server::new();
        let payload = vec![7u8; CHUNK_SIZE * 2 + 10];
        let _m = server
            .mock("GET", "/image.raw.xz")
            .with_status(200)
            .with_body(&payload)
            .create();

        let mut sink = Vec::new();
        let mut reports = Vec::new();
        let written = HttpFetcher::new()
            .download(
                &format!("{}/image.raw.xz", server.url()),
                &mut sink,
                &mut |c: u64, t: Option<u64>| reports.push((c, t)),
            )
            .unwrap();

        assert_eq!(sink, payload);
        assert_eq!(written, payload.len() as u64);
        assert_eq!(reports.first(), Some(&(0, Some(payload.len() as u64))));
        assert_eq!(reports.last().map(|r| r.0), Some(payload.len() as u64));
    }

    #[test]
    fn failed_download_writes_nothing() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/gone.raw.xz").with_status(500).create();

        let mut sink = Vec::new();
        let err = HttpFetcher::new()
            .download(&format!("{}/gone.raw.xz", server.url()), &mut sink, &mut |_, _| {})
            .unwrap_err();

        assert!(matches!(err, ResolveError::Network { .. }), "{err}");
        assert!(sink.is_empty());
    }
}
