//! Wire transcripts.
//!
//! [`TranscriptRecorder`] wraps any [`Transport`] and appends a plain-text log
//! of every exchange to a shared buffer:
//!
//! ```text
//! opening connection to secure.nmi.com:443...
//! opened
//! <- "POST /api/transact.php HTTP/1.1\r\ncontent-type: application/x-www-form-urlencoded\r\nhost: secure.nmi.com\r\n\r\n"
//! <- "type=sale&amount=1.00&ccnumber=4111111111111111"
//! -> "HTTP/1.1 200 OK\r\n"
//! -> "content-type: text/html\r\n"
//! -> "\r\n"
//! reading 33 bytes...
//! -> "response=1&responsetext=SUCCESS"
//! read 33 bytes
//! Conn close
//! ```
//!
//! The log contains raw card data and credentials. Pass it through the
//! adapter's [`Scrubber`](cardgate::Scrubber) before storing or displaying it.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use http::HeaderMap;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// A [`Transport`] decorator that records a wire transcript.
#[derive(Debug, Clone)]
pub struct TranscriptRecorder<T> {
    inner: T,
    log: Arc<Mutex<String>>,
}

impl<T> TranscriptRecorder<T> {
    /// Wraps `inner` with an empty transcript.
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            log: Arc::new(Mutex::new(String::new())),
        }
    }

    /// The transcript recorded so far.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the transcript and clears the buffer.
    #[must_use]
    pub fn take_transcript(&self) -> String {
        std::mem::take(&mut *self.log.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// The wrapped transport.
    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    fn append(&self, text: &str) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }
}

#[async_trait]
impl<T: Transport> Transport for TranscriptRecorder<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.append(&render_request(&request));
        let result = self.inner.send(request).await;
        match &result {
            Ok(response) => self.append(&render_response(response)),
            Err(err) => {
                let mut text = String::new();
                let _ = writeln!(text, "ERROR: {err}");
                text.push_str("Conn close\n");
                self.append(&text);
            }
        }
        result
    }
}

fn render_request(request: &HttpRequest) -> String {
    let host = request.url.host_str().unwrap_or_default();
    let port = request.url.port_or_known_default().unwrap_or_default();
    let mut target = request.url.path().to_owned();
    if let Some(query) = request.url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut head = format!("{} {target} HTTP/1.1\r\n", request.method);
    push_headers(&mut head, &request.headers);
    if !request.headers.contains_key(http::header::HOST) {
        let _ = write!(head, "host: {host}\r\n");
    }
    head.push_str("\r\n");

    let mut text = String::new();
    let _ = writeln!(text, "opening connection to {host}:{port}...");
    text.push_str("opened\n");
    let _ = writeln!(text, "<- \"{}\"", escape(head.as_bytes()));
    if !request.body.is_empty() {
        let _ = writeln!(text, "<- \"{}\"", escape(&request.body));
    }
    text
}

fn render_response(response: &HttpResponse) -> String {
    let mut text = String::new();
    let reason = response.status.canonical_reason().unwrap_or_default();
    let _ = writeln!(
        text,
        "-> \"HTTP/1.1 {} {reason}\\r\\n\"",
        response.status.as_u16()
    );
    for (name, value) in &response.headers {
        let mut line = format!("{name}: ");
        line.push_str(&String::from_utf8_lossy(value.as_bytes()));
        line.push_str("\r\n");
        let _ = writeln!(text, "-> \"{}\"", escape(line.as_bytes()));
    }
    text.push_str("-> \"\\r\\n\"\n");
    let _ = writeln!(text, "reading {} bytes...", response.body.len());
    if !response.body.is_empty() {
        let _ = writeln!(text, "-> \"{}\"", escape(&response.body));
    }
    let _ = writeln!(text, "read {} bytes", response.body.len());
    text.push_str("Conn close\n");
    text
}

fn push_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
}

/// Escapes bytes for a transcript line. Invalid UTF-8 becomes U+FFFD.
fn escape(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:04x}}}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}
