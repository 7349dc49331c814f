//! Smart-HTTP transport on top of a buffered HTTP primitive.
//!
//! libgit2 drives a subtransport through `Read`/`Write` streams and expects to
//! write a request body in pieces, then read the response back in pieces. The
//! host primitive ([`BufferedHttp`]) only knows whole buffers, so each stream
//! records outbound chunks until the first read, drains them into one body,
//! issues a single call, and replays the response as a one-element chunk
//! stream.
//!
//! The adapter never interprets the HTTP status. The smart-HTTP stream sits on
//! top of it and decides what a non-2xx status means for the git protocol.

use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use git2::transport::{Service, SmartSubtransport, SmartSubtransportStream, Transport};
use pagesync_http::{BufferedHttp, CredentialCallback, HttpRequest, HttpResponse};

use crate::error::{Error, Result};

/// Message prefix for rejected credentials, matched when classifying errors.
pub(crate) const AUTH_FAILED_MESSAGE: &str = "authentication failed";

const USER_AGENT: &str = concat!("git/2.0 (pagesync/", env!("CARGO_PKG_VERSION"), ")");

// === Buffered <-> streaming adapter ===

/// Response chunks produced from a single buffered body.
///
/// Always yields exactly one chunk (possibly empty).
#[derive(Debug)]
pub struct ResponseChunks {
    inner: std::option::IntoIter<Vec<u8>>,
}

impl ResponseChunks {
    fn single(body: Vec<u8>) -> Self {
        Self {
            inner: Some(body).into_iter(),
        }
    }
}

impl Iterator for ResponseChunks {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// A buffered response re-exposed in streaming shape.
#[derive(Debug)]
pub struct StreamedResponse {
    /// Status code, unmodified.
    pub status: u16,
    /// Status text (the numeric code; the primitive carries no reason phrase).
    pub status_message: String,
    /// Response headers, unmodified.
    pub headers: Vec<(String, String)>,
    /// Body as a chunk stream.
    pub body: ResponseChunks,
}

impl StreamedResponse {
    /// Look up a header value (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl From<HttpResponse> for StreamedResponse {
    fn from(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            status_message: response.status.to_string(),
            headers: response.headers,
            body: ResponseChunks::single(response.body),
        }
    }
}

/// Perform one protocol round over the buffered primitive.
///
/// The outbound chunk stream, when present, is drained completely into one
/// contiguous body before the call is made.
///
/// # Errors
/// Returns error only if the primitive produced no response at all.
pub fn round_trip<I>(
    http: &dyn BufferedHttp,
    url: &str,
    method: &str,
    headers: Vec<(String, String)>,
    body: Option<I>,
) -> io::Result<StreamedResponse>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let body = body.map(|chunks| chunks.into_iter().flatten().collect::<Vec<u8>>());
    let request = HttpRequest {
        url: url.to_owned(),
        method: method.to_owned(),
        headers,
        body,
    };
    let response = http.send(request).map_err(io::Error::other)?;
    Ok(response.into())
}

/// `Read` over a chunk stream.
struct ChunkReader {
    chunks: ResponseChunks,
    current: Cursor<Vec<u8>>,
}

impl ChunkReader {
    fn new(chunks: ResponseChunks) -> Self {
        Self {
            chunks,
            current: Cursor::new(Vec::new()),
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.current.read(buf)?;
            if n > 0 || buf.is_empty() {
                return Ok(n);
            }
            match self.chunks.next() {
                Some(chunk) => self.current = Cursor::new(chunk),
                None => return Ok(0),
            }
        }
    }
}

// === Smart HTTP protocol layer ===

struct Session {
    http: Arc<dyn BufferedHttp>,
    credentials: Option<CredentialCallback>,
}

struct SmartHttp {
    session: Arc<Session>,
}

impl SmartSubtransport for SmartHttp {
    fn action(
        &self,
        url: &str,
        action: Service,
    ) -> std::result::Result<Box<dyn SmartSubtransportStream>, git2::Error> {
        let (service, path, method, advertisement) = match action {
            Service::UploadPackLs => (
                "upload-pack",
                "/info/refs?service=git-upload-pack",
                "GET",
                true,
            ),
            Service::UploadPack => ("upload-pack", "/git-upload-pack", "POST", false),
            Service::ReceivePackLs => (
                "receive-pack",
                "/info/refs?service=git-receive-pack",
                "GET",
                true,
            ),
            Service::ReceivePack => ("receive-pack", "/git-receive-pack", "POST", false),
        };
        let endpoint = format!("{}{}", url.trim_end_matches('/'), path);
        tracing::debug!(%endpoint, method, "smart-http action");

        Ok(Box::new(SmartHttpStream {
            session: Arc::clone(&self.session),
            endpoint,
            service,
            method,
            advertisement,
            outbound: Vec::new(),
            response: None,
        }))
    }

    fn close(&self) -> std::result::Result<(), git2::Error> {
        Ok(())
    }
}

/// One request/response exchange of the smart-HTTP protocol.
struct SmartHttpStream {
    session: Arc<Session>,
    endpoint: String,
    service: &'static str,
    method: &'static str,
    advertisement: bool,
    outbound: Vec<Vec<u8>>,
    response: Option<ChunkReader>,
}

impl SmartHttpStream {
    fn execute(&mut self) -> io::Result<ChunkReader> {
        let mut headers = vec![("User-Agent".to_owned(), USER_AGENT.to_owned())];
        let body = if self.advertisement {
            headers.push(("Accept".to_owned(), "*/*".to_owned()));
            None
        } else {
            headers.push((
                "Content-Type".to_owned(),
                format!("application/x-git-{}-request", self.service),
            ));
            headers.push((
                "Accept".to_owned(),
                format!("application/x-git-{}-result", self.service),
            ));
            Some(std::mem::take(&mut self.outbound))
        };
        if let Some(credentials) = &self.session.credentials {
            headers.push(("Authorization".to_owned(), credentials().basic_header()));
        }

        let response = round_trip(
            self.session.http.as_ref(),
            &self.endpoint,
            self.method,
            headers,
            body,
        )?;
        self.check(&response)?;
        Ok(ChunkReader::new(response.body))
    }

    fn check(&self, response: &StreamedResponse) -> io::Result<()> {
        match response.status {
            200..=299 => {}
            401 | 403 => {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!(
                        "{AUTH_FAILED_MESSAGE} for '{}' (HTTP {})",
                        self.endpoint, response.status_message
                    ),
                ));
            }
            404 => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("repository not found at '{}' (HTTP 404)", self.endpoint),
                ));
            }
            _ => {
                return Err(io::Error::other(format!(
                    "unexpected HTTP status {} from '{}'",
                    response.status_message, self.endpoint
                )));
            }
        }

        let expected = if self.advertisement {
            format!("application/x-git-{}-advertisement", self.service)
        } else {
            format!("application/x-git-{}-result", self.service)
        };
        match response.header("content-type") {
            Some(content_type) if media_type(content_type) == expected => Ok(()),
            Some(content_type) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "expected content type '{expected}' from '{}', got '{content_type}'",
                    self.endpoint
                ),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no content type in response from '{}'", self.endpoint),
            )),
        }
    }
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

impl Write for SmartHttpStream {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.response.is_some() {
            return Err(io::Error::other("request already sent"));
        }
        self.outbound.push(data.to_vec());
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for SmartHttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.response.is_none() {
            let reader = self.execute()?;
            self.response = Some(reader);
        }
        self.response.as_mut().map_or(Ok(0), |reader| reader.read(buf))
    }
}

// === Registration ===

static ACTIVE: RwLock<Option<Arc<Session>>> = RwLock::new(None);
static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Keeps an HTTP session active. Dropping it releases the transport.
#[must_use = "the HTTP session ends when the guard is dropped"]
pub struct SessionGuard {
    _private: (),
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        *ACTIVE.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard").finish_non_exhaustive()
    }
}

/// Route `http://` and `https://` remotes through `http` until the returned
/// guard is dropped.
///
/// The transport is registered with libgit2 on first use. Only one session can
/// be active per process.
///
/// # Errors
/// Returns `SyncInProgress` if another session is active, or
/// `TransportRegistration` if libgit2 refused the transport.
pub fn activate(
    http: Arc<dyn BufferedHttp>,
    credentials: Option<CredentialCallback>,
) -> Result<SessionGuard> {
    register()?;

    let mut active = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
    if active.is_some() {
        return Err(Error::SyncInProgress);
    }
    *active = Some(Arc::new(Session { http, credentials }));
    Ok(SessionGuard { _private: () })
}

#[allow(unsafe_code)]
fn register() -> Result<()> {
    REGISTERED
        .get_or_init(|| {
            for scheme in ["http", "https"] {
                // SAFETY: the OnceLock runs this exactly once per process, and
                // `factory` only touches the lock-protected session slot.
                unsafe { git2::transport::register(scheme, factory) }
                    .map_err(|e| e.message().to_owned())?;
            }
            Ok(())
        })
        .clone()
        .map_err(Error::TransportRegistration)
}

fn factory(remote: &git2::Remote<'_>) -> std::result::Result<Transport, git2::Error> {
    let session = ACTIVE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or_else(|| git2::Error::from_str("no HTTP session is active"))?;
    Transport::smart(remote, true, SmartHttp { session })
}
