//! HTTP request/response types and the monoio-native HTTPS transport
//!
//! The transport speaks HTTP/1.1 over rustls with `Connection: close`, one
//! connection per request. Responses are read to EOF; chunked bodies are
//! reassembled before they reach the caller.

use crate::errors::{ExchangeError, Result};
use crate::traits::HttpTransport;
use async_trait::async_trait;
use monoio::io::{AsyncReadRent, AsyncWriteRentExt};
use monoio::net::TcpStream;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};
use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::debug;

const USER_AGENT: &str = "bourse/0.1";
const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Option<Vec<u8>>) -> Self {
        self.body = body;
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// HTTPS client on monoio TCP streams with rustls
pub struct MonoioHttpsClient {
    tls_config: Arc<ClientConfig>,
}

impl MonoioHttpsClient {
    pub fn new() -> Result<Self> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(Self {
            tls_config: Arc::new(tls_config),
        })
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let parsed = url::Url::parse(&request.url)?;
        if parsed.scheme() != "https" {
            return Err(ExchangeError::InvalidUrl(format!(
                "only https is supported: {}",
                request.url
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ExchangeError::InvalidUrl("No host in URL".to_string()))?;
        let port = parsed.port().unwrap_or(443);
        let mut target = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            target.push('?');
            target.push_str(query);
        }

        let tcp_stream = TcpStream::connect(format!("{host}:{port}"))
            .await
            .map_err(|e| ExchangeError::Network(format!("TCP connect failed: {e}")))?;

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ExchangeError::Network(format!("Invalid server name: {e:?}")))?;
        let tls_conn = ClientConnection::new(self.tls_config.clone(), server_name)
            .map_err(|e| ExchangeError::Network(format!("TLS setup failed: {e}")))?;

        let mut tls_stream = TlsStream::new(tcp_stream, tls_conn);
        let raw_request = encode_request(request, host, &target);

        debug!("📡 {} {}", request.method, request.url);
        tls_stream.write_all(&raw_request).await?;
        let raw_response = tls_stream.read_to_end().await?;

        parse_http_response(&raw_response)
    }
}

#[async_trait(?Send)]
impl HttpTransport for MonoioHttpsClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute(&request).await
    }
}

fn encode_request(request: &HttpRequest, host: &str, target: &str) -> Vec<u8> {
    let body = request.body.as_deref().unwrap_or_default();
    let mut head = format!(
        "{} {target} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: {USER_AGENT}\r\n\
         Connection: close\r\n\
         Content-Length: {}\r\n",
        request.method,
        body.len()
    );
    for (key, value) in &request.headers {
        head.push_str(&format!("{key}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let mut raw = head.into_bytes();
    raw.extend_from_slice(body);
    raw
}

/// Split a raw HTTP/1.1 response into status, headers and decoded body
pub fn parse_http_response(data: &[u8]) -> Result<HttpResponse> {
    let header_end = data
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or_else(|| {
            ExchangeError::Network("Invalid HTTP response: no header terminator".to_string())
        })?;

    let head = String::from_utf8_lossy(&data[..header_end]);
    let raw_body = &data[header_end + 4..];
    let mut lines = head.lines();

    let status_line = lines
        .next()
        .ok_or_else(|| ExchangeError::Network("Empty response".to_string()))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| ExchangeError::Network(format!("Invalid status line: {status_line}")))?;

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let chunked = find_header(&headers, "Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
    let body = if chunked {
        decode_chunked(raw_body)?
    } else {
        let declared = find_header(&headers, "Content-Length").and_then(|v| v.parse::<usize>().ok());
        match declared {
            Some(len) if len < raw_body.len() => raw_body[..len].to_vec(),
            _ => raw_body.to_vec(),
        }
    };

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>> {
    let malformed = || ExchangeError::Network("Malformed chunked body".to_string());
    let mut body = Vec::with_capacity(data.len());

    loop {
        let line_end = data
            .windows(2)
            .position(|window| window == b"\r\n")
            .ok_or_else(malformed)?;
        let size_line = String::from_utf8_lossy(&data[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| malformed())?;
        data = &data[line_end + 2..];

        if size == 0 {
            break;
        }
        if data.len() < size {
            return Err(malformed());
        }
        body.extend_from_slice(&data[..size]);
        data = data.get(size + 2..).unwrap_or_default();
    }

    Ok(body)
}

/// rustls session over a monoio TCP stream
struct TlsStream {
    stream: TcpStream,
    tls_conn: ClientConnection,
    handshake_complete: bool,
}

impl TlsStream {
    fn new(stream: TcpStream, tls_conn: ClientConnection) -> Self {
        Self {
            stream,
            tls_conn,
            handshake_complete: false,
        }
    }

    async fn flush_tls(&mut self) -> Result<()> {
        while self.tls_conn.wants_write() {
            let mut out = Vec::with_capacity(8192);
            self.tls_conn
                .write_tls(&mut out)
                .map_err(|e| ExchangeError::Network(format!("TLS write failed: {e}")))?;
            if !out.is_empty() {
                let (result, _) = self.stream.write_all(out).await;
                result.map_err(|e| ExchangeError::Network(format!("TCP write failed: {e}")))?;
            }
        }
        Ok(())
    }

    /// Feed one read from the socket into the TLS session. `false` on EOF.
    async fn fill_tls(&mut self) -> Result<bool> {
        let (result, buf) = self.stream.read(vec![0u8; READ_CHUNK]).await;
        let bytes_read =
            result.map_err(|e| ExchangeError::Network(format!("TCP read failed: {e}")))?;
        if bytes_read == 0 {
            return Ok(false);
        }

        self.tls_conn
            .read_tls(&mut std::io::Cursor::new(&buf[..bytes_read]))
            .map_err(|e| ExchangeError::Network(format!("TLS read failed: {e}")))?;
        self.tls_conn
            .process_new_packets()
            .map_err(|e| ExchangeError::Network(format!("TLS process failed: {e}")))?;
        Ok(true)
    }

    async fn complete_handshake(&mut self) -> Result<()> {
        while !self.handshake_complete {
            self.flush_tls().await?;

            if !self.tls_conn.is_handshaking() {
                self.handshake_complete = true;
            } else if self.tls_conn.wants_read() {
                if !self.fill_tls().await? {
                    return Err(ExchangeError::Network(
                        "Connection closed during handshake".to_string(),
                    ));
                }
            } else if !self.tls_conn.wants_write() {
                return Err(ExchangeError::Network("TLS handshake stalled".to_string()));
            }
        }
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.complete_handshake().await?;
        self.tls_conn
            .writer()
            .write_all(data)
            .map_err(|e| ExchangeError::Network(format!("TLS application write failed: {e}")))?;
        self.tls_conn
            .writer()
            .flush()
            .map_err(|e| ExchangeError::Network(format!("TLS flush failed: {e}")))?;
        self.flush_tls().await
    }

    async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        self.complete_handshake().await?;

        let mut response = Vec::new();
        let mut plain = vec![0u8; READ_CHUNK];
        loop {
            match self.tls_conn.reader().read(&mut plain) {
                Ok(0) => break,
                Ok(n) => {
                    response.extend_from_slice(&plain[..n]);
                    continue;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                // Servers that drop the socket without close_notify
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(ExchangeError::Network(format!("TLS read failed: {e}"))),
            }

            if !self.fill_tls().await? {
                break;
            }
        }

        Ok(response)
    }
}
