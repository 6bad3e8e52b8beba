use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;

use serde_json::Value;

/// Request bodies above this size are refused before they are read.
const MAX_BODY_BYTES: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    /// Route path with any `?query` suffix removed; no route reads the query.
    pub path: String,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a request without a socket; `raw_path` may carry a query string.
    pub fn new(method: &str, raw_path: &str, body: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: route_path(raw_path).to_string(),
            body: body.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(status: u16, value: Value) -> Self {
        let body = serde_json::to_vec(&value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    pub fn text(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            body: body.into_bytes(),
        }
    }

    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Method, path and declared body length from the request line and headers.
struct RequestHead {
    method: String,
    path: String,
    content_length: usize,
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

/// Reads up to the blank line ending the headers. `None` means the peer sent nothing.
fn read_head(reader: &mut impl BufRead) -> io::Result<Option<RequestHead>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
        return Ok(None);
    }
    let mut tokens = line.split_whitespace();
    let (Some(method), Some(target)) = (tokens.next(), tokens.next()) else {
        return Err(invalid(format!("malformed request line {:?}", line.trim_end())));
    };
    let mut head = RequestHead {
        method: method.to_ascii_uppercase(),
        path: route_path(target).to_string(),
        content_length: 0,
    };

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            head.content_length = value
                .trim()
                .parse()
                .map_err(|_| invalid(format!("bad content-length {:?}", value.trim())))?;
        }
    }
    Ok(Some(head))
}

pub(crate) fn read_http_request(stream: &TcpStream) -> io::Result<Option<HttpRequest>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let Some(head) = read_head(&mut reader)? else {
        return Ok(None);
    };
    if head.content_length > MAX_BODY_BYTES {
        return Err(invalid(format!(
            "request body of {} bytes exceeds {MAX_BODY_BYTES}",
            head.content_length
        )));
    }
    let mut body = vec![0_u8; head.content_length];
    reader.read_exact(&mut body)?;
    Ok(Some(HttpRequest {
        method: head.method,
        path: head.path,
        body,
    }))
}

/// Writes status line, headers and body in one buffer; every response closes the connection.
pub(crate) fn write_http_response(
    stream: &mut impl Write,
    response: &HttpResponse,
) -> io::Result<()> {
    let mut out = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {kind}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n",
        status = response.status,
        reason = http_reason_phrase(response.status),
        kind = response.content_type,
        len = response.body.len(),
    )
    .into_bytes();
    out.extend_from_slice(&response.body);
    stream.write_all(&out)?;
    stream.flush()
}

fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

fn route_path(target: &str) -> &str {
    target.split_once('?').map_or(target, |(path, _)| path)
}
