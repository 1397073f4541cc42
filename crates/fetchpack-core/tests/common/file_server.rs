//! Minimal HTTP/1.1 file server for integration tests.
//!
//! Serves a fixed set of paths, each with its own status, content type and
//! body. Paths not registered answer 404.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// If false, no Content-Length is sent and the body ends at connection close.
    pub declare_length: bool,
}

impl Route {
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.into(),
            declare_length: true,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            body: b"nope".to_vec(),
            declare_length: true,
        }
    }

    pub fn without_length(mut self) -> Self {
        self.declare_length = false;
        self
    }
}

/// Starts a server in a background thread. Returns the base URL without a
/// trailing slash (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
pub fn start<I, P>(routes: I) -> String
where
    I: IntoIterator<Item = (P, Route)>,
    P: Into<String>,
{
    let routes: HashMap<String, Route> = routes.into_iter().map(|(p, r)| (p.into(), r)).collect();
    let routes = Arc::new(routes);
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

/// Accepts connections and never answers. Returns the base URL.
pub fn start_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(|target| target.split('?').next().unwrap_or(target))
        .unwrap_or("/");

    let not_found = Route::status(404);
    let route = routes.get(path).unwrap_or(&not_found);

    let mut head = format!("HTTP/1.1 {} {}\r\n", route.status, reason(route.status));
    if let Some(ct) = &route.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    if route.declare_length {
        head.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    head.push_str("Connection: close\r\n\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
