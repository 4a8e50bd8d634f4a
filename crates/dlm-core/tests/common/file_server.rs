//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths with GET. Unknown paths get 404. A route can be
//! marked truncated: it announces the full Content-Length but closes the
//! connection early, like a dropped transfer.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct Route {
    pub body: Vec<u8>,
    /// Send only this many bytes of the body.
    pub truncate_to: Option<usize>,
}

impl Route {
    pub fn full(body: Vec<u8>) -> Self {
        Self {
            body,
            truncate_to: None,
        }
    }

    pub fn truncated(body: Vec<u8>, sent: usize) -> Self {
        Self {
            body,
            truncate_to: Some(sent),
        }
    }
}

/// Starts a server in a background thread. Returns the base URL without a
/// trailing slash (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, route)| (path.to_string(), route))
            .collect(),
    );
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: std::net::TcpStream, routes: &HashMap<String, Route>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("");

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    let Some(route) = routes.get(path) else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
        return;
    };
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let sent = route.truncate_to.unwrap_or(route.body.len()).min(route.body.len());
    let _ = stream.write_all(&route.body[..sent]);
    let _ = stream.flush();
}
