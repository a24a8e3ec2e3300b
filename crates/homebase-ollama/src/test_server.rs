//! Loopback HTTP server with canned responses for client tests.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Canned response to serve to the next connection.
pub(crate) enum Reply {
    /// Fixed-length response.
    Full { status: u16, body: String },
    /// Chunked `200 OK` response, one transfer chunk per piece.
    Chunked(Vec<String>),
    /// Like `Chunked`, but pieces need not be valid UTF-8.
    ChunkedBytes(Vec<Vec<u8>>),
    /// Chunked response that waits `interval` after every piece and never
    /// sends the terminating chunk.
    Trickle {
        pieces: Vec<String>,
        interval: Duration,
    },
}

/// A server that answers exactly one request.
pub(crate) struct OneShotServer {
    pub base_url: String,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    pub async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            write_reply(&mut socket, reply).await;
            let _ = socket.shutdown().await;
            request
        });

        Self {
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    /// The raw request the server received.
    pub async fn request(self) -> String {
        self.handle.await.unwrap()
    }
}

/// Base URL of a port nothing is listening on.
pub(crate) async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}

async fn write_reply(socket: &mut TcpStream, reply: Reply) {
    match reply {
        Reply::Full { status, body } => {
            let response = format!(
                "HTTP/1.1 {} Test\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        }
        Reply::Chunked(pieces) => {
            let pieces = pieces.into_iter().map(String::into_bytes).collect();
            write_chunked(socket, pieces, Duration::from_millis(5), true).await;
        }
        Reply::ChunkedBytes(pieces) => {
            write_chunked(socket, pieces, Duration::from_millis(5), true).await;
        }
        Reply::Trickle { pieces, interval } => {
            let pieces = pieces.into_iter().map(String::into_bytes).collect();
            write_chunked(socket, pieces, interval, false).await;
        }
    }
}

async fn write_chunked(
    socket: &mut TcpStream,
    pieces: Vec<Vec<u8>>,
    interval: Duration,
    terminate: bool,
) {
    let head = "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    for piece in pieces {
        let mut chunk = format!("{:x}\r\n", piece.len()).into_bytes();
        chunk.extend_from_slice(&piece);
        chunk.extend_from_slice(b"\r\n");
        if socket.write_all(&chunk).await.is_err() {
            return;
        }
        let _ = socket.flush().await;
        tokio::time::sleep(interval).await;
    }
    if terminate {
        let _ = socket.write_all(b"0\r\n\r\n").await;
    }
}
