use std::future::poll_fn;
use std::pin::pin;

use murmur_http_model::{HttpConfigBuilder, HttpProvider, HttpResponse};
use murmur_model::{
    ChatMessage, ChatProvider, ChatRequest, ChatResponse, ErrorKind,
    ProviderError,
};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the fake endpoint writes back after reading the request.
enum Reply {
    Chunked {
        chunks: Vec<Vec<u8>>,
        terminate: bool,
    },
    Raw(&'static str),
}

struct Received {
    head: String,
    body: Value,
}

async fn serve_once(reply: Reply) -> (String, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/chat", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let received = read_request(&mut stream).await;
        write_reply(&mut stream, reply).await;
        received
    });
    (url, handle)
}

async fn read_request(stream: &mut TcpStream) -> Received {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut tmp).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut tmp).await.unwrap();
        assert!(n > 0, "client closed before sending body");
        buf.extend_from_slice(&tmp[..n]);
    }
    let body = serde_json::from_slice(
        &buf[header_end..header_end + content_length],
    )
    .unwrap();
    Received { head, body }
}

async fn write_reply(stream: &mut TcpStream, reply: Reply) {
    match reply {
        Reply::Chunked { chunks, terminate } => {
            stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      content-type: text/plain; charset=utf-8\r\n\
                      transfer-encoding: chunked\r\n\
                      connection: close\r\n\r\n",
                )
                .await
                .unwrap();
            for chunk in chunks {
                let mut framed = format!("{:x}\r\n", chunk.len()).into_bytes();
                framed.extend_from_slice(&chunk);
                framed.extend_from_slice(b"\r\n");
                stream.write_all(&framed).await.unwrap();
                stream.flush().await.unwrap();
                tokio::task::yield_now().await;
            }
            if terminate {
                stream.write_all(b"0\r\n\r\n").await.unwrap();
            }
        }
        Reply::Raw(raw) => {
            stream.write_all(raw.as_bytes()).await.unwrap();
        }
    }
    stream.flush().await.unwrap();
}

async fn collect(
    resp: HttpResponse,
) -> Result<String, murmur_http_model::Error> {
    let mut resp = pin!(resp);
    let mut reply = String::new();
    while let Some(fragment) =
        poll_fn(|cx| resp.as_mut().poll_next_fragment(cx)).await?
    {
        reply.push_str(&fragment);
    }
    Ok(reply)
}

fn request() -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("Summarize X"),
        ],
    }
}

#[tokio::test]
async fn test_streamed_reply() {
    let snowman = "☃".as_bytes().to_vec();
    let (url, server) = serve_once(Reply::Chunked {
        chunks: vec![
            b"- point one\n".to_vec(),
            b"- point two ".to_vec(),
            snowman[..1].to_vec(),
            snowman[1..].to_vec(),
        ],
        terminate: true,
    })
    .await;

    let provider = HttpProvider::new(
        HttpConfigBuilder::with_endpoint(url)
            .with_bearer_token("token-123")
            .with_header("x-client", "murmur")
            .build(),
    );
    let resp = provider.send_request(&request()).await.unwrap();
    let reply = collect(resp).await.unwrap();
    assert_eq!(reply, "- point one\n- point two ☃");

    let received = server.await.unwrap();
    assert!(received.head.starts_with("post /api/chat "));
    assert!(received.head.contains("authorization: bearer token-123"));
    assert!(received.head.contains("x-client: murmur"));
    assert_eq!(
        received.body,
        json!({
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" },
                { "role": "user", "content": "Summarize X" },
            ]
        })
    );
}

#[tokio::test]
async fn test_error_status() {
    let (url, server) = serve_once(Reply::Raw(
        "HTTP/1.1 500 Internal Server Error\r\n\
         content-length: 27\r\n\
         connection: close\r\n\r\n\
         Failed to generate response",
    ))
    .await;

    let provider =
        HttpProvider::new(HttpConfigBuilder::with_endpoint(url).build());
    let err = provider.send_request(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status);
    server.await.unwrap();
}

#[tokio::test]
async fn test_no_content() {
    let (url, server) = serve_once(Reply::Raw(
        "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n",
    ))
    .await;

    let provider =
        HttpProvider::new(HttpConfigBuilder::with_endpoint(url).build());
    let err = provider.send_request(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Body);
    server.await.unwrap();
}

#[tokio::test]
async fn test_truncated_body() {
    let (url, server) = serve_once(Reply::Chunked {
        chunks: vec![b"- point one\n".to_vec()],
        terminate: false,
    })
    .await;

    let provider =
        HttpProvider::new(HttpConfigBuilder::with_endpoint(url).build());
    let resp = provider.send_request(&request()).await.unwrap();
    server.await.unwrap();
    let err = collect(resp).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Body);
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/chat", listener.local_addr().unwrap());
    drop(listener);

    let provider =
        HttpProvider::new(HttpConfigBuilder::with_endpoint(url).build());
    let err = provider.send_request(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
