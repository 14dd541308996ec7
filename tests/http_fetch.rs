// tests/http_fetch.rs
// HttpFeedSource against a throwaway loopback server (no external network).

use ct_feed::ingest::config::FetchCfg;
use ct_feed::ingest::fetch::HttpFeedSource;
use ct_feed::{Account, FeedSource, FetchError, Mirror};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, answer with `status_line` + `body`, return the raw request.
async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let mut req = Vec::new();
        loop {
            let n = sock.read(&mut buf).await.unwrap();
            req.extend_from_slice(&buf[..n]);
            if n == 0 || req.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let resp = format!(
            "{status_line}\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(resp.as_bytes()).await.unwrap();
        sock.shutdown().await.ok();
        String::from_utf8_lossy(&req).to_string()
    });
    (addr, handle)
}

fn cfg() -> FetchCfg {
    FetchCfg {
        scheme: "http".into(),
        user_agent: "MemeDesk-CT-Feed/1.0".into(),
        timeout_secs: 5,
        ..FetchCfg::default()
    }
}

#[tokio::test]
async fn sends_identity_header_and_returns_body() {
    let (addr, server) = one_shot_server("HTTP/1.1 200 OK", "<rss></rss>").await;
    let src = HttpFeedSource::new(&cfg()).unwrap();

    let doc = src
        .fetch(&Account::new("cobie"), &Mirror::new(addr.clone()))
        .await
        .unwrap();
    assert_eq!(doc.body, "<rss></rss>");
    assert_eq!(doc.mirror.host, addr);

    let req = server.await.unwrap();
    assert!(req.starts_with("GET /cobie/rss HTTP/1.1"));
    assert!(req
        .to_ascii_lowercase()
        .contains("user-agent: memedesk-ct-feed/1.0"));
}

#[tokio::test]
async fn non_success_status_is_a_protocol_failure() {
    let (addr, server) = one_shot_server("HTTP/1.1 429 Too Many Requests", "slow down").await;
    let src = HttpFeedSource::new(&cfg()).unwrap();

    let err = src
        .fetch(&Account::new("cobie"), &Mirror::new(addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status(429)));
    server.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_a_transport_failure() {
    // Bind then drop to get a port nobody is listening on.
    let addr = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().to_string()
    };
    let src = HttpFeedSource::new(&cfg()).unwrap();

    let err = src
        .fetch(&Account::new("cobie"), &Mirror::new(addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
