//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tailnet_ingress::http::{HttpServer, ProxyContext};
use tailnet_ingress::lifecycle::Shutdown;
use tailnet_ingress::net::tls::install_crypto_provider;
use tailnet_ingress::net::{IngressListener, Reachability};
use tailnet_ingress::routing::MountPath;
use tailnet_ingress::security::AccessFilter;
use tailnet_ingress::upstream::transport::TransportError;
use tailnet_ingress::upstream::{resolve, UpstreamTransport};

/// Start a backend that answers every request with its own request head
/// (request line and headers) as the body.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&head);
                let body = head.split("\r\n\r\n").next().unwrap_or_default();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start an HTTPS backend with a freshly generated self-signed certificate.
/// It answers every request with `<method> <path> over tls`.
pub async fn start_tls_echo_backend() -> SocketAddr {
    install_crypto_provider();

    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let tls = RustlsConfig::from_pem(
        cert.serialize_pem().unwrap().into_bytes(),
        cert.serialize_private_key_pem().into_bytes(),
    )
    .await
    .unwrap();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(|req: Request| async move {
        format!("{} {} over tls", req.method(), req.uri().path())
    });
    tokio::spawn(async move {
        let _ = axum_server::from_tcp_rustls(listener, tls)
            .serve(app.into_make_service())
            .await;
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running active proxy.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

/// Start the active proxy on an ephemeral port in front of `backend`.
pub async fn start_proxy(backend: &str, mount: &str, allow: Option<&str>, deny: Option<&str>) -> TestProxy {
    try_start_proxy(backend, mount, allow, deny).await.unwrap()
}

/// Like [`start_proxy`], but surfaces upstream transport setup failures.
pub async fn try_start_proxy(
    backend: &str,
    mount: &str,
    allow: Option<&str>,
    deny: Option<&str>,
) -> Result<TestProxy, TransportError> {
    let target = Arc::new(resolve(backend).unwrap());
    let ctx = ProxyContext {
        transport: UpstreamTransport::for_target(&target)?,
        target,
        mount: MountPath::new(mount),
        filter: Arc::new(AccessFilter::compile(allow, deny).unwrap()),
    };

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = IngressListener::plain(tcp, Reachability::Private);

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::new(ctx, listener.forwarded_proto());
    let handle = tokio::spawn(async move { server.run(listener, rx).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(TestProxy { addr, shutdown, handle })
}

/// Send `GET <target>` with the request target written verbatim, bypassing
/// client-side URL normalization. Returns the status code and the body.
pub async fn raw_get(addr: SocketAddr, target: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw);
    let status = raw.split_whitespace().nth(1).unwrap().parse().unwrap();
    let body = raw.split_once("\r\n\r\n").map(|(_, b)| b.to_string()).unwrap_or_default();
    (status, body)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
