//! Certificate verification tests
//!
//! A local HTTPS server presents a freshly generated self-signed
//! certificate. Verifying clients must refuse it; clients built with
//! `accept_invalid_certs` must read the body.

use networking::{Context, Error, HttpClient, HttpClientConfig};
use rcgen::{CertificateParams, KeyPair};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

const BODY: &str = "secure";

fn self_signed_acceptor() -> TlsAcceptor {
    let key_pair = KeyPair::generate().unwrap();
    let cert = CertificateParams::new(vec!["127.0.0.1".to_string(), "localhost".to_string()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .unwrap();

    TlsAcceptor::from(Arc::new(config))
}

/// Serve `BODY` over HTTPS to every connection until the test ends
async fn start_https_server() -> SocketAddr {
    let acceptor = self_signed_acceptor();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Failed handshakes are expected from verifying clients.
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match tls.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{BODY}",
                    BODY.len()
                );
                let _ = tls.write_all(response.as_bytes()).await;
                let _ = tls.shutdown().await;
            });
        }
    });

    addr
}

fn config() -> HttpClientConfig {
    HttpClientConfig::new().with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_self_signed_certificate_is_rejected_by_default() {
    let addr = start_https_server().await;
    let client = HttpClient::new(config()).unwrap();

    let url = format!("https://{addr}/secure");
    let err = client.get(&Context::background(), &url, None).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_self_signed_certificate_is_accepted_when_verification_is_off() {
    let addr = start_https_server().await;
    let client = HttpClient::new(config().with_accept_invalid_certs(true)).unwrap();

    let url = format!("https://{addr}/secure");
    let body = client.get(&Context::background(), &url, None).await.unwrap();

    assert_eq!(body, BODY.as_bytes());
}
