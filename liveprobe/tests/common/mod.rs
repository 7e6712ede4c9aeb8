#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use liveprobe::{
    alert::{AlertSink, AvailabilityEvent},
    config::{ConnectionType, ProbeConfig, ProbeDefinition},
    error::AlertError,
    sink::{Device, DeviceGroup, TopologySink},
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
};
use rustls::pki_types::{CertificateDer, PrivatePkcs8KeyDer};
use tokio_rustls::TlsAcceptor;

/// A request received by a [`CannedServer`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// HTTP/1.1 server answering every request with the same status and body.
pub struct CannedServer {
    pub addr: SocketAddr,
    scheme: &'static str,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl CannedServer {
    pub async fn start(status: u16, body: &'static str) -> Self {
        Self::serve(status, body, None).await
    }

    /// Same as [`CannedServer::start`] behind TLS with a freshly generated
    /// self-signed certificate for `localhost`.
    pub async fn start_tls(status: u16, body: &'static str) -> Self {
        Self::serve(status, body, Some(self_signed_acceptor())).await
    }

    async fn serve(status: u16, body: &'static str, tls: Option<TlsAcceptor>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let scheme = if tls.is_some() { "https" } else { "http" };

        let captured = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let captured = captured.clone();
                let tls = tls.clone();
                tokio::spawn(async move {
                    match tls {
                        Some(acceptor) => {
                            let Ok(stream) = acceptor.accept(stream).await else {
                                return;
                            };
                            answer(stream, status, body, &captured).await;
                        }
                        None => answer(stream, status, body, &captured).await,
                    }
                });
            }
        });

        Self {
            addr,
            scheme,
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        match self.scheme {
            "https" => format!("https://localhost:{}{}", self.addr.port(), path),
            _ => format!("http://{}{}", self.addr, path),
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn answer<S>(
    mut stream: S,
    status: u16,
    body: &str,
    captured: &Mutex<Vec<CapturedRequest>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Ok(request) = read_request(&mut stream).await else {
        return;
    };
    captured.lock().unwrap().push(request);
    let response = format!(
        "HTTP/1.1 {status} Canned\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn self_signed_acceptor() -> TlsAcceptor {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivatePkcs8KeyDer::from(key_pair.serialize_der());

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![CertificateDer::clone(cert.der())], key.into())
    .unwrap();

    TlsAcceptor::from(Arc::new(config))
}

/// Accepts connections and never answers.
pub async fn start_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _held = stream;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });

    addr
}

/// Reads each request, then closes the connection without answering.
pub async fn start_closing_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request(&mut stream).await;
                drop(stream);
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn read_request<S>(stream: &mut S) -> std::io::Result<CapturedRequest>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(CapturedRequest {
        head,
        body: buf[head_end..].to_vec(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Metric {
        group: String,
        device: String,
        key: String,
        value: f64,
    },
    InfoEvent {
        device: String,
        title: String,
    },
}

/// Topology keeping everything reported in memory.
#[derive(Clone, Default)]
pub struct RecordingTopology {
    records: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingTopology {
    pub fn records(&self) -> Vec<Recorded> {
        self.records.lock().unwrap().clone()
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.records().into_iter().find_map(|r| match r {
            Recorded::Metric { key: k, value, .. } if k == key => Some(value),
            _ => None,
        })
    }

    pub fn info_events(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::InfoEvent { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingGroup {
    name: String,
    records: Arc<Mutex<Vec<Recorded>>>,
}

pub struct RecordingDevice {
    group: String,
    name: String,
    records: Arc<Mutex<Vec<Recorded>>>,
}

impl TopologySink for RecordingTopology {
    type Group = RecordingGroup;

    fn create_group(&self, name: &str) -> RecordingGroup {
        RecordingGroup {
            name: name.to_string(),
            records: self.records.clone(),
        }
    }
}

impl DeviceGroup for RecordingGroup {
    type Device = RecordingDevice;

    fn create_device(&self, name: &str) -> RecordingDevice {
        RecordingDevice {
            group: self.name.clone(),
            name: name.to_string(),
            records: self.records.clone(),
        }
    }
}

impl Device for RecordingDevice {
    fn report_absolute_metric(&self, key: &str, value: f64) {
        self.records.lock().unwrap().push(Recorded::Metric {
            group: self.group.clone(),
            device: self.name.clone(),
            key: key.to_string(),
            value,
        });
    }

    fn report_custom_info_event(&self, title: &str) {
        self.records.lock().unwrap().push(Recorded::InfoEvent {
            device: self.name.clone(),
            title: title.to_string(),
        });
    }
}

/// Alert sink remembering every event it was asked to send.
#[derive(Default)]
pub struct SpyAlertSink {
    events: Mutex<Vec<AvailabilityEvent>>,
}

impl SpyAlertSink {
    pub fn events(&self) -> Vec<AvailabilityEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AlertSink for SpyAlertSink {
    async fn send(&self, event: &AvailabilityEvent) -> Result<(), AlertError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn probe(
    connection_type: ConnectionType,
    url: &str,
    code: &str,
    response: &str,
    entityid: &str,
) -> ProbeConfig {
    ProbeConfig::try_from(ProbeDefinition {
        url: url.to_string(),
        timeout: 1,
        code: code.to_string(),
        response: response.to_string(),
        name: "target".to_string(),
        proxy: String::new(),
        entityid: entityid.to_string(),
        connection_type,
        hold: false,
    })
    .unwrap()
}
