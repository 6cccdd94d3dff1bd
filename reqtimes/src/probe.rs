//! Single HTTP(S) request timing

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::fmt;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::{Host, Url};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Please provide a HTTP or HTTPS URL as an argument!")]
    MissingUrl,

    #[error("Please provide a HTTP or HTTPS URL as an argument! ('{url}': {reason})")]
    InvalidUrl { url: String, reason: String },

    #[error("could not resolve '{host}': {reason}")]
    Resolve { host: String, reason: String },

    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// Check that `raw` is an `http://` or `https://` URL with a host
pub fn validate_url(raw: &str) -> Result<Url, ProbeError> {
    static HTTP_URL: OnceLock<Regex> = OnceLock::new();
    let re = HTTP_URL.get_or_init(|| Regex::new(r"(?i)^https?://").unwrap());

    let invalid = |reason: &str| ProbeError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    if !re.is_match(raw) {
        return Err(invalid("only http and https are supported"));
    }
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if url.host().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(url)
}

/// Elapsed times of one request, all measured from the same start instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub status: u16,
    pub dns: Duration,
    pub connect: Duration,
    pub total: Duration,
}

impl fmt::Display for Timings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "DNS: {:.6} sec", self.dns.as_secs_f64())?;
        writeln!(f, "Connect: {:.6} sec", self.connect.as_secs_f64())?;
        write!(f, "Total time: {:.6} sec", self.total.as_secs_f64())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    /// Applies to the connect phase and to the whole request. `None` waits forever.
    pub timeout: Option<Duration>,
}

pub struct Probe {
    options: ProbeOptions,
}

impl Probe {
    pub fn new(options: ProbeOptions) -> Self {
        Self { options }
    }

    /// Perform one GET request and report its timings
    pub fn run(&self, url: &Url) -> Result<Timings, ProbeError> {
        let host = url.host().ok_or_else(|| ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        })?;
        let port = url.port_or_known_default().unwrap_or(80);

        let started = Instant::now();

        let addrs = resolve(&host, port)?;
        let dns = started.elapsed();
        debug!(?addrs, ?dns, "name resolved");

        let (stream, addr) = connect_first(&host.to_string(), &addrs, self.options.timeout)?;
        let connect = started.elapsed();
        drop(stream);
        debug!(%addr, ?connect, "connected");

        // Proxies would hide the connection being timed. Redirects are not
        // followed: the status reported is the one of this request.
        let mut builder = Client::builder()
            .no_proxy()
            .redirect(Policy::none())
            .timeout(self.options.timeout);
        if let Host::Domain(domain) = &host {
            builder = builder.resolve(domain, addr);
        }
        let client = builder.build().map_err(ProbeError::Client)?;

        let response = client
            .get(url.as_str())
            .send()
            .map_err(ProbeError::Request)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(ProbeError::Request)?;
        let total = started.elapsed();
        debug!(status, bytes = body.len(), ?total, "response received");

        Ok(Timings {
            status,
            dns,
            connect,
            total,
        })
    }
}

/// Every address `host` resolves to, in resolver order
fn resolve(host: &Host<&str>, port: u16) -> Result<Vec<SocketAddr>, ProbeError> {
    let ip: IpAddr = match host {
        Host::Ipv4(ip) => (*ip).into(),
        Host::Ipv6(ip) => (*ip).into(),
        Host::Domain(domain) => {
            let resolve_error = |reason: String| ProbeError::Resolve {
                host: domain.to_string(),
                reason,
            };
            let addrs: Vec<SocketAddr> = (*domain, port)
                .to_socket_addrs()
                .map_err(|e| resolve_error(e.to_string()))?
                .collect();
            if addrs.is_empty() {
                return Err(resolve_error("no addresses returned".to_string()));
            }
            return Ok(addrs);
        }
    };
    Ok(vec![SocketAddr::new(ip, port)])
}

/// Connect to the first address that accepts, trying them in order.
/// Fails with the error of the last address tried.
fn connect_first(
    host: &str,
    addrs: &[SocketAddr],
    timeout: Option<Duration>,
) -> Result<(TcpStream, SocketAddr), ProbeError> {
    let mut last_error = None;
    for &addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok((stream, addr)),
            Err(source) => {
                debug!(%addr, error = %source, "connect failed");
                last_error = Some(ProbeError::Connect { addr, source });
            }
        }
    }
    Err(last_error.unwrap_or_else(|| ProbeError::Resolve {
        host: host.to_string(),
        reason: "no addresses returned".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const URL_REQUIRED: &str = "Please provide a HTTP or HTTPS URL as an argument!";

    const OK: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";
    const MOVED: &[u8] = b"HTTP/1.1 301 Moved Permanently\r\nLocation: /new\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    // Accepts `connections` connections one after another and answers the
    // ones that send a request with `response`.
    fn serve(connections: usize, response: &'static [u8]) -> (SocketAddr, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let mut stream = stream.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            request.extend_from_slice(&buf[..n]);
                            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                    }
                }
                if !request.is_empty() {
                    stream.write_all(response).unwrap();
                }
            }
        });
        (addr, handle)
    }

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com/path?q=1").is_ok());
        assert!(validate_url("HTTPS://EXAMPLE.COM").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        let rejected = [
            "ftp://example.com",
            "example.com",
            "file:///etc/hosts",
            "",
            "httpx://a",
        ];
        for raw in rejected {
            let err = validate_url(raw).unwrap_err();
            assert!(matches!(err, ProbeError::InvalidUrl { .. }), "{raw}");
            assert!(err.to_string().starts_with(URL_REQUIRED));
        }
    }

    #[test]
    fn test_missing_url_message() {
        assert_eq!(ProbeError::MissingUrl.to_string(), URL_REQUIRED);
    }

    #[test]
    fn test_timings_output() {
        let timings = Timings {
            status: 200,
            dns: Duration::from_millis(12),
            connect: Duration::from_micros(35_500),
            total: Duration::from_secs(1),
        };
        assert_eq!(
            timings.to_string(),
            "Status: 200\nDNS: 0.012000 sec\nConnect: 0.035500 sec\nTotal time: 1.000000 sec"
        );
    }

    #[test]
    fn test_ip_hosts_skip_lookup() {
        let addrs = resolve(&Host::Ipv4([127, 0, 0, 1].into()), 8080).unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:8080".parse().unwrap()]);
    }

    #[test]
    fn test_probe_local_server() {
        let (addr, server) = serve(2, OK);
        let url = validate_url(&format!("http://{}/", addr)).unwrap();

        let probe = Probe::new(ProbeOptions {
            timeout: Some(Duration::from_secs(10)),
        });
        let timings = probe.run(&url).unwrap();
        server.join().unwrap();

        assert_eq!(timings.status, 200);
        assert!(timings.dns <= timings.connect);
        assert!(timings.connect <= timings.total);
    }

    #[test]
    fn test_connection_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let url = validate_url(&format!("http://{}/", addr)).unwrap();
        let probe = Probe::new(ProbeOptions {
            timeout: Some(Duration::from_secs(2)),
        });
        assert!(matches!(
            probe.run(&url),
            Err(ProbeError::Connect { .. })
        ));
    }

    #[test]
    fn test_redirect_status_is_reported() {
        // One connection for the timed connect, one for the request. A
        // followed redirect would need a third.
        let (addr, server) = serve(2, MOVED);
        let url = validate_url(&format!("http://{}/old", addr)).unwrap();
        let probe = Probe::new(ProbeOptions {
            timeout: Some(Duration::from_secs(10)),
        });
        let timings = probe.run(&url).unwrap();
        server.join().unwrap();

        assert_eq!(timings.status, 301);
    }

    #[test]
    fn test_connect_falls_through_to_next_address() {
        let refused = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let live = listener.local_addr().unwrap();

        let (_stream, addr) =
            connect_first("localhost", &[refused, live], Some(Duration::from_secs(2))).unwrap();
        assert_eq!(addr, live);
    }

    #[test]
    fn test_connect_reports_last_failure() {
        let refused = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        match connect_first("localhost", &[refused], Some(Duration::from_secs(2))) {
            Err(ProbeError::Connect { addr, .. }) => assert_eq!(addr, refused),
            other => panic!("unexpected result: {:?}", other.map(|(_, addr)| addr)),
        }
    }
}
