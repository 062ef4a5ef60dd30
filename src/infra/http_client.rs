use crate::app::ports::PageSource;
use crate::error::{EtlError, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub struct ReqwestPageSource {
    client: Client,
}

impl ReqwestPageSource {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for ReqwestPageSource {
    fn fetch(&self, url: &str) -> Result<String> {
        tracing::info!("HTTP GET request to: {}", url);
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(EtlError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = resp.text()?;
        tracing::info!(
            "HTTP response: status={}, content_type={}, size={} bytes",
            status.as_u16(),
            content_type,
            body.len()
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves exactly one canned HTTP response on a loopback port.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/wiki/List_of_largest_banks", addr)
    }

    #[test]
    fn not_found_status_is_a_fetch_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let source = ReqwestPageSource::new(Duration::from_secs(5), "banks_etl-test").unwrap();

        match source.fetch(&url) {
            Err(EtlError::Fetch { url: failed, status }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected a 404 fetch error, got {:?}", other),
        }
    }

    #[test]
    fn success_status_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<p>banks</p>\n",
        );
        let source = ReqwestPageSource::new(Duration::from_secs(5), "banks_etl-test").unwrap();

        assert_eq!(source.fetch(&url).unwrap(), "<p>banks</p>\n");
    }

    #[test]
    fn unreachable_host_is_an_http_error() {
        let source = ReqwestPageSource::new(Duration::from_secs(2), "banks_etl-test").unwrap();
        // Port 9 (discard) on loopback is closed on any sane test machine
        let err = source.fetch("http://127.0.0.1:9/").unwrap_err();
        assert!(matches!(err, EtlError::Http(_)));
    }
}
