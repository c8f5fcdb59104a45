use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER,
    USER_AGENT,
};
use reqwest::{Client, Proxy, Response, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::config::FetchConfig;
use crate::{Error, Result};

const INITIAL_RETRY_DELAY_MS: u64 = 500;

// Rotating User-Agent pool - mimics different browsers for better compatibility
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// An article page as returned by a [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    /// Final URL after redirects; relative links in the page resolve against it
    pub url: Url,
    pub headers: HeaderMap,
    /// Body decoded to UTF-8
    pub body: String,
}

impl Page {
    /// Turn a non-2xx response into an upstream error
    pub fn ensure_success(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::upstream(self.url.as_str(), format!("HTTP {}", self.status)))
        }
    }
}

/// A raw download, used for source feeds whose bytes go to the XML parser
#[derive(Debug, Clone)]
pub struct Download {
    pub status: StatusCode,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Download {
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Capability to fetch an article page. Shared by every enrichment worker,
/// so implementations must be safe to call concurrently.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page>;
}

/// [`PageFetcher`] over a shared reqwest client with browser-like headers
pub struct HttpPageFetcher {
    client: Client,
    max_bytes: usize,
    retries: u32,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Self::build_client(config.request_timeout_secs, &config.proxy_url)?;
        Ok(Self {
            client,
            max_bytes: config.max_page_bytes,
            retries: config.feed_retries.max(1),
        })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for page fetching");
        }

        builder.build().map_err(Error::Http)
    }

    /// Build browser-like headers for a request
    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,application/rss+xml,application/atom+xml,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,zh-CN;q=0.8,zh;q=0.7"),
        );
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    /// Send a GET, retrying transport failures and 429/503 with
    /// exponential backoff. The last response is returned as-is once the
    /// attempts are used up.
    async fn send_with_retry(&self, url: &str, attempts: u32) -> Result<Response> {
        let attempts = attempts.max(1);
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let user_agent = next_user_agent();
            tracing::debug!(
                "Fetch attempt {} for {}, User-Agent: {}",
                attempt,
                url,
                user_agent
            );

            let outcome = self
                .client
                .get(url)
                .headers(Self::build_headers(user_agent))
                .send()
                .await;

            let retryable = match &outcome {
                Ok(response) => matches!(
                    response.status(),
                    StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
                ),
                Err(_) => true,
            };
            if !retryable || attempt >= attempts {
                return outcome.map_err(|e| Error::upstream(url, e.to_string()));
            }

            match &outcome {
                Ok(response) => tracing::warn!(
                    "Received {} for {}, retrying after {}ms...",
                    response.status(),
                    url,
                    delay_ms
                ),
                Err(e) => tracing::warn!(
                    "Request failed for {} (attempt {}): {}",
                    url,
                    attempt,
                    e
                ),
            }
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms *= 2;
        }
    }

    fn ensure_content_size(&self, size: usize, url: &str) -> Result<()> {
        if size > self.max_bytes {
            return Err(Error::upstream(
                url,
                format!("response too large ({} bytes, limit {})", size, self.max_bytes),
            ));
        }
        Ok(())
    }

    fn check_declared_size(&self, response: &Response, url: &str) -> Result<()> {
        match response.content_length() {
            Some(length) => self.ensure_content_size(length as usize, url),
            None => Ok(()),
        }
    }

    /// Read the body chunk by chunk, giving up as soon as it passes
    /// `max_bytes` even when no Content-Length was sent
    async fn read_body(&self, mut response: Response, url: &str) -> Result<Bytes> {
        self.check_declared_size(&response, url)?;

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::upstream(url, e.to_string()))?
        {
            self.ensure_content_size(body.len() + chunk.len(), url)?;
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    /// Download a source feed, retrying transient failures
    pub async fn download(&self, url: &str) -> Result<Download> {
        let response = self.send_with_retry(url, self.retries).await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = self.read_body(response, url).await?;

        Ok(Download {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}

/// Decode a page body using the charset named in its `Content-Type`,
/// falling back to UTF-8. A byte order mark wins over the header.
fn decode_body(content_type: Option<&str>, body: &[u8]) -> String {
    let encoding = content_type
        .and_then(|value| {
            value.split(';').skip(1).find_map(|param| {
                let (name, label) = param.split_once('=')?;
                name.trim()
                    .eq_ignore_ascii_case("charset")
                    .then(|| label.trim().trim_matches('"'))
            })
        })
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    /// Article pages get a single attempt; the enrichment timeout bounds it
    async fn fetch(&self, url: &str) -> Result<Page> {
        let response = self.send_with_retry(url, 1).await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let bytes = self.read_body(response, url).await?;
        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let body = decode_body(content_type, &bytes);

        Ok(Page {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}
