use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Unsupported feed format: <{0}> is neither <rss> nor <feed>")]
    UnsupportedFormat(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Fetching {url} failed: {reason}")]
    UpstreamFetch { url: String, reason: String },

    #[error("Invalid source feed: {0}")]
    InvalidSource(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn upstream(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UpstreamFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the upstream site rather than the request itself
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::UpstreamFetch { .. } | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
