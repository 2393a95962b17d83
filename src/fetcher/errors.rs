use reqwest::StatusCode;
use thiserror::Error;

/// Why a single review page could not be turned into a document body.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("url has no host: {0}")]
    MissingHost(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The client could not be built, or the request never left it.
    #[error("transport setup failed: {0}")]
    Transport(String),

    /// Name resolution or TCP/TLS connection to the review site failed.
    #[error("could not connect: {0}")]
    Connect(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http error {status}")]
    Http { status: StatusCode, retriable: bool },

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("charset error: {0}")]
    Charset(String),

    /// The connection dropped or the body could not be decompressed.
    #[error("failed reading body: {0}")]
    Body(String),
}

impl FetchError {
    /// Whether fetching the same URI again later could succeed.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Http { retriable, .. } => *retriable,
            Self::Connect(_)
            | Self::ConnectTimeout
            | Self::RequestTimeout
            | Self::RedirectLoop
            | Self::Body(_) => true,
            Self::InvalidUrl(_)
            | Self::MissingHost(_)
            | Self::InvalidHeader { .. }
            | Self::Transport(_)
            | Self::BodyTooLarge(_)
            | Self::UnsupportedContentType(_)
            | Self::Charset(_) => false,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            };
        }
        if let Some(status) = err.status() {
            return Self::Http {
                status,
                retriable: status.is_server_error(),
            };
        }

        if err.is_redirect() {
            Self::RedirectLoop
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
