use reqwest::StatusCode;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to parse as URL '{url}'")]
    InvalidSyntaxUrl {
        url: String,

        #[source]
        source: url::ParseError,
    },

    #[error("Rate limit exceeded (429 Too Many Requests) while requesting to {requested_url}")]
    RateLimited { requested_url: String },

    #[error("Unexpected response code '{got}' while requesting to {requested_url}")]
    UnexpectedResponseCode {
        got: StatusCode,
        requested_url: String,
    },

    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying after a pause may succeed.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited { .. } => true,
            Error::UnexpectedResponseCode { got, .. } => *got == StatusCode::TOO_MANY_REQUESTS,
            Error::Http(e) => {
                e.status() == Some(StatusCode::TOO_MANY_REQUESTS) || causes_indicate_rate_limit(e)
            }
            Error::InvalidSyntaxUrl { .. } | Error::Json(_) => false,
        }
    }

    /// Whether the service could not be reached or refused to answer normally.
    /// Malformed bodies and bad URLs are not counted: those point at misconfiguration.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_status(),
            Error::RateLimited { .. } | Error::UnexpectedResponseCode { .. } => true,
            Error::InvalidSyntaxUrl { .. } | Error::Json(_) => false,
        }
    }
}

/// Looks at the underlying causes only, since the top-level message contains the requested URL.
fn causes_indicate_rate_limit(e: &reqwest::Error) -> bool {
    std::iter::successors(std::error::Error::source(e), |cause| cause.source())
        .any(|cause| message_indicates_rate_limit(&cause.to_string()))
}

pub fn message_indicates_rate_limit(msg: &str) -> bool {
    const KEYWORDS: [&str; 4] = ["rate limit", "ratelimit", "429", "too many requests"];
    let msg = msg.to_lowercase();
    KEYWORDS.iter().any(|kw| msg.contains(kw))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rate_limit_keywords_are_case_insensitive() {
        assert!(message_indicates_rate_limit("Rate Limit reached"));
        assert!(message_indicates_rate_limit("upstream said: Too Many Requests"));
        assert!(message_indicates_rate_limit("RATELIMIT"));
        assert!(message_indicates_rate_limit("status 429"));
        assert!(!message_indicates_rate_limit("connection refused"));
    }

    #[test]
    fn classify_error_variants() {
        let e = Error::RateLimited {
            requested_url: "http://localhost:2000/api/v2/execute".into(),
        };
        assert!(e.is_rate_limit());
        assert!(e.is_unreachable());

        let e = Error::UnexpectedResponseCode {
            got: StatusCode::INTERNAL_SERVER_ERROR,
            requested_url: "http://localhost:2000/api/v2/execute".into(),
        };
        assert!(!e.is_rate_limit());
        assert!(e.is_unreachable());

        let e = Error::UnexpectedResponseCode {
            got: StatusCode::TOO_MANY_REQUESTS,
            requested_url: "http://localhost:2000/api/v2/execute".into(),
        };
        assert!(e.is_rate_limit());

        let e = Error::Json(serde_json::from_str::<u32>("oops").unwrap_err());
        assert!(!e.is_rate_limit());
        assert!(!e.is_unreachable());
    }

    #[test]
    fn url_containing_429_is_not_a_rate_limit() {
        let e = Error::UnexpectedResponseCode {
            got: StatusCode::INTERNAL_SERVER_ERROR,
            requested_url: "http://piston.local:4290/api/v2/execute".into(),
        };
        assert!(!e.is_rate_limit());
        assert!(e.is_unreachable());
    }
}
