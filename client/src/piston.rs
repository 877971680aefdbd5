use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use url::Url;

use crate::{error::*, model::*, util};

pub const DEFAULT_API_URL: &str = "http://localhost:2000";
pub const PUBLIC_API_URL: &str = "https://emkc.org/api/v2/piston";

const PUBLIC_API_PREFIX: &str = "https://emkc.org";

/// Something that can run one [`ExecutionRequest`] to completion.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, req: &ExecutionRequest) -> Result<ExecutionOutcome>;
}

/// The public service mounts its API under the base URL directly;
/// self-hosted instances serve it below `/api/v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    SelfHosted,
    Public,
}

impl Deployment {
    pub fn detect(base_url: &Url) -> Self {
        if base_url.as_str().starts_with(PUBLIC_API_PREFIX) {
            Deployment::Public
        } else {
            Deployment::SelfHosted
        }
    }

    fn api_prefix(self) -> &'static str {
        match self {
            Deployment::Public => "",
            Deployment::SelfHosted => "api/v2/",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PistonClient {
    http: reqwest::Client,
    base_url: Url,
    deployment: Deployment,
}

impl PistonClient {
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// `request_timeout` bounds every single attempt, so a stalled request
    /// cannot hold a concurrency slot forever.
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            deployment: Deployment::detect(&base_url),
            base_url,
            http,
        })
    }

    pub fn from_url_str(base_url: &str, request_timeout: Duration) -> Result<Self> {
        Self::new(util::parse_url(base_url)?, request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    pub fn is_public(&self) -> bool {
        self.deployment == Deployment::Public
    }

    pub fn execute_url(&self) -> String {
        self.endpoint("execute")
    }

    pub fn runtimes_url(&self) -> String {
        self.endpoint("runtimes")
    }

    fn endpoint(&self, name: &str) -> String {
        util::join_path(
            &self.base_url,
            &format!("{}{}", self.deployment.api_prefix(), name),
        )
    }

    /// Lists the runtimes installed on the service.
    pub async fn runtimes(&self, timeout: Duration) -> Result<Vec<Runtime>> {
        let url = self.runtimes_url();
        let resp = self.http.get(&url).timeout(timeout).send().await?;
        let body = Self::read_success_body(resp, &url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn read_success_body(resp: Response, requested_url: &str) -> Result<String> {
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited {
                requested_url: requested_url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(Error::UnexpectedResponseCode {
                got: status,
                requested_url: requested_url.to_owned(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl Executor for PistonClient {
    async fn execute(&self, req: &ExecutionRequest) -> Result<ExecutionOutcome> {
        let url = self.execute_url();
        log::debug!(
            "POST {} (language={}, stdin={} bytes)",
            url,
            req.language,
            req.stdin.len()
        );

        let resp = self.http.post(&url).json(&req.to_body()).send().await?;
        let body = Self::read_success_body(resp, &url).await?;
        let resp: PistonResponse = serde_json::from_str(&body)?;
        Ok(ExecutionOutcome::from_response(resp))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn client(url: &str) -> PistonClient {
        PistonClient::from_url_str(url, PistonClient::DEFAULT_REQUEST_TIMEOUT).unwrap()
    }

    #[test]
    fn self_hosted_endpoints() {
        let c = client(DEFAULT_API_URL);
        assert_eq!(c.deployment(), Deployment::SelfHosted);
        assert_eq!(c.execute_url(), "http://localhost:2000/api/v2/execute");
        assert_eq!(c.runtimes_url(), "http://localhost:2000/api/v2/runtimes");
    }

    #[test]
    fn public_endpoints() {
        let c = client(PUBLIC_API_URL);
        assert!(c.is_public());
        assert_eq!(c.execute_url(), "https://emkc.org/api/v2/piston/execute");
        assert_eq!(c.runtimes_url(), "https://emkc.org/api/v2/piston/runtimes");
    }
}
