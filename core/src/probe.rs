use anyhow::Context as _;
use rjudge_client::{PistonClient, Runtime, Url, PUBLIC_API_URL};

use crate::config::ServiceConfig;
use crate::testing::RateLimits;

/// Where and how fast to send requests for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePlan {
    pub base_url: Url,
    pub limits: RateLimits,
    pub public: bool,
}

impl ServicePlan {
    pub fn configured(base_url: Url, limits: RateLimits) -> Self {
        Self {
            base_url,
            limits,
            public: false,
        }
    }

    pub fn public_fallback() -> Self {
        Self {
            base_url: Url::parse(PUBLIC_API_URL).expect("PUBLIC_API_URL is a valid URL"),
            limits: RateLimits::CONSERVATIVE,
            public: true,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} Piston API {} (max {} concurrent, ~{} req/s)",
            if self.public { "public" } else { "self-hosted" },
            self.base_url,
            self.limits.max_concurrent,
            self.limits.requests_per_second,
        )
    }
}

/// Decides the plan from the outcome of the runtime listing.
///
/// Only an unreachable service (connect error, timeout, error status) triggers the
/// public fallback; a body that is not a runtime list is returned as an error.
pub fn plan_from_probe(
    configured: ServicePlan,
    probed: rjudge_client::Result<Vec<Runtime>>,
) -> rjudge_client::Result<ServicePlan> {
    match probed {
        Ok(runtimes) if !runtimes.is_empty() => {
            log::debug!("{} runtimes available", runtimes.len());
            Ok(configured)
        }
        Ok(_) => {
            log::warn!(
                "Piston API at {} has no runtimes installed; using public Piston API ({}) instead",
                configured.base_url,
                PUBLIC_API_URL
            );
            Ok(ServicePlan::public_fallback())
        }
        Err(e) if e.is_unreachable() => {
            log::warn!(
                "Cannot connect to Piston API at {} ({}); using public Piston API ({}) instead",
                configured.base_url,
                e,
                PUBLIC_API_URL
            );
            Ok(ServicePlan::public_fallback())
        }
        Err(e) => Err(e),
    }
}

/// Probes the configured service and picks the rate limits for the run.
pub async fn select_service(cfg: &ServiceConfig, limits: RateLimits) -> anyhow::Result<ServicePlan> {
    let client = PistonClient::new(cfg.base_url.clone(), cfg.request_timeout())
        .context("Failed to build HTTP client")?;

    if client.is_public() {
        log::info!("Public Piston API has strict rate limits; using conservative settings");
        return Ok(ServicePlan {
            base_url: cfg.base_url.clone(),
            ..ServicePlan::public_fallback()
        });
    }

    let configured = ServicePlan::configured(cfg.base_url.clone(), limits);
    if !cfg.probe {
        return Ok(configured);
    }

    let probed = client.runtimes(cfg.probe_timeout()).await;
    plan_from_probe(configured, probed).with_context(|| {
        format!(
            "Unexpected answer from {}; is base_url pointing at a Piston API?",
            client.runtimes_url()
        )
    })
}
