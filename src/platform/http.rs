// ABOUTME: HTTP health probe for out-of-band validation of an endpoint.
// ABOUTME: Used against the test listener before cutover; plain HTTP/1 GET.

use bytes::Bytes;
use http_body_util::Empty;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;

use crate::config::HealthCheckConfig;

use super::traits::EndpointAddr;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to connect to {0}: {1}")]
    Connect(String, std::io::Error),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid probe request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("endpoint unhealthy after {0} attempts")]
    Unhealthy(u32),
}

/// One-shot HTTP health prober.
pub struct HttpProbe {
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// GET `path` on the endpoint; healthy means a 2xx status.
    pub async fn check(&self, endpoint: &EndpointAddr, path: &str) -> Result<bool, ProbeError> {
        let authority = endpoint.to_string();

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&authority))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(|e| ProbeError::Connect(authority.clone(), e))?;

        let (mut sender, conn) =
            hyper::client::conn::http1::handshake::<_, Empty<Bytes>>(TokioIo::new(stream)).await?;

        // The connection task resolves once the probe request is done.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "probe connection closed with error");
            }
        });

        let request = Request::builder()
            .uri(path)
            .header(hyper::header::HOST, authority)
            .body(Empty::<Bytes>::new())?;

        let response = tokio::time::timeout(self.timeout, sender.send_request(request))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;

        Ok(response.status().is_success())
    }

    /// Probe with the target-group health contract: retry up to
    /// `healthcheck.retries` times, `healthcheck.interval` apart.
    pub async fn await_healthy(
        &self,
        endpoint: &EndpointAddr,
        healthcheck: &HealthCheckConfig,
    ) -> Result<(), ProbeError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.check(endpoint, &healthcheck.path).await {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    tracing::debug!(%endpoint, attempt = attempts, "probe returned non-2xx");
                }
                Err(e @ (ProbeError::InvalidRequest(_) | ProbeError::Unhealthy(_))) => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(%endpoint, attempt = attempts, error = %e, "probe failed");
                }
            }
            if attempts > healthcheck.retries {
                return Err(ProbeError::Unhealthy(attempts));
            }
            tokio::time::sleep(healthcheck.interval).await;
        }
    }
}
