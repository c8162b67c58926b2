//! reqwest-backed prober

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::{ProbeResult, Prober, ProberFactory};
use crate::config::{CaSource, ConnectionConfig};
use crate::error::Error;
use crate::Result;

/// Content type requested from the API server
const ACCEPT_JSON: &str = "application/json";

/// Prober that GETs one URI with bearer auth, trusting a custom root CA
pub struct HttpProber {
    client: reqwest::Client,
    uri: Url,
    token: Zeroizing<String>,
}

impl HttpProber {
    /// Build a client for the given connection
    ///
    /// Fails with a transport error if the CA can't be read or contains no
    /// usable certificate.
    pub fn new(connection: &ConnectionConfig) -> Result<Self> {
        let pem = load_ca_pem(&connection.ca)?;

        let certs = reqwest::Certificate::from_pem_bundle(&pem)
            .map_err(|e| Error::transport(format!("invalid CA certificate: {}", e)))?;
        if certs.is_empty() {
            return Err(Error::transport("no certificates found in CA bundle"));
        }

        let client = certs
            .into_iter()
            .fold(reqwest::Client::builder(), |builder, cert| {
                builder.add_root_certificate(cert)
            })
            .build()
            .map_err(|e| Error::transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            uri: connection.uri.clone(),
            token: connection.token.clone(),
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self) -> Result<ProbeResult> {
        let response = self
            .client
            .get(self.uri.clone())
            .header(ACCEPT, ACCEPT_JSON)
            .bearer_auth(self.token.as_str())
            .send()
            .await
            .map_err(|e| Error::transport(format!("GET {} failed: {}", self.uri, e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(format!("failed to read response body: {}", e)))?;

        debug!(uri = %self.uri, status, bytes = body.len(), "Probe completed");

        Ok(ProbeResult::new(status, body.to_vec()))
    }
}

fn load_ca_pem(source: &CaSource) -> Result<Vec<u8>> {
    match source {
        CaSource::Inline(pem) => Ok(pem.as_bytes().to_vec()),
        CaSource::File(path) => std::fs::read(path).map_err(|e| {
            Error::transport(format!(
                "failed to read CA certificate {}: {}",
                path.display(),
                e
            ))
        }),
    }
}

/// Default factory producing [`HttpProber`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpProberFactory;

impl ProberFactory for HttpProberFactory {
    fn build(&self, connection: &ConnectionConfig) -> Result<Arc<dyn Prober>> {
        Ok(Arc::new(HttpProber::new(connection)?))
    }
}
