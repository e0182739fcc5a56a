use crate::app::config::ClientConfig;
use crate::core::adapters::{RequestData, ResponseData};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, redirect, retry};
use std::time::Duration;
use tracing::debug;

/// Executes encoded exchange requests. Supplied by the caller so the
/// adapter core stays free of any connection handling
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns Ok for any completed http exchange regardless of status,
    /// status interpretation belongs to the adapter
    async fn execute(&self, req: &RequestData) -> Result<ResponseData, anyhow::Error>;
}

pub struct DemandClient {
    client: Client,
}

impl DemandClient {
    /// Create a new demand client, eagerly building the underlying
    /// http client to afford graceful failure on startup
    pub fn new(config: &ClientConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .tcp_keepalive(Some(Duration::from_secs(20)))
            .retry(retry::never())
            .referer(false)
            .redirect(redirect::Policy::none())
            .tcp_nodelay(true)
            .gzip(config.gzip)
            .deflate(config.gzip)
            .build()
            .map_err(anyhow::Error::from)?;

        Ok(DemandClient { client })
    }

    fn headers(req: &RequestData) -> Result<HeaderMap, anyhow::Error> {
        let mut headers = HeaderMap::with_capacity(req.headers.len());

        for header in &req.headers {
            let key = HeaderName::from_static(header.key);
            let value = HeaderValue::from_str(&header.value)
                .map_err(|e| anyhow!("Invalid header value: {}", e))?;

            headers.insert(key, value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl Transport for DemandClient {
    async fn execute(&self, req: &RequestData) -> Result<ResponseData, anyhow::Error> {
        if tracing::event_enabled!(tracing::Level::TRACE) {
            tracing::trace!("{}", String::from_utf8_lossy(&req.body));
        }

        let http_req = self
            .client
            .request(req.method.clone(), &req.uri)
            .headers(Self::headers(req)?)
            .body(req.body.clone())
            .build()
            .map_err(|e| anyhow!("Failed to build http request for imp {}: {}", req.imp_id, e))?;

        let res = self.client.execute(http_req).await.map_err(|e| {
            anyhow!("Failed to execute http request for imp {}: {}", req.imp_id, e)
        })?;

        let status_code = res.status().as_u16();
        debug!("Http {} for imp {} - awaiting body", status_code, req.imp_id);

        let body = res
            .bytes()
            .await
            .map_err(|e| anyhow!("Failed to read http response for imp {}: {}", req.imp_id, e))?;

        Ok(ResponseData { status_code, body })
    }
}
