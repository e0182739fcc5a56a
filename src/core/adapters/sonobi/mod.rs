mod request;
mod response;

use crate::app::config::AdapterConfig;
use crate::core::adapters::bids::BidSet;
use crate::core::adapters::errors::AdapterError;
use crate::core::adapters::{Adapter, RequestData, ResponseData};
use crate::core::models::openrtb::BidRequest;
use anyhow::{anyhow, bail};
use url::Url;

/// Adapter for the Sonobi exchange, which accepts a single
/// impression per bid request
#[derive(Debug, Clone)]
pub struct SonobiAdapter {
    uri: String,
}

impl SonobiAdapter {
    pub const NAME: &'static str = "sonobi";

    pub fn new(endpoint: &str) -> Result<Self, anyhow::Error> {
        let url = Url::parse(endpoint)
            .map_err(|e| anyhow!("Invalid sonobi endpoint '{}': {}", endpoint, e))?;

        if !matches!(url.scheme(), "http" | "https") {
            bail!("Sonobi endpoint must be http(s), got '{}'", url.scheme());
        }

        Ok(Self {
            uri: endpoint.to_string(),
        })
    }

    pub fn from_config(config: &AdapterConfig) -> Result<Self, anyhow::Error> {
        Self::new(&config.endpoint)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Adapter for SonobiAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn make_requests(&self, req: &BidRequest) -> (Vec<RequestData>, Vec<AdapterError>) {
        request::build_requests(&self.uri, req)
    }

    fn make_bids(
        &self,
        internal_req: &BidRequest,
        _external_req: &RequestData,
        response: &ResponseData,
    ) -> Result<Option<BidSet>, AdapterError> {
        response::map_bids(internal_req, response)
    }
}
