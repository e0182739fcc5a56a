pub mod bids;
pub mod errors;
pub mod sonobi;

use crate::core::adapters::bids::BidSet;
use crate::core::adapters::errors::AdapterError;
use crate::core::models::openrtb::BidRequest;
use bytes::Bytes;
use reqwest::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: &'static str,
    pub value: String,
}

impl Header {
    pub fn new(key: &'static str, value: String) -> Self {
        Self { key, value }
    }
}

/// A fully encoded outbound exchange request. Owns all of its data so
/// callouts can be dispatched concurrently without touching the source
/// bid request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    /// The impression this request carries
    pub imp_id: String,
    pub method: Method,
    pub uri: String,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseData {
    pub status_code: u16,
    pub body: Bytes,
}

impl ResponseData {
    pub fn new(status_code: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

/// Translates canonical bid requests to a single exchange and back
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Builds the outbound requests for `req`. Per impression failures are
    /// returned next to the requests that could be built, never instead
    /// of them
    fn make_requests(&self, req: &BidRequest) -> (Vec<RequestData>, Vec<AdapterError>);

    /// Maps one exchange response back to typed bids.
    ///
    /// # Behavior
    /// - `Ok(None)` when the exchange had no bid
    /// - `Err` when the whole response is unusable
    /// - `Ok(Some(set))` otherwise, with unmappable bids recorded in `set.errors`
    fn make_bids(
        &self,
        internal_req: &BidRequest,
        external_req: &RequestData,
        response: &ResponseData,
    ) -> Result<Option<BidSet>, AdapterError>;
}
