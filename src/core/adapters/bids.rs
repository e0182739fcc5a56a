use crate::core::adapters::errors::AdapterError;
use crate::core::models::openrtb::{Bid, Imp};
use serde::Serialize;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    #[default]
    Banner,
    Video,
}

impl MediaType {
    /// Infers the creative format the exchange answered with from the
    /// shapes the impression declared. Only a video-only impression is
    /// typed video, banner covers every other combination including both.
    pub fn for_imp(imp: &Imp) -> MediaType {
        match (imp.banner.is_some(), imp.video.is_some()) {
            (false, true) => MediaType::Video,
            (true, _) | (false, false) => MediaType::Banner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedBid {
    pub bid: Bid,
    pub bid_type: MediaType,
}

/// Bids mapped from one exchange response, alongside the bids that
/// could not be mapped
#[derive(Debug)]
pub struct BidSet {
    pub bids: Vec<TypedBid>,
    pub currency: String,
    pub errors: Vec<AdapterError>,
}

impl BidSet {
    pub fn with_capacity(capacity: usize, currency: String) -> Self {
        Self {
            bids: Vec::with_capacity(capacity),
            currency,
            errors: Vec::new(),
        }
    }
}
