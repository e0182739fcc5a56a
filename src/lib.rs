//! Translates canonical OpenRTB bid requests into single impression
//! Sonobi exchange requests, and Sonobi responses back into typed bids.

pub mod app;
pub mod core;

pub use crate::core::adapters::bids::{BidSet, MediaType, TypedBid};
pub use crate::core::adapters::errors::{AdapterError, ErrorKind};
pub use crate::core::adapters::sonobi::SonobiAdapter;
pub use crate::core::adapters::{Adapter, RequestData, ResponseData};
