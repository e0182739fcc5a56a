use crate::child_span_debug;
use crate::core::adapters::ResponseData;
use crate::core::adapters::bids::{BidSet, MediaType, TypedBid};
use crate::core::adapters::errors::AdapterError;
use crate::core::models::openrtb::{BidRequest, BidResponse};
use tracing::{debug, warn};

const STATUS_OK: u16 = 200;
const STATUS_NO_CONTENT: u16 = 204;

/// Maps a sonobi response to typed bids, resolving each bid media type
/// from the impression it was placed on in the original request
pub(super) fn map_bids(
    internal_req: &BidRequest,
    response: &ResponseData,
) -> Result<Option<BidSet>, AdapterError> {
    let _span = child_span_debug!(
        "sonobi_map_bids",
        req_id = %internal_req.id,
        status = response.status_code
    )
    .entered();

    match response.status_code {
        STATUS_NO_CONTENT => {
            debug!("Sonobi no bid");
            return Ok(None);
        }
        STATUS_OK => {}
        status => return Err(AdapterError::unexpected_status(status)),
    }

    let bid_response: BidResponse =
        serde_json::from_slice(&response.body).map_err(|e| AdapterError::BadServerResponse {
            message: format!("Failed decoding json response: {}", e),
        })?;

    let bid_count: usize = bid_response.seatbid.iter().map(|seat| seat.bid.len()).sum();
    let mut bid_set = BidSet::with_capacity(bid_count, bid_response.cur);

    for seat in bid_response.seatbid {
        for bid in seat.bid {
            let Some(imp) = internal_req.find_imp(&bid.impid) else {
                warn!("Sonobi bid {} references unknown imp {}", bid.id, bid.impid);
                bid_set.errors.push(AdapterError::unknown_imp(&bid.impid));
                continue;
            };

            bid_set.bids.push(TypedBid {
                bid_type: MediaType::for_imp(imp),
                bid,
            });
        }
    }

    debug!(
        "Mapped {} of {} sonobi bids",
        bid_set.bids.len(),
        bid_count
    );

    Ok(Some(bid_set))
}
