use crate::core::adapters::bids::{BidSet, TypedBid};
use crate::core::adapters::errors::AdapterError;
use crate::core::adapters::{Adapter, RequestData};
use crate::core::demand::client::Transport;
use crate::core::models::openrtb::BidRequest;
use crate::{child_span_info, sample_or_attach_root_span};
use futures_util::future::join_all;
use serde::{Serialize, Serializer};
use tracing::{Instrument, debug, info, warn};

fn serialize_errors<S: Serializer>(errors: &[AdapterError], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(errors.iter().map(|e| format!("{}: {}", e.kind(), e)))
}

/// Everything produced by one adapter for one canonical request
#[derive(Debug, Default, Serialize)]
pub struct CalloutOutcome {
    pub bidder: &'static str,
    /// Outbound requests built, one per valid impression
    pub callouts: usize,
    /// Callouts the exchange answered with no bid
    pub no_bids: usize,
    pub bids: Vec<TypedBid>,
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<AdapterError>,
}

enum CalloutResult {
    NoBid,
    Bids(BidSet),
    Failed(AdapterError),
}

async fn execute_callout(
    adapter: &dyn Adapter,
    transport: &dyn Transport,
    req: &BidRequest,
    callout: &RequestData,
) -> CalloutResult {
    let response = match transport.execute(callout).await {
        Ok(response) => response,
        Err(source) => {
            return CalloutResult::Failed(AdapterError::Transport {
                uri: callout.uri.clone(),
                source,
            });
        }
    };

    match adapter.make_bids(req, callout, &response) {
        Ok(Some(bid_set)) => CalloutResult::Bids(bid_set),
        Ok(None) => CalloutResult::NoBid,
        Err(e) => CalloutResult::Failed(e),
    }
}

/// Builds every outbound request for `req`, dispatches them concurrently
/// and folds the mapped responses together. Bids keep the order of the
/// impressions they were requested for
pub async fn run_callouts(
    adapter: &dyn Adapter,
    transport: &dyn Transport,
    req: &BidRequest,
    sample_rate: f32,
) -> CalloutOutcome {
    let span = sample_or_attach_root_span!(sample_rate, "callouts");

    async {
        let (callouts, build_errors) = adapter.make_requests(req);

        let mut outcome = CalloutOutcome {
            bidder: adapter.name(),
            callouts: callouts.len(),
            errors: build_errors,
            ..Default::default()
        };

        let results = join_all(callouts.iter().map(|callout| {
            let span = child_span_info!("callout", imp = %callout.imp_id);
            execute_callout(adapter, transport, req, callout).instrument(span)
        }))
        .await;

        for result in results {
            match result {
                CalloutResult::NoBid => outcome.no_bids += 1,
                CalloutResult::Bids(mut bid_set) => {
                    outcome.bids.append(&mut bid_set.bids);
                    outcome.errors.append(&mut bid_set.errors);
                }
                CalloutResult::Failed(e) => outcome.errors.push(e),
            }
        }

        for e in &outcome.errors {
            warn!(kind = %e.kind(), "{}", e);
        }

        debug!(
            "{} callouts, {} no bids, {} bids",
            outcome.callouts,
            outcome.no_bids,
            outcome.bids.len()
        );

        info!(
            bidder = outcome.bidder,
            bids = outcome.bids.len(),
            errors = outcome.errors.len(),
            "Callouts complete"
        );

        outcome
    }
    .instrument(span)
    .await
}
