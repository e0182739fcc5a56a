use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

/// Generic `imp.ext` envelope every bidder adapter shares. The
/// bidder object is kept untyped so each adapter decodes its own params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtImpBidder {
    pub bidder: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prebid: Option<Value>,
}

/// Sonobi placement params found under `imp.ext.bidder`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtImpSonobi {
    #[serde(rename = "TagID")]
    pub tag_id: String,
}

/// Which decode stage rejected an impression extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExtStage {
    /// `imp.ext` absent entirely
    Missing,
    /// `imp.ext` did not match the `{"bidder": ...}` envelope
    Envelope,
    /// `imp.ext.bidder` did not match the exchange params
    Params,
}

#[derive(Debug)]
pub struct ExtDecodeError {
    pub stage: ExtStage,
    pub reason: String,
}

impl ExtImpBidder {
    pub fn decode(ext: Option<&Value>) -> Result<Self, ExtDecodeError> {
        let ext = ext.ok_or_else(|| ExtDecodeError {
            stage: ExtStage::Missing,
            reason: "imp.ext is required".to_string(),
        })?;

        ExtImpBidder::deserialize(ext).map_err(|e| ExtDecodeError {
            stage: ExtStage::Envelope,
            reason: e.to_string(),
        })
    }
}

impl ExtImpSonobi {
    /// Decodes the exchange params from an already decoded envelope
    pub fn decode(envelope: &ExtImpBidder) -> Result<Self, ExtDecodeError> {
        ExtImpSonobi::deserialize(&envelope.bidder).map_err(|e| ExtDecodeError {
            stage: ExtStage::Params,
            reason: e.to_string(),
        })
    }
}
