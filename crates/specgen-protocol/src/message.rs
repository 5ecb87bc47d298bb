//! Protocol envelopes
//!
//! Every frame on the wire carries one [`ApiMessage`]: a message id, a
//! message type tag, and at most one payload field matching that tag.
//! Payload fields the peer did not send deserialize as `None` so that
//! missing data surfaces as a protocol error rather than a decode failure.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use specgen_model::{Scenario, Specification};
use std::fmt::{self, Display, Formatter};

/// Message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Request the complete specification set
    GetAllSpecsRequest,
    /// Complete specification set
    AllSpecsResponse,
    /// Engine-side failure
    ErrorResponse,
    /// Any other tag the engine sends; never a valid answer
    #[serde(other)]
    Unknown,
}

impl MessageType {
    /// Wire name of the tag
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetAllSpecsRequest => "GetAllSpecsRequest",
            Self::AllSpecsResponse => "AllSpecsResponse",
            Self::ErrorResponse => "ErrorResponse",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request for every specification; carries no selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllSpecsRequest {}

/// Scenario record as delivered by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario name; absent is a protocol error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Specification record as delivered by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRecord {
    /// Specification name; absent is a protocol error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Scenarios in engine order; absent means none
    #[serde(default)]
    pub scenarios: Vec<ScenarioRecord>,
}

/// Payload of [`MessageType::AllSpecsResponse`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllSpecsResponse {
    /// Specifications in engine order; absent is a protocol error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<Vec<SpecRecord>>,
}

impl AllSpecsResponse {
    /// Build a response from model values
    #[must_use]
    pub fn from_specifications(specs: &[Specification]) -> Self {
        let records = specs
            .iter()
            .map(|spec| SpecRecord {
                name: Some(spec.name.clone()),
                scenarios: spec
                    .scenarios
                    .iter()
                    .map(|scenario| ScenarioRecord {
                        name: Some(scenario.name.clone()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            specs: Some(records),
        }
    }

    /// Convert records into the model, preserving engine order
    ///
    /// # Errors
    /// `ClientError::Protocol` if the spec list or any name is absent.
    pub fn into_specifications(self) -> Result<Vec<Specification>, ClientError> {
        let records = self
            .specs
            .ok_or_else(|| ClientError::protocol("AllSpecsResponse is missing `specs`"))?;

        records
            .into_iter()
            .enumerate()
            .map(|(spec_index, record)| {
                let name = record.name.ok_or_else(|| {
                    ClientError::protocol(format!("spec record {spec_index} is missing `name`"))
                })?;

                let scenarios = record
                    .scenarios
                    .into_iter()
                    .enumerate()
                    .map(|(scenario_index, scenario)| {
                        scenario.name.map(Scenario::new).ok_or_else(|| {
                            ClientError::protocol(format!(
                                "scenario record {scenario_index} of spec {name:?} is missing `name`"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Specification { name, scenarios })
            })
            .collect()
    }
}

/// Payload of [`MessageType::ErrorResponse`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Engine's description of the failure
    #[serde(default)]
    pub message: String,
}

/// One protocol envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    /// Correlates a response with its request
    pub message_id: i64,
    /// Type tag selecting the payload field
    pub message_type: MessageType,
    /// Set when the tag is `GetAllSpecsRequest`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_specs_request: Option<GetAllSpecsRequest>,
    /// Set when the tag is `AllSpecsResponse`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_specs_response: Option<AllSpecsResponse>,
    /// Set when the tag is `ErrorResponse`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_response: Option<ErrorResponse>,
}

impl ApiMessage {
    /// Envelope with no payload
    #[inline]
    #[must_use]
    pub fn empty(message_id: i64, message_type: MessageType) -> Self {
        Self {
            message_id,
            message_type,
            all_specs_request: None,
            all_specs_response: None,
            error_response: None,
        }
    }

    /// `GetAllSpecsRequest` envelope
    #[inline]
    #[must_use]
    pub fn get_all_specs(message_id: i64) -> Self {
        Self {
            all_specs_request: Some(GetAllSpecsRequest::default()),
            ..Self::empty(message_id, MessageType::GetAllSpecsRequest)
        }
    }

    /// `AllSpecsResponse` envelope
    #[inline]
    #[must_use]
    pub fn all_specs(message_id: i64, response: AllSpecsResponse) -> Self {
        Self {
            all_specs_response: Some(response),
            ..Self::empty(message_id, MessageType::AllSpecsResponse)
        }
    }

    /// `ErrorResponse` envelope
    #[inline]
    #[must_use]
    pub fn error(message_id: i64, message: impl Into<String>) -> Self {
        Self {
            error_response: Some(ErrorResponse {
                message: message.into(),
            }),
            ..Self::empty(message_id, MessageType::ErrorResponse)
        }
    }
}
