//! CloudEvents envelope and reissue event payloads.
//!
//! The upstream publisher wraps every notification in a CloudEvents 1.0
//! envelope whose `type` tag selects the payload shape. Decoding is
//! tag-dispatched and fails closed: an unrecognized tag, a version we do not
//! speak, or a payload that does not match its tag is an error, never a
//! best-effort guess.

use crate::error::EventDecodeError;
use serde::{Deserialize, Serialize};

/// Event type notation for the start of a reissue flow
pub const REISSUE_INIT_EVENT_TYPE: &str = "no.bankid.bass.audit.reissue.init.v1";

/// Event type notation for the terminal outcome of a reissue flow
pub const REISSUE_COMPLETED_EVENT_TYPE: &str = "no.bankid.bass.audit.reissue.completed.v1";

/// The only CloudEvents version this service accepts
pub const CLOUD_EVENTS_SPEC_VERSION: &str = "1.0";

/// Content type the publisher sends envelopes with
pub const CLOUD_EVENTS_CONTENT_TYPE: &str = "application/cloudevents+json";

// ============================================================================
// Envelope
// ============================================================================

/// A CloudEvents 1.0 envelope as delivered by Event Grid.
///
/// `data` stays a raw JSON value so that the payload can be forwarded without
/// modification; [`CloudEvent::decode_data`] validates it against the shape
/// its `type` tag promises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    /// Publisher-assigned event identifier
    pub id: String,
    /// URI reference identifying the event producer
    pub source: String,
    /// Type tag selecting the payload shape
    #[serde(rename = "type")]
    pub event_type: String,
    /// CloudEvents version declared by the envelope
    pub specversion: String,
    /// Media type of `data`, `application/json` when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    /// The event payload, untouched
    pub data: serde_json::Value,
}

impl CloudEvent {
    /// Check the envelope invariants that do not depend on the payload
    pub fn validate(&self) -> Result<(), EventDecodeError> {
        if self.specversion != CLOUD_EVENTS_SPEC_VERSION {
            return Err(EventDecodeError::UnsupportedSpecVersion {
                version: self.specversion.clone(),
            });
        }
        Ok(())
    }

    /// Decode `data` into the event variant the `type` tag promises.
    ///
    /// Fails closed: unknown tags and mismatched payloads are errors.
    pub fn decode_data(&self) -> Result<ReissueEvent, EventDecodeError> {
        self.validate()?;

        match self.event_type.as_str() {
            REISSUE_INIT_EVENT_TYPE => serde_json::from_value::<InitEvent>(self.data.clone())
                .map(ReissueEvent::Init)
                .map_err(|err| EventDecodeError::PayloadMismatch {
                    event_type: self.event_type.clone(),
                    message: err.to_string(),
                }),
            REISSUE_COMPLETED_EVENT_TYPE => {
                serde_json::from_value::<CompletedEvent>(self.data.clone())
                    .map(ReissueEvent::Completed)
                    .map_err(|err| EventDecodeError::PayloadMismatch {
                        event_type: self.event_type.clone(),
                        message: err.to_string(),
                    })
            }
            other => Err(EventDecodeError::UnknownEventType {
                event_type: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Authentication mechanism used in the reissue flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationMethod {
    /// BankID mobile
    #[serde(rename = "BIM")]
    Bim,
}

/// Action the audit events describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReissueAction {
    #[serde(rename = "REISSUE")]
    Reissue,
}

/// Status carried by an init event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitStatus {
    #[serde(rename = "BEGIN")]
    Begin,
}

/// Terminal status carried by a completed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Success => "SUCCESS",
            CompletionStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Start of a reissue flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitEvent {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub authentication: AuthenticationMethod,
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub action: ReissueAction,
    pub status: InitStatus,
}

/// Terminal outcome of a reissue flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedEvent {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub authentication: AuthenticationMethod,
    #[serde(rename = "orderID")]
    pub order_id: String,
    /// Completion time as published; forwarded verbatim, never parsed
    pub time: String,
    pub action: ReissueAction,
    pub status: CompletionStatus,
    #[serde(rename = "additionalInfo", skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

/// A decoded reissue event, one variant per known type notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReissueEvent {
    Init(InitEvent),
    Completed(CompletedEvent),
}

impl ReissueEvent {
    /// Which kind of event this is
    pub fn kind(&self) -> EventKind {
        match self {
            ReissueEvent::Init(_) => EventKind::ReissueInit,
            ReissueEvent::Completed(_) => EventKind::ReissueCompleted,
        }
    }

    /// Session identifier shared by both payload shapes
    pub fn session_id(&self) -> &str {
        match self {
            ReissueEvent::Init(event) => &event.session_id,
            ReissueEvent::Completed(event) => &event.session_id,
        }
    }

    /// Order identifier shared by both payload shapes
    pub fn order_id(&self) -> &str {
        match self {
            ReissueEvent::Init(event) => &event.order_id,
            ReissueEvent::Completed(event) => &event.order_id,
        }
    }
}

/// Kinds of accepted events, used for logs and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ReissueInit,
    ReissueCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ReissueInit => "reissue_init",
            EventKind::ReissueCompleted => "reissue_completed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
