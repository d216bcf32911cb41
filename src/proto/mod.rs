//! Proxy Message Protocol
//!
//! The versioned textual envelope that carries one structured event inside
//! a line of a remote process's standard output:
//!
//! ```text
//! CFSMSG:<version>:<event>:<base64(json kwargs)>
//! ```
//!
//! Decoding is strict: missing prefix, version mismatch, malformed split,
//! bad base64 or bad JSON all produce [`Error::EnvelopeDecode`]; there is
//! no best-effort partial decode. Callers degrade by passing the raw line
//! through as a diagnostic.

use crate::action::Operation;
use crate::component::ComponentState;
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Fixed literal identifying a protocol line.
pub const PROTO_PREFIX: &str = "CFSMSG";

/// The single protocol version this build speaks.
pub const PROTO_VERSION: u32 = 1;

// =============================================================================
// Envelope
// =============================================================================

/// One decoded protocol line: an event name plus its keyword parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: String,
    pub params: Map<String, Value>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            event: event.into(),
            params,
        }
    }

    /// Encode as one output line.
    pub fn encode(&self) -> String {
        let payload = B64.encode(Value::Object(self.params.clone()).to_string());
        format!("{}:{}:{}:{}", PROTO_PREFIX, PROTO_VERSION, self.event, payload)
    }

    /// Decode one output line, strictly.
    pub fn decode(line: &str) -> Result<Self> {
        let mut parts = line.splitn(4, ':');
        let prefix = parts.next().unwrap_or_default();
        if prefix != PROTO_PREFIX {
            return Err(Error::EnvelopeDecode("missing message prefix".into()));
        }

        let version = parts
            .next()
            .ok_or_else(|| Error::EnvelopeDecode("truncated message".into()))?;
        let version: u32 = version
            .parse()
            .map_err(|_| Error::EnvelopeDecode(format!("bad version field '{}'", version)))?;
        if version != PROTO_VERSION {
            return Err(Error::EnvelopeDecode(format!(
                "message version mismatch: got {}, supported {}",
                version, PROTO_VERSION
            )));
        }

        let event = parts
            .next()
            .ok_or_else(|| Error::EnvelopeDecode("missing event field".into()))?;
        if event.is_empty() {
            return Err(Error::EnvelopeDecode("empty event field".into()));
        }
        let payload = parts
            .next()
            .ok_or_else(|| Error::EnvelopeDecode("missing payload field".into()))?;

        let raw = B64
            .decode(payload)
            .map_err(|e| Error::EnvelopeDecode(format!("bad payload encoding: {}", e)))?;
        let value: Value = serde_json::from_slice(&raw)
            .map_err(|e| Error::EnvelopeDecode(format!("bad payload json: {}", e)))?;
        let params = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::EnvelopeDecode(format!(
                    "payload is not a mapping: {}",
                    other
                )))
            }
        };

        Ok(Self {
            event: event.to_string(),
            params,
        })
    }
}

// =============================================================================
// Typed Events
// =============================================================================

/// A decoded filesystem event, addressed to one component by tag.
///
/// Replaces the dynamic `ev_<operation>_<verb>` method lookup of the wire
/// naming with a fixed tagged enum.
#[derive(Debug, Clone, PartialEq)]
pub enum FsEvent {
    /// The remote side began the operation on a component.
    Start { op: Operation, tag: String },
    /// The operation completed on a component.
    Done {
        op: Operation,
        tag: String,
        message: Option<String>,
        /// Fresh classification carried by status outcomes.
        state: Option<ComponentState>,
    },
    /// The operation failed on a component.
    Failed {
        op: Operation,
        tag: String,
        rc: Option<i32>,
        message: String,
        /// Error state the remote check classified, if reported.
        state: Option<ComponentState>,
    },
}

impl FsEvent {
    /// Component tag this event addresses.
    pub fn tag(&self) -> &str {
        match self {
            FsEvent::Start { tag, .. } => tag,
            FsEvent::Done { tag, .. } => tag,
            FsEvent::Failed { tag, .. } => tag,
        }
    }

    /// Operation this event belongs to.
    pub fn operation(&self) -> Operation {
        match self {
            FsEvent::Start { op, .. } => *op,
            FsEvent::Done { op, .. } => *op,
            FsEvent::Failed { op, .. } => *op,
        }
    }

    /// Build the wire envelope for this event.
    pub fn to_envelope(&self) -> Envelope {
        let mut params = Map::new();
        params.insert("tag".into(), Value::String(self.tag().to_string()));
        let verb = match self {
            FsEvent::Start { .. } => "start",
            FsEvent::Done { message, state, .. } => {
                if let Some(message) = message {
                    params.insert("message".into(), Value::String(message.clone()));
                }
                if let Some(state) = state {
                    params.insert("state".into(), serde_json::json!(state));
                }
                "done"
            }
            FsEvent::Failed {
                rc, message, state, ..
            } => {
                params.insert("message".into(), Value::String(message.clone()));
                if let Some(rc) = rc {
                    params.insert("rc".into(), Value::from(*rc));
                }
                if let Some(state) = state {
                    params.insert("state".into(), serde_json::json!(state));
                }
                "failed"
            }
        };
        Envelope::new(format!("{}_{}", self.operation(), verb), params)
    }

    /// Interpret a decoded envelope as a typed event.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let (op, verb) = envelope
            .event
            .split_once('_')
            .ok_or_else(|| {
                Error::EnvelopeDecode(format!("unknown event '{}'", envelope.event))
            })?;
        let op = Operation::from_str(op)?;

        let tag = match envelope.params.get("tag") {
            Some(Value::String(tag)) => tag.clone(),
            _ => {
                return Err(Error::EnvelopeDecode(format!(
                    "event '{}' missing component tag",
                    envelope.event
                )))
            }
        };
        let message = match envelope.params.get("message") {
            Some(Value::String(m)) => Some(m.clone()),
            _ => None,
        };
        let state = match envelope.params.get("state") {
            Some(v) => Some(
                serde_json::from_value::<ComponentState>(v.clone())
                    .map_err(|e| Error::EnvelopeDecode(format!("bad state field: {}", e)))?,
            ),
            None => None,
        };

        match verb {
            "start" => Ok(FsEvent::Start { op, tag }),
            "done" => Ok(FsEvent::Done {
                op,
                tag,
                message,
                state,
            }),
            "failed" => {
                let rc = envelope
                    .params
                    .get("rc")
                    .and_then(Value::as_i64)
                    .map(|rc| rc as i32);
                Ok(FsEvent::Failed {
                    op,
                    tag,
                    rc,
                    message: message.unwrap_or_else(|| "operation failed".into()),
                    state,
                })
            }
            other => Err(Error::EnvelopeDecode(format!(
                "unknown event verb '{}'",
                other
            ))),
        }
    }
}
