use bytes::Bytes;
use jobwire_frame::{
    decode_frame, kind_name, Frame, FrameError, AVAILABILITY_REQUEST, AVAILABILITY_RESPONSE,
    DEFAULT_MAX_BODY, JOB_ASSIGNMENT, REGISTER, REGISTER_ACK,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::identity::{JobType, WorkerIdentity};

/// Encode/decode failure for a protocol message.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The envelope is malformed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The message body is not valid for its kind.
    #[error("invalid {kind} body: {source}")]
    Body {
        kind: &'static str,
        source: serde_json::Error,
    },
}

/// A dispatchable unit of work as described by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(rename = "type", deserialize_with = "job_type_or_participant")]
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>, job_type: JobType) -> Self {
        Self {
            id: id.into(),
            job_type,
            room: None,
        }
    }
}

/// Registration accepted by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
}

/// Worker answer to an availability request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub job_id: String,
    pub available: bool,
}

/// Messages a worker sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Register(WorkerIdentity),
    AvailabilityResponse(AvailabilityResponse),
}

/// Messages a dispatcher sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    RegisterAck(RegisterAck),
    AvailabilityRequest(Job),
    JobAssignment(Job),
}

#[derive(Serialize)]
struct JobBodyRef<'a> {
    job: &'a Job,
}

#[derive(Deserialize)]
struct JobBody {
    job: Job,
}

impl OutboundMessage {
    /// Availability answer for `job_id`.
    pub fn availability(job_id: impl Into<String>, available: bool) -> Self {
        OutboundMessage::AvailabilityResponse(AvailabilityResponse {
            job_id: job_id.into(),
            available,
        })
    }

    /// Envelope kind of this message.
    pub fn kind(&self) -> u16 {
        match self {
            OutboundMessage::Register(_) => REGISTER,
            OutboundMessage::AvailabilityResponse(_) => AVAILABILITY_RESPONSE,
        }
    }

    /// Encode into one transport frame.
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        let body = match self {
            OutboundMessage::Register(identity) => to_body(REGISTER, identity)?,
            OutboundMessage::AvailabilityResponse(resp) => to_body(AVAILABILITY_RESPONSE, resp)?,
        };
        Ok(Frame::new(self.kind(), body).to_bytes()?)
    }

    /// Decode a worker message, as a dispatcher would.
    ///
    /// Returns `Ok(None)` for kinds that are not worker messages.
    pub fn decode(payload: Bytes) -> Result<Option<Self>, CodecError> {
        let frame = decode_frame(payload, DEFAULT_MAX_BODY)?;
        let message = match frame.kind {
            REGISTER => OutboundMessage::Register(from_body(REGISTER, &frame.body)?),
            AVAILABILITY_RESPONSE => {
                OutboundMessage::AvailabilityResponse(from_body(AVAILABILITY_RESPONSE, &frame.body)?)
            }
            other => {
                debug!(kind = other, name = kind_name(other), "ignoring non-worker message");
                return Ok(None);
            }
        };
        Ok(Some(message))
    }
}

impl InboundMessage {
    /// Envelope kind of this message.
    pub fn kind(&self) -> u16 {
        match self {
            InboundMessage::RegisterAck(_) => REGISTER_ACK,
            InboundMessage::AvailabilityRequest(_) => AVAILABILITY_REQUEST,
            InboundMessage::JobAssignment(_) => JOB_ASSIGNMENT,
        }
    }

    /// Encode into one transport frame, as a dispatcher would.
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        let kind = self.kind();
        let body = match self {
            InboundMessage::RegisterAck(ack) => to_body(kind, ack)?,
            InboundMessage::AvailabilityRequest(job) | InboundMessage::JobAssignment(job) => {
                to_body(kind, &JobBodyRef { job })?
            }
        };
        Ok(Frame::new(kind, body).to_bytes()?)
    }

    /// Decode a dispatcher message.
    ///
    /// Returns `Ok(None)` for unrecognized kinds so newer dispatchers can add
    /// messages without breaking older workers.
    pub fn decode(payload: Bytes) -> Result<Option<Self>, CodecError> {
        let frame = decode_frame(payload, DEFAULT_MAX_BODY)?;
        let message = match frame.kind {
            // An empty body is a bare acknowledgement.
            REGISTER_ACK if frame.body.is_empty() => {
                InboundMessage::RegisterAck(RegisterAck::default())
            }
            REGISTER_ACK => InboundMessage::RegisterAck(from_body(REGISTER_ACK, &frame.body)?),
            AVAILABILITY_REQUEST => {
                let body: JobBody = from_body(AVAILABILITY_REQUEST, &frame.body)?;
                InboundMessage::AvailabilityRequest(body.job)
            }
            JOB_ASSIGNMENT => {
                let body: JobBody = from_body(JOB_ASSIGNMENT, &frame.body)?;
                InboundMessage::JobAssignment(body.job)
            }
            other => {
                debug!(kind = other, name = kind_name(other), "ignoring unknown message");
                return Ok(None);
            }
        };
        Ok(Some(message))
    }
}

/// Any job type other than `JT_ROOM` is participant-scoped work, including
/// types added by newer dispatchers.
fn job_type_or_participant<'de, D>(deserializer: D) -> Result<JobType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(match raw.as_str() {
        "JT_ROOM" => JobType::Room,
        "JT_PUBLISHER" => JobType::Publisher,
        other => {
            debug!(job_type = other, "unrecognized job type counted as participant");
            JobType::Publisher
        }
    })
}

fn to_body<T: Serialize>(kind: u16, value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|source| CodecError::Body {
        kind: kind_name(kind),
        source,
    })
}

fn from_body<'a, T: Deserialize<'a>>(kind: u16, body: &'a [u8]) -> Result<T, CodecError> {
    serde_json::from_slice(body).map_err(|source| CodecError::Body {
        kind: kind_name(kind),
        source,
    })
}
