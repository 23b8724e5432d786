//! Discord IPC wire format.
//!
//! Frames are a little-endian `(opcode: u32, length: u32)` header followed
//! by `length` bytes of JSON. The handshake announces the client ID; rich
//! presence itself travels as `SET_ACTIVITY` commands on `Frame` opcodes.

use serde::{Deserialize, Serialize};

use crate::domain::presence::PresencePayload;
use crate::domain::transport::TransportError;

/// Protocol version sent in the handshake.
pub const HANDSHAKE_VERSION: u32 = 1;

/// Size of the frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 8;

/// Upper bound on frame payloads; anything larger is a corrupt stream.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024;

/// Frame opcodes used by the local IPC protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Handshake,
    Frame,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Handshake => 0,
            Self::Frame => 1,
            Self::Close => 2,
            Self::Ping => 3,
            Self::Pong => 4,
        }
    }

    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Handshake),
            1 => Some(Self::Frame),
            2 => Some(Self::Close),
            3 => Some(Self::Ping),
            4 => Some(Self::Pong),
            _ => None,
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: Opcode,
    pub len: u32,
}

/// Encode a complete frame: header plus serialized JSON body.
pub fn encode_frame<T: Serialize>(opcode: Opcode, body: &T) -> Result<Vec<u8>, TransportError> {
    let json = serde_json::to_vec(body)
        .map_err(|err| TransportError::other(format!("failed to encode frame body: {}", err)))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + json.len());
    frame.extend_from_slice(&opcode.as_u32().to_le_bytes());
    frame.extend_from_slice(&(json.len() as u32).to_le_bytes());
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Decode a frame header, rejecting unknown opcodes and absurd lengths.
pub fn decode_header(bytes: [u8; FRAME_HEADER_LEN]) -> Result<FrameHeader, TransportError> {
    let raw_opcode = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    let opcode = Opcode::from_u32(raw_opcode)
        .ok_or_else(|| TransportError::other(format!("unknown IPC opcode {}", raw_opcode)))?;
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::other(format!(
            "IPC frame of {} bytes exceeds the {} byte limit",
            len, MAX_FRAME_BYTES
        )));
    }

    Ok(FrameHeader { opcode, len })
}

/// Handshake body announcing the client identity.
#[derive(Debug, Serialize)]
pub struct Handshake<'a> {
    pub v: u32,
    pub client_id: &'a str,
}

/// A `SET_ACTIVITY` command.
///
/// `activity: None` serializes as an explicit `null`, which is how the
/// protocol spells "clear the presence display".
#[derive(Debug, Serialize)]
pub struct ActivityCommand<'a> {
    pub cmd: &'static str,
    pub args: ActivityArgs<'a>,
    pub nonce: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityArgs<'a> {
    pub pid: u32,
    pub activity: Option<Activity<'a>>,
}

/// Activity body of a presence update.
#[derive(Debug, Serialize)]
pub struct Activity<'a> {
    pub details: &'a str,
    pub state: &'a str,
    pub assets: Assets<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Timestamps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Button<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct Assets<'a> {
    pub large_image: &'a str,
    pub large_text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Timestamps {
    pub start: i64,
}

#[derive(Debug, Serialize)]
pub struct Button<'a> {
    pub label: &'a str,
    pub url: &'a str,
}

impl<'a> Activity<'a> {
    /// Map a domain payload onto the wire shape.
    pub fn from_payload(payload: &'a PresencePayload) -> Self {
        Self {
            details: &payload.details,
            state: &payload.state,
            assets: Assets {
                large_image: &payload.large_image,
                large_text: &payload.large_text,
            },
            timestamps: payload.start_anchor.map(|start| Timestamps { start }),
            buttons: payload.button.as_ref().map(|button| {
                vec![Button {
                    label: &button.label,
                    url: &button.url,
                }]
            }),
        }
    }
}

impl<'a> ActivityCommand<'a> {
    /// A presence update command.
    pub fn set_activity(pid: u32, activity: Activity<'a>) -> Self {
        Self {
            cmd: "SET_ACTIVITY",
            args: ActivityArgs {
                pid,
                activity: Some(activity),
            },
            nonce: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// A presence clear command (explicit null activity).
    pub fn clear_activity(pid: u32) -> Self {
        Self {
            cmd: "SET_ACTIVITY",
            args: ActivityArgs {
                pid,
                activity: None,
            },
            nonce: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Reply frame from the client.
///
/// Command replies carry `cmd`/`evt`/`data`; handshake rejections instead
/// carry a top-level `code` and `message`.
#[derive(Debug, Deserialize)]
pub struct Reply {
    pub cmd: Option<String>,
    pub evt: Option<String>,
    pub data: Option<serde_json::Value>,
    pub nonce: Option<String>,
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl Reply {
    /// Whether this is the READY dispatch completing a handshake.
    pub fn is_ready(&self) -> bool {
        self.evt.as_deref() == Some("READY")
    }

    /// Error message carried by a failed command reply, if any.
    pub fn command_error(&self) -> Option<String> {
        if self.evt.as_deref() != Some("ERROR") {
            return None;
        }
        let detail = self
            .data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(|message| message.as_str())
            .unwrap_or("command rejected");
        Some(detail.to_string())
    }

    /// Error message for a rejected handshake, if the reply is not READY.
    pub fn handshake_error(&self) -> Option<String> {
        if self.is_ready() {
            return None;
        }
        Some(
            self.message
                .clone()
                .unwrap_or_else(|| "handshake rejected".to_string()),
        )
    }
}
