//! Discord IPC transport client.
//!
//! Speaks the framed-JSON protocol from [`wire`](super::wire) over the
//! desktop client's Unix socket. Socket discovery walks the usual runtime
//! directories, including the snap and flatpak sandbox locations.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::DiscordSettings;
use crate::domain::presence::PresencePayload;
use crate::domain::transport::{PresenceTransport, TransportError, TransportFactory};

use super::wire::{
    decode_header, encode_frame, Activity, ActivityCommand, Handshake, Opcode, Reply,
    FRAME_HEADER_LEN, HANDSHAKE_VERSION,
};

/// Subdirectories probed below the runtime dir. Sandboxed installs expose
/// the socket one level down.
const SOCKET_SUBDIRS: &[&str] = &["", "app/com.discordapp.Discord", "snap.discord"];

/// Number of `discord-ipc-N` names probed per directory.
const SOCKET_SLOTS: u32 = 10;

/// A single connection to the desktop client.
pub struct DiscordIpcTransport {
    client_id: String,
    socket_override: Option<PathBuf>,
    call_timeout: Duration,
    stream: Option<UnixStream>,
}

impl DiscordIpcTransport {
    pub fn new(
        client_id: String,
        socket_override: Option<PathBuf>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client_id,
            socket_override,
            call_timeout,
            stream: None,
        }
    }

    /// Send a command frame and wait for its reply, bounded by the call
    /// timeout. Ping frames arriving in between are answered inline.
    async fn round_trip<T: Serialize>(&mut self, command: &T) -> Result<(), TransportError> {
        let deadline = self.call_timeout;
        let stream = self.stream.as_mut().ok_or(TransportError::ChannelClosed)?;

        let exchange = async {
            send_frame(stream, Opcode::Frame, command).await?;
            loop {
                let (opcode, reply) = read_reply(stream).await?;
                match opcode {
                    Opcode::Frame => {
                        if let Some(detail) = reply.command_error() {
                            return Err(TransportError::other(detail));
                        }
                        return Ok(());
                    }
                    Opcode::Ping => {
                        let body = reply.data.unwrap_or(serde_json::Value::Null);
                        send_frame(stream, Opcode::Pong, &body).await?;
                    }
                    Opcode::Close => return Err(TransportError::ChannelClosed),
                    Opcode::Handshake | Opcode::Pong => continue,
                }
            }
        };

        timeout(deadline, exchange)
            .await
            .map_err(|_| TransportError::other("timed out waiting for the presence channel"))?
    }
}

#[async_trait]
impl PresenceTransport for DiscordIpcTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let client_id = self.client_id.clone();
        let socket_override = self.socket_override.clone();

        let establish = async {
            let mut stream = open_stream(socket_override.as_deref()).await?;
            let handshake = Handshake {
                v: HANDSHAKE_VERSION,
                client_id: &client_id,
            };
            send_frame(&mut stream, Opcode::Handshake, &handshake).await?;

            let (_, reply) = read_reply(&mut stream).await?;
            if let Some(detail) = reply.handshake_error() {
                return Err(TransportError::other(format!(
                    "handshake rejected: {}",
                    detail
                )));
            }
            Ok(stream)
        };

        let stream = timeout(self.call_timeout, establish)
            .await
            .map_err(|_| TransportError::other("timed out connecting to the presence channel"))??;

        self.stream = Some(stream);
        debug!("Presence handshake completed");
        Ok(())
    }

    async fn update(&mut self, payload: &PresencePayload) -> Result<(), TransportError> {
        let command =
            ActivityCommand::set_activity(std::process::id(), Activity::from_payload(payload));
        self.round_trip(&command).await
    }

    async fn clear(&mut self) -> Result<(), TransportError> {
        let command = ActivityCommand::clear_activity(std::process::id());
        self.round_trip(&command).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            // The handle is being discarded; nothing to do about failures.
            let _ = send_frame(&mut stream, Opcode::Close, &serde_json::json!({})).await;
            let _ = stream.shutdown().await;
        }
        Ok(())
    }
}

/// Builds IPC transports bound to one client identity.
pub struct DiscordTransportFactory {
    client_id: String,
    socket_override: Option<PathBuf>,
    call_timeout: Duration,
}

impl DiscordTransportFactory {
    pub fn new(settings: &DiscordSettings) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            socket_override: settings.ipc_path.as_ref().map(PathBuf::from),
            call_timeout: settings.call_timeout(),
        }
    }
}

impl TransportFactory for DiscordTransportFactory {
    fn make_transport(&self) -> Box<dyn PresenceTransport> {
        Box::new(DiscordIpcTransport::new(
            self.client_id.clone(),
            self.socket_override.clone(),
            self.call_timeout,
        ))
    }
}

async fn open_stream(socket_override: Option<&Path>) -> Result<UnixStream, TransportError> {
    if let Some(path) = socket_override {
        return UnixStream::connect(path).await.map_err(|err| {
            TransportError::other(format!(
                "cannot open presence socket {}: {}",
                path.display(),
                err
            ))
        });
    }

    for candidate in candidate_sockets(&runtime_dir()) {
        match UnixStream::connect(&candidate).await {
            Ok(stream) => {
                debug!(socket = %candidate.display(), "Found presence socket");
                return Ok(stream);
            }
            Err(_) => continue,
        }
    }

    Err(TransportError::other(
        "no presence socket found; is the desktop client running?",
    ))
}

fn runtime_dir() -> PathBuf {
    for var in ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"] {
        if let Some(dir) = std::env::var_os(var) {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
    }
    PathBuf::from("/tmp")
}

fn candidate_sockets(base: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for subdir in SOCKET_SUBDIRS {
        let dir = if subdir.is_empty() {
            base.to_path_buf()
        } else {
            base.join(subdir)
        };
        for slot in 0..SOCKET_SLOTS {
            candidates.push(dir.join(format!("discord-ipc-{}", slot)));
        }
    }
    candidates
}

async fn send_frame<T: Serialize>(
    stream: &mut UnixStream,
    opcode: Opcode,
    body: &T,
) -> Result<(), TransportError> {
    let frame = encode_frame(opcode, body)?;
    stream.write_all(&frame).await.map_err(classify_io)
}

async fn read_reply(stream: &mut UnixStream) -> Result<(Opcode, Reply), TransportError> {
    let mut header_bytes = [0u8; FRAME_HEADER_LEN];
    stream
        .read_exact(&mut header_bytes)
        .await
        .map_err(classify_io)?;
    let header = decode_header(header_bytes)?;

    let mut body = vec![0u8; header.len as usize];
    stream.read_exact(&mut body).await.map_err(classify_io)?;

    let reply = serde_json::from_slice(&body)
        .map_err(|err| TransportError::other(format!("malformed IPC reply: {}", err)))?;
    Ok((header.opcode, reply))
}

/// Map I/O failures onto the transport taxonomy. Kinds that mean "the peer
/// went away" classify as the recoverable `ChannelClosed`.
fn classify_io(err: io::Error) -> TransportError {
    match err.kind() {
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected => TransportError::ChannelClosed,
        _ => TransportError::other(err.to_string()),
    }
}
