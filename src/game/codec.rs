//! Newline-delimited JSON framing for the game proxy connection.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::warn;

use crate::common::error::GameError;

/// Longest accepted inbound frame.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Frame received from the proxy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// One chat line as a chat component tree.
    Chat { json: Value },
    /// Player list header text.
    TabHeader { text: String },
    /// Online player names.
    Players { names: Vec<String> },
    /// The proxy was kicked from the server.
    Kicked { reason: String },
    #[serde(other)]
    Unknown,
}

/// Frame sent to the proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Say `text` in game chat. Text starting with `/` runs a command.
    Chat { text: String },
}

/// Codec for proxy frames.
pub struct ProxyCodec {
    max_frame_len: usize,
    /// Bytes already scanned for a newline.
    scanned: usize,
}

impl ProxyCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            max_frame_len,
            scanned: 0,
        }
    }
}

impl Default for ProxyCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN)
    }
}

impl Decoder for ProxyCodec {
    type Item = InboundFrame;
    type Error = GameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(offset) = src[self.scanned..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_frame_len {
                    return Err(GameError::FrameTooLong { len: src.len() });
                }
                self.scanned = src.len();
                return Ok(None);
            };

            let line = src.split_to(self.scanned + offset + 1);
            self.scanned = 0;
            let line = &line[..line.len() - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                continue;
            }

            match serde_json::from_slice::<InboundFrame>(line) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => {
                    // Skip the frame and keep reading
                    warn!("Dropping invalid proxy frame: {}", e);
                }
            }
        }
    }
}

impl Encoder<OutboundFrame> for ProxyCodec {
    type Error = GameError;

    fn encode(&mut self, item: OutboundFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let encoded = serde_json::to_vec(&item)?;
        dst.reserve(encoded.len() + 1);
        dst.put_slice(&encoded);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// A framed proxy connection.
pub type ProxyConnection<S> = Framed<S, ProxyCodec>;

pub fn new_proxy_connection<S: AsyncRead + AsyncWrite>(stream: S) -> ProxyConnection<S> {
    Framed::new(stream, ProxyCodec::default())
}
