//! Frames exchanged with a `codec-worker` process: one request frame on
//! stdin, one message frame on stdout.
//!
//! A frame is a bincode `FrameHeader` followed by the bincode body. The
//! header is checked before the body is read.

use bincode::{DefaultOptions, Options};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use domain::conversion::{ConversionPayload, ConversionRequest, WorkerMessage};

const MAGIC: [u8; 4] = *b"TOON";
const VERSION: u16 = 1;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Frame does not start with the worker magic")]
    BadMagic,
    #[error("Unsupported frame version {0}")]
    UnsupportedVersion(u16),
    #[error("Malformed frame: {0}")]
    Malformed(#[from] bincode::Error),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct FrameHeader {
    magic: [u8; 4],
    version: u16,
}

impl FrameHeader {
    fn current() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
        }
    }

    fn check(&self) -> Result<(), WireError> {
        if self.magic != MAGIC {
            return Err(WireError::BadMagic);
        }
        if self.version != VERSION {
            return Err(WireError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

fn options() -> impl Options {
    DefaultOptions::new().reject_trailing_bytes()
}

fn encode_frame<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>, WireError> {
    let mut frame = Vec::new();
    options().serialize_into(&mut frame, &FrameHeader::current())?;
    options().serialize_into(&mut frame, body)?;
    Ok(frame)
}

fn decode_frame<T: DeserializeOwned>(frame: &[u8]) -> Result<T, WireError> {
    let mut body = frame;
    let header: FrameHeader = options().deserialize_from(&mut body)?;
    header.check()?;
    Ok(options().deserialize(body)?)
}

pub fn encode_request(request: &ConversionRequest) -> Result<Vec<u8>, WireError> {
    encode_frame(request.payload())
}

/// Payloads are revalidated, so an encode with a zero target side is rejected here.
pub fn decode_request(frame: &[u8]) -> Result<ConversionRequest, WireError> {
    let payload: ConversionPayload = decode_frame(frame)?;
    ConversionRequest::from_payload(payload).map_err(|e| WireError::InvalidRequest(e.to_string()))
}

pub fn encode_message(message: &WorkerMessage) -> Result<Vec<u8>, WireError> {
    encode_frame(message)
}

pub fn decode_message(frame: &[u8]) -> Result<WorkerMessage, WireError> {
    decode_frame(frame)
}
