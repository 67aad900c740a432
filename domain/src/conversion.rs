use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, DomainResult};
use crate::image::{EncodedImage, ImageFormat, PixelBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionOperation {
    Decode,
    Encode,
}

impl ConversionOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionOperation::Decode => "decode",
            ConversionOperation::Encode => "encode",
        }
    }
}

impl fmt::Display for ConversionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of an encode. When only one of `width`/`height` is set the other
/// side follows the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EncodeOptions {
    pub format: ImageFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl EncodeOptions {
    #[must_use]
    pub fn new(format: ImageFormat) -> Self {
        Self {
            format,
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.width == Some(0) || self.height == Some(0) {
            return Err(DomainError::InvalidDimensions(
                "Requested width and height must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Output size for a source of `source` dimensions.
    #[must_use]
    pub fn target_dimensions(&self, source: (u32, u32)) -> (u32, u32) {
        let (src_w, src_h) = source;
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, scale_side(src_h, w, src_w)),
            (None, Some(h)) => (scale_side(src_w, h, src_h), h),
            (None, None) => source,
        }
    }
}

fn scale_side(side: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return side.max(1);
    }
    let scaled = u64::from(side) * u64::from(numerator) / u64::from(denominator);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionPayload {
    Encoded(Vec<u8>),
    Pixels {
        pixels: PixelBuffer,
        options: EncodeOptions,
    },
}

/// A single unit of codec work, consumed by value by exactly one worker.
#[derive(Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    payload: ConversionPayload,
}

impl ConversionRequest {
    /// Empty input is accepted here and rejected by the worker as a codec failure.
    #[must_use]
    pub fn decode(bytes: Vec<u8>) -> Self {
        Self {
            payload: ConversionPayload::Encoded(bytes),
        }
    }

    pub fn encode(pixels: PixelBuffer, options: EncodeOptions) -> DomainResult<Self> {
        options.validate()?;
        Ok(Self {
            payload: ConversionPayload::Pixels { pixels, options },
        })
    }

    /// Rebuilds a request received over a worker transport.
    pub fn from_payload(payload: ConversionPayload) -> DomainResult<Self> {
        match payload {
            ConversionPayload::Encoded(bytes) => Ok(Self::decode(bytes)),
            ConversionPayload::Pixels { pixels, options } => Self::encode(pixels, options),
        }
    }

    #[must_use]
    pub fn operation(&self) -> ConversionOperation {
        match self.payload {
            ConversionPayload::Encoded(_) => ConversionOperation::Decode,
            ConversionPayload::Pixels { .. } => ConversionOperation::Encode,
        }
    }

    #[must_use]
    pub fn payload(&self) -> &ConversionPayload {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> ConversionPayload {
        self.payload
    }

    #[must_use]
    pub fn payload_len(&self) -> usize {
        match &self.payload {
            ConversionPayload::Encoded(bytes) => bytes.len(),
            ConversionPayload::Pixels { pixels, .. } => pixels.as_bytes().len(),
        }
    }
}

impl fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("operation", &self.operation())
            .field("payload_len", &self.payload_len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionOutput {
    Pixels(PixelBuffer),
    Encoded(EncodedImage),
}

impl ConversionOutput {
    #[must_use]
    pub fn into_pixels(self) -> Option<PixelBuffer> {
        match self {
            ConversionOutput::Pixels(pixels) => Some(pixels),
            ConversionOutput::Encoded(_) => None,
        }
    }

    #[must_use]
    pub fn into_encoded(self) -> Option<EncodedImage> {
        match self {
            ConversionOutput::Encoded(image) => Some(image),
            ConversionOutput::Pixels(_) => None,
        }
    }

    #[must_use]
    pub fn operation(&self) -> ConversionOperation {
        match self {
            ConversionOutput::Pixels(_) => ConversionOperation::Decode,
            ConversionOutput::Encoded(_) => ConversionOperation::Encode,
        }
    }
}

/// The one message a worker unit may emit before terminating normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerMessage {
    Success(ConversionOutput),
    Failure { message: String },
}

/// Termination status of a worker unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerExit {
    pub code: Option<i32>,
    pub detail: Option<String>,
}

impl WorkerExit {
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: Some(0),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_code(code: Option<i32>) -> Self {
        Self { code, detail: None }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "Worker stopped with exit code {code}")?,
            None => f.write_str("Worker stopped without an exit code")?,
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Emitted,
    Faulted,
    Terminated,
}

/// Single-use lifecycle of a worker unit:
/// `Idle -> Running -> (Emitted | Faulted) -> Terminated`.
#[derive(Debug)]
pub struct WorkerLifecycle {
    state: WorkerState,
}

impl Default for WorkerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: WorkerState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn start(&mut self) -> DomainResult<()> {
        self.transition(WorkerState::Idle, WorkerState::Running)
    }

    pub fn emit(&mut self) -> DomainResult<()> {
        self.transition(WorkerState::Running, WorkerState::Emitted)
    }

    pub fn fault(&mut self) -> DomainResult<()> {
        self.transition(WorkerState::Running, WorkerState::Faulted)
    }

    pub fn terminate(&mut self) -> DomainResult<()> {
        match self.state {
            WorkerState::Emitted | WorkerState::Faulted => {
                self.state = WorkerState::Terminated;
                Ok(())
            }
            other => Err(DomainError::InvalidWorkerTransition(format!(
                "cannot terminate from {other:?}"
            ))),
        }
    }

    fn transition(&mut self, from: WorkerState, to: WorkerState) -> DomainResult<()> {
        if self.state != from {
            return Err(DomainError::InvalidWorkerTransition(format!(
                "expected {from:?} before {to:?}, was {:?}",
                self.state
            )));
        }
        self.state = to;
        Ok(())
    }
}
