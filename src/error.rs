//! Error types for the driver
//!
//! This module defines error types for image preparation ([`ImageError`]),
//! configuration ([`BuilderError`]) and the command protocol ([`Error`]).
//!
//! ## Error Types
//!
//! - [`ImageError`] - The source image cannot be prepared
//! - [`BuilderError`] - Invalid canvas dimensions
//! - [`Error`] - Runtime errors while talking to the controller
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level bus and line errors
//!
//! Every hardware failure is fatal to the run. Nothing in this crate retries a
//! command: the panel state after a partial command is unknown, and the only
//! recovery is a fresh reset.
//!
//! ## Example
//!
//! ```
//! use ac073tc1::{Dimensions, ImageError, SourceImage};
//!
//! let result = SourceImage::rgb(0, 10, &[]);
//! assert!(matches!(result, Err(ImageError::InvalidImage { width: 0, height: 10 })));
//!
//! assert!(Dimensions::new(0, 480).is_err());
//! ```

use crate::display::{Phase, State};
use crate::interface::DisplayInterface;

/// Errors that can occur when interacting with the display
///
/// Generic over the interface type to preserve the specific error type.
/// This allows error handling code to match on the underlying hardware error.
#[derive(Debug)]
pub enum Error<I: DisplayInterface> {
    /// A bus or line failure during a protocol step
    ///
    /// `step` is the zero-based position in the phase: the line write number
    /// during reset, or the index into the command sequence otherwise. No
    /// later step was attempted.
    StepFailed {
        /// Phase that was running
        phase: Phase,
        /// Failing step within the phase
        step: usize,
        /// Underlying hardware error
        source: I::Error,
    },
    /// Operation called out of order
    InvalidState {
        /// State required by the operation
        expected: State,
        /// State the display was in
        actual: State,
    },
    /// Packed frame has the wrong length for the panel
    FrameSize {
        /// Required frame size in bytes
        expected: usize,
        /// Provided frame size in bytes
        provided: usize,
    },
}

impl<I: DisplayInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StepFailed {
                phase,
                step,
                source,
            } => write!(f, "{phase} step {step} failed: {source:?}"),
            Self::InvalidState { expected, actual } => {
                write!(f, "Invalid state: expected {expected:?}, was {actual:?}")
            }
            Self::FrameSize { expected, provided } => {
                write!(
                    f,
                    "Frame size mismatch: expected {expected} bytes, provided {provided}"
                )
            }
        }
    }
}

impl<I: DisplayInterface + core::fmt::Debug> core::error::Error for Error<I> {}

/// Errors that can occur when preparing an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Source image has zero width or height
    InvalidImage {
        /// Source width
        width: u32,
        /// Source height
        height: u32,
    },
    /// Sample buffer length does not match the dimensions and layout
    SampleLength {
        /// Required number of bytes
        expected: usize,
        /// Provided number of bytes
        provided: usize,
    },
    /// Packed frame holds a nibble outside the palette
    InvalidIndex {
        /// Byte offset in the packed frame
        offset: usize,
        /// Offending byte
        value: u8,
    },
}

impl core::fmt::Display for ImageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidImage { width, height } => {
                write!(f, "Invalid image: {width}x{height}")
            }
            Self::SampleLength { expected, provided } => write!(
                f,
                "Sample buffer length mismatch: expected {expected} bytes, provided {provided}"
            ),
            Self::InvalidIndex { offset, value } => {
                write!(f, "Invalid palette index in byte {offset}: {value:#04x}")
            }
        }
    }
}

impl core::error::Error for ImageError {}

/// Errors that can occur when building configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// Invalid dimensions provided
    ///
    /// See [`Dimensions::new()`](crate::config::Dimensions::new) for constraints.
    InvalidDimensions {
        /// Width requested
        width: u32,
        /// Height requested
        height: u32,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => write!(
                f,
                "Invalid dimensions {width}x{height} (must be non-zero with an even pixel count)"
            ),
        }
    }
}

impl core::error::Error for BuilderError {}
