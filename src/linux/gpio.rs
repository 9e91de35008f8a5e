//! Digital output lines on the GPIO character device
//!
//! Lines are claimed through the v2 line-request interface, which (unlike the
//! legacy sysfs and v1 interfaces) accepts bias flags. The kernel returns a
//! separate file descriptor for the claimed line; dropping [`CdevLine`] closes
//! it and releases the line.
#![allow(unsafe_code)]

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::string::String;

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};
use log::debug;
use nix::errno::Errno;

use crate::config::LineFlags;

/// Kernel structures from `linux/gpio.h`
mod uapi {
    pub const MAX_NAME_SIZE: usize = 32;
    pub const LINES_MAX: usize = 64;
    pub const NUM_ATTRS_MAX: usize = 10;

    #[repr(C)]
    #[derive(Clone, Copy)]
    pub struct LineAttribute {
        pub id: u32,
        pub padding: u32,
        pub value: u64,
    }

    #[repr(C)]
    #[derive(Clone, Copy)]
    pub struct LineConfigAttribute {
        pub attr: LineAttribute,
        pub mask: u64,
    }

    #[repr(C)]
    pub struct LineConfig {
        pub flags: u64,
        pub num_attrs: u32,
        pub padding: [u32; 5],
        pub attrs: [LineConfigAttribute; NUM_ATTRS_MAX],
    }

    #[repr(C)]
    pub struct LineRequest {
        pub offsets: [u32; LINES_MAX],
        pub consumer: [u8; MAX_NAME_SIZE],
        pub config: LineConfig,
        pub num_lines: u32,
        pub event_buffer_size: u32,
        pub padding: [u32; 5],
        pub fd: i32,
    }

    #[repr(C)]
    pub struct LineValues {
        pub bits: u64,
        pub mask: u64,
    }

    const _: () = assert!(core::mem::size_of::<LineRequest>() == 592);
    const _: () = assert!(core::mem::size_of::<LineValues>() == 16);

    impl LineRequest {
        /// Request for a single line with no extra attributes
        pub fn single(offset: u32, flags: u64, consumer: &str) -> Self {
            const EMPTY: LineConfigAttribute = LineConfigAttribute {
                attr: LineAttribute {
                    id: 0,
                    padding: 0,
                    value: 0,
                },
                mask: 0,
            };

            let mut offsets = [0; LINES_MAX];
            offsets[0] = offset;

            // NUL-terminated, truncated to fit
            let mut label = [0; MAX_NAME_SIZE];
            let len = consumer.len().min(MAX_NAME_SIZE - 1);
            label[..len].copy_from_slice(&consumer.as_bytes()[..len]);

            Self {
                offsets,
                consumer: label,
                config: LineConfig {
                    flags,
                    num_attrs: 0,
                    padding: [0; 5],
                    attrs: [EMPTY; NUM_ATTRS_MAX],
                },
                num_lines: 1,
                event_buffer_size: 0,
                padding: [0; 5],
                fd: -1,
            }
        }
    }

    nix::ioctl_readwrite!(get_line, 0xB4, 0x07, LineRequest);
    nix::ioctl_readwrite!(set_values, 0xB4, 0x0F, LineValues);
}

/// Errors from the digital line layer
#[derive(Debug)]
pub enum LineError {
    /// The controller device node could not be opened
    DeviceUnavailable {
        /// Device path
        path: String,
        /// Underlying I/O error
        source: io::Error,
    },
    /// The kernel refused the line request (busy, bad offset or bad flags)
    LineRequestFailed {
        /// Line offset
        offset: u32,
        /// Kernel error
        source: Errno,
    },
    /// Setting the line level failed
    LineWriteFailed {
        /// Line offset
        offset: u32,
        /// Kernel error
        source: Errno,
    },
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable { path, source } => {
                write!(f, "cannot open GPIO controller {path}: {source}")
            }
            Self::LineRequestFailed { offset, source } => {
                write!(f, "cannot claim GPIO line {offset}: {source}")
            }
            Self::LineWriteFailed { offset, source } => {
                write!(f, "cannot set GPIO line {offset}: {source}")
            }
        }
    }
}

impl std::error::Error for LineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DeviceUnavailable { source, .. } => Some(source),
            Self::LineRequestFailed { source, .. } | Self::LineWriteFailed { source, .. } => {
                Some(source)
            }
        }
    }
}

impl digital::Error for LineError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One claimed output line
#[derive(Debug)]
pub struct CdevLine {
    fd: OwnedFd,
    offset: u32,
}

impl CdevLine {
    /// Claim a line on a GPIO controller
    ///
    /// # Errors
    ///
    /// [`LineError::DeviceUnavailable`] if `chip` cannot be opened,
    /// [`LineError::LineRequestFailed`] if the kernel rejects the request.
    pub fn open(chip: &str, offset: u32, flags: LineFlags, consumer: &str) -> Result<Self, LineError> {
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(chip)
            .map_err(|source| LineError::DeviceUnavailable {
                path: String::from(chip),
                source,
            })?;

        let mut request = uapi::LineRequest::single(offset, flags.bits(), consumer);
        // SAFETY: `request` is a live, correctly sized v2 line request and the
        // descriptor stays open for the duration of the call.
        unsafe { uapi::get_line(device.as_raw_fd(), &raw mut request) }
            .map_err(|source| LineError::LineRequestFailed { offset, source })?;

        // SAFETY: on success the kernel stores a fresh descriptor that nothing
        // else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(request.fd) };
        debug!("claimed line {offset} on {chip} with flags {:#x}", flags.bits());

        Ok(Self { fd, offset })
    }

    /// Line offset on its controller
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Drive the line low (`false`) or high (`true`)
    ///
    /// # Errors
    ///
    /// [`LineError::LineWriteFailed`] on any kernel error.
    pub fn set_value(&mut self, high: bool) -> Result<(), LineError> {
        let mut values = uapi::LineValues {
            bits: u64::from(high),
            mask: 1,
        };
        // SAFETY: `values` outlives the call and `fd` is an open line handle.
        unsafe { uapi::set_values(self.fd.as_raw_fd(), &raw mut values) }
            .map(drop)
            .map_err(|source| LineError::LineWriteFailed {
                offset: self.offset,
                source,
            })
    }
}

impl ErrorType for CdevLine {
    type Error = LineError;
}

impl OutputPin for CdevLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_value(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_value(true)
    }
}
