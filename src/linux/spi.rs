//! Serial bus on a Linux spidev node

use std::fmt;
use std::io;
use std::string::String;
use std::thread;
use std::time::Duration;
use std::vec;

use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation, SpiDevice};
use log::debug;
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::config::SpiMode;

/// Largest single transfer handed to the kernel
///
/// spidev rejects messages larger than its buffer (4096 bytes by default), so
/// longer writes are split.
pub const CHUNK_SIZE: usize = 4096;

/// Errors from the serial bus layer
#[derive(Debug)]
pub enum BusError {
    /// The device node could not be opened
    DeviceUnavailable {
        /// Device path
        path: String,
        /// Underlying I/O error
        source: io::Error,
    },
    /// Clock mode or rate was rejected
    ConfigurationFailed {
        /// Underlying I/O error
        source: io::Error,
    },
    /// A transfer failed part way
    TransferFailed {
        /// Bytes transmitted before the failure
        written: usize,
        /// Underlying I/O error
        source: io::Error,
    },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable { path, source } => {
                write!(f, "cannot open SPI device {path}: {source}")
            }
            Self::ConfigurationFailed { source } => write!(f, "cannot configure SPI: {source}"),
            Self::TransferFailed { written, source } => {
                write!(f, "SPI transfer failed after {written} bytes: {source}")
            }
        }
    }
}

impl std::error::Error for BusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DeviceUnavailable { source, .. }
            | Self::ConfigurationFailed { source }
            | Self::TransferFailed { source, .. } => Some(source),
        }
    }
}

impl spi::Error for BusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// An open, configured spidev device
pub struct SpidevBus {
    device: Spidev,
    path: String,
}

impl fmt::Debug for SpidevBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpidevBus").field("path", &self.path).finish()
    }
}

fn mode_flags(mode: SpiMode) -> SpiModeFlags {
    SpiModeFlags::from_bits_truncate(u32::from(mode.bits()))
}

impl SpidevBus {
    /// Open `path` and set its clock mode and maximum clock rate
    ///
    /// # Errors
    ///
    /// [`BusError::DeviceUnavailable`] if the node cannot be opened and
    /// [`BusError::ConfigurationFailed`] if either setting is rejected. The
    /// device is closed again before a configuration error is returned.
    pub fn open(path: &str, mode: SpiMode, clock_hz: u32) -> Result<Self, BusError> {
        let mut device = Spidev::open(path).map_err(|source| BusError::DeviceUnavailable {
            path: String::from(path),
            source,
        })?;

        let configure = |device: &mut Spidev, options: &SpidevOptions| {
            device
                .configure(options)
                .map_err(|source| BusError::ConfigurationFailed { source })
        };
        configure(&mut device, &SpidevOptions::new().mode(mode_flags(mode)).build())?;
        configure(&mut device, &SpidevOptions::new().max_speed_hz(clock_hz).build())?;

        debug!("opened {path} in {mode:?} at {clock_hz}Hz");
        Ok(Self {
            device,
            path: String::from(path),
        })
    }

    /// Device path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Transmit `bytes`, discarding whatever is clocked in
    ///
    /// Returns the number of bytes written, which is always `bytes.len()` on
    /// success.
    ///
    /// # Errors
    ///
    /// [`BusError::TransferFailed`] on the first failing chunk.
    pub fn transfer(&mut self, bytes: &[u8]) -> Result<usize, BusError> {
        let mut discard = vec![0u8; bytes.len()];
        self.duplex(bytes, &mut discard)?;
        Ok(bytes.len())
    }

    /// Full-duplex exchange of equal-length buffers
    fn duplex(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), BusError> {
        let device = &mut self.device;
        chunked(tx, rx, |tx, rx| {
            device.transfer(&mut SpidevTransfer::read_write(tx, rx))
        })
    }
}

/// Run `exchange` over [`CHUNK_SIZE`] pieces of `tx` and `rx` in order
///
/// Stops at the first failing piece, reporting how many bytes went out before
/// it.
fn chunked<F>(tx: &[u8], rx: &mut [u8], mut exchange: F) -> Result<(), BusError>
where
    F: FnMut(&[u8], &mut [u8]) -> io::Result<()>,
{
    let mut written = 0;
    for (tx, rx) in tx.chunks(CHUNK_SIZE).zip(rx.chunks_mut(CHUNK_SIZE)) {
        exchange(tx, rx).map_err(|source| BusError::TransferFailed { written, source })?;
        written += tx.len();
    }
    Ok(())
}

impl ErrorType for SpidevBus {
    type Error = BusError;
}

impl SpiDevice for SpidevBus {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(words) => {
                    self.transfer(words)?;
                }
                Operation::Read(words) => {
                    let idle = vec![0u8; words.len()];
                    self.duplex(&idle, words)?;
                }
                Operation::Transfer(read, write) => {
                    // Shorter side is padded with zeros or truncated
                    let len = read.len().max(write.len());
                    let mut tx = vec![0u8; len];
                    tx[..write.len()].copy_from_slice(write);
                    let mut rx = vec![0u8; len];
                    self.duplex(&tx, &mut rx)?;
                    read.copy_from_slice(&rx[..read.len()]);
                }
                Operation::TransferInPlace(words) => {
                    let tx = words.to_vec();
                    self.duplex(&tx, words)?;
                }
                Operation::DelayNs(ns) => thread::sleep(Duration::from_nanos(u64::from(*ns))),
            }
        }
        Ok(())
    }
}
