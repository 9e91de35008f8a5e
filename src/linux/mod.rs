//! Host bindings for Linux single-board computers
//!
//! [`SpidevBus`] and [`CdevLine`] implement the embedded-hal SPI and output
//! pin traits on top of the kernel's spidev and GPIO character devices, and
//! [`DisplayDriver`] ties them to the panel using a [`Config`](crate::Config).

pub mod driver;
pub mod gpio;
pub mod spi;

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

pub use driver::{DisplayDriver, DriverError, LinuxInterface};
pub use gpio::{CdevLine, LineError};
pub use spi::{BusError, SpidevBus};

/// Blocking delay on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
