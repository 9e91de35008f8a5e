//! One-shot rendering on real hardware

use std::fmt;

use log::info;

use crate::config::{Config, Dimensions};
use crate::display::Display;
use crate::error::Error;
use crate::interface::Interface;
use crate::linux::StdDelay;
use crate::linux::gpio::{CdevLine, LineError};
use crate::linux::spi::{BusError, SpidevBus};
use crate::prepare::{PackedFrame, SourceImage, prepare};

/// Interface over the host's spidev node and two GPIO lines
pub type LinuxInterface = Interface<SpidevBus, CdevLine, CdevLine>;

/// Errors from [`DisplayDriver`]
#[derive(Debug)]
pub enum DriverError {
    /// Opening or configuring the serial bus failed
    Bus(BusError),
    /// Claiming a control line failed
    Line(LineError),
    /// The command protocol failed part way
    Protocol(Error<LinuxInterface>),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "{e}"),
            Self::Line(e) => write!(f, "{e}"),
            Self::Protocol(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bus(e) => Some(e),
            Self::Line(e) => Some(e),
            Self::Protocol(e) => Some(e),
        }
    }
}

impl From<BusError> for DriverError {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<LineError> for DriverError {
    fn from(e: LineError) -> Self {
        Self::Line(e)
    }
}

impl From<Error<LinuxInterface>> for DriverError {
    fn from(e: Error<LinuxInterface>) -> Self {
        Self::Protocol(e)
    }
}

/// Paints one image on a panel wired as described by a [`Config`]
///
/// Each render opens the bus and both lines, runs the whole protocol and
/// closes them again, on success and on every failure path.
#[derive(Clone, Debug, Default)]
pub struct DisplayDriver {
    config: Config,
}

impl DisplayDriver {
    /// Create a driver for the given wiring
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Wiring in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Prepare `source` and paint it
    ///
    /// The image is fully prepared before any device is opened.
    pub fn render(&self, source: &SourceImage<'_>) -> Result<(), DriverError> {
        let frame = prepare(source, Dimensions::PANEL);
        self.render_frame(&frame)
    }

    /// Paint an already packed frame
    pub fn render_frame(&self, frame: &PackedFrame) -> Result<(), DriverError> {
        let config = &self.config;

        // Bus, then reset line, then data line. Released in reverse.
        let bus = SpidevBus::open(&config.spi_path, config.spi_mode, config.spi_clock_hz)?;
        let reset = CdevLine::open(
            &config.gpio_chip_path,
            config.reset_line,
            config.line_flags,
            &config.consumer,
        )?;
        let data = CdevLine::open(
            &config.gpio_chip_path,
            config.data_line,
            config.line_flags,
            &config.consumer,
        )?;

        let mut display = Display::new(Interface::new(bus, data, reset));
        display.render(frame, &mut StdDelay)?;
        info!("render complete");
        Ok(())
    }
}
