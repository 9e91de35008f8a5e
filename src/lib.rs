//! AC073TC1 E-Paper Display Driver
//!
//! A driver for the 7.3" seven-color AC073TC1 e-paper panel (800x480), as
//! used on Inky Impression boards.
//!
//! ## Features
//!
//! - `no_std` + `alloc` core: image preparation and the command protocol
//! - `embedded-hal` v1.0 support
//! - Bilinear scaling and Floyd–Steinberg dithering to the seven pigments
//! - `embedded-graphics` integration (with `graphics` feature)
//! - Linux spidev and GPIO character device bindings (with `linux` feature)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::OutputPin;
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use ac073tc1::{prepare, Dimensions, Display, Interface, SourceImage};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiDevice for MockSpi {
//! #     fn transaction(
//! #         &mut self,
//! #         _operations: &mut [Operation<'_, u8>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let spi = MockSpi;
//! # let dc = MockPin;
//! # let rst = MockPin;
//! # let mut delay = MockDelay;
//! # let pixels = [0u8; 4 * 3 * 3];
//! let source = match SourceImage::rgb(4, 3, &pixels) {
//!     Ok(source) => source,
//!     Err(_) => return,
//! };
//! let frame = prepare(&source, Dimensions::PANEL);
//!
//! let mut display = Display::new(Interface::new(spi, dc, rst));
//! let _ = display.render(&frame, &mut delay);
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// Color types for seven-color e-paper displays
pub mod color;
/// AC073TC1 command definitions
pub mod command;
/// Display configuration types and builder
pub mod config;
/// Core display operations
pub mod display;
/// Error types for the driver
pub mod error;
/// Hardware interface abstraction
pub mod interface;
/// Image scaling, dithering and packing
pub mod prepare;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

/// Linux host bindings (requires `linux` feature)
#[cfg(feature = "linux")]
pub mod linux;

pub use color::{Color, PALETTE};
pub use config::{Builder, Config, Dimensions, LineFlags, SpiMode};
pub use display::{Display, Phase, State};
pub use error::{BuilderError, Error, ImageError};
pub use interface::{DisplayInterface, Interface, InterfaceError};
pub use prepare::{
    PackedFrame, PreparedFrame, Region, SampleLayout, SourceImage, ToneCanvas, dither, fit_region,
    prepare, resample,
};

#[cfg(feature = "linux")]
pub use linux::{DisplayDriver, DriverError, StdDelay};
