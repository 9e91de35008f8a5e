//! Hardware interface abstraction
//!
//! This module provides the [`DisplayInterface`] trait and the [`Interface`] struct
//! for communicating with the AC073TC1 controller over SPI.
//!
//! ## Hardware Requirements
//!
//! The AC073TC1 requires:
//! - SPI bus (MOSI + SCK), transmit only
//! - 2 GPIO pins:
//!   - **DC**: Data/Command select (output, low=command, high=data)
//!   - **RST**: Reset (output, active low)
//!
//! The panel also exposes a BUSY pin. The driver never reads it and waits
//! fixed settle delays instead.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::digital::OutputPin;
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use ac073tc1::{DisplayInterface, Interface};
//! # use core::convert::Infallible;
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
//! // Create interface with SPI and GPIO pins
//! let mut interface = Interface::new(MockSpi, MockPin, MockPin);
//!
//! // Power on, no data
//! let _ = interface.send_command(0x04, None);
//!
//! // Display refresh with one data byte
//! let _ = interface.send_command(0x12, Some(&[0x00]));
//! ```

use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::command::{RESET_PULSE_MS, RESET_RECOVERY_MS, RESET_SETUP_MS};

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Trait for hardware interface to the AC073TC1 controller
///
/// This trait abstracts over different hardware implementations,
/// allowing the [`Display`](crate::display::Display) to work with any
/// SPI + GPIO implementation that satisfies embedded-hal traits.
///
/// ## Implementing
///
/// For most cases, use the provided [`Interface`] struct. Test doubles that
/// record the command stream implement this trait directly.
pub trait DisplayInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send a command byte, followed by its data if any
    ///
    /// The implementation must:
    /// 1. Send the command byte with DC left low (command mode)
    /// 2. If `data` is `Some`, set DC high, send the data, then set DC low
    ///    again whether or not the data transfer succeeded
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn send_command(&mut self, command: u8, data: Option<&[u8]>)
    -> InterfaceResult<(), Self::Error>;

    /// Perform the power-on reset
    ///
    /// The implementation must, in this order:
    /// 1. Set DC low
    /// 2. Set RST high, wait 100ms
    /// 3. Set RST low, wait 100ms
    /// 4. Set RST high, wait 1000ms
    ///
    /// # Errors
    ///
    /// Returns the zero-based number of the line write that failed, with
    /// the error. The sequence stops at the first failure.
    fn reset<D: DelayNs>(&mut self, delay: &mut D) -> InterfaceResult<(), (usize, Self::Error)>;
}

/// Errors that can occur at the interface level
///
/// Generic over SPI and GPIO error types.
#[derive(Debug)]
pub enum InterfaceError<SpiErr, PinErr> {
    /// SPI communication error
    Spi(SpiErr),
    /// GPIO pin error
    Pin(PinErr),
}

impl<SpiErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI error: {e:?}"),
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
        }
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<SpiErr, PinErr> {}

/// Hardware interface implementation for the AC073TC1
///
/// Implements [`DisplayInterface`] for embedded-hal v1.0 SPI and GPIO traits.
///
/// ## Type Parameters
///
/// * `SPI` - SPI device implementing [`SpiDevice`]
/// * `DC` - Data/Command pin implementing [`OutputPin`]
/// * `RST` - Reset pin implementing [`OutputPin`]
///
/// Fields are declared in release order. The control lines are dropped
/// before the bus, the reverse of the order a host opens them in.
#[derive(Debug)]
pub struct Interface<SPI, DC, RST> {
    /// Data/Command select pin (low=command, high=data)
    dc: DC,
    /// Reset pin (active low)
    rst: RST,
    /// SPI device for communication
    spi: SPI,
}

impl<SPI, DC, RST> Interface<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Create a new Interface
    ///
    /// # Arguments
    ///
    /// * `spi` - SPI device (must implement [`SpiDevice`])
    /// * `dc` - Data/Command pin (output, low=command, high=data)
    /// * `rst` - Reset pin (output, active low)
    pub fn new(spi: SPI, dc: DC, rst: RST) -> Self {
        Self { dc, rst, spi }
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, DC, RST) {
        (self.spi, self.dc, self.rst)
    }
}

impl<SPI, DC, RST, PinErr> DisplayInterface for Interface<SPI, DC, RST>
where
    SPI: SpiDevice,
    SPI::Error: Debug,
    DC: OutputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn send_command(
        &mut self,
        command: u8,
        data: Option<&[u8]>,
    ) -> InterfaceResult<(), Self::Error> {
        let spi_err = |e: SPI::Error| -> Self::Error { InterfaceError::Spi(e) };
        let pin_err = |e: PinErr| -> Self::Error { InterfaceError::Pin(e) };

        self.spi.write(&[command]).map_err(spi_err)?;

        let Some(data) = data else {
            return Ok(());
        };

        self.dc.set_high().map_err(pin_err)?;
        let sent = self.spi.write(data).map_err(spi_err);
        // Command mode is restored even when the data transfer failed.
        let restored = self.dc.set_low().map_err(pin_err);
        sent.and(restored)
    }

    fn reset<D: DelayNs>(&mut self, delay: &mut D) -> InterfaceResult<(), (usize, Self::Error)> {
        let pin_err = |step: usize, e: PinErr| -> (usize, Self::Error) {
            (step, InterfaceError::Pin(e))
        };

        self.dc.set_low().map_err(|e| pin_err(0, e))?;

        self.rst.set_high().map_err(|e| pin_err(1, e))?;
        delay.delay_ms(RESET_SETUP_MS);
        self.rst.set_low().map_err(|e| pin_err(2, e))?;
        delay.delay_ms(RESET_PULSE_MS);
        self.rst.set_high().map_err(|e| pin_err(3, e))?;
        delay.delay_ms(RESET_RECOVERY_MS);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use embedded_hal::digital::ErrorType;
    use embedded_hal::spi::{ErrorType as SpiErrorType, Operation};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Dc(bool),
        Rst(bool),
        Write(Vec<u8>),
        DelayMs(u32),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct MockError;

    impl embedded_hal::digital::Error for MockError {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    impl embedded_hal::spi::Error for MockError {
        fn kind(&self) -> embedded_hal::spi::ErrorKind {
            embedded_hal::spi::ErrorKind::Other
        }
    }

    struct MockSpi {
        log: Log,
        fail_on_write: Option<usize>,
        writes: usize,
    }

    impl SpiErrorType for MockSpi {
        type Error = MockError;
    }

    impl SpiDevice for MockSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
            for op in operations {
                if let Operation::Write(data) = op {
                    let index = self.writes;
                    self.writes += 1;
                    if self.fail_on_write == Some(index) {
                        return Err(MockError);
                    }
                    self.log.borrow_mut().push(Event::Write(data.to_vec()));
                }
            }
            Ok(())
        }
    }

    struct MockPin {
        log: Log,
        is_dc: bool,
        fail: bool,
    }

    impl ErrorType for MockPin {
        type Error = MockError;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.set(false)
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.set(true)
        }
    }

    impl MockPin {
        fn set(&mut self, level: bool) -> Result<(), MockError> {
            if self.fail {
                return Err(MockError);
            }
            let event = if self.is_dc {
                Event::Dc(level)
            } else {
                Event::Rst(level)
            };
            self.log.borrow_mut().push(event);
            Ok(())
        }
    }

    struct MockDelay {
        log: Log,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.log.borrow_mut().push(Event::DelayMs(ns / 1_000_000));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.log.borrow_mut().push(Event::DelayMs(ms));
        }
    }

    type TestInterface = Interface<MockSpi, MockPin, MockPin>;

    fn test_interface(fail_on_write: Option<usize>) -> (TestInterface, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let spi = MockSpi {
            log: log.clone(),
            fail_on_write,
            writes: 0,
        };
        let dc = MockPin {
            log: log.clone(),
            is_dc: true,
            fail: false,
        };
        let rst = MockPin {
            log: log.clone(),
            is_dc: false,
            fail: false,
        };
        (Interface::new(spi, dc, rst), log)
    }

    #[test]
    fn test_command_without_data_leaves_dc_untouched() {
        let (mut interface, log) = test_interface(None);
        interface.send_command(0x04, None).unwrap();
        assert_eq!(*log.borrow(), [Event::Write(alloc::vec![0x04])]);
    }

    #[test]
    fn test_command_with_data_brackets_data_mode() {
        let (mut interface, log) = test_interface(None);
        interface.send_command(0x12, Some(&[0x00])).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                Event::Write(alloc::vec![0x12]),
                Event::Dc(true),
                Event::Write(alloc::vec![0x00]),
                Event::Dc(false),
            ]
        );
    }

    #[test]
    fn test_empty_data_still_enters_data_mode() {
        let (mut interface, log) = test_interface(None);
        interface.send_command(0x10, Some(&[])).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                Event::Write(alloc::vec![0x10]),
                Event::Dc(true),
                Event::Write(Vec::new()),
                Event::Dc(false),
            ]
        );
    }

    #[test]
    fn test_failed_data_transfer_restores_command_mode() {
        let (mut interface, log) = test_interface(Some(1));
        let result = interface.send_command(0x10, Some(&[0xAA; 8]));
        assert!(matches!(result, Err(InterfaceError::Spi(MockError))));
        assert_eq!(
            *log.borrow(),
            [
                Event::Write(alloc::vec![0x10]),
                Event::Dc(true),
                Event::Dc(false),
            ]
        );
    }

    #[test]
    fn test_failed_command_byte_skips_data() {
        let (mut interface, log) = test_interface(Some(0));
        let result = interface.send_command(0x10, Some(&[0xAA; 8]));
        assert!(matches!(result, Err(InterfaceError::Spi(MockError))));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reset_sequence_order_and_timing() {
        let (mut interface, log) = test_interface(None);
        let mut delay = MockDelay { log: log.clone() };
        interface.reset(&mut delay).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                Event::Dc(false),
                Event::Rst(true),
                Event::DelayMs(100),
                Event::Rst(false),
                Event::DelayMs(100),
                Event::Rst(true),
                Event::DelayMs(1_000),
            ]
        );
    }

    #[test]
    fn test_reset_reports_failing_line_write() {
        let (interface, log) = test_interface(None);
        let (spi, dc, mut rst) = interface.release();
        rst.fail = true;
        let mut interface = Interface::new(spi, dc, rst);
        let mut delay = MockDelay { log: log.clone() };

        let result = interface.reset(&mut delay);
        assert!(matches!(result, Err((1, InterfaceError::Pin(MockError)))));
        assert_eq!(*log.borrow(), [Event::Dc(false)]);
    }
}
