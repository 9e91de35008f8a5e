//! Panel geometry and hardware wiring configuration

use alloc::string::String;

pub use crate::error::BuilderError;

/// Width of the AC073TC1 panel in pixels
pub const PANEL_WIDTH: u32 = 800;

/// Height of the AC073TC1 panel in pixels
pub const PANEL_HEIGHT: u32 = 480;

/// Canvas dimensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// The physical 800x480 panel
    pub const PANEL: Self = Self {
        width: PANEL_WIDTH,
        height: PANEL_HEIGHT,
    };

    /// Create new dimensions with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidDimensions` if:
    /// - width or height is zero
    /// - width * height is odd (pixels are packed in pairs)
    pub fn new(width: u32, height: u32) -> Result<Self, BuilderError> {
        if width == 0 || height == 0 {
            return Err(BuilderError::InvalidDimensions { width, height });
        }
        if (u64::from(width) * u64::from(height)) % 2 != 0 {
            return Err(BuilderError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of pixels on the canvas
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of a packed frame in bytes (two pixels per byte)
    pub fn packed_size(&self) -> usize {
        self.pixel_count() / 2
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::PANEL
    }
}

/// Clock polarity/phase mode of the serial bus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Mode bits as understood by the kernel (`SPI_CPOL | SPI_CPHA`)
    pub fn bits(self) -> u8 {
        match self {
            Self::Mode0 => 0x00,
            Self::Mode1 => 0x01,
            Self::Mode2 => 0x02,
            Self::Mode3 => 0x03,
        }
    }
}

/// Electrical configuration requested for a digital line
///
/// Values match the GPIO character device v2 line flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineFlags(u64);

impl LineFlags {
    /// Line is an output
    pub const OUTPUT: Self = Self(1 << 3);
    /// Internal pull-down enabled
    pub const BIAS_PULL_DOWN: Self = Self(1 << 9);

    /// Raw flag bits
    pub fn bits(self) -> u64 {
        self.0
    }
}

impl core::ops::BitOr for LineFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Default serial device node
pub const DEFAULT_SPI_PATH: &str = "/dev/spidev0.0";
/// Default serial clock rate
pub const DEFAULT_SPI_CLOCK_HZ: u32 = 5_000_000;
/// Default GPIO controller device node
pub const DEFAULT_GPIO_CHIP_PATH: &str = "/dev/gpiochip0";
/// Default reset line offset (header pin 13, Broadcom GPIO 27)
pub const DEFAULT_RESET_LINE: u32 = 27;
/// Default data/command select line offset (header pin 15, Broadcom GPIO 22)
pub const DEFAULT_DATA_LINE: u32 = 22;
/// Default consumer label reported to the kernel for claimed lines
pub const DEFAULT_CONSUMER: &str = "inky";

/// Hardware wiring configuration
///
/// Use `Builder` to create a Config. The defaults describe a Raspberry Pi
/// with the panel on its header; they are the deployment constants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Serial device node
    pub spi_path: String,
    /// Serial clock mode
    pub spi_mode: SpiMode,
    /// Maximum serial clock rate in Hz
    pub spi_clock_hz: u32,
    /// GPIO controller device node for both control lines
    pub gpio_chip_path: String,
    /// Offset of the reset line
    pub reset_line: u32,
    /// Offset of the data/command select line
    pub data_line: u32,
    /// Flags requested for both control lines
    pub line_flags: LineFlags,
    /// Consumer label for claimed lines
    pub consumer: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spi_path: String::from(DEFAULT_SPI_PATH),
            spi_mode: SpiMode::Mode0,
            spi_clock_hz: DEFAULT_SPI_CLOCK_HZ,
            gpio_chip_path: String::from(DEFAULT_GPIO_CHIP_PATH),
            reset_line: DEFAULT_RESET_LINE,
            data_line: DEFAULT_DATA_LINE,
            line_flags: LineFlags::OUTPUT | LineFlags::BIAS_PULL_DOWN,
            consumer: String::from(DEFAULT_CONSUMER),
        }
    }
}

/// Builder for constructing hardware configuration
///
/// # Example
///
/// ```
/// use ac073tc1::Builder;
///
/// let config = Builder::new().spi_path("/dev/spidev0.1").build();
/// assert_eq!(config.spi_path, "/dev/spidev0.1");
/// assert_eq!(config.reset_line, 27);
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the serial device node
    pub fn spi_path(mut self, path: &str) -> Self {
        self.config.spi_path = String::from(path);
        self
    }

    /// Set the serial clock mode
    pub fn spi_mode(mut self, mode: SpiMode) -> Self {
        self.config.spi_mode = mode;
        self
    }

    /// Set the maximum serial clock rate
    pub fn spi_clock_hz(mut self, hz: u32) -> Self {
        self.config.spi_clock_hz = hz;
        self
    }

    /// Set the GPIO controller device node
    pub fn gpio_chip_path(mut self, path: &str) -> Self {
        self.config.gpio_chip_path = String::from(path);
        self
    }

    /// Set the reset line offset
    pub fn reset_line(mut self, offset: u32) -> Self {
        self.config.reset_line = offset;
        self
    }

    /// Set the data/command select line offset
    pub fn data_line(mut self, offset: u32) -> Self {
        self.config.data_line = offset;
        self
    }

    /// Set the flags requested for the control lines
    pub fn line_flags(mut self, flags: LineFlags) -> Self {
        self.config.line_flags = flags;
        self
    }

    /// Set the consumer label for claimed lines
    pub fn consumer(mut self, consumer: &str) -> Self {
        self.config.consumer = String::from(consumer);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_dimensions() {
        assert_eq!(Dimensions::PANEL.width, 800);
        assert_eq!(Dimensions::PANEL.height, 480);
        assert_eq!(Dimensions::PANEL.packed_size(), 192_000);
        assert_eq!(Dimensions::default(), Dimensions::PANEL);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            Dimensions::new(0, 480),
            Err(BuilderError::InvalidDimensions { width: 0, .. })
        ));
        assert!(matches!(
            Dimensions::new(800, 0),
            Err(BuilderError::InvalidDimensions { height: 0, .. })
        ));
    }

    #[test]
    fn test_odd_pixel_count_rejected() {
        assert!(Dimensions::new(3, 3).is_err());
        assert!(Dimensions::new(3, 2).is_ok());
    }

    #[test]
    fn test_default_config_matches_deployment() {
        let config = Builder::new().build();
        assert_eq!(config.spi_path, "/dev/spidev0.0");
        assert_eq!(config.spi_mode, SpiMode::Mode0);
        assert_eq!(config.spi_clock_hz, 5_000_000);
        assert_eq!(config.gpio_chip_path, "/dev/gpiochip0");
        assert_eq!(config.reset_line, 27);
        assert_eq!(config.data_line, 22);
        assert_eq!(
            config.line_flags,
            LineFlags::OUTPUT | LineFlags::BIAS_PULL_DOWN
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = Builder::new()
            .gpio_chip_path("/dev/gpiochip4")
            .reset_line(17)
            .data_line(25)
            .spi_clock_hz(1_000_000)
            .spi_mode(SpiMode::Mode3)
            .consumer("frame")
            .build();
        assert_eq!(config.gpio_chip_path, "/dev/gpiochip4");
        assert_eq!(config.reset_line, 17);
        assert_eq!(config.data_line, 25);
        assert_eq!(config.spi_clock_hz, 1_000_000);
        assert_eq!(config.spi_mode.bits(), 0x03);
        assert_eq!(config.consumer, "frame");
    }

    #[test]
    fn test_line_flag_bits_match_uapi() {
        let flags = LineFlags::OUTPUT | LineFlags::BIAS_PULL_DOWN;
        assert_eq!(flags.bits(), (1 << 3) | (1 << 9));
    }
}
