//! Color types for seven-color e-paper displays
//!
//! This module defines the [`Color`] enum for the seven pigments supported by
//! the AC073TC1 panel, the RGB [`PALETTE`] used to quantize images onto them,
//! and the nearest-color lookup used by the ditherer.
//!
//! ## Color Representation
//!
//! The controller stores one 4-bit palette index per pixel. Two pixels share a
//! byte on the wire, the even pixel in the high nibble:
//!
//! | Color  | Index | RGB             |
//! |--------|-------|-----------------|
//! | Black  | 0     | (0, 0, 0)       |
//! | White  | 1     | (217, 242, 255) |
//! | Green  | 2     | (3, 124, 76)    |
//! | Blue   | 3     | (27, 46, 198)   |
//! | Red    | 4     | (245, 80, 34)   |
//! | Yellow | 5     | (255, 255, 68)  |
//! | Orange | 6     | (239, 121, 44)  |
//!
//! The RGB values are what the pigments actually look like on the panel, not
//! the idealised primaries. Dithering against them keeps gradients honest.
//!
//! ## Example
//!
//! ```
//! use ac073tc1::Color;
//!
//! assert_eq!(Color::White.index(), 1);
//! assert_eq!(Color::White.packed_byte(), 0x11);
//! assert_eq!(Color::from_index(6), Some(Color::Orange));
//! assert_eq!(Color::from_index(7), None);
//! ```

/// Number of displayable colors
pub const PALETTE_SIZE: usize = 7;

/// RGB appearance of each palette index, in index order
pub const PALETTE: [[u8; 3]; PALETTE_SIZE] = [
    [0, 0, 0],
    [217, 242, 255],
    [3, 124, 76],
    [27, 46, 198],
    [245, 80, 34],
    [255, 255, 68],
    [239, 121, 44],
];

/// Colors supported by the AC073TC1 (seven-color displays)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
#[repr(u8)]
pub enum Color {
    /// Black pigment
    Black = 0,
    /// White pigment (also the letterbox background)
    #[default]
    White = 1,
    /// Green pigment
    Green = 2,
    /// Blue pigment
    Blue = 3,
    /// Red pigment
    Red = 4,
    /// Yellow pigment
    Yellow = 5,
    /// Orange pigment
    Orange = 6,
}

#[cfg(feature = "graphics")]
impl embedded_graphics_core::prelude::PixelColor for Color {
    type Raw = embedded_graphics_core::pixelcolor::raw::RawU4;
}

impl Color {
    /// All colors in palette index order
    pub const ALL: [Self; PALETTE_SIZE] = [
        Self::Black,
        Self::White,
        Self::Green,
        Self::Blue,
        Self::Red,
        Self::Yellow,
        Self::Orange,
    ];

    /// Palette index sent to the controller
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Look up a color by palette index
    ///
    /// Returns `None` for anything outside `0..=6`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// RGB appearance of this color on the panel
    ///
    /// ```
    /// use ac073tc1::Color;
    ///
    /// assert_eq!(Color::Black.rgb(), [0, 0, 0]);
    /// assert_eq!(Color::Yellow.rgb(), [255, 255, 68]);
    /// ```
    pub fn rgb(self) -> [u8; 3] {
        PALETTE[self as usize]
    }

    /// Byte value of two adjacent pixels of this color
    ///
    /// Useful for filling whole rows of a packed frame.
    pub fn packed_byte(self) -> u8 {
        (self.index() << 4) | self.index()
    }
}

/// Find the palette entry closest to an RGB sample
///
/// Distance is squared Euclidean distance over the three 8-bit channels.
/// Samples may lie outside `0..=255` while error diffusion is in progress.
/// Ties resolve to the lowest palette index, which keeps the result
/// deterministic.
pub fn nearest(rgb: [i32; 3]) -> Color {
    let mut best = Color::Black;
    let mut best_distance = i64::MAX;
    for color in Color::ALL {
        let entry = color.rgb();
        let distance: i64 = rgb
            .iter()
            .zip(entry.iter())
            .map(|(&sample, &reference)| {
                let delta = i64::from(sample) - i64::from(reference);
                delta * delta
            })
            .sum();
        if distance < best_distance {
            best = color;
            best_distance = distance;
        }
    }
    best
}
