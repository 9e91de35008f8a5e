//! Graphics support via embedded-graphics
//!
//! [`PreparedFrame`] implements the
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) trait, so
//! text or overlays can be drawn onto a dithered frame before it is packed.
//! [`Color`] converts to and from [`Rgb888`] using the panel's pigment colors.
//!
//! ## Example
//!
//! ```rust
//! use embedded_graphics::{
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//! };
//! use ac073tc1::{Color, Dimensions, PreparedFrame};
//!
//! let mut frame = PreparedFrame::demo(Dimensions::PANEL);
//!
//! // Black border around the test pattern
//! let _ = Rectangle::new(Point::zero(), Size::new(800, 480))
//!     .into_styled(PrimitiveStyle::with_stroke(Color::Black, 4))
//!     .draw(&mut frame);
//!
//! let packed = frame.pack();
//! assert_eq!(packed.as_bytes()[0], 0x00);
//! ```

use core::convert::Infallible;

use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{Rgb888, RgbColor},
    prelude::*,
    primitives::Rectangle,
};

use crate::color::{Color, nearest};
use crate::prepare::PreparedFrame;

impl From<Color> for Rgb888 {
    fn from(color: Color) -> Self {
        let [r, g, b] = color.rgb();
        Rgb888::new(r, g, b)
    }
}

impl From<Rgb888> for Color {
    /// Closest pigment to an RGB color
    fn from(rgb: Rgb888) -> Self {
        nearest([rgb.r(), rgb.g(), rgb.b()].map(i32::from))
    }
}

impl DrawTarget for PreparedFrame {
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }
            // Out-of-range coordinates are ignored by set()
            self.set(x as u32, y as u32, color);
        }

        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set(x as u32, y as u32, color);
            }
        }

        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

impl OriginDimensions for PreparedFrame {
    fn size(&self) -> Size {
        let dims = self.dimensions();
        Size::new(dims.width, dims.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dimensions;
    use embedded_graphics::primitives::{Line, Primitive, PrimitiveStyle};

    fn small_frame() -> PreparedFrame {
        PreparedFrame::new(Dimensions::new(8, 4).unwrap())
    }

    #[test]
    fn test_size_matches_dimensions() {
        let frame = PreparedFrame::new(Dimensions::PANEL);
        assert_eq!(frame.size(), Size::new(800, 480));
    }

    #[test]
    fn test_out_of_bounds_pixels_ignored() {
        let mut frame = small_frame();
        let pixels = [
            Pixel(Point::new(-1, 0), Color::Black),
            Pixel(Point::new(0, -1), Color::Black),
            Pixel(Point::new(8, 0), Color::Black),
            Pixel(Point::new(0, 4), Color::Black),
            Pixel(Point::new(7, 3), Color::Red),
        ];
        frame.draw_iter(pixels).unwrap();

        assert_eq!(frame.get(7, 3), Some(Color::Red));
        let others = frame.pixels().iter().filter(|&&c| c != Color::White).count();
        assert_eq!(others, 1);
    }

    #[test]
    fn test_fill_solid_clips_to_frame() {
        let mut frame = small_frame();
        let area = Rectangle::new(Point::new(6, 2), Size::new(10, 10));
        frame.fill_solid(&area, Color::Green).unwrap();

        assert_eq!(frame.get(6, 2), Some(Color::Green));
        assert_eq!(frame.get(7, 3), Some(Color::Green));
        assert_eq!(frame.get(5, 2), Some(Color::White));
        assert_eq!(frame.get(6, 1), Some(Color::White));
    }

    #[test]
    fn test_drawn_line_survives_packing() {
        let mut frame = small_frame();
        Line::new(Point::new(0, 0), Point::new(7, 0))
            .into_styled(PrimitiveStyle::with_stroke(Color::Orange, 1))
            .draw(&mut frame)
            .unwrap();

        let packed = frame.pack();
        assert_eq!(&packed.as_bytes()[..4], [0x66; 4]);
        assert_eq!(&packed.as_bytes()[4..], [0x11; 12]);
    }

    #[test]
    fn test_clear() {
        let mut frame = small_frame();
        frame.clear(Color::Blue).unwrap();
        assert!(frame.pixels().iter().all(|&c| c == Color::Blue));
    }

    #[test]
    fn test_rgb888_conversions() {
        assert_eq!(Rgb888::from(Color::Red), Rgb888::new(245, 80, 34));
        assert_eq!(Color::from(Rgb888::WHITE), Color::White);
        assert_eq!(Color::from(Rgb888::BLACK), Color::Black);
        assert_eq!(Color::from(Rgb888::new(250, 250, 60)), Color::Yellow);
    }
}
