//! Image preparation
//!
//! Turns a decoded RGB(A) image into the packed four-bit frame the controller
//! expects:
//!
//! 1. [`fit_region`] finds the largest centred region with the source aspect
//!    ratio that fits the canvas.
//! 2. [`resample`] scales the source into that region with bilinear
//!    interpolation. Everything outside the region is white.
//! 3. [`dither`] quantizes the region to the palette with Floyd–Steinberg
//!    error diffusion.
//! 4. [`PreparedFrame::pack`] combines adjacent pixel pairs into bytes, even
//!    pixel in the high nibble.
//!
//! All arithmetic is integer, so the output is identical on every target.
//!
//! ## Example
//!
//! ```
//! use ac073tc1::{prepare, Dimensions, SourceImage};
//!
//! // A 2x1 image: one black pixel, one white pixel
//! let pixels = [0, 0, 0, 255, 255, 255];
//! let source = SourceImage::rgb(2, 1, &pixels).unwrap();
//!
//! let frame = prepare(&source, Dimensions::PANEL);
//! assert_eq!(frame.as_bytes().len(), 800 * 480 / 2);
//!
//! // Top letterbox row is white
//! assert!(frame.as_bytes()[..400].iter().all(|&byte| byte == 0x11));
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::color::{Color, nearest};
use crate::config::Dimensions;
use crate::error::ImageError;

/// Byte layout of source samples
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleLayout {
    /// Three bytes per pixel: red, green, blue
    Rgb8,
    /// Four bytes per pixel: red, green, blue, alpha (straight, not premultiplied)
    Rgba8,
}

impl SampleLayout {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// A decoded source image, borrowed from the codec's buffer
///
/// Samples are row-major with no row padding.
#[derive(Clone, Copy, Debug)]
pub struct SourceImage<'a> {
    width: u32,
    height: u32,
    layout: SampleLayout,
    data: &'a [u8],
}

impl<'a> SourceImage<'a> {
    /// Wrap packed RGB8 samples
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidImage`] if either dimension is zero and
    /// [`ImageError::SampleLength`] if `data` is not exactly `width * height * 3`
    /// bytes.
    pub fn rgb(width: u32, height: u32, data: &'a [u8]) -> Result<Self, ImageError> {
        Self::new(width, height, SampleLayout::Rgb8, data)
    }

    /// Wrap packed RGBA8 samples
    ///
    /// Transparent pixels are composited over white.
    ///
    /// # Errors
    ///
    /// As for [`rgb`](Self::rgb), with four bytes per pixel.
    pub fn rgba(width: u32, height: u32, data: &'a [u8]) -> Result<Self, ImageError> {
        Self::new(width, height, SampleLayout::Rgba8, data)
    }

    /// Wrap samples in the given layout
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidImage`] also covers dimensions whose sample count
    /// does not fit in `usize`.
    pub fn new(
        width: u32,
        height: u32,
        layout: SampleLayout,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidImage { width, height });
        }
        let Some(expected) = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(layout.channels()))
        else {
            return Err(ImageError::InvalidImage { width, height });
        };
        if data.len() != expected {
            return Err(ImageError::SampleLength {
                expected,
                provided: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample layout
    pub fn layout(&self) -> SampleLayout {
        self.layout
    }

    /// Opaque RGB at (x, y), alpha composited over white
    fn pixel(&self, x: usize, y: usize) -> [u32; 3] {
        let channels = self.layout.channels();
        let offset = (y * self.width as usize + x) * channels;
        let sample = &self.data[offset..offset + channels];
        let [r, g, b] = [sample[0], sample[1], sample[2]].map(u32::from);

        match self.layout {
            SampleLayout::Rgb8 => [r, g, b],
            SampleLayout::Rgba8 => {
                let alpha = u32::from(sample[3]);
                let over = |c: u32| (c * alpha + 255 * (255 - alpha) + 127) / 255;
                [over(r), over(g), over(b)]
            }
        }
    }
}

/// Rectangle of the canvas covered by the scaled source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Largest centred region with the source's aspect ratio that fits the canvas
///
/// A source wider than the canvas spans the full width with white bands above
/// and below; otherwise it spans the full height with bands left and right.
/// The short side is truncated to whole pixels and is never less than one.
///
/// ```
/// use ac073tc1::{fit_region, Dimensions, Region};
///
/// let region = fit_region(2, 1, Dimensions::PANEL);
/// assert_eq!(region, Region { x: 0, y: 40, width: 800, height: 400 });
/// ```
pub fn fit_region(source_width: u32, source_height: u32, canvas: Dimensions) -> Region {
    let (sw, sh) = (u64::from(source_width), u64::from(source_height));
    let (cw, ch) = (u64::from(canvas.width), u64::from(canvas.height));

    if sw * ch > cw * sh {
        let height = ((cw * sh / sw) as u32).max(1);
        Region {
            x: 0,
            y: (canvas.height - height) / 2,
            width: canvas.width,
            height,
        }
    } else {
        let width = ((ch * sw / sh) as u32).max(1);
        Region {
            x: (canvas.width - width) / 2,
            y: 0,
            width,
            height: canvas.height,
        }
    }
}

/// Continuous-tone canvas produced by [`resample`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToneCanvas {
    dimensions: Dimensions,
    region: Region,
    samples: Vec<[u8; 3]>,
}

impl ToneCanvas {
    /// Canvas dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Region holding image content
    pub fn region(&self) -> Region {
        self.region
    }

    /// Row-major RGB samples, one per canvas pixel
    pub fn samples(&self) -> &[[u8; 3]] {
        &self.samples
    }
}

/// Tent filter weights for one destination pixel along one axis
#[derive(Clone, Debug)]
struct Kernel {
    first: usize,
    weights: Vec<u64>,
    total: u64,
}

/// Map each destination index onto the source, pixel centre to pixel centre
///
/// The tent spans one source pixel either side when enlarging and one
/// destination pixel either side when shrinking, so every source pixel
/// contributes to a reduced image. Taps falling outside the source are
/// dropped and the rest renormalised.
fn kernels(source: u32, destination: u32) -> Vec<Kernel> {
    let (source, destination) = (i64::from(source), i64::from(destination));
    // Twice the tent radius, in units of 1 / (2 * destination) source pixels
    let reach = 2 * source.max(destination);
    let step = 2 * destination;

    (0..destination)
        .map(|d| {
            // Offset of source pixel i from the mapped centre is (step * i - centre)
            let centre = (2 * d + 1) * source - destination;
            let first = (centre - reach).div_euclid(step).max(0);
            let last = (centre + reach).div_euclid(step).min(source - 1);

            let mut kernel = Kernel {
                first: first as usize,
                weights: Vec::with_capacity((last - first + 1) as usize),
                total: 0,
            };
            for i in first..=last {
                let weight = (reach - (step * i - centre).abs()).max(0) as u64;
                kernel.weights.push(weight);
                kernel.total += weight;
            }
            kernel
        })
        .collect()
}

/// Scale the source into its fitted region of a white canvas
///
/// Bilinear filtering, widened when shrinking, so gradients reach the
/// ditherer intact and fine detail averages rather than aliases. Rows are
/// filtered first into an intermediate with 8 fractional bits, then columns.
pub fn resample(source: &SourceImage<'_>, dimensions: Dimensions) -> ToneCanvas {
    let region = fit_region(source.width, source.height, dimensions);
    let mut samples = vec![Color::White.rgb(); dimensions.pixel_count()];

    let columns = kernels(source.width, region.width);
    let rows = kernels(source.height, region.height);
    let width = region.width as usize;
    let stride = dimensions.width as usize;

    let mut horizontal: Vec<[u64; 3]> = Vec::with_capacity(width * source.height as usize);
    for y in 0..source.height as usize {
        for column in &columns {
            let mut sum = [0u64; 3];
            for (i, &weight) in column.weights.iter().enumerate() {
                let pixel = source.pixel(column.first + i, y);
                for c in 0..3 {
                    sum[c] += weight * u64::from(pixel[c]);
                }
            }
            horizontal.push(sum.map(|v| (v << 8) / column.total));
        }
    }

    for (dy, row) in rows.iter().enumerate() {
        let line = (region.y as usize + dy) * stride + region.x as usize;
        for dx in 0..width {
            let mut sum = [0u64; 3];
            for (j, &weight) in row.weights.iter().enumerate() {
                let value = horizontal[(row.first + j) * width + dx];
                for c in 0..3 {
                    sum[c] += weight * value[c];
                }
            }
            let scale = row.total << 8;
            samples[line + dx] = sum.map(|v| ((v + scale / 2) / scale).min(255) as u8);
        }
    }

    ToneCanvas {
        dimensions,
        region,
        samples,
    }
}

/// Quantize a tone canvas to the palette with Floyd–Steinberg dithering
///
/// Error diffuses 7/16 right, 3/16 down-left, 5/16 down and 1/16 down-right,
/// and is dropped where a neighbour would fall outside the image region. Each
/// sample plus its incoming error is clamped to `0..=255` before quantizing,
/// which keeps the error bounded for colors outside the palette's gamut. The
/// letterbox margin is always white.
pub fn dither(canvas: &ToneCanvas) -> PreparedFrame {
    let dimensions = canvas.dimensions;
    let region = canvas.region;
    let mut frame = PreparedFrame::new(dimensions);

    let width = region.width as usize;
    let height = region.height as usize;
    let stride = dimensions.width as usize;
    let origin = region.y as usize * stride + region.x as usize;

    // Weighted error sums in sixteenths, two rows at a time
    let mut current: Vec<[i32; 3]> = vec![[0; 3]; width];
    let mut next: Vec<[i32; 3]> = vec![[0; 3]; width];

    for y in 0..height {
        let row = origin + y * stride;
        for x in 0..width {
            let sample = canvas.samples[row + x];
            let pending = current[x];
            let value: [i32; 3] =
                core::array::from_fn(|c| (i32::from(sample[c]) + pending[c] / 16).clamp(0, 255));

            let color = nearest(value);
            frame.pixels[row + x] = color;

            let target = color.rgb();
            let error: [i32; 3] = core::array::from_fn(|c| value[c] - i32::from(target[c]));
            if error == [0; 3] {
                continue;
            }

            if x + 1 < width {
                diffuse(&mut current[x + 1], error, 7);
            }
            if y + 1 < height {
                if x > 0 {
                    diffuse(&mut next[x - 1], error, 3);
                }
                diffuse(&mut next[x], error, 5);
                if x + 1 < width {
                    diffuse(&mut next[x + 1], error, 1);
                }
            }
        }
        core::mem::swap(&mut current, &mut next);
        next.fill([0; 3]);
    }

    frame
}

fn diffuse(target: &mut [i32; 3], error: [i32; 3], weight: i32) {
    for (sum, e) in target.iter_mut().zip(error) {
        *sum += e * weight;
    }
}

/// Scale, dither and pack an image in one step
///
/// The result is exactly `dimensions.packed_size()` bytes.
pub fn prepare(source: &SourceImage<'_>, dimensions: Dimensions) -> PackedFrame {
    dither(&resample(source, dimensions)).pack()
}

/// One palette color per canvas pixel, row-major
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedFrame {
    dimensions: Dimensions,
    pixels: Vec<Color>,
}

impl PreparedFrame {
    /// A white frame
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            pixels: vec![Color::White; dimensions.pixel_count()],
        }
    }

    /// Diagonal color bands for checking the wiring without an image
    ///
    /// Bands are keyed on `x - y`, so they run from the top edge towards the
    /// bottom right.
    pub fn demo(dimensions: Dimensions) -> Self {
        const BANDS: [(i64, Color); 5] = [
            (0, Color::White),
            (80, Color::Red),
            (160, Color::Green),
            (240, Color::Blue),
            (320, Color::Yellow),
        ];

        let mut frame = Self::new(dimensions);
        for y in 0..dimensions.height {
            for x in 0..dimensions.width {
                let diagonal = i64::from(x) - i64::from(y);
                let color = BANDS
                    .iter()
                    .find(|(edge, _)| diagonal <= *edge)
                    .map_or(Color::White, |&(_, color)| color);
                frame.set(x, y, color);
            }
        }
        frame
    }

    /// Frame dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Row-major pixels
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Color at (x, y), or `None` outside the frame
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.offset(x, y).map(|offset| self.pixels[offset])
    }

    /// Set the color at (x, y); ignored outside the frame
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if let Some(offset) = self.offset(x, y) {
            self.pixels[offset] = color;
        }
    }

    /// Fill the whole frame with one color
    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Pack two pixels per byte, even pixel in the high nibble
    pub fn pack(&self) -> PackedFrame {
        let bytes = self
            .pixels
            .chunks_exact(2)
            .map(|pair| (pair[0].index() << 4) | pair[1].index())
            .collect();
        PackedFrame {
            dimensions: self.dimensions,
            bytes,
        }
    }

    /// Render at the palette's true colors as packed RGB8
    pub fn to_rgb(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|color| color.rgb()).collect()
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.dimensions.width && y < self.dimensions.height)
            .then(|| y as usize * self.dimensions.width as usize + x as usize)
    }
}

/// Wire-format frame, two palette indices per byte
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedFrame {
    dimensions: Dimensions,
    bytes: Vec<u8>,
}

impl PackedFrame {
    /// Wrap an existing packed buffer
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::SampleLength`] if the buffer is not
    /// `dimensions.packed_size()` bytes, and [`ImageError::InvalidIndex`] if a
    /// nibble is not a palette index.
    pub fn from_bytes(dimensions: Dimensions, bytes: Vec<u8>) -> Result<Self, ImageError> {
        let expected = dimensions.packed_size();
        if bytes.len() != expected {
            return Err(ImageError::SampleLength {
                expected,
                provided: bytes.len(),
            });
        }
        let valid = |byte: u8| {
            Color::from_index(byte >> 4).is_some() && Color::from_index(byte & 0x0F).is_some()
        };
        if let Some((offset, &value)) = bytes.iter().enumerate().find(|&(_, &byte)| !valid(byte)) {
            return Err(ImageError::InvalidIndex { offset, value });
        }
        Ok(Self { dimensions, bytes })
    }

    /// Frame dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Bytes as sent to the controller
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Recover the per-pixel frame
    pub fn unpack(&self) -> PreparedFrame {
        let pixels = self
            .bytes
            .iter()
            .flat_map(|&byte| [byte >> 4, byte & 0x0F])
            .map(|index| Color::from_index(index).unwrap_or_default())
            .collect();
        PreparedFrame {
            dimensions: self.dimensions,
            pixels,
        }
    }
}

impl AsRef<[u8]> for PackedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
