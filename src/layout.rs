use embedded_graphics::mono_font::ascii::FONT_4X6;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use profont::{PROFONT_10_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

/// Convert 8-bit RGB to Rgb565.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// ── Palette ─────────────────────────────────────────────────────────

pub const BLACK: Rgb565 = rgb(0, 0, 0);
pub const WHITE: Rgb565 = rgb(255, 255, 255);
pub const RED: Rgb565 = rgb(255, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb565,
    pub foreground: Rgb565,
    pub border: Rgb565,
    pub title: Rgb565,
    pub time: Rgb565,
    pub error: Rgb565,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: BLACK,
            foreground: WHITE,
            border: WHITE,
            title: WHITE,
            time: WHITE,
            error: RED,
        }
    }
}

// ── Geometry ────────────────────────────────────────────────────────

/// Logical resolution the layout is designed for (landscape).
pub const LOGICAL_WIDTH: u32 = 240;
pub const LOGICAL_HEIGHT: u32 = 135;

/// Horizontal passes used to thicken the time digits.
pub const TIME_STROKE_WIDTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "landscape" => Some(Orientation::Landscape),
            "portrait" => Some(Orientation::Portrait),
            _ => None,
        }
    }

    pub fn is_landscape(self) -> bool {
        self == Orientation::Landscape
    }
}

pub fn screen_size(orientation: Orientation) -> (u32, u32) {
    if orientation.is_landscape() {
        (LOGICAL_WIDTH, LOGICAL_HEIGHT)
    } else {
        (LOGICAL_HEIGHT, LOGICAL_WIDTH)
    }
}

/// Font plus the number of horizontal passes used to draw it.
#[derive(Clone, Copy)]
pub struct FontSpec {
    pub font: &'static MonoFont<'static>,
    pub stroke: u32,
}

impl FontSpec {
    pub const fn new(font: &'static MonoFont<'static>) -> Self {
        Self { font, stroke: 1 }
    }

    pub const fn with_stroke(font: &'static MonoFont<'static>, stroke: u32) -> Self {
        Self { font, stroke }
    }

    pub fn line_height(&self) -> u32 {
        self.font.character_size.height
    }

    /// Pixel width of `text` when drawn with this font.
    pub fn text_width(&self, text: &str) -> u32 {
        let n = text.chars().count() as u32;
        if n == 0 {
            return 0;
        }
        let size = self.font.character_size.width;
        let spacing = self.font.character_spacing;
        n * size + (n - 1) * spacing + self.stroke.saturating_sub(1)
    }
}

impl core::fmt::Debug for FontSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FontSpec")
            .field("character_size", &self.font.character_size)
            .field("stroke", &self.stroke)
            .finish()
    }
}

/// Screen geometry, fonts and colors. Built once at startup.
#[derive(Debug, Clone, Copy)]
pub struct DisplayConfig {
    pub orientation: Orientation,
    pub block_width: u32,
    pub block_height: u32,
    pub title_font: FontSpec,
    pub time_font: FontSpec,
    pub error_font: FontSpec,
    pub palette: Palette,
}

impl DisplayConfig {
    pub fn new(orientation: Orientation) -> Self {
        let (block_width, block_height) = match orientation {
            Orientation::Landscape => (LOGICAL_WIDTH / 2, LOGICAL_HEIGHT),
            Orientation::Portrait => (LOGICAL_HEIGHT, LOGICAL_WIDTH / 2),
        };
        // A full error line has to fit the narrow portrait width too.
        let error_font = match orientation {
            Orientation::Landscape => FontSpec::new(&PROFONT_10_POINT),
            Orientation::Portrait => FontSpec::new(&FONT_4X6),
        };
        Self {
            orientation,
            block_width,
            block_height,
            title_font: FontSpec::new(&PROFONT_18_POINT),
            time_font: FontSpec::with_stroke(&PROFONT_24_POINT, TIME_STROKE_WIDTH),
            error_font,
            palette: Palette::default(),
        }
    }

    /// Top-left corner of block `index`: side by side in landscape,
    /// stacked in portrait.
    pub fn block_origin(&self, index: usize) -> Point {
        let i = index as i32;
        match self.orientation {
            Orientation::Landscape => Point::new(i * self.block_width as i32, 0),
            Orientation::Portrait => Point::new(0, i * self.block_height as i32),
        }
    }

    pub fn block_rect(&self, index: usize) -> Rectangle {
        Rectangle::new(
            self.block_origin(index),
            Size::new(self.block_width, self.block_height),
        )
    }

    /// Top-left position that centers `text` horizontally in the block and
    /// vertically on the given fraction of the block height.
    pub fn centered_text_origin(
        &self,
        index: usize,
        font: &FontSpec,
        text: &str,
        numerator: i32,
        denominator: i32,
    ) -> Point {
        let origin = self.block_origin(index);
        let x = origin.x + self.block_width as i32 / 2 - font.text_width(text) as i32 / 2;
        let center_y = origin.y + self.block_height as i32 * numerator / denominator;
        let y = center_y - font.line_height() as i32 / 2;
        Point::new(x, y)
    }

    pub fn title_origin(&self, index: usize, text: &str) -> Point {
        self.centered_text_origin(index, &self.title_font, text, 1, 5)
    }

    pub fn time_origin(&self, index: usize, text: &str) -> Point {
        self.centered_text_origin(index, &self.time_font, text, 1, 2)
    }

    pub fn date_origin(&self, index: usize, text: &str) -> Point {
        self.centered_text_origin(index, &self.title_font, text, 4, 5)
    }
}
