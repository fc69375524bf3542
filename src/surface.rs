use core::fmt::Debug;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::error::ClockError;
use crate::layout::FontSpec;

/// Drawing operations the clock needs from a screen.
pub trait DisplaySurface {
    type Error: Debug;

    /// Fill the whole screen with `color`.
    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error>;

    /// One pixel wide outline.
    fn draw_rect(&mut self, rect: Rectangle, color: Rgb565) -> Result<(), Self::Error>;

    /// Draw `text` with its top-left corner at `top_left`.
    fn draw_text(
        &mut self,
        text: &str,
        top_left: Point,
        font: &FontSpec,
        color: Rgb565,
    ) -> Result<(), Self::Error>;
}

/// Map a surface error into the domain error, keeping the driver's message.
pub fn display_err<E: Debug>(op: &str) -> impl FnOnce(E) -> ClockError + '_ {
    move |e| ClockError::display(format!("{} failed: {:?}", op, e))
}

/// Lets a caller lend its surface to the render loop and keep it for the
/// error report afterwards.
impl<S: DisplaySurface + ?Sized> DisplaySurface for &mut S {
    type Error = S::Error;

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        (**self).clear(color)
    }

    fn draw_rect(&mut self, rect: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        (**self).draw_rect(rect, color)
    }

    fn draw_text(
        &mut self,
        text: &str,
        top_left: Point,
        font: &FontSpec,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        (**self).draw_text(text, top_left, font, color)
    }
}

/// Adapts any RGB565 embedded-graphics target into a `DisplaySurface`.
pub struct Screen<D> {
    target: D,
}

impl<D> Screen<D> {
    pub fn new(target: D) -> Self {
        Self { target }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &D {
        &self.target
    }
}

impl<D> DisplaySurface for Screen<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    type Error = D::Error;

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.target.clear(color)
    }

    fn draw_rect(&mut self, rect: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        rect.into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(&mut self.target)
    }

    fn draw_text(
        &mut self,
        text: &str,
        top_left: Point,
        font: &FontSpec,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(font.font, color);
        for pass in 0..font.stroke.max(1) {
            Text::with_baseline(
                text,
                top_left + Point::new(pass as i32, 0),
                style,
                Baseline::Top,
            )
            .draw(&mut self.target)?;
        }
        Ok(())
    }
}
