use embedded_graphics::prelude::Point;
use log::error;

use crate::layout::DisplayConfig;
use crate::surface::DisplaySurface;

/// Characters per line of the on-screen error dump.
pub const ERROR_LINE_CHARS: usize = 30;

/// Where a failure report ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSink {
    Screen,
    Console,
}

/// Split `msg` into lines of at most `width` characters, keeping the tail.
pub fn chunk_message(msg: &str, width: usize) -> Vec<&str> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in msg.char_indices() {
        if count == width {
            chunks.push(&msg[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < msg.len() {
        chunks.push(&msg[start..]);
    }
    chunks
}

fn paint<S: DisplaySurface>(
    surface: &mut S,
    config: &DisplayConfig,
    message: &str,
) -> Result<(), S::Error> {
    let palette = &config.palette;
    let font = &config.error_font;
    surface.clear(palette.background)?;
    let line_height = font.line_height() as i32;
    for (i, line) in chunk_message(message, ERROR_LINE_CHARS).iter().enumerate() {
        surface.draw_text(line, Point::new(0, i as i32 * line_height), font, palette.error)?;
    }
    Ok(())
}

/// Show `message` on the screen, or on the console when there is no screen
/// or painting fails.
pub fn report_failure<S: DisplaySurface>(
    surface: Option<&mut S>,
    config: &DisplayConfig,
    message: &str,
) -> ReportSink {
    error!("{}", message);
    let Some(surface) = surface else {
        error!("No display available; error only reported on console");
        return ReportSink::Console;
    };
    match paint(surface, config, message) {
        Ok(()) => ReportSink::Screen,
        Err(e) => {
            error!("While showing an error on the display, drawing failed too");
            error!("Display error: {:?}", e);
            error!("Original error: {}", message);
            ReportSink::Console
        }
    }
}
