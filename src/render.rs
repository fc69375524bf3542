use core::convert::Infallible;
use std::time::Duration;

use log::{debug, info};

use crate::clock::{ClockSource, ResyncTimer};
use crate::error::ClockError;
use crate::formatter::{date_string, time_string};
use crate::layout::DisplayConfig;
use crate::surface::{display_err, DisplaySurface};

/// One labelled timezone on screen, with what was last drawn for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneSlot {
    pub title: String,
    pub utc_offset_hours: i32,
    pub last_time_text: String,
    pub last_date_text: String,
}

impl TimeZoneSlot {
    pub fn new(title: impl Into<String>, utc_offset_hours: i32) -> Self {
        Self {
            title: title.into(),
            utc_offset_hours,
            last_time_text: String::new(),
            last_date_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Redraw,
}

/// Texts computed for a slot on this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotText {
    pub time: String,
    pub date: String,
}

/// Idle unless at least one slot's time text moved.
pub fn evaluate(slots: &[TimeZoneSlot], texts: &[SlotText]) -> FrameState {
    let changed = slots
        .iter()
        .zip(texts)
        .any(|(slot, text)| slot.last_time_text != text.time);
    if changed {
        FrameState::Redraw
    } else {
        FrameState::Idle
    }
}

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub tick: Duration,
    pub ntp_host: String,
    pub resync_ticks: u32,
}

/// Polls the clock, redraws the blocks whose text changed and keeps the
/// clock in step with NTP.
pub struct RenderLoop<C, S> {
    clock: C,
    surface: S,
    config: DisplayConfig,
    slots: Vec<TimeZoneSlot>,
    resync: ResyncTimer,
    settings: LoopSettings,
}

impl<C, S> RenderLoop<C, S>
where
    C: ClockSource,
    S: DisplaySurface,
{
    pub fn new(
        clock: C,
        surface: S,
        config: DisplayConfig,
        slots: Vec<TimeZoneSlot>,
        settings: LoopSettings,
    ) -> Self {
        let resync = ResyncTimer::new(settings.resync_ticks);
        Self {
            clock,
            surface,
            config,
            slots,
            resync,
            settings,
        }
    }

    fn compute_texts(&self) -> Result<Vec<SlotText>, ClockError> {
        let now = self.clock.now_epoch_seconds();
        self.slots
            .iter()
            .map(|slot| {
                Ok(SlotText {
                    time: time_string(now, slot.utc_offset_hours)?,
                    date: date_string(now, slot.utc_offset_hours)?,
                })
            })
            .collect()
    }

    /// Run one frame: recompute, and redraw every block if anything moved.
    pub fn render_frame(&mut self) -> Result<FrameState, ClockError> {
        let texts = self.compute_texts()?;
        let state = evaluate(&self.slots, &texts);
        if state == FrameState::Idle {
            return Ok(state);
        }

        for (index, (slot, text)) in self.slots.iter_mut().zip(texts).enumerate() {
            debug!("{}: {} {}", slot.title, text.time, text.date);
            draw_slot(&mut self.surface, &self.config, index, slot, &text)?;
            slot.last_time_text = text.time;
            slot.last_date_text = text.date;
        }
        Ok(FrameState::Redraw)
    }

    /// Count a tick and resync when the timer says so. Returns whether a
    /// resync was started.
    pub fn tick_resync(&mut self) -> Result<bool, ClockError> {
        if !self.resync.tick() {
            return Ok(false);
        }
        info!("Synchronizing with NTP ({})", self.settings.ntp_host);
        self.clock.start_sync(&self.settings.ntp_host)?;
        Ok(true)
    }

    /// Loop forever. Only returns on failure.
    pub fn run<F>(&mut self, mut sleep: F) -> Result<Infallible, ClockError>
    where
        F: FnMut(Duration),
    {
        info!(
            "Entering render loop (tick {:?}, resync every {} ticks)",
            self.settings.tick, self.settings.resync_ticks
        );
        loop {
            self.render_frame()?;
            sleep(self.settings.tick);
            self.tick_resync()?;
        }
    }
}

fn draw_slot<S: DisplaySurface>(
    surface: &mut S,
    config: &DisplayConfig,
    index: usize,
    slot: &TimeZoneSlot,
    text: &SlotText,
) -> Result<(), ClockError> {
    let palette = &config.palette;

    surface
        .draw_rect(config.block_rect(index), palette.border)
        .map_err(display_err("block border"))?;

    surface
        .draw_text(
            &slot.title,
            config.title_origin(index, &slot.title),
            &config.title_font,
            palette.title,
        )
        .map_err(display_err("title"))?;

    if !slot.last_date_text.is_empty() && slot.last_date_text != text.date {
        surface
            .draw_text(
                &slot.last_date_text,
                config.date_origin(index, &slot.last_date_text),
                &config.title_font,
                palette.background,
            )
            .map_err(display_err("erase date"))?;
    }
    surface
        .draw_text(
            &text.date,
            config.date_origin(index, &text.date),
            &config.title_font,
            palette.foreground,
        )
        .map_err(display_err("date"))?;

    if !slot.last_time_text.is_empty() {
        surface
            .draw_text(
                &slot.last_time_text,
                config.time_origin(index, &slot.last_time_text),
                &config.time_font,
                palette.background,
            )
            .map_err(display_err("erase time"))?;
    }
    surface
        .draw_text(
            &text.time,
            config.time_origin(index, &text.time),
            &config.time_font,
            palette.time,
        )
        .map_err(display_err("time"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fake::FakeClock;
    use crate::layout::{Orientation, BLACK, WHITE};
    use crate::surface::recording::{Op, RecordingSurface};
    use embedded_graphics::prelude::Point;

    // 2023-12-31T23:58:30Z, a Sunday
    const BEFORE_MIDNIGHT: i64 = 1_704_067_200 - 90;

    fn settings(resync_ticks: u32) -> LoopSettings {
        LoopSettings {
            tick: Duration::from_secs(2),
            ntp_host: "0.pool.ntp.org".to_string(),
            resync_ticks,
        }
    }

    fn make_loop(now: i64) -> RenderLoop<FakeClock, RecordingSurface> {
        RenderLoop::new(
            FakeClock::at(now),
            RecordingSurface::default(),
            DisplayConfig::new(Orientation::Landscape),
            vec![TimeZoneSlot::new("Local", 0), TimeZoneSlot::new("USA", -5)],
            settings(300),
        )
    }

    #[test]
    fn evaluate_detects_any_changed_slot() {
        let mut slots = vec![TimeZoneSlot::new("A", 0), TimeZoneSlot::new("B", 1)];
        slots[0].last_time_text = "1:00".into();
        slots[1].last_time_text = "2:00".into();
        let same = vec![
            SlotText { time: "1:00".into(), date: "Mon 01".into() },
            SlotText { time: "2:00".into(), date: "Mon 01".into() },
        ];
        assert_eq!(evaluate(&slots, &same), FrameState::Idle);

        let second_moved = vec![
            SlotText { time: "1:00".into(), date: "Mon 01".into() },
            SlotText { time: "2:01".into(), date: "Mon 01".into() },
        ];
        assert_eq!(evaluate(&slots, &second_moved), FrameState::Redraw);
    }

    #[test]
    fn date_change_alone_does_not_redraw() {
        let mut slots = vec![TimeZoneSlot::new("A", 0)];
        slots[0].last_time_text = "0:00".into();
        slots[0].last_date_text = "Sun 31".into();
        let texts = vec![SlotText { time: "0:00".into(), date: "Mon 01".into() }];
        assert_eq!(evaluate(&slots, &texts), FrameState::Idle);
    }

    #[test]
    fn first_frame_draws_everything_without_erasing() {
        let mut app = make_loop(BEFORE_MIDNIGHT);
        assert_eq!(app.render_frame().unwrap(), FrameState::Redraw);

        let ops = &app.surface.ops;
        let rects = ops.iter().filter(|op| matches!(op, Op::Rect(..))).count();
        assert_eq!(rects, 2);
        let texts = app.surface.texts();
        assert_eq!(
            texts,
            vec![
                ("Local", WHITE),
                ("Sun 31", WHITE),
                ("23:58", WHITE),
                ("USA", WHITE),
                ("Sun 31", WHITE),
                ("18:58", WHITE),
            ]
        );
        assert_eq!(app.slots[0].last_time_text, "23:58");
        assert_eq!(app.slots[1].last_date_text, "Sun 31");
    }

    #[test]
    fn unchanged_minute_draws_nothing() {
        let mut app = make_loop(BEFORE_MIDNIGHT);
        app.render_frame().unwrap();
        let before = app.surface.ops.len();

        app.clock.now += 20; // still 23:58
        assert_eq!(app.render_frame().unwrap(), FrameState::Idle);
        assert_eq!(app.surface.ops.len(), before);
    }

    #[test]
    fn new_minute_erases_old_time_in_background_first() {
        let mut app = make_loop(BEFORE_MIDNIGHT);
        app.render_frame().unwrap();
        app.surface.ops.clear();

        app.clock.now += 60; // 23:59
        assert_eq!(app.render_frame().unwrap(), FrameState::Redraw);

        let cfg = DisplayConfig::new(Orientation::Landscape);
        let ops = &app.surface.ops;
        let erase = ops
            .iter()
            .position(|op| matches!(op, Op::Text { text, color, .. } if text == "23:58" && *color == BLACK))
            .expect("old time erased");
        let draw = ops
            .iter()
            .position(|op| matches!(op, Op::Text { text, color, .. } if text == "23:59" && *color == WHITE))
            .expect("new time drawn");
        assert!(erase < draw);
        assert_eq!(
            ops[erase],
            Op::Text {
                text: "23:58".into(),
                at: cfg.time_origin(0, "23:58"),
                stroke: 2,
                color: BLACK,
            }
        );
        // Borders come back on every redraw pass.
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::Rect(..))).count(), 2);
    }

    #[test]
    fn midnight_erases_previous_date() {
        let mut app = make_loop(BEFORE_MIDNIGHT);
        app.render_frame().unwrap();
        app.surface.ops.clear();

        app.clock.now += 90; // 0:00 Monday in slot 0
        app.render_frame().unwrap();
        let texts = app.surface.texts();
        assert!(texts.contains(&("Sun 31", BLACK)));
        assert!(texts.contains(&("Mon 01", WHITE)));
        // The second slot is still on Sunday and its date is not erased.
        assert_eq!(app.slots[1].last_date_text, "Sun 31");
        assert_eq!(texts.iter().filter(|(t, c)| *t == "Sun 31" && *c == BLACK).count(), 1);
    }

    #[test]
    fn portrait_stacks_blocks() {
        let mut app = RenderLoop::new(
            FakeClock::at(BEFORE_MIDNIGHT),
            RecordingSurface::default(),
            DisplayConfig::new(Orientation::Portrait),
            vec![TimeZoneSlot::new("Local", 0), TimeZoneSlot::new("USA", -5)],
            settings(300),
        );
        app.render_frame().unwrap();
        let rects: Vec<_> = app
            .surface
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Rect(r, _) => Some(r.top_left),
                _ => None,
            })
            .collect();
        assert_eq!(rects, vec![Point::new(0, 0), Point::new(0, 120)]);
    }

    #[test]
    fn resync_triggers_after_threshold() {
        let mut app = make_loop(BEFORE_MIDNIGHT);
        for _ in 0..300 {
            assert!(!app.tick_resync().unwrap());
        }
        assert!(app.clock.sync_calls.is_empty());
        assert!(app.tick_resync().unwrap());
        assert_eq!(app.clock.sync_calls, vec!["0.pool.ntp.org".to_string()]);
        assert!(!app.tick_resync().unwrap());
    }

    #[test]
    fn resync_failure_propagates() {
        let mut app = RenderLoop::new(
            FakeClock::at(0),
            RecordingSurface::default(),
            DisplayConfig::new(Orientation::Landscape),
            vec![TimeZoneSlot::new("Local", 0)],
            settings(1),
        );
        app.clock.fail_sync = true;
        assert!(!app.tick_resync().unwrap());
        assert!(matches!(app.tick_resync(), Err(ClockError::Connectivity(_))));
    }

    #[test]
    fn draw_failure_becomes_display_error() {
        let mut app = make_loop(BEFORE_MIDNIGHT);
        app.surface.fail_after = Some(3);
        let err = app.render_frame().unwrap_err();
        assert!(matches!(err, ClockError::Display(ref m) if m.contains("spi bus fault")));
    }

    #[test]
    fn bad_offset_is_a_format_error() {
        let mut app = RenderLoop::new(
            FakeClock::at(0),
            RecordingSurface::default(),
            DisplayConfig::new(Orientation::Landscape),
            vec![TimeZoneSlot::new("Nowhere", 99)],
            settings(300),
        );
        assert!(matches!(app.render_frame(), Err(ClockError::Format { .. })));
        assert!(app.surface.ops.is_empty());
    }

    #[test]
    fn run_sleeps_one_tick_per_frame_and_stops_on_error() {
        let mut app = RenderLoop::new(
            FakeClock::at(BEFORE_MIDNIGHT),
            RecordingSurface::default(),
            DisplayConfig::new(Orientation::Landscape),
            vec![TimeZoneSlot::new("Local", 0)],
            settings(2),
        );
        app.clock.fail_sync = true;
        let mut sleeps = Vec::new();
        let err = app.run(|d| sleeps.push(d)).unwrap_err();
        assert!(matches!(err, ClockError::Connectivity(_)));
        assert_eq!(sleeps, vec![Duration::from_secs(2); 3]);
        assert_eq!(app.slots[0].last_time_text, "23:58");
    }
}
