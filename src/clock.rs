use std::time::Duration;

use log::info;

use crate::error::ClockError;
use crate::retry::{retry_until, RetryPolicy};

/// Default NTP server when none is configured.
pub const DEFAULT_NTP_HOST: &str = "0.pool.ntp.org";

/// Ticks between forced NTP resyncs (~10 minutes at a 2 s tick).
pub const DEFAULT_RESYNC_TICKS: u32 = 300;

/// Something that knows the current time and can be corrected over NTP.
pub trait ClockSource {
    /// Seconds since the Unix epoch, UTC.
    fn now_epoch_seconds(&self) -> i64;

    /// Kick off (or restart) synchronisation against `server`.
    fn start_sync(&mut self, server: &str) -> Result<(), ClockError>;

    fn is_synced(&self) -> bool;
}

/// Start a sync and block until the clock reports it is synchronised.
pub fn sync_blocking<C, S>(
    clock: &mut C,
    server: &str,
    policy: &RetryPolicy,
    sleep: S,
) -> Result<(), ClockError>
where
    C: ClockSource + ?Sized,
    S: FnMut(Duration),
{
    info!("Starting NTP sync with {}", server);
    clock.start_sync(server)?;
    let attempts = retry_until(policy, "NTP sync", sleep, |_| clock.is_synced())?;
    info!("NTP synchronised with {} after {} polls", server, attempts);
    Ok(())
}

/// Counts loop ticks and says when it is time to resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResyncTimer {
    ticks: u32,
    threshold: u32,
}

impl ResyncTimer {
    pub const fn new(threshold: u32) -> Self {
        Self {
            ticks: 0,
            threshold,
        }
    }

    /// Count one tick. Returns true, and starts over from zero, once the
    /// count goes past the threshold.
    pub fn tick(&mut self) -> bool {
        self.ticks = self.ticks.saturating_add(1);
        if self.ticks > self.threshold {
            self.ticks = 0;
            true
        } else {
            false
        }
    }
}
