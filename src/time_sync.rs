use esp_idf_svc::sntp::{EspSntp, OperatingMode, SntpConf, SyncMode, SyncStatus};
use log::info;

use crate::clock::ClockSource;
use crate::error::ClockError;

/// System clock disciplined by the ESP-IDF SNTP client.
///
/// Only one SNTP service can exist at a time, so each sync request drops the
/// running client before starting a new one.
#[derive(Default)]
pub struct SntpClock {
    sntp: Option<EspSntp<'static>>,
}

impl SntpClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClockSource for SntpClock {
    fn now_epoch_seconds(&self) -> i64 {
        let mut now: libc::time_t = 0;
        unsafe {
            libc::time(&mut now);
        }
        now as i64
    }

    fn start_sync(&mut self, server: &str) -> Result<(), ClockError> {
        self.sntp = None;

        let mut conf = SntpConf::default();
        for slot in conf.servers.iter_mut() {
            *slot = server;
        }
        conf.sync_mode = SyncMode::Immediate;
        conf.operating_mode = OperatingMode::Poll;

        info!("Starting SNTP sync with {}", server);
        let sntp = EspSntp::new_with_callback(&conf, |_| {
            info!("SNTP sync callback triggered");
        })
        .map_err(|e| ClockError::connectivity(format!("SNTP start failed: {}", e)))?;
        self.sntp = Some(sntp);
        Ok(())
    }

    fn is_synced(&self) -> bool {
        self.sntp
            .as_ref()
            .is_some_and(|s| s.get_sync_status() == SyncStatus::Completed)
    }
}
