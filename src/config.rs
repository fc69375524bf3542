use std::time::Duration;

use log::info;

use crate::clock::{DEFAULT_NTP_HOST, DEFAULT_RESYNC_TICKS};
use crate::error::ClockError;
use crate::formatter::MAX_OFFSET_HOURS;
use crate::layout::Orientation;
use crate::render::{LoopSettings, TimeZoneSlot};
use crate::retry::RetryPolicy;

const KEY_WIFI_SSID: &str = "WIFI_SSID";
const KEY_WIFI_PASS: &str = "WIFI_PASS";
const KEY_NTP_HOST: &str = "NTP_HOST";
const KEY_LEFT_TITLE: &str = "LEFT_TITLE";
const KEY_LEFT_OFFSET: &str = "LEFT_UTC_OFFSET_HOURS";
const KEY_RIGHT_TITLE: &str = "RIGHT_TITLE";
const KEY_RIGHT_OFFSET: &str = "RIGHT_UTC_OFFSET_HOURS";
const KEY_ORIENTATION: &str = "ORIENTATION";
const KEY_TICK_SECS: &str = "TICK_SECS";
const KEY_RESYNC_TICKS: &str = "RESYNC_TICKS";
const KEY_WIFI_MAX_ATTEMPTS: &str = "WIFI_MAX_ATTEMPTS";
const KEY_NTP_MAX_ATTEMPTS: &str = "NTP_MAX_ATTEMPTS";

const DEFAULT_LEFT_TITLE: &str = "Local";
const DEFAULT_LEFT_OFFSET: i32 = 0;
const DEFAULT_RIGHT_TITLE: &str = "USA";
const DEFAULT_RIGHT_OFFSET: i32 = -5;
const DEFAULT_TICK_SECS: u32 = 2;

const WIFI_RETRY_INTERVAL: Duration = Duration::from_millis(100);
const NTP_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConfig {
    pub title: String,
    pub utc_offset_hours: i32,
}

impl SlotConfig {
    pub fn to_slot(&self) -> TimeZoneSlot {
        TimeZoneSlot::new(self.title.clone(), self.utc_offset_hours)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub ntp_host: String,
    pub slots: [SlotConfig; 2],
    pub orientation: Orientation,
    pub tick: Duration,
    pub resync_ticks: u32,
    pub wifi_retry: RetryPolicy,
    pub ntp_retry: RetryPolicy,
}

/// Non-empty value for `key`, if any.
fn non_empty<'a, F>(lookup: &F, key: &str) -> Option<&'a str>
where
    F: Fn(&str) -> Option<&'a str>,
{
    lookup(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_int<'a, F>(lookup: &F, key: &str, default: i64) -> Result<i64, ClockError>
where
    F: Fn(&str) -> Option<&'a str>,
{
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ClockError::config(format!("{} is not an integer: {:?}", key, raw))),
    }
}

fn parse_offset<'a, F>(lookup: &F, key: &str, default: i32) -> Result<i32, ClockError>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let v = parse_int(lookup, key, default as i64)?;
    let out_of_range = || {
        ClockError::config(format!(
            "{} = {} is outside ±{} hours",
            key, v, MAX_OFFSET_HOURS
        ))
    };
    if v.unsigned_abs() > MAX_OFFSET_HOURS as u64 {
        return Err(out_of_range());
    }
    i32::try_from(v).map_err(|_| out_of_range())
}

fn parse_count<'a, F>(lookup: &F, key: &str, default: u32, min: u32) -> Result<u32, ClockError>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let v = parse_int(lookup, key, default as i64)?;
    u32::try_from(v)
        .ok()
        .filter(|v| *v >= min)
        .ok_or_else(|| ClockError::config(format!("{} = {} must be at least {}", key, v, min)))
}

impl Config {
    /// Parse and validate settings from any key source. Missing or blank
    /// keys fall back to defaults.
    pub fn from_lookup<'a, F>(lookup: F) -> Result<Config, ClockError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let wifi_ssid = non_empty(&lookup, KEY_WIFI_SSID).unwrap_or("").to_string();
        let wifi_pass = lookup(KEY_WIFI_PASS).unwrap_or("").to_string();
        let ntp_host = non_empty(&lookup, KEY_NTP_HOST)
            .unwrap_or(DEFAULT_NTP_HOST)
            .to_string();

        let left = SlotConfig {
            title: non_empty(&lookup, KEY_LEFT_TITLE)
                .unwrap_or(DEFAULT_LEFT_TITLE)
                .to_string(),
            utc_offset_hours: parse_offset(&lookup, KEY_LEFT_OFFSET, DEFAULT_LEFT_OFFSET)?,
        };
        let right = SlotConfig {
            title: non_empty(&lookup, KEY_RIGHT_TITLE)
                .unwrap_or(DEFAULT_RIGHT_TITLE)
                .to_string(),
            utc_offset_hours: parse_offset(&lookup, KEY_RIGHT_OFFSET, DEFAULT_RIGHT_OFFSET)?,
        };

        let orientation = match non_empty(&lookup, KEY_ORIENTATION) {
            None => Orientation::Landscape,
            Some(raw) => Orientation::parse(raw).ok_or_else(|| {
                ClockError::config(format!("{} must be landscape or portrait, got {:?}", KEY_ORIENTATION, raw))
            })?,
        };

        let tick_secs = parse_count(&lookup, KEY_TICK_SECS, DEFAULT_TICK_SECS, 1)?;
        let resync_ticks = parse_count(&lookup, KEY_RESYNC_TICKS, DEFAULT_RESYNC_TICKS, 1)?;
        let wifi_attempts = parse_count(&lookup, KEY_WIFI_MAX_ATTEMPTS, 0, 0)?;
        let ntp_attempts = parse_count(&lookup, KEY_NTP_MAX_ATTEMPTS, 0, 0)?;

        Ok(Config {
            wifi_ssid,
            wifi_pass,
            ntp_host,
            slots: [left, right],
            orientation,
            tick: Duration::from_secs(tick_secs as u64),
            resync_ticks,
            wifi_retry: RetryPolicy::from_limit(WIFI_RETRY_INTERVAL, wifi_attempts),
            ntp_retry: RetryPolicy::from_limit(NTP_POLL_INTERVAL, ntp_attempts),
        })
    }

    /// Settings baked in by build.rs from `clock.local.rs`.
    pub fn from_build_env() -> Result<Config, ClockError> {
        Config::from_lookup(|key| match key {
            KEY_WIFI_SSID => option_env!("LOCAL_WIFI_SSID"),
            KEY_WIFI_PASS => option_env!("LOCAL_WIFI_PASS"),
            KEY_NTP_HOST => option_env!("LOCAL_NTP_HOST"),
            KEY_LEFT_TITLE => option_env!("LOCAL_LEFT_TITLE"),
            KEY_LEFT_OFFSET => option_env!("LOCAL_LEFT_UTC_OFFSET_HOURS"),
            KEY_RIGHT_TITLE => option_env!("LOCAL_RIGHT_TITLE"),
            KEY_RIGHT_OFFSET => option_env!("LOCAL_RIGHT_UTC_OFFSET_HOURS"),
            KEY_ORIENTATION => option_env!("LOCAL_ORIENTATION"),
            KEY_TICK_SECS => option_env!("LOCAL_TICK_SECS"),
            KEY_RESYNC_TICKS => option_env!("LOCAL_RESYNC_TICKS"),
            KEY_WIFI_MAX_ATTEMPTS => option_env!("LOCAL_WIFI_MAX_ATTEMPTS"),
            KEY_NTP_MAX_ATTEMPTS => option_env!("LOCAL_NTP_MAX_ATTEMPTS"),
            _ => None,
        })
    }

    pub fn log_summary(&self) {
        info!("config wifi_ssid = {:?}", self.wifi_ssid);
        info!("config wifi_pass = <{} chars>", self.wifi_pass.len());
        info!("config ntp_host = {:?}", self.ntp_host);
        for (i, slot) in self.slots.iter().enumerate() {
            info!(
                "config slot {} = {:?} (UTC{:+})",
                i, slot.title, slot.utc_offset_hours
            );
        }
        info!("config orientation = {}", self.orientation.as_str());
        info!(
            "config tick = {:?}, resync every {} ticks",
            self.tick, self.resync_ticks
        );
        info!(
            "config wifi attempts = {:?}, ntp polls = {:?}",
            self.wifi_retry.max_attempts, self.ntp_retry.max_attempts
        );
    }

    pub fn time_zone_slots(&self) -> Vec<TimeZoneSlot> {
        self.slots.iter().map(SlotConfig::to_slot).collect()
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            tick: self.tick,
            ntp_host: self.ntp_host.clone(),
            resync_ticks: self.resync_ticks,
        }
    }
}
