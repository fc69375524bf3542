// Copy to clock.local.rs (not tracked) and fill in. build.rs reads these at
// compile time; anything left out falls back to the firmware defaults.

pub const WIFI_SSID: &str = "my-network";
pub const WIFI_PASS: &str = "my-password";
pub const NTP_HOST: &str = "0.pool.ntp.org";

pub const LEFT_TITLE: &str = "Local";
pub const LEFT_UTC_OFFSET_HOURS: i32 = 10;
pub const RIGHT_TITLE: &str = "USA";
pub const RIGHT_UTC_OFFSET_HOURS: i32 = -5;

// "landscape" or "portrait"
pub const ORIENTATION: &str = "landscape";

pub const TICK_SECS: u32 = 2;
pub const RESYNC_TICKS: u32 = 300;

// 0 keeps retrying forever
pub const WIFI_MAX_ATTEMPTS: u32 = 0;
pub const NTP_MAX_ATTEMPTS: u32 = 0;
