#![cfg_attr(not(target_os = "espidf"), allow(dead_code))]

mod clock;
mod config;
mod error;
mod error_report;
mod formatter;
mod layout;
mod render;
mod retry;
mod surface;

#[cfg(target_os = "espidf")]
mod display;
#[cfg(target_os = "espidf")]
mod time_sync;
#[cfg(target_os = "espidf")]
mod wifi;

#[cfg(target_os = "espidf")]
mod firmware {
    use std::convert::Infallible;
    use std::thread;

    use anyhow::Result;
    use esp_idf_hal::gpio::OutputPin;
    use esp_idf_hal::modem::Modem;
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::info;

    use crate::clock::{sync_blocking, ClockSource};
    use crate::config::Config;
    use crate::display::{self, Panel, PanelPins};
    use crate::error_report::report_failure;
    use crate::formatter::time_string;
    use crate::layout::{DisplayConfig, Orientation};
    use crate::render::RenderLoop;
    use crate::surface::{display_err, DisplaySurface, Screen};
    use crate::time_sync::SntpClock;
    use crate::wifi;

    /// Connect, sync, then hand the screen to the render loop. Only returns
    /// on failure.
    fn run_clock(
        cfg: Config,
        display_config: DisplayConfig,
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        screen: &mut Screen<Panel>,
    ) -> Result<Infallible> {
        cfg.log_summary();

        // ── 3. WiFi ──
        let _wifi = wifi::connect_wifi(
            modem,
            sysloop,
            Some(nvs),
            &cfg.wifi_ssid,
            &cfg.wifi_pass,
            &cfg.wifi_retry,
        )?;

        // ── 4. NTP ──
        let mut clock = SntpClock::new();
        sync_blocking(&mut clock, &cfg.ntp_host, &cfg.ntp_retry, thread::sleep)?;
        let first = &cfg.slots[0];
        info!(
            "Time synced, is currently {} in {}",
            time_string(clock.now_epoch_seconds(), first.utc_offset_hours)?,
            first.title
        );

        // ── 5. Render loop ──
        screen
            .clear(display_config.palette.background)
            .map_err(display_err("clear"))?;
        let mut app = RenderLoop::new(
            clock,
            screen,
            display_config,
            cfg.time_zone_slots(),
            cfg.loop_settings(),
        );
        Ok(app.run(thread::sleep)?)
    }

    pub fn main() -> Result<()> {
        esp_idf_sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();

        info!("BOOT — dual-tz-clock v{}", env!("CARGO_PKG_VERSION"));

        // ── 1. Peripherals + config ──
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        let cfg = Config::from_build_env();
        let orientation = cfg
            .as_ref()
            .map(|c| c.orientation)
            .unwrap_or(Orientation::Landscape);
        let display_config = DisplayConfig::new(orientation);

        // ── 2. Display ──
        let pins = PanelPins {
            spi: peripherals.spi2,
            sclk: peripherals.pins.gpio18,
            mosi: peripherals.pins.gpio19,
            cs: peripherals.pins.gpio5,
            dc: peripherals.pins.gpio16.downgrade_output(),
            rst: peripherals.pins.gpio23.downgrade_output(),
        };
        let mut screen = match display::init_display(pins, orientation) {
            Ok(screen) => screen,
            Err(e) => {
                report_failure::<Screen<Panel>>(None, &display_config, &format!("{:#}", e));
                return Err(e);
            }
        };

        let outcome = match cfg {
            Ok(cfg) => run_clock(
                cfg,
                display_config,
                peripherals.modem,
                sysloop,
                nvs,
                &mut screen,
            ),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(never) => match never {},
            Err(e) => {
                report_failure(Some(&mut screen), &display_config, &format!("{:#}", e));
                Err(e)
            }
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::main()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "dual-tz-clock v{} drives an ESP32 panel; build it for an ESP-IDF target",
        env!("CARGO_PKG_VERSION")
    );
}
