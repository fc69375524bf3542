use std::thread;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::error::ClockError;
use crate::retry::{retry_until, RetryPolicy};

/// Bring up station mode and block until the interface has an address.
///
/// The returned driver must stay alive for the connection to persist.
pub fn connect_wifi(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: Option<EspDefaultNvsPartition>,
    ssid: &str,
    password: &str,
    policy: &RetryPolicy,
) -> Result<Box<EspWifi<'static>>> {
    if ssid.is_empty() {
        return Err(ClockError::config("WIFI_SSID is not set").into());
    }

    let mut wifi_ssid = heapless::String::<32>::new();
    let mut wifi_pass = heapless::String::<64>::new();
    wifi_ssid
        .push_str(ssid)
        .map_err(|_| ClockError::config("WIFI_SSID is longer than 32 bytes"))?;
    wifi_pass
        .push_str(password)
        .map_err(|_| ClockError::config("WIFI_PASS is longer than 64 bytes"))?;

    let auth = if password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
    esp_wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: wifi_ssid,
        password: wifi_pass,
        auth_method: auth,
        ..Default::default()
    }))?;

    let mut blocking_wifi = BlockingWifi::wrap(&mut esp_wifi, sysloop)?;
    blocking_wifi.start()?;
    info!("WiFi connecting to '{}'...", ssid);

    let attempts = retry_until(policy, "WiFi connect", thread::sleep, |attempt| {
        match blocking_wifi.connect() {
            Ok(()) => true,
            Err(e) => {
                warn!("WiFi connect attempt {} failed: {}", attempt, e);
                // Full stop/start cycle to reset radio state
                let _ = blocking_wifi.disconnect();
                blocking_wifi.stop().ok();
                thread::sleep(Duration::from_millis(500));
                blocking_wifi.start().ok();
                false
            }
        }
    })?;
    info!("WiFi associated after {} attempt(s), waiting for IP address...", attempts);

    blocking_wifi.wait_netif_up()?;
    let ip_info = blocking_wifi.wifi().sta_netif().get_ip_info()?;
    info!("WiFi connected, IP: {}", ip_info.ip);
    info!("  netmask: {:?}", ip_info.subnet.mask);
    info!("  gateway: {:?}", ip_info.subnet.gateway);
    info!("  dns: {:?}", ip_info.dns);

    drop(blocking_wifi);
    Ok(Box::new(esp_wifi))
}
