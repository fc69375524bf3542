use anyhow::{anyhow, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiAnyPins, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use log::info;
use mipidsi::interface::SpiInterface;
use mipidsi::models::ST7789;
use mipidsi::options::{ColorInversion, Orientation as PanelOrientation, Rotation};
use mipidsi::Builder;

use crate::layout::{screen_size, Orientation};
use crate::surface::Screen;

// ── Panel (LilyGO T-Display, 135x240 ST7789) ────────────────────────
const PANEL_WIDTH: u16 = 135;
const PANEL_HEIGHT: u16 = 240;
const PANEL_OFFSET_X: u16 = 52;
const PANEL_OFFSET_Y: u16 = 40;

const SPI_BAUDRATE_MHZ: u32 = 26;
const PIN_LCD_BL: i32 = 4;

// SPI staging buffer: ten landscape rows of RGB565.
const TX_BUFFER_BYTES: usize = 240 * 10 * 2;

type PanelSpi = SpiDeviceDriver<'static, SpiDriver<'static>>;
type PanelPin = PinDriver<'static, AnyOutputPin, Output>;

pub type Panel = mipidsi::Display<SpiInterface<'static, PanelSpi, PanelPin>, ST7789, PanelPin>;

/// SPI bus and control pins the panel is wired to.
pub struct PanelPins<SPI, SCLK, MOSI, CS, DC, RST> {
    pub spi: SPI,
    pub sclk: SCLK,
    pub mosi: MOSI,
    pub cs: CS,
    pub dc: DC,
    pub rst: RST,
}

fn rotation_for(orientation: Orientation) -> Rotation {
    match orientation {
        Orientation::Landscape => Rotation::Deg90,
        Orientation::Portrait => Rotation::Deg0,
    }
}

/// Bring up the ST7789, switch on the backlight and hand back a drawable
/// screen rotated for `orientation`.
pub fn init_display<SPI, SCLK, MOSI, CS, DC, RST>(
    pins: PanelPins<SPI, SCLK, MOSI, CS, DC, RST>,
    orientation: Orientation,
) -> Result<Screen<Panel>>
where
    SPI: Peripheral + 'static,
    SPI::P: SpiAnyPins,
    SCLK: Peripheral + 'static,
    SCLK::P: OutputPin,
    MOSI: Peripheral + 'static,
    MOSI::P: OutputPin,
    CS: Peripheral + 'static,
    CS::P: OutputPin,
    DC: Peripheral<P = AnyOutputPin> + 'static,
    RST: Peripheral<P = AnyOutputPin> + 'static,
{
    let spi_driver = SpiDriver::new(
        pins.spi,
        pins.sclk,
        pins.mosi,
        None::<AnyIOPin>,
        &SpiDriverConfig::new(),
    )?;
    let spi_config = SpiConfig::new().baudrate(SPI_BAUDRATE_MHZ.MHz().into());
    let spi_device = SpiDeviceDriver::new(spi_driver, Some(pins.cs), &spi_config)?;

    let dc = PinDriver::output(pins.dc)?;
    let rst = PinDriver::output(pins.rst)?;

    let buffer: &'static mut [u8] = Box::leak(vec![0u8; TX_BUFFER_BYTES].into_boxed_slice());
    let di = SpiInterface::new(spi_device, dc, buffer);

    let panel = Builder::new(ST7789, di)
        .display_size(PANEL_WIDTH, PANEL_HEIGHT)
        .display_offset(PANEL_OFFSET_X, PANEL_OFFSET_Y)
        .orientation(PanelOrientation::new().rotate(rotation_for(orientation)))
        .invert_colors(ColorInversion::Inverted)
        .reset_pin(rst)
        .init(&mut FreeRtos)
        .map_err(|e| anyhow!("Display init failed: {:?}", e))?;

    let (width, height) = screen_size(orientation);
    info!(
        "Display initialized OK ({}x{} {})",
        width,
        height,
        orientation.as_str()
    );
    enable_backlight()?;
    Ok(Screen::new(panel))
}

fn enable_backlight() -> Result<()> {
    let io_conf = esp_idf_sys::gpio_config_t {
        pin_bit_mask: 1u64 << (PIN_LCD_BL as u64),
        mode: esp_idf_sys::gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: esp_idf_sys::gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: esp_idf_sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: esp_idf_sys::gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    esp_idf_sys::esp!(unsafe { esp_idf_sys::gpio_config(&io_conf) })?;
    esp_idf_sys::esp!(unsafe { esp_idf_sys::gpio_set_level(PIN_LCD_BL, 1) })?;
    info!("Backlight ON");
    Ok(())
}
