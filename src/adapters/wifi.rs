//! WiFi station bring-up.
//!
//! One-shot: associate, wait for an address, hand the driver back to
//! `main` to keep alive.  There is no reconnection logic here; after a
//! drop the MQTT client keeps retrying on its own and the sweep keeps
//! running offline.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from esp-idf-svc.
//! - **all other targets**: credential validation only.

use core::fmt;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
#[cfg(target_os = "espidf")]
use log::info;

use super::utils::is_printable_ascii;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
    DriverInit,
    ConnectionFailed,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::DriverInit => write!(f, "WiFi driver init failed"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

/// Validated station credentials.
#[derive(Debug, Clone)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, WifiError> {
        if ssid.is_empty() || !is_printable_ascii(ssid) {
            return Err(WifiError::InvalidSsid);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(WifiError::InvalidPassword);
        }
        Ok(Self {
            ssid: heapless::String::try_from(ssid).map_err(|_| WifiError::InvalidSsid)?,
            password: heapless::String::try_from(password)
                .map_err(|_| WifiError::InvalidPassword)?,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Bring the station up and block until the netif has an address.
#[cfg(target_os = "espidf")]
pub fn connect_station(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    creds: &WifiCredentials,
) -> Result<BlockingWifi<EspWifi<'static>>, WifiError> {
    let driver = EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(|e| {
        log::error!("wifi: driver init: {}", e);
        WifiError::DriverInit
    })?;
    let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(|_| WifiError::DriverInit)?;

    let cfg = Configuration::Client(ClientConfiguration {
        ssid: creds.ssid.clone(),
        password: creds.password.clone(),
        auth_method: if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    });

    let connect = |wifi: &mut BlockingWifi<EspWifi<'static>>| -> Result<(), esp_idf_svc::sys::EspError> {
        wifi.set_configuration(&cfg)?;
        wifi.start()?;
        wifi.connect()?;
        wifi.wait_netif_up()
    };
    connect(&mut wifi).map_err(|e| {
        log::error!("wifi: connect to '{}' failed: {}", creds.ssid(), e);
        WifiError::ConnectionFailed
    })?;

    match wifi.wifi().sta_netif().get_ip_info() {
        Ok(ip) => info!("wifi: connected to '{}', ip {}", creds.ssid(), ip.ip),
        Err(_) => info!("wifi: connected to '{}'", creds.ssid()),
    }
    Ok(wifi)
}
