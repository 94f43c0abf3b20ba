//! Remote device description
//!
//! A service record refers to the device that advertised it. The device is
//! owned by whatever discovery session found it; records only hold a weak
//! reference to it.

use std::fmt;
use std::str::FromStr;

/// Bluetooth device address, stored little-endian as on the HCI wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&slice[0..6]);
            Some(Self { bytes })
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

impl FromStr for BdAddr {
    type Err = hex::FromHexError;

    /// Parses the `AA:BB:CC:DD:EE:FF` display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != ':').collect();
        let mut bytes = [0u8; 6];
        hex::decode_to_slice(&cleaned, &mut bytes)?;
        bytes.reverse();
        Ok(Self { bytes })
    }
}

/// A remote device that answered an SDP query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDevice {
    pub address: BdAddr,
    pub name: Option<String>,
    /// Class of Device field from the inquiry response
    pub class_of_device: Option<u32>,
}

impl RemoteDevice {
    pub fn new(address: BdAddr) -> Self {
        Self {
            address,
            name: None,
            class_of_device: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
