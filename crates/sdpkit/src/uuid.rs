use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents a 128-bit Bluetooth UUID.
///
/// SDP carries UUIDs as 16-bit, 32-bit or 128-bit data elements. The short
/// forms are aliases into the Bluetooth Base UUID and are always promoted to
/// the full 128-bit value, so two UUIDs compare equal regardless of the wire
/// width they arrived in.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid {
    value: u128,
}

/// The Bluetooth Base UUID "00000000-0000-1000-8000-00805F9B34FB".
pub const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Shift placing a 16/32-bit short form into the top 32 bits of the base UUID.
const SHORT_SHIFT: u32 = 96;

/// Bits of the base UUID that must match for a short form to exist.
const BASE_MASK: u128 = (1u128 << SHORT_SHIFT) - 1;

impl Uuid {
    /// Creates a UUID from its 128-bit numeric value.
    pub const fn from_u128(value: u128) -> Self {
        Uuid { value }
    }

    /// Creates a 128-bit UUID from 16 big-endian (network order) bytes.
    pub const fn from_bytes_be(bytes: [u8; 16]) -> Self {
        Uuid {
            value: u128::from_be_bytes(bytes),
        }
    }

    /// Creates a 128-bit UUID from a 16-bit SIG-assigned value.
    /// Formula: `value * 2^96 + BASE_UUID`
    pub const fn from_u16(uuid16: u16) -> Self {
        Self::from_u32(uuid16 as u32)
    }

    /// Creates a 128-bit UUID from a 32-bit SIG-assigned value.
    /// Formula: `value * 2^96 + BASE_UUID`
    pub const fn from_u32(uuid32: u32) -> Self {
        Uuid {
            value: ((uuid32 as u128) << SHORT_SHIFT) | BASE_UUID,
        }
    }

    /// Tries to create a UUID from a big-endian byte slice.
    ///
    /// Accepts slices of length 2 (16-bit), 4 (32-bit), or 16 (128-bit).
    /// Returns `None` if the slice length is invalid.
    pub fn try_from_slice_be(slice: &[u8]) -> Option<Self> {
        match slice.len() {
            2 => Some(Uuid::from_u16(u16::from_be_bytes([slice[0], slice[1]]))),
            4 => Some(Uuid::from_u32(u32::from_be_bytes([
                slice[0], slice[1], slice[2], slice[3],
            ]))),
            16 => {
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(slice);
                Some(Uuid::from_bytes_be(bytes))
            }
            _ => None,
        }
    }

    /// Returns the 128-bit numeric value.
    pub const fn as_u128(&self) -> u128 {
        self.value
    }

    /// Returns the 16 bytes in big-endian order.
    pub const fn as_bytes_be(&self) -> [u8; 16] {
        self.value.to_be_bytes()
    }

    /// Checks if the UUID is derived from the standard Bluetooth base UUID.
    pub const fn is_sig_assigned(&self) -> bool {
        self.value & BASE_MASK == BASE_UUID
    }

    /// Tries to represent the UUID as a 16-bit value.
    pub fn as_u16(&self) -> Option<u16> {
        self.as_u32().and_then(|v| u16::try_from(v).ok())
    }

    /// Tries to represent the UUID as a 32-bit value.
    pub fn as_u32(&self) -> Option<u32> {
        if self.is_sig_assigned() {
            Some((self.value >> SHORT_SHIFT) as u32)
        } else {
            None
        }
    }
}

impl From<u16> for Uuid {
    fn from(uuid16: u16) -> Self {
        Uuid::from_u16(uuid16)
    }
}

impl From<u32> for Uuid {
    fn from(uuid32: u32) -> Self {
        Uuid::from_u32(uuid32)
    }
}

impl From<[u8; 16]> for Uuid {
    /// Assumes bytes are in big-endian order.
    fn from(bytes: [u8; 16]) -> Self {
        Uuid::from_bytes_be(bytes)
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == Some(*other)
    }
}

impl PartialEq<u32> for Uuid {
    fn eq(&self, other: &u32) -> bool {
        self.as_u32() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.as_bytes_be();
        write!(f, "{:02X}{:02X}{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show short form if possible, otherwise full hyphenated form
        if let Some(u16_val) = self.as_u16() {
            write!(f, "Uuid(0x{:04X})", u16_val)
        } else if let Some(u32_val) = self.as_u32() {
            write!(f, "Uuid(0x{:08X})", u32_val)
        } else {
            write!(f, "Uuid({})", self)
        }
    }
}

/// Errors produced when parsing a UUID from text
#[derive(Error, Debug)]
pub enum UuidParseError {
    #[error("UUID must have 4, 8 or 32 hex digits")]
    InvalidLength,
    #[error("Invalid UUID hex: {0}")]
    HexError(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim_start_matches("0x")
            .chars()
            .filter(|c| *c != '-')
            .collect();

        match cleaned.len() {
            4 => {
                let mut bytes = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut bytes)?;
                Ok(Uuid::from_u16(u16::from_be_bytes(bytes)))
            }
            8 => {
                let mut bytes = [0u8; 4];
                hex::decode_to_slice(&cleaned, &mut bytes)?;
                Ok(Uuid::from_u32(u32::from_be_bytes(bytes)))
            }
            32 => {
                let mut bytes = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut bytes)?;
                Ok(Uuid::from_bytes_be(bytes))
            }
            _ => Err(UuidParseError::InvalidLength),
        }
    }
}
