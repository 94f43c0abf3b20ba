//! SDP constants
//!
//! Attribute identifiers, PDU identifiers and error codes from the
//! Bluetooth Core Specification, Vol 3 Part B, and Assigned Numbers.

use crate::uuid::Uuid;

/// L2CAP PSM of the SDP server
pub const SDP_PSM: u16 = 0x0001;

/// Record handle reserved for the SDP server's own record
pub const SDP_SERVER_RECORD_HANDLE: u32 = 0x0000_0000;

/// SDP PDU header size: PDU ID (1) + transaction ID (2) + parameter length (2)
pub const SDP_PDU_HEADER_SIZE: usize = 5;

/// Maximum continuation state length
pub const SDP_MAX_CONTINUATION_LEN: usize = 16;

/// Universal attribute IDs (Vol 3 Part B, Section 5.1)
pub mod attribute_id {
    pub const SERVICE_RECORD_HANDLE: u16 = 0x0000;
    pub const SERVICE_CLASS_ID_LIST: u16 = 0x0001;
    pub const SERVICE_RECORD_STATE: u16 = 0x0002;
    pub const SERVICE_ID: u16 = 0x0003;
    pub const PROTOCOL_DESCRIPTOR_LIST: u16 = 0x0004;
    pub const BROWSE_GROUP_LIST: u16 = 0x0005;
    pub const LANGUAGE_BASE_ATTRIBUTE_ID_LIST: u16 = 0x0006;
    pub const SERVICE_INFO_TIME_TO_LIVE: u16 = 0x0007;
    pub const SERVICE_AVAILABILITY: u16 = 0x0008;
    pub const BLUETOOTH_PROFILE_DESCRIPTOR_LIST: u16 = 0x0009;
    pub const DOCUMENTATION_URL: u16 = 0x000A;
    pub const CLIENT_EXECUTABLE_URL: u16 = 0x000B;
    pub const ICON_URL: u16 = 0x000C;
    pub const ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS: u16 = 0x000D;

    /// Offsets from a language base attribute ID
    pub const SERVICE_NAME_OFFSET: u16 = 0x0000;
    pub const SERVICE_DESCRIPTION_OFFSET: u16 = 0x0001;
    pub const PROVIDER_NAME_OFFSET: u16 = 0x0002;

    /// Primary language base ID
    pub const PRIMARY_LANGUAGE_BASE: u16 = 0x0100;

    /// Service Discovery Server service class attributes
    pub mod sdp_server {
        pub const VERSION_NUMBER_LIST: u16 = 0x0200;
        pub const SERVICE_DATABASE_STATE: u16 = 0x0201;
    }

    /// Browse Group Descriptor service class attributes
    pub mod browse_group {
        pub const GROUP_ID: u16 = 0x0200;
    }
}

/// Well-known service class and protocol UUIDs (Assigned Numbers)
pub mod uuids {
    use super::Uuid;

    pub const SDP: Uuid = Uuid::from_u16(0x0001);
    pub const RFCOMM: Uuid = Uuid::from_u16(0x0003);
    pub const OBEX: Uuid = Uuid::from_u16(0x0008);
    pub const BNEP: Uuid = Uuid::from_u16(0x000F);
    pub const HIDP: Uuid = Uuid::from_u16(0x0011);
    pub const AVCTP: Uuid = Uuid::from_u16(0x0017);
    pub const AVDTP: Uuid = Uuid::from_u16(0x0019);
    pub const L2CAP: Uuid = Uuid::from_u16(0x0100);

    pub const SERVICE_DISCOVERY_SERVER: Uuid = Uuid::from_u16(0x1000);
    pub const BROWSE_GROUP_DESCRIPTOR: Uuid = Uuid::from_u16(0x1001);
    pub const PUBLIC_BROWSE_ROOT: Uuid = Uuid::from_u16(0x1002);
    pub const SERIAL_PORT: Uuid = Uuid::from_u16(0x1101);
    pub const OBEX_OBJECT_PUSH: Uuid = Uuid::from_u16(0x1105);
    pub const AUDIO_SOURCE: Uuid = Uuid::from_u16(0x110A);
    pub const AUDIO_SINK: Uuid = Uuid::from_u16(0x110B);
    pub const HANDSFREE: Uuid = Uuid::from_u16(0x111E);
    pub const HUMAN_INTERFACE_DEVICE: Uuid = Uuid::from_u16(0x1124);
}

/// SDP PDU identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpPdu {
    ErrorResponse = 0x01,
    ServiceSearchRequest = 0x02,
    ServiceSearchResponse = 0x03,
    ServiceAttributeRequest = 0x04,
    ServiceAttributeResponse = 0x05,
    ServiceSearchAttributeRequest = 0x06,
    ServiceSearchAttributeResponse = 0x07,
}

impl TryFrom<u8> for SdpPdu {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(SdpPdu::ErrorResponse),
            0x02 => Ok(SdpPdu::ServiceSearchRequest),
            0x03 => Ok(SdpPdu::ServiceSearchResponse),
            0x04 => Ok(SdpPdu::ServiceAttributeRequest),
            0x05 => Ok(SdpPdu::ServiceAttributeResponse),
            0x06 => Ok(SdpPdu::ServiceSearchAttributeRequest),
            0x07 => Ok(SdpPdu::ServiceSearchAttributeResponse),
            other => Err(other),
        }
    }
}

/// Error codes carried by an SDP_ErrorResponse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpErrorCode {
    InvalidVersion,
    InvalidServiceRecordHandle,
    InvalidRequestSyntax,
    InvalidPduSize,
    InvalidContinuationState,
    InsufficientResources,
    Unknown(u16),
}

impl From<u16> for SdpErrorCode {
    fn from(code: u16) -> Self {
        match code {
            0x0001 => SdpErrorCode::InvalidVersion,
            0x0002 => SdpErrorCode::InvalidServiceRecordHandle,
            0x0003 => SdpErrorCode::InvalidRequestSyntax,
            0x0004 => SdpErrorCode::InvalidPduSize,
            0x0005 => SdpErrorCode::InvalidContinuationState,
            0x0006 => SdpErrorCode::InsufficientResources,
            other => SdpErrorCode::Unknown(other),
        }
    }
}

impl From<SdpErrorCode> for u16 {
    fn from(code: SdpErrorCode) -> Self {
        match code {
            SdpErrorCode::InvalidVersion => 0x0001,
            SdpErrorCode::InvalidServiceRecordHandle => 0x0002,
            SdpErrorCode::InvalidRequestSyntax => 0x0003,
            SdpErrorCode::InvalidPduSize => 0x0004,
            SdpErrorCode::InvalidContinuationState => 0x0005,
            SdpErrorCode::InsufficientResources => 0x0006,
            SdpErrorCode::Unknown(other) => other,
        }
    }
}
