//! Service Discovery Protocol (SDP)
//!
//! This module provides the SDP data element codec, the service attribute and
//! service record model built on it, and framing for SDP request/response PDUs.

pub mod attribute;
pub mod constants;
pub mod element;
pub mod protocol;
pub mod record;
#[cfg(test)]
mod tests;

pub use attribute::{
    encode_attribute_list, parse_attribute_list, AttributeIdRange, AttributeList,
    ServiceAttribute, ALL_ATTRIBUTES,
};
pub use constants::{SdpErrorCode, SdpPdu, SDP_PSM};
pub use element::{DataElement, DataElementHeader, DataElementReader, ElementType, SizeIndex, Value};
pub use protocol::{ContinuationState, SdpPacket};
pub use record::{ProtocolDescriptor, ServiceRecord};
