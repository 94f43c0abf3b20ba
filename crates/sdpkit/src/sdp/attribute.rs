//! SDP service attributes
//!
//! A service attribute pairs a 16-bit attribute ID with a decoded value.
//! Attribute lists on the wire are a sequence of alternating ID and value
//! elements.

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::sdp::constants::attribute_id::*;
use crate::sdp::element::{DataElement, DataElementReader, SizeIndex, Value};
use log::{debug, warn};
use std::fmt;

/// A single attribute of a service record
///
/// The attribute exclusively owns its value. When built from a decoded
/// element only the value is kept; the wire header is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAttribute {
    id: u16,
    value: Value,
}

impl ServiceAttribute {
    /// Create an attribute from a value built in code
    pub fn new(id: u16, value: impl Into<Value>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }

    /// Create an attribute from an optional value; a missing value is rejected
    pub fn try_new(id: u16, value: Option<Value>) -> Result<Self> {
        match value {
            Some(value) => Ok(Self { id, value }),
            None => Err(Error::BadValue { id, source: None }),
        }
    }

    /// Adopt the value of a decoded element
    ///
    /// Fails with `BadValue` when the element did not decode.
    pub fn from_element(id: u16, element: Result<DataElement>) -> Result<Self> {
        match element {
            Ok(element) => Ok(Self {
                id,
                value: element.into_value(),
            }),
            Err(e) => Err(Error::BadValue {
                id,
                source: Some(Box::new(e)),
            }),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Well-known name of this attribute's ID, if it is a universal attribute
    pub fn name(&self) -> Option<&'static str> {
        attribute_name(self.id)
    }

    /// Append the ID element and the value element to `buf`
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        DataElement::with_size(self.id, SizeIndex::Size2)?.encode(buf)?;
        DataElement::new(self.value.clone()).encode(buf)
    }
}

impl fmt::Display for ServiceAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => writeln!(f, "0x{:04X} {}:", self.id, name)?,
            None => writeln!(f, "0x{:04X}:", self.id)?,
        }
        write!(f, "{}", self.value)
    }
}

/// Name of a universal attribute ID
pub fn attribute_name(id: u16) -> Option<&'static str> {
    let name = match id {
        SERVICE_RECORD_HANDLE => "ServiceRecordHandle",
        SERVICE_CLASS_ID_LIST => "ServiceClassIDList",
        SERVICE_RECORD_STATE => "ServiceRecordState",
        SERVICE_ID => "ServiceID",
        PROTOCOL_DESCRIPTOR_LIST => "ProtocolDescriptorList",
        BROWSE_GROUP_LIST => "BrowseGroupList",
        LANGUAGE_BASE_ATTRIBUTE_ID_LIST => "LanguageBaseAttributeIDList",
        SERVICE_INFO_TIME_TO_LIVE => "ServiceInfoTimeToLive",
        SERVICE_AVAILABILITY => "ServiceAvailability",
        BLUETOOTH_PROFILE_DESCRIPTOR_LIST => "BluetoothProfileDescriptorList",
        DOCUMENTATION_URL => "DocumentationURL",
        CLIENT_EXECUTABLE_URL => "ClientExecutableURL",
        ICON_URL => "IconURL",
        ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS => "AdditionalProtocolDescriptorLists",
        _ => return None,
    };
    Some(name)
}

/// Attribute ID for a language-based attribute
pub const fn language_attribute_id(base: u16, offset: u16) -> u16 {
    base.wrapping_add(offset)
}

/// Result of parsing an attribute list: every attribute that decoded, and
/// the failures met on the way
#[derive(Debug, Default)]
pub struct AttributeList {
    pub attributes: Vec<ServiceAttribute>,
    pub failures: Vec<Error>,
}

impl AttributeList {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse an attribute list sequence, keeping partial results
///
/// A value that fails to decode but whose extent is known is skipped and
/// recorded as a failure; the attributes around it stay usable. A bad
/// attribute ID or an unreadable element boundary ends the walk. Only an
/// unreadable outer sequence is returned as an error.
pub fn parse_attribute_list(data: &[u8], config: &DecoderConfig) -> Result<AttributeList> {
    let mut reader = DataElementReader::with_config(data, *config);
    let mut inner = reader.enter_sequence()?;
    let mut list = AttributeList::default();

    while !inner.is_empty() {
        let id = match read_attribute_id(&mut inner, config) {
            Ok(id) => id,
            Err(e) => {
                warn!("Stopping attribute list parse: {}", e);
                list.failures.push(e);
                break;
            }
        };

        if inner.is_empty() {
            list.failures.push(Error::BadValue {
                id,
                source: Some(Box::new(Error::Truncated {
                    needed: 1,
                    available: 0,
                })),
            });
            break;
        }

        match ServiceAttribute::from_element(id, inner.read_element()) {
            Ok(attribute) => list.attributes.push(attribute),
            Err(e) => {
                warn!("Skipping attribute 0x{:04X}: {}", id, e);
                list.failures.push(e);
                if inner.skip_element().is_err() {
                    break;
                }
            }
        }
    }

    debug!(
        "Parsed attribute list: {} attributes, {} failures",
        list.attributes.len(),
        list.failures.len()
    );
    Ok(list)
}

fn read_attribute_id(reader: &mut DataElementReader<'_>, config: &DecoderConfig) -> Result<u16> {
    let element = reader.read_element()?;
    if config.strict_attribute_ids && element.size() != SizeIndex::Size2 {
        return Err(Error::InvalidPacket(format!(
            "attribute ID must be a 16-bit unsigned integer, found {:?}/{:?}",
            element.element_type(),
            element.size()
        )));
    }
    element
        .value()
        .as_u16()
        .ok_or_else(|| Error::InvalidPacket("attribute ID is not a 16-bit unsigned integer".into()))
}

/// Encode attributes as an attribute list sequence, in the order given
pub fn encode_attribute_list<'a, I>(attributes: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a ServiceAttribute>,
{
    let mut children = Vec::new();
    for attribute in attributes {
        children.push(DataElement::with_size(attribute.id, SizeIndex::Size2)?);
        children.push(DataElement::new(attribute.value.clone()));
    }
    DataElement::new(Value::Sequence(children)).to_bytes()
}

/// An attribute ID or an inclusive range of IDs, as used in attribute requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeIdRange {
    Single(u16),
    Range(u16, u16),
}

/// Every attribute ID
pub const ALL_ATTRIBUTES: AttributeIdRange = AttributeIdRange::Range(0x0000, 0xFFFF);

impl AttributeIdRange {
    pub fn contains(&self, id: u16) -> bool {
        match *self {
            AttributeIdRange::Single(single) => single == id,
            AttributeIdRange::Range(start, end) => start <= id && id <= end,
        }
    }

    /// Single IDs are 16-bit unsigned elements, ranges 32-bit with the
    /// start in the high half
    pub fn to_element(&self) -> Result<DataElement> {
        match *self {
            AttributeIdRange::Single(id) => DataElement::with_size(id, SizeIndex::Size2),
            AttributeIdRange::Range(start, end) => {
                let packed = ((start as u32) << 16) | end as u32;
                DataElement::with_size(packed, SizeIndex::Size4)
            }
        }
    }

    pub fn from_element(element: &DataElement) -> Option<Self> {
        let value = element.value().as_u128()?;
        match element.size() {
            SizeIndex::Size2 => Some(AttributeIdRange::Single(value as u16)),
            SizeIndex::Size4 => Some(AttributeIdRange::Range((value >> 16) as u16, value as u16)),
            _ => None,
        }
    }
}
