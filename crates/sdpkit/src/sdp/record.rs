//! SDP Service Record
//!
//! A service record is the set of attributes one remote device returned for
//! one of its services. Attributes are kept in arrival order; a sorted index
//! over the same storage gives the ascending-ID view.

use crate::config::DecoderConfig;
use crate::device::RemoteDevice;
use crate::error::{Error, Result};
use crate::sdp::attribute::{language_attribute_id, parse_attribute_list, ServiceAttribute};
use crate::sdp::constants::attribute_id::*;
use crate::sdp::constants::uuids;
use crate::sdp::element::Value;
use crate::uuid::Uuid;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// One entry of a protocol descriptor list: protocol UUID plus parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    pub protocol: Uuid,
    pub parameters: Vec<Value>,
}

/// An immutable service record discovered on a remote device
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    /// Service record handle, taken from attribute 0x0000
    handle: Option<u32>,
    /// Device that advertised the record; not owned by the record
    host: Weak<RemoteDevice>,
    /// Attributes in arrival order
    attributes: Vec<ServiceAttribute>,
    /// Positions into `attributes`, ordered by ascending attribute ID
    sorted: Vec<usize>,
}

impl ServiceRecord {
    /// Build a record from its attributes and the device that advertised it
    ///
    /// Attribute IDs are unique within a record: a repeated ID replaces the
    /// earlier value but keeps the earlier position.
    pub fn new<I>(attributes: I, host: &Arc<RemoteDevice>) -> Self
    where
        I: IntoIterator<Item = ServiceAttribute>,
    {
        let mut stored: Vec<ServiceAttribute> = Vec::new();
        let mut positions: HashMap<u16, usize> = HashMap::new();

        for attribute in attributes {
            match positions.get(&attribute.id()) {
                Some(&index) => {
                    debug!(
                        "Duplicate attribute 0x{:04X} in record, keeping the later value",
                        attribute.id()
                    );
                    stored[index] = attribute;
                }
                None => {
                    positions.insert(attribute.id(), stored.len());
                    stored.push(attribute);
                }
            }
        }

        let mut sorted: Vec<usize> = (0..stored.len()).collect();
        sorted.sort_by_key(|&index| stored[index].id());

        let handle = positions
            .get(&SERVICE_RECORD_HANDLE)
            .and_then(|&index| stored[index].value().as_u32());

        debug!(
            "Service record {:?} from {} with {} attributes",
            handle,
            host.address,
            stored.len()
        );

        Self {
            handle,
            host: Arc::downgrade(host),
            attributes: stored,
            sorted,
        }
    }

    /// Parse an attribute list and build a record from whatever decoded
    ///
    /// Returns the record together with the per-attribute failures.
    pub fn from_attribute_list(
        data: &[u8],
        host: &Arc<RemoteDevice>,
        config: &DecoderConfig,
    ) -> Result<(Self, Vec<Error>)> {
        let list = parse_attribute_list(data, config)?;
        Ok((Self::new(list.attributes, host), list.failures))
    }

    /// The service record handle, when attribute 0x0000 holds a 32-bit unsigned value
    pub fn id(&self) -> Option<u32> {
        self.handle
    }

    /// The device that advertised this record, if it is still alive
    pub fn host_device(&self) -> Option<Arc<RemoteDevice>> {
        self.host.upgrade()
    }

    /// Attributes in the order they arrived
    pub fn attributes(&self) -> &[ServiceAttribute] {
        &self.attributes
    }

    /// Attributes in strictly ascending ID order
    pub fn sorted_attributes(&self) -> impl ExactSizeIterator<Item = &ServiceAttribute> + '_ {
        self.sorted.iter().map(move |&index| &self.attributes[index])
    }

    pub fn attribute(&self, id: u16) -> Option<&ServiceAttribute> {
        self.sorted
            .binary_search_by_key(&id, |&index| self.attributes[index].id())
            .ok()
            .map(|pos| &self.attributes[self.sorted[pos]])
    }

    pub fn value(&self, id: u16) -> Option<&Value> {
        self.attribute(id).map(ServiceAttribute::value)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Whether the two attributes every record should carry are present
    pub fn is_complete(&self) -> bool {
        self.attribute(SERVICE_RECORD_HANDLE).is_some()
            && self.attribute(SERVICE_CLASS_ID_LIST).is_some()
    }

    /// UUIDs listed in the ServiceClassIDList attribute
    pub fn service_class_ids(&self) -> Vec<Uuid> {
        self.value(SERVICE_CLASS_ID_LIST)
            .and_then(Value::as_sequence)
            .map(|children| {
                children
                    .iter()
                    .filter_map(|child| child.value().as_uuid())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entries of the ProtocolDescriptorList attribute
    ///
    /// When the list is an alternative, the first alternative is used.
    pub fn protocol_descriptors(&self) -> Vec<ProtocolDescriptor> {
        let list = match self.value(PROTOCOL_DESCRIPTOR_LIST) {
            Some(Value::Alternative(choices)) => choices.first().map(|c| c.value()),
            other => other,
        };

        list.and_then(Value::as_sequence)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let fields = entry.value().as_sequence()?;
                        let (first, rest) = fields.split_first()?;
                        Some(ProtocolDescriptor {
                            protocol: first.value().as_uuid()?,
                            parameters: rest.iter().map(|p| p.value().clone()).collect(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// RFCOMM server channel from the protocol descriptor list
    pub fn rfcomm_channel(&self) -> Option<u8> {
        self.protocol_descriptors()
            .into_iter()
            .find(|d| d.protocol == uuids::RFCOMM)
            .and_then(|d| d.parameters.first().and_then(Value::as_u128))
            .and_then(|channel| u8::try_from(channel).ok())
    }

    /// Base attribute ID of the primary language
    fn primary_language_base(&self) -> u16 {
        self.value(LANGUAGE_BASE_ATTRIBUTE_ID_LIST)
            .and_then(Value::as_sequence)
            .and_then(|triplet| triplet.get(2))
            .and_then(|base| base.value().as_u16())
            .unwrap_or(PRIMARY_LANGUAGE_BASE)
    }

    /// Service name in the primary language
    pub fn service_name(&self) -> Option<&str> {
        let id = language_attribute_id(self.primary_language_base(), SERVICE_NAME_OFFSET);
        self.value(id).and_then(Value::as_str)
    }

    /// Service search pattern match: every UUID of the pattern appears
    /// somewhere in the record's attribute values
    pub fn matches(&self, pattern: &[Uuid]) -> bool {
        pattern.iter().all(|uuid| {
            self.attributes
                .iter()
                .any(|attribute| attribute.value().contains_uuid(uuid))
        })
    }
}

impl fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.handle {
            Some(handle) => write!(f, "Service record 0x{:08X}", handle)?,
            None => write!(f, "Service record (no handle)")?,
        }
        if let Some(host) = self.host_device() {
            write!(f, " from {}", host.address)?;
        }
        writeln!(f)?;
        for attribute in self.sorted_attributes() {
            write!(f, "{}", attribute)?;
        }
        Ok(())
    }
}
