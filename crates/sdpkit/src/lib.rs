//! sdpkit - Bluetooth SDP data element codec and service record model
//!
//! This library decodes and encodes the Service Discovery Protocol data element
//! wire format, groups decoded attributes into service records, and frames SDP
//! request/response PDUs. It also carries a small walker for print spool files,
//! which share the same record-at-an-offset decoding style.
//!
//! Moving bytes to and from a remote device is left to the caller; everything
//! here works on buffers the caller already holds.

pub mod config;
pub mod device;
pub mod error;
pub mod sdp;
pub mod spool;
pub mod uuid;

// Re-export common types for convenience
pub use config::DecoderConfig;
pub use device::{BdAddr, RemoteDevice};
pub use error::{Error, Result};
pub use sdp::{
    AttributeIdRange, AttributeList, DataElement, DataElementReader, ElementType, ServiceAttribute,
    ServiceRecord, SizeIndex, Value,
};
pub use spool::{Direction, PageData, PictureData, SpoolData, SpoolWriter};
pub use uuid::Uuid;
