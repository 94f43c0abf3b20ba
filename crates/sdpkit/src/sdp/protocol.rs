//! SDP PDU framing
//!
//! Builds request PDUs and parses response PDUs. Getting the bytes to and
//! from the remote SDP server over L2CAP is left to the caller.

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::sdp::attribute::{parse_attribute_list, AttributeIdRange, AttributeList};
use crate::sdp::constants::{SdpErrorCode, SdpPdu, SDP_MAX_CONTINUATION_LEN, SDP_PDU_HEADER_SIZE};
use crate::sdp::element::{DataElement, DataElementReader, Value};
use crate::uuid::Uuid;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::trace;
use std::io::{Cursor, Read};

/// A single SDP PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpPacket {
    pub pdu_id: SdpPdu,
    pub transaction_id: u16,
    pub parameters: Vec<u8>,
}

impl SdpPacket {
    pub fn new(pdu_id: SdpPdu, transaction_id: u16, parameters: Vec<u8>) -> Self {
        Self {
            pdu_id,
            transaction_id,
            parameters,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let length = u16::try_from(self.parameters.len())
            .map_err(|_| Error::InvalidPacket("SDP parameters exceed 65535 bytes".into()))?;
        let mut buffer = Vec::with_capacity(SDP_PDU_HEADER_SIZE + self.parameters.len());
        buffer.push(self.pdu_id as u8);
        buffer.write_u16::<BigEndian>(self.transaction_id)?;
        buffer.write_u16::<BigEndian>(length)?;
        buffer.extend_from_slice(&self.parameters);
        Ok(buffer)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < SDP_PDU_HEADER_SIZE {
            return Err(Error::InvalidPacket("SDP packet too short".into()));
        }

        let mut cursor = Cursor::new(data);
        let pdu_id = SdpPdu::try_from(cursor.read_u8()?)
            .map_err(|id| Error::InvalidPacket(format!("Unknown SDP PDU ID 0x{:02X}", id)))?;
        let transaction_id = cursor.read_u16::<BigEndian>()?;
        let parameters_length = cursor.read_u16::<BigEndian>()? as usize;

        if data.len() < SDP_PDU_HEADER_SIZE + parameters_length {
            return Err(Error::InvalidPacket(
                "SDP packet too short for parameter length".into(),
            ));
        }

        let parameters =
            data[SDP_PDU_HEADER_SIZE..SDP_PDU_HEADER_SIZE + parameters_length].to_vec();
        trace!(
            "SDP {:?} tid {} with {} parameter bytes",
            pdu_id,
            transaction_id,
            parameters_length
        );

        Ok(Self {
            pdu_id,
            transaction_id,
            parameters,
        })
    }

    /// Turn an SDP_ErrorResponse into an error; pass any other PDU through
    pub fn check_error(self) -> Result<Self> {
        if self.pdu_id != SdpPdu::ErrorResponse {
            return Ok(self);
        }
        let mut cursor = Cursor::new(&self.parameters);
        let code = cursor
            .read_u16::<BigEndian>()
            .map_err(|_| Error::InvalidPacket("Error response without error code".into()))?;
        Err(Error::Protocol(SdpErrorCode::from(code)))
    }
}

/// Continuation state returned by a server when a response is split
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuationState(pub Vec<u8>);

impl ContinuationState {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        if self.0.len() > SDP_MAX_CONTINUATION_LEN {
            return Err(Error::InvalidPacket("Continuation state too long".into()));
        }
        buf.push(self.0.len() as u8);
        buf.extend_from_slice(&self.0);
        Ok(())
    }

    fn decode(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let len = cursor
            .read_u8()
            .map_err(|_| Error::InvalidPacket("Missing continuation state".into()))?
            as usize;
        if len > SDP_MAX_CONTINUATION_LEN {
            return Err(Error::InvalidPacket("Continuation state too long".into()));
        }
        let mut state = vec![0u8; len];
        cursor
            .read_exact(&mut state)
            .map_err(|_| Error::InvalidPacket("Continuation state truncated".into()))?;
        Ok(Self(state))
    }
}

fn encode_search_pattern(uuids: &[Uuid], buf: &mut Vec<u8>) -> Result<()> {
    DataElement::new(Value::sequence(uuids.iter().copied())).encode(buf)
}

fn encode_attribute_ids(ids: &[AttributeIdRange], buf: &mut Vec<u8>) -> Result<()> {
    let children = ids
        .iter()
        .map(AttributeIdRange::to_element)
        .collect::<Result<Vec<_>>>()?;
    DataElement::new(Value::Sequence(children)).encode(buf)
}

/// SDP_ServiceSearchRequest
pub fn encode_service_search_request(
    transaction_id: u16,
    uuids: &[Uuid],
    max_records: u16,
    continuation: &ContinuationState,
) -> Result<Vec<u8>> {
    let mut parameters = Vec::new();
    encode_search_pattern(uuids, &mut parameters)?;
    parameters.write_u16::<BigEndian>(max_records)?;
    continuation.encode(&mut parameters)?;
    SdpPacket::new(SdpPdu::ServiceSearchRequest, transaction_id, parameters).serialize()
}

/// SDP_ServiceAttributeRequest
pub fn encode_service_attribute_request(
    transaction_id: u16,
    handle: u32,
    max_bytes: u16,
    ids: &[AttributeIdRange],
    continuation: &ContinuationState,
) -> Result<Vec<u8>> {
    let mut parameters = Vec::new();
    parameters.write_u32::<BigEndian>(handle)?;
    parameters.write_u16::<BigEndian>(max_bytes)?;
    encode_attribute_ids(ids, &mut parameters)?;
    continuation.encode(&mut parameters)?;
    SdpPacket::new(SdpPdu::ServiceAttributeRequest, transaction_id, parameters).serialize()
}

/// SDP_ServiceSearchAttributeRequest
pub fn encode_service_search_attribute_request(
    transaction_id: u16,
    uuids: &[Uuid],
    max_bytes: u16,
    ids: &[AttributeIdRange],
    continuation: &ContinuationState,
) -> Result<Vec<u8>> {
    let mut parameters = Vec::new();
    encode_search_pattern(uuids, &mut parameters)?;
    parameters.write_u16::<BigEndian>(max_bytes)?;
    encode_attribute_ids(ids, &mut parameters)?;
    continuation.encode(&mut parameters)?;
    SdpPacket::new(SdpPdu::ServiceSearchAttributeRequest, transaction_id, parameters)
        .serialize()
}

/// Parsed SDP_ServiceSearchResponse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSearchResponse {
    pub total_records: u16,
    pub handles: Vec<u32>,
    pub continuation: ContinuationState,
}

pub fn parse_service_search_response(packet: &SdpPacket) -> Result<ServiceSearchResponse> {
    if packet.pdu_id != SdpPdu::ServiceSearchResponse {
        return Err(Error::InvalidPacket("Not a service search response".into()));
    }

    let mut cursor = Cursor::new(packet.parameters.as_slice());
    let short = |_: std::io::Error| Error::InvalidPacket("Service search response truncated".into());
    let total_records = cursor.read_u16::<BigEndian>().map_err(short)?;
    let record_count = cursor.read_u16::<BigEndian>().map_err(short)?;

    let mut handles = Vec::with_capacity(record_count as usize);
    for _ in 0..record_count {
        handles.push(cursor.read_u32::<BigEndian>().map_err(short)?);
    }
    let continuation = ContinuationState::decode(&mut cursor)?;

    Ok(ServiceSearchResponse {
        total_records,
        handles,
        continuation,
    })
}

/// Attribute bytes of an attribute response, possibly a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeResponse {
    pub attribute_bytes: Vec<u8>,
    pub continuation: ContinuationState,
}

/// Parse SDP_ServiceAttributeResponse or SDP_ServiceSearchAttributeResponse
pub fn parse_attribute_response(packet: &SdpPacket) -> Result<AttributeResponse> {
    if !matches!(
        packet.pdu_id,
        SdpPdu::ServiceAttributeResponse | SdpPdu::ServiceSearchAttributeResponse
    ) {
        return Err(Error::InvalidPacket("Not an attribute response".into()));
    }

    let mut cursor = Cursor::new(packet.parameters.as_slice());
    let byte_count = cursor
        .read_u16::<BigEndian>()
        .map_err(|_| Error::InvalidPacket("Attribute response truncated".into()))?
        as usize;
    let mut attribute_bytes = vec![0u8; byte_count];
    cursor
        .read_exact(&mut attribute_bytes)
        .map_err(|_| Error::InvalidPacket("Attribute byte count exceeds parameters".into()))?;
    let continuation = ContinuationState::decode(&mut cursor)?;

    Ok(AttributeResponse {
        attribute_bytes,
        continuation,
    })
}

/// Split the reassembled body of a search-attribute response into one
/// attribute list per matching record
pub fn parse_attribute_lists(data: &[u8], config: &DecoderConfig) -> Result<Vec<AttributeList>> {
    let mut reader = DataElementReader::with_config(data, *config);
    let mut outer = reader.enter_sequence()?;
    let mut lists = Vec::new();
    while !outer.is_empty() {
        let bytes = outer.read_raw()?;
        lists.push(parse_attribute_list(bytes, config)?);
    }
    Ok(lists)
}
