//! SDP Data Element codec
//!
//! A data element is a one byte header (5-bit type, 3-bit size index),
//! an optional 8/16/32-bit length prefix and a payload. Sequences and
//! alternatives carry further data elements back-to-back in their payload.

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::uuid::Uuid;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use log::trace;
use std::fmt;
use std::io::Cursor;

/// Data element type descriptor (bits 7..3 of the header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Nil = 0,
    UnsignedInt = 1,
    SignedInt = 2,
    Uuid = 3,
    TextString = 4,
    Boolean = 5,
    Sequence = 6,
    Alternative = 7,
    Url = 8,
}

impl TryFrom<u8> for ElementType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ElementType::Nil),
            1 => Ok(ElementType::UnsignedInt),
            2 => Ok(ElementType::SignedInt),
            3 => Ok(ElementType::Uuid),
            4 => Ok(ElementType::TextString),
            5 => Ok(ElementType::Boolean),
            6 => Ok(ElementType::Sequence),
            7 => Ok(ElementType::Alternative),
            8 => Ok(ElementType::Url),
            other => Err(Error::ReservedType(other)),
        }
    }
}

impl ElementType {
    /// Returns true for sequence and alternative
    pub fn is_container(self) -> bool {
        matches!(self, ElementType::Sequence | ElementType::Alternative)
    }

    /// Checks whether a size index is allowed for this type
    pub fn accepts(self, size: SizeIndex) -> bool {
        use SizeIndex::*;
        match self {
            ElementType::Nil | ElementType::Boolean => size == Size1,
            ElementType::UnsignedInt | ElementType::SignedInt => {
                matches!(size, Size1 | Size2 | Size4 | Size8 | Size16)
            }
            ElementType::Uuid => matches!(size, Size2 | Size4 | Size16),
            ElementType::TextString
            | ElementType::Url
            | ElementType::Sequence
            | ElementType::Alternative => size.is_variable(),
        }
    }
}

/// Data element size index (bits 2..0 of the header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeIndex {
    /// 1 byte, or no payload for Nil
    Size1 = 0,
    Size2 = 1,
    Size4 = 2,
    Size8 = 3,
    Size16 = 4,
    /// Length in the next 8 bits
    Var8 = 5,
    /// Length in the next 16 bits
    Var16 = 6,
    /// Length in the next 32 bits
    Var32 = 7,
}

impl SizeIndex {
    /// Builds a size index from the low three bits of a header byte
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => SizeIndex::Size1,
            1 => SizeIndex::Size2,
            2 => SizeIndex::Size4,
            3 => SizeIndex::Size8,
            4 => SizeIndex::Size16,
            5 => SizeIndex::Var8,
            6 => SizeIndex::Var16,
            _ => SizeIndex::Var32,
        }
    }

    pub fn is_variable(self) -> bool {
        self >= SizeIndex::Var8
    }

    /// Payload width of a fixed size index
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            SizeIndex::Size1 => Some(1),
            SizeIndex::Size2 => Some(2),
            SizeIndex::Size4 => Some(4),
            SizeIndex::Size8 => Some(8),
            SizeIndex::Size16 => Some(16),
            _ => None,
        }
    }

    /// Width of the length prefix following the header
    pub fn prefix_len(self) -> usize {
        match self {
            SizeIndex::Var8 => 1,
            SizeIndex::Var16 => 2,
            SizeIndex::Var32 => 4,
            _ => 0,
        }
    }

    /// Largest payload a variable size index can describe
    pub fn max_payload(self) -> usize {
        match self {
            SizeIndex::Var8 => u8::MAX as usize,
            SizeIndex::Var16 => u16::MAX as usize,
            SizeIndex::Var32 => u32::MAX as usize,
            fixed => fixed.fixed_len().unwrap_or(0),
        }
    }

    fn for_fixed_len(len: usize) -> Self {
        match len {
            0 | 1 => SizeIndex::Size1,
            2 => SizeIndex::Size2,
            3 | 4 => SizeIndex::Size4,
            5..=8 => SizeIndex::Size8,
            _ => SizeIndex::Size16,
        }
    }

    fn for_variable_len(len: usize) -> Self {
        if len <= u8::MAX as usize {
            SizeIndex::Var8
        } else if len <= u16::MAX as usize {
            SizeIndex::Var16
        } else {
            SizeIndex::Var32
        }
    }
}

/// The type/size header byte of a data element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataElementHeader {
    pub element_type: ElementType,
    pub size: SizeIndex,
}

impl DataElementHeader {
    /// Create a header, rejecting type/size combinations the format forbids
    pub fn new(element_type: ElementType, size: SizeIndex) -> Result<Self> {
        if !element_type.accepts(size) {
            return Err(Error::InvalidSize {
                element_type: element_type as u8,
                size: size as u8,
            });
        }
        Ok(Self { element_type, size })
    }

    /// Parse a header byte: type in the high 5 bits, size in the low 3
    pub fn from_byte(byte: u8) -> Result<Self> {
        let element_type = ElementType::try_from(byte >> 3)?;
        Self::new(element_type, SizeIndex::from_bits(byte))
    }

    pub fn to_byte(&self) -> u8 {
        ((self.element_type as u8) << 3) | self.size as u8
    }

    /// Payload length implied by a fixed size index
    pub fn fixed_payload_len(&self) -> Option<usize> {
        if self.element_type == ElementType::Nil {
            return Some(0);
        }
        self.size.fixed_len()
    }
}

/// Decoded payload of a data element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nil,
    Unsigned(u128),
    Signed(i128),
    Uuid(Uuid),
    /// Raw text bytes; the declared length is authoritative
    Text(Vec<u8>),
    Boolean(bool),
    Sequence(Vec<DataElement>),
    Alternative(Vec<DataElement>),
    Url(Vec<u8>),
}

impl Value {
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Nil => ElementType::Nil,
            Value::Unsigned(_) => ElementType::UnsignedInt,
            Value::Signed(_) => ElementType::SignedInt,
            Value::Uuid(_) => ElementType::Uuid,
            Value::Text(_) => ElementType::TextString,
            Value::Boolean(_) => ElementType::Boolean,
            Value::Sequence(_) => ElementType::Sequence,
            Value::Alternative(_) => ElementType::Alternative,
            Value::Url(_) => ElementType::Url,
        }
    }

    /// Build a sequence from anything convertible into values
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Sequence(items.into_iter().map(|v| DataElement::new(v.into())).collect())
    }

    /// Build an alternative from anything convertible into values
    pub fn alternative<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Alternative(items.into_iter().map(|v| DataElement::new(v.into())).collect())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Value::Url(url.into().into_bytes())
    }

    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Value::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_u128().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_u16(&self) -> Option<u16> {
        self.as_u128().and_then(|v| u16::try_from(v).ok())
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Signed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(uuid) => Some(*uuid),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Raw bytes of a text string or URL
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Text(bytes) | Value::Url(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Text string or URL as UTF-8, with trailing NULs some stacks send trimmed
    pub fn as_str(&self) -> Option<&str> {
        let bytes = self.as_bytes()?;
        let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        std::str::from_utf8(&bytes[..end]).ok()
    }

    /// Children of a sequence or alternative
    pub fn as_sequence(&self) -> Option<&[DataElement]> {
        match self {
            Value::Sequence(children) | Value::Alternative(children) => Some(children),
            _ => None,
        }
    }

    /// Searches this value and all nested children for a UUID
    pub fn contains_uuid(&self, uuid: &Uuid) -> bool {
        match self {
            Value::Uuid(own) => own == uuid,
            Value::Sequence(children) | Value::Alternative(children) => {
                children.iter().any(|child| child.value.contains_uuid(uuid))
            }
            _ => false,
        }
    }

    /// Smallest size index able to carry this value
    fn smallest_size(&self) -> SizeIndex {
        match self {
            Value::Nil | Value::Boolean(_) => SizeIndex::Size1,
            Value::Unsigned(v) => {
                let significant = 16 - (v.leading_zeros() as usize / 8);
                SizeIndex::for_fixed_len(significant)
            }
            Value::Signed(v) => {
                let width = [1usize, 2, 4, 8]
                    .into_iter()
                    .find(|w| signed_fits(*v, *w))
                    .unwrap_or(16);
                SizeIndex::for_fixed_len(width)
            }
            Value::Uuid(uuid) => {
                if uuid.as_u16().is_some() {
                    SizeIndex::Size2
                } else if uuid.as_u32().is_some() {
                    SizeIndex::Size4
                } else {
                    SizeIndex::Size16
                }
            }
            Value::Text(bytes) | Value::Url(bytes) => SizeIndex::for_variable_len(bytes.len()),
            Value::Sequence(children) | Value::Alternative(children) => {
                SizeIndex::for_variable_len(children.iter().map(DataElement::encoded_len).sum())
            }
        }
    }

    /// Checks that this value can be written with the given size index
    fn fits(&self, size: SizeIndex) -> bool {
        match self {
            Value::Nil | Value::Boolean(_) => size == SizeIndex::Size1,
            Value::Unsigned(v) => size
                .fixed_len()
                .map_or(false, |w| w == 16 || *v >> (w * 8) == 0),
            Value::Signed(v) => size.fixed_len().map_or(false, |w| signed_fits(*v, w)),
            Value::Uuid(uuid) => match size {
                SizeIndex::Size2 => uuid.as_u16().is_some(),
                SizeIndex::Size4 => uuid.as_u32().is_some(),
                SizeIndex::Size16 => true,
                _ => false,
            },
            _ => size.is_variable() && self.payload_len(size) <= size.max_payload(),
        }
    }

    fn payload_len(&self, size: SizeIndex) -> usize {
        match self {
            Value::Nil => 0,
            Value::Text(bytes) | Value::Url(bytes) => bytes.len(),
            Value::Sequence(children) | Value::Alternative(children) => {
                children.iter().map(DataElement::encoded_len).sum()
            }
            _ => size.fixed_len().unwrap_or(0),
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = indent * 2;
        match self {
            Value::Nil => writeln!(f, "{:pad$}nil", ""),
            Value::Unsigned(v) => writeln!(f, "{:pad$}uint 0x{:X} ({})", "", v, v),
            Value::Signed(v) => writeln!(f, "{:pad$}int {}", "", v),
            Value::Uuid(uuid) => writeln!(f, "{:pad$}uuid {:?}", "", uuid),
            Value::Text(bytes) | Value::Url(bytes) if self.as_str().is_none() => {
                writeln!(f, "{:pad$}bytes {}", "", hex::encode(bytes))
            }
            Value::Text(_) => writeln!(f, "{:pad$}text {:?}", "", self.as_str().unwrap_or("")),
            Value::Url(_) => writeln!(f, "{:pad$}url {}", "", self.as_str().unwrap_or("")),
            Value::Boolean(b) => writeln!(f, "{:pad$}bool {}", "", b),
            Value::Sequence(children) | Value::Alternative(children) => {
                let name = if self.element_type() == ElementType::Sequence {
                    "sequence"
                } else {
                    "alternative"
                };
                writeln!(f, "{:pad$}{} [{}]", "", name, children.len())?;
                for child in children {
                    child.value.fmt_indented(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }
}

fn signed_fits(v: i128, width: usize) -> bool {
    if width >= 16 {
        return true;
    }
    let bits = width * 8;
    let min = -(1i128 << (bits - 1));
    let max = (1i128 << (bits - 1)) - 1;
    v >= min && v <= max
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Unsigned(v as u128)
            }
        })*
    };
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Signed(v as i128)
            }
        })*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, u128);
impl_from_signed!(i8, i16, i32, i64, i128);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<Uuid> for Value {
    fn from(uuid: Uuid) -> Self {
        Value::Uuid(uuid)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s.into_bytes())
    }
}

impl From<Vec<DataElement>> for Value {
    fn from(children: Vec<DataElement>) -> Self {
        Value::Sequence(children)
    }
}

/// A data element: header plus decoded value
///
/// A `DataElement` only exists once it has been fully decoded or built from
/// a value whose size it can carry; there is no invalid state to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataElement {
    header: DataElementHeader,
    value: Value,
}

impl DataElement {
    /// Wrap a value using the smallest size class that fits
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        let header = DataElementHeader {
            element_type: value.element_type(),
            size: value.smallest_size(),
        };
        Self { header, value }
    }

    /// Wrap a value with an explicit size class, e.g. to keep wire compatibility
    pub fn with_size(value: impl Into<Value>, size: SizeIndex) -> Result<Self> {
        let value = value.into();
        let header = DataElementHeader::new(value.element_type(), size)?;
        if !value.fits(size) {
            return Err(Error::ValueOutOfRange(format!(
                "{:?} does not fit size index {:?}",
                value.element_type(),
                size
            )));
        }
        Ok(Self { header, value })
    }

    /// Decode the first data element in `data` with default limits
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        DataElementReader::new(data).read_element()
    }

    /// Decode the first data element in `data` with the given limits
    pub fn decode_with(data: &[u8], config: &DecoderConfig) -> Result<Self> {
        DataElementReader::with_config(data, *config).read_element()
    }

    pub fn header(&self) -> DataElementHeader {
        self.header
    }

    pub fn element_type(&self) -> ElementType {
        self.header.element_type
    }

    pub fn size(&self) -> SizeIndex {
        self.header.size
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Give up the wire wrapper and keep only the value
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Number of bytes this element occupies on the wire
    pub fn encoded_len(&self) -> usize {
        1 + self.header.size.prefix_len() + self.value.payload_len(self.header.size)
    }

    /// Append the wire encoding of this element to `buf`
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let size = self.header.size;
        let payload_len = self.value.payload_len(size);
        if size.is_variable() && payload_len > size.max_payload() {
            return Err(Error::ValueOutOfRange(format!(
                "payload of {} bytes exceeds {:?}",
                payload_len, size
            )));
        }

        buf.push(self.header.to_byte());
        match size {
            SizeIndex::Var8 => buf.write_u8(payload_len as u8)?,
            SizeIndex::Var16 => buf.write_u16::<BigEndian>(payload_len as u16)?,
            SizeIndex::Var32 => buf.write_u32::<BigEndian>(payload_len as u32)?,
            _ => {}
        }

        match &self.value {
            Value::Nil => {}
            Value::Unsigned(v) => buf.extend_from_slice(&v.to_be_bytes()[16 - payload_len..]),
            Value::Signed(v) => buf.extend_from_slice(&v.to_be_bytes()[16 - payload_len..]),
            Value::Uuid(uuid) => match size {
                SizeIndex::Size2 => buf.write_u16::<BigEndian>(uuid.as_u16().unwrap_or(0))?,
                SizeIndex::Size4 => buf.write_u32::<BigEndian>(uuid.as_u32().unwrap_or(0))?,
                _ => buf.extend_from_slice(&uuid.as_bytes_be()),
            },
            Value::Text(bytes) | Value::Url(bytes) => buf.extend_from_slice(bytes),
            Value::Boolean(b) => buf.push(*b as u8),
            Value::Sequence(children) | Value::Alternative(children) => {
                for child in children {
                    child.encode(buf)?;
                }
            }
        }
        Ok(())
    }

    /// Encode this element into a new buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

impl From<Value> for DataElement {
    fn from(value: Value) -> Self {
        DataElement::new(value)
    }
}

impl fmt::Display for DataElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt_indented(f, 0)
    }
}

/// Sequential data element decoder over a byte buffer
///
/// A failed read leaves the cursor where the element started, so elements
/// already produced stay valid and the caller may `skip` the bad one.
pub struct DataElementReader<'a> {
    cursor: Cursor<&'a [u8]>,
    config: DecoderConfig,
}

impl<'a> DataElementReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, DecoderConfig::default())
    }

    pub fn with_config(data: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            cursor: Cursor::new(data),
            config,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Offset of the next unread byte
    pub fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.offset())
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next element
    pub fn read_element(&mut self) -> Result<DataElement> {
        let start = self.offset();
        let result = self.read_at_depth(0);
        if result.is_err() {
            self.cursor.set_position(start as u64);
        }
        result
    }

    /// Read only the header and length prefix of the next element
    pub fn peek_header(&mut self) -> Result<(DataElementHeader, usize)> {
        let start = self.offset();
        let result = self.read_header();
        self.cursor.set_position(start as u64);
        result
    }

    /// Consume the header of a sequence or alternative and return a reader
    /// over exactly its payload
    pub fn enter_sequence(&mut self) -> Result<DataElementReader<'a>> {
        let start = self.offset();
        let result = self.read_header().and_then(|(header, len)| {
            if !header.element_type.is_container() {
                return Err(Error::InvalidPacket(format!(
                    "expected a sequence, found {:?}",
                    header.element_type
                )));
            }
            self.take_bytes(len)
        });
        match result {
            Ok(payload) => Ok(DataElementReader::with_config(payload, self.config)),
            Err(e) => {
                self.cursor.set_position(start as u64);
                Err(e)
            }
        }
    }

    /// Step over the next element without interpreting its payload
    ///
    /// Works for any element whose extent can be determined from its header,
    /// even when the payload itself would fail to decode.
    pub fn skip_element(&mut self) -> Result<usize> {
        let start = self.offset();
        let result = self.skip_inner();
        if result.is_err() {
            self.cursor.set_position(start as u64);
        }
        result.map(|_| self.offset() - start)
    }

    /// Return the raw bytes of the next element, header included
    pub fn read_raw(&mut self) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.offset();
        let len = self.skip_element()?;
        Ok(&data[start..start + len])
    }

    fn skip_inner(&mut self) -> Result<()> {
        let byte = self.read_byte()?;
        let size = SizeIndex::from_bits(byte);
        let len = match size.fixed_len() {
            Some(_) if byte >> 3 == ElementType::Nil as u8 => 0,
            Some(len) => len,
            None => self.read_length(size)?,
        };
        self.take_bytes(len).map(|_| ())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let available = self.remaining();
        self.cursor
            .read_u8()
            .map_err(|_| Error::Truncated { needed: 1, available })
    }

    fn read_length(&mut self, size: SizeIndex) -> Result<usize> {
        let available = self.remaining();
        let truncated = |_: std::io::Error| Error::Truncated {
            needed: size.prefix_len(),
            available,
        };
        let len = match size {
            SizeIndex::Var8 => self.cursor.read_u8().map_err(truncated)? as usize,
            SizeIndex::Var16 => self.cursor.read_u16::<BigEndian>().map_err(truncated)? as usize,
            _ => self.cursor.read_u32::<BigEndian>().map_err(truncated)? as usize,
        };
        if len > self.config.max_element_len {
            return Err(Error::LengthTooLarge {
                length: len,
                limit: self.config.max_element_len,
            });
        }
        Ok(len)
    }

    fn read_header(&mut self) -> Result<(DataElementHeader, usize)> {
        let header = DataElementHeader::from_byte(self.read_byte()?)?;
        let len = match header.fixed_payload_len() {
            Some(len) => len,
            None => self.read_length(header.size)?,
        };
        Ok((header, len))
    }

    /// Borrow the next `len` bytes of the underlying buffer
    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.offset();
        let available = self.remaining();
        if len > available {
            return Err(Error::Truncated {
                needed: len,
                available,
            });
        }
        self.cursor.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    fn read_at_depth(&mut self, depth: usize) -> Result<DataElement> {
        let (header, len) = self.read_header()?;
        let payload = self.take_bytes(len)?;

        let value = match header.element_type {
            ElementType::Nil => Value::Nil,
            ElementType::UnsignedInt => Value::Unsigned(BigEndian::read_uint128(payload, len)),
            ElementType::SignedInt => Value::Signed(BigEndian::read_int128(payload, len)),
            ElementType::Uuid => match Uuid::try_from_slice_be(payload) {
                Some(uuid) => Value::Uuid(uuid),
                None => {
                    return Err(Error::InvalidSize {
                        element_type: header.element_type as u8,
                        size: header.size as u8,
                    })
                }
            },
            ElementType::TextString => Value::Text(payload.to_vec()),
            ElementType::Url => Value::Url(payload.to_vec()),
            ElementType::Boolean => Value::Boolean(payload[0] != 0),
            ElementType::Sequence | ElementType::Alternative => {
                let children = self.read_children(payload, depth)?;
                if header.element_type == ElementType::Sequence {
                    Value::Sequence(children)
                } else {
                    Value::Alternative(children)
                }
            }
        };

        trace!(
            "Decoded {:?} element, size {:?}, {} payload bytes",
            header.element_type,
            header.size,
            len
        );
        Ok(DataElement { header, value })
    }

    fn read_children(&self, payload: &'a [u8], depth: usize) -> Result<Vec<DataElement>> {
        if depth >= self.config.max_depth {
            return Err(Error::NestingTooDeep(self.config.max_depth));
        }

        let mut inner = DataElementReader::with_config(payload, self.config);
        let mut children = Vec::new();
        while !inner.is_empty() {
            match inner.read_at_depth(depth + 1) {
                Ok(child) => children.push(child),
                Err(Error::Truncated { .. }) => {
                    return Err(Error::SequenceOverrun {
                        declared: payload.len(),
                    })
                }
                Err(e) => return Err(e),
            }
        }
        Ok(children)
    }
}

impl Iterator for DataElementReader<'_> {
    type Item = Result<DataElement>;

    /// Yields elements until the buffer is exhausted or an element fails
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }
        let result = self.read_element();
        if result.is_err() {
            // Nothing after a failure can be trusted to be aligned
            let end = self.cursor.get_ref().len() as u64;
            self.cursor.set_position(end);
        }
        Some(result)
    }
}
