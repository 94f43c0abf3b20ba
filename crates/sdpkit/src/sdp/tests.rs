//! Unit tests for the SDP codec, attributes, records and PDU framing

use super::attribute::*;
use super::constants::attribute_id::*;
use super::constants::{uuids, SdpErrorCode, SdpPdu};
use super::element::*;
use super::protocol::*;
use super::record::*;
use crate::config::DecoderConfig;
use crate::device::{BdAddr, RemoteDevice};
use crate::error::Error;
use crate::uuid::Uuid;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use std::sync::Arc;

fn host() -> Arc<RemoteDevice> {
    Arc::new(
        RemoteDevice::new(BdAddr::new([0x55, 0x44, 0x33, 0x22, 0x11, 0x00])).with_name("Headset"),
    )
}

/// A serial port record as a phone would send it
fn serial_port_record_bytes() -> Vec<u8> {
    vec![
        0x35, 0x29, // attribute list, 41 bytes
        0x09, 0x00, 0x00, // ServiceRecordHandle
        0x0A, 0x00, 0x01, 0x00, 0x05, //   0x00010005
        0x09, 0x00, 0x01, // ServiceClassIDList
        0x35, 0x03, 0x19, 0x11, 0x01, //   [SerialPort]
        0x09, 0x00, 0x04, // ProtocolDescriptorList
        0x35, 0x0C, //   [
        0x35, 0x03, 0x19, 0x01, 0x00, //     [L2CAP]
        0x35, 0x05, 0x19, 0x00, 0x03, 0x08, 0x03, //     [RFCOMM, channel 3]
        0x09, 0x01, 0x00, // ServiceName (primary language)
        0x25, 0x03, b'S', b'P', b'P',
    ]
}

// --- Header and decode scenarios ---

#[test]
fn test_header_bit_layout() {
    let header = DataElementHeader::from_byte(0x19).unwrap();
    assert_eq!(header.element_type, ElementType::Uuid);
    assert_eq!(header.size, SizeIndex::Size2);
    assert_eq!(header.to_byte(), 0x19);

    let header = DataElementHeader::from_byte(0x35).unwrap();
    assert_eq!(header.element_type, ElementType::Sequence);
    assert_eq!(header.size, SizeIndex::Var8);
}

#[test]
fn test_short_uuid_is_promoted() {
    let element = DataElement::from_bytes(&[0x19, 0x11, 0x01]).unwrap();
    let uuid = element.value().as_uuid().unwrap();
    assert_eq!(uuid.to_string(), "00001101-0000-1000-8000-00805F9B34FB");

    let element = DataElement::from_bytes(&[0x1A, 0x00, 0x00, 0x11, 0x01]).unwrap();
    assert_eq!(element.value().as_uuid(), Some(Uuid::from_u16(0x1101)));
}

#[test]
fn test_full_uuid() {
    let mut bytes = vec![0x1C];
    bytes.extend_from_slice(&Uuid::from_u16(0x1101).as_bytes_be());
    let element = DataElement::from_bytes(&bytes).unwrap();
    assert_eq!(element.size(), SizeIndex::Size16);
    assert_eq!(element.value().as_uuid(), Some(uuids::SERIAL_PORT));
}

#[test]
fn test_unsigned_32_bit() {
    let element = DataElement::from_bytes(&[0x0A, 0x00, 0x00, 0x27, 0x10]).unwrap();
    assert_eq!(element.element_type(), ElementType::UnsignedInt);
    assert_eq!(element.size(), SizeIndex::Size4);
    assert_eq!(element.value(), &Value::Unsigned(10000));
}

#[test]
fn test_size1_means_one_byte_except_nil() {
    let element = DataElement::from_bytes(&[0x08, 0x2A]).unwrap();
    assert_eq!(element.value(), &Value::Unsigned(42));
    assert_eq!(element.encoded_len(), 2);

    let mut reader = DataElementReader::new(&[0x00, 0x08, 0x07]);
    assert_eq!(reader.read_element().unwrap().value(), &Value::Nil);
    assert_eq!(reader.offset(), 1);
    assert_eq!(reader.read_element().unwrap().value(), &Value::Unsigned(7));
    assert!(reader.is_empty());
}

#[test]
fn test_signed_values_are_sign_extended() {
    let element = DataElement::from_bytes(&[0x10, 0xFF]).unwrap();
    assert_eq!(element.value(), &Value::Signed(-1));
    let element = DataElement::from_bytes(&[0x11, 0x80, 0x00]).unwrap();
    assert_eq!(element.value(), &Value::Signed(-32768));
    let element = DataElement::from_bytes(&[0x12, 0x00, 0x00, 0x01, 0x00]).unwrap();
    assert_eq!(element.value(), &Value::Signed(256));
}

#[test]
fn test_text_length_is_authoritative() {
    let element = DataElement::from_bytes(&[0x25, 0x04, b'a', 0x00, b'b', b'c', b'z']).unwrap();
    assert_eq!(element.value(), &Value::Text(vec![b'a', 0x00, b'b', b'c']));

    let element = DataElement::from_bytes(&[0x25, 0x03, b'S', b'P', 0x00]).unwrap();
    assert_eq!(element.value().as_str(), Some("SP"));
}

#[test]
fn test_boolean_and_url() {
    assert_eq!(
        DataElement::from_bytes(&[0x28, 0x02]).unwrap().value(),
        &Value::Boolean(true)
    );
    assert_eq!(
        DataElement::from_bytes(&[0x28, 0x00]).unwrap().value(),
        &Value::Boolean(false)
    );
    let element = DataElement::from_bytes(&[0x45, 0x03, b'a', b'.', b'b']).unwrap();
    assert_eq!(element.element_type(), ElementType::Url);
    assert_eq!(element.value().as_str(), Some("a.b"));
}

#[test]
fn test_var16_and_var32_lengths() {
    let element = DataElement::from_bytes(&[0x26, 0x00, 0x02, b'h', b'i']).unwrap();
    assert_eq!(element.size(), SizeIndex::Var16);
    assert_eq!(element.value().as_str(), Some("hi"));

    let element = DataElement::from_bytes(&[0x37, 0x00, 0x00, 0x00, 0x02, 0x08, 0x01]).unwrap();
    assert_eq!(element.size(), SizeIndex::Var32);
    assert_eq!(element.value().as_sequence().unwrap().len(), 1);
}

#[test]
fn test_nested_sequences_and_alternatives() {
    let bytes = [0x3D, 0x07, 0x35, 0x02, 0x08, 0x01, 0x35, 0x01, 0x00];
    let element = DataElement::from_bytes(&bytes).unwrap();
    assert_eq!(element.element_type(), ElementType::Alternative);
    let choices = element.value().as_sequence().unwrap();
    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0].value().as_sequence().unwrap()[0].value(), &Value::Unsigned(1));
    assert_eq!(choices[1].value().as_sequence().unwrap()[0].value(), &Value::Nil);
}

// --- Decode failures ---

#[test]
fn test_truncated_buffer_fails() {
    assert!(matches!(
        DataElement::from_bytes(&[0x0A, 0x00, 0x00]),
        Err(Error::Truncated { needed: 4, available: 2 })
    ));
    assert!(matches!(
        DataElement::from_bytes(&[0x25, 0x10, b'a']),
        Err(Error::Truncated { .. })
    ));
    assert!(matches!(DataElement::from_bytes(&[0x26, 0x00]), Err(Error::Truncated { .. })));
    assert!(matches!(DataElement::from_bytes(&[]), Err(Error::Truncated { .. })));
}

#[test]
fn test_invalid_type_size_combinations() {
    // Nil must use size index 0
    assert!(matches!(DataElement::from_bytes(&[0x01, 0x00, 0x00]), Err(Error::InvalidSize { .. })));
    // UUID has no 1-byte form
    assert!(matches!(DataElement::from_bytes(&[0x18, 0x01]), Err(Error::InvalidSize { .. })));
    // Integers have no variable forms
    assert!(matches!(DataElement::from_bytes(&[0x0D, 0x01, 0x01]), Err(Error::InvalidSize { .. })));
    // Text has no fixed forms
    assert!(matches!(DataElement::from_bytes(&[0x20, 0x41]), Err(Error::InvalidSize { .. })));
    // Boolean is always one byte
    assert!(matches!(DataElement::from_bytes(&[0x29, 0x00, 0x01]), Err(Error::InvalidSize { .. })));
}

#[test]
fn test_reserved_type_fails() {
    assert!(matches!(DataElement::from_bytes(&[0x48, 0x00]), Err(Error::ReservedType(9))));
}

#[test]
fn test_sequence_child_overrunning_declared_length_fails() {
    // Declared 5 bytes: a 1-byte unsigned (2 bytes) then a 32-bit UUID that
    // needs 5 bytes but only 3 remain inside the sequence.
    let bytes = [0x35, 0x05, 0x08, 0x2A, 0x1A, 0x00, 0x00, 0x11, 0x01];
    assert!(matches!(
        DataElement::from_bytes(&bytes),
        Err(Error::SequenceOverrun { declared: 5 })
    ));
}

#[test]
fn test_sequence_with_malformed_child_fails() {
    let bytes = [0x35, 0x02, 0x18, 0x00];
    assert!(matches!(DataElement::from_bytes(&bytes), Err(Error::InvalidSize { .. })));
}

#[test]
fn test_nesting_limit() {
    // Three nested sequences around a nil
    let bytes = [0x35, 0x05, 0x35, 0x03, 0x35, 0x01, 0x00];
    assert!(DataElement::decode_with(&bytes, &DecoderConfig::with_max_depth(3)).is_ok());
    assert!(matches!(
        DataElement::decode_with(&bytes, &DecoderConfig::with_max_depth(2)),
        Err(Error::NestingTooDeep(2))
    ));
}

#[test]
fn test_length_limit() {
    let config = DecoderConfig {
        max_element_len: 2,
        ..DecoderConfig::default()
    };
    assert!(matches!(
        DataElement::decode_with(&[0x25, 0x03, b'a', b'b', b'c'], &config),
        Err(Error::LengthTooLarge { length: 3, limit: 2 })
    ));
}

#[test]
fn test_failure_does_not_disturb_siblings() {
    // good, bad (UUID with size 1), good
    let bytes = [0x08, 0x01, 0x18, 0x00, 0x08, 0x02];
    let mut reader = DataElementReader::new(&bytes);
    let first = reader.read_element().unwrap();
    assert!(reader.read_element().is_err());
    assert_eq!(reader.offset(), 2);
    assert_eq!(reader.skip_element().unwrap(), 2);
    let third = reader.read_element().unwrap();
    assert_eq!(first.value(), &Value::Unsigned(1));
    assert_eq!(third.value(), &Value::Unsigned(2));
}

#[test]
fn test_skip_past_element_with_bad_payload() {
    // A well-formed sequence header whose payload nests too deep, then a good sibling
    let bytes = [0x35, 0x03, 0x35, 0x01, 0x00, 0x08, 0x05];
    let mut reader = DataElementReader::with_config(&bytes, DecoderConfig::with_max_depth(1));
    assert!(matches!(reader.read_element(), Err(Error::NestingTooDeep(1))));
    assert_eq!(reader.offset(), 0);
    assert_eq!(reader.skip_element().unwrap(), 5);
    assert_eq!(reader.read_element().unwrap().value(), &Value::Unsigned(5));
    assert!(reader.is_empty());
}

#[test]
fn test_skip_fails_without_moving_on_unknown_extent() {
    let bytes = [0x25, 0x09, b'a'];
    let mut reader = DataElementReader::new(&bytes);
    assert!(reader.skip_element().is_err());
    assert_eq!(reader.offset(), 0);
}

#[test]
fn test_reader_iterator_stops_after_failure() {
    let bytes = [0x08, 0x01, 0x0A, 0x00, 0x08, 0x02];
    let results: Vec<_> = DataElementReader::new(&bytes).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

// --- Encoding ---

#[test]
fn test_smallest_size_is_chosen() {
    assert_eq!(DataElement::new(42u32).to_bytes().unwrap(), vec![0x08, 0x2A]);
    assert_eq!(DataElement::new(10000u32).to_bytes().unwrap(), vec![0x09, 0x27, 0x10]);
    assert_eq!(DataElement::new(0x10000u32).size(), SizeIndex::Size4);
    assert_eq!(DataElement::new(u64::MAX).size(), SizeIndex::Size8);
    assert_eq!(DataElement::new(u128::MAX).size(), SizeIndex::Size16);
    assert_eq!(DataElement::new(-1i32).to_bytes().unwrap(), vec![0x10, 0xFF]);
    assert_eq!(DataElement::new(-129i32).to_bytes().unwrap(), vec![0x11, 0xFF, 0x7F]);
    assert_eq!(DataElement::new(true).to_bytes().unwrap(), vec![0x28, 0x01]);
    assert_eq!(DataElement::new(Value::Nil).to_bytes().unwrap(), vec![0x00]);
    assert_eq!(
        DataElement::new(uuids::SERIAL_PORT).to_bytes().unwrap(),
        vec![0x19, 0x11, 0x01]
    );
    assert_eq!(DataElement::new(Uuid::from_u32(0x12345678)).size(), SizeIndex::Size4);
}

#[test]
fn test_explicit_size_is_honoured() {
    let element = DataElement::with_size(10000u32, SizeIndex::Size4).unwrap();
    assert_eq!(element.to_bytes().unwrap(), vec![0x0A, 0x00, 0x00, 0x27, 0x10]);

    let element = DataElement::with_size(uuids::SERIAL_PORT, SizeIndex::Size16).unwrap();
    assert_eq!(element.encoded_len(), 17);

    let element = DataElement::with_size("hi", SizeIndex::Var16).unwrap();
    assert_eq!(element.to_bytes().unwrap(), vec![0x26, 0x00, 0x02, b'h', b'i']);
}

#[test]
fn test_explicit_size_rejections() {
    assert!(matches!(
        DataElement::with_size(0x1_0000u32, SizeIndex::Size2),
        Err(Error::ValueOutOfRange(_))
    ));
    assert!(matches!(
        DataElement::with_size(200i32, SizeIndex::Size1),
        Err(Error::ValueOutOfRange(_))
    ));
    assert!(matches!(
        DataElement::with_size("text", SizeIndex::Size4),
        Err(Error::InvalidSize { .. })
    ));
    let vendor: Uuid = "6E400001-B5A3-F393-E0A9-E50E24DCCA9E".parse().unwrap();
    assert!(DataElement::with_size(vendor, SizeIndex::Size2).is_err());
}

#[test]
fn test_sequence_encoding_prefixes_children_length() {
    let sequence = DataElement::new(Value::sequence([uuids::L2CAP, uuids::RFCOMM]));
    assert_eq!(
        sequence.to_bytes().unwrap(),
        vec![0x35, 0x06, 0x19, 0x01, 0x00, 0x19, 0x00, 0x03]
    );

    let long_text = "x".repeat(300);
    let element = DataElement::new(long_text.as_str());
    assert_eq!(element.size(), SizeIndex::Var16);
    assert_eq!(&element.to_bytes().unwrap()[..3], &[0x26, 0x01, 0x2C]);
}

#[test]
fn test_var32_payloads_round_trip_with_default_limits() {
    let text = DataElement::new(Value::Text(vec![b'a'; 70_000]));
    assert_eq!(text.size(), SizeIndex::Var32);
    let bytes = text.to_bytes().unwrap();
    assert_eq!(&bytes[..5], &[0x27, 0x00, 0x01, 0x11, 0x70]);
    assert_eq!(DataElement::from_bytes(&bytes).unwrap(), text);

    let url = DataElement::new(Value::url("u".repeat(70_000)));
    assert_eq!(url.size(), SizeIndex::Var32);
    let decoded = DataElement::from_bytes(&url.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.value(), url.value());

    let sequence = DataElement::new(Value::sequence((0..20_000u32).map(|n| n | 0x1_0000)));
    assert_eq!(sequence.size(), SizeIndex::Var32);
    let decoded = DataElement::from_bytes(&sequence.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.value().as_sequence().unwrap().len(), 20_000);
}

#[test]
fn test_decoded_element_reencodes_identically() {
    let bytes = serial_port_record_bytes();
    let element = DataElement::from_bytes(&bytes).unwrap();
    assert_eq!(element.to_bytes().unwrap(), bytes);
}

// --- Round-trip properties ---

#[derive(Debug, Clone)]
struct ScalarValue(Value);

impl Arbitrary for ScalarValue {
    fn arbitrary(g: &mut Gen) -> Self {
        let value = match u8::arbitrary(g) % 9 {
            0 => Value::Nil,
            1 => Value::Unsigned(u128::arbitrary(g) >> (u8::arbitrary(g) % 128)),
            2 => Value::Signed(i128::arbitrary(g) >> (u8::arbitrary(g) % 127)),
            3 => Value::Uuid(Uuid::from_u16(u16::arbitrary(g))),
            4 => Value::Uuid(Uuid::from_u128(u128::arbitrary(g))),
            5 => Value::Text(Vec::<u8>::arbitrary(g)),
            6 => Value::Url(String::arbitrary(g).into_bytes()),
            7 => Value::Boolean(bool::arbitrary(g)),
            _ => Value::Uuid(Uuid::from_u32(u32::arbitrary(g))),
        };
        ScalarValue(value)
    }
}

#[quickcheck]
fn prop_scalar_round_trip(value: ScalarValue) -> bool {
    let element = DataElement::new(value.0.clone());
    let bytes = element.to_bytes().unwrap();
    let decoded = DataElement::from_bytes(&bytes).unwrap();
    decoded.value() == &value.0 && decoded.encoded_len() == bytes.len()
}

#[quickcheck]
fn prop_unsigned_round_trip_at_every_width(v: u64) -> bool {
    [SizeIndex::Size1, SizeIndex::Size2, SizeIndex::Size4, SizeIndex::Size8, SizeIndex::Size16]
        .into_iter()
        .filter_map(|size| DataElement::with_size(v, size).ok())
        .all(|element| {
            let bytes = element.to_bytes().unwrap();
            let decoded = DataElement::from_bytes(&bytes).unwrap();
            decoded.value() == &Value::Unsigned(v as u128) && decoded.size() == element.size()
        })
}

#[quickcheck]
fn prop_signed_round_trip_at_every_width(v: i64) -> bool {
    [SizeIndex::Size1, SizeIndex::Size2, SizeIndex::Size4, SizeIndex::Size8, SizeIndex::Size16]
        .into_iter()
        .filter_map(|size| DataElement::with_size(v, size).ok())
        .all(|element| {
            let bytes = element.to_bytes().unwrap();
            DataElement::from_bytes(&bytes).unwrap().value() == &Value::Signed(v as i128)
        })
}

#[quickcheck]
fn prop_truncation_never_panics(value: ScalarValue, cut: usize) -> bool {
    let bytes = DataElement::new(value.0).to_bytes().unwrap();
    let cut = cut % bytes.len();
    DataElement::from_bytes(&bytes[..cut]).is_err()
}

#[quickcheck]
fn prop_arbitrary_bytes_never_panic(bytes: Vec<u8>) -> bool {
    let _ = DataElement::from_bytes(&bytes);
    let _ = parse_attribute_list(&bytes, &DecoderConfig::default());
    true
}

// --- Attribute lists and records ---

#[test]
fn test_parse_attribute_list() {
    let list = parse_attribute_list(&serial_port_record_bytes(), &DecoderConfig::default()).unwrap();
    assert!(list.is_complete());
    let ids: Vec<u16> = list.attributes.iter().map(ServiceAttribute::id).collect();
    assert_eq!(ids, vec![0x0000, 0x0001, 0x0004, 0x0100]);
}

#[test]
fn test_attribute_list_skips_bad_value_and_keeps_siblings() {
    let bytes = vec![
        0x35, 0x0F, //
        0x09, 0x00, 0x00, 0x08, 0x01, // handle = 1
        0x09, 0x00, 0x03, 0x35, 0x02, 0x18, 0x00, // ServiceID: malformed UUID
        0x09, 0x00, 0x07, // TTL follows
        0x28, 0x01,
    ];
    // outer length covers 15 bytes; the trailing boolean stays outside
    let list = parse_attribute_list(&bytes[..17], &DecoderConfig::default()).unwrap();
    let ids: Vec<u16> = list.attributes.iter().map(ServiceAttribute::id).collect();
    assert_eq!(ids, vec![0x0000]);
    assert_eq!(list.failures.len(), 2);
    assert!(matches!(list.failures[0], Error::BadValue { id: 0x0003, .. }));

    let bytes = vec![
        0x35, 0x11, //
        0x09, 0x00, 0x00, 0x08, 0x01, //
        0x09, 0x00, 0x03, 0x35, 0x02, 0x18, 0x00, //
        0x09, 0x00, 0x07, 0x08, 0x10,
    ];
    let list = parse_attribute_list(&bytes, &DecoderConfig::default()).unwrap();
    let ids: Vec<u16> = list.attributes.iter().map(ServiceAttribute::id).collect();
    assert_eq!(ids, vec![0x0000, 0x0007]);
    assert_eq!(list.failures.len(), 1);
}

#[test]
fn test_attribute_list_recovers_after_value_with_bad_payload() {
    let bytes = vec![
        0x35, 0x12, //
        0x09, 0x00, 0x00, 0x08, 0x01, // handle = 1
        0x09, 0x00, 0x04, 0x35, 0x03, 0x35, 0x01, 0x00, // nested past the limit
        0x09, 0x00, 0x07, 0x08, 0x10, // TTL
    ];
    let config = DecoderConfig::with_max_depth(1);

    let list = parse_attribute_list(&bytes, &config).unwrap();
    let ids: Vec<u16> = list.attributes.iter().map(ServiceAttribute::id).collect();
    assert_eq!(ids, vec![0x0000, 0x0007]);
    assert_eq!(list.attributes[1].value(), &Value::Unsigned(0x10));
    assert_eq!(list.failures.len(), 1);
    match &list.failures[0] {
        Error::BadValue { id, source } => {
            assert_eq!(*id, 0x0004);
            assert!(matches!(source.as_deref(), Some(Error::NestingTooDeep(1))));
        }
        other => panic!("unexpected failure {:?}", other),
    }

    let (record, failures) = ServiceRecord::from_attribute_list(&bytes, &host(), &config).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(record.value(0x0007), Some(&Value::Unsigned(0x10)));
    assert!(record.attribute(0x0004).is_none());
}

#[test]
fn test_attribute_list_rejects_non_u16_ids() {
    let bytes = vec![0x35, 0x04, 0x08, 0x01, 0x08, 0x02];
    let list = parse_attribute_list(&bytes, &DecoderConfig::default()).unwrap();
    assert!(list.attributes.is_empty());
    assert!(matches!(list.failures[0], Error::InvalidPacket(_)));

    let lenient = DecoderConfig {
        strict_attribute_ids: false,
        ..DecoderConfig::default()
    };
    let list = parse_attribute_list(&bytes, &lenient).unwrap();
    assert_eq!(list.attributes[0].id(), 1);
}

#[test]
fn test_attribute_list_must_be_a_sequence() {
    assert!(parse_attribute_list(&[0x08, 0x01], &DecoderConfig::default()).is_err());
}

#[test]
fn test_encode_attribute_list_round_trip() {
    let attributes = vec![
        ServiceAttribute::new(SERVICE_RECORD_HANDLE, Value::Unsigned(0x0001_0005)),
        ServiceAttribute::new(SERVICE_CLASS_ID_LIST, Value::sequence([uuids::AUDIO_SINK])),
        ServiceAttribute::new(0x0100, "Sink"),
    ];
    let bytes = encode_attribute_list(&attributes).unwrap();
    let list = parse_attribute_list(&bytes, &DecoderConfig::default()).unwrap();
    assert_eq!(list.attributes, attributes);
}

#[test]
fn test_record_from_attribute_list() {
    let device = host();
    let (record, failures) =
        ServiceRecord::from_attribute_list(&serial_port_record_bytes(), &device, &DecoderConfig::default())
            .unwrap();
    assert!(failures.is_empty());
    assert_eq!(record.id(), Some(0x0001_0005));
    assert!(record.is_complete());
    assert_eq!(record.service_class_ids(), vec![uuids::SERIAL_PORT]);
    assert_eq!(record.rfcomm_channel(), Some(3));
    assert_eq!(record.service_name(), Some("SPP"));
    assert_eq!(record.host_device().unwrap().address, device.address);

    let descriptors = record.protocol_descriptors();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors[0].protocol, uuids::L2CAP);
    assert!(descriptors[0].parameters.is_empty());
    assert_eq!(descriptors[1].parameters, vec![Value::Unsigned(3)]);
}

#[test]
fn test_sorted_attributes_ignore_arrival_order() {
    let record = ServiceRecord::new(
        vec![
            ServiceAttribute::new(0x0100, "Name"),
            ServiceAttribute::new(SERVICE_CLASS_ID_LIST, Value::sequence([uuids::HANDSFREE])),
            ServiceAttribute::new(0x0009, Value::Nil),
            ServiceAttribute::new(SERVICE_RECORD_HANDLE, 0x0001_0000u32),
        ],
        &host(),
    );

    let arrival: Vec<u16> = record.attributes().iter().map(ServiceAttribute::id).collect();
    assert_eq!(arrival, vec![0x0100, 0x0001, 0x0009, 0x0000]);

    let sorted: Vec<u16> = record.sorted_attributes().map(ServiceAttribute::id).collect();
    assert_eq!(sorted, vec![0x0000, 0x0001, 0x0009, 0x0100]);
    assert!(sorted.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(record.value(0x0009), Some(&Value::Nil));
    assert!(record.attribute(0x0002).is_none());
}

#[test]
fn test_duplicate_attribute_replaces_in_place() {
    let record = ServiceRecord::new(
        vec![
            ServiceAttribute::new(0x0001, 1u8),
            ServiceAttribute::new(0x0000, 7u32),
            ServiceAttribute::new(0x0001, 2u8),
        ],
        &host(),
    );
    assert_eq!(record.len(), 2);
    assert_eq!(record.attributes()[0].value(), &Value::Unsigned(2));
    assert_eq!(record.id(), Some(7));
}

#[test]
fn test_record_without_handle_is_incomplete() {
    let record = ServiceRecord::new(vec![ServiceAttribute::new(0x0001, Value::Nil)], &host());
    assert_eq!(record.id(), None);
    assert!(!record.is_complete());

    let record = ServiceRecord::new(vec![ServiceAttribute::new(0x0000, -5i32)], &host());
    assert_eq!(record.id(), None);
}

#[test]
fn test_record_does_not_keep_host_alive() {
    let device = host();
    let record = ServiceRecord::new(Vec::new(), &device);
    assert!(record.is_empty());
    drop(device);
    assert!(record.host_device().is_none());
}

#[test]
fn test_search_pattern_matching() {
    let (record, _) = ServiceRecord::from_attribute_list(
        &serial_port_record_bytes(),
        &host(),
        &DecoderConfig::default(),
    )
    .unwrap();
    assert!(record.matches(&[uuids::SERIAL_PORT]));
    assert!(record.matches(&[uuids::SERIAL_PORT, uuids::RFCOMM, uuids::L2CAP]));
    assert!(!record.matches(&[uuids::SERIAL_PORT, uuids::OBEX]));
    assert!(record.matches(&[]));
}

#[test]
fn test_record_is_shareable_across_threads() {
    let (record, _) = ServiceRecord::from_attribute_list(
        &serial_port_record_bytes(),
        &host(),
        &DecoderConfig::default(),
    )
    .unwrap();
    let record = Arc::new(record);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let record = Arc::clone(&record);
            std::thread::spawn(move || record.sorted_attributes().count())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
}

#[test]
fn test_record_display_lists_sorted_attributes() {
    let device = host();
    let record = ServiceRecord::new(
        vec![
            ServiceAttribute::new(SERVICE_CLASS_ID_LIST, Value::sequence([uuids::SERIAL_PORT])),
            ServiceAttribute::new(SERVICE_RECORD_HANDLE, 0x10000u32),
        ],
        &device,
    );
    let text = record.to_string();
    assert!(text.starts_with("Service record 0x00010000 from 00:11:22:33:44:55"));
    let handle_at = text.find("ServiceRecordHandle").unwrap();
    let class_at = text.find("ServiceClassIDList").unwrap();
    assert!(handle_at < class_at);
    assert!(text.contains("uuid Uuid(0x1101)"));
}

// --- PDU framing ---

#[test]
fn test_service_search_request_encoding() {
    let bytes =
        encode_service_search_request(0x0001, &[uuids::SERIAL_PORT], 10, &ContinuationState::default())
            .unwrap();
    assert_eq!(
        bytes,
        vec![0x02, 0x00, 0x01, 0x00, 0x08, 0x35, 0x03, 0x19, 0x11, 0x01, 0x00, 0x0A, 0x00]
    );
}

#[test]
fn test_service_search_attribute_request_encoding() {
    let bytes = encode_service_search_attribute_request(
        7,
        &[uuids::AUDIO_SINK],
        0x0400,
        &[ALL_ATTRIBUTES],
        &ContinuationState::default(),
    )
    .unwrap();
    let packet = SdpPacket::deserialize(&bytes).unwrap();
    assert_eq!(packet.pdu_id, SdpPdu::ServiceSearchAttributeRequest);
    assert_eq!(packet.transaction_id, 7);
    assert_eq!(
        packet.parameters,
        vec![
            0x35, 0x03, 0x19, 0x11, 0x0B, // pattern
            0x04, 0x00, // max bytes
            0x35, 0x05, 0x0A, 0x00, 0x00, 0xFF, 0xFF, // 0x0000..=0xFFFF
            0x00,
        ]
    );
}

#[test]
fn test_service_attribute_request_encoding() {
    let bytes = encode_service_attribute_request(
        3,
        0x0001_0005,
        0x00FF,
        &[AttributeIdRange::Single(SERVICE_CLASS_ID_LIST)],
        &ContinuationState(vec![0xAA]),
    )
    .unwrap();
    let packet = SdpPacket::deserialize(&bytes).unwrap();
    assert_eq!(packet.pdu_id, SdpPdu::ServiceAttributeRequest);
    assert_eq!(&packet.parameters[..6], &[0x00, 0x01, 0x00, 0x05, 0x00, 0xFF]);
    assert_eq!(&packet.parameters[6..], &[0x35, 0x03, 0x09, 0x00, 0x01, 0x01, 0xAA]);
}

#[test]
fn test_parse_service_search_response() {
    let packet = SdpPacket::new(
        SdpPdu::ServiceSearchResponse,
        1,
        vec![0x00, 0x02, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00],
    );
    let response = parse_service_search_response(&packet).unwrap();
    assert_eq!(response.total_records, 2);
    assert_eq!(response.handles, vec![0x0001_0000, 0x0001_0001]);
    assert!(response.continuation.is_empty());

    let short = SdpPacket::new(SdpPdu::ServiceSearchResponse, 1, vec![0x00, 0x02, 0x00, 0x02, 0x00]);
    assert!(parse_service_search_response(&short).is_err());
}

#[test]
fn test_parse_search_attribute_response_into_records() {
    let record = serial_port_record_bytes();
    let mut lists = vec![0x35, record.len() as u8];
    lists.extend_from_slice(&record);

    let mut parameters = (lists.len() as u16).to_be_bytes().to_vec();
    parameters.extend_from_slice(&lists);
    parameters.push(0x00);
    let wire = SdpPacket::new(SdpPdu::ServiceSearchAttributeResponse, 9, parameters)
        .serialize()
        .unwrap();

    let packet = SdpPacket::deserialize(&wire).unwrap().check_error().unwrap();
    let response = parse_attribute_response(&packet).unwrap();
    assert!(response.continuation.is_empty());

    let parsed = parse_attribute_lists(&response.attribute_bytes, &DecoderConfig::default()).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].attributes.len(), 4);
}

#[test]
fn test_error_response() {
    let wire = [0x01, 0x00, 0x05, 0x00, 0x02, 0x00, 0x02];
    let packet = SdpPacket::deserialize(&wire).unwrap();
    assert!(matches!(
        packet.check_error(),
        Err(Error::Protocol(SdpErrorCode::InvalidServiceRecordHandle))
    ));
}

#[test]
fn test_packet_rejections() {
    assert!(SdpPacket::deserialize(&[0x02, 0x00]).is_err());
    assert!(SdpPacket::deserialize(&[0x09, 0x00, 0x01, 0x00, 0x00]).is_err());
    assert!(SdpPacket::deserialize(&[0x03, 0x00, 0x01, 0x00, 0x04, 0x00]).is_err());
}
