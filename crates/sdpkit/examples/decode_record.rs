use sdpkit::sdp::constants::uuids;
use sdpkit::sdp::{encode_attribute_list, ServiceAttribute, Value};
use sdpkit::{BdAddr, DecoderConfig, RemoteDevice, ServiceRecord};
use std::error::Error;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Build the attribute list a serial port service would advertise
    let attributes = vec![
        ServiceAttribute::new(0x0000, Value::Unsigned(0x0001_0005)),
        ServiceAttribute::new(0x0001, Value::sequence([uuids::SERIAL_PORT])),
        ServiceAttribute::new(
            0x0004,
            Value::sequence([
                Value::sequence([uuids::L2CAP]),
                Value::sequence([Value::from(uuids::RFCOMM), Value::from(3u8)]),
            ]),
        ),
        ServiceAttribute::new(0x0100, "Serial Port"),
    ];
    let bytes = encode_attribute_list(&attributes)?;
    println!("Wire bytes: {}", hex::encode(&bytes));

    // Decode it again as if it came from a remote device
    let device: BdAddr = "00:1A:7D:DA:71:13".parse()?;
    let host = Arc::new(RemoteDevice::new(device).with_name("Phone"));
    let (record, failures) =
        ServiceRecord::from_attribute_list(&bytes, &host, &DecoderConfig::default())?;

    println!("{}", record);
    println!("Service name: {:?}", record.service_name());
    println!("RFCOMM channel: {:?}", record.rfcomm_channel());
    println!("Failures: {}", failures.len());

    Ok(())
}
