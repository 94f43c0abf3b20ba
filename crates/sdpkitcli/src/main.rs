//! sdpkit - inspect SDP data elements, service records and spool files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sdpkit::spool::{Direction, SpoolData};
use sdpkit::{BdAddr, DataElement, DecoderConfig, RemoteDevice, ServiceRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sdpkit")]
#[command(about = "Decode Bluetooth SDP data and walk spool files", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Maximum nesting of sequences and alternatives
    #[arg(long, global = true, default_value_t = sdpkit::config::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum declared length of a single data element
    #[arg(long, global = true, default_value_t = sdpkit::config::DEFAULT_MAX_ELEMENT_LEN)]
    max_element_len: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one data element and print its value tree
    Decode {
        /// Element bytes as hex
        hex: String,
    },

    /// Parse an attribute list into a service record
    Record {
        /// Attribute list bytes as hex
        hex: String,

        /// Print attributes in ascending ID order instead of arrival order
        #[arg(long)]
        sorted: bool,

        /// Address of the device that advertised the record
        #[arg(long, default_value = "00:00:00:00:00:00")]
        address: BdAddr,
    },

    /// Walk the pages and pictures of a spool file
    Spool {
        /// Spool file
        file: PathBuf,

        /// Walk from the last page and picture to the first
        #[arg(long)]
        reverse: bool,
    },
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&cleaned).with_context(|| format!("Invalid hex input '{}'", input))
}

fn decode(config: &DecoderConfig, input: &str) -> Result<()> {
    let bytes = parse_hex(input)?;
    let element = DataElement::decode_with(&bytes, config).context("Failed to decode data element")?;
    if element.encoded_len() < bytes.len() {
        log::warn!(
            "{} trailing bytes after the element",
            bytes.len() - element.encoded_len()
        );
    }
    print!("{}", element);
    Ok(())
}

fn record(config: &DecoderConfig, input: &str, sorted: bool, address: BdAddr) -> Result<()> {
    let bytes = parse_hex(input)?;
    let host = Arc::new(RemoteDevice::new(address));
    let (record, failures) = ServiceRecord::from_attribute_list(&bytes, &host, config)
        .context("Failed to parse attribute list")?;

    match record.id() {
        Some(handle) => println!("Handle: 0x{:08X}", handle),
        None => println!("Handle: none"),
    }
    if let Some(name) = record.service_name() {
        println!("Name: {}", name);
    }
    for uuid in record.service_class_ids() {
        println!("Class: {}", uuid);
    }
    if let Some(channel) = record.rfcomm_channel() {
        println!("RFCOMM channel: {}", channel);
    }

    if sorted {
        for attribute in record.sorted_attributes() {
            print!("{}", attribute);
        }
    } else {
        for attribute in record.attributes() {
            print!("{}", attribute);
        }
    }

    for failure in &failures {
        eprintln!("Failure: {}", failure);
    }
    if !record.is_complete() {
        log::warn!("Record lacks ServiceRecordHandle or ServiceClassIDList");
    }
    Ok(())
}

fn spool(file: &Path, reverse: bool) -> Result<()> {
    let mut spool = SpoolData::open_file(file, Direction::from_reverse(reverse))
        .with_context(|| format!("Failed to open spool {}", file.display()))?;
    println!(
        "Spool version {}, {} of {} pages readable",
        spool.header().version,
        spool.page_count(),
        spool.header().page_count
    );

    spool.start_enum();
    while let Some(page) = spool.enum_object() {
        println!("Page {} ({} pictures)", page.number(), page.picture_count());
        page.start_enum();
        while let Some(picture) = page.enum_object() {
            println!(
                "  at ({}, {}) bounds ({}, {}, {}, {}) {} bytes",
                picture.point.x,
                picture.point.y,
                picture.rect.left,
                picture.rect.top,
                picture.rect.right,
                picture.rect.bottom,
                picture.payload.len()
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = DecoderConfig {
        max_depth: cli.max_depth,
        max_element_len: cli.max_element_len,
        ..DecoderConfig::default()
    };

    match cli.command {
        Commands::Decode { hex } => decode(&config, &hex),
        Commands::Record {
            hex,
            sorted,
            address,
        } => record(&config, &hex, sorted, address),
        Commands::Spool { file, reverse } => spool(&file, reverse),
    }
}
