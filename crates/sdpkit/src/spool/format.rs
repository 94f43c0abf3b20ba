//! On-disk spool layout
//!
//! All fields are little-endian. A spool file starts with a file header; pages
//! form a chain of offsets starting at `first_page_offset`, each page header
//! followed directly by its picture records.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Version written by `SpoolWriter`
pub const SPOOL_VERSION: u32 = 1;

/// version + page_count + first_page_offset
pub const FILE_HEADER_SIZE: u64 = 16;

/// picture_count + next_page_offset
pub const PAGE_HEADER_SIZE: u64 = 12;

/// point (2 x f32) + rect (4 x f32) + payload_len
pub const PICTURE_HEADER_SIZE: u64 = 28;

/// Page offset marking the end of the page chain
pub const END_OF_CHAIN: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u32,
    pub page_count: u32,
    pub first_page_offset: u64,
}

impl FileHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            version: reader.read_u32::<LittleEndian>()?,
            page_count: reader.read_u32::<LittleEndian>()?,
            first_page_offset: reader.read_u64::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.page_count)?;
        writer.write_u64::<LittleEndian>(self.first_page_offset)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub picture_count: u32,
    pub next_page_offset: u64,
}

impl PageHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            picture_count: reader.read_u32::<LittleEndian>()?,
            next_page_offset: reader.read_u64::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.picture_count)?;
        writer.write_u64::<LittleEndian>(self.next_page_offset)?;
        Ok(())
    }
}

/// Position of a picture on the page
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of a picture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// One picture record: where it goes, its bounds, and the opaque drawing
/// instructions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PictureData {
    pub point: Point,
    pub rect: Rect,
    pub payload: Vec<u8>,
}

impl PictureData {
    pub fn new(point: Point, rect: Rect, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            point,
            rect,
            payload: payload.into(),
        }
    }

    /// Read the fixed part of a picture record, returning the payload length
    pub(crate) fn read_header<R: Read>(reader: &mut R) -> Result<(Point, Rect, u32)> {
        let point = Point::new(
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
        );
        let rect = Rect::new(
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
        );
        let payload_len = reader.read_u32::<LittleEndian>()?;
        Ok((point, rect, payload_len))
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let (point, rect, payload_len) = Self::read_header(reader)?;
        // Grow with the data actually present rather than the declared length
        let mut payload = Vec::new();
        reader.by_ref().take(payload_len as u64).read_to_end(&mut payload)?;
        if payload.len() != payload_len as usize {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "picture payload declares {} bytes, {} present",
                    payload_len,
                    payload.len()
                ),
            )));
        }
        Ok(Self {
            point,
            rect,
            payload,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32::<LittleEndian>(self.point.x)?;
        writer.write_f32::<LittleEndian>(self.point.y)?;
        writer.write_f32::<LittleEndian>(self.rect.left)?;
        writer.write_f32::<LittleEndian>(self.rect.top)?;
        writer.write_f32::<LittleEndian>(self.rect.right)?;
        writer.write_f32::<LittleEndian>(self.rect.bottom)?;
        writer.write_u32::<LittleEndian>(self.payload.len() as u32)?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Bytes this record occupies in the file
    pub fn encoded_len(&self) -> u64 {
        PICTURE_HEADER_SIZE + self.payload.len() as u64
    }
}

/// Builds a spool file page by page
///
/// Pages are written back-to-back after the file header, in the order they
/// were added.
#[derive(Debug, Default)]
pub struct SpoolWriter {
    pages: Vec<Vec<PictureData>>,
}

impl SpoolWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, pictures: impl IntoIterator<Item = PictureData>) -> &mut Self {
        self.pages.push(pictures.into_iter().collect());
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write the whole spool, returning the number of bytes written
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let first_page_offset = if self.pages.is_empty() {
            END_OF_CHAIN
        } else {
            FILE_HEADER_SIZE
        };
        FileHeader {
            version: SPOOL_VERSION,
            page_count: self.pages.len() as u32,
            first_page_offset,
        }
        .write_to(writer)?;

        let mut offset = FILE_HEADER_SIZE;
        for (index, pictures) in self.pages.iter().enumerate() {
            let page_len: u64 =
                PAGE_HEADER_SIZE + pictures.iter().map(PictureData::encoded_len).sum::<u64>();
            let next_page_offset = if index + 1 == self.pages.len() {
                END_OF_CHAIN
            } else {
                offset + page_len
            };
            PageHeader {
                picture_count: pictures.len() as u32,
                next_page_offset,
            }
            .write_to(writer)?;
            for picture in pictures {
                picture.write_to(writer)?;
            }
            offset += page_len;
        }
        Ok(offset)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }
}
