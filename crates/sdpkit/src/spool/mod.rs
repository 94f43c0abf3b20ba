//! Print spool page/picture walker
//!
//! A spool file holds a chain of pages, each a list of picture records. The
//! walker reads the page chain once when the spool is opened and then hands
//! out pages and pictures through restartable single-pass cursors. Pictures
//! are read from the file only when they are enumerated.

pub mod format;

pub use format::{PictureData, Point, Rect, SpoolWriter};

use crate::error::{Error, Result};
use format::{FileHeader, PageHeader, END_OF_CHAIN, PAGE_HEADER_SIZE, PICTURE_HEADER_SIZE, SPOOL_VERSION};
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Order in which pages and pictures are handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

/// Single-pass cursor over `len` slots
#[derive(Debug, Clone, Copy)]
struct EnumCursor {
    len: usize,
    taken: usize,
    direction: Direction,
}

impl EnumCursor {
    fn new(len: usize, direction: Direction) -> Self {
        Self {
            len,
            taken: 0,
            direction,
        }
    }

    fn reset(&mut self) {
        self.taken = 0;
    }

    /// Stop handing out slots until the next reset
    fn finish(&mut self) {
        self.taken = self.len;
    }

    fn advance(&mut self) -> Option<usize> {
        if self.taken >= self.len {
            return None;
        }
        let index = match self.direction {
            Direction::Forward => self.taken,
            Direction::Reverse => self.len - 1 - self.taken,
        };
        self.taken += 1;
        Some(index)
    }
}

fn lock<R>(source: &Mutex<R>) -> Result<MutexGuard<'_, R>> {
    source
        .lock()
        .map_err(|_| Error::Io(io::Error::new(io::ErrorKind::Other, "spool source lock poisoned")))
}

/// One page of a spool and a cursor over its pictures
#[derive(Debug)]
pub struct PageData<R> {
    source: Arc<Mutex<R>>,
    number: usize,
    offset: u64,
    /// File offsets of the picture records, in file order
    pictures: Vec<u64>,
    cursor: EnumCursor,
}

impl<R: Read + Seek> PageData<R> {
    /// Read a page header and index its picture records
    ///
    /// Returns the page and the offset of the next page in the chain. A
    /// picture header that cannot be read ends the index; the pictures
    /// before it stay enumerable.
    fn load(
        source: &Arc<Mutex<R>>,
        number: usize,
        offset: u64,
        direction: Direction,
    ) -> Result<(Self, u64)> {
        let mut reader = lock(source)?;
        reader.seek(SeekFrom::Start(offset))?;
        let header = PageHeader::read_from(&mut *reader)?;

        let mut pictures = Vec::new();
        let mut position = offset + PAGE_HEADER_SIZE;
        for index in 0..header.picture_count {
            match PictureData::read_header(&mut *reader) {
                Ok((_, _, payload_len)) => {
                    pictures.push(position);
                    position += PICTURE_HEADER_SIZE + payload_len as u64;
                    reader.seek(SeekFrom::Start(position))?;
                }
                Err(e) => {
                    warn!(
                        "Page {}: picture {} of {} unreadable, indexing stopped: {}",
                        number, index, header.picture_count, e
                    );
                    break;
                }
            }
        }
        drop(reader);

        debug!(
            "Page {} at offset {} with {} pictures",
            number,
            offset,
            pictures.len()
        );
        let page = Self {
            source: Arc::clone(source),
            number,
            offset,
            cursor: EnumCursor::new(pictures.len(), direction),
            pictures,
        };
        Ok((page, header.next_page_offset))
    }

    /// Position of this page in the page chain, starting at 0
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }

    /// Rewind the picture cursor
    pub fn start_enum(&mut self) {
        self.cursor.reset();
    }

    /// Read the next picture, or `None` once the page is exhausted
    ///
    /// A picture that cannot be read ends the enumeration.
    pub fn enum_object(&mut self) -> Option<PictureData> {
        let index = self.cursor.advance()?;
        match self.read_picture(self.pictures[index]) {
            Ok(picture) => Some(picture),
            Err(e) => {
                warn!(
                    "Page {}: picture {} unreadable, ending enumeration: {}",
                    self.number, index, e
                );
                self.cursor.finish();
                None
            }
        }
    }

    /// Rewind the picture cursor and iterate over every picture of the page
    pub fn pictures(&mut self) -> impl Iterator<Item = PictureData> + '_ {
        self.start_enum();
        std::iter::from_fn(move || self.enum_object())
    }

    fn read_picture(&self, offset: u64) -> Result<PictureData> {
        let mut reader = lock(&self.source)?;
        reader.seek(SeekFrom::Start(offset))?;
        PictureData::read_from(&mut *reader)
    }
}

/// An opened spool: its pages and a cursor over them
#[derive(Debug)]
pub struct SpoolData<R> {
    header: FileHeader,
    direction: Direction,
    pages: Vec<PageData<R>>,
    cursor: EnumCursor,
}

impl<R: Read + Seek> SpoolData<R> {
    /// Read the file header and walk the page chain
    ///
    /// Only an unreadable file header is an error. The chain ends at the
    /// first page that cannot be read, or that does not lie after the one
    /// before it.
    pub fn open(mut source: R, direction: Direction) -> Result<Self> {
        source.seek(SeekFrom::Start(0))?;
        let header = FileHeader::read_from(&mut source)?;
        if header.version != SPOOL_VERSION {
            warn!("Spool version {} differs from {}", header.version, SPOOL_VERSION);
        }

        let source = Arc::new(Mutex::new(source));
        let mut pages = Vec::new();
        let mut offset = header.first_page_offset;
        let mut previous = None;

        while offset != END_OF_CHAIN && pages.len() < header.page_count as usize {
            if previous.is_some_and(|prev| offset <= prev) {
                warn!("Page chain points backwards to offset {}, stopping", offset);
                break;
            }
            match PageData::load(&source, pages.len(), offset, direction) {
                Ok((page, next)) => {
                    pages.push(page);
                    previous = Some(offset);
                    offset = next;
                }
                Err(e) => {
                    warn!("Page {} at offset {} unreadable: {}", pages.len(), offset, e);
                    break;
                }
            }
        }

        if pages.len() < header.page_count as usize {
            warn!(
                "Spool declares {} pages, found {}",
                header.page_count,
                pages.len()
            );
        }

        Ok(Self {
            header,
            direction,
            cursor: EnumCursor::new(pages.len(), direction),
            pages,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Pages found in the chain, in file order
    pub fn pages(&self) -> &[PageData<R>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Rewind the page cursor
    pub fn start_enum(&mut self) {
        self.cursor.reset();
    }

    /// Next page, or `None` once every page has been handed out
    pub fn enum_object(&mut self) -> Option<&mut PageData<R>> {
        let index = self.cursor.advance()?;
        self.pages.get_mut(index)
    }
}

impl SpoolData<BufReader<File>> {
    pub fn open_file(path: impl AsRef<Path>, direction: Direction) -> Result<Self> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file), direction)
    }
}
