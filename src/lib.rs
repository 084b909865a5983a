//! Predicts the ETag an S3-compatible store reports for an object.
//!
//! Objects uploaded in a single request get the MD5 of their content.
//! Multipart uploads get the MD5 of the concatenated part digests followed
//! by `-<parts>`. Both forms depend only on the bytes and the part size.
//!
//! ## Example
//!
//! ```
//! use chunketag::ChunkSize;
//!
//! let etag = chunketag::compute(b"hello");
//! assert_eq!(format!("{:x}", etag), "5d41402abc4b2a76b9719d911017c592");
//!
//! let etag = chunketag::compute_with_chunk_size(b"abcde", ChunkSize::new(4).unwrap());
//! assert_eq!(etag.to_string(), "aa933d75a4a9ae385721c4e8444e1eec-2");
//! ```
//!

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, trace};

mod chunk_size;
mod error;

pub use chunk_size::ChunkSize;
pub use error::{ChunkSizeError, Error};

/// 32 hex digits, a dash and up to 20 decimal digits.
const MAX_LEN: usize = 53;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Etag {
    hash: [u8; 16],
    parts: usize,
}

impl Etag {
    #[inline]
    pub fn hash(&self) -> &[u8; 16] {
        &self.hash
    }

    /// Number of parts; 1 for single-part objects, including empty ones.
    #[inline]
    pub fn parts(&self) -> usize {
        self.parts
    }

    #[inline]
    pub fn is_multipart(&self) -> bool {
        self.parts > 1
    }
}

impl core::convert::From<Etag> for [u8; 16] {
    #[inline]
    fn from(etag: Etag) -> Self {
        etag.hash
    }
}

macro_rules! implement {
    ($kind:ident, $format:expr) => {
        impl core::fmt::$kind for Etag {
            fn fmt(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                use core::fmt::Write;

                let mut text = String::with_capacity(MAX_LEN);
                for value in &self.hash {
                    write!(text, $format, value)?;
                }
                if self.is_multipart() {
                    write!(text, "-{}", self.parts)?;
                }
                formatter.pad(&text)
            }
        }
    };
}

implement!(LowerHex, "{:02x}");
implement!(UpperHex, "{:02X}");

impl core::fmt::Display for Etag {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::LowerHex::fmt(self, f)
    }
}

impl core::ops::Deref for Etag {
    type Target = [u8; 16];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.hash
    }
}

/// Streaming ETag state.
///
/// A part is closed as soon as it holds `chunk_size` bytes. The digest of
/// the first part is kept aside until a second non-empty part shows up;
/// only then does the object become multipart.
#[derive(Clone)]
pub struct Context {
    part: md5::Context,
    part_len: u64,
    first: Option<[u8; 16]>,
    whole: Option<md5::Context>,
    chunk_size: u64,
    parts: usize,
    total_bytes: u64,
}

impl Context {
    #[inline]
    pub fn new() -> Self {
        Self::with_chunk_size(ChunkSize::DEFAULT)
    }

    #[inline]
    pub fn with_chunk_size(chunk_size: ChunkSize) -> Self {
        Self {
            part: md5::Context::new(),
            part_len: 0,
            first: None,
            whole: None,
            chunk_size: chunk_size.get(),
            parts: 0,
            total_bytes: 0,
        }
    }

    pub fn consume<T: AsRef<[u8]>>(&mut self, data: T) {
        let data = data.as_ref();
        self.total_bytes += data.len() as u64;
        let mut remaining = data;

        while !remaining.is_empty() {
            let space_left = self.chunk_size - self.part_len;
            let to_take = usize::try_from(space_left)
                .map_or(remaining.len(), |space| remaining.len().min(space));

            self.part.consume(&remaining[..to_take]);
            self.part_len += to_take as u64;
            remaining = &remaining[to_take..];

            if self.part_len == self.chunk_size {
                self.close_part();
            }
        }
    }

    fn close_part(&mut self) {
        let sum = std::mem::replace(&mut self.part, md5::Context::new()).finalize().0;
        self.part_len = 0;
        self.parts += 1;
        trace!(part = self.parts, "part closed");

        if let Some(whole) = self.whole.as_mut() {
            whole.consume(sum);
        } else if let Some(first) = self.first {
            let mut whole = md5::Context::new();
            whole.consume(first);
            whole.consume(sum);
            self.whole = Some(whole);
        } else {
            self.first = Some(sum);
        }
    }

    pub fn finalize(mut self) -> Etag {
        if self.part_len > 0 {
            self.close_part();
        }

        match (self.whole, self.first) {
            (Some(whole), _) => Etag {
                hash: whole.finalize().0,
                parts: self.parts,
            },
            (None, Some(first)) => Etag {
                hash: first,
                parts: 1,
            },
            // nothing consumed
            (None, None) => Etag {
                hash: self.part.finalize().0,
                parts: 1,
            },
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

impl Default for Context {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::convert::From<Context> for Etag {
    #[inline]
    fn from(ctx: Context) -> Self {
        ctx.finalize()
    }
}

impl std::io::Write for Context {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.consume(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Compute the ETag of data with the default chunk size (8 MiB).
#[inline]
pub fn compute<T: AsRef<[u8]>>(data: T) -> Etag {
    let mut ctx = Context::new();
    ctx.consume(data);
    ctx.finalize()
}

/// Compute the ETag of data with the given chunk size.
#[inline]
pub fn compute_with_chunk_size<T: AsRef<[u8]>>(data: T, chunk_size: ChunkSize) -> Etag {
    let mut ctx = Context::with_chunk_size(chunk_size);
    ctx.consume(data);
    ctx.finalize()
}

/// Stream `reader` to end of input and compute its ETag.
pub fn compute_reader<R: Read>(mut reader: R, chunk_size: ChunkSize) -> io::Result<Etag> {
    let mut ctx = Context::with_chunk_size(chunk_size);
    io::copy(&mut reader, &mut ctx)?;
    let bytes = ctx.total_bytes();
    let etag = ctx.finalize();
    debug!(bytes, parts = etag.parts(), "input exhausted");
    Ok(etag)
}

/// Compute the ETag of the file at `path`.
///
/// The file is read once, front to back, and closed before returning.
pub fn compute_file<P: AsRef<Path>>(path: P, chunk_size: ChunkSize) -> Result<Etag, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_owned(),
        source,
    })?;
    debug!(path = %path.display(), %chunk_size, "computing etag");

    let etag = compute_reader(file, chunk_size).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;
    debug!(path = %path.display(), %etag, "etag computed");
    Ok(etag)
}
