mod objects;
pub use objects::*;

mod vertices;
pub use vertices::*;

mod armature;
pub use armature::*;

mod materials;
pub use materials::*;

mod polygons;
pub use polygons::*;

mod subframes;
pub use subframes::*;

mod uv;
pub use uv::*;

mod vram;
pub use vram::*;

mod textures;
pub use textures::*;

mod extract_model;
pub use extract_model::*;

use std::rc::Rc;
use thiserror::Error;

/// Sentinel for "no vertex range" and "end of parent chain" in bone records,
/// and for "no material" in level polygons.
pub const NO_INDEX: u16 = 0xFFFF;

#[derive(Error, Debug)]
pub enum DrmError {
    #[error("read of {len} bytes at {offset:#x} runs past the end of the archive")]
    TruncatedRead { offset: usize, len: usize },

    #[error("bone {bone} has an invalid or cyclic parent chain")]
    MalformedArmature { bone: usize },

    #[error("vertex {index} is outside the vertex table ({count} vertices)")]
    VertexOutOfRange { index: usize, count: usize },

    #[error("crop rectangle {0:?} does not fit a 256x256 texture page")]
    InvalidCropRect(CropRect),

    #[error("failed to write texture {stem}: {reason}")]
    TextureWriteFailed { stem: String, reason: String },

    #[error("output directory {0} is unavailable")]
    OutputDirectoryUnavailable(std::path::PathBuf),
}

#[derive(Clone, Debug)]
pub struct DrmFile {
    pub filename: Rc<str>,
    pub data: Rc<[u8]>,
}

impl DrmFile {
    /// Stream over the archive with the header's base offset applied.
    pub fn stream(&self) -> Result<Stream<'_>, DrmError> {
        Stream::from_archive(&self.data)
    }

    /// File name without directories or extension. Level geometry is named after this.
    pub fn stem(&self) -> &str {
        let name = self.filename.rsplit(['/', '\\']).next().unwrap_or(&*self.filename);
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }
}

/// The first word of a raw archive encodes where the addressable data starts.
/// The sum wraps in 32 bits.
pub fn archive_base_offset(header: u32) -> usize {
    ((header >> 9) << 11).wrapping_add(0x800) as usize
}

#[derive(Clone, Debug)]
pub struct Stream<'a> {
    pub data: &'a [u8],
    base: usize,

    // must be mutated while references live to data
    cursor: std::cell::Cell<usize>,
}

impl<'a> Stream<'a> {
    /// Stream over data whose offsets are already absolute.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, base: 0, cursor: std::cell::Cell::new(0) }
    }

    /// Stream over a raw archive. Offsets passed to `seek` and returned by
    /// `cursor` are relative to the base offset encoded in the header.
    pub fn from_archive(data: &'a [u8]) -> Result<Self, DrmError> {
        let header = Stream::new(data).read_u32()?;
        let base = archive_base_offset(header);
        tracing::debug!("archive base offset {:#x}", base);

        Ok(Self { data, base, cursor: std::cell::Cell::new(base) })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Absolute position minus the base offset.
    pub fn cursor(&self) -> usize {
        self.cursor.get() - self.base
    }

    pub fn seek(&self, pos: usize) {
        self.cursor.set(self.base.saturating_add(pos));
    }

    pub fn skip(&self, n: usize) {
        self.cursor.set(self.cursor.get().saturating_add(n));
    }

    pub fn read_bytes(&self, n: usize) -> Result<&'a [u8], DrmError> {
        let start = self.cursor.get();
        let bytes = start.checked_add(n)
            .and_then(|end| self.data.get(start..end))
            .ok_or(DrmError::TruncatedRead { offset: start - self.base.min(start), len: n })?;
        self.cursor.set(start + n);
        Ok(bytes)
    }

    #[inline(always)]
    pub fn read_const_bytes<const N: usize>(&self) -> Result<[u8; N], DrmError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&self) -> Result<u8, DrmError> {
        Ok(self.read_const_bytes::<1>()?[0])
    }

    pub fn read_u16(&self) -> Result<u16, DrmError> {
        self.read_const_bytes().map(u16::from_le_bytes)
    }

    pub fn read_i16(&self) -> Result<i16, DrmError> {
        self.read_const_bytes().map(i16::from_le_bytes)
    }

    pub fn read_u32(&self) -> Result<u32, DrmError> {
        self.read_const_bytes().map(u32::from_le_bytes)
    }

    /// Reads a fixed-width name field at `offset`, trimmed at the first NUL.
    /// The cursor is left where it was.
    pub fn read_name(&self, offset: usize, len: usize) -> Result<String, DrmError> {
        let ret = self.cursor.get();
        self.seek(offset);
        let bytes = self.read_bytes(len);
        self.cursor.set(ret);

        let bytes = bytes?;
        let bytes = match bytes.iter().position(|b| *b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
