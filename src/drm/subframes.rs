use crate::drm::{uv_from_bytes, CropRect, DrmError, Stream, UvBounds};
use glam::Vec2;

const OBJECT_ANIMATION_STRIDE: usize = 0x0C;
const OBJECT_SUBFRAME_OFFSET: usize = 0x10;
const OBJECT_SUBFRAME_STRIDE: usize = 0x10;

/// Level animation coordinates are stored with the framebuffer half of VRAM included.
const VRAM_X_BIAS: u16 = 0x200;

/// One frame of an object texture animation: the material switches to a
/// different CLUT, page and UV triangle.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSubframe {
    pub clut: u16,
    pub texture_page: u16,

    /// Starts with the subframe's own three corners. Frames of other materials
    /// that share the texture are appended in groups of three.
    pub uvs: Vec<Vec2>,
    pub base_material_address: u32,
    pub subframe_index: usize,
}

impl ObjectSubframe {
    pub fn crop_rect(&self) -> Option<CropRect> {
        UvBounds::from_uvs(self.uvs.iter().copied()).map(|b| b.crop_rect())
    }
}

pub fn read_object_subframes(stream: &Stream, offset: u32) -> Result<Vec<ObjectSubframe>, DrmError> {
    if offset == 0 {
        return Ok(Vec::new());
    }

    stream.seek(offset as usize);
    let count = stream.read_u32()? as usize;

    // no more frames than records fit in the archive
    let limit = stream.data.len() / OBJECT_SUBFRAME_STRIDE;

    let mut subframes = Vec::new();
    for i in 0..count {
        stream.seek(offset as usize + 4 + i * OBJECT_ANIMATION_STRIDE);
        let material_address = stream.read_u32()?;
        let mut subframe_count = stream.read_u32()? as usize;

        if subframes.len() + subframe_count > limit {
            tracing::warn!("object subframes at {:#x} exceed {} records, ignoring the rest", offset, limit);
            subframe_count = limit - subframes.len();
        }

        for n in 0..subframe_count {
            stream.seek(material_address as usize + OBJECT_SUBFRAME_OFFSET + n * OBJECT_SUBFRAME_STRIDE);
            let (clut, texture_page, uvs) = read_material_record(stream)?;
            subframes.push(ObjectSubframe {
                clut,
                texture_page,
                uvs: uvs.to_vec(),
                base_material_address: material_address,
                subframe_index: n,
            });
        }
    }

    tracing::debug!("read {} object subframes at {:#x}", subframes.len(), offset);
    Ok(subframes)
}

/// `u0 v0 clut u1 v1 texture_page u2 v2` at the cursor.
pub fn read_material_record(stream: &Stream) -> Result<(u16, u16, [Vec2; 3]), DrmError> {
    let u0 = stream.read_u8()?;
    let v0 = stream.read_u8()?;
    let clut = stream.read_u16()?;
    let u1 = stream.read_u8()?;
    let v1 = stream.read_u8()?;
    let texture_page = stream.read_u16()?;
    let u2 = stream.read_u8()?;
    let v2 = stream.read_u8()?;

    Ok((clut, texture_page, [uv_from_bytes(u0, v0), uv_from_bytes(u1, v1), uv_from_bytes(u2, v2)]))
}

/// Rectangle in VRAM pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VramRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl VramRect {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        let (left, top) = (self.x as usize, self.y as usize);
        x >= left && x < left + self.width as usize && y >= top && y < top + self.height as usize
    }
}

/// One destination rectangle of a level animation and the source corner it copies from on each frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSubframe {
    pub dest: VramRect,
    pub sources: Vec<(u16, u16)>,

    /// Set while decoding a page that reads from `dest`.
    pub exports_this: bool,
}

/// Every level animation patches two rectangles per frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelAnimation {
    pub halves: [LevelSubframe; 2],
}

impl LevelAnimation {
    pub fn frame_count(&self) -> usize {
        self.halves[0].sources.len()
    }

    pub fn exports(&self) -> bool {
        self.halves.iter().any(|h| h.exports_this)
    }

    pub fn clear_flags(&mut self) {
        for half in self.halves.iter_mut() {
            half.exports_this = false;
        }
    }
}

fn read_vram_rect(stream: &Stream) -> Result<VramRect, DrmError> {
    Ok(VramRect {
        x: stream.read_u16()?.wrapping_sub(VRAM_X_BIAS),
        y: stream.read_u16()?,
        width: stream.read_u16()?,
        height: stream.read_u16()?,
    })
}

pub fn read_level_animations(stream: &Stream, offset: u32) -> Result<Vec<LevelAnimation>, DrmError> {
    if offset == 0 {
        return Ok(Vec::new());
    }

    stream.seek(offset as usize);
    let count = stream.read_u32()? as usize;

    let mut animations = Vec::new();
    for i in 0..count {
        stream.seek(offset as usize + 4 + i * 4);
        let address = stream.read_u32()?;

        stream.seek(address as usize);
        let first = read_vram_rect(stream)?;
        let second = read_vram_rect(stream)?;
        stream.skip(8);
        let frames = stream.read_u32()? as usize;
        stream.skip(4);

        let mut first_sources = Vec::new();
        let mut second_sources = Vec::new();
        for _ in 0..frames {
            let sx1 = stream.read_u16()?.wrapping_sub(VRAM_X_BIAS);
            let sy1 = stream.read_u16()?;
            let sx2 = stream.read_u16()?.wrapping_sub(VRAM_X_BIAS);
            let sy2 = stream.read_u16()?;
            first_sources.push((sx1, sy1));
            second_sources.push((sx2, sy2));
        }

        animations.push(LevelAnimation {
            halves: [
                LevelSubframe { dest: first, sources: first_sources, exports_this: false },
                LevelSubframe { dest: second, sources: second_sources, exports_this: false },
            ],
        });
    }

    tracing::debug!("read {} level animations at {:#x}", animations.len(), offset);
    Ok(animations)
}
