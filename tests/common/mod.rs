//! Synthetic archives for the integration tests

#![allow(dead_code)]

use drm_tools::drm::{DrmError, DrmFile, Image, TextureMemory, VRAM_HEIGHT, VRAM_WIDTH};
use drm_tools::export::TextureSink;
use std::rc::Rc;

/// Builds the addressable part of an archive. Offsets are relative to the base.
pub struct ArchiveBuilder {
    data: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        ArchiveBuilder { data: Vec::new() }
    }

    pub fn bytes(&mut self, at: usize, bytes: &[u8]) -> &mut Self {
        if self.data.len() < at + bytes.len() {
            self.data.resize(at + bytes.len(), 0);
        }
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn u16(&mut self, at: usize, v: u16) -> &mut Self {
        self.bytes(at, &v.to_le_bytes())
    }

    pub fn u32(&mut self, at: usize, v: u32) -> &mut Self {
        self.bytes(at, &v.to_le_bytes())
    }

    /// `u0 v0 clut u1 v1 texture_page u2 v2`
    pub fn material(&mut self, at: usize, clut: u16, page: u16, uvs: [(u8, u8); 3]) -> &mut Self {
        self.bytes(at, &[uvs[0].0, uvs[0].1])
            .u16(at + 2, clut)
            .bytes(at + 4, &[uvs[1].0, uvs[1].1])
            .u16(at + 6, page)
            .bytes(at + 8, &[uvs[2].0, uvs[2].1])
    }

    /// Prepends a header whose base offset is 0x800.
    pub fn finish(&self) -> Vec<u8> {
        let mut raw = vec![0u8; 0x800];
        raw.extend_from_slice(&self.data);
        raw
    }
}

pub const PALETTE_CLUT: u16 = 256 << 6;
pub const SECOND_PALETTE_CLUT: u16 = 257 << 6;
pub const OBJECT_MODEL: u32 = 0x100;

/// One object named GEX and a level with two animations, one of which
/// patches the level textures. The level has two textured materials on the
/// same page with different palettes.
pub fn sample_builder() -> ArchiveBuilder {
    let mut b = ArchiveBuilder::new();
    let uvs = [(0, 0), (3, 0), (0, 1)];

    // level pointer, object table
    b.u32(0x000, 0x300).u32(0x03C, 0x40);
    b.u32(0x040, 0x60).u32(0x044, 0x40);

    // object entry with a single sub-object
    b.u16(0x068, 1).u32(0x06C, 0x90).u32(0x084, 0xA0);
    b.u32(0x090, OBJECT_MODEL);
    b.bytes(0x0A0, b"GEX\0");

    // object model
    b.u16(0x100, 3).u32(0x104, 0x140)
        .u16(0x110, 1).u32(0x114, 0x180);
    b.u16(0x140, 1).u16(0x14C, 2).u16(0x158, 3);
    b.bytes(0x180, &[0, 0, 1, 0, 2, 0, 0, 0x02]).u32(0x188, 0x1C0);
    b.material(0x1C0, PALETTE_CLUT, 0, uvs);

    // level header
    b.u32(0x318, 3).u32(0x31C, 3)
        .u32(0x324, 0x340).u32(0x328, 0x380)
        .u32(0x330, 0x400);
    b.u16(0x34C, 10).u16(0x358, 20);
    // textured polygon, then an invisible one
    b.bytes(0x380, &[0, 0, 1, 0, 2, 0, 0, 0x00]).u32(0x390, 0x3C0);
    b.bytes(0x394, &[0, 0, 1, 0, 2, 0, 0, 0x80]).u32(0x3A4, 0x3C0);
    b.material(0x3C0, PALETTE_CLUT, 0, uvs);
    b.bytes(0x3A8, &[0, 0, 1, 0, 2, 0, 0, 0x00]).u32(0x3B8, 0x3D0);
    b.material(0x3D0, SECOND_PALETTE_CLUT, 0, uvs);

    // level animations
    b.u32(0x400, 2).u32(0x404, 0x420).u32(0x408, 0x460);

    // animation over the texture words of rows 0 and 1, two frames. The
    // second frame's row 1 source lies outside VRAM and copies nothing.
    b.u16(0x420, 0x200).u16(0x422, 0).u16(0x424, 1).u16(0x426, 1)
        .u16(0x428, 0x200).u16(0x42A, 1).u16(0x42C, 1).u16(0x42E, 1)
        .u32(0x438, 2)
        .u16(0x440, 0x210).u16(0x442, 0).u16(0x444, 0x212).u16(0x446, 0)
        .u16(0x448, 0x211).u16(0x44A, 0).u16(0x44C, 0x200 + 600).u16(0x44E, 0);

    // animation elsewhere in VRAM
    b.u16(0x460, 0x200 + 300).u16(0x462, 300).u16(0x464, 2).u16(0x466, 2)
        .u16(0x468, 0x200 + 300).u16(0x46A, 310).u16(0x46C, 1).u16(0x46E, 1)
        .u32(0x478, 1)
        .u16(0x480, 0x200).u16(0x482, 0).u16(0x484, 0x200).u16(0x486, 0);

    b
}

pub fn drm_file(name: &str, raw: Vec<u8>) -> DrmFile {
    DrmFile { filename: name.into(), data: Rc::from(raw) }
}

pub fn sample_drm() -> DrmFile {
    drm_file("LEVEL.drm", sample_builder().finish())
}

/// Palette entry `i` is colour `i` in both palettes, so red reads as `index << 3`.
pub fn sample_vram_pixels() -> Vec<u16> {
    let mut pixels = vec![0u16; VRAM_WIDTH * VRAM_HEIGHT];
    pixels[0] = 0x4321;
    pixels[16] = 0x5555;
    pixels[17] = 0x6666;
    pixels[18] = 0x7777;
    for i in 0..16 {
        pixels[256 * VRAM_WIDTH + i] = i as u16;
        pixels[257 * VRAM_WIDTH + i] = i as u16;
    }
    pixels
}

pub fn sample_vram() -> TextureMemory {
    TextureMemory::from_pixels(sample_vram_pixels().into_boxed_slice()).unwrap()
}

/// `.vrm` file bytes for the sample texture memory.
pub fn sample_vrm_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 20];
    for p in sample_vram_pixels() {
        bytes.extend_from_slice(&p.to_le_bytes());
    }
    bytes
}

/// Keeps every texture in memory. Stems listed in `fail` are rejected.
#[derive(Default)]
pub struct MemorySink {
    pub textures: Vec<(String, Image)>,
    pub fail: Vec<String>,
}

impl MemorySink {
    pub fn stems(&self) -> Vec<&str> {
        self.textures.iter().map(|(s, _)| s.as_str()).collect()
    }

    pub fn get(&self, stem: &str) -> &Image {
        &self.textures.iter().find(|(s, _)| s == stem).unwrap().1
    }
}

impl TextureSink for MemorySink {
    fn write_texture(&mut self, stem: &str, image: &Image) -> Result<(), DrmError> {
        if self.fail.iter().any(|f| f == stem) {
            return Err(DrmError::TextureWriteFailed { stem: stem.to_string(), reason: "rejected".into() });
        }
        self.textures.push((stem.to_string(), image.clone()));
        Ok(())
    }
}
