use crate::drm::{DrmError, Stream};

pub const VRAM_WIDTH: usize = 512;
pub const VRAM_HEIGHT: usize = 512;
pub const VRM_HEADER_LEN: usize = 20;

/// The pristine texture memory image from a `.vrm` file. Never modified after loading.
#[derive(Clone, Debug)]
pub struct TextureMemory {
    pixels: Box<[u16]>,
}

impl TextureMemory {
    pub fn from_vrm(bytes: &[u8]) -> Result<Self, DrmError> {
        let stream = Stream::new(bytes);
        stream.seek(VRM_HEADER_LEN);
        let raw = stream.read_bytes(VRAM_WIDTH * VRAM_HEIGHT * 2)?;

        let pixels = raw.chunks_exact(2)
            .map(|p| u16::from_le_bytes([p[0], p[1]]))
            .collect();
        Ok(TextureMemory { pixels })
    }

    pub fn blank() -> Self {
        TextureMemory { pixels: vec![0u16; VRAM_WIDTH * VRAM_HEIGHT].into_boxed_slice() }
    }

    pub fn from_pixels(pixels: Box<[u16]>) -> Option<Self> {
        (pixels.len() == VRAM_WIDTH * VRAM_HEIGHT).then_some(TextureMemory { pixels })
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        vram_get(&self.pixels, x, y)
    }
}

fn vram_get(pixels: &[u16], x: usize, y: usize) -> Option<u16> {
    if x < VRAM_WIDTH && y < VRAM_HEIGHT {
        Some(pixels[y * VRAM_WIDTH + x])
    } else {
        None
    }
}

/// Working copy of texture memory that level animations patch before a page is decoded.
#[derive(Clone, Debug)]
pub struct VramWorkspace<'a> {
    pristine: &'a TextureMemory,
    working: Box<[u16]>,
}

impl<'a> VramWorkspace<'a> {
    pub fn new(pristine: &'a TextureMemory) -> Self {
        VramWorkspace { pristine, working: pristine.pixels.clone() }
    }

    pub fn reset_working(&mut self) {
        self.working.copy_from_slice(&self.pristine.pixels);
    }

    pub fn working(&self) -> &[u16] {
        &self.working
    }

    /// Working pixel, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        vram_get(&self.working, x, y)
    }

    /// Copies a `width` x `height` block from `(src_x, src_y)` to `(dst_x, dst_y)`
    /// within the working copy, row by row. Overlapping blocks see their own writes.
    /// Without `use_working_as_base` the working copy is reset first.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_rect(
        &mut self,
        dst_x: u16, dst_y: u16,
        width: u16, height: u16,
        src_x: u16, src_y: u16,
        use_working_as_base: bool,
    ) {
        if !use_working_as_base {
            self.reset_working();
        }

        for y in 0..height as usize {
            for x in 0..width as usize {
                let Some(value) = self.get(src_x as usize + x, src_y as usize + y) else { continue };
                let (dx, dy) = (dst_x as usize + x, dst_y as usize + y);
                if dx < VRAM_WIDTH && dy < VRAM_HEIGHT {
                    self.working[dy * VRAM_WIDTH + dx] = value;
                }
            }
        }
    }
}
