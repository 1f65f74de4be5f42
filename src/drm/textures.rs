use crate::drm::{CropRect, DrmError, LevelAnimation, VramWorkspace, VRAM_HEIGHT, VRAM_WIDTH};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub rgba_data: Box<[[u8; 4]]>,
}

impl Image {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rgba_data)
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        self.rgba_data[y * self.width + x]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitDepth {
    /// 16 colour palette, four indices per word.
    Four,
    /// 256 colour palette, two indices per word.
    Eight,
    /// Each word is a colour.
    Direct,
}

impl BitDepth {
    pub fn from_raw(texture_page: u16) -> Self {
        match (texture_page >> 7) & 0x3 {
            0 => BitDepth::Four,
            1 => BitDepth::Eight,
            // 3 is reserved by the hardware
            _ => BitDepth::Direct,
        }
    }

    pub fn colour_limit(self) -> usize {
        match self {
            BitDepth::Four => 16,
            BitDepth::Eight => 256,
            BitDepth::Direct => 0,
        }
    }

    pub fn pixels_per_word(self) -> usize {
        match self {
            BitDepth::Four => 4,
            BitDepth::Eight => 2,
            BitDepth::Direct => 1,
        }
    }

    fn bits(self) -> u32 {
        16 / self.pixels_per_word() as u32
    }
}

/// Origin of a 256x256 texture page in VRAM.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TexturePage {
    pub x: usize,
    pub y: usize,
    pub depth: BitDepth,
}

impl TexturePage {
    pub fn from_raw(tp: u16) -> Self {
        let tp = tp as usize;
        TexturePage {
            x: ((tp << 6) & 0x07C0) % VRAM_WIDTH,
            y: ((tp << 4) & 0x0100) + ((tp >> 2) & 0x0200),
            depth: BitDepth::from_raw(tp as u16),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClutOrigin {
    pub x: usize,
    pub y: usize,
}

impl ClutOrigin {
    pub fn from_raw(clut: u16) -> Self {
        ClutOrigin {
            x: (((clut & 0x3F) as usize) << 4) % VRAM_WIDTH,
            y: (clut >> 6) as usize,
        }
    }
}

/// 15-bit BGR colour plus the semi-transparency bit. Alpha is binary: only an
/// all-zero word is transparent.
pub fn decode_clut_colour(pixel: u16) -> [u8; 4] {
    let r = ((pixel & 0x1F) << 3) as u8;
    let g = (((pixel >> 5) & 0x1F) << 3) as u8;
    let b = (((pixel >> 10) & 0x1F) << 3) as u8;
    let stp = pixel >> 15;

    let a = if r != 0 || g != 0 || b != 0 || stp != 0 { 255 } else { 0 };
    [r, g, b, a]
}

/// The `n`th pixel packed into `word`, low bits first.
pub fn unpack_index(word: u16, depth: BitDepth, n: usize) -> u16 {
    match depth {
        BitDepth::Direct => word,
        _ => {
            let bits = depth.bits();
            (word >> (bits * n as u32)) & ((1 << bits) - 1)
        }
    }
}

pub fn unpack_indices(word: u16, depth: BitDepth) -> impl Iterator<Item = u16> {
    (0..depth.pixels_per_word()).map(move |n| unpack_index(word, depth, n))
}

pub fn pack_indices(indices: &[u16], depth: BitDepth) -> u16 {
    let bits = depth.bits();
    indices.iter()
        .take(depth.pixels_per_word())
        .enumerate()
        .fold(0, |word, (n, &i)| word | (i << (bits * n as u32)))
}

fn vram_word(vram: &VramWorkspace, x: usize, y: usize) -> u16 {
    vram.get(x % VRAM_WIDTH, y).unwrap_or(0)
}

pub fn decode_palette(vram: &VramWorkspace, origin: ClutOrigin, count: usize) -> Box<[[u8; 4]]> {
    (0..count)
        .map(|i| decode_clut_colour(vram_word(vram, origin.x + i, origin.y)))
        .collect()
}

/// Decodes the cropped part of a texture page from the working VRAM.
///
/// Any level animation half whose destination the crop reads from is flagged
/// with `exports_this`.
pub fn decode_texture_page(
    vram: &VramWorkspace,
    texture_page: u16,
    clut: u16,
    crop: CropRect,
    level_animations: &mut [LevelAnimation],
) -> Result<Image, DrmError> {
    crop.validate()?;

    let page = TexturePage::from_raw(texture_page);
    let palette = match page.depth {
        BitDepth::Direct => None,
        depth => Some(decode_palette(vram, ClutOrigin::from_raw(clut), depth.colour_limit())),
    };
    let per_word = page.depth.pixels_per_word();

    let width = crop.width();
    let height = crop.height();
    let mut rgba_data = Vec::with_capacity(width * height);

    for y in crop.north..=crop.south {
        let vram_y = page.y + y as usize;
        for x in crop.left..=crop.right {
            let scans = crop.scans_animations(x, y);
            let x = x as usize;
            let vram_x = (page.x + x / per_word) % VRAM_WIDTH;
            let word = vram_word(vram, vram_x, vram_y);
            let index = unpack_index(word, page.depth, x % per_word);

            rgba_data.push(match &palette {
                Some(palette) => palette[index as usize],
                None => decode_clut_colour(index),
            });

            if scans && vram_y < VRAM_HEIGHT {
                flag_level_animations(level_animations, vram_x, vram_y);
            }
        }
    }

    Ok(Image { width, height, rgba_data: rgba_data.into_boxed_slice() })
}

fn flag_level_animations(level_animations: &mut [LevelAnimation], x: usize, y: usize) {
    for half in level_animations.iter_mut().flat_map(|a| a.halves.iter_mut()) {
        if !half.exports_this && half.dest.contains(x, y) {
            half.exports_this = true;
        }
    }
}
