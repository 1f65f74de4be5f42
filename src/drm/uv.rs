use crate::drm::{DrmError, Polygon};
use glam::Vec2;

/// Texture pages are 256x256, so UV bytes map onto 0..=255.
pub const PAGE_EXTENT: i32 = 255;

/// Converts a UV byte pair into unit space. V is stored top-down.
pub fn uv_from_bytes(u: u8, v: u8) -> Vec2 {
    Vec2::new(u as f32 / 255.0, (255 - v) as f32 / 255.0)
}

fn round_to_pixel(x: f32) -> i32 {
    (x * 255.0 + 0.5).floor() as i32
}

/// Inclusive pixel rectangle within a texture page. `north` is the top row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub left: i32,
    pub right: i32,
    pub south: i32,
    pub north: i32,
}

impl CropRect {
    pub fn validate(&self) -> Result<(), DrmError> {
        let in_page = |c: i32| (0..=PAGE_EXTENT).contains(&c);
        if self.right < self.left
            || self.south < self.north
            || ![self.left, self.right, self.south, self.north].into_iter().all(in_page)
        {
            return Err(DrmError::InvalidCropRect(*self));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        (self.right - self.left + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.south - self.north + 1) as usize
    }

    /// Texels checked against level animations. The last column and row are left out.
    pub fn scans_animations(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.north && y < self.south
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvBounds {
    pub fn from_uvs<I: IntoIterator<Item = Vec2>>(uvs: I) -> Option<UvBounds> {
        let mut uvs = uvs.into_iter();
        let first = uvs.next()?;
        Some(uvs.fold(UvBounds { min: first, max: first }, |b, uv| UvBounds {
            min: b.min.min(uv),
            max: b.max.max(uv),
        }))
    }

    /// Converts the bounds back into page pixels, flipping V again.
    pub fn crop_rect(&self) -> CropRect {
        CropRect {
            left: round_to_pixel(self.min.x),
            right: round_to_pixel(self.max.x),
            south: PAGE_EXTENT - round_to_pixel(self.min.y),
            north: PAGE_EXTENT - round_to_pixel(self.max.y),
        }
    }

    /// Maps the bounds onto the unit square. A zero-width axis collapses to 0.
    pub fn normalize(&self, uv: Vec2) -> Vec2 {
        let span = self.max - self.min;
        let axis = |value: f32, min: f32, span: f32| {
            if span == 0.0 { 0.0 } else { (value - min) / span }
        };
        Vec2::new(axis(uv.x, self.min.x, span.x), axis(uv.y, self.min.y, span.y))
    }
}

/// Normalises the UVs of every polygon using `material` and returns the crop
/// of their original bounds. `None` if no polygon uses the material.
pub fn normalize_material_uvs(polygons: &mut [Polygon], material: usize) -> Option<CropRect> {
    let bounds = UvBounds::from_uvs(
        polygons.iter()
            .filter(|p| p.material == material)
            .flat_map(|p| p.uvs)
    )?;

    for polygon in polygons.iter_mut().filter(|p| p.material == material) {
        for uv in polygon.uvs.iter_mut() {
            *uv = bounds.normalize(*uv);
        }
    }

    Some(bounds.crop_rect())
}
