use crate::drm::{
    read_material_record, vertex_at, DrmError, MaterialInterner, ObjectSubframe, Stream, Vertex, NO_INDEX,
};
use glam::Vec2;

/// UV given to every corner of an untextured polygon.
pub const FLAT_UV: Vec2 = Vec2::new(0.0, 1.0);

const FLAG_TEXTURED: u8 = 0x02;
const FLAG_INVISIBLE: u8 = 0x80;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Object,
    Level,
}

impl ModelFormat {
    pub fn polygon_stride(self) -> usize {
        match self {
            ModelFormat::Object => 0x0C,
            ModelFormat::Level => 0x14,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Polygon {
    pub vertices: [Vertex; 3],
    /// Index into the model's materials.
    pub material: usize,
    pub uvs: [Vec2; 3],
}

/// Reads `count` polygons, interning their materials as they are met.
///
/// Object animation frames are attached to a textured object material when
/// it is first created.
pub fn read_polygons(
    stream: &Stream,
    format: ModelFormat,
    count: usize,
    offset: u32,
    vertices: &[Vertex],
    materials: &mut MaterialInterner,
    subframes: &[ObjectSubframe],
) -> Result<Vec<Polygon>, DrmError> {
    if count == 0 || offset == 0 {
        return Ok(Vec::new());
    }

    let mut polygons = Vec::new();
    for i in 0..count {
        stream.seek(offset as usize + i * format.polygon_stride());

        let v1 = vertex_at(vertices, stream.read_u16()?)?;
        let v2 = vertex_at(vertices, stream.read_u16()?)?;
        let v3 = vertex_at(vertices, stream.read_u16()?)?;
        stream.skip(1);
        let flags = stream.read_u8()?;

        let (material, uvs) = match format {
            ModelFormat::Object => read_object_material(stream, flags, materials, subframes)?,
            ModelFormat::Level => read_level_material(stream, flags, materials)?,
        };

        polygons.push(Polygon { vertices: [v1, v2, v3], material, uvs });
    }

    tracing::debug!("read {} polygons using {} materials", polygons.len(), materials.len());
    Ok(polygons)
}

fn read_object_material(
    stream: &Stream,
    flags: u8,
    materials: &mut MaterialInterner,
    subframes: &[ObjectSubframe],
) -> Result<(usize, [Vec2; 3]), DrmError> {
    if flags & FLAG_TEXTURED == 0 {
        let red = stream.read_u8()?;
        let green = stream.read_u8()?;
        let blue = stream.read_u8()?;
        return Ok((materials.intern_flat(red, green, blue, true), [FLAT_UV; 3]));
    }

    let address = stream.read_u32()?;
    stream.seek(address as usize);
    let (clut, texture_page, uvs) = read_material_record(stream)?;

    let (material, created) = materials.intern_textured(clut, texture_page, address);
    if created {
        materials.attach_object_subframes(material, subframes);
    }
    Ok((material, uvs))
}

fn read_level_material(
    stream: &Stream,
    flags: u8,
    materials: &mut MaterialInterner,
) -> Result<(usize, [Vec2; 3]), DrmError> {
    stream.skip(8);
    let address = stream.read_u32()?;

    if address == NO_INDEX as u32 || flags & FLAG_INVISIBLE != 0 {
        return Ok((materials.intern_flat(0, 0, 0, false), [FLAT_UV; 3]));
    }

    stream.seek(address as usize);
    let (clut, texture_page, uvs) = read_material_record(stream)?;
    let (material, _) = materials.intern_textured(clut, texture_page, address);
    Ok((material, uvs))
}
