use crate::drm::{DrmError, Stream};
use glam::{I16Vec3, IVec3, Vec3};

pub const VERTEX_STRIDE: usize = 0x0C;

/// Positions are fixed point, 1000 units to the exported unit.
pub const POSITION_SCALE: f32 = 1000.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Vertex {
    /// Position in the vertex table.
    pub index: u32,

    /// Translated in place by the owning bone.
    pub position: IVec3,
    pub raw: I16Vec3,
    pub normal: u16,
    pub bone: Option<u16>,
}

impl Vertex {
    pub fn new(index: u32, raw: I16Vec3, normal: u16) -> Self {
        Vertex { index, position: raw.as_ivec3(), raw, normal, bone: None }
    }

    pub fn export_position(&self) -> Vec3 {
        self.position.as_vec3() / POSITION_SCALE
    }
}

pub fn read_vertices(stream: &Stream, count: usize, offset: u32) -> Result<Vec<Vertex>, DrmError> {
    if count == 0 || offset == 0 {
        return Ok(Vec::new());
    }

    let mut vertices = Vec::new();
    for i in 0..count {
        stream.seek(offset as usize + i * VERTEX_STRIDE);
        let x = stream.read_i16()?;
        let y = stream.read_i16()?;
        let z = stream.read_i16()?;
        let normal = stream.read_u16()?;
        vertices.push(Vertex::new(i as u32, I16Vec3::new(x, y, z), normal));
    }

    tracing::debug!("read {} vertices at {:#x}", vertices.len(), offset);
    Ok(vertices)
}

/// Bounds checked lookup used when polygons reference vertices by index.
pub fn vertex_at(vertices: &[Vertex], index: u16) -> Result<Vertex, DrmError> {
    vertices.get(index as usize)
        .copied()
        .ok_or(DrmError::VertexOutOfRange { index: index as usize, count: vertices.len() })
}
