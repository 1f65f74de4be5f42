use crate::drm::{DrmError, Stream, Vertex, NO_INDEX};
use glam::{I16Vec3, IVec3};

pub const BONE_STRIDE: usize = 0x18;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bone {
    pub v_first: u16,
    pub v_last: u16,
    pub local: IVec3,

    /// Index of the parent bone. A bone that is its own parent is a root.
    pub parent: u16,

    /// Sum of the local translations from this bone up to its root.
    pub world: IVec3,
}

impl Bone {
    /// Owns no vertices and ends any chain that reaches it.
    pub const SENTINEL: Bone = Bone {
        v_first: NO_INDEX,
        v_last: NO_INDEX,
        local: IVec3::ZERO,
        parent: NO_INDEX,
        world: IVec3::ZERO,
    };

    pub fn owns_vertices(&self) -> bool {
        self.v_first != NO_INDEX && self.v_last != NO_INDEX
    }
}

/// Reads `count` bone records and resolves their world translations.
///
/// Parents may appear after their children, so every slot exists before any
/// chain is walked.
pub fn read_armature(stream: &Stream, count: usize, offset: u32) -> Result<Vec<Bone>, DrmError> {
    if count == 0 || offset == 0 {
        return Ok(Vec::new());
    }

    // the record table must exist before sizing anything from `count`
    stream.seek(offset as usize + count.saturating_sub(1) * BONE_STRIDE);
    stream.read_bytes(BONE_STRIDE)?;

    let mut bones = vec![Bone::SENTINEL; count];
    for (i, bone) in bones.iter_mut().enumerate() {
        stream.seek(offset as usize + i * BONE_STRIDE);
        stream.skip(8);
        bone.v_first = stream.read_u16()?;
        bone.v_last = stream.read_u16()?;
        let x = stream.read_i16()?;
        let y = stream.read_i16()?;
        let z = stream.read_i16()?;
        bone.local = I16Vec3::new(x, y, z).as_ivec3();
        bone.parent = stream.read_u16()?;
    }

    resolve_world_translations(&mut bones)?;
    tracing::debug!("resolved {} bones at {:#x}", bones.len(), offset);
    Ok(bones)
}

/// Walks each vertex-owning bone's parent chain and accumulates local translations.
pub fn resolve_world_translations(bones: &mut [Bone]) -> Result<(), DrmError> {
    let count = bones.len();

    for i in 0..count {
        if !bones[i].owns_vertices() {
            continue;
        }

        let mut world = IVec3::ZERO;
        let mut ancestor = i;
        let mut steps = 0;
        loop {
            if steps == count {
                return Err(DrmError::MalformedArmature { bone: i });
            }
            steps += 1;

            let bone = &bones[ancestor];
            world += bone.local;

            let parent = bone.parent as usize;
            if parent == ancestor || bone.parent == NO_INDEX {
                break;
            }
            if parent >= count {
                return Err(DrmError::MalformedArmature { bone: i });
            }
            ancestor = parent;
        }

        bones[i].world = world;
    }

    Ok(())
}

/// Translates every owned vertex by its bone's world translation.
/// Vertices no bone owns keep their raw position. Overlapping ranges stack
/// and wrap in 32 bits.
pub fn apply_armature(vertices: &mut [Vertex], bones: &[Bone]) -> Result<(), DrmError> {
    let count = vertices.len();

    for (b, bone) in bones.iter().enumerate() {
        if !bone.owns_vertices() {
            continue;
        }

        let first = bone.v_first as usize;
        let last = bone.v_last as usize;
        if last >= count {
            return Err(DrmError::VertexOutOfRange { index: last, count });
        }

        // an inverted range owns nothing
        for vertex in vertices.iter_mut().take(last + 1).skip(first) {
            vertex.position = vertex.position.wrapping_add(bone.world);
            vertex.bone = Some(b as u16);
        }
    }

    Ok(())
}
