use crate::drm::{
    apply_armature, decode_texture_page, normalize_material_uvs, read_armature, read_level_animations,
    read_object_subframes, read_polygons, read_vertices, DrmError, Image, LevelAnimation, Material,
    MaterialInterner, MaterialKind, ModelFormat, Polygon, Stream, TextureMemory, VramWorkspace,
};

/// A fully decoded model: armature applied, UVs normalised, textures decoded.
#[derive(Clone, Debug)]
pub struct Model {
    pub name: String,
    pub format: ModelFormat,
    pub polygons: Vec<Polygon>,
    pub materials: Vec<Material>,

    /// Base textures followed by their animation frames, in material order.
    pub textures: Vec<ModelTexture>,
}

#[derive(Clone, Debug)]
pub struct ModelTexture {
    pub material: usize,
    /// 1-based animation frame, `None` for the base texture.
    pub subframe: Option<usize>,
    pub stem: String,
    pub image: Image,
}

/// The polygons drawn with one material.
pub struct MaterialMesh<'a> {
    pub material_index: usize,
    pub material: &'a Material,
    pub polygons: Vec<&'a Polygon>,
}

impl Model {
    /// Polygons grouped by material, in material order.
    pub fn meshes(&self) -> Vec<MaterialMesh<'_>> {
        self.materials.iter()
            .enumerate()
            .map(|(material_index, material)| MaterialMesh {
                material_index,
                material,
                polygons: self.polygons.iter().filter(|p| p.material == material_index).collect(),
            })
            .filter(|mesh| !mesh.polygons.is_empty())
            .collect()
    }
}

/// `{object}-tex{slot+1}`, with `-{subframe}` for animation frames.
pub fn texture_stem(object: &str, texture_slot: usize, subframe: Option<usize>) -> String {
    match subframe {
        Some(subframe) => format!("{}-tex{}-{}", object, texture_slot + 1, subframe),
        None => format!("{}-tex{}", object, texture_slot + 1),
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectModelHeader {
    pub vertex_count: u16,
    pub vertex_start: u32,
    pub polygon_count: u16,
    pub polygon_start: u32,
    pub bone_count: u16,
    pub bone_start: u32,
    pub texture_animations_start: u32,
}

impl ObjectModelHeader {
    pub fn read(stream: &Stream, address: u32) -> Result<Self, DrmError> {
        stream.seek(address as usize);
        let vertex_count = stream.read_u16()?;
        stream.skip(2);
        let vertex_start = stream.read_u32()?;
        stream.skip(8);
        let polygon_count = stream.read_u16()?;
        stream.skip(2);
        let polygon_start = stream.read_u32()?;
        let bone_count = stream.read_u16()?;
        stream.skip(2);
        let bone_start = stream.read_u32()?;
        let texture_animations_start = stream.read_u32()?;

        Ok(ObjectModelHeader {
            vertex_count,
            vertex_start,
            polygon_count,
            polygon_start,
            bone_count,
            bone_start,
            texture_animations_start,
        })
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelHeader {
    pub bsp_tree_start: u32,
    pub vertex_count: u32,
    pub polygon_count: u32,
    pub vertex_colour_count: u32,
    pub vertex_start: u32,
    pub polygon_start: u32,
    pub vertex_colour_start: u32,
    pub material_start: u32,
}

impl LevelHeader {
    /// The level header is found through the first word of the archive.
    pub fn read(stream: &Stream) -> Result<Self, DrmError> {
        stream.seek(0);
        let address = stream.read_u32()?;
        stream.seek(address as usize);

        let bsp_tree_start = stream.read_u32()?;
        stream.skip(0x14);
        Ok(LevelHeader {
            bsp_tree_start,
            vertex_count: stream.read_u32()?,
            polygon_count: stream.read_u32()?,
            vertex_colour_count: stream.read_u32()?,
            vertex_start: stream.read_u32()?,
            polygon_start: stream.read_u32()?,
            vertex_colour_start: stream.read_u32()?,
            material_start: stream.read_u32()?,
        })
    }
}

pub fn extract_object_model(
    stream: &Stream,
    name: &str,
    address: u32,
    vram: &TextureMemory,
) -> Result<Model, DrmError> {
    let header = ObjectModelHeader::read(stream, address)?;
    tracing::debug!("{} header {:?}", name, header);

    let mut vertices = read_vertices(stream, header.vertex_count as usize, header.vertex_start)?;
    let bones = read_armature(stream, header.bone_count as usize, header.bone_start)?;
    apply_armature(&mut vertices, &bones)?;

    let subframes = read_object_subframes(stream, header.texture_animations_start)?;

    let mut materials = MaterialInterner::new();
    let polygons = read_polygons(
        stream,
        ModelFormat::Object,
        header.polygon_count as usize,
        header.polygon_start,
        &vertices,
        &mut materials,
        &subframes,
    )?;

    build_model(name, ModelFormat::Object, polygons, materials.into_materials(), vram, Vec::new())
}

pub fn extract_level_model(stream: &Stream, name: &str, vram: &TextureMemory) -> Result<Model, DrmError> {
    let header = LevelHeader::read(stream)?;
    tracing::debug!("{} header {:?}", name, header);

    let vertices = read_vertices(stream, header.vertex_count as usize, header.vertex_start)?;
    let animations = read_level_animations(stream, header.material_start)?;

    let mut materials = MaterialInterner::new();
    let polygons = read_polygons(
        stream,
        ModelFormat::Level,
        header.polygon_count as usize,
        header.polygon_start,
        &vertices,
        &mut materials,
        &[],
    )?;

    build_model(name, ModelFormat::Level, polygons, materials.into_materials(), vram, animations)
}

/// Normalises UVs and decodes every texture of the model, material by material.
fn build_model(
    name: &str,
    format: ModelFormat,
    mut polygons: Vec<Polygon>,
    mut materials: Vec<Material>,
    vram: &TextureMemory,
    mut level_animations: Vec<LevelAnimation>,
) -> Result<Model, DrmError> {
    let mut workspace = VramWorkspace::new(vram);
    let mut textures = Vec::new();

    for (m, material) in materials.iter_mut().enumerate() {
        let MaterialKind::Textured { clut, texture_page, texture_slot } = material.kind else { continue };
        let Some(crop) = normalize_material_uvs(&mut polygons, m) else { continue };

        let image = decode_texture_page(&workspace, texture_page, clut, crop, &mut level_animations)?;
        textures.push(ModelTexture {
            material: m,
            subframe: None,
            stem: texture_stem(name, texture_slot, None),
            image: image.clone(),
        });
        material.texture = Some(image);

        // each frame starts from pristine VRAM with only its own rectangles patched in
        let mut frame_number = 0;
        for animation in level_animations.iter_mut() {
            if animation.exports() {
                for frame in 0..animation.frame_count() {
                    workspace.reset_working();
                    for half in animation.halves.iter() {
                        let Some(&(src_x, src_y)) = half.sources.get(frame) else { continue };
                        let dest = half.dest;
                        workspace.copy_rect(dest.x, dest.y, dest.width, dest.height, src_x, src_y, true);
                    }

                    frame_number += 1;
                    let image = decode_texture_page(&workspace, texture_page, clut, crop, &mut [])?;
                    textures.push(ModelTexture {
                        material: m,
                        subframe: Some(frame_number),
                        stem: texture_stem(name, texture_slot, Some(frame_number)),
                        image,
                    });
                }
            }
            animation.clear_flags();
        }
        if frame_number > 0 {
            workspace.reset_working();
        }

        for subframe in material.subframes.iter() {
            let Some(crop) = subframe.crop_rect() else { continue };
            let image = decode_texture_page(&workspace, subframe.texture_page, subframe.clut, crop, &mut [])?;
            let number = subframe.subframe_index + 1;
            textures.push(ModelTexture {
                material: m,
                subframe: Some(number),
                stem: texture_stem(name, texture_slot, Some(number)),
                image,
            });
        }
    }

    tracing::debug!("{}: {} polygons, {} materials, {} textures", name, polygons.len(), materials.len(), textures.len());
    Ok(Model { name: name.to_string(), format, polygons, materials, textures })
}
