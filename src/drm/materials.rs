use crate::drm::{Image, ObjectSubframe};
use ahash::{HashMap, HashMapExt};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    Textured {
        clut: u16,
        texture_page: u16,
        /// Position among the textured materials of the model. Names the exported texture.
        texture_slot: usize,
    },
    Flat {
        red: u8,
        green: u8,
        blue: u8,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKey {
    Textured { clut: u16, texture_page: u16 },
    Flat { red: u8, green: u8, blue: u8 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub visible: bool,
    pub export_succeeded: bool,
    pub subframes: Vec<ObjectSubframe>,

    /// Base texture, once decoded.
    pub texture: Option<Image>,

    /// Address of the material record that created this material.
    pub source_address: Option<u32>,
}

impl Material {
    pub fn key(&self) -> MaterialKey {
        match self.kind {
            MaterialKind::Textured { clut, texture_page, .. } => MaterialKey::Textured { clut, texture_page },
            MaterialKind::Flat { red, green, blue } => MaterialKey::Flat { red, green, blue },
        }
    }

    pub fn texture_slot(&self) -> Option<usize> {
        match self.kind {
            MaterialKind::Textured { texture_slot, .. } => Some(texture_slot),
            MaterialKind::Flat { .. } => None,
        }
    }

    pub fn is_textured(&self) -> bool {
        self.texture_slot().is_some()
    }
}

/// Deduplicates materials by key, in the order they are first seen.
#[derive(Debug, Default)]
pub struct MaterialInterner {
    materials: Vec<Material>,
    lookup: HashMap<MaterialKey, usize>,
    textured_count: usize,
}

impl MaterialInterner {
    pub fn new() -> Self {
        MaterialInterner {
            materials: Vec::new(),
            lookup: HashMap::new(),
            textured_count: 0,
        }
    }

    /// -> (material index, newly created)
    pub fn intern_textured(&mut self, clut: u16, texture_page: u16, source_address: u32) -> (usize, bool) {
        let key = MaterialKey::Textured { clut, texture_page };
        if let Some(&index) = self.lookup.get(&key) {
            return (index, false);
        }

        let texture_slot = self.textured_count;
        self.textured_count += 1;
        let index = self.push(key, Material {
            kind: MaterialKind::Textured { clut, texture_page, texture_slot },
            visible: true,
            export_succeeded: true,
            subframes: Vec::new(),
            texture: None,
            source_address: Some(source_address),
        });
        (index, true)
    }

    /// Flat materials never take a texture slot.
    pub fn intern_flat(&mut self, red: u8, green: u8, blue: u8, visible: bool) -> usize {
        let key = MaterialKey::Flat { red, green, blue };
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }

        self.push(key, Material {
            kind: MaterialKind::Flat { red, green, blue },
            visible,
            export_succeeded: true,
            subframes: Vec::new(),
            texture: None,
            source_address: None,
        })
    }

    fn push(&mut self, key: MaterialKey, material: Material) -> usize {
        let index = self.materials.len();
        self.materials.push(material);
        self.lookup.insert(key, index);
        index
    }

    /// Attaches the animation frames that start at this material's record.
    ///
    /// Frame families of other materials that share the same texture contribute
    /// their UVs ordinal by ordinal, so each frame's crop covers every
    /// material drawn from it.
    pub fn attach_object_subframes(&mut self, material: usize, subframes: &[ObjectSubframe]) {
        let Some(this) = self.materials.get_mut(material) else { return };
        let (Some(address), MaterialKey::Textured { clut, texture_page }) = (this.source_address, this.key()) else {
            return;
        };

        let mut attached: Vec<ObjectSubframe> = subframes.iter()
            .filter(|s| s.base_material_address == address)
            .cloned()
            .enumerate()
            .map(|(n, s)| ObjectSubframe { subframe_index: n, ..s })
            .collect();

        if attached.is_empty() {
            return;
        }

        for (start, family) in subframes.iter().enumerate() {
            if family.subframe_index != 0
                || family.clut != clut
                || family.texture_page != texture_page
                || family.base_material_address == address
            {
                continue;
            }

            for (n, frame) in attached.iter_mut().enumerate() {
                match subframes.get(start + n) {
                    Some(other) if other.base_material_address == family.base_material_address => {
                        frame.uvs.extend(other.uvs.iter().take(3));
                    }
                    _ => break,
                }
            }
        }

        tracing::debug!("material {} has {} animation subframes", material, attached.len());
        this.subframes = attached;
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn into_materials(self) -> Vec<Material> {
        self.materials
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
