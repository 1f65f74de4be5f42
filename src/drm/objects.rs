use crate::drm::{DrmError, Stream};

/// Pointer to the object table.
pub const OBJECT_TABLE_POINTER: usize = 0x3C;

/// The table is never walked past this many entries, even if the terminator is missing.
pub const OBJECT_TABLE_LIMIT: usize = 8192;

const NAME_POINTER_OFFSET: usize = 0x24;
const SUB_OBJECT_COUNT_OFFSET: usize = 0x08;
const NAME_LEN: usize = 8;

/// One entry of the object table. `index` is 1-based, matching the `--index` selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    pub index: usize,
    pub address: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    pub name: String,
    pub sub_objects: Vec<SubObject>,
}

/// A single exportable model. Objects with several sub-objects number them from 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubObject {
    pub name: String,
    pub model_address: u32,
}

/// Walks the object table. The table is terminated by an entry that points back at the table itself.
pub fn read_object_table(stream: &Stream) -> Result<Vec<ObjectEntry>, DrmError> {
    stream.seek(OBJECT_TABLE_POINTER);
    let table_start = stream.read_u32()?;
    stream.seek(table_start as usize);

    let mut entries = Vec::new();
    loop {
        let address = stream.read_u32()?;
        if address == table_start {
            break;
        }

        let index = entries.len() + 1;
        if index == OBJECT_TABLE_LIMIT {
            tracing::warn!("object table is not terminated after {} entries", index - 1);
            break;
        }

        entries.push(ObjectEntry { index, address });
    }

    tracing::debug!("object table at {:#x} holds {} entries", table_start, entries.len());
    Ok(entries)
}

impl ObjectEntry {
    pub fn read_name(&self, stream: &Stream) -> Result<String, DrmError> {
        stream.seek(self.address as usize + NAME_POINTER_OFFSET);
        let name_address = stream.read_u32()?;
        stream.read_name(name_address as usize, NAME_LEN)
    }

    pub fn read_header(&self, stream: &Stream) -> Result<ObjectHeader, DrmError> {
        let name = self.read_name(stream)?;

        stream.seek(self.address as usize + SUB_OBJECT_COUNT_OFFSET);
        let count = stream.read_u16()? as usize;
        stream.skip(2);
        let sub_object_table = stream.read_u32()? as usize;

        let mut sub_objects = Vec::new();
        for i in 0..count {
            stream.seek(sub_object_table + i * 4);
            let model_address = stream.read_u32()?;
            let name = if count > 1 { format!("{}{}", name, i + 1) } else { name.clone() };
            sub_objects.push(SubObject { name, model_address });
        }

        Ok(ObjectHeader { name, sub_objects })
    }
}

/// `(index, name)` for every object in the table.
pub fn list_object_names(stream: &Stream) -> Result<Vec<(usize, String)>, DrmError> {
    read_object_table(stream)?
        .into_iter()
        .map(|entry| entry.read_name(stream).map(|name| (entry.index, name)))
        .collect()
}
