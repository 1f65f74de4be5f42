use thiserror::Error;
use std::io;
use std::path::{Path, PathBuf};
use crate::drm::{DrmError, DrmFile, TextureMemory};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("io error")]
    OtherIOErr(#[from] io::Error),

    #[error("malformed archive")]
    Drm(#[from] DrmError),
}

/// A `.drm` archive and the texture memory it draws from.
#[derive(Debug)]
pub struct Archive {
    pub drm: DrmFile,
    pub vram: TextureMemory,
}

impl Archive {
    /// Opens `path` and the `.vrm` image next to it. A missing `.vrm` gives blank texture memory.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let drm = read_drm(path)?;

        let vrm = vrm_path(path);
        let vram = match read_vrm(&vrm) {
            Ok(vram) => vram,
            Err(ArchiveError::FileNotFound(_)) => {
                tracing::warn!("no texture memory image at {}, textures will be blank", vrm.display());
                TextureMemory::blank()
            }
            Err(e) => return Err(e),
        };

        Ok(Archive { drm, vram })
    }
}

/// The texture memory image shares the archive's name.
pub fn vrm_path(drm_path: &Path) -> PathBuf {
    drm_path.with_extension("vrm")
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArchiveError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArchiveError::FileNotFound(path.to_path_buf()),
        _ => ArchiveError::OtherIOErr(e),
    })
}

pub fn read_drm(path: &Path) -> Result<DrmFile, ArchiveError> {
    let data = read_file(path)?;
    let filename = path.to_string_lossy();

    tracing::debug!("read {} bytes from {}", data.len(), filename);
    Ok(DrmFile {
        filename: filename.as_ref().into(),
        data: data.into(),
    })
}

pub fn read_vrm(path: &Path) -> Result<TextureMemory, ArchiveError> {
    let data = read_file(path)?;
    Ok(TextureMemory::from_vrm(&data)?)
}
