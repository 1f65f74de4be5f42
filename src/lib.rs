pub mod drm;
pub mod archive;
pub mod export;

use archive::{Archive, ArchiveError};
use export::{ExportReport, ExportSelection, PngDirectory};
use std::path::{Path, PathBuf};

/// Textures of `drm_path` are written to `out_root/<archive stem>/`.
pub fn output_dir(out_root: &Path, drm_path: &Path) -> PathBuf {
    let stem = drm_path.file_stem().unwrap_or(drm_path.as_os_str());
    out_root.join(stem)
}

/// Opens `drm_path` and exports the selected models, writing textures as PNG files.
pub fn export_to_directory(
    drm_path: &Path,
    out_root: &Path,
    selection: ExportSelection,
) -> Result<ExportReport, ArchiveError> {
    let archive = Archive::open(drm_path)?;
    let mut sink = PngDirectory::create(&output_dir(out_root, drm_path))?;
    Ok(export::export_archive(&archive.drm, &archive.vram, selection, &mut sink)?)
}
