use crate::drm::{
    extract_level_model, extract_object_model, list_object_names, read_object_table, DrmError, DrmFile,
    Image, Model, TextureMemory,
};
use std::path::{Path, PathBuf};

/// Which models a run exports. Object indices are 1-based table positions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExportSelection {
    All,
    LevelOnly,
    Object(usize),
}

impl ExportSelection {
    /// `-1` is everything, `0` the level geometry, anything above a single object.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            -1 => Some(ExportSelection::All),
            0 => Some(ExportSelection::LevelOnly),
            n if n > 0 => Some(ExportSelection::Object(n as usize)),
            _ => None,
        }
    }

    pub fn includes_object(self, index: usize) -> bool {
        match self {
            ExportSelection::All => true,
            ExportSelection::LevelOnly => false,
            ExportSelection::Object(n) => n == index,
        }
    }

    pub fn includes_level(self) -> bool {
        !matches!(self, ExportSelection::Object(_))
    }
}

/// Receives every decoded texture of a run.
pub trait TextureSink {
    fn write_texture(&mut self, stem: &str, image: &Image) -> Result<(), DrmError>;
}

/// Writes `{stem}.png` files into one directory.
#[derive(Debug)]
pub struct PngDirectory {
    dir: PathBuf,
}

impl PngDirectory {
    /// Creates `dir` if its parent exists.
    pub fn create(dir: &Path) -> Result<Self, DrmError> {
        let parent_ok = dir.parent().map_or(true, |p| p.as_os_str().is_empty() || p.is_dir());
        if !parent_ok || std::fs::create_dir_all(dir).is_err() {
            return Err(DrmError::OutputDirectoryUnavailable(dir.to_path_buf()));
        }
        Ok(PngDirectory { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn texture_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}.png", stem))
    }
}

impl TextureSink for PngDirectory {
    fn write_texture(&mut self, stem: &str, image: &Image) -> Result<(), DrmError> {
        let path = self.texture_path(stem);
        lodepng::encode_file(&path, image.as_bytes(), image.width, image.height, lodepng::ColorType::RGBA, 8)
            .map_err(|e| {
                if self.dir.is_dir() {
                    DrmError::TextureWriteFailed { stem: stem.to_string(), reason: e.to_string() }
                } else {
                    DrmError::OutputDirectoryUnavailable(self.dir.clone())
                }
            })
    }
}

/// A model or texture that could not be exported.
#[derive(Debug)]
pub struct ExportFailure {
    pub object: String,
    /// Stem of the texture, for texture failures.
    pub texture: Option<String>,
    pub error: DrmError,
}

/// Severity of a run, least severe first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExportOutcome {
    Success,
    SomeTexturesFailed,
    SomeModelsFailed,
    AllModelsFailed,
}

impl ExportOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            ExportOutcome::Success => 0,
            ExportOutcome::SomeTexturesFailed => 10,
            ExportOutcome::SomeModelsFailed => 11,
            ExportOutcome::AllModelsFailed => 12,
        }
    }

    pub fn worst(self, other: ExportOutcome) -> ExportOutcome {
        self.max(other)
    }
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub models: Vec<Model>,
    pub model_failures: Vec<ExportFailure>,
    pub texture_failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn outcome(&self) -> ExportOutcome {
        let mut outcome = ExportOutcome::Success;
        if !self.texture_failures.is_empty() {
            outcome = outcome.worst(ExportOutcome::SomeTexturesFailed);
        }
        if !self.model_failures.is_empty() {
            outcome = outcome.worst(ExportOutcome::SomeModelsFailed);
        }
        if self.models.is_empty() {
            outcome = outcome.worst(ExportOutcome::AllModelsFailed);
        }
        outcome
    }

    fn model_failed(&mut self, object: String, error: DrmError) {
        tracing::error!("model {} failed to export: {}", object, error);
        self.model_failures.push(ExportFailure { object, texture: None, error });
    }
}

/// `(index, name)` for every object in the archive.
pub fn list_objects(drm: &DrmFile) -> Result<Vec<(usize, String)>, DrmError> {
    list_object_names(&drm.stream()?)
}

/// Extracts the selected models and hands their textures to `sink`.
///
/// Failures of single models and textures are collected in the report. An
/// unreadable object table or an unavailable output directory ends the run.
pub fn export_archive(
    drm: &DrmFile,
    vram: &TextureMemory,
    selection: ExportSelection,
    sink: &mut dyn TextureSink,
) -> Result<ExportReport, DrmError> {
    let stream = drm.stream()?;
    let mut report = ExportReport::default();

    if selection != ExportSelection::LevelOnly {
        for entry in read_object_table(&stream)? {
            if !selection.includes_object(entry.index) {
                continue;
            }

            let header = match entry.read_header(&stream) {
                Ok(header) => header,
                Err(e) => {
                    report.model_failed(format!("at index {}", entry.index), e);
                    continue;
                }
            };

            let plural = if header.sub_objects.len() == 1 { "" } else { "s" };
            tracing::info!(
                "found model {} at index {} with {} sub-object{}",
                header.name, entry.index, header.sub_objects.len(), plural
            );

            for sub_object in header.sub_objects {
                tracing::info!("reading {}", sub_object.name);
                match extract_object_model(&stream, &sub_object.name, sub_object.model_address, vram) {
                    Ok(model) => export_model(model, sink, &mut report)?,
                    Err(e) => report.model_failed(sub_object.name, e),
                }
            }

            if selection == ExportSelection::Object(entry.index) {
                break;
            }
        }
    }

    if selection.includes_level() {
        let name = drm.stem();
        tracing::info!("reading level geometry {}", name);
        match extract_level_model(&stream, name, vram) {
            Ok(model) => export_model(model, sink, &mut report)?,
            Err(e) => report.model_failed(name.to_string(), e),
        }
    }

    Ok(report)
}

fn export_model(mut model: Model, sink: &mut dyn TextureSink, report: &mut ExportReport) -> Result<(), DrmError> {
    for texture in model.textures.iter() {
        match sink.write_texture(&texture.stem, &texture.image) {
            Ok(()) => {}
            Err(e @ DrmError::OutputDirectoryUnavailable(_)) => return Err(e),
            Err(e) => {
                tracing::warn!("texture {} of model {} failed to export: {}", texture.stem, model.name, e);
                if let Some(material) = model.materials.get_mut(texture.material) {
                    material.export_succeeded = false;
                }
                report.texture_failures.push(ExportFailure {
                    object: model.name.clone(),
                    texture: Some(texture.stem.clone()),
                    error: e,
                });
            }
        }
    }

    tracing::info!("exported {}", model.name);
    report.models.push(model);
    Ok(())
}
