//! End to end exports of synthetic archives

mod common;

use common::{sample_drm, sample_vram, sample_builder, MemorySink};
use drm_tools::drm::{DrmError, MaterialKind, TextureMemory};
use drm_tools::export::{export_archive, list_objects, ExportOutcome, ExportSelection, PngDirectory};
use glam::{IVec3, Vec2};
use tempfile::tempdir;

#[test]
fn exports_every_model() {
    let drm = sample_drm();
    let mut sink = MemorySink::default();
    let report = export_archive(&drm, &sample_vram(), ExportSelection::All, &mut sink).unwrap();

    assert_eq!(report.outcome(), ExportOutcome::Success);
    let names: Vec<&str> = report.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["GEX", "LEVEL"]);
    assert_eq!(
        sink.stems(),
        ["GEX-tex1", "LEVEL-tex1", "LEVEL-tex1-1", "LEVEL-tex1-2", "LEVEL-tex2", "LEVEL-tex2-1", "LEVEL-tex2-2"]
    );

    let gex = &report.models[0];
    assert_eq!(gex.polygons[0].vertices[2].position, IVec3::new(3, 0, 0));
    assert_eq!(gex.polygons[0].uvs, [Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0)]);
    assert_eq!(gex.meshes().len(), 1);
}

#[test]
fn level_animation_frames_patch_vram() {
    let drm = sample_drm();
    let mut sink = MemorySink::default();
    let report = export_archive(&drm, &sample_vram(), ExportSelection::LevelOnly, &mut sink).unwrap();

    assert_eq!(report.models.len(), 1);
    // the second animation never overlaps the textures and adds no frames
    assert_eq!(
        sink.stems(),
        ["LEVEL-tex1", "LEVEL-tex1-1", "LEVEL-tex1-2", "LEVEL-tex2", "LEVEL-tex2-1", "LEVEL-tex2-2"]
    );

    let base = sink.get("LEVEL-tex1");
    assert_eq!((base.width, base.height), (4, 2));
    let reds: Vec<u8> = (0..4).map(|x| base.pixel(x, 0)[0]).collect();
    assert_eq!(reds, [8, 16, 24, 32]);
    assert_eq!(base.pixel(0, 1), [0, 0, 0, 0]);

    let first = sink.get("LEVEL-tex1-1");
    assert!((0..4).all(|x| first.pixel(x, 0) == [40, 0, 0, 255]));
    assert!((0..4).all(|x| first.pixel(x, 1) == [56, 0, 0, 255]));

    // the second frame copies nothing into row 1, which is pristine again
    let second = sink.get("LEVEL-tex1-2");
    assert!((0..4).all(|x| second.pixel(x, 0) == [48, 0, 0, 255]));
    assert!((0..4).all(|x| second.pixel(x, 1) == [0, 0, 0, 0]));

    // the next material starts from pristine VRAM and gets its own frames
    let next = sink.get("LEVEL-tex2");
    let reds: Vec<u8> = (0..4).map(|x| next.pixel(x, 0)[0]).collect();
    assert_eq!(reds, [8, 16, 24, 32]);
    assert_eq!(next.pixel(0, 1), [0, 0, 0, 0]);
    assert!((0..4).all(|x| sink.get("LEVEL-tex2-1").pixel(x, 1) == [56, 0, 0, 255]));

    let level = &report.models[0];
    assert_eq!(level.materials.len(), 3);
    assert!(matches!(level.materials[0].kind, MaterialKind::Textured { texture_slot: 0, .. }));
    assert!(!level.materials[1].visible);
    assert!(matches!(level.materials[2].kind, MaterialKind::Textured { texture_slot: 1, .. }));
    assert_eq!(level.meshes().len(), 3);
}

#[test]
fn single_object_skips_the_level() {
    let drm = sample_drm();
    let mut sink = MemorySink::default();
    let report = export_archive(&drm, &sample_vram(), ExportSelection::Object(1), &mut sink).unwrap();

    assert_eq!(report.models.len(), 1);
    assert_eq!(report.models[0].name, "GEX");
    assert_eq!(sink.stems(), ["GEX-tex1"]);
}

#[test]
fn missing_object_exports_nothing() {
    let drm = sample_drm();
    let mut sink = MemorySink::default();
    let report = export_archive(&drm, &sample_vram(), ExportSelection::Object(5), &mut sink).unwrap();

    assert!(report.models.is_empty());
    assert_eq!(report.outcome(), ExportOutcome::AllModelsFailed);
    assert_eq!(report.outcome().exit_code(), 12);
}

#[test]
fn texture_failure_is_recorded_and_the_run_continues() {
    let drm = sample_drm();
    let mut sink = MemorySink { fail: vec!["LEVEL-tex1-1".into()], ..Default::default() };
    let report = export_archive(&drm, &sample_vram(), ExportSelection::All, &mut sink).unwrap();

    assert_eq!(report.outcome(), ExportOutcome::SomeTexturesFailed);
    assert_eq!(report.texture_failures.len(), 1);
    assert_eq!(report.texture_failures[0].object, "LEVEL");
    assert_eq!(report.texture_failures[0].texture.as_deref(), Some("LEVEL-tex1-1"));
    assert_eq!(
        sink.stems(),
        ["GEX-tex1", "LEVEL-tex1", "LEVEL-tex1-2", "LEVEL-tex2", "LEVEL-tex2-1", "LEVEL-tex2-2"]
    );

    let level = &report.models[1];
    assert!(!level.materials[0].export_succeeded);
    assert!(level.materials[2].export_succeeded);
    assert!(report.models[0].materials[0].export_succeeded);
}

#[test]
fn broken_object_does_not_stop_the_level() {
    let mut builder = sample_builder();
    // vertex table far past the end of the archive
    builder.u32(0x104, 0x10_0000);
    let drm = common::drm_file("LEVEL.drm", builder.finish());

    let mut sink = MemorySink::default();
    let report = export_archive(&drm, &sample_vram(), ExportSelection::All, &mut sink).unwrap();

    assert_eq!(report.outcome(), ExportOutcome::SomeModelsFailed);
    assert_eq!(report.model_failures.len(), 1);
    assert_eq!(report.model_failures[0].object, "GEX");
    assert!(matches!(report.model_failures[0].error, DrmError::TruncatedRead { .. }));
    assert_eq!(report.models.len(), 1);
    assert_eq!(report.models[0].name, "LEVEL");
}

#[test]
fn unreadable_object_table_ends_the_run() {
    let mut builder = sample_builder();
    builder.u32(0x03C, 0x10_0000);
    let drm = common::drm_file("LEVEL.drm", builder.finish());

    let mut sink = MemorySink::default();
    let result = export_archive(&drm, &sample_vram(), ExportSelection::All, &mut sink);
    assert!(matches!(result, Err(DrmError::TruncatedRead { .. })));
}

#[test]
fn blank_vram_still_exports() {
    let drm = sample_drm();
    let mut sink = MemorySink::default();
    let report = export_archive(&drm, &TextureMemory::blank(), ExportSelection::LevelOnly, &mut sink).unwrap();

    assert_eq!(report.outcome(), ExportOutcome::Success);
    assert!(sink.get("LEVEL-tex1").rgba_data.iter().all(|p| *p == [0, 0, 0, 0]));
}

#[test]
fn lists_objects() {
    let names = list_objects(&sample_drm()).unwrap();
    assert_eq!(names, vec![(1, "GEX".to_string())]);
}

#[test]
fn writes_png_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("LEVEL");
    let mut sink = PngDirectory::create(&out).expect("Failed to create output dir");

    let report = export_archive(&sample_drm(), &sample_vram(), ExportSelection::LevelOnly, &mut sink).unwrap();
    assert_eq!(report.outcome(), ExportOutcome::Success);

    for stem in ["LEVEL-tex1", "LEVEL-tex1-1", "LEVEL-tex1-2", "LEVEL-tex2"] {
        assert!(out.join(format!("{}.png", stem)).exists(), "{} should exist", stem);
    }

    let png = lodepng::decode32_file(out.join("LEVEL-tex1.png")).expect("Failed to decode png");
    assert_eq!((png.width, png.height), (4, 2));
    assert_eq!((png.buffer[1].r, png.buffer[1].a), (16, 255));
}

#[test]
fn export_to_directory_reads_the_vrm() {
    let dir = tempdir().expect("Failed to create temp dir");
    let drm_path = dir.path().join("LEVEL.drm");
    std::fs::write(&drm_path, sample_builder().finish()).unwrap();
    std::fs::write(dir.path().join("LEVEL.vrm"), common::sample_vrm_bytes()).unwrap();

    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();

    let report = drm_tools::export_to_directory(&drm_path, &out, ExportSelection::All).unwrap();
    assert_eq!(report.outcome(), ExportOutcome::Success);
    assert!(out.join("LEVEL").join("GEX-tex1.png").exists());

    let png = lodepng::decode32_file(out.join("LEVEL").join("GEX-tex1.png")).unwrap();
    assert_eq!(png.buffer[0].r, 8);
}

#[test]
fn missing_output_root_is_unavailable() {
    let dir = tempdir().expect("Failed to create temp dir");
    let drm_path = dir.path().join("LEVEL.drm");
    std::fs::write(&drm_path, sample_builder().finish()).unwrap();

    let err = drm_tools::export_to_directory(&drm_path, &dir.path().join("nope"), ExportSelection::All).unwrap_err();
    assert!(matches!(
        err,
        drm_tools::archive::ArchiveError::Drm(DrmError::OutputDirectoryUnavailable(_))
    ));
}
