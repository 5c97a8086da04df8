use gcodemorph_lib::gcode::{Anchor, EngineConfig, MirrorAxis};
use gcodemorph_lib::models::{GridHeightMap, MachineSnapshot};
use gcodemorph_lib::GcodeEngine;
use std::path::PathBuf;

fn golden_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/golden")
}

fn load(name: &str) -> String {
    let path = golden_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read fixture {path:?}: {e}"))
}

fn engine_with(name: &str) -> GcodeEngine {
    let mut engine = GcodeEngine::new(EngineConfig::default(), MachineSnapshot::default());
    engine.parse(&load(name));
    engine
}

#[test]
fn mixed_program_round_trips_byte_for_byte() {
    let engine = engine_with("mixed.nc");
    assert_eq!(engine.text(), load("mixed.nc"), "mixed.nc round trip mismatch");
}

#[test]
fn square_mirror_x_golden_matches() {
    let mut engine = engine_with("square.nc");
    assert_eq!(
        engine.mirror(MirrorAxis::X),
        load("square.mirror_x.nc"),
        "square mirror golden file mismatch"
    );
}

#[test]
fn square_scale_golden_matches() {
    let mut engine = engine_with("square.nc");
    assert_eq!(
        engine.scale_axes(50.0, 200.0),
        load("square.scale_50_200.nc"),
        "square scale golden file mismatch"
    );
}

#[test]
fn relative_offset_golden_matches() {
    let mut engine = engine_with("relative.nc");
    assert_eq!(
        engine.offset(Anchor::BottomLeft, 4.0, 4.0),
        load("relative.offset_bottom_left.nc"),
        "relative offset golden file mismatch"
    );
}

#[test]
fn subroutine_height_map_golden_matches() {
    let map = GridHeightMap::from_json(&load("flat_map.json")).expect("flat map fixture");
    let mut engine = engine_with("subroutine.nc");
    assert_eq!(
        engine.apply_height_map(&map),
        load("subroutine.height_map.nc"),
        "subroutine height map golden file mismatch"
    );
}
