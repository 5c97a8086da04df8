//! CLI command handlers.
//!
//! Sub-modules are grouped by concern:
//! - [`transform`]: subcommands that rewrite the program text
//! - [`query`]: read-only subcommands that print JSON
//!
//! This module holds the input loaders shared by both. Every fallible path
//! returns `Result<_, AppError>`.

use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::gcode::{config, EngineConfig};
use crate::models::{GridHeightMap, MachineSnapshot};

pub mod query;
pub mod transform;

fn read_text(path: &Path) -> Result<String, AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Per-user config file, `<config dir>/gcodemorph/config.toml`.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gcodemorph").join("config.toml"))
}

/// Loads the engine config from `path`, else from the per-user config file
/// when it exists, else the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, AppError> {
    let source = match path {
        Some(p) => Some(p.to_path_buf()),
        None => user_config_path().filter(|p| p.exists()),
    };
    let Some(source) = source else {
        return Ok(EngineConfig::default());
    };
    tracing::debug!(path = %source.display(), "loading engine config");
    Ok(config::parse(&read_text(&source)?)?)
}

/// Loads the machine snapshot; no file means the default snapshot.
pub fn load_machine(path: Option<&Path>) -> Result<MachineSnapshot, AppError> {
    let Some(path) = path else {
        return Ok(MachineSnapshot::default());
    };
    MachineSnapshot::from_toml(&read_text(path)?)
        .map_err(|e| AppError::Config(format!("machine snapshot {}: {e}", path.display())))
}

pub fn load_height_map(path: &Path) -> Result<GridHeightMap, AppError> {
    Ok(GridHeightMap::from_json(&read_text(path)?)?)
}

pub fn read_program(path: &Path) -> Result<String, AppError> {
    read_text(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use std::io::Write as _;

    fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = read_program(Path::new("/definitely/not/here.nc")).unwrap_err();
        assert!(matches!(err, AppError::FileNotFound(_)));
    }

    #[test]
    fn explicit_config_file_is_parsed_and_validated() {
        let file = temp_file("[format]\ndecimal_places = 5\n");
        let cfg = load_config(Some(file.path())).expect("valid config");
        assert_eq!(cfg.format.decimal_places, 5);

        let bad = temp_file("[arcs]\nmax_step = -1.0\n");
        let err = load_config(Some(bad.path())).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn machine_snapshot_defaults_without_a_file() {
        assert_eq!(load_machine(None).expect("default"), MachineSnapshot::default());
    }

    #[test]
    fn machine_snapshot_errors_name_the_file() {
        let file = temp_file("unit = \"furlong\"\n");
        let err = load_machine(Some(file.path())).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("machine snapshot"));

        let good = temp_file("unit = \"inch\"\n");
        assert_eq!(load_machine(Some(good.path())).expect("inch").unit, Unit::Inch);
    }

    #[test]
    fn invalid_height_map_is_a_height_map_error() {
        let file = temp_file(r#"{"min":{"x":0,"y":0},"max":{"x":1,"y":1},"size_x":1,"size_y":1,"heights":[0]}"#);
        let err = load_height_map(file.path()).unwrap_err();
        assert!(matches!(err, AppError::HeightMap(_)));
    }
}
