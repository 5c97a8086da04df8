use super::EngineError;

/// Engine settings. Loaded from TOML; every section and key is optional and
/// falls back to the values in `config/default.toml`.
#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct EngineConfig {
    pub format: FormatConfig,
    pub arcs: ArcConfig,
    pub subroutines: SubroutineConfig,
    pub markers: MarkerConfig,
}

/// `[format]`: number formatting for regenerated lines.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FormatConfig {
    pub decimal_places: u32,
    pub strip_trailing_zeros: bool,
    pub leading_zero_suppression: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            decimal_places: 3,
            strip_trailing_zeros: true,
            leading_zero_suppression: false,
        }
    }
}

/// `[arcs]`: arc flattening.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ArcConfig {
    /// Longest chord a flattened arc segment may have.
    pub max_step: f64,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self { max_step: 1.0 }
    }
}

/// `[subroutines]`: M98/M99 expansion.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SubroutineConfig {
    /// Search the whole program when the forward search from the call fails.
    pub rescan: bool,
    /// Maximum nesting of calls made from inside a body.
    pub max_depth: u32,
}

impl Default for SubroutineConfig {
    fn default() -> Self {
        Self {
            rescan: true,
            max_depth: 8,
        }
    }
}

/// `[markers]`: sentinel comments recognised in program text.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct MarkerConfig {
    /// Lines from this marker on are parsed but not drawn or transformed.
    pub hide_start: String,
    /// Ends a hidden section.
    pub hide_stop: String,
    /// Setup footer lines are always passed through verbatim.
    pub setup_footer: String,
    /// Comment attached to the zero move inserted by a relative-mode offset.
    pub offset_move_comment: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            hide_start: "%START_HIDECODE".to_string(),
            hide_stop: "%STOP_HIDECODE".to_string(),
            setup_footer: "(Setup - GCode".to_string(),
            offset_move_comment: "(offset move)".to_string(),
        }
    }
}

impl MarkerConfig {
    /// Case-insensitive marker test against an already-uppercased line.
    pub fn matches(marker: &str, upper_line: &str) -> bool {
        upper_line.contains(&marker.to_uppercase())
    }
}

/// Parse a TOML string into an [`EngineConfig`], running validation.
pub fn parse(toml_str: &str) -> Result<EngineConfig, EngineError> {
    let cfg: EngineConfig =
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
    validate(&cfg)?;
    tracing::debug!(?cfg, "engine config loaded");
    Ok(cfg)
}

fn validate(cfg: &EngineConfig) -> Result<(), EngineError> {
    if cfg.format.decimal_places > 10 {
        return Err(EngineError::Config(
            "format.decimal_places must be at most 10".to_string(),
        ));
    }

    if !(cfg.arcs.max_step.is_finite() && cfg.arcs.max_step > 0.0) {
        return Err(EngineError::Config(
            "arcs.max_step must be a positive number".to_string(),
        ));
    }

    if cfg.subroutines.max_depth == 0 {
        return Err(EngineError::Config(
            "subroutines.max_depth must be at least 1".to_string(),
        ));
    }

    let markers = [
        ("hide_start", &cfg.markers.hide_start),
        ("hide_stop", &cfg.markers.hide_stop),
        ("setup_footer", &cfg.markers.setup_footer),
        ("offset_move_comment", &cfg.markers.offset_move_comment),
    ];
    if let Some((name, _)) = markers.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(EngineError::Config(format!(
            "markers.{name} must not be empty"
        )));
    }

    Ok(())
}
