//! Conversion of UI settings into the generation backend's request payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Coordinates, DomainError, Game, MapSize, snake_case_map};

pub const DEFAULT_DTM_CODE: &str = "srtm30";
const MAX_DTM_CODE_LEN: usize = 64;

/// Settings as submitted by the settings UI (camelCase JSON).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSettings {
    pub coordinates: String,
    pub game_code: String,
    #[serde(default = "default_dtm_code")]
    pub dtm_code: String,
    pub size: u32,
    #[serde(default)]
    pub custom_size: bool,
    #[serde(default)]
    pub output_size: Option<u32>,
    #[serde(default)]
    pub rotation: i32,
    #[serde(default)]
    pub dem_settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub background_settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub grle_settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub i3d_settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub texture_settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub spline_settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub satellite_settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub custom_osm: Option<String>,
    #[serde(default)]
    pub custom_texture_schema: Option<String>,
    #[serde(default)]
    pub custom_tree_schema: Option<String>,
}

fn default_dtm_code() -> String {
    DEFAULT_DTM_CODE.to_string()
}

/// Request body for the backend's generate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPayload {
    pub game_code: Game,
    pub dtm_code: String,
    pub coordinates: Coordinates,
    pub size: u32,
    pub rotation: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dem_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grle_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i3d_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spline_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satellite_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_osm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_custom_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_custom_schema: Option<Value>,
}

/// Validates UI settings and builds the backend payload.
///
/// Optional groups are only carried when present, non-empty and supported by the
/// selected game. Keys inside groups are converted to snake_case.
pub fn preprocess(settings: UiSettings) -> Result<GenerationPayload, DomainError> {
    let game: Game = settings.game_code.parse()?;
    let coordinates = Coordinates::parse(&settings.coordinates)?;
    let dtm_code = validate_dtm_code(&settings.dtm_code)?;
    let map_size = MapSize::from_ui(settings.size, settings.custom_size, settings.output_size)?;

    if !(0..=359).contains(&settings.rotation) {
        return Err(DomainError::InvalidRotation(settings.rotation));
    }

    let custom_osm = match non_blank(settings.custom_osm) {
        Some(osm) if osm.trim_start().starts_with('<') => Some(osm),
        Some(_) => return Err(DomainError::InvalidCustomOsm),
        None => None,
    };

    Ok(GenerationPayload {
        game_code: game,
        dtm_code,
        coordinates,
        size: map_size.size(),
        rotation: settings.rotation,
        output_size: map_size.output_size(),
        dem_settings: settings_group(settings.dem_settings, true),
        background_settings: settings_group(settings.background_settings, true),
        grle_settings: settings_group(settings.grle_settings, true),
        i3d_settings: settings_group(settings.i3d_settings, game.supports_i3d()),
        texture_settings: settings_group(settings.texture_settings, true),
        spline_settings: settings_group(settings.spline_settings, game.supports_splines()),
        satellite_settings: settings_group(
            settings.satellite_settings,
            game.supports_satellite(),
        ),
        custom_osm,
        texture_custom_schema: parse_schema(
            settings.custom_texture_schema,
            "custom texture schema",
        )?,
        tree_custom_schema: parse_schema(settings.custom_tree_schema, "custom tree schema")?,
    })
}

fn validate_dtm_code(raw: &str) -> Result<String, DomainError> {
    let code = raw.trim();
    let valid = !code.is_empty()
        && code.len() <= MAX_DTM_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));

    if valid {
        Ok(code.to_string())
    } else {
        Err(DomainError::InvalidDtmCode(raw.to_string()))
    }
}

fn settings_group(
    group: Option<Map<String, Value>>,
    supported: bool,
) -> Option<Map<String, Value>> {
    group
        .filter(|map| supported && !map.is_empty())
        .map(snake_case_map)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_schema(raw: Option<String>, field: &'static str) -> Result<Option<Value>, DomainError> {
    let Some(raw) = non_blank(raw) else {
        return Ok(None);
    };

    let value: Value = serde_json::from_str(&raw).map_err(|err| DomainError::InvalidSchema {
        field,
        reason: err.to_string(),
    })?;

    if !value.is_array() {
        return Err(DomainError::InvalidSchema {
            field,
            reason: "schema must be a JSON array".to_string(),
        });
    }

    Ok(Some(value))
}
