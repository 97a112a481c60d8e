//! Startup configuration read from environment variables.

use crate::control::DrawOptions;
use crate::geo::LatLng;
use crate::shape::ShapeKind;
use crate::map_view::DEFAULT_MAX_ZOOM;

pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_SUBDOMAINS: &str = "a,b,c";
pub const DEFAULT_CENTER: LatLng = LatLng::new(51.505, -0.09);
pub const DEFAULT_ZOOM: u8 = 13;
pub const DEFAULT_MAX_TILE_REQUESTS: usize = 6;
pub const DEFAULT_ATTRIBUTION: &str = "© OpenStreetMap contributors";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}: expected `lat,lng`, got `{value}`")]
    InvalidCenter { var: &'static str, value: String },
    #[error("{var}: expected a zoom level between 0 and {max}, got `{value}`")]
    InvalidZoom {
        var: &'static str,
        value: String,
        max: u8,
    },
    #[error("{var}: unknown shape kind `{value}`")]
    UnknownShape { var: &'static str, value: String },
    #[error("{var}: expected a positive integer, got `{value}`")]
    InvalidCount { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub tile_url: String,
    pub subdomains: Vec<String>,
    pub attribution: String,
    pub draw: DrawOptions,
    pub max_tile_requests: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile_url: DEFAULT_TILE_URL.to_string(),
            subdomains: parse_list(DEFAULT_SUBDOMAINS),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            draw: DrawOptions::default(),
            max_tile_requests: DEFAULT_MAX_TILE_REQUESTS,
        }
    }
}

impl MapConfig {
    /// Build the config from environment variables.
    ///
    /// All optional:
    /// - `MAPDRAW_TILE_URL`: tile template with `{s}`, `{z}`, `{x}`, `{y}`
    /// - `MAPDRAW_TILE_SUBDOMAINS`: comma list, default `a,b,c`
    /// - `MAPDRAW_CENTER`: `lat,lng`, default `51.505,-0.09`
    /// - `MAPDRAW_ZOOM`: default 13
    /// - `MAPDRAW_DRAW_SHAPES`: comma list of shape kinds, default `polygon`
    /// - `MAPDRAW_MAX_TILE_REQUESTS`: concurrent tile downloads, default 6
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = MapConfig::default();

        let tile_url = std::env::var("MAPDRAW_TILE_URL").unwrap_or(defaults.tile_url);
        let subdomains = std::env::var("MAPDRAW_TILE_SUBDOMAINS")
            .map(|raw| parse_list(&raw))
            .unwrap_or(defaults.subdomains);
        let center = parse_center(env("MAPDRAW_CENTER").as_deref())?;
        let zoom = parse_zoom(env("MAPDRAW_ZOOM").as_deref())?;
        let draw = parse_shapes(env("MAPDRAW_DRAW_SHAPES").as_deref())?;
        let max_tile_requests = parse_count(env("MAPDRAW_MAX_TILE_REQUESTS").as_deref())?;

        Ok(Self {
            center,
            zoom,
            tile_url,
            subdomains,
            attribution: defaults.attribution,
            draw,
            max_tile_requests,
        })
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_center(raw: Option<&str>) -> Result<LatLng, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_CENTER);
    };
    let invalid = || ConfigError::InvalidCenter {
        var: "MAPDRAW_CENTER",
        value: raw.to_string(),
    };
    let (lat, lng) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(invalid());
    }
    Ok(LatLng::new(lat, lng))
}

pub fn parse_zoom(raw: Option<&str>) -> Result<u8, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_ZOOM);
    };
    match raw.trim().parse::<u8>() {
        Ok(zoom) if zoom <= DEFAULT_MAX_ZOOM => Ok(zoom),
        _ => Err(ConfigError::InvalidZoom {
            var: "MAPDRAW_ZOOM",
            value: raw.to_string(),
            max: DEFAULT_MAX_ZOOM,
        }),
    }
}

pub fn parse_shapes(raw: Option<&str>) -> Result<DrawOptions, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DrawOptions::default());
    };
    let mut kinds = Vec::new();
    for name in parse_list(raw) {
        let kind = ShapeKind::parse(&name).ok_or_else(|| ConfigError::UnknownShape {
            var: "MAPDRAW_DRAW_SHAPES",
            value: name.clone(),
        })?;
        kinds.push(kind);
    }
    Ok(DrawOptions::only(&kinds))
}

pub fn parse_count(raw: Option<&str>) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_TILE_REQUESTS);
    };
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidCount {
            var: "MAPDRAW_MAX_TILE_REQUESTS",
            value: raw.to_string(),
        }),
    }
}
