use crate::core::config::TileLoadingConfig;
use crate::core::geo::TileCoord;
use crate::core::viewport::{DisplayMode, Theme};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// XYZ raster source described by a URL template.
///
/// Placeholders: `{s}` subdomain, `{theme}`, `{z}`, `{x}`, `{y}`. The template
/// decides the axis order, so providers serving `{z}/{y}/{x}` work unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSource {
    template: String,
    subdomains: Vec<String>,
    theme: String,
}

impl TemplateSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains: Vec::new(),
            theme: String::new(),
        }
    }

    pub fn with_subdomains(mut self, subdomains: Vec<String>) -> Self {
        self.subdomains = subdomains;
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Subdomain picked round-robin by `(x + y + z) mod N` so neighbouring
    /// tiles spread over the server pool.
    fn subdomain(&self, coord: TileCoord) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let sum = coord.x as u64 + coord.y as u64 + coord.z as u64;
        &self.subdomains[(sum % self.subdomains.len() as u64) as usize]
    }
}

impl TileSource for TemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        self.template
            .replace("{s}", self.subdomain(coord))
            .replace("{theme}", &self.theme)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

/// The base-map variants the engine can show plus the shared fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSources {
    pub light: TemplateSource,
    pub dark: TemplateSource,
    pub satellite: TemplateSource,
    pub fallback: TemplateSource,
}

impl TileSources {
    pub fn from_config(config: &TileLoadingConfig) -> Self {
        let base = TemplateSource::new(config.base_url.clone())
            .with_subdomains(config.subdomains.clone());
        Self {
            light: base.clone().with_theme(config.light_theme.clone()),
            dark: base.with_theme(config.dark_theme.clone()),
            satellite: TemplateSource::new(config.satellite_url.clone()),
            fallback: TemplateSource::new(config.fallback_url.clone()),
        }
    }

    /// Source selected by the host's display toggles.
    pub fn primary(&self, mode: &DisplayMode) -> &TemplateSource {
        if mode.satellite {
            return &self.satellite;
        }
        match mode.theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }

    pub fn primary_url(&self, coord: TileCoord, mode: &DisplayMode) -> String {
        self.primary(mode).url(coord)
    }

    pub fn fallback_url(&self, coord: TileCoord) -> String {
        self.fallback.url(coord)
    }
}

impl Default for TileSources {
    fn default() -> Self {
        Self::from_config(&TileLoadingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_map_round_robin() {
        let sources = TileSources::default();
        let mode = DisplayMode::default();
        assert_eq!(
            sources.primary_url(TileCoord::new(1023, 681, 11), &mode),
            "https://d.basemaps.cartocdn.com/light_all/11/1023/681.png"
        );
        // (1024 + 681 + 11) % 4 == 0
        assert_eq!(
            sources.primary_url(TileCoord::new(1024, 681, 11), &mode),
            "https://a.basemaps.cartocdn.com/light_all/11/1024/681.png"
        );
    }

    #[test]
    fn test_dark_theme() {
        let sources = TileSources::default();
        let mode = DisplayMode {
            theme: Theme::Dark,
            ..DisplayMode::default()
        };
        assert!(sources
            .primary_url(TileCoord::new(0, 0, 5), &mode)
            .ends_with("/dark_all/5/0/0.png"));
    }

    #[test]
    fn test_satellite_keeps_provider_axis_order() {
        let sources = TileSources::default();
        let mode = DisplayMode {
            satellite: true,
            ..DisplayMode::default()
        };
        assert_eq!(
            sources.primary_url(TileCoord::new(3, 7, 4), &mode),
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/4/7/3"
        );
    }

    #[test]
    fn test_fallback_url() {
        let sources = TileSources::default();
        assert_eq!(
            sources.fallback_url(TileCoord::new(3, 7, 4)),
            "https://tile.openstreetmap.org/4/3/7.png"
        );
    }
}
