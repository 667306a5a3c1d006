//! Path-based navigation between animations.
//!
//! A [`RouteTable`] maps paths such as `"/shape"` to the animation mounted
//! there. [`Router::navigate`] destroys whatever is mounted, then builds,
//! starts and shows the animation for the new path. A path with no route
//! leaves nothing mounted and yields a fallback message instead of an error.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use dotfield_core::{Animation, AnimationError, Seed};
use dotfield_shape::ImageCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::AnimationKind;

/// What to mount at one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub animation: String,
    #[serde(default = "empty_object")]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub seed: u64,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl RouteConfig {
    pub fn new(animation: &str) -> Self {
        Self {
            animation: animation.to_string(),
            params: empty_object(),
            image: None,
            seed: 0,
        }
    }

    /// The reproducible description of this route, with no ticks.
    pub fn to_seed(&self) -> Seed {
        Seed {
            animation: self.animation.clone(),
            params: self.params.clone(),
            seed: self.seed,
            ticks: 0,
            image: self.image.clone(),
        }
    }
}

/// Path to animation mapping, serialized as a JSON object keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: BTreeMap<String, RouteConfig>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a route table and checks every route names a known animation.
    pub fn from_json_str(json: &str) -> Result<Self, AnimationError> {
        let table: RouteTable = serde_json::from_str(json)
            .map_err(|e| AnimationError::InvalidParams(format!("route table: {e}")))?;
        for (path, config) in &table.routes {
            if !AnimationKind::list_animations().contains(&config.animation.as_str()) {
                return Err(AnimationError::UnknownAnimation(format!(
                    "{} (route {path})",
                    config.animation
                )));
            }
        }
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, AnimationError> {
        let json = fs::read_to_string(path)
            .map_err(|e| AnimationError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, path: &str, config: RouteConfig) {
        self.routes.insert(path.to_string(), config);
    }

    pub fn get(&self, path: &str) -> Option<&RouteConfig> {
        self.routes.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Outcome of a [`Router::navigate`] call.
#[derive(Debug)]
pub enum Navigation {
    /// A new animation is mounted and running. `load_error` holds a failed
    /// shape load; the animation still runs without that shape.
    Mounted {
        path: String,
        animation: &'static str,
        load_error: Option<AnimationError>,
    },
    /// The path was already mounted and navigation was not forced.
    Unchanged,
    /// No route matched; nothing is mounted.
    Fallback { path: String, message: String },
}

/// Owns the mounted animation and swaps it on navigation.
pub struct Router {
    table: RouteTable,
    cache: ImageCache,
    current: Option<(String, AnimationKind)>,
}

impl Router {
    pub fn new(table: RouteTable, cache: ImageCache) -> Self {
        Self {
            table,
            cache,
            current: None,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current.as_ref().map(|(path, _)| path.as_str())
    }

    pub fn current(&self) -> Option<&AnimationKind> {
        self.current.as_ref().map(|(_, anim)| anim)
    }

    pub fn current_mut(&mut self) -> Option<&mut AnimationKind> {
        self.current.as_mut().map(|(_, anim)| anim)
    }

    /// Navigates to `path`.
    ///
    /// Without `force`, navigating to the mounted path is a no-op. Otherwise
    /// the mounted animation is destroyed and hidden first, even when the new
    /// path has no route. Construction failures are returned as errors; a
    /// failed shape load is not.
    pub fn navigate(&mut self, path: &str, force: bool) -> Result<Navigation, AnimationError> {
        if !force && self.current_path() == Some(path) {
            return Ok(Navigation::Unchanged);
        }
        self.unmount();

        let Some(config) = self.table.get(path) else {
            let err = AnimationError::NoTargetRoute(path.to_string());
            warn!(path, "no route");
            return Ok(Navigation::Fallback {
                path: path.to_string(),
                message: fallback_message(&err),
            });
        };

        let mut animation =
            AnimationKind::from_name(&config.animation, config.seed, &config.params, &self.cache)?;
        animation.start();
        animation.surface_mut().set_visible(true);
        let load_error = match &config.image {
            Some(image) => animation.set_image_blocking(image).err(),
            None => None,
        };
        if let Some(e) = &load_error {
            warn!(path, error = %e, "route mounted without its shape");
        }
        let name = animation.name();
        info!(path, animation = name, "navigated");
        self.current = Some((path.to_string(), animation));
        Ok(Navigation::Mounted {
            path: path.to_string(),
            animation: name,
            load_error,
        })
    }

    /// Destroys and hides the mounted animation, if any.
    pub fn unmount(&mut self) {
        if let Some((path, mut animation)) = self.current.take() {
            animation.destroy();
            animation.surface_mut().set_visible(false);
            info!(path = %path, animation = animation.name(), "unmounted");
        }
    }
}

fn fallback_message(err: &AnimationError) -> String {
    let text = err.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use serde_json::json;

    const TABLE: &str = r#"{
        "/": {"animation": "connected-dots", "params": {"n_dots": 10}, "seed": 4},
        "/shape": {"animation": "dot-shape", "params": {"width": 40, "height": 40, "dot_gap": 10}, "image": "plus"},
        "/broken": {"animation": "dot-shape", "image": "missing.png"}
    }"#;

    fn router() -> Router {
        let cache = ImageCache::new();
        cache.insert(
            "plus",
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]))),
        );
        Router::new(RouteTable::from_json_str(TABLE).unwrap(), cache)
    }

    #[test]
    fn table_parses_with_defaults() {
        let table = RouteTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.len(), 3);
        let broken = table.get("/broken").unwrap();
        assert_eq!(broken.seed, 0);
        assert_eq!(broken.params, json!({}));
        assert_eq!(table.paths().collect::<Vec<_>>(), vec!["/", "/broken", "/shape"]);
    }

    #[test]
    fn table_rejects_unknown_animation() {
        let err = RouteTable::from_json_str(r#"{"/x": {"animation": "fireworks"}}"#).unwrap_err();
        assert!(matches!(err, AnimationError::UnknownAnimation(_)));
    }

    #[test]
    fn table_rejects_malformed_json() {
        let err = RouteTable::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, AnimationError::InvalidParams(_)));
    }

    #[test]
    fn table_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let mut table = RouteTable::new();
        let mut config = RouteConfig::new("dot-shape");
        config.image = Some("logo.png".into());
        table.insert("/logo", config);
        fs::write(&path, serde_json::to_string(&table).unwrap()).unwrap();
        assert_eq!(RouteTable::from_path(&path).unwrap(), table);
    }

    #[test]
    fn missing_table_file_is_io_error() {
        let err = RouteTable::from_path(Path::new("/no/such/routes.json")).unwrap_err();
        assert!(matches!(err, AnimationError::Io(_)));
    }

    #[test]
    fn navigate_mounts_and_starts() {
        let mut r = router();
        let nav = r.navigate("/", false).unwrap();
        assert!(matches!(
            nav,
            Navigation::Mounted { animation: "connected-dots", load_error: None, .. }
        ));
        let current = r.current().unwrap();
        assert!(current.is_running());
        assert!(current.surface().is_visible());
        assert_eq!(current.dot_count(), 10);
    }

    #[test]
    fn navigate_applies_route_image() {
        let mut r = router();
        r.navigate("/shape", false).unwrap();
        // 40x40 opaque canvas sampled every 10 px.
        assert_eq!(r.current().unwrap().dot_count(), 16);
    }

    #[test]
    fn same_path_is_unchanged_unless_forced() {
        let mut r = router();
        r.navigate("/", false).unwrap();
        assert!(matches!(r.navigate("/", false).unwrap(), Navigation::Unchanged));
        assert!(matches!(
            r.navigate("/", true).unwrap(),
            Navigation::Mounted { .. }
        ));
    }

    #[test]
    fn unknown_path_falls_back_and_unmounts() {
        let mut r = router();
        r.navigate("/", false).unwrap();
        match r.navigate("/nowhere", false).unwrap() {
            Navigation::Fallback { path, message } => {
                assert_eq!(path, "/nowhere");
                assert_eq!(message, "No route found for \"/nowhere\".");
            }
            other => panic!("expected fallback, got {other:?}"),
        }
        assert!(r.current().is_none());
        assert!(r.current_path().is_none());
    }

    #[test]
    fn failed_shape_load_still_mounts() {
        let mut r = router();
        match r.navigate("/broken", false).unwrap() {
            Navigation::Mounted { load_error, .. } => {
                assert!(matches!(load_error, Some(AnimationError::AssetLoadFailure { .. })));
            }
            other => panic!("expected mount, got {other:?}"),
        }
        assert!(r.current().unwrap().is_running());
    }

    #[test]
    fn route_config_converts_to_seed() {
        let table = RouteTable::from_json_str(TABLE).unwrap();
        let seed = table.get("/").unwrap().to_seed();
        assert_eq!(seed.animation, "connected-dots");
        assert_eq!(seed.seed, 4);
        assert!(seed.validate().is_ok());
    }
}
