//! Asset-backed payload field
//!
//! Exposes non-record binary assets (models, textures, sounds) through
//! the same identity and reference mechanism as ordinary records. The
//! store only tracks the asset path and content id; loading the asset
//! itself is the job of an external asset loader keyed by that path.

use serde::{Deserialize, Serialize};

/// Default type tag for assets with no more specific classification
pub const DEFAULT_ASSET_KIND: &str = "Object";

/// One asset slot: a path into the project's asset tree plus bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PrefabAsset {
    /// Project-relative path to the asset; empty means no asset selected
    pub asset_path: String,
    /// Type tag describing what the path points at
    pub asset_kind: String,
    /// Content id assigned by the asset pipeline, if any
    pub content_id: String,
}

impl Default for PrefabAsset {
    fn default() -> Self {
        Self {
            asset_path: String::new(),
            asset_kind: DEFAULT_ASSET_KIND.to_string(),
            content_id: String::new(),
        }
    }
}

impl PrefabAsset {
    /// An asset slot pointing at `path` with the default type tag
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            asset_path: path.into(),
            ..Default::default()
        }
    }

    /// Whether an asset is selected
    pub fn has_asset(&self) -> bool {
        !self.asset_path.is_empty()
    }

    /// The final path segment, used as the display name of prefab records
    pub fn file_name(&self) -> &str {
        self.asset_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.asset_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_asset() {
        assert!(!PrefabAsset::default().has_asset());
        assert!(PrefabAsset::at_path("models/crate.glb").has_asset());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(PrefabAsset::at_path("models/props/crate.glb").file_name(), "crate.glb");
        assert_eq!(PrefabAsset::at_path("flat.glb").file_name(), "flat.glb");
    }

    #[test]
    fn test_serde_shape() {
        let asset = PrefabAsset {
            asset_path: "models/crate.glb".to_string(),
            asset_kind: "Model".to_string(),
            content_id: "c-123".to_string(),
        };
        let json = serde_json::to_string(&asset).unwrap();
        assert!(json.contains("\"assetPath\""));
        assert!(json.contains("\"assetKind\""));
        assert!(json.contains("\"contentId\""));
        let back: PrefabAsset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, asset);
    }

    #[test]
    fn test_partial_object_fills_defaults() {
        let back: PrefabAsset = serde_json::from_str(r#"{"assetPath":"a.png"}"#).unwrap();
        assert_eq!(back.asset_path, "a.png");
        assert_eq!(back.asset_kind, DEFAULT_ASSET_KIND);
        assert!(back.content_id.is_empty());
    }
}
