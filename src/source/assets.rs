//! Asset loader driven by manifest-declared dimensions.
//!
//! Nothing is decoded. Each asset's natural size, failure flag and latency
//! come from its manifest entry, which makes out-of-order completion
//! reproducible from a file.

use super::manifest::ManifestEntry;
use super::AssetLoader;
use crate::model::{AssetError, AssetRef, LoadOutcome};
use std::collections::HashMap;
use std::time::Duration;

/// How one asset behaves when loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSpec {
    /// Declared natural width.
    pub width: Option<f64>,
    /// Declared natural height.
    pub height: Option<f64>,
    /// Report a load failure instead of a size.
    pub fail: bool,
    /// Time before the load completes.
    pub latency: Duration,
}

/// Loader answering from manifest-declared sizes.
#[derive(Debug, Clone, Default)]
pub struct ManifestAssetLoader {
    specs: HashMap<AssetRef, AssetSpec>,
}

impl ManifestAssetLoader {
    /// Later entries for the same asset win.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ManifestEntry>) -> Self {
        let specs = entries
            .into_iter()
            .filter_map(|entry| {
                let asset = entry.asset.clone()?;
                Some((
                    asset,
                    AssetSpec {
                        width: entry.width,
                        height: entry.height,
                        fail: entry.fail,
                        latency: Duration::from_millis(entry.latency_ms),
                    },
                ))
            })
            .collect();
        Self { specs }
    }

    /// Declare or replace an asset.
    pub fn insert(&mut self, asset: AssetRef, spec: AssetSpec) {
        self.specs.insert(asset, spec);
    }

    /// Number of known assets.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True when no asset is known.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl AssetLoader for ManifestAssetLoader {
    fn load(&self, asset: &AssetRef) -> LoadOutcome {
        let failed = |reason: &str| {
            LoadOutcome::Failed(AssetError::LoadFailed {
                asset: asset.clone(),
                reason: reason.to_string(),
            })
        };
        match self.specs.get(asset) {
            None => failed("not in manifest"),
            Some(spec) if spec.fail => failed("marked as failing"),
            Some(AssetSpec {
                width: Some(width),
                height: Some(height),
                ..
            }) => LoadOutcome::Loaded {
                width: *width,
                height: *height,
            },
            Some(_) => failed("no natural size declared"),
        }
    }

    fn latency(&self, asset: &AssetRef) -> Duration {
        self.specs
            .get(asset)
            .map(|spec| spec.latency)
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: &str) -> ManifestEntry {
        serde_json::from_str(json).unwrap()
    }

    fn asset(name: &str) -> AssetRef {
        AssetRef::new(name).unwrap()
    }

    fn reason(outcome: LoadOutcome) -> String {
        match outcome {
            LoadOutcome::Failed(AssetError::LoadFailed { reason, .. }) => reason,
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn declared_size_loads() {
        let entries = [entry(r#"{"asset": "a", "width": 300, "height": 150, "latency_ms": 5}"#)];
        let loader = ManifestAssetLoader::from_entries(&entries);
        assert_eq!(
            loader.load(&asset("a")),
            LoadOutcome::Loaded {
                width: 300.0,
                height: 150.0
            }
        );
        assert_eq!(loader.latency(&asset("a")), Duration::from_millis(5));
    }

    #[test]
    fn failures_carry_a_reason() {
        let entries = [
            entry(r#"{"asset": "broken", "width": 1, "height": 1, "fail": true}"#),
            entry(r#"{"asset": "sizeless"}"#),
        ];
        let loader = ManifestAssetLoader::from_entries(&entries);
        assert_eq!(reason(loader.load(&asset("broken"))), "marked as failing");
        assert_eq!(reason(loader.load(&asset("sizeless"))), "no natural size declared");
        assert_eq!(reason(loader.load(&asset("unknown"))), "not in manifest");
        assert_eq!(loader.latency(&asset("unknown")), Duration::ZERO);
    }

    #[test]
    fn blocks_are_not_registered() {
        let entries = [entry(r#"{"block_height": 10}"#)];
        assert!(ManifestAssetLoader::from_entries(&entries).is_empty());
    }

    #[test]
    fn insert_overrides_entry() {
        let mut loader = ManifestAssetLoader::default();
        loader.insert(
            asset("x"),
            AssetSpec {
                width: Some(10.0),
                height: Some(20.0),
                fail: false,
                latency: Duration::ZERO,
            },
        );
        assert_eq!(loader.len(), 1);
        assert!(matches!(loader.load(&asset("x")), LoadOutcome::Loaded { .. }));
    }
}
