//! Composition of presets and local overrides into one effective config.
//!
//! Presets apply in order, each overriding keys set by the ones before it.
//! Local overrides apply last, so a site's own settings always win over any
//! shared preset. How nested mappings combine is the composer's
//! [`MergePolicy`].

use crate::{Configuration, MergePolicy};
use log::debug;
use serde_json::Value;

/// Pure, total merge of an ordered preset list with a local override set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Composer {
    policy: MergePolicy,
}

impl Composer {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Compose `presets` (lowest precedence first) with `overrides`.
    pub fn compose<'a, I>(&self, presets: I, overrides: &Configuration) -> Configuration
    where
        I: IntoIterator<Item = &'a Configuration>,
    {
        let mut effective = Configuration::new();
        let mut count = 0usize;
        for preset in presets {
            self.apply(&mut effective, preset);
            count += 1;
        }
        self.apply(&mut effective, overrides);
        debug!(
            "composed config (presets={}, policy={}, keys={})",
            count,
            self.policy,
            effective.len()
        );
        effective
    }

    /// Apply one layer on top of `base` using this composer's policy.
    pub fn apply(&self, base: &mut Configuration, overlay: &Configuration) {
        let base_map = base.as_map_mut();
        for (key, value) in overlay.as_map() {
            if self.policy == MergePolicy::Deep {
                if let Some(existing) = base_map.get_mut(key) {
                    merge_json_values(existing, value);
                    continue;
                }
            }
            base_map.insert(key.clone(), value.clone());
        }
    }
}

/// Merge overlay values into the base, recursively overriding objects.
pub(crate) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}
