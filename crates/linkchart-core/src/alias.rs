//! Alias map maintenance: merge, unmerge, ignore, resolve.
//!
//! Resolution is a single lookup. Merging re-points existing aliases that
//! targeted a merged variant, but only one hop deep; deeper chains can be
//! left pointing at an intermediate name.

use crate::cluster::Cluster;
use crate::types::AliasMap;
use log::info;
use std::collections::{BTreeSet, HashSet};

/// Canonical name for `name`, or `name` itself when it has no alias.
pub fn resolve<'a>(aliases: &'a AliasMap, name: &'a str) -> &'a str {
    aliases.get(name).map(String::as_str).unwrap_or(name)
}

/// Alias every member except `target` and `excluded` to `target`, then
/// re-point existing entries whose value was one of those members.
///
/// Returns the number of variants aliased.
pub fn merge_variants<S: AsRef<str>>(
    aliases: &mut AliasMap,
    members: &[S],
    target: &str,
    excluded: &BTreeSet<String>,
) -> usize {
    let variants: HashSet<&str> = members
        .iter()
        .map(|m| m.as_ref())
        .filter(|m| *m != target && !excluded.contains(*m))
        .collect();

    if variants.is_empty() {
        return 0;
    }

    for variant in &variants {
        aliases.insert(variant.to_string(), target.to_string());
    }

    for value in aliases.values_mut() {
        if variants.contains(value.as_str()) {
            *value = target.to_string();
        }
    }

    // Re-pointing can turn `target -> variant` into `target -> target`.
    aliases.retain(|key, value| key != value);

    info!("Merged {} variant(s) into '{}'", variants.len(), target);
    variants.len()
}

/// Merge one detected cluster using its own target and exclusions.
pub fn merge_cluster(aliases: &mut AliasMap, cluster: &Cluster) -> usize {
    merge_variants(aliases, &cluster.members, &cluster.target, &cluster.excluded)
}

/// Merge every cluster from one detection run.
///
/// Clusters from a single run are disjoint, so order does not matter.
pub fn merge_all(aliases: &mut AliasMap, clusters: &[Cluster]) -> usize {
    clusters.iter().map(|c| merge_cluster(aliases, c)).sum()
}

/// Remove the alias for `variant` only. Returns the canonical name it pointed at.
pub fn unmerge(aliases: &mut AliasMap, variant: &str) -> Option<String> {
    let removed = aliases.remove(variant);
    if let Some(target) = &removed {
        info!("Unmerged '{}' from '{}'", variant, target);
    }
    removed
}

/// Cluster keys the analyst dismissed during this session.
///
/// Lives only as long as the session that owns it; it is not persisted
/// alongside the alias map.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    keys: HashSet<String>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(&mut self, cluster: &Cluster) -> bool {
        let added = self.keys.insert(cluster.key.clone());
        if added {
            info!("Ignoring cluster '{}'", cluster.key);
        }
        added
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> &HashSet<String> {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
