//! Duplicate-entity detection.
//!
//! Every unique post-alias name is compared against every other one with the
//! [`NameMatcher`], and matching pairs are merged with union-find. This is
//! O(n²) comparisons; [`ResolutionConfig::max_universe`] bounds it.

use crate::canon;
use crate::config::ResolutionConfig;
use crate::matcher::{CanonicalName, NameMatcher};
use crate::types::AliasMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Separator used when joining sorted members into a cluster key.
/// Occurrences inside a member are escaped with a backslash.
pub const CLUSTER_KEY_SEPARATOR: &str = "|";

/// Group of names judged to denote one entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    /// Sorted, escaped members joined with [`CLUSTER_KEY_SEPARATOR`]. Used by the ignore list.
    pub key: String,

    /// Members in first-seen order. Always at least two.
    pub members: Vec<String>,

    /// Name every included variant will be aliased to.
    pub target: String,

    /// Variants the analyst has opted out of merging.
    #[serde(default)]
    pub excluded: BTreeSet<String>,
}

impl Cluster {
    fn from_members(members: Vec<String>) -> Self {
        let key = cluster_key(&members);
        let target = default_target(&members);
        Self {
            key,
            members,
            target,
            excluded: BTreeSet::new(),
        }
    }

    /// Change the merge target. Returns false if `target` is not a member.
    pub fn set_target(&mut self, target: &str) -> bool {
        if !self.members.iter().any(|m| m == target) {
            return false;
        }
        self.target = target.to_string();
        self.excluded.remove(target);
        true
    }

    /// Include or exclude a variant. The target cannot be excluded.
    pub fn set_included(&mut self, variant: &str, included: bool) -> bool {
        if variant == self.target || !self.members.iter().any(|m| m == variant) {
            return false;
        }
        if included {
            self.excluded.remove(variant);
        } else {
            self.excluded.insert(variant.to_string());
        }
        true
    }

    pub fn is_included(&self, variant: &str) -> bool {
        variant == self.target || !self.excluded.contains(variant)
    }

    /// Members that a merge will alias to the target.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .map(String::as_str)
            .filter(move |m| *m != self.target && !self.excluded.contains(*m))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }
}

/// Key identifying an exact grouping of names, independent of order.
pub fn cluster_key<S: AsRef<str>>(members: &[S]) -> String {
    let mut sorted: Vec<&str> = members.iter().map(|m| m.as_ref()).collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|m| escape_member(m))
        .collect::<Vec<_>>()
        .join(CLUSTER_KEY_SEPARATOR)
}

fn escape_member(member: &str) -> String {
    member
        .replace('\\', "\\\\")
        .replace(CLUSTER_KEY_SEPARATOR, "\\|")
}

/// Longest member by character count; the first one seen wins ties.
fn default_target(members: &[String]) -> String {
    let mut best: Option<&String> = None;
    for member in members {
        match best {
            Some(b) if member.chars().count() <= b.chars().count() => {}
            _ => best = Some(member),
        }
    }
    best.cloned().unwrap_or_default()
}

/// Result of one detection run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub clusters: Vec<Cluster>,

    /// Unique post-alias names considered.
    pub universe_size: usize,

    /// True when the universe exceeded the guardrail and nothing was compared.
    pub skipped: bool,
}

/// Disjoint-set forest with path halving and union by size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] { (ra, rb) } else { (rb, ra) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

/// Groups entity names into candidate duplicate clusters
#[derive(Debug, Clone, Default)]
pub struct ClusterDetector {
    matcher: NameMatcher,
}

impl ClusterDetector {
    pub fn new(config: ResolutionConfig) -> Self {
        Self {
            matcher: NameMatcher::new(config),
        }
    }

    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Unique representative names: each raw name is display-cleaned and
    /// resolved through one alias lookup. First-seen order is kept.
    pub fn universe<I, S>(names: I, aliases: &AliasMap) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut universe = Vec::new();
        for raw in names {
            let cleaned = canon::clean_display(raw.as_ref());
            if cleaned.is_empty() {
                continue;
            }
            let representative = aliases.get(&cleaned).cloned().unwrap_or(cleaned);
            if seen.insert(representative.clone()) {
                universe.push(representative);
            }
        }
        universe
    }

    /// Detect clusters among `names`, skipping groupings whose key is in `ignored`.
    pub fn detect<I, S>(&self, names: I, aliases: &AliasMap, ignored: &HashSet<String>) -> Detection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let universe = Self::universe(names, aliases);
        let universe_size = universe.len();

        let max = self.matcher.config().max_universe;
        if universe_size > max {
            warn!(
                "Skipping duplicate detection: {} unique names exceeds limit of {}",
                universe_size, max
            );
            return Detection {
                clusters: Vec::new(),
                universe_size,
                skipped: true,
            };
        }

        let canonical: Vec<CanonicalName> = universe.iter().map(|n| CanonicalName::new(n)).collect();
        let mut uf = UnionFind::new(universe_size);

        for i in 0..universe_size {
            for j in (i + 1)..universe_size {
                if self.matcher.compare(&canonical[i], &canonical[j]).is_some() {
                    uf.union(i, j);
                }
            }
        }

        // Group by root, keeping first-seen order for groups and members.
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<String>> = Vec::new();
        for (i, name) in universe.iter().enumerate() {
            let root = uf.find(i);
            let idx = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[idx].push(name.clone());
        }

        let clusters: Vec<Cluster> = groups
            .into_iter()
            .filter(|g| g.len() > 1)
            .map(Cluster::from_members)
            .filter(|c| !ignored.contains(&c.key))
            .collect();

        debug!(
            "Duplicate detection: {} names, {} clusters",
            universe_size,
            clusters.len()
        );

        Detection {
            clusters,
            universe_size,
            skipped: false,
        }
    }
}
