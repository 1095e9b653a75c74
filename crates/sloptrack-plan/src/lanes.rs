//! Parallel-safe lane partitioning.
//!
//! Automated fixes form one cascade-ordered lane. Manual work partitions
//! by file overlap: items touching disjoint file sets can proceed in
//! parallel, items sharing files serialize within one lane.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use sloptrack_registry::{ActionKind, DetectorRegistry};

use crate::{ItemKind, QueueItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Automation {
    Full,
    Manual,
}

/// One schedulable unit of work.
#[derive(Debug, Clone, Serialize)]
pub struct Lane {
    pub name: String,
    /// Item IDs in execution order.
    pub items: Vec<String>,
    pub file_count: usize,
    pub automation: Automation,
    /// Must complete before other lanes start (its files overlap theirs).
    pub run_first: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanLanes {
    pub lanes: Vec<Lane>,
    /// True when at least two lanes can proceed independently.
    pub can_parallelize: bool,
}

/// Index-based union-find with path compression and union by rank.
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

fn file_set(item: &QueueItem) -> BTreeSet<&str> {
    item.files.iter().map(String::as_str).collect()
}

/// Partition ranked queue items into lanes.
pub fn build_lanes(items: &[QueueItem], registry: &DetectorRegistry) -> PlanLanes {
    let mut cleanup: Vec<&QueueItem> = Vec::new();
    let mut restructure: Vec<&QueueItem> = Vec::new();
    let mut manual: Vec<&QueueItem> = Vec::new();
    let mut review: Vec<&QueueItem> = Vec::new();

    for item in items {
        if item.kind == ItemKind::SubjectiveDimension {
            continue;
        }
        if item.is_review {
            review.push(item);
            continue;
        }
        match item.action {
            ActionKind::AutoFix => cleanup.push(item),
            ActionKind::Reorganize => restructure.push(item),
            ActionKind::Refactor | ActionKind::ManualFix | ActionKind::Review => {
                manual.push(item)
            }
        }
    }

    let mut lanes: Vec<Lane> = Vec::new();
    let mut cleanup_files: BTreeSet<&str> = BTreeSet::new();

    if !cleanup.is_empty() {
        // Cascade order: earlier fixers can resolve later detectors' stale
        // findings, so honoring the table avoids churn.
        cleanup.sort_by(|a, b| {
            registry
                .cascade_rank(&a.detector)
                .cmp(&registry.cascade_rank(&b.detector))
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.id.cmp(&b.id))
        });
        for item in &cleanup {
            cleanup_files.extend(file_set(item));
        }
        lanes.push(Lane {
            name: "cleanup".to_string(),
            items: cleanup.iter().map(|i| i.id.clone()).collect(),
            file_count: cleanup_files.len(),
            automation: Automation::Full,
            run_first: false,
        });
    }

    if !restructure.is_empty() {
        // Moves and renames conflict with everything; one serialized lane.
        let files: BTreeSet<&str> = restructure.iter().flat_map(|i| file_set(i)).collect();
        lanes.push(Lane {
            name: "restructure".to_string(),
            items: restructure.iter().map(|i| i.id.clone()).collect(),
            file_count: files.len(),
            automation: Automation::Manual,
            run_first: false,
        });
    }

    if !manual.is_empty() {
        let mut sets = DisjointSets::new(manual.len());
        let mut owner_by_file: BTreeMap<&str, usize> = BTreeMap::new();
        for (index, item) in manual.iter().enumerate() {
            for file in file_set(item) {
                match owner_by_file.get(file) {
                    Some(owner) => sets.union(*owner, index),
                    None => {
                        owner_by_file.insert(file, index);
                    }
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<&QueueItem>> = BTreeMap::new();
        for (index, item) in manual.iter().enumerate() {
            groups.entry(sets.find(index)).or_default().push(item);
        }

        let multiple = groups.len() > 1;
        for (lane_index, group) in groups.values().enumerate() {
            let files: BTreeSet<&str> = group.iter().flat_map(|i| file_set(i)).collect();
            let name = if multiple {
                format!("refactor_{lane_index}")
            } else {
                "refactor".to_string()
            };
            lanes.push(Lane {
                name,
                items: group.iter().map(|i| i.id.clone()).collect(),
                file_count: files.len(),
                automation: Automation::Manual,
                run_first: false,
            });
        }
    }

    if !review.is_empty() {
        lanes.push(Lane {
            name: "review".to_string(),
            items: review.iter().map(|i| i.id.clone()).collect(),
            file_count: review.iter().flat_map(|i| file_set(i)).collect::<BTreeSet<_>>().len(),
            automation: Automation::Manual,
            run_first: false,
        });
    }

    // Cleanup goes first when its files overlap another lane, otherwise it
    // can run alongside everything else.
    if !cleanup_files.is_empty() {
        let overlaps = items.iter().any(|item| {
            !matches!(item.action, ActionKind::AutoFix)
                && item.kind == ItemKind::Finding
                && item.files.iter().any(|f| cleanup_files.contains(f.as_str()))
        });
        if overlaps && let Some(lane) = lanes.iter_mut().find(|l| l.name == "cleanup") {
            lane.run_first = true;
        }
    }

    let independent = lanes.iter().filter(|lane| !lane.run_first).count();
    PlanLanes {
        lanes,
        can_parallelize: independent >= 2,
    }
}
