use std::collections::HashSet;

use crate::graph::{Edge, Relation};

/// Input edges partitioned by relation, in input order within each bucket.
#[derive(Debug, Default)]
pub struct EdgeBuckets<'a> {
    pub has_session: Vec<&'a Edge>,
    pub spawned: Vec<&'a Edge>,
    pub contains: Vec<&'a Edge>,
    pub followed_by: Vec<&'a Edge>,
    /// Targets of at least one `FOLLOWED_BY` edge.
    pub has_predecessor: HashSet<&'a str>,
    /// Edges whose relation the engine does not visualize.
    pub ignored: usize,
}

/// Partition edges by relation. Unknown relations are counted and skipped.
pub fn classify(edges: &[Edge]) -> EdgeBuckets<'_> {
    let mut buckets = EdgeBuckets::default();
    for edge in edges {
        match edge.relation {
            Relation::HasSession => buckets.has_session.push(edge),
            Relation::Spawned => buckets.spawned.push(edge),
            Relation::Contains => buckets.contains.push(edge),
            Relation::FollowedBy => {
                buckets.followed_by.push(edge);
                buckets.has_predecessor.insert(edge.target.as_str());
            }
            Relation::Other(_) => buckets.ignored += 1,
        }
    }
    buckets
}

impl<'a> EdgeBuckets<'a> {
    /// Edges used for leveling and drawing: every structural and temporal
    /// edge, plus only the `CONTAINS` edges that point at the head of a
    /// temporal chain. Later chain members are reached through `FOLLOWED_BY`.
    pub fn display_edges(&self) -> Vec<&'a Edge> {
        let entry_points = self
            .contains
            .iter()
            .copied()
            .filter(|e| !self.has_predecessor.contains(e.target.as_str()));

        self.has_session
            .iter()
            .chain(&self.spawned)
            .chain(&self.followed_by)
            .copied()
            .chain(entry_points)
            .collect()
    }
}
