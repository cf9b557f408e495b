use crate::core::types::Coordinate;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Road classification, carried through from the on-disk cache format
/// but otherwise opaque to the core — it plays no part in the cost
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadClass {
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Footway,
    Path,
    Cycleway,
    Unknown,
}

impl Default for RoadClass {
    fn default() -> Self {
        RoadClass::Unknown
    }
}

/// A stable, geo-located intersection or junction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub has_traffic_light: bool,
}

impl Node {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// A road segment connecting two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: u64,
    pub source_id: u64,
    pub target_id: u64,
    pub length_m: f64,
    #[serde(default, rename = "road_type")]
    pub road_class: RoadClass,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_oneway: bool,
}

impl Edge {
    pub fn length_km(&self) -> f64 {
        self.length_m / 1000.0
    }
}

#[derive(Clone, Debug)]
struct IndexedNode {
    id: u64,
    point: [f64; 2],
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// A flat, read-only store of a road network: a node table, an edge
/// table, and adjacency derived from the edges on insertion. Addressed by
/// stable integer ids rather than pointers, so it is trivially shareable
/// across worker threads during a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadGraph {
    nodes: FxHashMap<u64, Node>,
    edges: FxHashMap<u64, Edge>,
    adjacency: FxHashMap<u64, FxHashSet<u64>>,
    #[serde(skip)]
    spatial_index: RTree<IndexedNode>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.adjacency.entry(node.id).or_default();
        self.nodes.insert(node.id, node);
    }

    /// Adds an edge and derives adjacency: `v` always becomes reachable
    /// from `u`; `u` becomes reachable from `v` only if the edge is
    /// two-way.
    pub fn add_edge(&mut self, edge: Edge) {
        self.adjacency.entry(edge.source_id).or_default();
        self.adjacency.entry(edge.target_id).or_default();

        self.adjacency
            .get_mut(&edge.source_id)
            .unwrap()
            .insert(edge.target_id);
        if !edge.is_oneway {
            self.adjacency
                .get_mut(&edge.target_id)
                .unwrap()
                .insert(edge.source_id);
        }

        self.edges.insert(edge.id, edge);
    }

    /// Builds the spatial index used by [`RoadGraph::nearest_node`]. Must
    /// be called (or re-called) after nodes are inserted; a fresh
    /// `RoadGraph` has an empty index.
    pub fn build_spatial_index(&mut self) {
        let points: Vec<IndexedNode> = self
            .nodes
            .values()
            .map(|n| IndexedNode {
                id: n.id,
                point: [n.lng, n.lat],
            })
            .collect();
        self.spatial_index = RTree::bulk_load(points);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get_node(&self, id: u64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Neighbor ids of `id`, respecting one-way semantics. Empty if `id`
    /// is unknown.
    pub fn neighbors(&self, id: u64) -> impl Iterator<Item = u64> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    pub fn neighbor_count(&self, id: u64) -> usize {
        self.adjacency.get(&id).map_or(0, |s| s.len())
    }

    /// The stored edge between `u` and `v`, regardless of which endpoint
    /// is `source_id`/`target_id`, as long as direction is honored for
    /// one-way edges.
    pub fn edge_between(&self, u: u64, v: u64) -> Option<&Edge> {
        self.edges.values().find(|e| {
            (e.source_id == u && e.target_id == v)
                || (!e.is_oneway && e.source_id == v && e.target_id == u)
        })
    }

    /// Nearest node to `(lat, lng)` by straight-line distance. Uses the
    /// spatial index if [`RoadGraph::build_spatial_index`] has been
    /// called; otherwise falls back to a brute-force scan, which is fine
    /// for the small, bounding-box-scale graphs this engine targets.
    pub fn nearest_node(&self, lat: f64, lng: f64) -> Option<&Node> {
        if self.spatial_index.size() != 0 {
            if let Some(found) = self
                .spatial_index
                .nearest_neighbor(&[lng, lat])
                .and_then(|indexed| self.nodes.get(&indexed.id))
            {
                return Some(found);
            }
        }

        self.nodes.values().min_by(|a, b| {
            let da = crate::spatial::geometry::haversine_distance(a.lat, a.lng, lat, lng);
            let db = crate::spatial::geometry::haversine_distance(b.lat, b.lng, lat, lng);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_graph() -> RoadGraph {
        let mut g = RoadGraph::new();
        g.add_node(Node { id: 1, lat: 0.0, lng: 0.0, has_traffic_light: false });
        g.add_node(Node { id: 2, lat: 0.0, lng: 0.01, has_traffic_light: false });
        g.add_node(Node { id: 3, lat: 0.01, lng: 0.01, has_traffic_light: false });
        g.add_node(Node { id: 4, lat: 0.01, lng: 0.0, has_traffic_light: false });
        for (i, (a, b)) in [(1, 2), (2, 3), (3, 4), (4, 1)].into_iter().enumerate() {
            g.add_edge(Edge {
                id: i as u64,
                source_id: a,
                target_id: b,
                length_m: 1000.0,
                road_class: RoadClass::Residential,
                name: None,
                is_oneway: false,
            });
        }
        g
    }

    #[test]
    fn two_way_edge_is_reachable_from_both_ends() {
        let g = square_graph();
        assert!(g.neighbors(1).any(|n| n == 2));
        assert!(g.neighbors(2).any(|n| n == 1));
    }

    #[test]
    fn one_way_edge_is_only_reachable_forward() {
        let mut g = RoadGraph::new();
        g.add_node(Node { id: 1, lat: 0.0, lng: 0.0, has_traffic_light: false });
        g.add_node(Node { id: 2, lat: 0.0, lng: 0.01, has_traffic_light: false });
        g.add_edge(Edge {
            id: 0,
            source_id: 1,
            target_id: 2,
            length_m: 500.0,
            road_class: RoadClass::Unknown,
            name: None,
            is_oneway: true,
        });
        assert!(g.neighbors(1).any(|n| n == 2));
        assert!(!g.neighbors(2).any(|n| n == 1));
        assert!(g.edge_between(1, 2).is_some());
        assert!(g.edge_between(2, 1).is_none());
    }

    #[test]
    fn nearest_node_without_index_falls_back_to_brute_force() {
        let g = square_graph();
        let nearest = g.nearest_node(0.0001, 0.0001).unwrap();
        assert_eq!(nearest.id, 1);
    }

    #[test]
    fn nearest_node_with_index_matches_brute_force() {
        let mut g = square_graph();
        g.build_spatial_index();
        let nearest = g.nearest_node(0.0095, 0.0095).unwrap();
        assert_eq!(nearest.id, 3);
    }
}
