//! A*-style search for closed walks that approximate a target curve.
//!
//! Unlike point-to-point A*, the goal here is to return to `start` after
//! visiting at least two other nodes, so both the expansion and the
//! visited-set dedup differ from textbook A*.

use crate::core::types::{Coordinate, PathCandidate, WeightVector};
use crate::cost::CostKernel;
use crate::graph::RoadGraph;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One entry in the A* open set: a path prefix plus its running costs.
#[derive(Clone)]
struct OpenEntry {
    node_id: u64,
    path: Vec<u64>,
    g_cost: f64,
    f_cost: f64,
    realized_km: f64,
    traffic_light_count: u32,
    insertion_order: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.insertion_order == other.insertion_order
    }
}
impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    /// Reversed so `BinaryHeap` (a max-heap) pops the lowest `f_cost`
    /// first; ties broken by insertion order for determinism.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.insertion_order.cmp(&self.insertion_order))
    }
}

/// Visited-set key: dedup by node id and a 100-meter length bucket, so a
/// node can be legitimately revisited on a longer walk without endlessly
/// re-exploring near-identical shorter prefixes.
fn length_bucket(realized_km: f64) -> i64 {
    (realized_km * 10.0).floor() as i64
}

pub struct AStarFinder<'a> {
    graph: &'a RoadGraph,
    kernel: CostKernel<'a>,
    max_iterations: usize,
}

impl<'a> AStarFinder<'a> {
    pub fn new(graph: &'a RoadGraph, kernel: CostKernel<'a>, max_iterations: usize) -> Self {
        Self {
            graph,
            kernel,
            max_iterations,
        }
    }

    pub fn target_curve(&self) -> &[Coordinate] {
        self.kernel.target_curve()
    }

    pub fn weights(&self) -> WeightVector {
        self.kernel.weights()
    }

    /// Searches for the best closed walk from `start` back to `start`.
    /// Returns `None` if `start` is unknown, no closure is found within
    /// the iteration budget, or `start` has zero feasible neighbors.
    pub fn find_closed_path(&self, start: u64) -> Option<PathCandidate> {
        let start_node = self.graph.get_node(start)?;

        let mut open_set: BinaryHeap<OpenEntry> = BinaryHeap::new();
        let mut visited: FxHashMap<(u64, i64), f64> = FxHashMap::default();
        let mut next_insertion: u64 = 0;

        open_set.push(OpenEntry {
            node_id: start,
            path: vec![start],
            g_cost: 0.0,
            f_cost: 0.0,
            realized_km: 0.0,
            traffic_light_count: 0,
            insertion_order: next_insertion,
        });
        next_insertion += 1;

        let mut best: Option<PathCandidate> = None;
        let mut best_cost = f64::INFINITY;
        let mut iterations = 0usize;

        while let Some(current) = open_set.pop() {
            iterations += 1;
            if iterations > self.max_iterations {
                break;
            }

            if current.node_id == start && current.path.len() > 3 {
                if let Ok(result) = self.kernel.evaluate(&current.path, self.graph) {
                    if result.total_cost < best_cost {
                        best_cost = result.total_cost;
                        best = Some(PathCandidate {
                            path: current.path.clone(),
                            g_cost: current.g_cost,
                            f_cost: result.total_cost,
                            shape_distance: result.shape_distance,
                            length_penalty: result.length_penalty,
                            crossing_penalty: result.crossing_penalty,
                            path_length_km: result.path_length_km,
                            traffic_light_count: result.traffic_light_count,
                        });
                    }
                }
                continue;
            }

            let key = (current.node_id, length_bucket(current.realized_km));
            if let Some(&prior_g) = visited.get(&key) {
                if prior_g <= current.g_cost {
                    continue;
                }
            }
            visited.insert(key, current.g_cost);

            let current_node = match self.graph.get_node(current.node_id) {
                Some(n) => n,
                None => continue,
            };

            for neighbor_id in self.graph.neighbors(current.node_id) {
                if current.path[1..].contains(&neighbor_id) {
                    continue;
                }

                let neighbor = match self.graph.get_node(neighbor_id) {
                    Some(n) => n,
                    None => continue,
                };
                let edge = match self.graph.edge_between(current.node_id, neighbor_id) {
                    Some(e) => e,
                    None => continue,
                };

                let mut new_path = current.path.clone();
                new_path.push(neighbor_id);
                let new_realized_km = current.realized_km + edge.length_km();

                let mut new_lights = current.traffic_light_count;
                if neighbor.has_traffic_light && neighbor_id != start {
                    new_lights += 1;
                }

                let edge_cost = self.kernel.edge_cost(current_node, neighbor, edge.length_km());
                let new_g = current.g_cost + edge_cost;
                let h_cost = self.kernel.heuristic(neighbor, start_node, new_realized_km);

                open_set.push(OpenEntry {
                    node_id: neighbor_id,
                    path: new_path,
                    g_cost: new_g,
                    f_cost: new_g + h_cost,
                    realized_km: new_realized_km,
                    traffic_light_count: new_lights,
                    insertion_order: next_insertion,
                });
                next_insertion += 1;
            }
        }

        best
    }

    /// Searches for a path from `start` to a fixed `goal`, with no
    /// closure constraint. Used only by non-core collaborators — the
    /// engine's own sweep always calls [`AStarFinder::find_closed_path`].
    pub fn find_path_to_goal(&self, start: u64, goal: u64) -> Option<PathCandidate> {
        let start_node = self.graph.get_node(start)?;
        let goal_node = self.graph.get_node(goal)?;

        let mut open_set: BinaryHeap<OpenEntry> = BinaryHeap::new();
        let mut visited: FxHashMap<u64, f64> = FxHashMap::default();
        let mut next_insertion: u64 = 0;

        open_set.push(OpenEntry {
            node_id: start,
            path: vec![start],
            g_cost: 0.0,
            f_cost: 0.0,
            realized_km: 0.0,
            traffic_light_count: 0,
            insertion_order: next_insertion,
        });
        next_insertion += 1;

        let mut iterations = 0usize;

        while let Some(current) = open_set.pop() {
            iterations += 1;
            if iterations > self.max_iterations {
                return None;
            }

            if current.node_id == goal {
                return self.kernel.evaluate(&current.path, self.graph).ok().map(|result| {
                    PathCandidate {
                        path: current.path.clone(),
                        g_cost: current.g_cost,
                        f_cost: result.total_cost,
                        shape_distance: result.shape_distance,
                        length_penalty: result.length_penalty,
                        crossing_penalty: result.crossing_penalty,
                        path_length_km: result.path_length_km,
                        traffic_light_count: result.traffic_light_count,
                    }
                });
            }

            if let Some(&prior_g) = visited.get(&current.node_id) {
                if prior_g <= current.g_cost {
                    continue;
                }
            }
            visited.insert(current.node_id, current.g_cost);

            let current_node = match self.graph.get_node(current.node_id) {
                Some(n) => n,
                None => continue,
            };

            for neighbor_id in self.graph.neighbors(current.node_id) {
                if current.path.contains(&neighbor_id) {
                    continue;
                }
                let neighbor = match self.graph.get_node(neighbor_id) {
                    Some(n) => n,
                    None => continue,
                };
                let edge = match self.graph.edge_between(current.node_id, neighbor_id) {
                    Some(e) => e,
                    None => continue,
                };

                let mut new_path = current.path.clone();
                new_path.push(neighbor_id);
                let new_realized_km = current.realized_km + edge.length_km();

                let mut new_lights = current.traffic_light_count;
                if neighbor.has_traffic_light {
                    new_lights += 1;
                }

                let edge_cost = self.kernel.edge_cost(current_node, neighbor, edge.length_km());
                let new_g = current.g_cost + edge_cost;
                let h_cost = self.kernel.simple_heuristic(neighbor, goal_node);

                open_set.push(OpenEntry {
                    node_id: neighbor_id,
                    path: new_path,
                    g_cost: new_g,
                    f_cost: new_g + h_cost,
                    realized_km: new_realized_km,
                    traffic_light_count: new_lights,
                    insertion_order: next_insertion,
                });
                next_insertion += 1;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node, RoadClass};

    fn triangle_graph() -> RoadGraph {
        let mut g = RoadGraph::new();
        g.add_node(Node { id: 1, lat: 0.0, lng: 0.0, has_traffic_light: false });
        g.add_node(Node { id: 2, lat: 0.0, lng: 0.01, has_traffic_light: false });
        g.add_node(Node { id: 3, lat: 0.01, lng: 0.005, has_traffic_light: false });
        for (i, (a, b)) in [(1u64, 2u64), (2, 3), (3, 1)].into_iter().enumerate() {
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

    fn triangle_curve() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.01),
            Coordinate::new(0.01, 0.005),
            Coordinate::new(0.0, 0.0),
        ]
    }

    #[test]
    fn finds_closed_triangle_walk() {
        let g = triangle_graph();
        let curve = triangle_curve();
        let kernel =
            CostKernel::new(&curve, 3.0, 0, WeightVector::new(0.34, 0.33, 0.33)).unwrap();
        let finder = AStarFinder::new(&g, kernel, 10_000);
        let found = finder.find_closed_path(1).expect("triangle should close");
        assert_eq!(found.path.first(), found.path.last());
        assert!(found.path.len() >= 4);
        let interior: std::collections::HashSet<_> = found.path[1..found.path.len() - 1].iter().collect();
        assert_eq!(interior.len(), found.path.len() - 2);
    }

    /// Two triangles sharing node 1 (a bowtie): `1-2-3-1` and `1-4-5-1`.
    /// A finder that let `start` re-enter mid-walk could stitch both
    /// triangles into one candidate (`[1,2,3,1,4,5,1]`), putting `start`
    /// at three positions instead of two.
    fn bowtie_graph() -> RoadGraph {
        let mut g = RoadGraph::new();
        for (id, lat, lng) in [
            (1u64, 0.0, 0.0),
            (2, 0.0, 0.01),
            (3, 0.01, 0.005),
            (4, 0.0, -0.01),
            (5, -0.01, -0.005),
        ] {
            g.add_node(Node { id, lat, lng, has_traffic_light: false });
        }
        for (i, (a, b)) in [(1u64, 2u64), (2, 3), (3, 1), (1, 4), (4, 5), (5, 1)]
            .into_iter()
            .enumerate()
        {
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
    fn closed_path_never_revisits_start_mid_walk() {
        let g = bowtie_graph();
        let curve = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.01),
            Coordinate::new(0.01, 0.005),
            Coordinate::new(0.0, 0.0),
        ];
        let kernel =
            CostKernel::new(&curve, 3.0, 0, WeightVector::new(0.34, 0.33, 0.33)).unwrap();
        let finder = AStarFinder::new(&g, kernel, 10_000);
        let found = finder.find_closed_path(1).expect("a triangle should close");

        let start_occurrences = found.path.iter().filter(|&&id| id == 1).count();
        assert_eq!(start_occurrences, 2, "start must appear only at both endpoints");
        assert_eq!(found.path.first(), Some(&1));
        assert_eq!(found.path.last(), Some(&1));
    }

    #[test]
    fn no_closure_on_line_graph() {
        let mut g = RoadGraph::new();
        for id in 1..=4u64 {
            g.add_node(Node { id, lat: 0.0, lng: id as f64 * 0.01, has_traffic_light: false });
        }
        for (i, (a, b)) in [(1u64, 2u64), (2, 3), (3, 4)].into_iter().enumerate() {
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
        let curve = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.03)];
        let kernel =
            CostKernel::new(&curve, 3.0, 0, WeightVector::new(0.34, 0.33, 0.33)).unwrap();
        let finder = AStarFinder::new(&g, kernel, 1_000);
        assert!(finder.find_closed_path(1).is_none());
    }

    #[test]
    fn unknown_start_returns_none() {
        let g = triangle_graph();
        let curve = triangle_curve();
        let kernel =
            CostKernel::new(&curve, 3.0, 0, WeightVector::new(0.34, 0.33, 0.33)).unwrap();
        let finder = AStarFinder::new(&g, kernel, 1_000);
        assert!(finder.find_closed_path(999).is_none());
    }
}
