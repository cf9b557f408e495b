//! The cost kernel: three normalized sub-costs and their weighted sum.
//!
//! `ShapeDistance` measures how well a walk traces the target curve,
//! `LengthPenalty` how close its length lands to the target distance, and
//! `CrossingPenalty` how far it overshoots the signalized-crossing budget.
//! The A* finder reuses [`CostKernel::edge_cost`] as its per-step cost so
//! that the heuristic and the exact evaluation share one definition.

use crate::core::errors::{CoreError, Result};
use crate::core::types::{Coordinate, WeightVector};
use crate::graph::{Node, RoadGraph};
use crate::spatial::geometry::{haversine_coord, min_distance_to_curve};

/// Number of points sampled along each edge when measuring shape distance.
/// Must be at least 3 to catch an edge that bows away from the curve
/// between its endpoints.
const EDGE_SAMPLE_COUNT: usize = 3;

/// Breakdown of a path's cost against the target shape, distance, and
/// crossing budget, plus the weighted total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostResult {
    pub shape_distance: f64,
    pub length_penalty: f64,
    pub crossing_penalty: f64,
    pub total_cost: f64,
    pub path_length_km: f64,
    pub traffic_light_count: u32,
}

/// Bundles the target curve, target distance, crossing budget and weight
/// triple that together define a scoring for one A* invocation.
pub struct CostKernel<'a> {
    target_curve: &'a [Coordinate],
    target_distance_km: f64,
    max_crossings: u32,
    weights: WeightVector,
}

impl<'a> CostKernel<'a> {
    pub fn new(
        target_curve: &'a [Coordinate],
        target_distance_km: f64,
        max_crossings: u32,
        weights: WeightVector,
    ) -> Result<Self> {
        if target_curve.len() < 2 {
            return Err(CoreError::InvalidInput(
                "target curve must have at least two points".into(),
            ));
        }
        if target_distance_km <= 0.0 {
            return Err(CoreError::InvalidInput(
                "target distance must be positive".into(),
            ));
        }
        Ok(Self {
            target_curve,
            target_distance_km,
            max_crossings,
            weights,
        })
    }

    pub fn target_distance_km(&self) -> f64 {
        self.target_distance_km
    }

    pub fn max_crossings(&self) -> u32 {
        self.max_crossings
    }

    pub fn weights(&self) -> WeightVector {
        self.weights
    }

    pub fn target_curve(&self) -> &[Coordinate] {
        self.target_curve
    }

    fn sample_edge_points(&self, a: &Node, b: &Node) -> [Coordinate; EDGE_SAMPLE_COUNT] {
        let mut samples = [Coordinate::new(0.0, 0.0); EDGE_SAMPLE_COUNT];
        for (i, slot) in samples.iter_mut().enumerate() {
            let t = i as f64 / (EDGE_SAMPLE_COUNT - 1) as f64;
            *slot = Coordinate::new(
                a.lat + t * (b.lat - a.lat),
                a.lng + t * (b.lng - a.lng),
            );
        }
        samples
    }

    /// Average of the minimum distances from `s` points sampled along
    /// edge `a -> b` to the target curve.
    pub fn edge_shape_distance(&self, a: &Node, b: &Node) -> f64 {
        let samples = self.sample_edge_points(a, b);
        let sum: f64 = samples
            .iter()
            .map(|s| min_distance_to_curve(*s, self.target_curve))
            .sum();
        sum / samples.len() as f64
    }

    fn raw_shape_distance(&self, path: &[u64], graph: &RoadGraph) -> f64 {
        path.windows(2)
            .filter_map(|w| Some((graph.get_node(w[0])?, graph.get_node(w[1])?)))
            .map(|(a, b)| self.edge_shape_distance(a, b))
            .sum()
    }

    fn path_length_km(&self, path: &[u64], graph: &RoadGraph) -> f64 {
        path.windows(2)
            .filter_map(|w| graph.edge_between(w[0], w[1]))
            .map(|e| e.length_km())
            .sum()
    }

    /// Count of intermediate nodes (excluding the first and last index)
    /// carrying the traffic-signal flag.
    pub fn count_traffic_lights(&self, path: &[u64], graph: &RoadGraph) -> u32 {
        if path.len() <= 2 {
            return 0;
        }
        path[1..path.len() - 1]
            .iter()
            .filter(|id| graph.get_node(**id).is_some_and(|n| n.has_traffic_light))
            .count() as u32
    }

    /// Full cost evaluation of a closed (or open) path against this
    /// kernel's target curve, distance, and crossing budget.
    pub fn evaluate(&self, path: &[u64], graph: &RoadGraph) -> Result<CostResult> {
        if path.len() < 2 {
            return Err(CoreError::InvalidInput(
                "path must have at least two nodes".into(),
            ));
        }

        let raw_shape = self.raw_shape_distance(path, graph);
        let shape_distance = raw_shape / self.target_distance_km;

        let path_length_km = self.path_length_km(path, graph);
        let length_penalty =
            (path_length_km - self.target_distance_km).abs() / self.target_distance_km;

        let traffic_light_count = self.count_traffic_lights(path, graph);
        let crossing_raw = (traffic_light_count as f64 - self.max_crossings as f64).max(0.0);
        let crossing_penalty = crossing_raw / (self.max_crossings as f64 + 1.0);

        let total_cost = self.weights.alpha * shape_distance
            + self.weights.beta * length_penalty
            + self.weights.gamma * crossing_penalty;

        Ok(CostResult {
            shape_distance,
            length_penalty,
            crossing_penalty,
            total_cost,
            path_length_km,
            traffic_light_count,
        })
    }

    /// Per-step cost for the A* move `u -> v` over `edge`, in the same
    /// normalized units as [`CostKernel::evaluate`]'s total cost.
    pub fn edge_cost(&self, u: &Node, v: &Node, edge_length_km: f64) -> f64 {
        let shape_cost = self.edge_shape_distance(u, v) / self.target_distance_km;
        let length_cost = edge_length_km / self.target_distance_km;
        let crossing_cost = if v.has_traffic_light {
            1.0 / (self.max_crossings as f64 + 1.0)
        } else {
            0.0
        };

        self.weights.alpha * shape_cost
            + self.weights.beta * length_cost
            + self.weights.gamma * crossing_cost
    }

    /// Admissible-in-practice heuristic for the A* search:
    /// distance remaining to the target length, traded off against
    /// distance to the closest point of the target curve. `gamma` is
    /// deliberately omitted since future signal exposure is unknown, and
    /// the whole thing is scaled by 0.5 to stay conservative.
    pub fn heuristic(&self, current: &Node, start: &Node, realized_km: f64) -> f64 {
        let dist_to_start = haversine_coord(current.coordinate(), start.coordinate());
        let remaining = (self.target_distance_km - realized_km).max(0.0);
        let min_curve_dist = min_distance_to_curve(current.coordinate(), self.target_curve);

        let h = self.weights.alpha * (min_curve_dist / self.target_distance_km)
            + self.weights.beta * ((remaining - dist_to_start).abs() / self.target_distance_km);

        0.5 * h
    }

    /// Straight-line-distance heuristic for the fixed-goal search: no
    /// shape or remaining-length term, just distance to `goal` scaled by
    /// `beta` and normalized by the target distance.
    pub fn simple_heuristic(&self, current: &Node, goal: &Node) -> f64 {
        let dist = haversine_coord(current.coordinate(), goal.coordinate());
        dist / self.target_distance_km * self.weights.beta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, RoadClass};

    fn square_graph() -> RoadGraph {
        let mut g = RoadGraph::new();
        g.add_node(Node { id: 1, lat: 37.5, lng: 127.0, has_traffic_light: false });
        g.add_node(Node { id: 2, lat: 37.5, lng: 127.01, has_traffic_light: false });
        g.add_node(Node { id: 3, lat: 37.51, lng: 127.01, has_traffic_light: false });
        g.add_node(Node { id: 4, lat: 37.51, lng: 127.0, has_traffic_light: false });
        for (i, (a, b, len)) in [(1u64, 2u64, 880.0), (2, 3, 1110.0), (3, 4, 880.0), (4, 1, 1110.0)]
            .into_iter()
            .enumerate()
        {
            g.add_edge(Edge {
                id: i as u64,
                source_id: a,
                target_id: b,
                length_m: len,
                road_class: RoadClass::Residential,
                name: None,
                is_oneway: false,
            });
        }
        g
    }

    fn square_curve() -> Vec<Coordinate> {
        vec![
            Coordinate::new(37.5, 127.0),
            Coordinate::new(37.5, 127.01),
            Coordinate::new(37.51, 127.01),
            Coordinate::new(37.51, 127.0),
            Coordinate::new(37.5, 127.0),
        ]
    }

    #[test]
    fn rejects_degenerate_curve() {
        let g = square_graph();
        let curve = vec![Coordinate::new(37.5, 127.0)];
        let kernel = CostKernel::new(&curve, 3.98, 0, WeightVector::new(0.34, 0.33, 0.33));
        assert!(kernel.is_err());
        let _ = g;
    }

    #[test]
    fn rejects_nonpositive_target_distance() {
        let curve = square_curve();
        let kernel = CostKernel::new(&curve, 0.0, 0, WeightVector::new(0.34, 0.33, 0.33));
        assert!(kernel.is_err());
    }

    #[test]
    fn perfect_square_match_has_low_shape_distance_and_no_crossings() {
        let g = square_graph();
        let curve = square_curve();
        let kernel =
            CostKernel::new(&curve, 3.98, 0, WeightVector::new(0.34, 0.33, 0.33)).unwrap();
        let path = vec![1, 2, 3, 4, 1];
        let result = kernel.evaluate(&path, &g).unwrap();
        assert!(result.shape_distance < 0.05);
        assert_eq!(result.traffic_light_count, 0);
        assert_eq!(result.crossing_penalty, 0.0);
        assert!((result.path_length_km - 3.98).abs() < 0.2);
    }

    #[test]
    fn crossing_penalty_is_zero_under_budget() {
        let mut g = square_graph();
        g.add_node(Node { id: 5, lat: 37.505, lng: 127.005, has_traffic_light: true });
        let curve = square_curve();
        let kernel =
            CostKernel::new(&curve, 3.98, 1, WeightVector::new(0.34, 0.33, 0.33)).unwrap();
        let count = kernel.count_traffic_lights(&[1, 5, 3], &g);
        assert_eq!(count, 1);
    }

    #[test]
    fn crossing_penalty_reflects_overshoot_at_zero_budget() {
        let mut g = square_graph();
        g.add_node(Node { id: 5, lat: 37.505, lng: 127.005, has_traffic_light: true });
        let curve = square_curve();
        let kernel =
            CostKernel::new(&curve, 3.98, 0, WeightVector::new(0.0, 0.0, 1.0)).unwrap();
        let result = kernel.evaluate(&[1, 5, 3], &g).unwrap();
        assert_eq!(result.crossing_penalty, 1.0);
    }

    #[test]
    fn evaluate_rejects_single_node_path() {
        let g = square_graph();
        let curve = square_curve();
        let kernel =
            CostKernel::new(&curve, 3.98, 0, WeightVector::new(0.34, 0.33, 0.33)).unwrap();
        assert!(kernel.evaluate(&[1], &g).is_err());
    }
}
