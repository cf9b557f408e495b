//! Orchestrates the rotation x weight sweep: generates rotated target
//! curves, samples weight vectors, runs an A* finder per combination, and
//! hands the collected candidates to the Pareto filter.

use crate::core::errors::{CoreError, Result};
use crate::core::types::{Coordinate, PathCandidate, RouteInfo, SearchConfig, WeightVector};
use crate::cost::CostKernel;
use crate::astar::AStarFinder;
use crate::graph::RoadGraph;
use crate::pareto::ParetoFilter;
use crate::spatial::geometry::rotate_curve;
use crate::weights::WeightSampler;
use rayon::prelude::*;

const ROTATION_ANGLES: [f64; 6] = [0.0, 60.0, 120.0, 180.0, 240.0, 300.0];

/// `1 / (1 + shape_distance)`, always in `(0, 1]` regardless of how large
/// `shape_distance` gets.
fn shape_similarity(shape_distance: f64) -> f64 {
    1.0 / (1.0 + shape_distance)
}

pub struct RouteFinder<'a> {
    graph: &'a RoadGraph,
    config: SearchConfig,
}

impl<'a> RouteFinder<'a> {
    pub fn new(graph: &'a RoadGraph, config: SearchConfig) -> Self {
        Self { graph, config }
    }

    /// Picks a reasonable start node near the first point of the target
    /// curve, preferring an actual intersection (`neighbor_count >= 2`) so
    /// a closed walk is possible at all.
    fn find_start_node(&self, target_curve: &[Coordinate]) -> Option<u64> {
        let anchor = target_curve.first()?;

        let best_junction = self
            .graph
            .nodes()
            .filter(|n| self.graph.neighbor_count(n.id) >= 2)
            .min_by(|a, b| {
                let da = crate::spatial::geometry::haversine_coord(a.coordinate(), *anchor);
                let db = crate::spatial::geometry::haversine_coord(b.coordinate(), *anchor);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });

        best_junction
            .map(|n| n.id)
            .or_else(|| self.graph.nearest_node(anchor.lat, anchor.lng).map(|n| n.id))
    }

    fn generate_rotated_curves(&self, target_curve: &[Coordinate]) -> Vec<Vec<Coordinate>> {
        let n_rotations = self.config.n_rotations.clamp(1, ROTATION_ANGLES.len());
        ROTATION_ANGLES[..n_rotations]
            .iter()
            .map(|&angle| rotate_curve(target_curve, angle))
            .collect()
    }

    fn search_single(
        &self,
        curve: &[Coordinate],
        weight: WeightVector,
        target_distance_km: f64,
        max_crossings: u32,
        max_iterations: usize,
        start_node_id: u64,
    ) -> Option<PathCandidate> {
        let kernel = CostKernel::new(curve, target_distance_km, max_crossings, weight).ok()?;
        let finder = AStarFinder::new(self.graph, kernel, max_iterations);
        finder.find_closed_path(start_node_id)
    }

    /// Runs the full (rotation x weight) sweep and returns up to
    /// `config.max_results` diverse routes. Empty input curves, non-closed
    /// graphs, and empty graphs all surface as an empty vector rather than
    /// an error — search failure is not malformed input.
    pub fn search(
        &self,
        target_curve: &[Coordinate],
        target_distance_km: f64,
        max_crossings: u32,
        start_node_id: Option<u64>,
    ) -> Result<Vec<RouteInfo>> {
        if target_distance_km <= 0.0 {
            return Err(CoreError::InvalidInput(
                "target distance must be positive".into(),
            ));
        }

        if target_curve.len() < 2 || self.graph.node_count() == 0 {
            return Ok(Vec::new());
        }

        let start = match start_node_id {
            Some(id) if self.graph.get_node(id).is_some() => id,
            Some(_) => return Ok(Vec::new()),
            None => match self.find_start_node(target_curve) {
                Some(id) => id,
                None => return Ok(Vec::new()),
            },
        };

        let mut sampler = WeightSampler::new(self.config.seed);
        let weights = sampler.sample_with_corners(self.config.n_weight_samples)?;
        let rotated_curves = self.generate_rotated_curves(target_curve);

        let tasks: Vec<(&Vec<Coordinate>, WeightVector)> = rotated_curves
            .iter()
            .flat_map(|curve| weights.iter().map(move |&w| (curve, w)))
            .collect();

        let candidates: Vec<PathCandidate> = if self.config.use_parallel && tasks.len() > 1 {
            let worker_count = if self.config.max_workers == 0 {
                num_cpus::get()
            } else {
                self.config.max_workers
            };
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("route-finder-{}", i))
                .build()
                .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

            pool.install(|| {
                tasks
                    .par_iter()
                    .filter_map(|(curve, weight)| {
                        self.search_single(
                            curve,
                            *weight,
                            target_distance_km,
                            max_crossings,
                            self.config.max_iterations,
                            start,
                        )
                    })
                    .collect()
            })
        } else {
            tasks
                .iter()
                .filter_map(|(curve, weight)| {
                    self.search_single(
                        curve,
                        *weight,
                        target_distance_km,
                        max_crossings,
                        self.config.max_iterations,
                        start,
                    )
                })
                .collect()
        };

        let filter = ParetoFilter::new();
        let top = filter.select_top_k(candidates, self.config.max_results);

        Ok(self.to_route_infos(top))
    }

    fn to_route_infos(&self, candidates: Vec<PathCandidate>) -> Vec<RouteInfo> {
        candidates
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let coordinates = c
                    .path
                    .iter()
                    .filter_map(|id| self.graph.get_node(*id))
                    .map(|n| n.coordinate())
                    .collect();
                RouteInfo {
                    route_id: i as u32 + 1,
                    coordinates,
                    total_distance_km: c.path_length_km,
                    traffic_light_count: c.traffic_light_count,
                    shape_similarity: shape_similarity(c.shape_distance),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node, RoadClass};

    fn square_graph() -> RoadGraph {
        let mut g = RoadGraph::new();
        g.add_node(Node { id: 1, lat: 37.5, lng: 127.0, has_traffic_light: false });
        g.add_node(Node { id: 2, lat: 37.5, lng: 127.01, has_traffic_light: false });
        g.add_node(Node { id: 3, lat: 37.51, lng: 127.01, has_traffic_light: false });
        g.add_node(Node { id: 4, lat: 37.51, lng: 127.0, has_traffic_light: false });
        for (i, (a, b)) in [(1u64, 2u64), (2, 3), (3, 4), (4, 1)].into_iter().enumerate() {
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
    fn empty_curve_returns_empty_result() {
        let g = square_graph();
        let finder = RouteFinder::new(&g, SearchConfig::default());
        let routes = finder.search(&[], 4.0, 0, None).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn zero_node_graph_returns_empty_result() {
        let g = RoadGraph::new();
        let finder = RouteFinder::new(&g, SearchConfig::default());
        let routes = finder.search(&square_curve(), 4.0, 0, None).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn nonpositive_target_distance_is_invalid_input() {
        let g = square_graph();
        let finder = RouteFinder::new(&g, SearchConfig::default());
        assert!(finder.search(&square_curve(), 0.0, 0, None).is_err());
    }

    #[test]
    fn finds_routes_on_square_graph() {
        let g = square_graph();
        let config = SearchConfig {
            n_weight_samples: 8,
            n_rotations: 2,
            max_iterations: 2_000,
            max_results: 3,
            use_parallel: true,
            max_workers: 2,
            seed: Some(11),
        };
        let finder = RouteFinder::new(&g, config);
        let routes = finder.search(&square_curve(), 3.98, 0, None).unwrap();
        assert!(!routes.is_empty());
        assert!(routes.len() <= 3);
        for route in &routes {
            assert!(route.coordinates.len() >= 2);
        }
    }

    #[test]
    fn sequential_and_single_worker_produce_same_candidate_set() {
        let g = square_graph();
        let mut parallel_config = SearchConfig {
            n_weight_samples: 8,
            n_rotations: 2,
            max_iterations: 2_000,
            max_results: 10,
            use_parallel: true,
            max_workers: 4,
            seed: Some(5),
        };
        let sequential_config = SearchConfig {
            use_parallel: false,
            max_workers: 1,
            ..parallel_config
        };
        parallel_config.use_parallel = true;

        let finder_a = RouteFinder::new(&g, parallel_config);
        let finder_b = RouteFinder::new(&g, sequential_config);

        let mut routes_a = finder_a.search(&square_curve(), 3.98, 0, Some(1)).unwrap();
        let mut routes_b = finder_b.search(&square_curve(), 3.98, 0, Some(1)).unwrap();

        routes_a.sort_by(|a, b| a.total_distance_km.partial_cmp(&b.total_distance_km).unwrap());
        routes_b.sort_by(|a, b| a.total_distance_km.partial_cmp(&b.total_distance_km).unwrap());

        assert_eq!(routes_a.len(), routes_b.len());
    }

    #[test]
    fn unknown_start_node_id_returns_empty_result() {
        let g = square_graph();
        let finder = RouteFinder::new(&g, SearchConfig::default());
        let routes = finder.search(&square_curve(), 3.98, 0, Some(9999)).unwrap();
        assert!(routes.is_empty());
    }
}
