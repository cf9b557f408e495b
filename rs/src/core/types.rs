use serde::{Deserialize, Serialize};

/// A WGS84 point, decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A rectangular search area. Invariant: `north >= south`, `east >= west`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        self.south <= coord.lat
            && coord.lat <= self.north
            && self.west <= coord.lng
            && coord.lng <= self.east
    }
}

/// A weight triple on the 2-simplex: `alpha + beta + gamma == 1` within
/// `1e-6`. `alpha` weighs shape fidelity, `beta` length accuracy, `gamma`
/// crossing-count avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl WeightVector {
    pub const SIMPLEX_TOLERANCE: f64 = 1e-6;

    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        debug_assert!(
            (alpha + beta + gamma - 1.0).abs() < Self::SIMPLEX_TOLERANCE,
            "weight triple must sum to 1"
        );
        Self { alpha, beta, gamma }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.alpha, self.beta, self.gamma)
    }
}

/// A candidate closed walk produced by the A* finder, carrying both the
/// aggregate cost and the three sub-costs it was built from.
#[derive(Debug, Clone)]
pub struct PathCandidate {
    pub path: Vec<u64>,
    pub g_cost: f64,
    pub f_cost: f64,
    pub shape_distance: f64,
    pub length_penalty: f64,
    pub crossing_penalty: f64,
    pub path_length_km: f64,
    pub traffic_light_count: u32,
}

impl PathCandidate {
    /// The three normalized objectives, in the order the Pareto filter
    /// compares them: shape, length, crossing.
    pub fn objectives(&self) -> (f64, f64, f64) {
        (self.shape_distance, self.length_penalty, self.crossing_penalty)
    }
}

/// A finished, ranked route, ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInfo {
    pub route_id: u32,
    pub coordinates: Vec<Coordinate>,
    pub total_distance_km: f64,
    pub traffic_light_count: u32,
    pub shape_similarity: f64,
}

/// Tunables for a single [`crate::route_finder::RouteFinder::search`] call.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub n_weight_samples: usize,
    pub n_rotations: usize,
    pub max_iterations: usize,
    pub max_results: usize,
    pub use_parallel: bool,
    pub max_workers: usize,
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_weight_samples: 20,
            n_rotations: 6,
            max_iterations: 10_000,
            max_results: 5,
            use_parallel: true,
            max_workers: 4,
            seed: None,
        }
    }
}
