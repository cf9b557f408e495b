pub mod astar;
pub mod cache;
pub mod core;
pub mod cost;
pub mod graph;
pub mod pareto;
pub mod route_finder;
pub mod spatial;
pub mod weights;

pub use crate::core::errors::{CoreError, Result};
pub use crate::core::types::{
    BoundingBox, Coordinate, PathCandidate, RouteInfo, SearchConfig, WeightVector,
};
pub use crate::graph::{Edge, Node, RoadClass, RoadGraph};
pub use crate::route_finder::RouteFinder;

/// Searches `graph` for up to `config.max_results` closed walks that
/// approximate `target_curve` at `target_distance_km`, respecting
/// `max_crossings`. This is the only entry point the core exposes; every
/// other module exists to support it.
///
/// An empty or single-point `target_curve`, or a graph with zero nodes,
/// yields an empty result rather than an error. `target_distance_km <= 0`
/// is an `InvalidInput` error.
pub fn search(
    graph: &RoadGraph,
    target_curve: &[Coordinate],
    target_distance_km: f64,
    max_crossings: u32,
    start_node_id: Option<u64>,
    config: Option<SearchConfig>,
) -> Result<Vec<RouteInfo>> {
    let config = config.unwrap_or_default();

    log::info!(
        "search start: target_distance_km={target_distance_km}, max_crossings={max_crossings}, nodes={}",
        graph.node_count()
    );

    let finder = RouteFinder::new(graph, config);
    let routes = finder.search(target_curve, target_distance_km, max_crossings, start_node_id)?;

    log::info!("search done: {} routes returned", routes.len());

    Ok(routes)
}
