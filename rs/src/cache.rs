//! Collaborator interfaces the core depends on but does not implement
//! itself: fetching a `RoadGraph` for a search area, and caching one.
//! Raw ingestion and graph persistence stay out of the core — these
//! traits exist so the core can depend on `RoadGraph` alone, not on how
//! it was obtained.

use crate::core::errors::Result;
use crate::core::types::BoundingBox;
use crate::graph::RoadGraph;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Fetches a fresh `RoadGraph` for a search area from a live map provider.
pub trait GraphRepository {
    fn get_graph_by_bbox(&self, bbox: BoundingBox, network_type: &str) -> Result<RoadGraph>;
}

/// Looks up, stores, and evicts cached `RoadGraph`s keyed by search area.
pub trait GraphCacheService {
    fn get(&self, key: &str) -> Result<Option<RoadGraph>>;
    fn set(&mut self, key: &str, graph: &RoadGraph) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
    fn clear_all(&mut self) -> Result<usize>;
}

/// A deterministic cache key derived from a bounding box and network type.
/// Same inputs always produce the same key, regardless of process or run.
pub fn bbox_cache_key(bbox: BoundingBox, network_type: &str) -> String {
    format!(
        "{:.6}_{:.6}_{:.6}_{:.6}_{}",
        bbox.north, bbox.south, bbox.east, bbox.west, network_type
    )
}

/// A deterministic cache key derived from a center point, radius, and
/// network type.
pub fn point_cache_key(lat: f64, lng: f64, distance_m: f64, network_type: &str) -> String {
    format!("{:.6}_{:.6}_{:.0}_{}", lat, lng, distance_m, network_type)
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
}

#[derive(Serialize, Deserialize)]
struct NodeRecord {
    id: u64,
    lat: f64,
    lng: f64,
    #[serde(default)]
    has_traffic_light: bool,
}

#[derive(Serialize, Deserialize)]
struct EdgeRecord {
    id: u64,
    source_id: u64,
    target_id: u64,
    length_m: f64,
    road_type: crate::graph::RoadClass,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_oneway: bool,
}

/// A `GraphCacheService` backed by one JSON file per cache key: UTF-8,
/// `nodes` and `edges` arrays, `road_type` spelled out. Reads only this
/// format — no legacy binary fallback.
pub struct JsonFileCacheService {
    dir: PathBuf,
}

impl JsonFileCacheService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl GraphCacheService for JsonFileCacheService {
    fn get(&self, key: &str) -> Result<Option<RoadGraph>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        let entry: CacheEntry = serde_json::from_str(&raw)?;

        let mut graph = RoadGraph::new();
        for node in entry.nodes {
            graph.add_node(crate::graph::Node {
                id: node.id,
                lat: node.lat,
                lng: node.lng,
                has_traffic_light: node.has_traffic_light,
            });
        }
        for edge in entry.edges {
            graph.add_edge(crate::graph::Edge {
                id: edge.id,
                source_id: edge.source_id,
                target_id: edge.target_id,
                length_m: edge.length_m,
                road_class: edge.road_type,
                name: edge.name,
                is_oneway: edge.is_oneway,
            });
        }

        Ok(Some(graph))
    }

    fn set(&mut self, key: &str, graph: &RoadGraph) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let nodes: Vec<NodeRecord> = graph
            .nodes()
            .map(|n| NodeRecord {
                id: n.id,
                lat: n.lat,
                lng: n.lng,
                has_traffic_light: n.has_traffic_light,
            })
            .collect();

        let edges: Vec<EdgeRecord> = graph
            .edges()
            .map(|e| EdgeRecord {
                id: e.id,
                source_id: e.source_id,
                target_id: e.target_id,
                length_m: e.length_m,
                road_type: e.road_class,
                name: e.name.clone(),
                is_oneway: e.is_oneway,
            })
            .collect();

        let entry = CacheEntry { nodes, edges };
        let serialized = serde_json::to_string_pretty(&entry)?;
        fs::write(self.entry_path(key), serialized)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear_all(&mut self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
                count += 1;
            }
        }
        Ok(count)
    }
}
