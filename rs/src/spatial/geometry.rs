use crate::core::types::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two WGS84 points, in kilometers.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lon1_rad = lon1.to_radians();
    let lat2_rad = lat2.to_radians();
    let lon2_rad = lon2.to_radians();

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a =
        (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn haversine_coord(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat, a.lng, b.lat, b.lng)
}

/// Parametric projection of `p` onto segment `a -> b`, clamped to `[0, 1]`.
/// Operates in the plane `(x = lng, y = lat)`; a degenerate (zero-length)
/// segment is treated as the point `a`.
fn project_onto_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> Coordinate {
    let ab_x = b.lng - a.lng;
    let ab_y = b.lat - a.lat;

    if ab_x.abs() < 1e-12 && ab_y.abs() < 1e-12 {
        return a;
    }

    let ap_x = p.lng - a.lng;
    let ap_y = p.lat - a.lat;

    let t = (ap_x * ab_x + ap_y * ab_y) / (ab_x * ab_x + ab_y * ab_y);
    let t_clamped = t.clamp(0.0, 1.0);

    Coordinate::new(a.lat + t_clamped * ab_y, a.lng + t_clamped * ab_x)
}

/// Geographic distance (km) from `p` to the segment `a -> b`, approximated
/// by a planar projection in `(lng, lat)` followed by a haversine lookup of
/// the projected point. Accepted approximation for small (bounding-box
/// scale) search areas.
pub fn point_to_segment_distance(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    let closest = project_onto_segment(p, a, b);
    haversine_coord(p, closest)
}

/// Minimum distance (km) from `p` to any segment of the polyline `curve`.
/// `curve` must have at least two points.
pub fn min_distance_to_curve(p: Coordinate, curve: &[Coordinate]) -> f64 {
    curve
        .windows(2)
        .map(|w| point_to_segment_distance(p, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// The arithmetic centroid of `curve`'s points. `curve` must be non-empty.
pub fn curve_centroid(curve: &[Coordinate]) -> Coordinate {
    let n = curve.len() as f64;
    let lat_sum: f64 = curve.iter().map(|c| c.lat).sum();
    let lng_sum: f64 = curve.iter().map(|c| c.lng).sum();
    Coordinate::new(lat_sum / n, lng_sum / n)
}

/// Rotates `curve` by `angle_deg` (counterclockwise) about its centroid, in
/// the plane `(x = lng, y = lat)`. Used to generate shape-orientation
/// variants for the rotation ensemble.
pub fn rotate_curve(curve: &[Coordinate], angle_deg: f64) -> Vec<Coordinate> {
    let center = curve_centroid(curve);
    let angle_rad = angle_deg.to_radians();
    let cos_a = angle_rad.cos();
    let sin_a = angle_rad.sin();

    curve
        .iter()
        .map(|p| {
            let dx = p.lng - center.lng;
            let dy = p.lat - center.lat;
            let new_x = dx * cos_a - dy * sin_a;
            let new_y = dx * sin_a + dy * cos_a;
            Coordinate::new(center.lat + new_y, center.lng + new_x)
        })
        .collect()
}
