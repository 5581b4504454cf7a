//! Geometry primitives for route comparison
//!
//! Pure functions over `[lng, lat]` coordinates in degrees. Distances use the
//! spherical haversine formula; bearings follow the compass convention
//! (0 = north, clockwise).

/// Earth radius in meters used by the haversine formula
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Initial great-circle bearing from `origin` toward `dest` in degrees [0, 360)
pub fn bearing(origin: [f64; 2], dest: [f64; 2]) -> f64 {
    let lng1 = origin[0].to_radians();
    let lat1 = origin[1].to_radians();
    let lng2 = dest[0].to_radians();
    let lat2 = dest[1].to_radians();

    let d_lng = lng2 - lng1;
    let x = d_lng.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();

    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Great-circle distance between two points in meters
pub fn haversine_distance(p1: [f64; 2], p2: [f64; 2]) -> f64 {
    let lat1 = p1[1].to_radians();
    let lat2 = p2[1].to_radians();
    let d_lat = (p2[1] - p1[1]).to_radians();
    let d_lng = (p2[0] - p1[0]).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Shortest angular difference between two bearings, in degrees [0, 180]
pub fn bearing_difference(b1: f64, b2: f64) -> f64 {
    let diff = (b1 - b2).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Ray-casting point-in-polygon test over a closed vertex ring
///
/// Uses a strict `>` / `<=` convention on horizontal crossings so points on
/// shared edges are counted by exactly one of two adjacent polygons. Rings
/// with fewer than 3 vertices contain nothing.
pub fn point_in_polygon(point: [f64; 2], ring: &[[f64; 2]]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (px, py) = (point[0], point[1]);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);

        if (yi > py) != (yj > py) {
            let x_cross = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}
