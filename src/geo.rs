use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// pixel size of one map tile
pub const TILE_SIZE: f64 = 256.0;

/// latitude limit of the spherical mercator projection
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    /// project onto the mercator plane at `zoom`, in world pixels
    /// (0,0 is the top-left corner of tile 0/0/0).
    pub fn project(self, zoom: u8) -> (f64, f64) {
        let scale = world_size(zoom);
        let lat = self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (self.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
        (x, y)
    }

    /// inverse of [`LatLng::project`].
    pub fn unproject(x: f64, y: f64, zoom: u8) -> Self {
        let scale = world_size(zoom);
        let lng = x / scale * 360.0 - 180.0;
        let n = PI - 2.0 * PI * y / scale;
        let lat = n.sinh().atan().to_degrees();
        LatLng { lat, lng }
    }
}

/// side length of the whole world in pixels at `zoom`
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * f64::from(1u32 << zoom.min(30))
}

/// ground resolution at `lat` and `zoom`
pub fn meters_per_pixel(lat: f64, zoom: u8) -> f64 {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    2.0 * PI * EARTH_RADIUS_M * lat.cos() / world_size(zoom)
}

/// A closed polygon boundary. The closing edge is implicit, so a trailing
/// point equal to the first one is never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(Vec<LatLng>);

impl Ring {
    pub fn new(mut points: Vec<LatLng>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Ring(points)
    }

    pub fn points(&self) -> &[LatLng] {
        &self.0
    }

    pub fn points_mut(&mut self) -> &mut [LatLng] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// axis-aligned ring through two opposite corners, clockwise from `a`
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        let (south, north) = (a.lat.min(b.lat), a.lat.max(b.lat));
        let (west, east) = (a.lng.min(b.lng), a.lng.max(b.lng));
        Ring(vec![
            LatLng::new(south, west),
            LatLng::new(north, west),
            LatLng::new(north, east),
            LatLng::new(south, east),
        ])
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// the ring every fresh map starts with
pub fn default_ring() -> Ring {
    Ring::new(vec![
        LatLng::new(51.505, -0.09),
        LatLng::new(51.51, -0.1),
        LatLng::new(51.51, -0.12),
        LatLng::new(51.505, -0.09),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn project_origin_is_world_center() {
        let (x, y) = LatLng::new(0.0, 0.0).project(0);
        assert!(close(x, 128.0));
        assert!(close(y, 128.0));
    }

    #[test]
    fn unproject_inverts_project() {
        let p = LatLng::new(51.505, -0.09);
        let (x, y) = p.project(13);
        let back = LatLng::unproject(x, y, 13);
        assert!(close(back.lat, p.lat));
        assert!(close(back.lng, p.lng));
    }

    #[test]
    fn project_clamps_poles() {
        let (_, top) = LatLng::new(90.0, 0.0).project(2);
        assert!(top.abs() < 1e-6);
    }

    #[test]
    fn ring_drops_repeated_closing_point() {
        let ring = default_ring();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.points()[0], LatLng::new(51.505, -0.09));
    }

    #[test]
    fn ring_serializes_as_plain_point_list() {
        let ring = Ring::new(vec![LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0)]);
        assert_eq!(ring.to_json(), r#"[{"lat":1.0,"lng":2.0},{"lat":3.0,"lng":4.0}]"#);
    }

    #[test]
    fn corners_ring_is_axis_aligned() {
        let ring = Ring::from_corners(LatLng::new(2.0, 5.0), LatLng::new(1.0, 3.0));
        assert_eq!(
            ring.points(),
            &[
                LatLng::new(1.0, 3.0),
                LatLng::new(2.0, 3.0),
                LatLng::new(2.0, 5.0),
                LatLng::new(1.0, 5.0),
            ]
        );
    }

    #[test]
    fn resolution_halves_per_zoom_level() {
        let a = meters_per_pixel(0.0, 10);
        let b = meters_per_pixel(0.0, 11);
        assert!(close(a / b, 2.0));
    }
}
