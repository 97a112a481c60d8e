use crate::geo::{self, LatLng};
use eframe::egui::{Pos2, Rect, Vec2, pos2};

pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// The camera over the map: which geographic point sits at the middle of the
/// viewport and at which (integer) zoom level.
#[derive(Debug, Clone)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,

    /// screen rect the map is painted into, refreshed every frame
    pub viewport: Rect,
}

impl MapView {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        let mut view = MapView {
            center,
            zoom: DEFAULT_MIN_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            viewport: Rect::from_min_size(Pos2::ZERO, Vec2::new(1000.0, 500.0)),
        };
        view.set_zoom(zoom);
        view
    }

    pub fn set_viewport(&mut self, rect: Rect) {
        self.viewport = rect;
    }

    /// world-pixel position of the viewport center
    pub fn center_world(&self) -> (f64, f64) {
        self.center.project(self.zoom)
    }

    /// world pixel → screen
    pub fn world_to_screen(&self, (x, y): (f64, f64)) -> Pos2 {
        let (cx, cy) = self.center_world();
        let mid = self.viewport.center();
        pos2(
            (f64::from(mid.x) + x - cx) as f32,
            (f64::from(mid.y) + y - cy) as f32,
        )
    }

    /// screen → world pixel
    pub fn screen_to_world(&self, p: Pos2) -> (f64, f64) {
        let (cx, cy) = self.center_world();
        let mid = self.viewport.center();
        (
            cx + f64::from(p.x - mid.x),
            cy + f64::from(p.y - mid.y),
        )
    }

    pub fn to_screen(&self, ll: LatLng) -> Pos2 {
        self.world_to_screen(ll.project(self.zoom))
    }

    pub fn to_latlng(&self, p: Pos2) -> LatLng {
        let (x, y) = self.screen_to_world(p);
        LatLng::unproject(x, y, self.zoom)
    }

    /// drag the map content by `delta` screen pixels
    pub fn pan_by(&mut self, delta: Vec2) {
        let (cx, cy) = self.center_world();
        let size = geo::world_size(self.zoom);
        let x = cx - f64::from(delta.x);
        let y = (cy - f64::from(delta.y)).clamp(0.0, size);
        let mut center = LatLng::unproject(x, y, self.zoom);
        center.lng = wrap_lng(center.lng);
        self.center = center;
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// change zoom by `step` levels while keeping the geographic point under
    /// `anchor` at the same screen position.
    pub fn zoom_around(&mut self, anchor: Pos2, step: i32) {
        let target = (i32::from(self.zoom) + step)
            .clamp(i32::from(self.min_zoom), i32::from(self.max_zoom));
        let Ok(target) = u8::try_from(target) else {
            return;
        };
        if target == self.zoom {
            return;
        }

        let pinned = self.to_latlng(anchor);
        self.zoom = target;

        // shift the center so `pinned` lands back under the anchor
        let (px, py) = pinned.project(self.zoom);
        let mid = self.viewport.center();
        let x = px - f64::from(anchor.x - mid.x);
        let y = py - f64::from(anchor.y - mid.y);
        self.center = LatLng::unproject(x, y, self.zoom);
    }

    pub fn meters_per_pixel(&self) -> f64 {
        geo::meters_per_pixel(self.center.lat, self.zoom)
    }
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> MapView {
        let mut v = MapView::new(LatLng::new(51.505, -0.09), 13);
        v.set_viewport(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 400.0)));
        v
    }

    #[test]
    fn center_projects_to_viewport_middle() {
        let v = view();
        let p = v.to_screen(v.center);
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn screen_round_trip() {
        let v = view();
        let ll = LatLng::new(51.51, -0.1);
        let back = v.to_latlng(v.to_screen(ll));
        assert!((back.lat - ll.lat).abs() < 1e-5);
        assert!((back.lng - ll.lng).abs() < 1e-5);
    }

    #[test]
    fn pan_moves_content_with_pointer() {
        let mut v = view();
        let ll = LatLng::new(51.51, -0.1);
        let before = v.to_screen(ll);
        v.pan_by(Vec2::new(30.0, -20.0));
        let after = v.to_screen(ll);
        assert!((after.x - before.x - 30.0).abs() < 0.01);
        assert!((after.y - before.y + 20.0).abs() < 0.01);
    }

    #[test]
    fn zoom_around_keeps_anchor_fixed() {
        let mut v = view();
        let anchor = pos2(120.0, 310.0);
        let pinned = v.to_latlng(anchor);
        v.zoom_around(anchor, 1);
        assert_eq!(v.zoom, 14);
        let p = v.to_screen(pinned);
        assert!((p.x - anchor.x).abs() < 0.01);
        assert!((p.y - anchor.y).abs() < 0.01);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut v = view();
        v.zoom_around(pos2(10.0, 10.0), 40);
        assert_eq!(v.zoom, DEFAULT_MAX_ZOOM);
        v.set_zoom(0);
        v.zoom_around(pos2(10.0, 10.0), -1);
        assert_eq!(v.zoom, 0);
    }

    #[test]
    fn new_clamps_zoom() {
        let v = MapView::new(LatLng::new(0.0, 0.0), 42);
        assert_eq!(v.zoom, DEFAULT_MAX_ZOOM);
    }

    #[test]
    fn wrap_keeps_longitude_in_range() {
        assert!((wrap_lng(190.0) + 170.0).abs() < 1e-9);
        assert!((wrap_lng(-185.0) - 175.0).abs() < 1e-9);
    }
}
