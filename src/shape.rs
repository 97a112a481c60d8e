use crate::geo::{LatLng, Ring};
use crate::map_view::MapView;
use eframe::egui::{Color32, Painter, Pos2, Stroke, epaint::PathShape};
use kurbo::{BezPath, Line, ParamCurveNearest, Point as KPoint, Shape as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a drawn shape. Assigned once at creation (or seeding)
/// and carried through every edit and the final delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(Uuid);

impl ShapeId {
    pub fn new() -> Self {
        ShapeId(Uuid::new_v4())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Polygon,
    Rectangle,
    Polyline,
    Circle,
    Marker,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Polygon,
        ShapeKind::Rectangle,
        ShapeKind::Polyline,
        ShapeKind::Circle,
        ShapeKind::Marker,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Circle => "circle",
            ShapeKind::Marker => "marker",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Polygon(Ring),
    /// always the four corners produced by [`Ring::from_corners`]
    Rectangle(Ring),
    Polyline(Vec<LatLng>),
    Circle { center: LatLng, radius_m: f64 },
    Marker(LatLng),
}

/// One shape living in the feature group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub geometry: Geometry,
}

/// hit tolerance around lines and markers, in screen pixels
pub const HIT_TOLERANCE: f64 = 6.0;

pub const MARKER_RADIUS: f32 = 7.0;

impl Shape {
    pub fn new(geometry: Geometry) -> Self {
        Shape {
            id: ShapeId::new(),
            geometry,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self.geometry {
            Geometry::Polygon(_) => ShapeKind::Polygon,
            Geometry::Rectangle(_) => ShapeKind::Rectangle,
            Geometry::Polyline(_) => ShapeKind::Polyline,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Marker(_) => ShapeKind::Marker,
        }
    }

    /// the outer boundary for polygon-like shapes
    pub fn outer_ring(&self) -> Option<&Ring> {
        match &self.geometry {
            Geometry::Polygon(ring) | Geometry::Rectangle(ring) => Some(ring),
            _ => None,
        }
    }

    /// the editable vertices of this shape, in drawing order.
    /// circles expose their center followed by a rim point due east.
    pub fn vertices(&self) -> Vec<LatLng> {
        match &self.geometry {
            Geometry::Polygon(ring) | Geometry::Rectangle(ring) => ring.points().to_vec(),
            Geometry::Polyline(points) => points.clone(),
            Geometry::Circle { center, radius_m } => vec![*center, rim_point(*center, *radius_m)],
            Geometry::Marker(at) => vec![*at],
        }
    }

    /// move vertex `idx` (as numbered by [`Shape::vertices`]) to `to`
    pub fn move_vertex(&mut self, idx: usize, to: LatLng) {
        match &mut self.geometry {
            Geometry::Polygon(ring) => {
                if let Some(p) = ring.points_mut().get_mut(idx) {
                    *p = to;
                }
            }
            Geometry::Rectangle(ring) => {
                // keep the rectangle axis-aligned: the opposite corner stays put
                if let Some(&opposite) = ring.points().get((idx + 2) % 4) {
                    *ring = Ring::from_corners(opposite, to);
                }
            }
            Geometry::Polyline(points) => {
                if let Some(p) = points.get_mut(idx) {
                    *p = to;
                }
            }
            Geometry::Circle { center, radius_m } => match idx {
                0 => *center = to,
                1 => *radius_m = distance_m(*center, to),
                _ => {}
            },
            Geometry::Marker(at) => {
                if idx == 0 {
                    *at = to;
                }
            }
        }
    }

    pub fn screen_points(&self, view: &MapView) -> Vec<Pos2> {
        self.vertices().into_iter().map(|p| view.to_screen(p)).collect()
    }

    /// true when the screen position `pos` lies on (or inside) the shape
    pub fn hit_test(&self, view: &MapView, pos: Pos2) -> bool {
        let mouse = KPoint::new(f64::from(pos.x), f64::from(pos.y));
        match &self.geometry {
            Geometry::Polygon(_) | Geometry::Rectangle(_) => {
                let points = self.screen_points(view);
                closed_path(&points).contains(mouse)
                    || distance_to_polyline(&points, true, mouse) <= HIT_TOLERANCE
            }
            Geometry::Polyline(_) => {
                let points = self.screen_points(view);
                distance_to_polyline(&points, false, mouse) <= HIT_TOLERANCE
            }
            Geometry::Circle { center, radius_m } => {
                let c = view.to_screen(*center);
                let r = radius_m / view.meters_per_pixel();
                KPoint::new(f64::from(c.x), f64::from(c.y)).distance(mouse) <= r + HIT_TOLERANCE
            }
            Geometry::Marker(at) => {
                let p = view.to_screen(*at);
                KPoint::new(f64::from(p.x), f64::from(p.y)).distance(mouse)
                    <= f64::from(MARKER_RADIUS) + HIT_TOLERANCE
            }
        }
    }

    pub fn paint(&self, painter: &Painter, view: &MapView, style: &ShapeStyle) {
        match &self.geometry {
            Geometry::Polygon(_) | Geometry::Rectangle(_) => {
                let points = self.screen_points(view);
                paint_ring(painter, points, style);
            }
            Geometry::Polyline(_) => {
                let points = self.screen_points(view);
                painter.add(PathShape::line(points, style.stroke));
            }
            Geometry::Circle { center, radius_m } => {
                let c = view.to_screen(*center);
                let r = (radius_m / view.meters_per_pixel()) as f32;
                painter.circle(c, r, style.fill, style.stroke);
            }
            Geometry::Marker(at) => {
                let p = view.to_screen(*at);
                painter.circle(p, MARKER_RADIUS, style.stroke.color, Stroke::new(2.0, Color32::WHITE));
            }
        }
    }
}

/// colors used to paint shapes
#[derive(Clone, Copy)]
pub struct ShapeStyle {
    pub stroke: Stroke,
    pub fill: Color32,
}

impl ShapeStyle {
    pub fn normal() -> Self {
        ShapeStyle {
            stroke: Stroke::new(3.0, Color32::from_rgb(0x33, 0x88, 0xff)),
            fill: Color32::from_rgba_unmultiplied(0x33, 0x88, 0xff, 51),
        }
    }

    /// highlight for the shape under the pointer in delete mode
    pub fn doomed() -> Self {
        ShapeStyle {
            stroke: Stroke::new(3.0, Color32::from_rgb(0xd9, 0x3b, 0x3b)),
            fill: Color32::from_rgba_unmultiplied(0xd9, 0x3b, 0x3b, 51),
        }
    }

    /// in-progress sketch of a shape that is still being drawn
    pub fn sketch() -> Self {
        ShapeStyle {
            stroke: Stroke::new(2.0, Color32::from_rgb(0xfe, 0x57, 0xa1)),
            fill: Color32::from_rgba_unmultiplied(0xfe, 0x57, 0xa1, 40),
        }
    }
}

pub fn paint_ring(painter: &Painter, points: Vec<Pos2>, style: &ShapeStyle) {
    if points.len() < 2 {
        return;
    }
    // egui only fills convex paths correctly, concave rings get outline only
    if is_convex(&points) {
        painter.add(PathShape::convex_polygon(points, style.fill, style.stroke));
    } else {
        painter.add(PathShape::closed_line(points, style.stroke));
    }
}

fn is_convex(points: &[Pos2]) -> bool {
    if points.len() < 4 {
        return true;
    }
    let mut sign = 0.0_f32;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let c = points[(i + 2) % points.len()];
        let cross = (b - a).x * (c - b).y - (b - a).y * (c - b).x;
        if cross.abs() < f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

fn closed_path(points: &[Pos2]) -> BezPath {
    let mut path = BezPath::new();
    for (i, p) in points.iter().enumerate() {
        let kp = KPoint::new(f64::from(p.x), f64::from(p.y));
        if i == 0 {
            path.move_to(kp);
        } else {
            path.line_to(kp);
        }
    }
    if !points.is_empty() {
        path.close_path();
    }
    path
}

/// shortest distance from `mouse` to the segments through `points`
pub fn distance_to_polyline(points: &[Pos2], closed: bool, mouse: KPoint) -> f64 {
    let to_k = |p: &Pos2| KPoint::new(f64::from(p.x), f64::from(p.y));
    let mut segments: Vec<Line> = points
        .windows(2)
        .map(|w| Line::new(to_k(&w[0]), to_k(&w[1])))
        .collect();
    if closed && points.len() > 2 {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            segments.push(Line::new(to_k(last), to_k(first)));
        }
    }
    if segments.is_empty() {
        return points
            .first()
            .map_or(f64::INFINITY, |p| to_k(p).distance(mouse));
    }
    segments
        .iter()
        .map(|seg| seg.nearest(mouse, 1e-6).distance_sq.sqrt())
        .fold(f64::INFINITY, f64::min)
}

/// great-circle distance in meters (haversine)
pub fn distance_m(a: LatLng, b: LatLng) -> f64 {
    const R: f64 = 6_371_000.0;
    let (la1, la2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = la2 - la1;
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + la1.cos() * la2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * R * h.sqrt().asin()
}

/// point `radius_m` meters due east of `center`
fn rim_point(center: LatLng, radius_m: f64) -> LatLng {
    const R: f64 = 6_371_000.0;
    let dlng = (radius_m / (R * center.lat.to_radians().cos())).to_degrees();
    LatLng::new(center.lat, center.lng + dlng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::default_ring;
    use eframe::egui::{Rect, Vec2, pos2};

    fn view() -> MapView {
        let mut v = MapView::new(LatLng::new(51.505, -0.09), 13);
        v.set_viewport(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 400.0)));
        v
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(ShapeId::new(), ShapeId::new());
    }

    #[test]
    fn kind_names_parse_back() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(ShapeKind::parse(" Polygon "), Some(ShapeKind::Polygon));
        assert_eq!(ShapeKind::parse("circlemarker"), None);
    }

    #[test]
    fn only_polygon_like_shapes_have_rings() {
        let poly = Shape::new(Geometry::Polygon(default_ring()));
        let marker = Shape::new(Geometry::Marker(LatLng::new(1.0, 1.0)));
        assert_eq!(poly.outer_ring(), Some(&default_ring()));
        assert!(marker.outer_ring().is_none());
    }

    #[test]
    fn polygon_hit_inside_and_miss_outside() {
        let v = view();
        let shape = Shape::new(Geometry::Polygon(default_ring()));
        let pts = shape.screen_points(&v);
        let centroid = pos2(
            pts.iter().map(|p| p.x).sum::<f32>() / 3.0,
            pts.iter().map(|p| p.y).sum::<f32>() / 3.0,
        );
        assert!(shape.hit_test(&v, centroid));
        assert!(!shape.hit_test(&v, pos2(790.0, 390.0)));
    }

    #[test]
    fn polyline_hit_is_near_segment_only() {
        let v = view();
        let a = v.to_latlng(pos2(100.0, 100.0));
        let b = v.to_latlng(pos2(300.0, 100.0));
        let line = Shape::new(Geometry::Polyline(vec![a, b]));
        assert!(line.hit_test(&v, pos2(200.0, 103.0)));
        assert!(!line.hit_test(&v, pos2(200.0, 130.0)));
    }

    #[test]
    fn rectangle_corner_drag_stays_axis_aligned() {
        let mut rect = Shape::new(Geometry::Rectangle(Ring::from_corners(
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
        )));
        // corner 2 is north-east, opposite is south-west
        rect.move_vertex(2, LatLng::new(2.0, 3.0));
        assert_eq!(
            rect.outer_ring(),
            Some(&Ring::from_corners(LatLng::new(0.0, 0.0), LatLng::new(2.0, 3.0)))
        );
    }

    #[test]
    fn circle_rim_handle_sets_radius() {
        let center = LatLng::new(10.0, 10.0);
        let mut circle = Shape::new(Geometry::Circle { center, radius_m: 100.0 });
        let rim = circle.vertices()[1];
        assert!((distance_m(center, rim) - 100.0).abs() < 0.5);

        circle.move_vertex(1, rim_point(center, 250.0));
        let Geometry::Circle { radius_m, .. } = circle.geometry else {
            panic!("circle changed kind");
        };
        assert!((radius_m - 250.0).abs() < 0.5);
    }

    #[test]
    fn convexity_check() {
        let square = [pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(1.0, 1.0), pos2(0.0, 1.0)];
        let dart = [pos2(0.0, 0.0), pos2(2.0, 1.0), pos2(0.0, 2.0), pos2(1.0, 1.0)];
        assert!(is_convex(&square));
        assert!(!is_convex(&dart));
    }
}
