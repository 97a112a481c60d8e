use crate::geo::Ring;
use crate::shape::{Shape, ShapeId, ShapeKind};
#[derive(Debug, Clone, PartialEq)]
struct PolygonEntry {
    id: ShapeId,
    ring: Ring,
}

/// Local mirror of the polygons drawn on the map, in creation order.
///
/// Entries are keyed by the id of the shape they mirror, so edits and deletes
/// find their entry even after the ring's coordinates changed.
#[derive(Debug, Clone, Default)]
pub struct PolygonStore {
    entries: Vec<PolygonEntry>,
    revision: u64,
}

impl PolygonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// replace the whole collection with a single entry
    pub fn seed(&mut self, id: ShapeId, ring: Ring) {
        self.entries = vec![PolygonEntry { id, ring }];
        self.bump();
    }

    /// mirror a freshly created shape; anything that isn't a polygon is
    /// ignored. returns whether an entry was appended.
    pub fn on_created(&mut self, kind: ShapeKind, shape: &Shape) -> bool {
        if kind != ShapeKind::Polygon {
            return false;
        }
        let Some(ring) = shape.outer_ring().filter(|r| !r.is_empty()) else {
            return false;
        };
        self.entries.push(PolygonEntry {
            id: shape.id,
            ring: ring.clone(),
        });
        self.bump();
        true
    }

    /// take over the new rings of edited shapes. returns how many entries
    /// changed.
    pub fn on_edited(&mut self, shapes: &[Shape]) -> usize {
        let mut changed = 0;
        for shape in shapes {
            let Some(ring) = shape.outer_ring() else {
                continue;
            };
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == shape.id) {
                if entry.ring != *ring {
                    entry.ring = ring.clone();
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.bump();
        }
        changed
    }

    /// drop the entries of removed shapes. returns how many were dropped.
    pub fn on_deleted(&mut self, shapes: &[Shape]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !shapes.iter().any(|shape| shape.id == entry.id));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.bump();
        }
        removed
    }

    pub fn get(&self, id: ShapeId) -> Option<&Ring> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.ring)
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.entries.iter().map(|e| &e.ring)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// bumped on every change of the collection
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// the collection as a JSON array of rings
    pub fn to_json(&self) -> String {
        let rings: Vec<String> = self.rings().map(Ring::to_json).collect();
        format!("[{}]", rings.join(","))
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{LatLng, default_ring};
    use crate::shape::Geometry;

    fn triangle(offset: f64) -> Ring {
        Ring::new(vec![
            LatLng::new(offset, 0.0),
            LatLng::new(offset + 1.0, 0.0),
            LatLng::new(offset, 1.0),
        ])
    }

    #[test]
    fn seed_replaces_everything() {
        let mut store = PolygonStore::new();
        store.on_created(ShapeKind::Polygon, &Shape::new(Geometry::Polygon(triangle(0.0))));
        let id = ShapeId::new();
        store.seed(id, default_ring());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id), Some(&default_ring()));
    }

    #[test]
    fn created_polygon_is_appended_in_order() {
        let mut store = PolygonStore::new();
        let a = Shape::new(Geometry::Polygon(triangle(0.0)));
        let b = Shape::new(Geometry::Polygon(triangle(5.0)));
        assert!(store.on_created(ShapeKind::Polygon, &a));
        assert!(store.on_created(ShapeKind::Polygon, &b));
        let rings: Vec<&Ring> = store.rings().collect();
        assert_eq!(rings, vec![&triangle(0.0), &triangle(5.0)]);
    }

    #[test]
    fn created_non_polygon_is_ignored() {
        let mut store = PolygonStore::new();
        let marker = Shape::new(Geometry::Marker(LatLng::new(1.0, 1.0)));
        let rect = Shape::new(Geometry::Rectangle(Ring::from_corners(
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
        )));
        assert!(!store.on_created(ShapeKind::Marker, &marker));
        assert!(!store.on_created(ShapeKind::Rectangle, &rect));
        assert!(store.is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn created_polygon_without_points_is_ignored() {
        let mut store = PolygonStore::new();
        let empty = Shape::new(Geometry::Polygon(Ring::new(Vec::new())));
        assert!(!store.on_created(ShapeKind::Polygon, &empty));
        assert!(store.is_empty());
    }

    #[test]
    fn edit_replaces_by_id() {
        let mut store = PolygonStore::new();
        let mut shape = Shape::new(Geometry::Polygon(triangle(0.0)));
        store.on_created(ShapeKind::Polygon, &shape);

        shape.move_vertex(0, LatLng::new(-3.0, -3.0));
        assert_eq!(store.on_edited(std::slice::from_ref(&shape)), 1);
        assert_eq!(store.get(shape.id), shape.outer_ring());
    }

    #[test]
    fn edit_of_unknown_shape_is_noop() {
        let mut store = PolygonStore::new();
        store.on_created(ShapeKind::Polygon, &Shape::new(Geometry::Polygon(triangle(0.0))));
        let stranger = Shape::new(Geometry::Polygon(triangle(9.0)));
        let rev = store.revision();
        assert_eq!(store.on_edited(&[stranger]), 0);
        assert_eq!(store.revision(), rev);
        assert_eq!(store.rings().next(), Some(&triangle(0.0)));
    }

    #[test]
    fn delete_removes_only_matching_entry() {
        let mut store = PolygonStore::new();
        let a = Shape::new(Geometry::Polygon(triangle(0.0)));
        let b = Shape::new(Geometry::Polygon(triangle(0.0)));
        store.on_created(ShapeKind::Polygon, &a);
        store.on_created(ShapeKind::Polygon, &b);

        // same coordinates, different identity: only `a` goes
        assert_eq!(store.on_deleted(std::slice::from_ref(&a)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(b.id).is_some());

        assert_eq!(store.on_deleted(&[Shape::new(Geometry::Polygon(triangle(0.0)))]), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn json_lists_rings() {
        let mut store = PolygonStore::new();
        store.on_created(
            ShapeKind::Polygon,
            &Shape::new(Geometry::Polygon(Ring::new(vec![
                LatLng::new(1.0, 2.0),
                LatLng::new(3.0, 4.0),
                LatLng::new(5.0, 6.0),
            ]))),
        );
        assert_eq!(
            store.to_json(),
            r#"[[{"lat":1.0,"lng":2.0},{"lat":3.0,"lng":4.0},{"lat":5.0,"lng":6.0}]]"#
        );
    }
}
