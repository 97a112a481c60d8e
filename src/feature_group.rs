use crate::map_view::MapView;
use crate::shape::{Shape, ShapeId, ShapeKind, ShapeStyle};
use eframe::egui::{Painter, Pos2};

/// The live layer of editable shapes. This is what the user sees and edits;
/// the polygon store only mirrors the polygons kept in here.
#[derive(Debug, Clone, Default)]
pub struct FeatureGroup {
    shapes: Vec<Shape>,
}

impl FeatureGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.index_of(id)?;
        Some(self.shapes.remove(index))
    }

    pub fn clear(&mut self) -> Vec<Shape> {
        std::mem::take(&mut self.shapes)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn count_kind(&self, kind: ShapeKind) -> usize {
        self.shapes.iter().filter(|s| s.kind() == kind).count()
    }

    /// topmost shape under `pos` (last drawn wins)
    pub fn hit_test(&self, view: &MapView, pos: Pos2) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.hit_test(view, pos))
            .map(|s| s.id)
    }

    /// paint every shape; `highlight` gets `alt_style` instead of `style`
    pub fn paint(
        &self,
        painter: &Painter,
        view: &MapView,
        style: &ShapeStyle,
        highlight: Option<(ShapeId, &ShapeStyle)>,
    ) {
        for shape in &self.shapes {
            match highlight {
                Some((id, alt_style)) if id == shape.id => shape.paint(painter, view, alt_style),
                _ => shape.paint(painter, view, style),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{LatLng, default_ring};
    use crate::shape::Geometry;

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut group = FeatureGroup::new();
        let a = Shape::new(Geometry::Marker(LatLng::new(0.0, 0.0)));
        let b = Shape::new(Geometry::Polygon(default_ring()));
        let c = Shape::new(Geometry::Marker(LatLng::new(1.0, 1.0)));
        let ids = [a.id, b.id, c.id];
        group.add(a);
        group.add(b);
        group.add(c);

        let removed = group.remove(ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);
        assert_eq!(group.index_of(ids[2]), Some(1));

        // newest first, the way hit testing walks the layer
        let order: Vec<ShapeId> = group.iter().rev().map(|s| s.id).collect();
        assert_eq!(order, vec![ids[2], ids[0]]);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut group = FeatureGroup::new();
        assert!(group.remove(ShapeId::new()).is_none());
    }

    #[test]
    fn counts_by_kind() {
        let mut group = FeatureGroup::new();
        group.add(Shape::new(Geometry::Polygon(default_ring())));
        group.add(Shape::new(Geometry::Marker(LatLng::new(0.0, 0.0))));
        assert_eq!(group.count_kind(ShapeKind::Polygon), 1);
        assert_eq!(group.count_kind(ShapeKind::Circle), 0);
    }
}
