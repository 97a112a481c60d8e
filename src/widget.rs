use crate::config::MapConfig;
use crate::control::{DrawControl, DrawEvent};
use crate::feature_group::FeatureGroup;
use crate::geo::{Ring, default_ring};
use crate::map_view::MapView;
use crate::shape::{Geometry, Shape, ShapeKind};
use crate::store::PolygonStore;

/// The map with its editable shape layer and the local polygon collection.
///
/// Data flows one way: the toolbar turns user actions into [`DrawEvent`]s,
/// [`MapWidget::fire`] applies them to the feature group and the store.
pub struct MapWidget {
    pub view: MapView,
    pub features: FeatureGroup,
    pub polygons: PolygonStore,
    pub control: DrawControl,

    // number of events dispatched so far
    events_fired: u64,
}

impl MapWidget {
    /// Build the widget and run its one-time initialization, which seeds the
    /// collection with the default ring.
    pub fn mount(config: &MapConfig) -> Self {
        let mut widget = MapWidget {
            view: MapView::new(config.center, config.zoom),
            features: FeatureGroup::new(),
            polygons: PolygonStore::new(),
            control: DrawControl::new(config.draw),
            events_fired: 0,
        };
        widget.on_mounted(default_ring());
        widget
    }

    fn on_mounted(&mut self, seed: Ring) {
        tracing::debug!("mounted");
        // goes straight into the layer, no `Created` event for the seed
        let shape = Shape::new(Geometry::Polygon(seed.clone()));
        self.polygons.seed(shape.id, seed);
        self.features.add(shape);
        tracing::debug!(polygons = self.polygons.len(), "seeded");
        self.log_polygons();
    }

    /// dispatch a toolbar event to its handler
    pub fn fire(&mut self, event: DrawEvent) {
        self.events_fired += 1;
        tracing::trace!(event = event.name(), "dispatch");
        match event {
            DrawEvent::Created { kind, shape } => self.on_created(kind, shape),
            DrawEvent::Edited { shapes } => self.on_edited(&shapes),
            DrawEvent::Deleted { shapes } => self.on_deleted(&shapes),
        }
    }

    fn on_created(&mut self, kind: ShapeKind, shape: Shape) {
        let appended = self.polygons.on_created(kind, &shape);
        tracing::debug!(kind = kind.name(), id = %shape.id, appended, "created");
        self.features.add(shape);
        if appended {
            self.log_polygons();
        }
    }

    fn on_edited(&mut self, shapes: &[Shape]) {
        let changed = self.polygons.on_edited(shapes);
        tracing::debug!(shapes = shapes.len(), changed, "edited");
        for shape in shapes {
            if let Some(ring) = self.polygons.get(shape.id) {
                tracing::trace!(id = %shape.id, points = ring.len(), ring = %ring.to_json(), "entry");
            }
        }
        if changed > 0 {
            self.log_polygons();
        }
    }

    fn on_deleted(&mut self, shapes: &[Shape]) {
        let removed = self.polygons.on_deleted(shapes);
        tracing::debug!(shapes = shapes.len(), removed, "deleted");
        if removed > 0 {
            self.log_polygons();
        }
    }

    pub fn events_fired(&self) -> u64 {
        self.events_fired
    }

    /// number of polygons drawn on the map
    pub fn rendered_polygon_count(&self) -> usize {
        self.features.count_kind(ShapeKind::Polygon)
    }

    fn log_polygons(&self) {
        tracing::trace!(
            polygons = %self.polygons.to_json(),
            revision = self.polygons.revision(),
            rendered = self.rendered_polygon_count(),
            "polygon collection"
        );
    }
}
