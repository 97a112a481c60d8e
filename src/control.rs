use crate::shape::{Shape, ShapeKind};
use eframe::egui::Align2;

/// Which shape kinds the toolbar offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOptions {
    pub polygon: bool,
    pub rectangle: bool,
    pub polyline: bool,
    pub circle: bool,
    pub marker: bool,
}

impl Default for DrawOptions {
    /// polygons only
    fn default() -> Self {
        DrawOptions {
            polygon: true,
            rectangle: false,
            polyline: false,
            circle: false,
            marker: false,
        }
    }
}

impl DrawOptions {
    pub fn none() -> Self {
        DrawOptions {
            polygon: false,
            rectangle: false,
            polyline: false,
            circle: false,
            marker: false,
        }
    }

    pub fn only(kinds: &[ShapeKind]) -> Self {
        let mut options = Self::none();
        for &kind in kinds {
            options.set(kind, true);
        }
        options
    }

    pub fn enabled(&self, kind: ShapeKind) -> bool {
        match kind {
            ShapeKind::Polygon => self.polygon,
            ShapeKind::Rectangle => self.rectangle,
            ShapeKind::Polyline => self.polyline,
            ShapeKind::Circle => self.circle,
            ShapeKind::Marker => self.marker,
        }
    }

    pub fn set(&mut self, kind: ShapeKind, on: bool) {
        match kind {
            ShapeKind::Polygon => self.polygon = on,
            ShapeKind::Rectangle => self.rectangle = on,
            ShapeKind::Polyline => self.polyline = on,
            ShapeKind::Circle => self.circle = on,
            ShapeKind::Marker => self.marker = on,
        }
    }

    pub fn enabled_kinds(&self) -> impl Iterator<Item = ShapeKind> + '_ {
        ShapeKind::ALL.into_iter().filter(|&kind| self.enabled(kind))
    }
}

/// What the toolbar reports back once the user commits an action.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// a new shape was drawn; it is not in the feature group yet
    Created { kind: ShapeKind, shape: Shape },
    /// shapes whose geometry changed, as they are now
    Edited { shapes: Vec<Shape> },
    /// shapes already taken out of the feature group
    Deleted { shapes: Vec<Shape> },
}

impl DrawEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DrawEvent::Created { .. } => "created",
            DrawEvent::Edited { .. } => "edited",
            DrawEvent::Deleted { .. } => "deleted",
        }
    }
}

/// The drawing toolbar's static setup.
#[derive(Debug, Clone)]
pub struct DrawControl {
    pub options: DrawOptions,
    /// corner of the map the toolbar is anchored to
    pub position: Align2,
}

impl DrawControl {
    pub fn new(options: DrawOptions) -> Self {
        DrawControl {
            options,
            position: Align2::RIGHT_TOP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offers_polygons_only() {
        let kinds: Vec<ShapeKind> = DrawOptions::default().enabled_kinds().collect();
        assert_eq!(kinds, vec![ShapeKind::Polygon]);
    }

    #[test]
    fn only_enables_listed_kinds() {
        let options = DrawOptions::only(&[ShapeKind::Marker, ShapeKind::Circle]);
        assert!(options.enabled(ShapeKind::Marker));
        assert!(options.enabled(ShapeKind::Circle));
        assert!(!options.enabled(ShapeKind::Polygon));
        assert_eq!(options.enabled_kinds().count(), 2);
    }
}
