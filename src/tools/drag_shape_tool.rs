use crate::control::DrawEvent;
use crate::geo::{LatLng, Ring};
use crate::shape::{self, Geometry, Shape, ShapeKind, ShapeStyle};
use crate::tool::Tool;
use crate::widget::MapWidget;
use eframe::egui::{Context, Key, Painter, Pos2, Response, Ui};

/// drags shorter than this (in pixels) are treated as a stray click
const MIN_DRAG: f32 = 3.0;

/// Press-drag-release drawing of rectangles and circles.
pub struct DragShapeTool {
    kind: ShapeKind,
    start: Option<LatLng>,
    current: Option<LatLng>,
}

impl DragShapeTool {
    pub fn rectangle() -> Self {
        DragShapeTool {
            kind: ShapeKind::Rectangle,
            start: None,
            current: None,
        }
    }

    pub fn circle() -> Self {
        DragShapeTool {
            kind: ShapeKind::Circle,
            start: None,
            current: None,
        }
    }

    pub fn begin(&mut self, pos: Pos2, widget: &MapWidget) {
        let at = widget.view.to_latlng(pos);
        self.start = Some(at);
        self.current = Some(at);
    }

    pub fn drag_to(&mut self, pos: Pos2, widget: &MapWidget) {
        if self.start.is_some() {
            self.current = Some(widget.view.to_latlng(pos));
        }
    }

    /// what the shape would look like if the button was released now
    fn preview(&self) -> Option<Geometry> {
        let (start, current) = (self.start?, self.current?);
        Some(match self.kind {
            ShapeKind::Circle => Geometry::Circle {
                center: start,
                radius_m: shape::distance_m(start, current),
            },
            _ => Geometry::Rectangle(Ring::from_corners(start, current)),
        })
    }

    /// end the drag; fires `Created` unless the drag was too short
    pub fn release(&mut self, widget: &mut MapWidget) -> bool {
        let geometry = self.preview();
        let (start, current) = (self.start, self.current);
        self.cancel();
        let (Some(start), Some(current), Some(geometry)) = (start, current, geometry) else {
            return false;
        };
        let dragged = widget.view.to_screen(start).distance(widget.view.to_screen(current));
        if dragged < MIN_DRAG {
            return false;
        }
        widget.fire(DrawEvent::Created {
            kind: self.kind,
            shape: Shape::new(geometry),
        });
        true
    }

    pub fn cancel(&mut self) {
        self.start = None;
        self.current = None;
    }
}

impl Tool for DragShapeTool {
    fn handle_input(&mut self, ctx: &Context, response: &Response, widget: &mut MapWidget) {
        if response.drag_started() {
            // where the button went down, not where the drag was recognized
            let origin = ctx.input(|i| i.pointer.press_origin());
            if let Some(pos) = origin.or(response.interact_pointer_pos()) {
                self.begin(pos, widget);
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.drag_to(pos, widget);
            }
        }
        if response.drag_stopped() {
            self.release(widget);
        }
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.cancel();
        }
    }

    fn paint(&mut self, _ctx: &Context, painter: &Painter, widget: &MapWidget) {
        if let Some(geometry) = self.preview() {
            let sketch = Shape::new(geometry);
            sketch.paint(painter, &widget.view, &ShapeStyle::sketch());
        }
    }

    fn tool_ui(&mut self, ui: &mut Ui, _widget: &mut MapWidget) {
        let hint = match self.kind {
            ShapeKind::Circle => "Click and drag to draw circle.",
            _ => "Click and drag to draw rectangle.",
        };
        ui.label(hint);
        if let Some(Geometry::Circle { radius_m, .. }) = self.preview() {
            ui.label(format!("Radius: {radius_m:.0} m"));
        }
    }

    fn captures_drag(&self) -> bool {
        true
    }

    fn deactivate(&mut self, _widget: &mut MapWidget) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use eframe::egui::pos2;

    #[test]
    fn rectangle_drag_creates_rectangle_without_collecting_it() {
        let mut w = MapWidget::mount(&MapConfig::default());
        let mut tool = DragShapeTool::rectangle();
        tool.begin(pos2(100.0, 100.0), &w);
        tool.drag_to(pos2(300.0, 250.0), &w);
        assert!(tool.release(&mut w));

        assert_eq!(w.features.count_kind(ShapeKind::Rectangle), 1);
        assert_eq!(w.polygons.len(), 1);
    }

    #[test]
    fn circle_radius_follows_drag() {
        let mut w = MapWidget::mount(&MapConfig::default());
        let mut tool = DragShapeTool::circle();
        tool.begin(pos2(400.0, 250.0), &w);
        tool.drag_to(pos2(500.0, 250.0), &w);
        assert!(tool.release(&mut w));

        let circle = w
            .features
            .iter()
            .find(|s| s.kind() == ShapeKind::Circle)
            .unwrap();
        let Geometry::Circle { radius_m, .. } = circle.geometry else {
            panic!("not a circle");
        };
        let expected = 100.0 * w.view.meters_per_pixel();
        assert!((radius_m - expected).abs() / expected < 0.01);
    }

    #[test]
    fn tiny_drag_is_discarded() {
        let mut w = MapWidget::mount(&MapConfig::default());
        let mut tool = DragShapeTool::rectangle();
        tool.begin(pos2(100.0, 100.0), &w);
        tool.drag_to(pos2(101.0, 101.0), &w);
        assert!(!tool.release(&mut w));
        assert_eq!(w.features.len(), 1);
        assert!(tool.preview().is_none());
    }
}
