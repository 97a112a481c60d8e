use crate::control::DrawEvent;
use crate::shape::{Shape, ShapeId};
use crate::tool::Tool;
use crate::widget::MapWidget;
use eframe::egui::{self, Color32, Context, Key, Painter, Pos2, Rect, Response, Stroke, Ui, vec2};
use std::collections::HashMap;

/// pointer distance (pixels) at which a vertex handle is grabbed
const HANDLE_GRAB_RADIUS: f32 = 8.0;
const HANDLE_SIZE: f32 = 8.0;

/// What the user is dragging: vertex `vertex` of shape `shape`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveHandle {
    shape: ShapeId,
    vertex: usize,
}

/// Vertex editing session over every shape in the feature group.
///
/// Changes are applied to the live shapes right away so the map shows them,
/// but only reported on save. Cancel puts the geometry from the start of the
/// session back.
pub struct EditingTool {
    /// geometry of every shape as it was when the session started
    originals: HashMap<ShapeId, Shape>,

    /// shapes touched during this session, in the order they were first moved
    touched: Vec<ShapeId>,

    active: Option<ActiveHandle>,
}

impl EditingTool {
    pub fn new(widget: &MapWidget) -> Self {
        EditingTool {
            originals: widget
                .features
                .iter()
                .map(|s| (s.id, s.clone()))
                .collect(),
            touched: Vec::new(),
            active: None,
        }
    }

    /// try to pick up the handle under `pos`. returns whether one was grabbed.
    pub fn grab(&mut self, pos: Pos2, widget: &MapWidget) -> bool {
        // topmost shape first, like hit testing
        let hit = widget.features.iter().rev().find_map(|shape| {
            shape
                .screen_points(&widget.view)
                .iter()
                .position(|p| p.distance(pos) <= HANDLE_GRAB_RADIUS)
                .map(|vertex| ActiveHandle {
                    shape: shape.id,
                    vertex,
                })
        });
        self.active = hit;
        hit.is_some()
    }

    pub fn drag_to(&mut self, pos: Pos2, widget: &mut MapWidget) {
        let Some(handle) = self.active else {
            return;
        };
        let to = widget.view.to_latlng(pos);
        if let Some(shape) = widget.features.get_mut(handle.shape) {
            shape.move_vertex(handle.vertex, to);
            if !self.touched.contains(&handle.shape) {
                self.touched.push(handle.shape);
            }
        }
    }

    pub fn release(&mut self) {
        self.active = None;
    }

    /// shapes whose geometry differs from the start of the session
    fn edited(&self, widget: &MapWidget) -> Vec<Shape> {
        self.touched
            .iter()
            .filter_map(|id| {
                let now = widget.features.get(*id)?;
                let before = self.originals.get(id);
                (before.map(|b| &b.geometry) != Some(&now.geometry)).then(|| now.clone())
            })
            .collect()
    }

    /// report the edits and start over from the current geometry
    pub fn save(&mut self, widget: &mut MapWidget) {
        let shapes = self.edited(widget);
        widget.fire(DrawEvent::Edited { shapes });
        *self = EditingTool::new(widget);
    }

    /// put every touched shape back the way it was
    pub fn cancel(&mut self, widget: &mut MapWidget) {
        for id in self.touched.drain(..) {
            if let (Some(shape), Some(original)) =
                (widget.features.get_mut(id), self.originals.get(&id))
            {
                shape.geometry = original.geometry.clone();
            }
        }
        self.active = None;
    }
}

impl Tool for EditingTool {
    fn handle_input(&mut self, ctx: &Context, response: &Response, widget: &mut MapWidget) {
        if response.drag_started() {
            // where the button went down, not where the drag was recognized
            let origin = ctx.input(|i| i.pointer.press_origin());
            if let Some(pos) = origin.or(response.interact_pointer_pos()) {
                self.grab(pos, widget);
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.drag_to(pos, widget);
            }
        }
        if response.drag_stopped() {
            self.release();
        }
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.cancel(widget);
        }
    }

    fn paint(&mut self, _ctx: &Context, painter: &Painter, widget: &MapWidget) {
        let border = Stroke::new(1.0, Color32::from_rgb(0x33, 0x88, 0xff));
        for shape in widget.features.iter() {
            for (vertex, p) in shape.screen_points(&widget.view).into_iter().enumerate() {
                let active = self.active
                    == Some(ActiveHandle {
                        shape: shape.id,
                        vertex,
                    });
                let fill = if active { border.color } else { Color32::WHITE };
                let rect = Rect::from_center_size(p, vec2(HANDLE_SIZE, HANDLE_SIZE));
                painter.rect_filled(rect, 1.0, fill);
                painter.rect_stroke(rect, 1.0, border, egui::StrokeKind::Middle);
            }
        }
    }

    fn tool_ui(&mut self, ui: &mut Ui, widget: &mut MapWidget) {
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save(widget);
            }
            if ui.button("Cancel").clicked() {
                self.cancel(widget);
            }
        });
        ui.label("Drag handles to edit features.");
    }

    fn captures_drag(&self) -> bool {
        self.active.is_some()
    }

    fn deactivate(&mut self, widget: &mut MapWidget) {
        self.cancel(widget);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::geo::default_ring;
    use eframe::egui::vec2;

    fn seeded_handle(widget: &MapWidget) -> (ShapeId, Pos2) {
        let shape = widget.features.iter().next().unwrap();
        (shape.id, shape.screen_points(&widget.view)[1])
    }

    #[test]
    fn drag_and_save_updates_collection() {
        let mut w = MapWidget::mount(&MapConfig::default());
        let (id, handle) = seeded_handle(&w);
        let mut tool = EditingTool::new(&w);

        assert!(tool.grab(handle + vec2(2.0, 2.0), &w));
        tool.drag_to(handle + vec2(40.0, -25.0), &mut w);
        tool.release();

        // not reported until saved
        assert_eq!(w.polygons.get(id), Some(&default_ring()));

        tool.save(&mut w);
        let live = w.features.get(id).unwrap().outer_ring().cloned();
        assert_eq!(w.polygons.get(id).cloned(), live);
        assert_ne!(w.polygons.get(id), Some(&default_ring()));
        assert_eq!(w.events_fired(), 1);
    }

    #[test]
    fn cancel_restores_geometry() {
        let mut w = MapWidget::mount(&MapConfig::default());
        let (id, handle) = seeded_handle(&w);
        let mut tool = EditingTool::new(&w);

        assert!(tool.grab(handle, &w));
        tool.drag_to(handle + vec2(60.0, 60.0), &mut w);
        tool.cancel(&mut w);

        assert_eq!(w.features.get(id).unwrap().outer_ring(), Some(&default_ring()));
        assert_eq!(w.polygons.get(id), Some(&default_ring()));
        assert_eq!(w.events_fired(), 0);
    }

    #[test]
    fn grab_misses_away_from_handles() {
        let w = MapWidget::mount(&MapConfig::default());
        let mut tool = EditingTool::new(&w);
        assert!(!tool.grab(Pos2::new(5.0, 5.0), &w));
        assert!(!tool.captures_drag());
    }

    #[test]
    fn save_without_changes_reports_nothing_edited() {
        let mut w = MapWidget::mount(&MapConfig::default());
        let mut tool = EditingTool::new(&w);
        let rev = w.polygons.revision();
        tool.save(&mut w);
        assert_eq!(w.polygons.revision(), rev);
    }
}
