use crate::control::DrawEvent;
use crate::shape::{Geometry, MARKER_RADIUS, Shape, ShapeKind};
use crate::tool::Tool;
use crate::widget::MapWidget;
use eframe::egui::{Color32, Context, Painter, Pos2, Response, Stroke, Ui};

pub struct MarkerTool;

impl MarkerTool {
    pub fn new() -> Self {
        MarkerTool
    }

    pub fn place(&mut self, pos: Pos2, widget: &mut MapWidget) {
        let at = widget.view.to_latlng(pos);
        widget.fire(DrawEvent::Created {
            kind: ShapeKind::Marker,
            shape: Shape::new(Geometry::Marker(at)),
        });
    }
}

impl Tool for MarkerTool {
    fn handle_input(&mut self, _ctx: &Context, response: &Response, widget: &mut MapWidget) {
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.place(pos, widget);
            }
        }
    }

    fn paint(&mut self, ctx: &Context, painter: &Painter, _widget: &MapWidget) {
        // ghost marker under the cursor
        if let Some(pos) = ctx.input(|i| i.pointer.hover_pos()) {
            painter.circle_stroke(pos, MARKER_RADIUS, Stroke::new(2.0, Color32::from_gray(80)));
        }
    }

    fn tool_ui(&mut self, ui: &mut Ui, _widget: &mut MapWidget) {
        ui.label("Click map to place marker.");
    }
}
