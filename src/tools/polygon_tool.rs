use crate::control::DrawEvent;
use crate::geo::{LatLng, Ring};
use crate::shape::{Geometry, Shape, ShapeKind, ShapeStyle};
use crate::tool::Tool;
use crate::widget::MapWidget;
use eframe::egui::{self, Color32, Context, Key, Painter, Pos2, Response, Stroke, Ui};

/// clicking this close (in pixels) to the first vertex closes the polygon
const CLOSE_RADIUS: f32 = 10.0;

const VERTEX_RADIUS: f32 = 4.0;

/// Click-by-click drawing of polygons (closed) and polylines (open).
pub struct PolygonTool {
    kind: ShapeKind,
    vertices: Vec<LatLng>,
}

impl PolygonTool {
    pub fn polygon() -> Self {
        PolygonTool {
            kind: ShapeKind::Polygon,
            vertices: Vec::new(),
        }
    }

    pub fn polyline() -> Self {
        PolygonTool {
            kind: ShapeKind::Polyline,
            vertices: Vec::new(),
        }
    }

    fn closed(&self) -> bool {
        self.kind == ShapeKind::Polygon
    }

    fn min_vertices(&self) -> usize {
        if self.closed() { 3 } else { 2 }
    }

    /// a click on the map at screen position `pos`
    pub fn click(&mut self, pos: Pos2, widget: &mut MapWidget) {
        if self.closed() && self.vertices.len() >= self.min_vertices() {
            if let Some(&first) = self.vertices.first() {
                if widget.view.to_screen(first).distance(pos) <= CLOSE_RADIUS {
                    self.finish(widget);
                    return;
                }
            }
        }
        self.vertices.push(widget.view.to_latlng(pos));
    }

    /// complete the shape if it has enough vertices. returns whether a shape
    /// was created.
    pub fn finish(&mut self, widget: &mut MapWidget) -> bool {
        if self.vertices.len() < self.min_vertices() {
            return false;
        }
        let vertices = std::mem::take(&mut self.vertices);
        let geometry = if self.closed() {
            Geometry::Polygon(Ring::new(vertices))
        } else {
            Geometry::Polyline(vertices)
        };
        widget.fire(DrawEvent::Created {
            kind: self.kind,
            shape: Shape::new(geometry),
        });
        true
    }

    pub fn undo_last(&mut self) {
        self.vertices.pop();
    }

    pub fn cancel(&mut self) {
        self.vertices.clear();
    }
}

impl Tool for PolygonTool {
    fn handle_input(&mut self, ctx: &Context, response: &Response, widget: &mut MapWidget) {
        // second click of a double-click finishes instead of adding a point
        if response.double_clicked() {
            self.finish(widget);
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.click(pos, widget);
            }
        }

        let (escape, backspace) =
            ctx.input(|i| (i.key_pressed(Key::Escape), i.key_pressed(Key::Backspace)));
        if escape {
            self.cancel();
        } else if backspace {
            self.undo_last();
        }
    }

    fn paint(&mut self, ctx: &Context, painter: &Painter, widget: &MapWidget) {
        let style = ShapeStyle::sketch();
        let mut points: Vec<Pos2> = self
            .vertices
            .iter()
            .map(|&v| widget.view.to_screen(v))
            .collect();

        // rubber band to the pointer
        if let Some(hover) = ctx.input(|i| i.pointer.hover_pos()) {
            if !points.is_empty() {
                points.push(hover);
            }
        }
        painter.line(points.clone(), Stroke::new(style.stroke.width, style.stroke.color));

        for (i, p) in points.iter().take(self.vertices.len()).enumerate() {
            let fill = if i == 0 && self.closed() {
                style.stroke.color
            } else {
                Color32::WHITE
            };
            painter.circle(*p, VERTEX_RADIUS, fill, style.stroke);
        }
    }

    fn tool_ui(&mut self, ui: &mut Ui, widget: &mut MapWidget) {
        ui.horizontal(|ui| {
            let can_finish = self.vertices.len() >= self.min_vertices();
            if ui.add_enabled(can_finish, egui::Button::new("Finish")).clicked() {
                self.finish(widget);
            }
            if ui
                .add_enabled(!self.vertices.is_empty(), egui::Button::new("Delete last point"))
                .clicked()
            {
                self.undo_last();
            }
            if ui.button("Cancel").clicked() {
                self.cancel();
            }
        });
        let hint = match (self.closed(), self.vertices.len()) {
            (_, 0) => "Click to start drawing shape.",
            (true, n) if n < 3 => "Click to continue drawing shape.",
            (true, _) => "Click first point to close this shape.",
            (false, _) => "Click last point to finish line.",
        };
        ui.label(hint);
    }

    fn deactivate(&mut self, _widget: &mut MapWidget) {
        self.cancel();
    }
}
