use crate::control::DrawEvent;
use crate::shape::{Shape, ShapeId, ShapeStyle};
use crate::tool::Tool;
use crate::widget::MapWidget;
use eframe::egui::{self, Context, Key, Painter, Pos2, Response, Ui};

/// Click-to-remove session. Clicked shapes stay on the map, marked for
/// removal, until the session is saved; only then do they leave the feature
/// group and get reported.
pub struct DeletingTool {
    /// shapes marked for removal, in the order they were clicked
    marked: Vec<ShapeId>,

    hovered: Option<ShapeId>,
}

impl DeletingTool {
    pub fn new() -> Self {
        DeletingTool {
            marked: Vec::new(),
            hovered: None,
        }
    }

    pub fn pending(&self) -> usize {
        self.marked.len()
    }

    /// mark the topmost shape under `pos`, or unmark it if it already is.
    /// returns whether a shape was hit.
    pub fn click(&mut self, pos: Pos2, widget: &MapWidget) -> bool {
        let Some(id) = widget.features.hit_test(&widget.view, pos) else {
            return false;
        };
        match self.marked.iter().position(|m| *m == id) {
            Some(i) => {
                self.marked.remove(i);
            }
            None => self.marked.push(id),
        }
        true
    }

    /// take the marked shapes off the map and report them
    pub fn save(&mut self, widget: &mut MapWidget) {
        let shapes = self
            .marked
            .drain(..)
            .filter_map(|id| widget.features.remove(id))
            .collect();
        widget.fire(DrawEvent::Deleted { shapes });
    }

    pub fn cancel(&mut self) {
        self.marked.clear();
    }

    /// remove every shape and report it right away
    pub fn clear_all(&mut self, widget: &mut MapWidget) {
        self.marked.clear();
        let shapes: Vec<Shape> = widget.features.clear();
        widget.fire(DrawEvent::Deleted { shapes });
    }
}

impl Tool for DeletingTool {
    fn handle_input(&mut self, ctx: &Context, response: &Response, widget: &mut MapWidget) {
        self.hovered = response
            .hover_pos()
            .and_then(|pos| widget.features.hit_test(&widget.view, pos));

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.click(pos, widget);
            }
        }
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.cancel();
        }
    }

    fn paint(&mut self, _ctx: &Context, painter: &Painter, widget: &MapWidget) {
        let doomed = ShapeStyle::doomed();
        let marked = self.marked.iter().copied().chain(self.hovered);
        for shape in marked.filter_map(|id| widget.features.get(id)) {
            shape.paint(painter, &widget.view, &doomed);
        }
    }

    fn tool_ui(&mut self, ui: &mut Ui, widget: &mut MapWidget) {
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save(widget);
            }
            if ui.button("Cancel").clicked() {
                self.cancel();
            }
            if ui
                .add_enabled(!widget.features.is_empty(), egui::Button::new("Clear all"))
                .clicked()
            {
                self.clear_all(widget);
            }
        });
        match self.pending() {
            0 => ui.label("Click on a feature to remove it."),
            n => ui.label(format!("{n} marked for removal.")),
        };
    }

    fn deactivate(&mut self, _widget: &mut MapWidget) {
        self.cancel();
    }
}
