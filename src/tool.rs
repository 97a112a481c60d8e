use crate::widget::MapWidget;
use eframe::egui::{Context, Painter, Response, Ui};

/// Each toolbar mode must be able to:
/// - handle input events on the map
/// - draw its own decorations onto the `painter`
/// - show its actions under the toolbar buttons
///
/// Tools never touch the polygon collection directly; they report what the
/// user did through [`MapWidget::fire`].
pub trait Tool {
    /// called once per frame; let the tool inspect input and update the map
    fn handle_input(&mut self, ctx: &Context, response: &Response, widget: &mut MapWidget);

    /// called after the shapes are painted, to draw sketches, handles, hints.
    fn paint(&mut self, ctx: &Context, painter: &Painter, widget: &MapWidget);

    /// tool actions (finish, save, cancel, ...) inside the toolbar window
    fn tool_ui(&mut self, ui: &mut Ui, widget: &mut MapWidget);

    /// when true, dragging on the map belongs to the tool instead of panning
    fn captures_drag(&self) -> bool {
        false
    }

    /// the toolbar is switching away from this tool: drop unsaved work
    fn deactivate(&mut self, _widget: &mut MapWidget) {}
}
