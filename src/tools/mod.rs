// bring in each tool's submodule:
pub mod deleting_tool;
pub mod drag_shape_tool;
pub mod editing_tool;
pub mod marker_tool;
pub mod polygon_tool;

use crate::shape::ShapeKind;
use crate::tool::Tool;
use crate::widget::MapWidget;
use deleting_tool::DeletingTool;
use drag_shape_tool::DragShapeTool;
use editing_tool::EditingTool;
use marker_tool::MarkerTool;
use polygon_tool::PolygonTool;

/// Toolbar modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToolKind {
    Draw(ShapeKind),
    Edit,
    Delete,
}

impl ToolKind {
    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Draw(ShapeKind::Polygon) => "Polygon",
            ToolKind::Draw(ShapeKind::Rectangle) => "Rectangle",
            ToolKind::Draw(ShapeKind::Polyline) => "Polyline",
            ToolKind::Draw(ShapeKind::Circle) => "Circle",
            ToolKind::Draw(ShapeKind::Marker) => "Marker",
            ToolKind::Edit => "Edit",
            ToolKind::Delete => "Delete",
        }
    }

    /// a fresh tool for this mode
    pub fn build(self, widget: &MapWidget) -> Box<dyn Tool> {
        match self {
            ToolKind::Draw(ShapeKind::Polygon) => Box::new(PolygonTool::polygon()),
            ToolKind::Draw(ShapeKind::Polyline) => Box::new(PolygonTool::polyline()),
            ToolKind::Draw(ShapeKind::Rectangle) => Box::new(DragShapeTool::rectangle()),
            ToolKind::Draw(ShapeKind::Circle) => Box::new(DragShapeTool::circle()),
            ToolKind::Draw(ShapeKind::Marker) => Box::new(MarkerTool::new()),
            ToolKind::Edit => Box::new(EditingTool::new(widget)),
            ToolKind::Delete => Box::new(DeletingTool::new()),
        }
    }
}

/// the modes the toolbar shows for the widget's draw options, in order
pub fn modes(widget: &MapWidget) -> Vec<ToolKind> {
    widget
        .control
        .options
        .enabled_kinds()
        .map(ToolKind::Draw)
        .chain([ToolKind::Edit, ToolKind::Delete])
        .collect()
}

/// Which toolbar mode is on and the tool that runs it.
///
/// Every draw event dispatched by the widget ends the current session, so
/// the toolbar falls back to idle after each change of the collection.
pub struct Toolbar {
    selected: Option<ToolKind>,
    // the tool for `selected`; swapped whenever the mode changes
    active: Option<Box<dyn Tool>>,
    // `widget.events_fired()` as of the last sync
    seen_events: u64,
}

impl Toolbar {
    pub fn new(widget: &MapWidget) -> Self {
        Toolbar {
            selected: None,
            active: None,
            seen_events: widget.events_fired(),
        }
    }

    pub fn selected(&self) -> Option<ToolKind> {
        self.selected
    }

    pub fn active_mut(&mut self) -> Option<&mut (dyn Tool + 'static)> {
        self.active.as_deref_mut()
    }

    /// switch mode; picking the active mode again turns it off.
    /// the old tool drops whatever it had not saved.
    pub fn select(&mut self, kind: ToolKind, widget: &mut MapWidget) {
        self.select_with(kind, widget, |w| kind.build(w));
    }

    fn select_with(
        &mut self,
        kind: ToolKind,
        widget: &mut MapWidget,
        build: impl FnOnce(&MapWidget) -> Box<dyn Tool>,
    ) {
        if let Some(mut old) = self.active.take() {
            old.deactivate(widget);
        }
        if self.selected == Some(kind) {
            self.selected = None;
            return;
        }
        tracing::debug!(tool = kind.label(), "tool selected");
        self.selected = Some(kind);
        // built after the old tool let go, so it sees the restored geometry
        self.active = Some(build(widget));
    }

    /// go idle if the widget dispatched an event since the last call
    pub fn sync(&mut self, widget: &MapWidget) {
        let fired = widget.events_fired();
        if fired != self.seen_events {
            self.seen_events = fired;
            if let Some(kind) = self.selected.take() {
                tracing::debug!(tool = kind.label(), "toolbar reset");
            }
            self.active = None;
        }
    }
}
