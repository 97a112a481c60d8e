mod config;
mod control;
mod feature_group;
mod geo;
mod map_view;
mod shape;
mod store;
mod tiles;
mod tool;
mod tools;
mod widget;

use crate::config::MapConfig;
use crate::shape::ShapeStyle;
use crate::tiles::{TileLayer, TileSource};
use crate::tools::Toolbar;
use crate::widget::MapWidget;
use eframe::egui::{self, Align, Align2, Context, Sense, Vec2, Visuals};

/// scroll distance (points) that makes one zoom step
const ZOOM_SCROLL_STEP: f32 = 50.0;

/// gap between the map border and anchored controls
const CONTROL_MARGIN: f32 = 10.0;

/// main application state
struct MapDraw {
    widget: MapWidget,
    tiles: TileLayer,
    toolbar: Toolbar,

    // wheel movement not yet turned into a zoom step
    scroll_accum: f32,
}

impl MapDraw {
    fn new(_cc: &eframe::CreationContext<'_>, config: &MapConfig) -> Self {
        let source = TileSource::new(config.tile_url.clone(), config.subdomains.clone());
        let widget = MapWidget::mount(config);
        let toolbar = Toolbar::new(&widget);
        MapDraw {
            widget,
            tiles: TileLayer::new(source, config.attribution.clone(), config.max_tile_requests),
            toolbar,
            scroll_accum: 0.0,
        }
    }

    fn handle_navigation(&mut self, ctx: &Context, response: &egui::Response, tool_has_drag: bool) {
        if !tool_has_drag && response.dragged() {
            self.widget.view.pan_by(response.drag_delta());
        }

        if let Some(pointer) = response.hover_pos() {
            self.scroll_accum += ctx.input(|i| i.smooth_scroll_delta.y);
            if self.scroll_accum.abs() >= ZOOM_SCROLL_STEP {
                let step = if self.scroll_accum > 0.0 { 1 } else { -1 };
                self.widget.view.zoom_around(pointer, step);
                self.scroll_accum = 0.0;
            }
        } else {
            self.scroll_accum = 0.0;
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let config = MapConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid configuration, using defaults");
        MapConfig::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 500.0]),
        ..Default::default()
    };
    if let Err(e) = eframe::run_native(
        "MapDraw",
        native_options,
        Box::new(move |cc| Ok(Box::new(MapDraw::new(cc, &config)))),
    ) {
        tracing::error!(error = %e, "map window failed");
    }
}

impl eframe::App for MapDraw {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(Visuals::light());

        egui::CentralPanel::default()
            .frame(egui::Frame::default())
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
                self.widget.view.set_viewport(response.rect);

                // input first: the active tool, then whatever it leaves to the map
                let mut tool_has_drag = false;
                if let Some(tool) = self.toolbar.active_mut() {
                    tool.handle_input(ctx, &response, &mut self.widget);
                    tool_has_drag = tool.captures_drag();
                }
                self.handle_navigation(ctx, &response, tool_has_drag);

                // base map, then shapes, then tool decorations on top
                self.tiles.paint(ctx, &painter, &self.widget.view);
                self.widget
                    .features
                    .paint(&painter, &self.widget.view, &ShapeStyle::normal(), None);
                if let Some(tool) = self.toolbar.active_mut() {
                    tool.paint(ctx, &painter, &self.widget);
                }
            });

        self.show_zoom_window(ctx);
        self.show_toolbar_window(ctx);
        self.toolbar.sync(&self.widget);
    }
}

impl MapDraw {
    // +/- zoom buttons, top-left like every slippy map
    fn show_zoom_window(&mut self, ctx: &Context) {
        egui::Window::new("Zoom")
            .anchor(Align2::LEFT_TOP, Vec2::splat(CONTROL_MARGIN))
            .title_bar(false)
            .resizable(false)
            .show(ctx, |ui| {
                let view = &mut self.widget.view;
                let center = view.viewport.center();
                if ui
                    .add_enabled(view.zoom < view.max_zoom, egui::Button::new("+"))
                    .clicked()
                {
                    view.zoom_around(center, 1);
                }
                if ui
                    .add_enabled(view.zoom > view.min_zoom, egui::Button::new("−"))
                    .clicked()
                {
                    view.zoom_around(center, -1);
                }
            });
    }

    // draw/edit/delete toolbar plus the active tool's actions
    fn show_toolbar_window(&mut self, ctx: &Context) {
        let anchor = self.widget.control.position;
        let offset = Vec2::new(
            if anchor.x() == Align::Max { -CONTROL_MARGIN } else { CONTROL_MARGIN },
            if anchor.y() == Align::Max { -CONTROL_MARGIN } else { CONTROL_MARGIN },
        );
        let kinds = tools::modes(&self.widget);
        let mut clicked = None;

        egui::Window::new("Draw")
            .anchor(anchor, offset)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for kind in &kinds {
                        let on = self.toolbar.selected() == Some(*kind);
                        if ui.selectable_label(on, kind.label()).clicked() {
                            clicked = Some(*kind);
                        }
                    }
                });
                if let Some(tool) = self.toolbar.active_mut() {
                    ui.separator();
                    tool.tool_ui(ui, &mut self.widget);
                }
                ui.separator();
                let polygons = &self.widget.polygons;
                if polygons.is_empty() {
                    ui.label("No polygons");
                } else {
                    ui.label(format!("Polygons: {}", polygons.len()));
                }
            });

        if let Some(kind) = clicked {
            self.toolbar.select(kind, &mut self.widget);
        }
    }
}
