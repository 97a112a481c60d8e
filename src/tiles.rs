//! Base map tiles: URL templating, background downloads, texture cache.

use crate::map_view::MapView;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use eframe::egui::{
    self, Color32, ColorImage, Painter, Rect, TextureHandle, TextureOptions, pos2, vec2,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::thread;
use std::time::Duration;

const TILE_PX: f32 = 256.0;
const DEFAULT_CACHE_CAPACITY: usize = 512;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum TileError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("tile server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("could not decode tile image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Where tiles come from.
#[derive(Debug, Clone)]
pub struct TileSource {
    pub template: String,
    pub subdomains: Vec<String>,
}

impl TileSource {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>) -> Self {
        TileSource {
            template: template.into(),
            subdomains,
        }
    }

    pub fn url(&self, tile: TileId) -> String {
        let sub = if self.subdomains.is_empty() {
            ""
        } else {
            let n = self.subdomains.len() as u64;
            let idx = (u64::from(tile.x) + u64::from(tile.y)) % n;
            self.subdomains[idx as usize].as_str()
        };
        self.template
            .replace("{s}", sub)
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

/// A tile to paint and where its top-left corner lands on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub id: TileId,
    pub rect: Rect,
}

/// Tiles covering the view's viewport at its zoom level. Columns wrap around
/// the antimeridian; rows beyond the poles are left out.
pub fn visible_tiles(view: &MapView) -> Vec<PlacedTile> {
    let count = 1i64 << view.zoom;
    let size = f64::from(TILE_PX);
    let vp = view.viewport;
    let (min_x, min_y) = view.screen_to_world(vp.min);
    let (max_x, max_y) = view.screen_to_world(vp.max);

    let col0 = (min_x / size).floor() as i64;
    let col1 = (max_x / size).floor() as i64;
    let row0 = ((min_y / size).floor() as i64).max(0);
    let row1 = ((max_y / size).floor() as i64).min(count - 1);

    let mut tiles = Vec::new();
    for row in row0..=row1 {
        for col in col0..=col1 {
            let origin = view.world_to_screen((col as f64 * size, row as f64 * size));
            let id = TileId {
                z: view.zoom,
                x: col.rem_euclid(count) as u32,
                y: row as u32,
            };
            tiles.push(PlacedTile {
                id,
                rect: Rect::from_min_size(origin, vec2(TILE_PX, TILE_PX)),
            });
        }
    }
    tiles
}

enum TileState {
    Pending,
    Ready(TextureHandle),
    Failed,
}

struct TileSlot {
    state: TileState,
    last_used: u64,
}

type FetchResult = (TileId, Result<ColorImage, TileError>);

/// Downloads tiles on a fixed pool of worker threads and keeps the decoded
/// textures around.
pub struct TileLayer {
    source: TileSource,
    attribution: String,
    slots: HashMap<TileId, TileSlot>,
    /// visible tiles waiting for a free worker, oldest request first
    queue: VecDeque<TileId>,
    /// handed to the pool and not answered yet
    in_flight: HashSet<TileId>,
    workers: usize,
    capacity: usize,
    frame: u64,
    jobs: Option<Sender<TileId>>,
    pool_started: bool,
    results_tx: Sender<FetchResult>,
    results_rx: Receiver<FetchResult>,
}

impl TileLayer {
    pub fn new(source: TileSource, attribution: String, workers: usize) -> Self {
        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        TileLayer {
            source,
            attribution,
            slots: HashMap::new(),
            queue: VecDeque::new(),
            in_flight: HashSet::new(),
            workers: workers.max(1),
            capacity: DEFAULT_CACHE_CAPACITY,
            frame: 0,
            jobs: None,
            pool_started: false,
            results_tx,
            results_rx,
        }
    }

    /// spawn the fetch workers. they live as long as the job channel, i.e.
    /// as long as this layer.
    fn start_pool(&mut self, ctx: &egui::Context) {
        if self.pool_started {
            return;
        }
        self.pool_started = true;

        let client = match reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "tile client unavailable, map stays blank");
                return;
            }
        };

        let (jobs_tx, jobs_rx) = crossbeam_channel::bounded::<TileId>(self.workers);
        for index in 0..self.workers {
            let jobs = jobs_rx.clone();
            let results = self.results_tx.clone();
            let client = client.clone();
            let source = self.source.clone();
            let ctx = ctx.clone();
            let spawned = thread::Builder::new()
                .name(format!("tile-fetch-{index}"))
                .spawn(move || {
                    for id in jobs {
                        let result = fetch_tile(&client, &source.url(id));
                        if results.send((id, result)).is_err() {
                            break;
                        }
                        ctx.request_repaint();
                    }
                });
            if let Err(e) = spawned {
                tracing::error!(worker = index, error = %e, "could not start tile worker");
            }
        }
        tracing::debug!(workers = self.workers, "tile pool started");
        self.jobs = Some(jobs_tx);
    }

    /// pick up finished downloads and turn them into textures
    fn poll(&mut self, ctx: &egui::Context) {
        while let Ok((id, result)) = self.results_rx.try_recv() {
            self.in_flight.remove(&id);
            let state = match result {
                Ok(image) => {
                    let name = format!("tile-{}-{}-{}", id.z, id.x, id.y);
                    TileState::Ready(ctx.load_texture(name, image, TextureOptions::LINEAR))
                }
                Err(e) => {
                    tracing::warn!(z = id.z, x = id.x, y = id.y, error = %e, "tile failed");
                    TileState::Failed
                }
            };
            // a tile evicted while in flight is not brought back
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.state = state;
            }
        }
    }

    fn request(&mut self, id: TileId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.last_used = self.frame;
            return;
        }
        self.slots.insert(
            id,
            TileSlot {
                state: TileState::Pending,
                last_used: self.frame,
            },
        );
        self.queue.push_back(id);
    }

    /// forget pending tiles that scrolled out of view before a worker got
    /// to them; they are requested again if they come back.
    fn drop_stale_requests(&mut self, visible: &HashSet<TileId>) {
        self.queue.retain(|id| visible.contains(id));
        let in_flight = &self.in_flight;
        self.slots.retain(|id, slot| {
            !matches!(slot.state, TileState::Pending)
                || visible.contains(id)
                || in_flight.contains(id)
        });
    }

    /// hand queued tiles to the pool until it is full
    fn dispatch(&mut self) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        let mut disconnected = false;
        while let Some(&id) = self.queue.front() {
            match jobs.try_send(id) {
                Ok(()) => {
                    self.queue.pop_front();
                    self.in_flight.insert(id);
                }
                Err(TrySendError::Full(_)) => break,
                Err(TrySendError::Disconnected(_)) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            tracing::error!("tile workers are gone");
            self.jobs = None;
        }
    }

    /// drop least recently used tiles beyond the capacity. tiles on screen
    /// this frame and tiles being fetched are kept.
    fn evict(&mut self) {
        if self.slots.len() <= self.capacity {
            return;
        }
        let mut idle: Vec<(u64, TileId)> = self
            .slots
            .iter()
            .filter(|(id, slot)| slot.last_used < self.frame && !self.in_flight.contains(*id))
            .map(|(id, slot)| (slot.last_used, *id))
            .collect();
        idle.sort_unstable_by_key(|(used, _)| *used);
        let excess = self.slots.len() - self.capacity;
        for (_, id) in idle.into_iter().take(excess) {
            self.slots.remove(&id);
        }
        let slots = &self.slots;
        self.queue.retain(|id| slots.contains_key(id));
    }

    /// paint the base map for this frame, scheduling whatever is missing
    pub fn paint(&mut self, ctx: &egui::Context, painter: &Painter, view: &MapView) {
        self.frame += 1;
        self.start_pool(ctx);
        self.poll(ctx);

        painter.rect_filled(view.viewport, 0.0, Color32::from_gray(221));
        let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
        let placed = visible_tiles(view);
        let visible: HashSet<TileId> = placed.iter().map(|t| t.id).collect();
        self.drop_stale_requests(&visible);
        for tile in &placed {
            self.request(tile.id);
            if let Some(TileSlot {
                state: TileState::Ready(texture),
                ..
            }) = self.slots.get(&tile.id)
            {
                painter.image(texture.id(), tile.rect, uv, Color32::WHITE);
            }
        }

        self.dispatch();
        self.evict();

        let corner = view.viewport.right_bottom() - vec2(4.0, 2.0);
        painter.text(
            corner,
            egui::Align2::RIGHT_BOTTOM,
            &self.attribution,
            egui::FontId::proportional(11.0),
            Color32::from_gray(60),
        );
    }
}

fn fetch_tile(client: &reqwest::blocking::Client, url: &str) -> Result<ColorImage, TileError> {
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(TileError::Status(response.status()));
    }
    let bytes = response.bytes()?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
