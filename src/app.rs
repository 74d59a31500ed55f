use vello::Scene;

use waffle_rank::chart::{self, Chart};
use waffle_rank::config::ChartConfig;
use waffle_rank::dataset::Dataset;
use waffle_rank::render::scene::build_scene;
use waffle_rank::render::text::TextRenderer;
use waffle_rank::render::text_renderer_for;

/// Interactive chart viewer state.
pub struct App {
    pub dataset: Dataset,
    pub maxrank: u32,
    pub config: ChartConfig,
    pub chart: Option<Chart>,
    pub text_renderer: TextRenderer,

    /// Index into `chart.tiles` under the cursor.
    pub hover_tile: Option<usize>,

    // Rendering
    pub scene: Scene,
    pub needs_relayout: bool,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl App {
    pub fn new(dataset: Dataset, maxrank: u32, config: ChartConfig) -> Self {
        let text_renderer = text_renderer_for(&config);
        let (viewport_width, viewport_height) = config.canvas_size();
        Self {
            dataset,
            maxrank,
            config,
            chart: None,
            text_renderer,
            hover_tile: None,
            scene: Scene::new(),
            needs_relayout: true,
            viewport_width,
            viewport_height,
        }
    }

    /// Recompose the chart for the current viewport.
    ///
    /// A window shrunk below the margins cannot hold a chart; the previous
    /// one is dropped and the window stays blank until it grows again.
    pub fn relayout(&mut self) {
        self.hover_tile = None;
        match chart::compose(
            &self.dataset,
            self.maxrank,
            &self.config,
            self.viewport_width,
            self.viewport_height,
        ) {
            Ok(chart) => {
                tracing::info!(
                    "Layout computed: {} tiles for {}x{} viewport",
                    chart.tiles.len(),
                    self.viewport_width,
                    self.viewport_height
                );
                self.chart = Some(chart);
            }
            Err(e) => {
                tracing::warn!("Cannot lay out chart at {}x{}: {}", self.viewport_width, self.viewport_height, e);
                self.chart = None;
            }
        }
        self.needs_relayout = false;
    }

    /// Rebuild the Vello scene from the current chart.
    pub fn rebuild_scene(&mut self) {
        match &self.chart {
            Some(chart) => build_scene(&mut self.scene, chart, &self.config, &mut self.text_renderer),
            None => self.scene.reset(),
        }
    }

    /// Handle viewport resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport_width = f64::from(width);
        self.viewport_height = f64::from(height);
        self.needs_relayout = true;
    }

    /// Update the hovered tile. Returns true if it changed.
    pub fn hover(&mut self, x: f64, y: f64) -> bool {
        let hit = self
            .chart
            .as_ref()
            .and_then(|chart| chart.tiles.iter().position(|t| t.contains(x, y)));
        let changed = hit != self.hover_tile;
        self.hover_tile = hit;
        changed
    }

    pub fn title(&self) -> String {
        let hovered = self
            .hover_tile
            .and_then(|i| self.chart.as_ref().and_then(|c| c.tiles.get(i)));
        match hovered {
            Some(tile) => format!(
                "waffle-rank: #{} {} ({} waffles)",
                tile.record.rank, tile.record.name, tile.record.count
            ),
            None => format!("waffle-rank: top {}", self.maxrank),
        }
    }
}
