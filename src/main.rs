mod app;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use app::App;
use waffle_rank::chart;
use waffle_rank::cli::Args;
use waffle_rank::dataset;
use waffle_rank::render::{self, RenderState};

/// Main application handler for winit's event loop.
struct WaffleApp {
    app: App,
    render_state: Option<RenderState>,
    window: Option<Arc<Window>>,
    /// First fatal error hit inside the event loop.
    error: Option<anyhow::Error>,
}

impl WaffleApp {
    fn new(app: App) -> Self {
        Self {
            app,
            render_state: None,
            window: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn update_window_title(&self) {
        if let Some(window) = &self.window {
            window.set_title(&self.app.title());
        }
    }
}

impl ApplicationHandler for WaffleApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.app.title())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.app.viewport_width.round() as u32,
                self.app.viewport_height.round() as u32,
            ));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow::anyhow!("creating window: {e}")),
        };
        self.window = Some(window.clone());

        // Initialize GPU rendering
        match pollster::block_on(RenderState::new(window.clone())) {
            Ok(state) => {
                let size = window.inner_size();
                tracing::info!(
                    "Window initialized: scale_factor={:.3}, physical_size={}x{}",
                    window.scale_factor(),
                    size.width,
                    size.height
                );
                self.app.resize(size.width, size.height);
                self.render_state = Some(state);
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e.context("initializing GPU")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(render) = &mut self.render_state {
                    render.resize(size.width, size.height);
                    self.app.resize(size.width, size.height);
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if self.app.hover(position.x, position.y) {
                    self.update_window_title();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let quit = match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => true,
                    Key::Character(c) => c.eq_ignore_ascii_case("q"),
                    _ => false,
                };
                if quit {
                    event_loop.exit();
                }
            }

            WindowEvent::RedrawRequested => {
                if self.app.needs_relayout {
                    self.app.relayout();
                    self.update_window_title();
                }

                self.app.rebuild_scene();

                if let Some(render) = &mut self.render_state {
                    let base = self.app.config.style.background.to_peniko();
                    if let Err(e) = render.render(&self.app.scene, base) {
                        tracing::error!("Render error: {}", e);
                    }
                }
            }

            _ => {}
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let dataset = dataset::load_path(&args.source, &args.load_options())?;
    let config = args.chart_config();

    // Lay out once at figure size so bad input fails before any window opens.
    let (width, height) = config.canvas_size();
    let chart = chart::compose(&dataset, args.maxrank, &config, width, height)?;

    if let Some(path) = &args.fig {
        return render::save_chart(&chart, &config, path);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = WaffleApp::new(App::new(dataset, args.maxrank, config));
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Stable name for the failure, printed as `error[<kind>]`.
fn error_kind(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<waffle_rank::Error>() {
        Some(e) => e.kind(),
        None => "render",
    }
}

fn main() -> ExitCode {
    let args = Args::parse_env();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match args.log_directive().parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    tracing::info!("waffle-rank starting, source: {:?}", args.source);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {e:#}", error_kind(&e));
            ExitCode::FAILURE
        }
    }
}
