mod frame_input;
mod render;
mod window_config;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use app::app_loop::{AppState, PointerTracker};
use app::camera_file::CameraFile;
use app::config::AppConfig;
use app::session_store::{SyncWorker, load_or_fallback};
use clap::Parser;
use macroquad::prelude::*;
use tactics_core::{AutoResolver, FrameDriver, Game, Team};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::frame_input::capture_frame_input;
use crate::render::draw_frame;
use crate::window_config::build_window_conf;

struct Session {
    game: Game,
    sync: SyncWorker,
    cameras: CameraFile,
    camera_path: Option<PathBuf>,
}

impl Session {
    fn start(config: &AppConfig) -> Result<Self> {
        let engine = config.engine_config()?;
        let content = config.content_pack()?;
        let backend = config.backend()?;

        let snapshot = load_or_fallback(&backend, &config.session, || config.fallback_snapshot());
        let game = match Game::new(snapshot, engine.clone()) {
            Ok(game) => game,
            Err(err) => {
                warn!(%err, "stored session is inconsistent, starting from the configured map");
                Game::new(config.fallback_snapshot(), engine.clone())
                    .context("fallback map is invalid")?
            }
        };
        let mut game = game.with_combat(content, AutoResolver::new(engine.auto_resolver_rounds));

        let camera_path = config.camera_path();
        let cameras = match &camera_path {
            Some(path) => CameraFile::load_or_default(path).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "camera storage unreadable, starting fresh");
                CameraFile::default()
            }),
            None => CameraFile::default(),
        };
        game.camera_mut().set_viewport(screen_width(), screen_height());
        match cameras.get(game.session_id()) {
            Some(state) => game.camera_mut().restore(state),
            None => {
                let first = game.units().living(Team::Player).next().map(|unit| unit.pos);
                if let Some(pos) = first {
                    game.camera_mut().snap_to(pos.x as f32, pos.y as f32);
                }
            }
        }

        let sync = SyncWorker::spawn(backend).context("failed to start session sync worker")?;
        info!(session = %game.session_id(), "session ready");
        Ok(Self { game, sync, cameras, camera_path })
    }

    fn save_camera(&mut self) {
        let Some(path) = &self.camera_path else {
            return;
        };
        if !self.cameras.set(self.game.session_id(), self.game.camera().state()) {
            return;
        }
        if let Err(err) = self.cameras.write_atomic(path) {
            warn!(path = %path.display(), %err, "failed to save camera");
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

async fn show_loading_error(message: &str) {
    prevent_quit();
    while !is_quit_requested() {
        clear_background(BLACK);
        draw_text("Failed to start session", 24.0, 48.0, 32.0, RED);
        for (i, line) in message.lines().enumerate() {
            draw_text(line, 24.0, 88.0 + i as f32 * 22.0, 20.0, LIGHTGRAY);
        }
        next_frame().await;
    }
}

#[macroquad::main(build_window_conf)]
async fn main() {
    init_tracing();
    let config = AppConfig::parse();

    let mut session = match Session::start(&config) {
        Ok(session) => session,
        Err(err) => {
            error!("{err:#}");
            show_loading_error(&format!("{err:#}")).await;
            return;
        }
    };

    prevent_quit();
    let mut app = AppState::new(config.debug);
    let mut driver = FrameDriver::new();
    let mut tracker = PointerTracker::default();
    let mut viewport = (screen_width(), screen_height());

    loop {
        if is_quit_requested() {
            break;
        }
        let dt = get_frame_time();
        let current = (screen_width(), screen_height());
        if current != viewport {
            viewport = current;
            session.game.camera_mut().set_viewport(current.0, current.1);
        }

        let input = capture_frame_input(&mut tracker);
        app.tick(&mut session.game, &input, dt);
        let report = driver.tick(&mut session.game, dt);

        for request in session.game.drain_sync_requests() {
            session.sync.submit(request);
        }
        if report.camera_settled {
            session.save_camera();
        }
        if report.redraw || !app.toasts.is_empty() {
            draw_frame(&session.game, &app, driver.effects(), report.frame);
        }
        next_frame().await;
    }

    session.save_camera();
    info!("shutting down");
    session.sync.shutdown();
}
