#[macro_use]
extern crate rocket;

use log::{error, info};
use rocket::fairing::AdHoc;
use std::env;
use std::sync::Arc;

use snake3d_bot::client::{FileTransport, HttpTransport, Transport};
use snake3d_bot::config::Config;
use snake3d_bot::debug_logger::DebugLogger;
use snake3d_bot::frames::FrameStore;
use snake3d_bot::planner::Planner;
use snake3d_bot::runner::Runner;

mod handler;

/// Picks the offline transport when a recorded response is configured
fn build_transport(config: &Config) -> Result<Arc<dyn Transport>, String> {
    if let Some(path) = &config.api.mock_response_path {
        info!("Using recorded responses from {}", path);
        return Ok(Arc::new(FileTransport::new(path)));
    }

    let token = config.api.load_token()?;
    info!("Playing against {}", config.api.move_url());
    Ok(Arc::new(HttpTransport::new(&config.api, &config.timing, token)))
}

#[launch]
fn rocket() -> _ {
    // The frame feed binds to `PORT` when set, like most hosting services expect.
    if let Ok(port) = env::var("PORT") {
        env::set_var("ROCKET_PORT", &port);
    }

    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Snake3D bot...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let transport = match build_transport(&config) {
        Ok(transport) => transport,
        Err(e) => {
            error!("Cannot reach the game server: {}", e);
            std::process::exit(1);
        }
    };

    let frames = Arc::new(FrameStore::new());
    let loop_frames = frames.clone();

    rocket::build()
        .manage(frames)
        .attach(AdHoc::on_liftoff("Tick Loop", move |_| {
            Box::pin(async move {
                let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
                let runner = Runner::new(Arc::new(Planner::new(config)), transport, loop_frames, logger);
                tokio::spawn(async move { runner.run().await });
            })
        }))
        .mount("/", routes![handler::index, handler::frame])
}
