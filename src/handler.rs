// HTTP handler bindings for the render-frame feed
//
// Thin wrappers that read the FrameStore published by the tick loop.
// Handlers never touch the planner.

use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};
use std::sync::Arc;

use snake3d_bot::frames::{FrameStore, RenderFrame};

/// GET / endpoint
/// Returns bot metadata and the last published turn
#[get("/")]
pub fn index(frames: &State<Arc<FrameStore>>) -> Json<Value> {
    Json(json!({
        "name": "snake3d-bot",
        "version": env!("CARGO_PKG_VERSION"),
        "turn": frames.latest_turn(),
    }))
}

/// GET /frame endpoint
/// Latest snapshot plus chosen paths; 404 until the first tick is planned
#[get("/frame")]
pub fn frame(frames: &State<Arc<FrameStore>>) -> Option<Json<RenderFrame>> {
    frames.latest().map(Json)
}
