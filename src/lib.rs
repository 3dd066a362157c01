// Library exports for the Snake3D bot
// The server binary, the replay tool and the integration tests all use these modules

pub mod client;
pub mod config;
pub mod debug_logger;
pub mod fallback;
pub mod frames;
pub mod grid;
pub mod planner;
pub mod replay;
pub mod runner;
pub mod scheduler;
pub mod search;
pub mod target;
pub mod types;
