//! Platform abstraction layer
//!
//! Hosts drive the game through [`GameController`](crate::sim::GameController):
//! `update` / `render` every frame, `move_player` / `launch_ball` on input.
//! - Native: the binary in `main.rs`
//! - Web: [`web::WebGame`], exported through wasm-bindgen

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebGame;

/// Install the logger for the current target; safe to call more than once
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Install the logger and panic hook for the browser console
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
