//! Brick Physics entry point
//!
//! Natively this runs a headless session: an autopilot paddle tracks the
//! ball for a fixed number of frames, then the final state is printed as
//! JSON. The web build is driven from JS through `platform::web::WebGame`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::Cell;
    use std::rc::Rc;

    use brick_physics::renderer::DrawRecorder;
    use brick_physics::{GameConfig, GameController, GamePhase};
    use glam::Mat4;

    /// Two minutes at 60 fps
    const FRAMES: u32 = 60 * 120;

    brick_physics::platform::init_logging();
    log::info!("Brick Physics (native) starting...");

    let config = GameConfig {
        launch_jitter: 1.5,
        ..Default::default()
    };
    let frame_dt = config.fixed_dt;
    let transform = Mat4::orthographic_rh(
        config.field_min.x,
        config.field_max.x,
        config.field_min.y,
        config.field_max.y,
        -1.0,
        1.0,
    );

    let mut game = match GameController::new(config) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Level load failed: {}", e);
            std::process::exit(1);
        }
    };

    let contacts = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&contacts);
    game.register_contact_listener(move |_| counter.set(counter.get() + 1));

    let mut recorder = DrawRecorder::new();
    let mut vertices_drawn = 0usize;

    for frame in 0..FRAMES {
        if game.phase() == GamePhase::Idle {
            game.launch_ball();
        }
        if let Some(ball) = game.ball_position() {
            game.move_player(ball.x);
        }

        if let Err(e) = game.update(frame_dt) {
            log::error!("Frame {} failed: {}", frame, e);
            break;
        }

        recorder.clear();
        game.render(&transform, &mut recorder);
        vertices_drawn += recorder.vertices().len();
    }

    log::info!(
        "{} contacts, {} vertices submitted over {} frames",
        contacts.get(),
        vertices_drawn,
        FRAMES
    );

    match serde_json::to_string_pretty(&game.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialize snapshot: {}", e),
    }

    game.destroy();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::WebGame, this is just to satisfy the compiler
}
