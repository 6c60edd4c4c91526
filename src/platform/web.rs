//! Browser host binding
//!
//! JS owns the canvas and the GL/WebGPU pipeline; it forwards lifecycle
//! calls here and uploads the vertex data `render` returns.

use glam::Mat4;
use wasm_bindgen::prelude::*;

use crate::config::GameConfig;
use crate::renderer::DrawRecorder;
use crate::renderer::shapes::project;
use crate::sim::GameController;

fn js_error(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    controller: GameController,
    recorder: DrawRecorder,
}

#[wasm_bindgen]
impl WebGame {
    /// Load the first level from an optional JSON config
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WebGame, JsError> {
        super::init_logging();

        let controller = match config_json {
            Some(json) => GameController::from_json(&json),
            None => GameController::new(GameConfig::default()),
        }
        .map_err(js_error)?;

        log::info!("Web game ready");
        Ok(Self {
            controller,
            recorder: DrawRecorder::new(),
        })
    }

    pub fn update(&mut self, elapsed: f32) -> Result<(), JsError> {
        self.controller.update(elapsed).map_err(js_error)
    }

    /// Vertices for this frame in clip space, interleaved as x, y, r, g, b, a
    ///
    /// `mvp` is a column-major 4x4 matrix; anything else means identity.
    pub fn render(&mut self, mvp: &[f32]) -> Vec<f32> {
        let transform = if mvp.len() == 16 {
            Mat4::from_cols_slice(mvp)
        } else {
            Mat4::IDENTITY
        };

        self.recorder.clear();
        self.controller.render(&transform, &mut self.recorder);
        let vertices = project(&self.recorder.vertices(), &transform);
        bytemuck::cast_slice(&vertices).to_vec()
    }

    #[wasm_bindgen(js_name = movePlayer)]
    pub fn move_player(&mut self, pos: f32) {
        self.controller.move_player(pos);
    }

    #[wasm_bindgen(js_name = launchBall)]
    pub fn launch_ball(&mut self) {
        self.controller.launch_ball();
    }

    #[wasm_bindgen(js_name = registerHit)]
    pub fn register_hit(&mut self) {
        self.controller.register_hit();
    }

    pub fn destroy(&mut self) {
        self.controller.destroy();
    }

    pub fn phase(&self) -> String {
        self.controller.phase().as_str().to_string()
    }

    /// Controller snapshot as JSON, for the HUD
    pub fn snapshot(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.controller.snapshot()).map_err(js_error)
    }
}
