//! Per-frame orchestration that does not touch the GPU.
//!
//! Each iteration runs three phases: input (sample and move the camera),
//! update (view and projection) and render (push uniforms, then the caller
//! draws and presents).

use glam::{Mat4, Vec3};
use log::debug;

use crate::camera::{CameraState, ProjectionCache};
use crate::config::DemoConfig;
use crate::input::{FrameInput, InputSampler, WindowInput};
use crate::lighting::{LightConfig, RenderParams};
use crate::uniforms::UniformSink;

/// Measures the time between consecutive frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_frame: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `now` (seconds since start) and returns the time since the
    /// previous call.
    pub fn advance(&mut self, now: f32) -> f32 {
        let elapsed = now - self.last_frame;
        self.last_frame = now;
        elapsed
    }
}

/// Transforms produced by the update phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_pos: Vec3,
}

/// State owned by the frame loop across iterations.
#[derive(Debug, Clone)]
pub struct FrameContext {
    camera: CameraState,
    sampler: InputSampler,
    projection: ProjectionCache,
    params: RenderParams,
    model: Mat4,
}

impl FrameContext {
    pub fn new(config: &DemoConfig, params: RenderParams) -> Self {
        Self {
            camera: config.initial_camera(),
            sampler: config.input_sampler(),
            projection: ProjectionCache::new(config.camera.projection),
            params,
            model: Mat4::from_scale(Vec3::splat(config.assets.model_scale)),
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut RenderParams {
        &mut self.params
    }

    pub fn light_config(&self) -> LightConfig {
        self.params.light_config()
    }

    /// Pushes the values that stay fixed for the whole run. Call once, before
    /// the first frame.
    pub fn configure(&self, sink: &mut impl UniformSink) {
        let config = self.light_config();
        debug!(
            "configuring shader for {} point and {} spot lights",
            config.point_lights, config.spot_lights
        );
        self.params.configure(sink);
    }

    /// Input phase: samples the window and moves the camera. A held quit key
    /// turns into a close request.
    pub fn process_input(&mut self, window: &mut impl WindowInput, elapsed: f32) -> FrameInput {
        let input = self.sampler.sample(window, elapsed);
        if input.quit {
            window.request_close();
        }
        self.camera.update(&input);
        input
    }

    /// Update phase: view from the camera, projection reused unless the
    /// viewport changed size.
    pub fn matrices(&mut self, viewport: (u32, u32)) -> FrameMatrices {
        FrameMatrices {
            model: self.model,
            view: self.camera.view_matrix(),
            projection: self.projection.get(viewport.0, viewport.1),
            view_pos: self.camera.position(),
        }
    }

    /// Render phase, CPU half: every per-frame uniform.
    pub fn push_uniforms(&self, matrices: &FrameMatrices, sink: &mut impl UniformSink) {
        sink.set_mat4("model", matrices.model);
        sink.set_mat4("view", matrices.view);
        sink.set_mat4("projection", matrices.projection);
        sink.set_vec3("view_pos", matrices.view_pos);
        self.params.apply(sink);
    }

    /// Runs the input and update phases and stages the frame's uniforms.
    /// Returns `None` once a close has been requested.
    pub fn step(
        &mut self,
        window: &mut impl WindowInput,
        elapsed: f32,
        viewport: (u32, u32),
        sink: &mut impl UniformSink,
    ) -> Option<FrameMatrices> {
        self.process_input(window, elapsed);
        if window.close_requested() {
            return None;
        }
        let matrices = self.matrices(viewport);
        self.push_uniforms(&matrices, sink);
        Some(matrices)
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::input::{KeyCode, NamedKey, WindowState};
    use crate::uniforms::FrameUniform;

    #[test]
    fn clock_reports_time_between_frames() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(0.5), 0.5);
        assert_eq!(clock.advance(0.75), 0.25);
        assert_eq!(clock.advance(0.75), 0.0);
    }

    #[test]
    fn quit_key_requests_close_and_stops_the_frame() {
        let mut frame = FrameContext::new(&DemoConfig::default(), RenderParams::demo());
        let mut window = WindowState::new();
        let mut block = FrameUniform::default();
        assert!(frame.step(&mut window, 0.016, (1280, 720), &mut block).is_some());

        window.set_key_down(KeyCode::Named(NamedKey::Escape));
        assert!(frame.step(&mut window, 0.016, (1280, 720), &mut block).is_none());
        assert!(window.close_requested());
    }

    #[test]
    fn external_close_stops_the_frame() {
        let mut frame = FrameContext::new(&DemoConfig::default(), RenderParams::demo());
        let mut window = WindowState::new();
        window.request_close();
        let mut block = FrameUniform::default();
        assert!(frame.step(&mut window, 0.016, (1280, 720), &mut block).is_none());
    }

    #[test]
    fn light_edits_reach_the_next_frame() {
        let mut frame = FrameContext::new(&DemoConfig::default(), RenderParams::demo());
        let mut window = WindowState::new();
        let mut block = FrameUniform::default();
        frame.step(&mut window, 0.016, (1280, 720), &mut block).unwrap();
        assert_eq!(block.point_lights[0].position[..3], [0.7, 0.2, 2.0]);

        frame.params_mut().point_lights_mut()[0].position = Vec3::new(-2.0, 1.0, 0.5);
        frame.step(&mut window, 0.016, (1280, 720), &mut block).unwrap();
        assert_eq!(block.point_lights[0].position[..3], [-2.0, 1.0, 0.5]);
        assert_eq!(frame.light_config(), frame.params().light_config());
    }

    #[test]
    fn step_stages_camera_and_lights() {
        let config = DemoConfig::default();
        let mut frame = FrameContext::new(&config, RenderParams::demo());
        let mut window = WindowState::with_cursor(DVec2::new(640.0, 360.0));
        let mut block = FrameUniform::default();
        frame.configure(&mut block);

        window.set_key_down(KeyCode::Character('W'));
        let matrices = frame
            .step(&mut window, 1.0, (1280, 720), &mut block)
            .unwrap();

        assert!((matrices.view_pos - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
        assert_eq!(block.view_pos[..3], [matrices.view_pos.x, matrices.view_pos.y, matrices.view_pos.z]);
        assert_eq!(block.view, matrices.view.to_cols_array_2d());
        assert_eq!(block.model[0][0], config.assets.model_scale);
        assert_eq!(block.point_light_count(), 1);
        assert_eq!(block.spot_light_count(), 0);
        assert_eq!(block.shininess(), 32.0);
    }
}
