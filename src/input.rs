use std::collections::HashSet;

use glam::{DVec2, Vec3};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

/// Friendly names for the non-printable keys the viewer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
}

/// Read side of the window: the frame loop polls it once per iteration.
pub trait WindowInput {
    fn is_key_down(&self, key: KeyCode) -> bool;

    /// Current cursor position in window coordinates.
    fn cursor_position(&self) -> DVec2;

    fn close_requested(&self) -> bool;

    fn request_close(&mut self);
}

/// Input buffered from window events between two frames.
///
/// The cursor is a virtual coordinate: raw mouse motion is accumulated onto it
/// so it keeps moving while the real pointer is grabbed at the window center.
#[derive(Debug, Default)]
pub struct WindowState {
    keys: HashSet<KeyCode>,
    cursor: DVec2,
    close_requested: bool,
}

impl WindowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the virtual cursor at a given point, usually the window center.
    pub fn with_cursor(cursor: DVec2) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    /// Drops every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys.clear();
    }

    pub fn add_mouse_motion(&mut self, delta: DVec2) {
        self.cursor += delta;
    }
}

impl WindowInput for WindowState {
    fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    fn cursor_position(&self) -> DVec2 {
        self.cursor
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }
}

/// Keys driving the free-fly camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub strafe_left: KeyCode,
    pub strafe_right: KeyCode,
    pub sprint: KeyCode,
    pub quit: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::Character('W'),
            backward: KeyCode::Character('S'),
            strafe_left: KeyCode::Character('A'),
            strafe_right: KeyCode::Character('D'),
            sprint: KeyCode::Named(NamedKey::LeftShift),
            quit: KeyCode::Named(NamedKey::Escape),
        }
    }
}

/// Directions requested this frame. Any combination may be active at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub forward: bool,
    pub backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
}

impl Movement {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.strafe_left || self.strafe_right)
    }

    /// Sums the contribution of every active direction.
    ///
    /// The sum is not renormalised: forward plus strafe covers more ground
    /// than either alone.
    pub fn displacement(&self, front: Vec3, right: Vec3, speed: f32) -> Vec3 {
        let mut delta = Vec3::ZERO;
        if self.forward {
            delta += speed * front;
        }
        if self.backward {
            delta -= speed * front;
        }
        if self.strafe_left {
            delta -= right * speed;
        }
        if self.strafe_right {
            delta += right * speed;
        }
        delta
    }
}

/// Yaw/pitch change in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookDelta {
    pub yaw: f32,
    pub pitch: f32,
}

/// Everything the camera needs from one input sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub movement: Movement,
    /// Distance covered along each active direction this frame.
    pub speed: f32,
    pub look: LookDelta,
    pub quit: bool,
}

/// Remembers the previous cursor sample so positions turn into offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorTracker {
    last: DVec2,
    initialized: bool,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn last_position(&self) -> DVec2 {
        self.last
    }

    /// Returns `(dx, dy)` with `dy` inverted so moving the mouse up is positive.
    ///
    /// The first call only seeds the tracker and reports no motion.
    pub fn offset(&mut self, position: DVec2) -> (f32, f32) {
        if !self.initialized {
            self.last = position;
            self.initialized = true;
        }
        let dx = (position.x - self.last.x) as f32;
        let dy = (self.last.y - position.y) as f32;
        self.last = position;
        (dx, dy)
    }
}

/// Turns raw key and cursor state into a [`FrameInput`] once per frame.
#[derive(Debug, Clone)]
pub struct InputSampler {
    cursor: CursorTracker,
    bindings: KeyBindings,
    base_speed: f32,
    sprint_multiplier: f32,
    sensitivity: f32,
}

impl InputSampler {
    pub const DEFAULT_BASE_SPEED: f32 = 2.5;
    pub const DEFAULT_SPRINT_MULTIPLIER: f32 = 2.0;
    pub const DEFAULT_SENSITIVITY: f32 = 0.07;

    pub fn new(
        bindings: KeyBindings,
        base_speed: f32,
        sprint_multiplier: f32,
        sensitivity: f32,
    ) -> Self {
        Self {
            cursor: CursorTracker::new(),
            bindings,
            base_speed,
            sprint_multiplier,
            sensitivity,
        }
    }

    pub fn cursor(&self) -> &CursorTracker {
        &self.cursor
    }

    pub fn sample(&mut self, input: &impl WindowInput, elapsed: f32) -> FrameInput {
        let bindings = self.bindings;
        let mut speed = self.base_speed * elapsed;
        if input.is_key_down(bindings.sprint) {
            speed *= self.sprint_multiplier;
        }

        let movement = Movement {
            forward: input.is_key_down(bindings.forward),
            backward: input.is_key_down(bindings.backward),
            strafe_left: input.is_key_down(bindings.strafe_left),
            strafe_right: input.is_key_down(bindings.strafe_right),
        };

        let (dx, dy) = self.cursor.offset(input.cursor_position());
        let look = LookDelta {
            yaw: dx * self.sensitivity,
            pitch: dy * self.sensitivity,
        };

        FrameInput {
            movement,
            speed,
            look,
            quit: input.is_key_down(bindings.quit),
        }
    }
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new(
            KeyBindings::default(),
            Self::DEFAULT_BASE_SPEED,
            Self::DEFAULT_SPRINT_MULTIPLIER,
            Self::DEFAULT_SENSITIVITY,
        )
    }
}
