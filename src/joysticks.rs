use std::sync::Mutex;

/// The 2015 control system transports at most 6 joysticks per driver station.
pub const MAX_JOYSTICKS: usize = 6;
/// Axes per joystick accepted by the robot.
pub const MAX_AXES: usize = 6;
/// Buttons per joystick accepted by the robot.
pub const MAX_BUTTONS: usize = 10;
/// Hats (POVs) per joystick accepted by the robot.
pub const MAX_HATS: usize = 1;

/// Enumeration of attached joysticks consumed when building robot-bound
/// packets. Implementations are polled on the scheduler thread at every
/// emission, so all methods must be non-blocking.
///
/// Queries for a joystick, axis, button or hat that does not exist return
/// the neutral value (`0.0`, `false`, `-1`).
pub trait JoystickSource {
    fn count(&self) -> usize;

    fn num_axes(&self, joystick: usize) -> usize;

    fn num_buttons(&self, joystick: usize) -> usize;

    fn num_hats(&self, joystick: usize) -> usize;

    /// Current axis value in `[-1, 1]`.
    fn axis(&self, joystick: usize, axis: usize) -> f32;

    fn button(&self, joystick: usize, button: usize) -> bool;

    /// Current hat angle in degrees, `-1` when not pressed.
    fn hat(&self, joystick: usize, hat: usize) -> i16;
}

/// Snapshot of a single attached joystick: axis values, button states and
/// hat angles.
#[derive(Debug, Clone, PartialEq)]
pub struct JoystickState {
    axes: Vec<f32>,
    buttons: Vec<bool>,
    hats: Vec<i16>,
}

impl JoystickState {
    /// Creates a neutral joystick with the given topology. Hats start at
    /// `-1` (not pressed).
    pub fn new(axes: usize, buttons: usize, hats: usize) -> JoystickState {
        JoystickState {
            axes: vec![0.0; axes],
            buttons: vec![false; buttons],
            hats: vec![-1; hats],
        }
    }

    pub fn axes(&self) -> &[f32] {
        &self.axes
    }

    pub fn buttons(&self) -> &[bool] {
        &self.buttons
    }

    pub fn hats(&self) -> &[i16] {
        &self.hats
    }

    /// Updates one axis; returns `false` if the axis does not exist.
    pub fn set_axis(&mut self, axis: usize, value: f32) -> bool {
        match self.axes.get_mut(axis) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn set_button(&mut self, button: usize, pressed: bool) -> bool {
        match self.buttons.get_mut(button) {
            Some(slot) => {
                *slot = pressed;
                true
            }
            None => false,
        }
    }

    pub fn set_hat(&mut self, hat: usize, angle: i16) -> bool {
        match self.hats.get_mut(hat) {
            Some(slot) => {
                *slot = angle;
                true
            }
            None => false,
        }
    }
}

/// Registry of attached joysticks, shared between the host's input layer
/// and the packet builder thread.
///
/// Joysticks are enumerated in attach order; detaching shifts later sticks
/// down, matching the port renumbering the driver station UI shows.
#[derive(Default)]
pub struct Joysticks {
    sticks: Mutex<Vec<JoystickState>>,
}

impl Joysticks {
    pub fn new() -> Joysticks {
        Joysticks {
            sticks: Mutex::new(Vec::with_capacity(MAX_JOYSTICKS)),
        }
    }

    /// Registers a joystick; returns `false` when the transport limit is
    /// already reached.
    pub fn attach(&self, state: JoystickState) -> bool {
        let mut sticks = self.sticks.lock().unwrap();
        if sticks.len() >= MAX_JOYSTICKS {
            return false;
        }
        sticks.push(state);
        true
    }

    /// Removes the joystick on `port`; returns `false` if it was not
    /// attached.
    pub fn detach(&self, port: usize) -> bool {
        let mut sticks = self.sticks.lock().unwrap();
        if port >= sticks.len() {
            return false;
        }
        sticks.remove(port);
        true
    }

    pub fn set_axis(&self, port: usize, axis: usize, value: f32) -> bool {
        let mut sticks = self.sticks.lock().unwrap();
        match sticks.get_mut(port) {
            Some(stick) => stick.set_axis(axis, value),
            None => false,
        }
    }

    pub fn set_button(&self, port: usize, button: usize, pressed: bool) -> bool {
        let mut sticks = self.sticks.lock().unwrap();
        match sticks.get_mut(port) {
            Some(stick) => stick.set_button(button, pressed),
            None => false,
        }
    }

    pub fn set_hat(&self, port: usize, hat: usize, angle: i16) -> bool {
        let mut sticks = self.sticks.lock().unwrap();
        match sticks.get_mut(port) {
            Some(stick) => stick.set_hat(hat, angle),
            None => false,
        }
    }
}

impl JoystickSource for Joysticks {
    fn count(&self) -> usize {
        self.sticks.lock().unwrap().len()
    }

    fn num_axes(&self, joystick: usize) -> usize {
        self.sticks
            .lock()
            .unwrap()
            .get(joystick)
            .map_or(0, |stick| stick.axes.len())
    }

    fn num_buttons(&self, joystick: usize) -> usize {
        self.sticks
            .lock()
            .unwrap()
            .get(joystick)
            .map_or(0, |stick| stick.buttons.len())
    }

    fn num_hats(&self, joystick: usize) -> usize {
        self.sticks
            .lock()
            .unwrap()
            .get(joystick)
            .map_or(0, |stick| stick.hats.len())
    }

    fn axis(&self, joystick: usize, axis: usize) -> f32 {
        self.sticks
            .lock()
            .unwrap()
            .get(joystick)
            .and_then(|stick| stick.axes.get(axis))
            .copied()
            .unwrap_or(0.0)
    }

    fn button(&self, joystick: usize, button: usize) -> bool {
        self.sticks
            .lock()
            .unwrap()
            .get(joystick)
            .and_then(|stick| stick.buttons.get(button))
            .copied()
            .unwrap_or(false)
    }

    fn hat(&self, joystick: usize, hat: usize) -> i16 {
        self.sticks
            .lock()
            .unwrap()
            .get(joystick)
            .and_then(|stick| stick.hats.get(hat))
            .copied()
            .unwrap_or(-1)
    }
}
