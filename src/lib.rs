#[macro_use]
extern crate bitflags;

pub mod config;
pub mod joysticks;
pub mod proto;
pub(crate) mod ext;
pub(crate) mod util;

pub use self::config::{Alliance, DsConfig, Mode, Position};
pub use self::joysticks::{JoystickSource, JoystickState, Joysticks};
pub use self::proto::{Descriptor, Protocol2015, SocketSpec};

pub type Result<T> = std::result::Result<T, failure::Error>;
