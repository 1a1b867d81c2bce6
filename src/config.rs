use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};

/// Represents the current mode that the robot is in. The `Mode` of the robot
/// is considered separately from whether it is enabled or not.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Autonomous,
    Teleoperated,
    Test,
}

impl Mode {
    fn from_u8(value: u8) -> Mode {
        match value {
            1 => Mode::Autonomous,
            2 => Mode::Test,
            _ => Mode::Teleoperated,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Mode::Teleoperated => 0,
            Mode::Autonomous => 1,
            Mode::Test => 2,
        }
    }
}

/// Alliance colour of the driver station.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Alliance {
    Red,
    Blue,
}

impl Alliance {
    fn from_u8(value: u8) -> Alliance {
        match value {
            1 => Alliance::Blue,
            _ => Alliance::Red,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Alliance::Red => 0,
            Alliance::Blue => 1,
        }
    }
}

/// Starting position within the alliance.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Position {
    P1,
    P2,
    P3,
}

impl Position {
    fn from_u8(value: u8) -> Position {
        match value {
            1 => Position::P2,
            2 => Position::P3,
            _ => Position::P1,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Position::P1 => 0,
            Position::P2 => 1,
            Position::P3 => 2,
        }
    }
}

/// Live state of the driver station, shared between the packet builders,
/// the packet parsers and the host application.
///
/// Every field is an independent atomic scalar, so getters may be called
/// concurrently with packet emission on a scheduler thread. There are no
/// cross-field transactions; a packet may observe a fresh alliance next to
/// a stale position, and the next packet will be consistent.
pub struct DsConfig {
    team_number: AtomicU16,
    alliance: AtomicU8,
    position: AtomicU8,
    mode: AtomicU8,
    enabled: AtomicBool,
    estopped: AtomicBool,
    robot_code: AtomicBool,
    fms_comms: AtomicBool,
    radio_comms: AtomicBool,
    robot_comms: AtomicBool,
    voltage: AtomicU32,
    cpu_usage: AtomicU8,
    ram_usage: AtomicU8,
    disk_usage: AtomicU8,
    can_utilization: AtomicU8,
}

impl DsConfig {
    /// Creates the state for the given team number. Everything starts
    /// disabled, teleoperated and disconnected.
    pub fn new(team_number: u16) -> DsConfig {
        DsConfig {
            team_number: AtomicU16::new(team_number),
            alliance: AtomicU8::new(Alliance::Red.as_u8()),
            position: AtomicU8::new(Position::P1.as_u8()),
            mode: AtomicU8::new(Mode::Teleoperated.as_u8()),
            enabled: AtomicBool::new(false),
            estopped: AtomicBool::new(false),
            robot_code: AtomicBool::new(false),
            fms_comms: AtomicBool::new(false),
            radio_comms: AtomicBool::new(false),
            robot_comms: AtomicBool::new(false),
            voltage: AtomicU32::new(0f32.to_bits()),
            cpu_usage: AtomicU8::new(0),
            ram_usage: AtomicU8::new(0),
            disk_usage: AtomicU8::new(0),
            can_utilization: AtomicU8::new(0),
        }
    }

    pub fn team_number(&self) -> u16 {
        self.team_number.load(Ordering::SeqCst)
    }

    pub fn set_team_number(&self, team_number: u16) {
        self.team_number.store(team_number, Ordering::SeqCst);
    }

    pub fn alliance(&self) -> Alliance {
        Alliance::from_u8(self.alliance.load(Ordering::SeqCst))
    }

    pub fn set_alliance(&self, alliance: Alliance) {
        self.alliance.store(alliance.as_u8(), Ordering::SeqCst);
    }

    pub fn position(&self) -> Position {
        Position::from_u8(self.position.load(Ordering::SeqCst))
    }

    pub fn set_position(&self, position: Position) {
        self.position.store(position.as_u8(), Ordering::SeqCst);
    }

    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::SeqCst))
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode.as_u8(), Ordering::SeqCst);
    }

    /// Returns whether robot outputs are enabled.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn estopped(&self) -> bool {
        self.estopped.load(Ordering::SeqCst)
    }

    pub fn set_estopped(&self, estopped: bool) {
        self.estopped.store(estopped, Ordering::SeqCst);
    }

    /// Returns whether the robot reported having user code loaded.
    pub fn robot_code(&self) -> bool {
        self.robot_code.load(Ordering::SeqCst)
    }

    pub fn set_robot_code(&self, robot_code: bool) {
        self.robot_code.store(robot_code, Ordering::SeqCst);
    }

    pub fn fms_communications(&self) -> bool {
        self.fms_comms.load(Ordering::SeqCst)
    }

    pub fn set_fms_communications(&self, connected: bool) {
        self.fms_comms.store(connected, Ordering::SeqCst);
    }

    pub fn radio_communications(&self) -> bool {
        self.radio_comms.load(Ordering::SeqCst)
    }

    pub fn set_radio_communications(&self, connected: bool) {
        self.radio_comms.store(connected, Ordering::SeqCst);
    }

    pub fn robot_communications(&self) -> bool {
        self.robot_comms.load(Ordering::SeqCst)
    }

    pub fn set_robot_communications(&self, connected: bool) {
        self.robot_comms.store(connected, Ordering::SeqCst);
    }

    /// Last battery voltage reported by the robot.
    pub fn robot_voltage(&self) -> f32 {
        f32::from_bits(self.voltage.load(Ordering::SeqCst))
    }

    pub fn set_robot_voltage(&self, voltage: f32) {
        self.voltage.store(voltage.to_bits(), Ordering::SeqCst);
    }

    pub fn cpu_usage(&self) -> u8 {
        self.cpu_usage.load(Ordering::SeqCst)
    }

    pub fn set_cpu_usage(&self, usage: u8) {
        self.cpu_usage.store(usage, Ordering::SeqCst);
    }

    pub fn ram_usage(&self) -> u8 {
        self.ram_usage.load(Ordering::SeqCst)
    }

    pub fn set_ram_usage(&self, usage: u8) {
        self.ram_usage.store(usage, Ordering::SeqCst);
    }

    pub fn disk_usage(&self) -> u8 {
        self.disk_usage.load(Ordering::SeqCst)
    }

    pub fn set_disk_usage(&self, usage: u8) {
        self.disk_usage.store(usage, Ordering::SeqCst);
    }

    pub fn can_utilization(&self) -> u8 {
        self.can_utilization.load(Ordering::SeqCst)
    }

    pub fn set_can_utilization(&self, utilization: u8) {
        self.can_utilization.store(utilization, Ordering::SeqCst);
    }
}

impl Default for DsConfig {
    fn default() -> DsConfig {
        DsConfig::new(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn initial_state_is_disconnected() {
        let config = DsConfig::new(4499);

        assert_eq!(config.team_number(), 4499);
        assert_eq!(config.mode(), Mode::Teleoperated);
        assert_eq!(config.alliance(), Alliance::Red);
        assert_eq!(config.position(), Position::P1);
        assert!(!config.enabled());
        assert!(!config.estopped());
        assert!(!config.robot_communications());
        assert!(!config.robot_code());
        assert_eq!(config.robot_voltage(), 0.0);
    }

    #[test]
    fn fields_round_trip() {
        let config = DsConfig::default();

        config.set_mode(Mode::Autonomous);
        config.set_alliance(Alliance::Blue);
        config.set_position(Position::P3);
        config.set_enabled(true);
        config.set_robot_voltage(12.34);
        config.set_cpu_usage(87);

        assert_eq!(config.mode(), Mode::Autonomous);
        assert_eq!(config.alliance(), Alliance::Blue);
        assert_eq!(config.position(), Position::P3);
        assert!(config.enabled());
        assert_eq!(config.robot_voltage(), 12.34);
        assert_eq!(config.cpu_usage(), 87);
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let config = Arc::new(DsConfig::new(0));
        let writer = config.clone();

        let handle = thread::spawn(move || {
            for _ in 0..1000 {
                writer.set_enabled(true);
                writer.set_robot_voltage(11.5);
            }
        });

        for _ in 0..1000 {
            let _ = config.enabled();
            let _ = config.robot_voltage();
        }

        handle.join().unwrap();
        assert!(config.enabled());
        assert_eq!(config.robot_voltage(), 11.5);
    }
}
