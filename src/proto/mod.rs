//! The 2015 FRC communication protocol. Packet layouts live in
//! [`outbound`] and [`inbound`]; this module binds them to the live
//! driver station state, the peer addresses, and the send-side counters
//! and request latches.

pub mod codec;
pub mod inbound;
pub mod outbound;

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use failure::bail;
use log::{debug, trace};

use crate::config::DsConfig;
use crate::joysticks::JoystickSource;
use crate::util::ip_from_team_number;
use crate::Result;

use self::inbound::{FmsUpdate, RobotResponse, Status, Telemetry};
use self::outbound::tags::{DateTime, JoystickTag, Tag, Timezone};
use self::outbound::{Control, FmsControl, FmsPacket, Request, RobotPacket};

/// Timezone label reported with wall-clock data. Clock fields are encoded
/// in UTC to match.
const TIMEZONE: &str = "UTC";

/// UDP endpoint pair used to reach one peer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SocketSpec {
    pub input_port: u16,
    pub output_port: u16,
    pub disabled: bool,
}

impl SocketSpec {
    fn new(input_port: u16, output_port: u16) -> SocketSpec {
        SocketSpec {
            input_port,
            output_port,
            disabled: false,
        }
    }

    fn disabled() -> SocketSpec {
        SocketSpec {
            input_port: 0,
            output_port: 0,
            disabled: true,
        }
    }
}

/// Static properties of the 2015 control system: emission cadences,
/// joystick capabilities and socket endpoints. The host's scheduler and
/// socket layers read these; the protocol itself never opens a socket.
#[derive(Debug, Copy, Clone)]
pub struct Descriptor {
    /// Cadence of FMS-bound packets.
    pub fms_interval: Duration,
    /// The 2015 protocol never talks to the radio; the cadence is zero
    /// and the socket is disabled.
    pub radio_interval: Duration,
    /// Cadence of robot-bound packets.
    pub robot_interval: Duration,
    pub max_joysticks: usize,
    pub max_axis_count: usize,
    pub max_hat_count: usize,
    pub max_button_count: usize,
    pub fms_socket: SocketSpec,
    pub radio_socket: SocketSpec,
    pub robot_socket: SocketSpec,
    pub netconsole_socket: SocketSpec,
}

impl Default for Descriptor {
    fn default() -> Descriptor {
        Descriptor {
            fms_interval: Duration::from_millis(500),
            radio_interval: Duration::from_millis(0),
            robot_interval: Duration::from_millis(20),
            max_joysticks: crate::joysticks::MAX_JOYSTICKS,
            max_axis_count: crate::joysticks::MAX_AXES,
            max_hat_count: crate::joysticks::MAX_HATS,
            max_button_count: crate::joysticks::MAX_BUTTONS,
            fms_socket: SocketSpec::new(1120, 1160),
            radio_socket: SocketSpec::disabled(),
            robot_socket: SocketSpec::new(1150, 1110),
            netconsole_socket: SocketSpec::new(6666, 6668),
        }
    }
}

/// Send-side state: per-peer packet counters and the one-shot request
/// latches. Counters are written only on the builder thread; the time
/// latch by the parser thread; reboot/restart by host command handlers.
/// The robot watchdog hook clears all three latches.
#[derive(Default)]
struct Runtime {
    sent_fms_packets: AtomicU16,
    sent_robot_packets: AtomicU16,
    reboot: AtomicBool,
    restart_code: AtomicBool,
    send_time_data: AtomicBool,
}

/// The 2015 FRC communication protocol engine.
///
/// The host invokes the three builders from its scheduler at the cadences
/// in the [`Descriptor`], hands inbound datagrams to the matching parser,
/// and calls a reset hook whenever a peer's watchdog expires. All state
/// flows through the shared [`DsConfig`].
pub struct Protocol2015 {
    config: Arc<DsConfig>,
    joysticks: Arc<dyn JoystickSource + Send + Sync>,
    descriptor: Descriptor,
    runtime: Runtime,
}

impl Protocol2015 {
    pub fn new(
        config: Arc<DsConfig>,
        joysticks: Arc<dyn JoystickSource + Send + Sync>,
    ) -> Protocol2015 {
        Protocol2015 {
            config,
            joysticks,
            descriptor: Descriptor::default(),
            runtime: Runtime::default(),
        }
    }

    pub fn config(&self) -> &DsConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The FMS address is not derived from the team number; the socket
    /// layer fills it in from the source of the first FMS packet.
    pub fn fms_address(&self) -> String {
        String::new()
    }

    /// The 2015 control system assigns the radio address at `10.TE.AM.1`.
    pub fn radio_address(&self) -> String {
        ip_from_team_number(self.config.team_number(), 1)
    }

    /// The 2015 control system publishes the robot over mDNS.
    pub fn robot_address(&self) -> String {
        format!("roboRIO-{}.local", self.config.team_number())
    }

    /// Builds the periodic FMS status packet and advances the FMS packet
    /// counter.
    pub fn build_fms_packet(&self) -> Vec<u8> {
        let packet = FmsPacket {
            seqnum: self.runtime.sent_fms_packets.load(Ordering::SeqCst),
            control: self.fms_control_code(),
            team_number: self.config.team_number(),
            voltage: self.config.robot_voltage(),
        };

        let buf = packet.encode();
        self.runtime.sent_fms_packets.fetch_add(1, Ordering::SeqCst);

        buf
    }

    /// Builds the periodic robot control packet and advances the robot
    /// packet counter.
    ///
    /// The header carries at most one payload: wall-clock data when the
    /// robot has asked for it, joystick values once the link has settled
    /// (the first six emissions stay header-only), and nothing otherwise.
    pub fn build_robot_packet(&self) -> Vec<u8> {
        let seqnum = self.runtime.sent_robot_packets.load(Ordering::SeqCst);

        let mut tags: Vec<Box<dyn Tag>> = Vec::new();
        if self.runtime.send_time_data.load(Ordering::SeqCst) {
            tags.push(Box::new(DateTime::now()));
            tags.push(Box::new(Timezone::new(TIMEZONE)));
        } else if seqnum > 5 {
            for tag in self.joystick_tags() {
                tags.push(Box::new(tag));
            }
        }

        let packet = RobotPacket {
            seqnum,
            control: self.control_code(),
            request: self.request_code(),
            station: codec::station_byte(self.config.alliance(), self.config.position()),
            tags,
        };

        let buf = packet.encode();
        self.runtime
            .sent_robot_packets
            .fetch_add(1, Ordering::SeqCst);

        buf
    }

    /// The 2015 protocol sends nothing to the radio.
    pub fn build_radio_packet(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Applies a match-control packet from the FMS: enable state, mode,
    /// alliance and position.
    pub fn parse_fms_packet(&self, data: &[u8]) -> Result<()> {
        let update = FmsUpdate::decode(&mut &data[..])?;
        trace!(
            "fms update: control {:#04x}, station {}",
            update.control.bits(),
            update.station
        );

        self.config.set_enabled(update.enabled());
        self.config.set_mode(update.mode());
        self.config.set_alliance(codec::alliance_of(update.station));
        self.config.set_position(codec::position_of(update.station));

        Ok(())
    }

    /// Applies a robot status packet: code state, e-stop echo, battery
    /// voltage, the wall-clock request, and any extended telemetry.
    pub fn parse_robot_packet(&self, data: &[u8]) -> Result<()> {
        let response = RobotResponse::decode(&mut &data[..])?;
        trace!(
            "robot status: control {:#04x}, battery {:.2}V",
            response.control.bits(),
            response.battery
        );

        self.config
            .set_robot_code(response.status.contains(Status::ROBOT_CODE));
        self.config
            .set_estopped(response.control.contains(Control::ESTOP));
        self.config.set_robot_voltage(response.battery);

        self.runtime
            .send_time_data
            .store(response.request_time, Ordering::SeqCst);

        match response.telemetry {
            Some(Telemetry::CanUtilization(value)) => self.config.set_can_utilization(value),
            Some(Telemetry::CpuUsage(value)) => self.config.set_cpu_usage(value),
            Some(Telemetry::RamUsage(value)) => self.config.set_ram_usage(value),
            Some(Telemetry::DiskUsage(value)) => self.config.set_disk_usage(value),
            None => {}
        }

        Ok(())
    }

    /// The 2015 control system never sends DS-bound radio traffic;
    /// anything arriving here is discarded without feeding the watchdog.
    pub fn parse_radio_packet(&self, _data: &[u8]) -> Result<()> {
        bail!("the 2015 protocol carries no radio packets")
    }

    /// FMS watchdog hook; nothing to clear.
    pub fn reset_fms(&self) {}

    /// Radio watchdog hook; nothing to clear.
    pub fn reset_radio(&self) {}

    /// Robot watchdog hook: clears the reboot, restart-code and
    /// wall-clock latches so the next packet reflects a fresh link.
    pub fn reset_robot(&self) {
        debug!("robot watchdog expired, clearing request latches");

        self.runtime.reboot.store(false, Ordering::SeqCst);
        self.runtime.restart_code.store(false, Ordering::SeqCst);
        self.runtime.send_time_data.store(false, Ordering::SeqCst);
    }

    /// Instructs the roboRIO to reboot with the next packet.
    pub fn reboot_robot(&self) {
        debug!("requesting roboRIO reboot");

        self.runtime.reboot.store(true, Ordering::SeqCst);
    }

    /// Instructs the roboRIO to restart the robot code process with the
    /// next packet.
    pub fn restart_robot_code(&self) {
        debug!("requesting robot code restart");

        self.runtime.restart_code.store(true, Ordering::SeqCst);
    }

    fn joystick_tags(&self) -> Vec<JoystickTag> {
        let count = self.joysticks.count().min(self.descriptor.max_joysticks);

        (0..count)
            .map(|stick| {
                let axes = (0..self
                    .joysticks
                    .num_axes(stick)
                    .min(self.descriptor.max_axis_count))
                    .map(|axis| self.joysticks.axis(stick, axis))
                    .collect();

                let buttons = (0..self
                    .joysticks
                    .num_buttons(stick)
                    .min(self.descriptor.max_button_count))
                    .map(|button| self.joysticks.button(stick, button))
                    .collect();

                let hats = (0..self
                    .joysticks
                    .num_hats(stick)
                    .min(self.descriptor.max_hat_count))
                    .map(|hat| self.joysticks.hat(stick, hat))
                    .collect();

                JoystickTag::new(axes, buttons, hats)
            })
            .collect()
    }

    fn control_code(&self) -> Control {
        let mut control = self.config.mode().to_control();

        if self.config.fms_communications() {
            control |= Control::FMS_ATTACHED;
        }

        if self.config.estopped() {
            control |= Control::ESTOP;
        }

        if self.config.enabled() {
            control |= Control::ENABLED;
        }

        control
    }

    fn fms_control_code(&self) -> FmsControl {
        let mut control = self.config.mode().to_fms_control();

        if self.config.estopped() {
            control |= FmsControl::ESTOP;
        }

        if self.config.enabled() {
            control |= FmsControl::ENABLED;
        }

        if self.config.radio_communications() {
            control |= FmsControl::RADIO_PING;
        }

        if self.config.robot_communications() {
            control |= FmsControl::ROBOT_COMMS | FmsControl::ROBOT_PING;
        }

        control
    }

    fn request_code(&self) -> Request {
        if !self.config.robot_communications() {
            return Request::empty();
        }

        if self.runtime.reboot.load(Ordering::SeqCst) {
            Request::REBOOT
        } else if self.runtime.restart_code.load(Ordering::SeqCst) {
            Request::RESTART_CODE
        } else {
            Request::NORMAL
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{Alliance, Mode, Position};
    use crate::joysticks::{JoystickState, Joysticks};

    fn protocol() -> Protocol2015 {
        Protocol2015::new(Arc::new(DsConfig::default()), Arc::new(Joysticks::new()))
    }

    fn protocol_with_joysticks(joysticks: Arc<Joysticks>) -> Protocol2015 {
        Protocol2015::new(Arc::new(DsConfig::default()), joysticks)
    }

    #[test]
    fn idle_fms_packet_is_all_zeroes() {
        let protocol = protocol();

        let buf = protocol.build_fms_packet();
        assert_eq!(buf, &[0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn fms_packet_reflects_the_match_state() {
        let protocol = protocol();
        protocol.config().set_team_number(4499);
        protocol.config().set_mode(Mode::Autonomous);
        protocol.config().set_enabled(true);
        protocol.config().set_fms_communications(true);
        protocol.config().set_radio_communications(true);
        protocol.config().set_robot_communications(true);
        protocol.config().set_robot_voltage(12.5);

        let buf = protocol.build_fms_packet();
        assert_eq!(buf, &[0x00, 0x00, 0x00, 0x3e, 0x11, 0x93, 0x0c, 0x80]);
    }

    #[test]
    fn fms_counter_advances_per_emission() {
        let protocol = protocol();

        for expected in 0u16..4 {
            let buf = protocol.build_fms_packet();
            assert_eq!(u16::from_be_bytes([buf[0], buf[1]]), expected);
            assert_eq!(buf.len(), 8);
        }
    }

    #[test]
    fn fms_counter_wraps() {
        let protocol = protocol();
        protocol
            .runtime
            .sent_fms_packets
            .store(0xffff, Ordering::SeqCst);

        let buf = protocol.build_fms_packet();
        assert_eq!(&buf[0..2], &[0xff, 0xff]);

        let buf = protocol.build_fms_packet();
        assert_eq!(&buf[0..2], &[0x00, 0x00]);
    }

    #[test]
    fn robot_header_matches_the_station_state() {
        let protocol = protocol();
        protocol.config().set_enabled(true);
        protocol.config().set_fms_communications(true);
        protocol.config().set_robot_communications(true);
        protocol.config().set_alliance(Alliance::Red);
        protocol.config().set_position(Position::P2);
        protocol
            .runtime
            .sent_robot_packets
            .store(7, Ordering::SeqCst);

        let buf = protocol.build_robot_packet();
        assert_eq!(&buf[0..6], &[0x00, 0x07, 0x01, 0x0c, 0x80, 0x01]);
    }

    #[test]
    fn robot_packets_always_open_with_the_general_tag() {
        let protocol = protocol();

        for _ in 0..10 {
            let buf = protocol.build_robot_packet();
            assert_eq!(buf[2], 0x01);
            assert!(buf[5] <= 5);
        }
    }

    #[test]
    fn first_six_robot_packets_are_header_only() {
        let joysticks = Arc::new(Joysticks::new());
        joysticks.attach(JoystickState::new(6, 10, 1));
        let protocol = protocol_with_joysticks(joysticks);

        for _ in 0..6 {
            assert_eq!(protocol.build_robot_packet().len(), 6);
        }

        // Seventh emission carries the joystick block: 6 + 6 axes + 2 hats
        let buf = protocol.build_robot_packet();
        assert_eq!(buf.len(), 6 + 14);
        assert_eq!(buf[6], 13);
        assert_eq!(buf[7], 0x0c);
    }

    #[test]
    fn joystick_blocks_are_emitted_in_enumeration_order() {
        let joysticks = Arc::new(Joysticks::new());
        joysticks.attach(JoystickState::new(2, 3, 0));
        joysticks.attach(JoystickState::new(4, 10, 1));
        joysticks.set_axis(0, 1, 1.0);
        joysticks.set_button(1, 9, true);

        let protocol = protocol_with_joysticks(joysticks);
        protocol
            .runtime
            .sent_robot_packets
            .store(100, Ordering::SeqCst);

        let buf = protocol.build_robot_packet();

        // First stick: 6 + 2 axes = 8 bytes
        assert_eq!(&buf[6..14], &[7, 0x0c, 0, 127, 3, 0x00, 0x00, 0]);
        // Second stick: 6 + 4 axes + 2 hats = 12 bytes
        assert_eq!(
            &buf[14..26],
            &[11, 0x0c, 0, 0, 0, 0, 10, 0x02, 0x00, 1, 0xff, 0xff]
        );
        assert_eq!(buf.len(), 26);
    }

    #[test]
    fn time_data_takes_priority_over_joysticks() {
        let joysticks = Arc::new(Joysticks::new());
        joysticks.attach(JoystickState::new(6, 10, 1));
        let protocol = protocol_with_joysticks(joysticks);
        protocol
            .runtime
            .sent_robot_packets
            .store(50, Ordering::SeqCst);
        protocol.runtime.send_time_data.store(true, Ordering::SeqCst);

        let buf = protocol.build_robot_packet();

        // Date block then timezone block, no joystick data
        assert_eq!(buf[6], 0x0b);
        assert_eq!(buf[7], 0x0f);
        assert_eq!(buf[16], 3);
        assert_eq!(buf[17], 0x10);
        assert_eq!(&buf[18..21], b"UTC");
        assert_eq!(buf.len(), 21);
    }

    #[test]
    fn request_codes_follow_the_link_and_latches() {
        let protocol = protocol();

        // Link down
        assert_eq!(protocol.build_robot_packet()[4], 0x00);

        protocol.config().set_robot_communications(true);
        assert_eq!(protocol.build_robot_packet()[4], 0x80);

        protocol.reboot_robot();
        assert_eq!(protocol.build_robot_packet()[4], 0x08);

        // Reboot outranks a code restart
        protocol.restart_robot_code();
        assert_eq!(protocol.build_robot_packet()[4], 0x08);

        protocol.reset_robot();
        assert_eq!(protocol.build_robot_packet()[4], 0x80);

        protocol.config().set_robot_communications(false);
        assert_eq!(protocol.build_robot_packet()[4], 0x00);
    }

    #[test]
    fn watchdog_clears_the_time_latch() {
        let protocol = protocol();
        protocol
            .parse_robot_packet(&[0x00, 0x00, 0x01, 0x00, 0x20, 0x0c, 0x00, 0x01])
            .unwrap();
        protocol
            .runtime
            .sent_robot_packets
            .store(50, Ordering::SeqCst);

        assert!(protocol.build_robot_packet().len() > 6);

        protocol.reset_robot();
        assert_eq!(protocol.build_robot_packet().len(), 6);
    }

    #[test]
    fn radio_is_silent_in_both_directions() {
        let protocol = protocol();

        assert!(protocol.build_radio_packet().is_empty());
        assert!(protocol.parse_radio_packet(&[0x00, 0x01, 0x02]).is_err());
        assert!(protocol.descriptor().radio_socket.disabled);
    }

    #[test]
    fn fms_packet_drives_mode_and_station() {
        let protocol = protocol();
        protocol
            .parse_fms_packet(&[0x00, 0x00, 0x00, 0x06, 0x00, 0x04])
            .unwrap();

        assert!(protocol.config().enabled());
        assert_eq!(protocol.config().mode(), Mode::Autonomous);
        assert_eq!(protocol.config().alliance(), Alliance::Blue);
        assert_eq!(protocol.config().position(), Position::P2);
    }

    #[test]
    fn short_fms_packet_leaves_state_alone() {
        let protocol = protocol();
        protocol.config().set_mode(Mode::Test);

        assert!(protocol.parse_fms_packet(&[0x00, 0x00, 0x00, 0x06]).is_err());
        assert_eq!(protocol.config().mode(), Mode::Test);
        assert!(!protocol.config().enabled());
    }

    #[test]
    fn out_of_range_station_falls_back_to_red_1() {
        let protocol = protocol();
        protocol
            .parse_fms_packet(&[0x00, 0x00, 0x00, 0x04, 0x00, 0x2a])
            .unwrap();

        assert_eq!(protocol.config().alliance(), Alliance::Red);
        assert_eq!(protocol.config().position(), Position::P1);
    }

    #[test]
    fn robot_packet_updates_the_config() {
        let protocol = protocol();
        protocol
            .parse_robot_packet(&[0x00, 0x03, 0x01, 0x80, 0x20, 0x0c, 0x40, 0x00])
            .unwrap();

        assert!(protocol.config().robot_code());
        assert!(protocol.config().estopped());
        assert_eq!(protocol.config().robot_voltage(), 12.25);
    }

    #[test]
    fn cpu_telemetry_lands_in_the_config() {
        let protocol = protocol();
        protocol
            .parse_robot_packet(&[
                0x00, 0x00, 0x01, 0x00, 0x00, 0x0c, 0x00, 0x00, // header
                0x04, 0x05, 0x00, 0x57, // extended block
            ])
            .unwrap();

        assert_eq!(protocol.config().cpu_usage(), 0x57);
    }

    #[test]
    fn addresses_derive_from_the_team_number() {
        let protocol = protocol();
        protocol.config().set_team_number(4499);

        assert_eq!(protocol.fms_address(), "");
        assert_eq!(protocol.radio_address(), "10.44.99.1");
        assert_eq!(protocol.robot_address(), "roboRIO-4499.local");
    }

    #[test]
    fn descriptor_matches_the_2015_control_system() {
        let protocol = protocol();
        let descriptor = protocol.descriptor();

        assert_eq!(descriptor.fms_interval, Duration::from_millis(500));
        assert_eq!(descriptor.robot_interval, Duration::from_millis(20));
        assert_eq!(descriptor.radio_interval, Duration::from_millis(0));
        assert_eq!(descriptor.max_joysticks, 6);
        assert_eq!(descriptor.max_axis_count, 6);
        assert_eq!(descriptor.max_hat_count, 1);
        assert_eq!(descriptor.max_button_count, 10);

        assert_eq!(descriptor.fms_socket, SocketSpec::new(1120, 1160));
        assert_eq!(descriptor.robot_socket, SocketSpec::new(1150, 1110));
        assert_eq!(descriptor.netconsole_socket, SocketSpec::new(6666, 6668));
    }
}
