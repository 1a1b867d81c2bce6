//! Datagrams sent by the driver station. The FMS packet is a fixed eight
//! byte status report; the robot packet is a six byte header followed by
//! at most one tagged payload.

pub mod tags;

use byteorder::{BigEndian, WriteBytesExt};

use crate::config::Mode;
use crate::proto::codec;

use self::tags::Tag;

/// Version byte reported to the FMS.
pub(crate) const FMS_DS_VERSION: u8 = 0x00;
/// Tag opening every robot-bound packet.
pub(crate) const TAG_GENERAL: u8 = 0x01;

bitflags! {
    /// Control byte sent to the robot.
    pub struct Control: u8 {
        const ESTOP = 0x80;
        const FMS_ATTACHED = 0x08;
        const ENABLED = 0x04;

        // Mode flags
        const TELEOP = 0x00;
        const TEST = 0x01;
        const AUTO = 0x02;
    }
}

bitflags! {
    /// Control byte sent to the FMS. Shares the mode bits with the robot
    /// control byte and adds radio/robot link health.
    pub struct FmsControl: u8 {
        const ESTOP = 0x80;
        const ROBOT_COMMS = 0x20;
        const RADIO_PING = 0x10;
        const ROBOT_PING = 0x08;
        const ENABLED = 0x04;

        // Mode flags
        const TELEOP = 0x00;
        const TEST = 0x01;
        const AUTO = 0x02;
    }
}

bitflags! {
    /// Request byte sent to the robot. An empty set signals the
    /// disconnected state.
    pub struct Request: u8 {
        const NORMAL = 0x80;
        const REBOOT = 0x08;
        const RESTART_CODE = 0x04;
    }
}

impl Mode {
    pub(crate) fn to_control(self) -> Control {
        match self {
            Mode::Teleoperated => Control::TELEOP,
            Mode::Autonomous => Control::AUTO,
            Mode::Test => Control::TEST,
        }
    }

    pub(crate) fn to_fms_control(self) -> FmsControl {
        match self {
            Mode::Teleoperated => FmsControl::TELEOP,
            Mode::Autonomous => FmsControl::AUTO,
            Mode::Test => FmsControl::TEST,
        }
    }
}

/// Status packet sent to the field management system every 500ms.
pub struct FmsPacket {
    pub(crate) seqnum: u16,
    pub(crate) control: FmsControl,
    pub(crate) team_number: u16,
    pub(crate) voltage: f32,
}

impl FmsPacket {
    /// Encodes the packet into the eight bytes the FMS expects.
    pub fn encode(&self) -> Vec<u8> {
        let (integer, fraction) = codec::encode_voltage(self.voltage);

        let mut buf = Vec::with_capacity(8);
        buf.write_u16::<BigEndian>(self.seqnum).unwrap();
        buf.push(FMS_DS_VERSION);
        buf.push(self.control.bits());
        buf.write_u16::<BigEndian>(self.team_number).unwrap();
        buf.push(integer);
        buf.push(fraction);

        buf
    }
}

/// Control packet sent to the robot every 20ms.
pub struct RobotPacket {
    pub(crate) seqnum: u16,
    pub(crate) control: Control,
    pub(crate) request: Request,
    pub(crate) station: u8,
    pub(crate) tags: Vec<Box<dyn Tag>>,
}

impl RobotPacket {
    /// Encodes the header and whatever tags ride along this emission.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8);
        buf.write_u16::<BigEndian>(self.seqnum).unwrap();
        buf.push(TAG_GENERAL);
        buf.push(self.control.bits());
        buf.push(self.request.bits());
        buf.push(self.station);

        for tag in &self.tags {
            buf.extend(tag.construct());
        }

        buf
    }
}
