//! Datagrams received by the driver station: match control from the FMS
//! and the status report the robot sends back every ~20ms.

use bytes::Buf;

use crate::config::Mode;
use crate::ext::BufExt;
use crate::proto::codec;
use crate::proto::outbound::{Control, FmsControl};
use crate::Result;

/// Request byte the robot sends when it wants wall-clock data.
pub(crate) const REQUEST_TIME: u8 = 0x01;

// Extended telemetry tags
pub(crate) const TAG_CAN_INFO: u8 = 0x0e;
pub(crate) const TAG_CPU_INFO: u8 = 0x05;
pub(crate) const TAG_RAM_INFO: u8 = 0x06;
pub(crate) const TAG_DISK_INFO: u8 = 0x04;

bitflags! {
    /// Status byte reported by the robot.
    pub struct Status: u8 {
        const ROBOT_CODE = 0x20;
    }
}

/// Match-control packet received from the FMS. While attached to a field,
/// the FMS drives mode, enable and station assignment.
#[derive(Debug)]
pub struct FmsUpdate {
    pub seqnum: u16,
    pub control: FmsControl,
    pub station: u8,
}

impl FmsUpdate {
    /// Attempts to decode an FMS packet; fails when fewer than six bytes
    /// arrived.
    pub fn decode(buf: &mut impl Buf) -> Result<FmsUpdate> {
        let seqnum = buf.read_u16_be()?;

        buf.read_u8()?; // comm version
        let control = FmsControl::from_bits_truncate(buf.read_u8()?);
        buf.read_u8()?; // request byte, unused
        let station = buf.read_u8()?;

        Ok(FmsUpdate {
            seqnum,
            control,
            station,
        })
    }

    pub fn enabled(&self) -> bool {
        self.control.contains(FmsControl::ENABLED)
    }

    /// Mode commanded by the FMS. Teleoperated has no bit of its own, so
    /// a control byte with neither mode bit set reads as teleop.
    pub fn mode(&self) -> Mode {
        if self.control.contains(FmsControl::AUTO) {
            Mode::Autonomous
        } else if self.control.contains(FmsControl::TEST) {
            Mode::Test
        } else {
            Mode::Teleoperated
        }
    }
}

/// One extended telemetry block trailing the robot status header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Telemetry {
    CanUtilization(u8),
    CpuUsage(u8),
    RamUsage(u8),
    DiskUsage(u8),
}

impl Telemetry {
    /// Reads the single extended block the robot appends. `ext` starts at
    /// the block's length byte; the value sits at a fixed offset per tag.
    /// Unknown tags and truncated blocks yield `None`.
    fn read(ext: &[u8]) -> Option<Telemetry> {
        let tag = *ext.get(1)?;

        match tag {
            TAG_CAN_INFO => ext.get(10).map(|value| Telemetry::CanUtilization(*value)),
            TAG_CPU_INFO => ext.get(3).map(|value| Telemetry::CpuUsage(*value)),
            TAG_RAM_INFO => ext.get(4).map(|value| Telemetry::RamUsage(*value)),
            TAG_DISK_INFO => ext.get(4).map(|value| Telemetry::DiskUsage(*value)),
            _ => None,
        }
    }
}

/// Status packet received from the robot in reply to control packets.
#[derive(Debug)]
pub struct RobotResponse {
    pub seqnum: u16,
    pub control: Control,
    pub status: Status,
    pub battery: f32,
    pub request_time: bool,
    pub telemetry: Option<Telemetry>,
}

impl RobotResponse {
    /// Attempts to decode a robot status packet; fails when fewer than
    /// eight bytes arrived. Trailing bytes are interpreted as an extended
    /// telemetry block.
    pub fn decode(buf: &mut impl Buf) -> Result<RobotResponse> {
        let seqnum = buf.read_u16_be()?;

        buf.read_u8()?; // comm version
        let control = Control::from_bits_truncate(buf.read_u8()?);
        let status = Status::from_bits_truncate(buf.read_u8()?);

        let battery = {
            let upper = buf.read_u8()?;
            let lower = buf.read_u8()?;
            codec::decode_voltage(upper, lower)
        };

        let request_time = buf.read_u8()? == REQUEST_TIME;

        let telemetry = if buf.remaining() > 1 {
            Telemetry::read(buf.bytes())
        } else {
            None
        };

        Ok(RobotResponse {
            seqnum,
            control,
            status,
            battery,
            request_time,
            telemetry,
        })
    }
}
