//! Tagged payloads that can trail the robot packet header: joystick values
//! when the link is established, or wall-clock data when the robot asks
//! for it.

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{Datelike, Timelike, Utc};

use crate::util::button_bits;

pub(crate) const TAG_JOYSTICK: u8 = 0x0c;
pub(crate) const TAG_DATE: u8 = 0x0f;
pub(crate) const TAG_TIMEZONE: u8 = 0x10;

/// An outgoing payload appended after the robot packet header.
pub trait Tag: Send {
    fn id(&self) -> u8;

    fn data(&self) -> Vec<u8>;

    /// Tags are length-prefixed; the prefix counts the tag id plus the
    /// data bytes.
    fn construct(&self) -> Vec<u8> {
        let mut buf = vec![self.id()];
        buf.extend(self.data());

        buf.insert(0, buf.len() as u8);

        buf
    }
}

/// Axis, button and hat values for one attached joystick.
pub struct JoystickTag {
    axes: Vec<f32>,
    buttons: Vec<bool>,
    hats: Vec<i16>,
}

impl JoystickTag {
    pub fn new(axes: Vec<f32>, buttons: Vec<bool>, hats: Vec<i16>) -> JoystickTag {
        JoystickTag {
            axes,
            buttons,
            hats,
        }
    }

    /// Bytes this block occupies on the wire, length prefix included.
    pub fn wire_len(&self) -> usize {
        6 + self.axes.len() + 2 * self.hats.len()
    }
}

impl Tag for JoystickTag {
    fn id(&self) -> u8 {
        TAG_JOYSTICK
    }

    fn data(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len() - 2);

        for axis in &self.axes {
            buf.write_i8(encode_axis(*axis)).unwrap();
        }

        buf.push(self.buttons.len() as u8);
        buf.write_u16::<BigEndian>(button_bits(&self.buttons))
            .unwrap();

        buf.push(self.hats.len() as u8);
        for hat in &self.hats {
            buf.write_i16::<BigEndian>(*hat).unwrap();
        }

        buf
    }
}

/// Scales an axis value in `[-1, 1]` to the signed byte the robot expects.
fn encode_axis(value: f32) -> i8 {
    let scaled = (value * 127.0).round();

    scaled.max(-128.0).min(127.0) as i8
}

/// Wall-clock data sent when the robot asks for the current time, e.g.
/// while its code is initializing.
pub struct DateTime {
    second: u8,
    minute: u8,
    hour: u8,
    yday: u8,
    month: u8,
    year: u8,
}

impl DateTime {
    /// `yday` and `month` are zero-based; `year` counts from 1900. Values
    /// wider than a byte truncate on the wire.
    pub fn new(second: u8, minute: u8, hour: u8, yday: u8, month: u8, year: u8) -> DateTime {
        DateTime {
            second,
            minute,
            hour,
            yday,
            month,
            year,
        }
    }

    /// Captures the current UTC wall-clock time.
    pub fn now() -> DateTime {
        let now = Utc::now();

        DateTime {
            second: now.second() as u8,
            minute: now.minute() as u8,
            hour: now.hour() as u8,
            yday: now.ordinal0() as u8,
            month: now.month0() as u8,
            year: (now.year() - 1900) as u8,
        }
    }
}

impl Tag for DateTime {
    fn id(&self) -> u8 {
        TAG_DATE
    }

    fn data(&self) -> Vec<u8> {
        vec![
            0,
            0,
            self.second,
            self.minute,
            self.hour,
            self.yday,
            self.month,
            self.year,
        ]
    }

    /// The length prefix of the date block is pinned to 0x0b by the
    /// protocol, not derived from the data.
    fn construct(&self) -> Vec<u8> {
        let mut buf = vec![0x0b, self.id()];
        buf.extend(self.data());

        buf
    }
}

/// Timezone label sent alongside the date block.
pub struct Timezone {
    tz: String,
}

impl Timezone {
    pub fn new(tz: &str) -> Timezone {
        Timezone { tz: tz.to_string() }
    }
}

impl Tag for Timezone {
    fn id(&self) -> u8 {
        TAG_TIMEZONE
    }

    fn data(&self) -> Vec<u8> {
        self.tz.as_bytes().to_vec()
    }

    /// The length prefix counts only the string bytes, not the tag id.
    fn construct(&self) -> Vec<u8> {
        let mut buf = vec![self.data().len() as u8, self.id()];
        buf.extend(self.data());

        buf
    }
}
