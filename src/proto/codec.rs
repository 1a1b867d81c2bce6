//! Scalar codecs shared by the packet builders and parsers. The byte
//! layouts here are the authoritative wire format; everything else in the
//! protocol composes these.

use crate::config::{Alliance, Position};

/// Splits a battery voltage into the `(integer, fractional)` byte pair
/// used on the wire. The fractional byte is in 1/256 V steps.
pub fn encode_voltage(voltage: f32) -> (u8, u8) {
    let volts = voltage.max(0.0);
    let integer = volts.floor();
    let fraction = ((volts - integer) * 256.0).floor();

    (integer as u8, fraction as u8)
}

/// Reassembles a voltage from its `(integer, fractional)` byte pair.
pub fn decode_voltage(upper: u8, lower: u8) -> f32 {
    f32::from(upper) + f32::from(lower) / 256.0
}

/// Splits a short into `(high, low)` bytes, big endian.
pub fn encode_u16_be(value: u16) -> (u8, u8) {
    (((value >> 8) & 0xff) as u8, (value & 0xff) as u8)
}

/// Encodes an alliance station as the single byte sent to the robot:
/// red 1-3 are 0-2, blue 1-3 are 3-5.
pub fn station_byte(alliance: Alliance, position: Position) -> u8 {
    let colour = match alliance {
        Alliance::Red => 0,
        Alliance::Blue => 3,
    };

    let slot = match position {
        Position::P1 => 0,
        Position::P2 => 1,
        Position::P3 => 2,
    };

    colour + slot
}

/// Alliance colour of a station byte. Anything outside 0..=5 falls back
/// to red.
pub fn alliance_of(byte: u8) -> Alliance {
    if (3..=5).contains(&byte) {
        Alliance::Blue
    } else {
        Alliance::Red
    }
}

/// Position of a station byte. Anything outside 0..=5 falls back to
/// position 1.
pub fn position_of(byte: u8) -> Position {
    if byte > 5 {
        return Position::P1;
    }

    match byte % 3 {
        0 => Position::P1,
        1 => Position::P2,
        _ => Position::P3,
    }
}
