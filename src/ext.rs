use bytes::Buf;
use std::io::{Error, ErrorKind, Result};

/// Fallible reads over `Buf`. The underlying getters panic when the buffer
/// runs dry; these return `UnexpectedEof` instead so a short datagram
/// surfaces as a parse failure.
pub trait BufExt: Buf {
    /// Reads an unsigned byte from `self`
    fn read_u8(&mut self) -> Result<u8> {
        if self.remaining() >= 1 {
            Ok(self.get_u8())
        } else {
            Err(Error::new(ErrorKind::UnexpectedEof, "self.remaining() < 1"))
        }
    }

    /// Reads an unsigned big endian short from `self`
    fn read_u16_be(&mut self) -> Result<u16> {
        if self.remaining() >= 2 {
            Ok(self.get_u16())
        } else {
            Err(Error::new(ErrorKind::UnexpectedEof, "self.remaining() < 2"))
        }
    }
}

impl<B: Buf> BufExt for B {}
