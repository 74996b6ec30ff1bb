//! Big-endian byte cursor shared by the class-file and module readers.

use crate::error::{BytecodeError, BytecodeResult};

pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    pub(crate) fn take(&mut self, len: usize, what: &'static str) -> BytecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(BytecodeError::Truncated(what))?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(BytecodeError::Truncated(what))?;
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self, what: &'static str) -> BytecodeResult<u8> {
        let [b] = self.array::<1>(what)?;
        Ok(b)
    }

    pub(crate) fn u16(&mut self, what: &'static str) -> BytecodeResult<u16> {
        Ok(u16::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn u32(&mut self, what: &'static str) -> BytecodeResult<u32> {
        Ok(u32::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn i32(&mut self, what: &'static str) -> BytecodeResult<i32> {
        Ok(i32::from_be_bytes(self.array(what)?))
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> BytecodeResult<[u8; N]> {
        let slice = self.take(N, what)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}
