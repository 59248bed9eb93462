/// Upper 4 bits of a byte.
#[inline(always)]
pub fn upper_nibble(byte: u8) -> u8 {
    byte >> 4
}

/// Lower 4 bits of a byte.
#[inline(always)]
pub fn lower_nibble(byte: u8) -> u8 {
    byte & 0x0F
}

/// Combine two bytes into one big-endian word.
#[inline(always)]
pub fn u16_from_two(high: u8, low: u8) -> u16 {
    (u16::from(high) << 8) | u16::from(low)
}

/// The three nibble operands of a decoded instruction.
///
/// For an opcode `0xAXYN` the fields are `x = X`, `y = Y` and `n = N`.
/// The 8-bit immediate (`NN`) and the 12-bit address (`NNN`) are rebuilt
/// from these on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operands {
    pub x: u8,
    pub y: u8,
    pub n: u8,
}

impl Operands {
    /// Decode the operands from the two fetched instruction bytes.
    pub fn from_bytes(first: u8, second: u8) -> Self {
        Self {
            x: lower_nibble(first),
            y: upper_nibble(second),
            n: lower_nibble(second),
        }
    }

    /// `NN`: the second instruction byte.
    #[inline]
    pub fn nn(&self) -> u8 {
        (self.y << 4) | self.n
    }

    /// `NNN`: the 12-bit tail of the instruction.
    #[inline]
    pub fn nnn(&self) -> u16 {
        (u16::from(self.x) << 8) | (u16::from(self.y) << 4) | u16::from(self.n)
    }

    /// `x` as a register index.
    #[inline]
    pub fn vx(&self) -> usize {
        usize::from(self.x)
    }

    /// `y` as a register index.
    #[inline]
    pub fn vy(&self) -> usize {
        usize::from(self.y)
    }
}
