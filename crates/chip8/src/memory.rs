use std::ops::{Index, IndexMut};

use crate::error::Chip8Error;

/// Total size of the Chip8 memory.
pub const MEMORY_SIZE: usize = 4096;

/// The size of the interpreter area.
///
/// Programs are loaded right after it, and `Memory::clear` never
/// touches anything below it.
pub const PROGRAM_START: usize = 0x200;

/// The largest ROM that fits in program memory.
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;

/// Where the small hexadecimal font is stored.
pub const FONT_START: usize = 0x050;

/// Bytes per small font glyph.
pub const FONT_GLYPH_SIZE: usize = 5;

/// Where the SUPER-CHIP big hexadecimal font is stored.
pub const BIG_FONT_START: usize = 0x0A0;

/// Bytes per big font glyph.
pub const BIG_FONT_GLYPH_SIZE: usize = 10;

/// Built in Chip8 font data, one 4x5 glyph per hex digit.
pub const FONT: [u8; 16 * FONT_GLYPH_SIZE] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// SUPER-CHIP 8x10 font, used by `Fx30`.
pub const BIG_FONT: [u8; 16 * BIG_FONT_GLYPH_SIZE] = [
    0xFF, 0xFF, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xFF, 0xFF, // 0
    0x18, 0x78, 0x78, 0x18, 0x18, 0x18, 0x18, 0x18, 0xFF, 0xFF, // 1
    0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, // 2
    0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, // 3
    0xC3, 0xC3, 0xC3, 0xC3, 0xFF, 0xFF, 0x03, 0x03, 0x03, 0x03, // 4
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, // 5
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, // 6
    0xFF, 0xFF, 0x03, 0x03, 0x06, 0x0C, 0x18, 0x18, 0x18, 0x18, // 7
    0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, // 8
    0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, // 9
    0x7E, 0xFF, 0xC3, 0xC3, 0xC3, 0xFF, 0xFF, 0xC3, 0xC3, 0xC3, // A
    0xFC, 0xFC, 0xC3, 0xC3, 0xFC, 0xFC, 0xC3, 0xC3, 0xFC, 0xFC, // B
    0x3C, 0xFF, 0xC3, 0xC0, 0xC0, 0xC0, 0xC0, 0xC3, 0xFF, 0x3C, // C
    0xFC, 0xFE, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xFE, 0xFC, // D
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, // E
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0xC0, 0xC0, 0xC0, 0xC0, // F
];

/// The memory of the `Chip8`.
///
/// Out of range accesses panic. The processor never masks addresses, so a
/// malformed ROM that walks `PC` or `I` off the end fails loudly.
#[derive(Clone)]
pub struct Memory {
    memory: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = Self {
            memory: [0; MEMORY_SIZE],
        };
        memory.load_fonts();
        memory
    }
}

impl Memory {
    /// Create a new `Memory` object with both fonts loaded and
    /// program memory filled with zeroes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the byte at `address`.
    #[inline]
    pub fn read(&self, address: usize) -> u8 {
        self[address]
    }

    /// Write `value` at `address`.
    #[inline]
    pub fn write(&mut self, address: usize, value: u8) {
        self[address] = value;
    }

    /// Zero all program memory. The interpreter area (and the fonts in it)
    /// is left untouched.
    pub fn clear(&mut self) {
        self.memory[PROGRAM_START..].fill(0);
    }

    /// Copy both fonts into the interpreter area.
    pub fn load_fonts(&mut self) {
        self.memory[FONT_START..FONT_START + FONT.len()].copy_from_slice(&FONT);
        self.memory[BIG_FONT_START..BIG_FONT_START + BIG_FONT.len()].copy_from_slice(&BIG_FONT);
    }

    /// Load the ROM bytes from `data` at `PROGRAM_START`.
    ///
    /// The rest of program memory is left as it is, callers clear it first.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Chip8Error> {
        if data.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: data.len(),
                max_size: MAX_ROM_SIZE,
            });
        }
        self.memory[PROGRAM_START..PROGRAM_START + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Borrow `len` bytes starting at `address`.
    pub fn slice(&self, address: usize, len: usize) -> &[u8] {
        &self.memory[address..address + len]
    }
}

impl Index<usize> for Memory {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        match self.memory.get(index) {
            Some(value) => value,
            None => panic!("memory read out of range at {index:#06X}"),
        }
    }
}

impl IndexMut<usize> for Memory {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self.memory.get_mut(index) {
            Some(value) => value,
            None => panic!("memory write out of range at {index:#06X}"),
        }
    }
}
