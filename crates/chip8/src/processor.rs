use super::Bus;
use crate::{
    memory::{BIG_FONT_GLYPH_SIZE, BIG_FONT_START, FONT_GLYPH_SIZE, FONT_START},
    quirks::{Quirks, System},
    random::{OsRandom, RandomSource},
    stack::Stack,
    types::{u16_from_two, upper_nibble, Operands},
    video::Resolution,
};

/// default starting point for most Chip8 programs
pub const STARTING_PC: u16 = 0x200;

/// Number of SUPER-CHIP persistent user flag registers.
pub const RPL_FLAG_COUNT: usize = 16;

/// Pixels moved by the horizontal scroll instructions.
const HORIZONTAL_SCROLL: usize = 4;

/// Describes how the program counter should be updated after
/// executing an instruction. The program counter already points
/// at the next instruction when the instruction runs.
#[derive(Debug, PartialEq, Eq)]
enum PCUpdate {
    /// Go directly to the next instruction.
    Next,

    /// Skip the next instruction.
    SkipNext,

    /// Jump to the given address.
    Jump(u16),

    /// Execute the same instruction again on the next cycle.
    Repeat,
}

/// The interpreter core: registers, call stack and the instruction set.
///
/// Everything the processor reads or writes besides its own registers
/// lives on the [`Bus`].
pub struct Processor {
    /// Vx registers
    pub v: [u8; 16],

    /// Index register
    pub i: u16,

    /// Program counter
    pub pc: u16,

    /// Return addresses
    pub stack: Stack,

    /// Current display mode
    pub resolution: Resolution,

    /// Set by a draw while display wait is active, cleared on the next timer tick
    pub interrupted: bool,

    /// SUPER-CHIP persistent user flags, kept across resets
    pub rpl: [u8; RPL_FLAG_COUNT],

    /// The last opcode that has been processed
    pub last_opcode: u16,

    /// The address of the last opcode that has been processed
    pub last_opcode_addr: u16,

    system: System,
    quirks: Quirks,
    waiting_for_key: bool,
    halted_at: Option<u16>,
    rng: Box<dyn RandomSource>,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(System::default())
    }
}

impl Processor {
    /// Create a processor for `system`, drawing random numbers from the OS.
    pub fn new(system: System) -> Self {
        Self::with_random_source(system, Box::new(OsRandom))
    }

    /// Create a processor for `system` with a custom random number source.
    pub fn with_random_source(system: System, rng: Box<dyn RandomSource>) -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: STARTING_PC,
            stack: Stack::new(),
            resolution: Resolution::Low,
            interrupted: false,
            rpl: [0; RPL_FLAG_COUNT],
            last_opcode: 0,
            last_opcode_addr: 0,
            system,
            quirks: system.quirks(),
            waiting_for_key: false,
            halted_at: None,
            rng,
        }
    }

    pub fn system(&self) -> System {
        self.system
    }

    pub fn set_random_source(&mut self, rng: Box<dyn RandomSource>) {
        self.rng = rng;
    }

    /// Whether the processor is parked on a key wait (`Fx0A`).
    pub fn waiting_for_key(&self) -> bool {
        self.waiting_for_key
    }

    /// Whether the processor is stuck on a native call or exit instruction.
    pub fn halted(&self) -> bool {
        self.halted_at == Some(self.pc)
    }

    /// Put all registers back in their power on state.
    /// The persistent user flags are kept.
    pub fn reset(&mut self) {
        self.v = [0; 16];
        self.i = 0;
        self.pc = STARTING_PC;
        self.stack.clear();
        self.resolution = Resolution::Low;
        self.interrupted = false;
        self.last_opcode = 0;
        self.last_opcode_addr = 0;
        self.waiting_for_key = false;
        self.halted_at = None;
    }

    /// Lift the display wait stall. Called once per timer tick.
    pub fn release_interrupts(&mut self) {
        self.interrupted = false;
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// Returns `false` when the cycle was skipped because the processor
    /// is waiting for the display.
    pub fn cycle(&mut self, bus: &mut Bus) -> bool {
        if self.quirks.display_wait && self.interrupted {
            return false;
        }

        // get the next two bytes and move past them
        let addr = self.pc;
        let first = bus.memory[usize::from(addr)];
        let second = bus.memory[usize::from(addr) + 1];
        self.pc = addr.wrapping_add(2);

        self.last_opcode = u16_from_two(first, second);
        self.last_opcode_addr = addr;

        match self.process_opcode(first, second, bus) {
            PCUpdate::Next => {}
            PCUpdate::SkipNext => self.pc = self.pc.wrapping_add(2),
            PCUpdate::Jump(target) => self.pc = target,
            PCUpdate::Repeat => self.pc = addr,
        }
        true
    }

    fn process_opcode(&mut self, first: u8, second: u8, bus: &mut Bus) -> PCUpdate {
        let opcode = u16_from_two(first, second);
        let ops = Operands::from_bytes(first, second);
        let (x, y) = (ops.vx(), ops.vy());
        let nn = ops.nn();
        let nnn = ops.nnn();

        match upper_nibble(first) {
            // 0___
            0x0 => self.process_system(opcode, ops, bus),

            // 1nnn
            0x1 => PCUpdate::Jump(nnn),

            // 2nnn
            0x2 => {
                self.stack.push(self.pc);
                PCUpdate::Jump(nnn)
            }

            // 3xnn
            0x3 => skip_if(self.v[x] == nn),

            // 4xnn
            0x4 => skip_if(self.v[x] != nn),

            // 5xy0
            0x5 => skip_if(self.v[x] == self.v[y]),

            // 6xnn
            0x6 => {
                self.v[x] = nn;
                PCUpdate::Next
            }

            // 7xnn
            0x7 => {
                self.v[x] = self.v[x].wrapping_add(nn);
                PCUpdate::Next
            }

            // 8xy_
            0x8 => self.process_alu(opcode, ops),

            // 9xy0
            0x9 => skip_if(self.v[x] != self.v[y]),

            // Annn
            0xA => {
                self.i = nnn;
                PCUpdate::Next
            }

            // Bnnn
            0xB => {
                let offset = if self.quirks.jumping { self.v[x] } else { self.v[0] };
                PCUpdate::Jump(nnn + u16::from(offset))
            }

            // Cxnn
            0xC => {
                self.v[x] = self.rng.next_byte() & nn;
                PCUpdate::Next
            }

            // Dxyn
            0xD => {
                self.draw(ops, bus);
                PCUpdate::Next
            }

            // Ex__
            0xE => match nn {
                // Ex9E
                0x9E => skip_if(bus.keypad.is_key_pressed(self.v[x])),

                // ExA1
                0xA1 => skip_if(!bus.keypad.is_key_pressed(self.v[x])),

                // invalid
                _ => {
                    log::error!("Invalid EX__ instruction: {opcode:04X}");
                    PCUpdate::Next
                }
            },

            // Fx__
            _ => self.process_misc(opcode, ops, bus),
        }
    }

    /// The `0___` group: screen control, return and native calls.
    fn process_system(&mut self, opcode: u16, ops: Operands, bus: &mut Bus) -> PCUpdate {
        match opcode {
            // 00E0
            0x00E0 => {
                bus.video.clear();
                PCUpdate::Next
            }

            // 00EE
            0x00EE => match self.stack.pop() {
                Some(addr) => PCUpdate::Jump(addr),
                None => {
                    log::warn!(
                        "Return with an empty stack at {:#06X}, ignoring",
                        self.last_opcode_addr
                    );
                    PCUpdate::Next
                }
            },

            // 00Cn
            op if op & 0xFFF0 == 0x00C0 => {
                bus.video.scroll_down(usize::from(ops.n), self.resolution);
                PCUpdate::Next
            }

            // 00FB
            0x00FB => {
                bus.video.scroll_right(HORIZONTAL_SCROLL, self.resolution);
                PCUpdate::Next
            }

            // 00FC
            0x00FC => {
                bus.video.scroll_left(HORIZONTAL_SCROLL, self.resolution);
                PCUpdate::Next
            }

            // 00FD
            0x00FD => self.halt("Exit instruction"),

            // 00FE
            0x00FE => {
                self.resolution = Resolution::Low;
                bus.video.clear();
                PCUpdate::Next
            }

            // 00FF
            0x00FF => {
                self.resolution = Resolution::High;
                bus.video.clear();
                PCUpdate::Next
            }

            // 0nnn, machine code routines can't run here
            _ => self.halt("Native call"),
        }
    }

    /// The `8xy_` group: register to register arithmetic.
    fn process_alu(&mut self, opcode: u16, ops: Operands) -> PCUpdate {
        let (x, y) = (ops.vx(), ops.vy());
        match ops.n {
            // 8xy0
            0x0 => self.v[x] = self.v[y],

            // 8xy1
            0x1 => {
                self.v[x] |= self.v[y];
                self.reset_flag();
            }

            // 8xy2
            0x2 => {
                self.v[x] &= self.v[y];
                self.reset_flag();
            }

            // 8xy3
            0x3 => {
                self.v[x] ^= self.v[y];
                self.reset_flag();
            }

            // 8xy4
            0x4 => {
                let (result, overflow) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = result;
                self.v[0xF] = u8::from(overflow);
            }

            // 8xy5
            0x5 => {
                let (result, overflow) = self.v[x].overflowing_sub(self.v[y]);
                self.v[x] = result;
                self.v[0xF] = u8::from(!overflow);
            }

            // 8xy6
            0x6 => {
                let source = self.shift_source(x, y);
                self.v[x] = source >> 1;
                self.v[0xF] = source & 1;
            }

            // 8xy7
            0x7 => {
                let (result, overflow) = self.v[y].overflowing_sub(self.v[x]);
                self.v[x] = result;
                self.v[0xF] = u8::from(!overflow);
            }

            // 8xyE
            0xE => {
                let source = self.shift_source(x, y);
                self.v[x] = source << 1;
                self.v[0xF] = source >> 7;
            }

            // invalid
            _ => log::error!("Invalid 8XY_ instruction: {opcode:04X}"),
        }
        PCUpdate::Next
    }

    /// The `Fx__` group: timers, keys, fonts and bulk memory transfers.
    fn process_misc(&mut self, opcode: u16, ops: Operands, bus: &mut Bus) -> PCUpdate {
        let x = ops.vx();
        match ops.nn() {
            // Fx07
            0x07 => self.v[x] = bus.timers.delay,

            // Fx0A
            0x0A => {
                if !self.waiting_for_key {
                    // only presses that happen from now on count
                    self.waiting_for_key = true;
                    bus.keypad.clear_latch();
                }
                match bus.keypad.take_key_press() {
                    Some(key) => {
                        self.v[x] = key;
                        self.waiting_for_key = false;
                    }
                    None => return PCUpdate::Repeat,
                }
            }

            // Fx15
            0x15 => bus.timers.delay = self.v[x],

            // Fx18
            0x18 => bus.timers.sound = self.v[x],

            // Fx1E
            0x1E => {
                let sum = self.i + u16::from(self.v[x]);
                self.v[0xF] = u8::from(sum > 0x0FFF);
                self.i = sum & 0x0FFF;
            }

            // Fx29
            0x29 => {
                let digit = usize::from(self.v[x] & 0xF);
                self.i = (FONT_START + digit * FONT_GLYPH_SIZE) as u16;
            }

            // Fx30
            0x30 => {
                let digit = usize::from(self.v[x] & 0xF);
                self.i = (BIG_FONT_START + digit * BIG_FONT_GLYPH_SIZE) as u16;
            }

            // Fx33
            0x33 => {
                let i = usize::from(self.i);
                bus.memory[i] = self.v[x] / 100;
                bus.memory[i + 1] = (self.v[x] / 10) % 10;
                bus.memory[i + 2] = self.v[x] % 10;
            }

            // Fx55
            0x55 => {
                let i = usize::from(self.i);
                for reg in 0..=x {
                    bus.memory[i + reg] = self.v[reg];
                }
                self.advance_index(x);
            }

            // Fx65
            0x65 => {
                let i = usize::from(self.i);
                for reg in 0..=x {
                    self.v[reg] = bus.memory[i + reg];
                }
                self.advance_index(x);
            }

            // Fx75
            0x75 => self.rpl[..=x].copy_from_slice(&self.v[..=x]),

            // Fx85
            0x85 => self.v[..=x].copy_from_slice(&self.rpl[..=x]),

            // invalid
            _ => log::error!("Invalid FX__ instruction: {opcode:04X}"),
        }
        PCUpdate::Next
    }

    /// `Dxyn`: XOR a sprite from memory at I onto the screen.
    ///
    /// In low resolution VF is 1 if any pixel was turned off. In high
    /// resolution VF counts the sprite rows that collided, plus the rows
    /// cut off by the bottom edge when clipping.
    fn draw(&mut self, ops: Operands, bus: &mut Bus) {
        let resolution = self.resolution;
        let (width, height) = (resolution.width(), resolution.height());

        // a height of 0 asks for a 16x16 sprite
        let wide = ops.n == 0 && resolution == Resolution::High;
        let (sprite_width, rows) = if wide { (16, 16) } else { (8, usize::from(ops.n)) };

        let origin_x = usize::from(self.v[ops.vx()]) % width;
        let origin_y = usize::from(self.v[ops.vy()]) % height;
        let base = usize::from(self.i);

        let mut collided_rows: u8 = 0;
        let mut clipped_rows: u8 = 0;
        for row in 0..rows {
            let mut y = origin_y + row;
            if y >= height {
                if self.quirks.clipping {
                    clipped_rows += 1;
                    continue;
                }
                y %= height;
            }

            let bits = if wide {
                u16_from_two(bus.memory[base + 2 * row], bus.memory[base + 2 * row + 1])
            } else {
                u16::from(bus.memory[base + row]) << 8
            };

            let mut collision = false;
            for col in 0..sprite_width {
                if bits & (0x8000 >> col) == 0 {
                    continue;
                }
                let mut x = origin_x + col;
                if x >= width {
                    if self.quirks.clipping {
                        continue;
                    }
                    x %= width;
                }
                let old = bus.video.get(x, y, resolution);
                collision |= old;
                bus.video.set(x, y, !old, resolution);
            }
            if collision {
                collided_rows += 1;
            }
        }

        self.v[0xF] = match resolution {
            Resolution::Low => u8::from(collided_rows > 0),
            Resolution::High => collided_rows + clipped_rows,
        };

        if self.quirks.display_wait {
            self.interrupted = true;
        }
    }

    /// Stay on the current instruction forever, logging only the first time.
    fn halt(&mut self, reason: &str) -> PCUpdate {
        let addr = self.last_opcode_addr;
        if self.halted_at != Some(addr) {
            log::debug!("{reason} {:04X} at {addr:#06X}, halting", self.last_opcode);
            self.halted_at = Some(addr);
        }
        PCUpdate::Repeat
    }

    fn reset_flag(&mut self) {
        if self.quirks.vf_reset {
            self.v[0xF] = 0;
        }
    }

    fn shift_source(&self, x: usize, y: usize) -> u8 {
        if self.quirks.shifting {
            self.v[x]
        } else {
            self.v[y]
        }
    }

    fn advance_index(&mut self, x: usize) {
        if self.quirks.memory {
            self.i += x as u16 + 1;
        }
    }
}

fn skip_if(condition: bool) -> PCUpdate {
    if condition {
        PCUpdate::SkipNext
    } else {
        PCUpdate::Next
    }
}
