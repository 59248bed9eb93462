use crate::processor::Processor;

pub mod clock;
pub mod config;
mod emulator;
mod error;
pub mod keypad;
pub mod memory;
mod observable;
pub mod processor;
pub mod quirks;
pub mod random;
pub mod stack;
mod task;
pub mod types;
pub mod video;

pub use clock::{Clocked, Timers, VirtualClock};
pub use config::{EmulatorConfig, EmulatorSpeed};
pub use emulator::Emulator;
pub use error::Chip8Error;
pub use keypad::{KeyEvent, Keypad};
pub use memory::Memory;
pub use observable::Observable;
pub use quirks::{Quirks, System};
pub use random::{OsRandom, RandomSource, SeededRandom};
pub use task::PeriodicTask;
pub use video::{Frame, Resolution, VideoMemory};

/// Called after every executed instruction with the current video memory.
pub type DrawCallback = Box<dyn FnMut(&VideoMemory, Resolution) + Send>;

/// Contains all the different components of the `Chip8` system, excluding the `Processor`.
#[derive(Default)]
pub struct Bus {
    pub timers: Timers,
    pub video: VideoMemory,
    pub keypad: Keypad,
    pub memory: Memory,
}

/// The main CHIP-8 interpreter state, contains all the components of the
/// CHIP-8 and procedures to interact with them at a high level.
///
/// A `Chip8` does no scheduling of its own. Something has to call
/// [`Chip8::step`] at the instruction rate and [`Chip8::tick_timers`] at
/// 60Hz, either an [`Emulator`] or a [`VirtualClock`].
#[derive(Default)]
pub struct Chip8 {
    pub processor: Processor,
    pub bus: Bus,
    on_draw: Option<DrawCallback>,
}

impl Chip8 {
    /// Create a new Chip8 instance emulating `system`.
    pub fn new(system: System) -> Self {
        Self {
            processor: Processor::new(system),
            ..Default::default()
        }
    }

    /// Create a new Chip8 instance with a custom random number source.
    pub fn with_random_source(system: System, rng: Box<dyn RandomSource>) -> Self {
        Self {
            processor: Processor::with_random_source(system, rng),
            ..Default::default()
        }
    }

    pub fn system(&self) -> System {
        self.processor.system()
    }

    /// Replace the random number source used by `Cxnn`.
    pub fn set_random_source(&mut self, rng: Box<dyn RandomSource>) {
        self.processor.set_random_source(rng);
    }

    /// Register the callback invoked after every executed instruction.
    pub fn set_draw_callback(&mut self, callback: DrawCallback) {
        self.on_draw = Some(callback);
    }

    /// Performs one execution step in the interpreter, cycling
    /// the processor and notifying the draw callback.
    ///
    /// Returns `false` if the step was skipped because the processor is
    /// waiting for the display.
    pub fn step(&mut self) -> bool {
        if !self.processor.cycle(&mut self.bus) {
            return false;
        }
        if let Some(on_draw) = self.on_draw.as_mut() {
            on_draw(&self.bus.video, self.processor.resolution);
        }
        true
    }

    /// Count both timers down and lift the display wait stall.
    ///
    /// Returns whether the sound timer was running during this tick.
    pub fn tick_timers(&mut self) -> bool {
        let sounding = self.bus.timers.tick();
        self.processor.release_interrupts();
        sounding
    }

    /// Reset the machine and load the given ROM data into memory.
    ///
    /// On error the machine is left reset with empty program memory.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Chip8Error> {
        self.reset();
        self.bus.memory.load_fonts();
        self.bus.memory.load_rom(data)?;
        log::debug!("Loaded {} byte ROM for {}", data.len(), self.system());
        Ok(())
    }

    /// Update the input state for the given key code.
    pub fn update_key_state(&mut self, key_code: u8, event: KeyEvent) {
        self.bus.keypad.update(key_code, event);
    }

    /// Reset the state of the `Chip8` instance.
    ///
    /// Program memory and video memory are cleared, the fonts and the
    /// persistent user flags are kept.
    pub fn reset(&mut self) {
        self.processor.reset();
        self.bus.timers.reset();
        self.bus.memory.clear();
        self.bus.video.clear();
        self.bus.keypad = Keypad::default();
    }

    /// Snapshot of the screen in the current resolution.
    pub fn frame(&self) -> Frame {
        self.bus.video.snapshot(self.processor.resolution)
    }
}

impl Clocked for Chip8 {
    fn cpu_tick(&mut self) {
        self.step();
    }

    fn timer_tick(&mut self) {
        self.tick_timers();
    }
}
