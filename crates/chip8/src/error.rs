/// Errors surfaced by the interpreter core.
///
/// Instruction execution itself never fails: unknown opcodes degrade to
/// no-ops or halts. Only loading, configuration and starting the clock
/// threads can go wrong.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("unknown system `{0}`, expected one of chip8, schip-legacy, schip-modern, xochip")]
    UnknownSystem(String),

    #[error("unknown emulation speed `{0}`")]
    UnknownSpeed(String),

    #[error("invalid emulation speed factor {0}, must be finite and above zero")]
    InvalidSpeedFactor(f32),

    #[error("invalid clock rate {0}Hz, must be above zero")]
    InvalidClockRate(u32),

    #[error("failed to spawn the {name} thread")]
    TaskSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
