use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        mpsc::Receiver,
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use crate::{
    clock::{self, Clocked},
    config::{validate_speed_factor, EmulatorConfig, EmulatorSpeed},
    error::Chip8Error,
    keypad::KeyEvent,
    observable::Observable,
    quirks::System,
    random::{OsRandom, RandomSource},
    task::PeriodicTask,
    video::Frame,
    Chip8,
};

/// State shared between the controller and the two clock threads.
struct Shared {
    machine: Mutex<Chip8>,
    paused: AtomicBool,
    speed_bits: AtomicU32,
    sound_enabled: AtomicBool,
    cpu_clock_hz: u32,
    timer_clock_hz: u32,
    frame: Arc<Observable<Frame>>,
    sound: Observable<bool>,
}

impl Shared {
    fn machine(&self) -> MutexGuard<'_, Chip8> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn speed_factor(&self) -> f32 {
        f32::from_bits(self.speed_bits.load(Ordering::Relaxed))
    }

    fn cpu_period(&self) -> Duration {
        clock::period(self.cpu_clock_hz, self.speed_factor())
    }

    fn timer_period(&self) -> Duration {
        clock::period(self.timer_clock_hz, self.speed_factor())
    }

    fn cpu_tick(&self) {
        if self.paused.load(Ordering::Acquire) {
            return;
        }
        self.machine().step();
    }

    fn timer_tick(&self) {
        let sounding = {
            let mut machine = self.machine();
            if self.paused.load(Ordering::Acquire) {
                machine.processor.release_interrupts();
                false
            } else {
                machine.tick_timers()
            }
        };
        self.sound.publish(sounding && self.sound_enabled.load(Ordering::Relaxed));
    }
}

/// Runs a [`Chip8`] in real time.
///
/// Two periodic tasks drive the machine: one steps the processor at the
/// configured instruction rate, the other ticks the timers at 60Hz. Both
/// rates are scaled by the speed factor. The screen and the sound state
/// can be polled or subscribed to.
///
/// For deterministic runs, leave the tasks stopped and drive the emulator
/// through its [`Clocked`] implementation with a [`crate::VirtualClock`].
pub struct Emulator {
    shared: Arc<Shared>,
    cpu_task: Option<PeriodicTask>,
    timer_task: Option<PeriodicTask>,
}

impl Emulator {
    /// Create a stopped emulator with nothing loaded.
    pub fn new(config: EmulatorConfig) -> Result<Self, Chip8Error> {
        Self::with_random_source(config, Box::new(OsRandom))
    }

    /// Create a stopped emulator whose `Cxnn` instruction draws from `rng`.
    pub fn with_random_source(
        config: EmulatorConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, Chip8Error> {
        let speed = validate_speed_factor(config.speed_factor)?;
        for hz in [config.cpu_clock_hz, config.timer_clock_hz] {
            if hz == 0 {
                return Err(Chip8Error::InvalidClockRate(hz));
            }
        }

        let frame = Arc::new(Observable::new(Frame::default()));
        let mut machine = Chip8::with_random_source(config.system, rng);
        let frames = Arc::clone(&frame);
        machine.set_draw_callback(Box::new(move |video, resolution| {
            frames.publish(video.snapshot(resolution));
        }));

        log::debug!(
            "Created {} emulator at {}Hz, speed {speed}",
            config.system,
            config.cpu_clock_hz
        );
        Ok(Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(machine),
                paused: AtomicBool::new(false),
                speed_bits: AtomicU32::new(speed.to_bits()),
                sound_enabled: AtomicBool::new(config.sound_enabled),
                cpu_clock_hz: config.cpu_clock_hz,
                timer_clock_hz: config.timer_clock_hz,
                frame,
                sound: Observable::new(false),
            }),
            cpu_task: None,
            timer_task: None,
        })
    }

    pub fn system(&self) -> System {
        self.shared.machine().system()
    }

    /// Stop the clocks, reset the machine and load `data` at `0x200`.
    ///
    /// On error the machine is left reset and empty. The clocks stay
    /// stopped either way, call [`Emulator::start`] to run the ROM.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Chip8Error> {
        self.stop_tasks();
        let result = self.shared.machine().load_rom(data);
        self.publish_reset_state();
        match &result {
            Ok(()) => log::info!("Loaded ROM ({} bytes)", data.len()),
            Err(e) => log::error!("Failed to load ROM: {e}"),
        }
        result
    }

    /// Start both clocks. Does nothing if they are already running.
    pub fn start(&mut self) -> Result<(), Chip8Error> {
        if self.is_running() {
            log::debug!("Emulator already running");
            return Ok(());
        }
        self.stop_tasks();
        self.shared.paused.store(false, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let period_shared = Arc::clone(&self.shared);
        let cpu_task = PeriodicTask::spawn(
            "chip8-cpu",
            move || period_shared.cpu_period(),
            move || shared.cpu_tick(),
        )?;

        let shared = Arc::clone(&self.shared);
        let period_shared = Arc::clone(&self.shared);
        let timer_task = PeriodicTask::spawn(
            "chip8-timers",
            move || period_shared.timer_period(),
            move || shared.timer_tick(),
        )?;

        self.cpu_task = Some(cpu_task);
        self.timer_task = Some(timer_task);
        log::info!("Emulator started");
        Ok(())
    }

    /// Stop executing instructions. The timers freeze and the sound goes
    /// silent until [`Emulator::resume`].
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
        log::info!("Emulator paused");
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
        log::info!("Emulator resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Whether the instruction clock is scheduled.
    pub fn is_running(&self) -> bool {
        self.cpu_task.as_ref().map_or(false, PeriodicTask::is_active)
    }

    /// Stop both clocks and put the machine back in its power on state.
    /// Program and video memory are cleared.
    pub fn reset(&mut self) {
        self.stop_tasks();
        self.shared.machine().reset();
        self.shared.paused.store(false, Ordering::Release);
        self.publish_reset_state();
        log::info!("Emulator reset");
    }

    /// Scale both clock rates by `factor`. Applies from the next tick on.
    ///
    /// An invalid factor is rejected and the current one kept.
    pub fn set_speed_factor(&self, factor: f32) -> Result<(), Chip8Error> {
        let factor = validate_speed_factor(factor)?;
        self.shared.speed_bits.store(factor.to_bits(), Ordering::Relaxed);
        log::info!("Emulation speed set to {factor}X");
        Ok(())
    }

    pub fn set_speed(&self, speed: EmulatorSpeed) {
        self.shared.speed_bits.store(speed.factor().to_bits(), Ordering::Relaxed);
        log::info!("Emulation speed set to {speed}");
    }

    pub fn speed_factor(&self) -> f32 {
        self.shared.speed_factor()
    }

    /// Time between two instruction clock ticks at the current speed.
    pub fn cpu_period(&self) -> Duration {
        self.shared.cpu_period()
    }

    /// Time between two timer clock ticks at the current speed.
    pub fn timer_period(&self) -> Duration {
        self.shared.timer_period()
    }

    /// Enable or mute the sound signal. The sound timer keeps counting.
    pub fn toggle_sound(&self, enabled: bool) {
        self.shared.sound_enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.shared.sound.publish(false);
        }
        log::debug!("Sound {}", if enabled { "enabled" } else { "muted" });
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.shared.sound_enabled.load(Ordering::Relaxed)
    }

    /// Forward a key event to the keypad. Invalid key codes are ignored.
    pub fn on_key(&self, key: u8, event: KeyEvent) {
        self.shared.machine().update_key_state(key, event);
    }

    /// The screen as of the last executed instruction.
    pub fn frame(&self) -> Frame {
        self.shared.frame.get()
    }

    /// Receive the screen after every executed instruction.
    pub fn subscribe_frames(&self) -> Receiver<Frame> {
        self.shared.frame.subscribe()
    }

    /// Whether a tone should be playing, as of the last timer tick.
    pub fn sound_on(&self) -> bool {
        self.shared.sound.get()
    }

    /// Receive the sound state after every timer tick.
    pub fn subscribe_sound(&self) -> Receiver<bool> {
        self.shared.sound.subscribe()
    }

    /// Run `f` with exclusive access to the machine.
    ///
    /// Both clocks are blocked while `f` runs.
    pub fn with_machine<R>(&self, f: impl FnOnce(&mut Chip8) -> R) -> R {
        f(&mut self.shared.machine())
    }

    fn stop_tasks(&mut self) {
        let mut stopped = false;
        for mut task in [self.cpu_task.take(), self.timer_task.take()].into_iter().flatten() {
            task.cancel();
            stopped = true;
        }
        if stopped {
            log::debug!("Emulator clocks stopped");
        }
    }

    fn publish_reset_state(&self) {
        let frame = self.shared.machine().frame();
        self.shared.frame.publish(frame);
        self.shared.sound.publish(false);
    }
}

impl Clocked for Emulator {
    fn cpu_tick(&mut self) {
        self.shared.cpu_tick();
    }

    fn timer_tick(&mut self) {
        self.shared.timer_tick();
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}
