use std::time::Duration;

/// Default rate of the instruction clock.
pub const DEFAULT_CPU_CLOCK_HZ: u32 = 1000;

/// Rate at which the delay and sound timers count down.
pub const TIMER_CLOCK_HZ: u32 = 60;

/// Time between two firings of a clock running at `hz`, scaled by the
/// emulation `speed` factor.
pub fn period(hz: u32, speed: f32) -> Duration {
    Duration::from_secs_f64(1.0 / (f64::from(hz) * f64::from(speed)))
}

/// The `Chip8` delay and sound timers.
///
/// Both are decremented by `1` on every timer tick until they reach `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    /// Count both timers down by one.
    ///
    /// Returns whether the sound timer was running during this tick.
    pub fn tick(&mut self) -> bool {
        self.delay = self.delay.saturating_sub(1);
        let sounding = self.sound > 0;
        self.sound = self.sound.saturating_sub(1);
        sounding
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Something driven by the two emulator clocks.
pub trait Clocked {
    /// One instruction clock pulse.
    fn cpu_tick(&mut self);

    /// One timer clock pulse.
    fn timer_tick(&mut self);
}

/// A clock that fires pulses on demand instead of in real time.
///
/// The timer pulses are interleaved with the instruction pulses at the
/// configured ratio: after `k` CPU ticks exactly `k * timer_hz / cpu_hz`
/// (rounded down) timer ticks have fired.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    cpu_hz: u64,
    timer_hz: u64,
    cpu_ticks: u64,
    timer_ticks: u64,
}

impl VirtualClock {
    pub fn new(cpu_hz: u32, timer_hz: u32) -> Self {
        Self {
            cpu_hz: u64::from(cpu_hz.max(1)),
            timer_hz: u64::from(timer_hz),
            cpu_ticks: 0,
            timer_ticks: 0,
        }
    }

    /// Total CPU ticks driven so far.
    pub fn cpu_ticks(&self) -> u64 {
        self.cpu_ticks
    }

    /// Timer ticks fired by [`VirtualClock::run_cpu_ticks`] so far.
    pub fn timer_ticks(&self) -> u64 {
        self.timer_ticks
    }

    /// Drive `count` CPU ticks, firing timer ticks as they come due.
    pub fn run_cpu_ticks(&mut self, target: &mut impl Clocked, count: u64) {
        for _ in 0..count {
            target.cpu_tick();
            self.cpu_ticks += 1;
            let due = self.cpu_ticks * self.timer_hz / self.cpu_hz;
            while self.timer_ticks < due {
                target.timer_tick();
                self.timer_ticks += 1;
            }
        }
    }

    /// Drive `count` timer ticks without running the CPU.
    pub fn run_timer_ticks(&mut self, target: &mut impl Clocked, count: u64) {
        for _ in 0..count {
            target.timer_tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        cpu: u32,
        timer: u32,
    }

    impl Clocked for Counter {
        fn cpu_tick(&mut self) {
            self.cpu += 1;
        }

        fn timer_tick(&mut self) {
            self.timer += 1;
        }
    }

    #[test]
    fn test_timers_count_down() {
        let mut timers = Timers { delay: 10, sound: 2 };
        assert!(timers.tick());
        assert!(timers.tick());
        assert!(!timers.tick());
        for _ in 0..7 {
            timers.tick();
        }
        assert_eq!(timers.delay, 0);
        timers.tick();
        assert_eq!(timers.delay, 0);
        assert_eq!(timers.sound, 0);
    }

    #[test]
    fn test_period_scales_with_speed() {
        assert_eq!(period(1000, 1.0), Duration::from_millis(1));
        assert_eq!(period(1000, 2.0), Duration::from_micros(500));
        assert_eq!(period(1000, 0.5), Duration::from_millis(2));

        let normal = period(TIMER_CLOCK_HZ, 1.0).as_nanos() as i128;
        let double = period(TIMER_CLOCK_HZ, 2.0).as_nanos() as i128;
        assert!((normal - 2 * double).abs() <= 1);
    }

    #[test]
    fn test_virtual_clock_ratio() {
        let mut clock = VirtualClock::new(1000, 60);
        let mut counter = Counter::default();
        clock.run_cpu_ticks(&mut counter, 1000);
        assert_eq!(counter.cpu, 1000);
        assert_eq!(counter.timer, 60);

        clock.run_cpu_ticks(&mut counter, 16);
        assert_eq!(counter.timer, 60);
        clock.run_cpu_ticks(&mut counter, 1);
        assert_eq!(counter.timer, 61);
        assert_eq!(clock.cpu_ticks(), 1017);
        assert_eq!(clock.timer_ticks(), 61);
    }

    #[test]
    fn test_virtual_clock_timer_only() {
        let mut clock = VirtualClock::new(1000, 60);
        let mut counter = Counter::default();
        clock.run_timer_ticks(&mut counter, 5);
        assert_eq!(counter.timer, 5);
        assert_eq!(counter.cpu, 0);
    }
}
