/// Number of keys on the hex keypad.
pub const KEY_COUNT: u8 = 16;

/// Direction of a key event coming from the frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Down,
    Up,
}

/// Input system for the `Chip8`.
///
/// The keypad is level triggered: it remembers the last key that went
/// down and whether it is still held. Key downs are also latched so that
/// `Fx0A` only reacts to presses that happen while it is waiting.
#[derive(Clone, Debug, Default)]
pub struct Keypad {
    current_key: Option<u8>,
    pressed: bool,
    latched: Option<u8>,
}

impl Keypad {
    /// Create a new [`Keypad`] with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Codes outside `0..16` are ignored.
    pub fn on_key_down(&mut self, key: u8) {
        if key >= KEY_COUNT {
            log::debug!("Ignoring key down for invalid key code {key:#X}");
            return;
        }
        self.current_key = Some(key);
        self.pressed = true;
        self.latched = Some(key);
    }

    /// Record a key release. The last known key is kept.
    pub fn on_key_up(&mut self, key: u8) {
        if key >= KEY_COUNT {
            log::debug!("Ignoring key up for invalid key code {key:#X}");
            return;
        }
        self.pressed = false;
    }

    /// Update the state of `key` from a frontend event.
    pub fn update(&mut self, key: u8, event: KeyEvent) {
        match event {
            KeyEvent::Down => self.on_key_down(key),
            KeyEvent::Up => self.on_key_up(key),
        }
    }

    /// The last key that went down, if any.
    pub fn current_key(&self) -> Option<u8> {
        self.current_key
    }

    /// Whether the last key that went down is still held.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Returns whether the given key is currently held.
    pub fn is_key_pressed(&self, key: u8) -> bool {
        self.pressed && self.current_key == Some(key)
    }

    /// Forget any latched press, so only fresh presses are reported.
    pub fn clear_latch(&mut self) {
        self.latched = None;
    }

    /// Consume the key press latched since the last call, if any.
    pub fn take_key_press(&mut self) -> Option<u8> {
        self.latched.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_and_up() {
        let mut keypad = Keypad::new();
        keypad.on_key_down(0xA);
        assert!(keypad.is_key_pressed(0xA));
        assert!(!keypad.is_key_pressed(0xB));

        keypad.on_key_up(0xA);
        assert!(!keypad.is_key_pressed(0xA));
        assert!(!keypad.is_pressed());
        // the last key is remembered
        assert_eq!(keypad.current_key(), Some(0xA));
    }

    #[test]
    fn test_invalid_keys_ignored() {
        let mut keypad = Keypad::new();
        keypad.on_key_down(16);
        assert_eq!(keypad.current_key(), None);
        assert!(!keypad.is_pressed());

        keypad.on_key_down(3);
        keypad.on_key_up(200);
        assert!(keypad.is_key_pressed(3));
    }

    #[test]
    fn test_latch() {
        let mut keypad = Keypad::new();
        keypad.update(5, KeyEvent::Down);
        keypad.clear_latch();
        assert_eq!(keypad.take_key_press(), None);

        keypad.update(5, KeyEvent::Up);
        keypad.update(7, KeyEvent::Down);
        assert_eq!(keypad.take_key_press(), Some(7));
        assert_eq!(keypad.take_key_press(), None);
    }
}
