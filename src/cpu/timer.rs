// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The delay and sound timers, which count down at 60Hz

/// Two independent 8-bit countdown timers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Timers {
    delay: u8,
    sound: u8,
}

impl Timers {
    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.sound
    }

    /// Sets the Delay Timer
    pub fn set_delay(&mut self, value: u8) {
        self.delay = value;
    }

    /// Sets the Sound Timer, returning its previous value
    pub fn set_sound(&mut self, value: u8) -> u8 {
        std::mem::replace(&mut self.sound, value)
    }

    /// Counts both timers down by one, stopping at zero.
    ///
    /// Returns true if the sound timer reached zero on this tick.
    /// # Examples
    /// ```rust
    /// # use c8vm::cpu::timer::Timers;
    /// let mut timers = Timers::default();
    /// timers.set_sound(2);
    /// assert!(!timers.tick());
    /// assert!(timers.tick());
    /// // It's already zero, so it doesn't reach zero again
    /// assert!(!timers.tick());
    /// ```
    pub fn tick(&mut self) -> bool {
        self.delay = self.delay.saturating_sub(1);
        match self.sound {
            0 => false,
            sound => {
                self.sound = sound - 1;
                self.sound == 0
            }
        }
    }
}
