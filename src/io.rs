// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Capability ports the VM calls into, but does not implement
//!
//! A host hands the VM an [Io] bundle at construction. Every port method takes
//! `&self`, so a host (or a test) can keep its own reference to a port and
//! inspect it while the VM is alive.

use crate::error::{Error, Result};
use std::{cell::Cell, fmt::Debug};

/// Reports the state of the hexadecimal keypad
pub trait Input {
    /// Returns true if hex key `key` (`0x0..=0xF`) is held down
    fn is_key_down(&self, key: u8) -> bool;
}

/// Receives changes to the display buffer
///
/// Both methods default to doing nothing, so a renderer that redraws the
/// whole [Screen](crate::Screen) each frame can ignore the pixel stream.
pub trait Output {
    /// A pixel at (`x`, `y`) was toggled, and is now `color`
    fn draw(&self, _x: usize, _y: usize, _color: bool) {}
    /// The screen was cleared
    fn clear(&self) {}
}

/// Plays the CHIP-8 tone
pub trait Audio {
    /// Starts the tone
    fn start(&self);
    /// Stops the tone
    fn stop(&self);
}

/// The set of ports a [Chip8](crate::Chip8) talks to
#[derive(Clone, Copy)]
pub struct Io<'a> {
    /// Keypad state
    pub input: &'a dyn Input,
    /// Pixel and clear notifications
    pub output: &'a dyn Output,
    /// Tone start/stop
    pub audio: &'a dyn Audio,
}

impl<'a> Io<'a> {
    /// Bundles three ports together
    pub fn new(input: &'a dyn Input, output: &'a dyn Output, audio: &'a dyn Audio) -> Self {
        Io {
            input,
            output,
            audio,
        }
    }
}

impl Default for Io<'static> {
    /// Every port is [Headless]
    fn default() -> Self {
        Io::new(&Headless, &Headless, &Headless)
    }
}

impl Debug for Io<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Io").finish_non_exhaustive()
    }
}

/// A port that does nothing: no keys are ever down, and all output is discarded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Headless;

impl Input for Headless {
    fn is_key_down(&self, _key: u8) -> bool {
        false
    }
}

impl Output for Headless {}

impl Audio for Headless {
    fn start(&self) {}
    fn stop(&self) {}
}

/// A keypad of sixteen keys, which the host presses and releases
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keys {
    held: Cell<u16>,
}

impl Keys {
    /// Creates a keypad with no keys held
    pub fn new() -> Self {
        Self::default()
    }

    /// Presses a key, and reports whether the key's state changed.
    /// If key does not exist, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let keys = Keys::new();
    ///
    /// // press key `7`
    /// let did_press = keys.press(0x7).unwrap();
    /// assert!(did_press);
    ///
    /// // press key `7` again, even though it's already pressed
    /// let did_press = keys.press(0x7).unwrap();
    /// // it was already pressed, so nothing's changed.
    /// assert!(!did_press);
    /// ```
    pub fn press(&self, key: usize) -> Result<bool> {
        let mask = Self::mask(key)?;
        let held = self.held.get();
        self.held.set(held | mask);
        Ok(held & mask == 0)
    }

    /// Releases a key, and reports whether the key's state changed.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let keys = Keys::new();
    /// // press key `7`
    /// keys.press(0x7).unwrap();
    /// // release key `7`
    /// let changed = keys.release(0x7).unwrap();
    /// assert!(changed); // key released
    /// // try releasing `7` again
    /// let changed = keys.release(0x7).unwrap();
    /// assert!(!changed); // key was not held
    /// ```
    pub fn release(&self, key: usize) -> Result<bool> {
        let mask = Self::mask(key)?;
        let held = self.held.get();
        self.held.set(held & !mask);
        Ok(held & mask != 0)
    }

    /// Releases every key
    pub fn release_all(&self) {
        self.held.set(0);
    }

    fn mask(key: usize) -> Result<u16> {
        match key {
            0..=0xf => Ok(1 << key),
            _ => Err(Error::InvalidKey { key }),
        }
    }
}

impl Input for Keys {
    fn is_key_down(&self, key: u8) -> bool {
        self.held.get() & (1 << (key & 0xf)) != 0
    }
}
