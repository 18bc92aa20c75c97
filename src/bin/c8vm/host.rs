// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Terminal implementations of the VM's ports

use c8vm::{Audio, Output};
use std::{cell::Cell, io::Write};

/// Rings the terminal bell when the tone starts
#[derive(Debug, Default)]
pub struct Bell {
    playing: Cell<bool>,
}

impl Audio for Bell {
    fn start(&self) {
        if !self.playing.replace(true) {
            let mut stderr = std::io::stderr();
            // The bell is best-effort
            let _ = stderr.write_all(b"\x07").and_then(|_| stderr.flush());
        }
    }
    fn stop(&self) {
        self.playing.set(false);
    }
}

/// Remembers whether the screen has changed since it was last printed
#[derive(Debug, Default)]
pub struct Dirty(Cell<bool>);

impl Dirty {
    /// Returns true if the screen changed, and marks it clean
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

impl Output for Dirty {
    fn draw(&self, _x: usize, _y: usize, _color: bool) {
        self.0.set(true);
    }
    fn clear(&self) {
        self.0.set(true);
    }
}
