// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Stores and displays the Chip-8's screen memory

use crate::io::Output;
use std::fmt::{Display, Formatter, Result};

/// Width of the screen, in pixels
pub const WIDTH: usize = 64;
/// Height of the screen, in pixels
pub const HEIGHT: usize = 32;

/// The 64x32 monochrome display buffer
///
/// Each row is one [u64], with the leftmost pixel in the most significant bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Screen {
    rows: [u64; HEIGHT],
}

impl Screen {
    /// Creates a blank screen
    pub fn new() -> Self {
        Screen { rows: [0; HEIGHT] }
    }

    /// Width of the screen, in pixels
    pub fn width(&self) -> usize {
        WIDTH
    }

    /// Height of the screen, in pixels
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Sets every pixel to 0
    pub fn clear(&mut self) {
        self.rows = [0; HEIGHT];
    }

    /// Returns true if no pixel is set
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|&row| row == 0)
    }

    /// Gets the pixel at (`x`, `y`), wrapping around the edges
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let screen = Screen::new();
    /// assert!(!screen.get(3, 4));
    /// assert_eq!(screen.get(3, 4), screen.get(64 + 3, 32 + 4));
    /// ```
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.rows[y % HEIGHT] & Self::column(x % WIDTH) != 0
    }

    /// Gets the rows of the screen, leftmost pixel in the most significant bit
    pub fn rows(&self) -> &[u64; HEIGHT] {
        &self.rows
    }

    /// Iterates over every pixel as `(x, y, color)`, in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, &row)| {
            (0..WIDTH).map(move |x| (x, y, row & Self::column(x) != 0))
        })
    }

    /// XORs an 8-pixel-wide sprite onto the screen at (`x`, `y`).
    ///
    /// The origin is taken modulo the screen size, and each pixel of the sprite
    /// wraps around the edges independently. Every toggled pixel is reported to
    /// `output`.
    ///
    /// Returns true if any set pixel was cleared.
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let mut screen = Screen::new();
    /// assert!(!screen.draw(62, 0, &[0xff], &Headless));
    /// // The sprite wraps around to the left edge
    /// assert!(screen.get(63, 0) && screen.get(0, 0) && screen.get(5, 0));
    /// assert!(!screen.get(6, 0));
    /// // Drawing it again erases it, and reports a collision
    /// assert!(screen.draw(62, 0, &[0xff], &Headless));
    /// assert!(screen.is_blank());
    /// ```
    pub fn draw(&mut self, x: u8, y: u8, sprite: &[u8], output: &dyn Output) -> bool {
        let (x, y) = (x as usize % WIDTH, y as usize % HEIGHT);
        let mut collision = false;
        for (line, &byte) in sprite.iter().enumerate() {
            let py = (y + line) % HEIGHT;
            // Rotating (rather than shifting) wraps each pixel to the left edge
            let sprite = ((byte as u64) << (WIDTH - 8)).rotate_right(x as u32);
            let display = self.rows[py];
            self.rows[py] = display ^ sprite;
            collision |= display & sprite != 0;
            for px in (0..WIDTH).filter(|&px| sprite & Self::column(px) != 0) {
                output.draw(px, py, display & Self::column(px) == 0);
            }
        }
        collision
    }

    /// Prints the screen to stdout
    ///
    /// Uses braille characters when the `drawille` feature is enabled.
    pub fn print_screen(&self) {
        // draw with the drawille library, if available
        #[cfg(feature = "drawille")]
        {
            use drawille::Canvas;
            let mut canvas = Canvas::new(WIDTH as u32, HEIGHT as u32);
            self.pixels()
                .filter(|&(_, _, color)| color)
                .for_each(|(x, y, _)| canvas.set(x as u32, y as u32));
            println!("{}", canvas.frame());
        }
        #[cfg(not(feature = "drawille"))]
        print!("{self}");
    }

    #[inline(always)]
    fn column(x: usize) -> u64 {
        1 << (WIDTH - 1 - x)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for (index, row) in self.rows.iter().enumerate() {
            writeln!(
                f,
                "{index:02x}|{}|",
                format!("{row:064b}").replace('0', " ").replace('1', "█")
            )?;
        }
        Ok(())
    }
}
