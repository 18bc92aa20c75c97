// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Contains implementations for each Chip-8 [Insn]

use super::*;
use rand::random;

/// Where the program counter goes after an instruction executes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Continue to the next instruction (pc + 2)
    Next,
    /// Skip the next instruction (pc + 4)
    Skip,
    /// Go to an absolute address
    Jump(Adr),
    /// Stay on this instruction until a key is pressed
    Wait,
}

impl Flow {
    /// Skips the next instruction if `condition` holds
    #[inline(always)]
    fn skip_if(condition: bool) -> Self {
        if condition {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

impl CPU {
    /// Executes a single [Insn]
    #[rustfmt::skip]
    #[inline(always)]
    pub(super) fn execute(&mut self, instruction: Insn, io: &Io) -> Result<Flow> {
        Ok(match instruction {
            Insn::cls               => self.clear_screen(io),
            Insn::ret               => self.ret()?,
            Insn::jp    {       A } => self.jump(A),
            Insn::call  {       A } => self.call(A)?,
            Insn::seb   {    x, B } => self.skip_equals_immediate(x, B),
            Insn::sneb  {    x, B } => self.skip_not_equals_immediate(x, B),
            Insn::se    { y, x    } => self.skip_equals(x, y),
            Insn::ldb   {    x, B } => self.load_immediate(x, B),
            Insn::addb  {    x, B } => self.add_immediate(x, B),
            Insn::ld    { y, x    } => self.load(x, y),
            Insn::or    { y, x    } => self.or(x, y),
            Insn::and   { y, x    } => self.and(x, y),
            Insn::xor   { y, x    } => self.xor(x, y),
            Insn::add   { y, x    } => self.add(x, y),
            Insn::sub   { y, x    } => self.sub(x, y),
            Insn::shr   {    x, ..} => self.shift_right(x),
            Insn::subn  { y, x    } => self.backwards_sub(x, y),
            Insn::shl   {    x, ..} => self.shift_left(x),
            Insn::sne   { y, x    } => self.skip_not_equals(x, y),
            Insn::ldi   {       A } => self.load_i_immediate(A),
            Insn::jpr   {       A } => self.jump_indexed(A),
            Insn::rnd   {    x, B } => self.rand(x, B),
            Insn::drw   { y, x, n } => self.draw(x, y, n, io),
            Insn::skp   {    x    } => self.skip_key_equals(x, io),
            Insn::sknp  {    x    } => self.skip_key_not_equals(x, io),
            Insn::lddt  {    x    } => self.load_delay_timer(x),
            Insn::ldk   {    x    } => self.wait_for_key(x),
            Insn::setdt {    x    } => self.store_delay_timer(x),
            Insn::setst {    x    } => self.store_sound_timer(x, io),
            Insn::addi  {    x    } => self.add_i(x),
            Insn::font  {    x    } => self.load_sprite(x),
            Insn::bcd   {    x    } => self.bcd_convert(x),
            Insn::store {    x    } => self.store_dma(x),
            Insn::load  {    x    } => self.load_dma(x),
        })
    }
}

/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`00e0`| Clear screen memory to all 0       |
/// |`00ee`| Return from subroutine             |
impl CPU {
    /// |`00e0`| Clears the screen memory to 0
    #[inline(always)]
    pub(super) fn clear_screen(&mut self, io: &Io) -> Flow {
        self.screen.clear();
        io.output.clear();
        Flow::Next
    }
    /// |`00ee`| Returns from subroutine
    ///
    /// The return address already points past the call
    #[inline(always)]
    pub(super) fn ret(&mut self) -> Result<Flow> {
        match self.stack.pop() {
            Some(addr) => Ok(Flow::Jump(addr)),
            None => Err(Error::StackUnderflow { addr: self.pc }),
        }
    }
}

/// |`1aaa`| Sets pc to an absolute address
impl CPU {
    /// |`1aaa`| Sets the program counter to an absolute address
    #[inline(always)]
    pub(super) fn jump(&mut self, a: Adr) -> Flow {
        Flow::Jump(a)
    }
}

/// |`2aaa`| Pushes pc onto the stack, then jumps to a
impl CPU {
    /// |`2aaa`| Pushes the address of the next instruction onto the stack, then jumps to a
    #[inline(always)]
    pub(super) fn call(&mut self, a: Adr) -> Result<Flow> {
        if self.stack.len() >= STACK_DEPTH {
            return Err(Error::StackOverflow { addr: self.pc });
        }
        self.stack.push(self.pc.wrapping_add(2) & 0xfff);
        Ok(Flow::Jump(a))
    }
}

/// |`3xbb`| Skips next instruction if register X == b
impl CPU {
    /// |`3xbb`| Skips the next instruction if register X == b
    #[inline(always)]
    pub(super) fn skip_equals_immediate(&mut self, x: Reg, b: u8) -> Flow {
        Flow::skip_if(self.v[x] == b)
    }
}

/// |`4xbb`| Skips next instruction if register X != b
impl CPU {
    /// |`4xbb`| Skips the next instruction if register X != b
    #[inline(always)]
    pub(super) fn skip_not_equals_immediate(&mut self, x: Reg, b: u8) -> Flow {
        Flow::skip_if(self.v[x] != b)
    }
}

/// |`5xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`5XY0`| Skip next instruction if vX == vY  |
impl CPU {
    /// |`5xy0`| Skips the next instruction if register X == register Y
    #[inline(always)]
    pub(super) fn skip_equals(&mut self, x: Reg, y: Reg) -> Flow {
        Flow::skip_if(self.v[x] == self.v[y])
    }
}

/// |`6xbb`| Loads immediate byte b into register vX
impl CPU {
    /// |`6xbb`| Loads immediate byte b into register vX
    #[inline(always)]
    pub(super) fn load_immediate(&mut self, x: Reg, b: u8) -> Flow {
        self.v[x] = b;
        Flow::Next
    }
}

/// |`7xbb`| Adds immediate byte b to register vX
impl CPU {
    /// |`7xbb`| Adds immediate byte b to register vX. Does not set vF.
    #[inline(always)]
    pub(super) fn add_immediate(&mut self, x: Reg, b: u8) -> Flow {
        self.v[x] = self.v[x].wrapping_add(b);
        Flow::Next
    }
}

/// |`8xyn`| Performs ALU operation
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`8xy0`| X = Y                              |
/// |`8xy1`| X = X | Y                          |
/// |`8xy2`| X = X & Y                          |
/// |`8xy3`| X = X ^ Y                          |
/// |`8xy4`| X = X + Y; Set vF=carry            |
/// |`8xy5`| X = X - Y; Set vF=!borrow          |
/// |`8xy6`| X = X >> 1; Set vF=shifted out bit |
/// |`8xy7`| X = Y - X; Set vF=!borrow          |
/// |`8xyE`| X = X << 1; Set vF=shifted out bit |
///
/// Flags are written after the result, so when X is vF, vF holds the flag.
impl CPU {
    /// |`8xy0`| Loads the value of y into x
    #[inline(always)]
    pub(super) fn load(&mut self, x: Reg, y: Reg) -> Flow {
        self.v[x] = self.v[y];
        Flow::Next
    }
    /// |`8xy1`| Performs bitwise or of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn or(&mut self, x: Reg, y: Reg) -> Flow {
        self.v[x] |= self.v[y];
        Flow::Next
    }
    /// |`8xy2`| Performs bitwise and of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn and(&mut self, x: Reg, y: Reg) -> Flow {
        self.v[x] &= self.v[y];
        Flow::Next
    }
    /// |`8xy3`| Performs bitwise xor of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn xor(&mut self, x: Reg, y: Reg) -> Flow {
        self.v[x] ^= self.v[y];
        Flow::Next
    }
    /// |`8xy4`| Performs addition of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn add(&mut self, x: Reg, y: Reg) -> Flow {
        let sum = self.v[x] as u16 + self.v[y] as u16;
        self.v[x] = sum as u8;
        self.v[0xf] = (sum > 0xff).into();
        Flow::Next
    }
    /// |`8xy5`| Performs subtraction of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn sub(&mut self, x: Reg, y: Reg) -> Flow {
        let (a, b) = (self.v[x], self.v[y]);
        self.v[x] = a.wrapping_sub(b);
        self.v[0xf] = (a > b).into();
        Flow::Next
    }
    /// |`8xy6`| Performs bitwise right shift of vX
    #[inline(always)]
    pub(super) fn shift_right(&mut self, x: Reg) -> Flow {
        let shift_out = self.v[x] & 1;
        self.v[x] >>= 1;
        self.v[0xf] = shift_out;
        Flow::Next
    }
    /// |`8xy7`| Performs subtraction of vX from vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn backwards_sub(&mut self, x: Reg, y: Reg) -> Flow {
        let (a, b) = (self.v[x], self.v[y]);
        self.v[x] = b.wrapping_sub(a);
        self.v[0xf] = (b > a).into();
        Flow::Next
    }
    /// |`8xyE`| Performs bitwise left shift of vX
    #[inline(always)]
    pub(super) fn shift_left(&mut self, x: Reg) -> Flow {
        let shift_out = self.v[x] >> 7;
        self.v[x] <<= 1;
        self.v[0xf] = shift_out;
        Flow::Next
    }
}

/// |`9xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`9XY0`| Skip next instruction if vX != vY  |
impl CPU {
    /// |`9xy0`| Skip next instruction if X != y
    #[inline(always)]
    pub(super) fn skip_not_equals(&mut self, x: Reg, y: Reg) -> Flow {
        Flow::skip_if(self.v[x] != self.v[y])
    }
}

/// |`Aaaa`| Load address #a into register I
impl CPU {
    /// |`Aadr`| Load address #adr into register I
    #[inline(always)]
    pub(super) fn load_i_immediate(&mut self, a: Adr) -> Flow {
        self.i = a & 0xfff;
        Flow::Next
    }
}

/// |`Baaa`| Jump to &adr + v0
impl CPU {
    /// |`Badr`| Jump to &adr + v0, wrapping around the end of memory
    #[inline(always)]
    pub(super) fn jump_indexed(&mut self, a: Adr) -> Flow {
        Flow::Jump(a.wrapping_add(self.v[0] as Adr) & 0xfff)
    }
}

/// |`Cxbb`| Stores a random number & the provided byte into vX
impl CPU {
    /// |`Cxbb`| Stores a random number & the provided byte into vX
    #[inline(always)]
    pub(super) fn rand(&mut self, x: Reg, b: u8) -> Flow {
        self.v[x] = random::<u8>() & b;
        Flow::Next
    }
}

/// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
impl CPU {
    /// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
    ///
    /// The sprite is read from memory at I. vF is set to 1 if any pixel was erased.
    #[inline(always)]
    pub(super) fn draw(&mut self, x: Reg, y: Reg, n: Nib, io: &Io) -> Flow {
        let mut sprite = [0u8; 0x10];
        let sprite = &mut sprite[..n as usize];
        for (line, byte) in sprite.iter_mut().zip(self.mem.bytes(self.i, n as usize)) {
            *line = byte;
        }
        let collision = self.screen.draw(self.v[x], self.v[y], sprite, io.output);
        self.v[0xf] = collision.into();
        Flow::Next
    }
}

/// |`Exbb`| Skips instruction on value of keypress
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`eX9e`| Skip next instruction if key == vX |
/// |`eXa1`| Skip next instruction if key != vX |
impl CPU {
    /// |`Ex9E`| Skip next instruction if key == vX
    #[inline(always)]
    pub(super) fn skip_key_equals(&mut self, x: Reg, io: &Io) -> Flow {
        Flow::skip_if(io.input.is_key_down(self.v[x] & 0xf))
    }
    /// |`ExA1`| Skip next instruction if key != vX
    #[inline(always)]
    pub(super) fn skip_key_not_equals(&mut self, x: Reg, io: &Io) -> Flow {
        Flow::skip_if(!io.input.is_key_down(self.v[x] & 0xf))
    }
}

/// |`Fxbb`| Performs IO
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`fX07`| Set vX to value in delay timer     |
/// |`fX0a`| Wait for input, store key in vX    |
/// |`fX15`| Set delay timer to the value in vX |
/// |`fX18`| Set sound timer to the value in vX |
/// |`fX1e`| Add vX to I                        |
/// |`fX29`| Load sprite for character x into I |
/// |`fX33`| BCD convert X into I[0..3]         |
/// |`fX55`| DMA Stor from I to registers 0..=X |
/// |`fX65`| DMA Load from I to registers 0..=X |
impl CPU {
    /// |`Fx07`| Get the current DT, and put it in vX
    /// ```py
    /// vX = DT
    /// ```
    #[inline(always)]
    pub(super) fn load_delay_timer(&mut self, x: Reg) -> Flow {
        self.v[x] = self.timers.delay();
        Flow::Next
    }
    /// |`Fx0A`| Wait for key, then vX = K
    ///
    /// The key is delivered by [CPU::resolve_keypress]
    #[inline(always)]
    pub(super) fn wait_for_key(&mut self, x: Reg) -> Flow {
        self.state = State::Halted { target: x };
        Flow::Wait
    }
    /// |`Fx15`| Load vX into DT
    /// ```py
    /// DT = vX
    /// ```
    #[inline(always)]
    pub(super) fn store_delay_timer(&mut self, x: Reg) -> Flow {
        self.timers.set_delay(self.v[x]);
        Flow::Next
    }
    /// |`Fx18`| Load vX into ST
    /// ```py
    /// ST = vX;
    /// ```
    /// Starts the tone if vX is nonzero, and stops a playing tone if it's zero.
    #[inline(always)]
    pub(super) fn store_sound_timer(&mut self, x: Reg, io: &Io) -> Flow {
        let previous = self.timers.set_sound(self.v[x]);
        if self.v[x] > 0 {
            io.audio.start();
        } else if previous > 0 {
            io.audio.stop();
        }
        Flow::Next
    }
    /// |`Fx1e`| Add vX to I,
    /// ```py
    /// I += vX;
    /// vF = I > 0xfff
    /// ```
    /// # Quirk
    /// Some interpreters leave vF alone
    #[inline(always)]
    pub(super) fn add_i(&mut self, x: Reg) -> Flow {
        let sum = self.i + self.v[x] as Adr;
        self.i = sum & 0xfff;
        if !self.flags.quirks.add_i_flag {
            self.v[0xf] = (sum > 0xfff).into();
        }
        Flow::Next
    }
    /// |`Fx29`| Load sprite for character x into I
    /// ```py
    /// I = sprite(X);
    /// ```
    #[inline(always)]
    pub(super) fn load_sprite(&mut self, x: Reg) -> Flow {
        self.i = self.font + (5 * (self.v[x] as Adr % 0x10));
        Flow::Next
    }
    /// |`Fx33`| BCD convert X into I`[0..3]`
    #[inline(always)]
    pub(super) fn bcd_convert(&mut self, x: Reg) -> Flow {
        let x = self.v[x];
        let i = self.i as usize;
        self.mem.write(i + 2, x % 10);
        self.mem.write(i + 1, x / 10 % 10);
        self.mem.write(i, x / 100 % 10);
        Flow::Next
    }
    /// |`Fx55`| DMA Stor from I to registers 0..=X
    ///
    /// # Quirk
    /// The original chip-8 interpreter uses I to directly index memory,
    /// with the side effect of leaving I as I+X+1 after the transfer is done.
    #[inline(always)]
    pub(super) fn store_dma(&mut self, x: Reg) -> Flow {
        let i = self.i as usize;
        for (reg, &value) in self.v[..=x].iter().enumerate() {
            self.mem.write(i + reg, value);
        }
        self.advance_dma(x)
    }
    /// |`Fx65`| DMA Load from I to registers 0..=X
    ///
    /// # Quirk
    /// The original chip-8 interpreter uses I to directly index memory,
    /// with the side effect of leaving I as I+X+1 after the transfer is done.
    #[inline(always)]
    pub(super) fn load_dma(&mut self, x: Reg) -> Flow {
        for (reg, value) in self.mem.bytes(self.i, x + 1).enumerate() {
            self.v[reg] = value;
        }
        self.advance_dma(x)
    }
    #[inline(always)]
    fn advance_dma(&mut self, x: Reg) -> Flow {
        if !self.flags.quirks.dma_inc {
            self.i = (self.i + x as Adr + 1) & 0xfff;
        }
        Flow::Next
    }
}
