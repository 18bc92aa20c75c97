//! Runs small Chip-8 programs through the public API, and watches the ports
use c8vm::*;
use std::cell::{Cell, RefCell};

/// A host which remembers everything the VM told it
#[derive(Debug, Default)]
struct Host {
    keys: Keys,
    pixels: RefCell<Vec<(usize, usize, bool)>>,
    clears: Cell<usize>,
    tone: Cell<bool>,
    starts: Cell<usize>,
    stops: Cell<usize>,
}

impl Host {
    fn io(&self) -> Io {
        Io::new(self, self, self)
    }
}

impl Input for Host {
    fn is_key_down(&self, key: u8) -> bool {
        self.keys.is_key_down(key)
    }
}

impl Output for Host {
    fn draw(&self, x: usize, y: usize, color: bool) {
        self.pixels.borrow_mut().push((x, y, color));
    }
    fn clear(&self) {
        self.clears.set(self.clears.get() + 1);
    }
}

impl Audio for Host {
    fn start(&self) {
        self.tone.set(true);
        self.starts.set(self.starts.get() + 1);
    }
    fn stop(&self) {
        self.tone.set(false);
        self.stops.set(self.stops.get() + 1);
    }
}

fn run(host: &Host, program: &[u8], steps: usize) -> Result<CPU> {
    let mut ch8 = Chip8::new(host.io());
    ch8.load_program_bytes(program)?;
    for _ in 0..steps {
        ch8.step()?;
    }
    Ok(ch8.cpu)
}

mod arithmetic {
    use super::*;

    /// ADD vX, vY for every pair of bytes
    #[test]
    fn add() -> Result<()> {
        let io = Io::default();
        let mut cpu = CPU::default();
        cpu.load_program_bytes(&[0x8a, 0xb4], &io)?; // add vA, vB
        for a in 0..=0xff {
            for b in 0..=0xff {
                cpu.reset(&io);
                cpu.set_v(0xa, a)?;
                cpu.set_v(0xb, b)?;
                cpu.step(&io)?;
                assert_eq!(cpu.v()[0xa], a.wrapping_add(b));
                assert_eq!(cpu.v()[0xf], (a as u16 + b as u16 > 0xff) as u8);
            }
        }
        Ok(())
    }

    /// SUB vX, vY for every pair of bytes
    #[test]
    fn sub() -> Result<()> {
        let io = Io::default();
        let mut cpu = CPU::default();
        cpu.load_program_bytes(&[0x8a, 0xb5], &io)?; // sub vA, vB
        for a in 0..=0xff {
            for b in 0..=0xff {
                cpu.reset(&io);
                cpu.set_v(0xa, a)?;
                cpu.set_v(0xb, b)?;
                cpu.step(&io)?;
                assert_eq!(cpu.v()[0xa], a.wrapping_sub(b));
                assert_eq!(cpu.v()[0xf], (a > b) as u8);
            }
        }
        Ok(())
    }

    /// SHR on zero stays zero, and shifts nothing out
    #[test]
    fn shr_zero() -> Result<()> {
        let host = Host::default();
        let cpu = run(&host, &[0x83, 0x06, 0x83, 0x06], 2)?;
        assert_eq!(0, cpu.v()[3]);
        assert_eq!(0, cpu.v()[0xf]);
        Ok(())
    }

    #[test]
    fn load_then_add() -> Result<()> {
        let host = Host::default();
        let cpu = run(
            &host,
            &[
                0x6b, 0x0a, // ld  vB, #0a
                0x6a, 0x05, // ld  vA, #05
                0x8a, 0xb4, // add vA, vB
            ],
            3,
        )?;
        assert_eq!(15, cpu.v()[0xa]);
        assert_eq!(0, cpu.v()[0xf]);
        assert_eq!(0x206, cpu.pc());
        Ok(())
    }

    #[test]
    fn load_i() -> Result<()> {
        let host = Host::default();
        let cpu = run(&host, &[0xa1, 0x23], 1)?;
        assert_eq!(0x123, cpu.i());
        Ok(())
    }
}

mod display {
    use super::*;

    /// Draws one row of eight pixels at the origin, twice
    #[test]
    fn draw_twice() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[
            0xa2, 0x08, // 200: ld  I, $208
            0xd0, 0x01, // 202: drw v0, v0, #1
            0xd0, 0x01, // 204: drw v0, v0, #1
            0x12, 0x06, // 206: jp  $206
            0xff, 0x00, // 208: sprite
        ])?;
        ch8.multistep(2)?;
        let screen = ch8.cpu.screen();
        assert!((0..8).all(|x| screen.get(x, 0)));
        assert!(!screen.get(8, 0));
        assert_eq!(0, ch8.cpu.v()[0xf]);
        assert_eq!(8, host.pixels.borrow().len());

        ch8.step()?;
        assert!(ch8.cpu.screen().is_blank());
        assert_eq!(1, ch8.cpu.v()[0xf]);
        assert_eq!(16, host.pixels.borrow().len());
        assert!(host.pixels.borrow()[8..].iter().all(|&(_, _, color)| !color));
        Ok(())
    }

    /// Sprites wrap around both edges of the screen, pixel by pixel
    #[test]
    fn draw_wraps() -> Result<()> {
        let host = Host::default();
        let cpu = run(
            &host,
            &[
                0x60, 0x3e, // ld  v0, #3e (62)
                0x61, 0x1f, // ld  v1, #1f (31)
                0xa2, 0x0a, // ld  I, $20a
                0xd0, 0x12, // drw v0, v1, #2
                0x12, 0x08, // jp  $208
                0xc0, 0xc0, // sprite
            ],
            4,
        )?;
        let screen = cpu.screen();
        for (x, y) in [(62, 31), (63, 31), (62, 0), (63, 0)] {
            assert!(screen.get(x, y), "({x}, {y}) should be lit");
        }
        assert_eq!(4, screen.pixels().filter(|&(_, _, on)| on).count());
        Ok(())
    }

    /// Coordinates past the edge of the screen are reduced before drawing
    #[test]
    fn draw_reduces_origin() -> Result<()> {
        let host = Host::default();
        let cpu = run(
            &host,
            &[
                0x60, 0x45, // ld  v0, #45 (69)
                0x61, 0x22, // ld  v1, #22 (34)
                0xf2, 0x29, // ld  F, v2
                0xd0, 0x15, // drw v0, v1, #5
            ],
            4,
        )?;
        // The "0" glyph, drawn at (5, 2)
        let screen = cpu.screen();
        assert!((5..9).all(|x| screen.get(x, 2) && screen.get(x, 6)));
        assert!((3..6).all(|y| screen.get(5, y) && screen.get(8, y)));
        assert!(!screen.get(6, 4));
        Ok(())
    }

    #[test]
    fn clear() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[
            0xf0, 0x29, // ld  F, v0
            0xd0, 0x05, // drw v0, v0, #5
            0x00, 0xe0, // cls
        ])?;
        // loading the program reset the vm, which cleared the screen
        assert_eq!(1, host.clears.get());
        ch8.step()?.step()?;
        assert!(!ch8.cpu.screen().is_blank());
        ch8.step()?;
        assert!(ch8.cpu.screen().is_blank());
        assert_eq!(2, host.clears.get());
        Ok(())
    }
}

mod control_flow {
    use super::*;

    /// Sixteen nested calls are fine. The seventeenth isn't.
    #[test]
    fn stack_depth() -> Result<()> {
        let host = Host::default();
        // Each call calls the next instruction
        let program: Vec<u8> = (0..=STACK_DEPTH as u16)
            .flat_map(|n| (0x2000 | (0x202 + 2 * n)).to_be_bytes())
            .collect();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&program)?;
        ch8.multistep(STACK_DEPTH)?;
        assert_eq!(STACK_DEPTH, ch8.cpu.stack().len());
        let pc = ch8.cpu.pc();
        match ch8.step() {
            Err(Error::StackOverflow { addr }) => assert_eq!(pc, addr),
            other => panic!("Expected a stack overflow, got {other:?}"),
        }
        // The faulting call is still next
        assert_eq!(pc, ch8.cpu.pc());
        Ok(())
    }

    /// Sixteen nested calls unwind in reverse, then one more return underflows
    #[test]
    fn nested_calls_unwind() -> Result<()> {
        let host = Host::default();
        // 200: jp $300
        // 3n0: call $3n0 + $10
        // 3n2: ret
        // 400: ret
        let mut program = vec![0; 0x202];
        program[0..2].copy_from_slice(&[0x13, 0x00]);
        for n in 0..STACK_DEPTH {
            let at = 0x100 + 0x10 * n;
            let target = (0x2000 | (0x310 + 0x10 * n)) as u16;
            program[at..at + 2].copy_from_slice(&target.to_be_bytes());
            program[at + 2..at + 4].copy_from_slice(&[0x00, 0xee]);
        }
        program[0x200..0x202].copy_from_slice(&[0x00, 0xee]);

        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&program)?;
        for _ in 0..=STACK_DEPTH {
            ch8.step()?;
        }
        let pushed: Vec<u16> = (0..STACK_DEPTH as u16).map(|n| 0x302 + 0x10 * n).collect();
        assert_eq!(pushed, ch8.cpu.stack());
        assert_eq!(0x400, ch8.cpu.pc());

        let mut returns = vec![];
        for _ in 0..STACK_DEPTH {
            ch8.step()?;
            returns.push(ch8.cpu.pc());
        }
        assert_eq!(pushed.into_iter().rev().collect::<Vec<_>>(), returns);
        assert!(ch8.cpu.stack().is_empty());

        match ch8.step() {
            Err(Error::StackUnderflow { addr: 0x302 }) => {}
            other => panic!("Expected a stack underflow, got {other:?}"),
        }
        assert_eq!(0x302, ch8.cpu.pc());
        Ok(())
    }

    #[test]
    fn stack_underflow() {
        let host = Host::default();
        match run(&host, &[0x00, 0xee], 1) {
            Err(Error::StackUnderflow { addr: 0x200 }) => {}
            other => panic!("Expected a stack underflow, got {other:?}"),
        }
    }

    #[test]
    fn unknown_instruction() {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[0x60, 0x01, 0x80, 0x0f]).unwrap();
        ch8.step().unwrap();
        let error = ch8.step().unwrap_err();
        assert!(matches!(
            error,
            Error::UnknownInstruction {
                word: 0x800f,
                addr: 0x202
            }
        ));
        assert_eq!("opcode 800f at 202 not recognized", error.to_string());
    }

    /// A skip on the last word of memory wraps around to address 2
    #[test]
    fn skip_wraps() -> Result<()> {
        let io = Io::default();
        let mut cpu = CPU::default();
        cpu.load_program_bytes(&[0x1f, 0xfe], &io)?; // jp $ffe
        cpu.mem_mut().write(0xffeu16, 0x40); // sne v0, #01
        cpu.mem_mut().write(0xfffu16, 0x01);
        cpu.multistep(2, &io)?;
        assert_eq!(0x002, cpu.pc());
        Ok(())
    }

    /// Instructions can be fetched from the last byte of memory
    #[test]
    fn fetch_wraps() -> Result<()> {
        let io = Io::default();
        let mut cpu = CPU::default();
        cpu.load_program_bytes(&[0x1f, 0xff], &io)?; // jp $fff
        cpu.mem_mut().write(0xfffu16, 0x6a); // ld vA, #05
        cpu.mem_mut().write(0x000u16, 0x05);
        cpu.multistep(2, &io)?;
        assert_eq!(5, cpu.v()[0xa]);
        assert_eq!(0x001, cpu.pc());
        Ok(())
    }
}

mod keypad {
    use super::*;

    #[test]
    fn skip_if_pressed() -> Result<()> {
        let host = Host::default();
        host.keys.press(0x7)?;
        let cpu = run(&host, &[0x65, 0x07, 0xe5, 0x9e], 2)?;
        assert_eq!(0x206, cpu.pc());
        host.keys.release(0x7)?;
        let cpu = run(&host, &[0x65, 0x07, 0xe5, 0x9e], 2)?;
        assert_eq!(0x204, cpu.pc());
        Ok(())
    }

    #[test]
    fn wait_for_key() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[
            0xf4, 0x0a, // 200: ld v4, K
            0x12, 0x02, // 202: jp $202
        ])?;
        ch8.multistep(100)?;
        assert!(ch8.cpu.is_halted());
        assert_eq!(State::Halted { target: 4 }, ch8.cpu.state());
        assert_eq!(0x200, ch8.cpu.pc());
        assert_eq!(1, ch8.cpu.cycle());
        // Holding a key isn't enough: the host has to deliver it
        host.keys.press(0xb)?;
        ch8.step()?;
        assert!(ch8.cpu.is_halted());

        assert!(ch8.resolve_keypress(0xb)?);
        assert_eq!(0xb, ch8.cpu.v()[4]);
        assert_eq!(0x202, ch8.cpu.pc());
        ch8.multistep(3)?;
        assert_eq!(0x202, ch8.cpu.pc());
        Ok(())
    }

    #[test]
    fn invalid_key() {
        let keys = Keys::new();
        assert!(matches!(keys.press(0x10), Err(Error::InvalidKey { key: 0x10 })));
        assert!(matches!(keys.release(0x21), Err(Error::InvalidKey { key: 0x21 })));
        assert!((0..0x10).all(|key| !keys.is_key_down(key)));
    }
}

mod timers {
    use super::*;

    /// With ST = 3, the tone plays for three ticks, and stops exactly once
    #[test]
    fn sound() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[
            0x60, 0x03, // ld v0, #03
            0xf0, 0x18, // ld ST, v0
        ])?;
        ch8.step()?.step()?;
        assert!(host.tone.get());
        assert_eq!(1, host.starts.get());
        for _ in 0..5 {
            ch8.tick();
        }
        assert!(!host.tone.get());
        assert_eq!(1, host.stops.get());
        assert_eq!(0, ch8.cpu.sound());
        Ok(())
    }

    #[test]
    fn delay() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[
            0x60, 0x3c, // 200: ld v0, #3c
            0xf0, 0x15, // 202: ld DT, v0
            0xf1, 0x07, // 204: ld v1, DT
            0x31, 0x00, // 206: se v1, #00
            0x12, 0x04, // 208: jp $204
            0x12, 0x0a, // 20a: jp $20a
        ])?;
        // The program spins until 60 ticks have passed
        let mut frames = 0;
        while ch8.cpu.pc() != 0x20a {
            ch8.multistep(9)?;
            frames += 1;
        }
        assert!((59..=61).contains(&frames), "took {frames} frames");
        assert_eq!(0, ch8.cpu.delay());
        Ok(())
    }

    /// The delay timer stops at zero
    #[test]
    fn saturates() {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        for _ in 0..300 {
            ch8.tick();
        }
        assert_eq!(0, ch8.cpu.delay());
        assert_eq!(0, host.stops.get());
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn rom_too_large() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[0x6a, 0x05])?;
        ch8.step()?;
        let error = ch8.load_program_bytes(&[0; MEM_SIZE]).unwrap_err();
        assert!(matches!(error, Error::RomTooLarge { size: 0x1000, max: 0xe00 }));
        // The vm was left alone
        assert_eq!(0x202, ch8.cpu.pc());
        assert_eq!(5, ch8.cpu.v()[0xa]);
        // A program that exactly fills memory is fine
        ch8.load_program_bytes(&[0; 0xe00])?;
        Ok(())
    }

    #[test]
    fn load_missing_file() {
        let mut ch8 = Chip8::new(Io::default());
        assert!(matches!(
            ch8.load_program("this file does not exist.ch8"),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn reset() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::new(host.io());
        ch8.load_program_bytes(&[
            0x60, 0xff, // ld  v0, #ff
            0xf0, 0x18, // ld  ST, v0
            0xf0, 0x29, // ld  F, v0
            0xd0, 0x05, // drw v0, v0, #5
            0xf0, 0x0a, // ld  v0, K
        ])?;
        ch8.multistep(5)?;
        assert!(host.tone.get() && ch8.cpu.is_halted());
        assert!(!ch8.cpu.screen().is_blank());

        ch8.reset();

        assert!(!host.tone.get());
        assert!(ch8.cpu.screen().is_blank());
        assert!(!ch8.cpu.is_halted());
        assert_eq!((0x200, 0, 0), (ch8.cpu.pc(), ch8.cpu.cycle(), ch8.cpu.sound()));
        assert_eq!([0; 16], ch8.cpu.v());
        // The program is still there
        ch8.multistep(1)?;
        assert_eq!(0xff, ch8.cpu.v()[0]);
        Ok(())
    }

    #[test]
    fn pause() -> Result<()> {
        let host = Host::default();
        let mut ch8 = Chip8::with_flags(
            host.io(),
            Flags {
                pause: true,
                ..Default::default()
            },
        );
        ch8.load_program_bytes(&[0x60, 0x10, 0xf0, 0x15])?;
        ch8.cpu.set_v(0, 0x10)?;
        ch8.multistep(10)?;
        assert_eq!((0x200, 0), (ch8.cpu.pc(), ch8.cpu.cycle()));
        ch8.cpu.flags.pause();
        ch8.multistep(2)?;
        assert_eq!(0x0f, ch8.cpu.delay());
        Ok(())
    }

    /// Fx55 and Fx65 move I past the last register, unless the quirk says otherwise
    #[test]
    fn dma_quirk() -> Result<()> {
        let program = [
            0xa3, 0x00, // ld I, $300
            0xf3, 0x55, // ld [I], v3
        ];
        let mut ch8 = Chip8::new(Io::default());
        ch8.load_program_bytes(&program)?.multistep(2)?;
        assert_eq!(0x304, ch8.cpu.i());

        let mut ch8 = Chip8::with_flags(
            Io::default(),
            Flags {
                quirks: Quirks {
                    dma_inc: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        ch8.load_program_bytes(&program)?.multistep(2)?;
        assert_eq!(0x300, ch8.cpu.i());
        Ok(())
    }

    #[test]
    fn bcd_and_load() -> Result<()> {
        let host = Host::default();
        let cpu = run(
            &host,
            &[
                0x60, 0xc5, // ld v0, #c5 (197)
                0xa3, 0x00, // ld I, $300
                0xf0, 0x33, // ld B, v0
                0xf2, 0x65, // ld v2, [I]
            ],
            4,
        )?;
        assert_eq!([1, 9, 7], cpu.v()[0..3]);
        assert_eq!(0x303, cpu.i());
        Ok(())
    }
}
