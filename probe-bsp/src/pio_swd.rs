//! Component A: the PIO-driven SWD transport. Grounded directly on
//! `examples/original_source/src/probe.c` (`probe_init`/`probe_write_bits`/
//! `probe_read_bits`/`probe_set_swclk_freq`/`probe_read_mode`/
//! `probe_write_mode`) and `sw_dp_pio.c`'s shim, which hands bit counts to
//! a single PIO state machine instead of bitbashing: the host side only
//! ever pushes "bit count - 1" followed by (for writes) the data byte, and
//! pulls one word back when the state machine is done.
//!
//! The state machine runs one of two loops depending on which label the
//! core last jumped its program counter to: `out_negedge` drives SWDIO on
//! SWCLK's falling edge (the probe is master), `in_posedge` samples SWDIO
//! on the rising edge (the target is driving). Switching between them is a
//! bare `jmp` into the other label, exactly like `probe_read_mode`/
//! `probe_write_mode`; there is no separate "direction" state held outside
//! the state machine's program counter.

use embedded_hal::digital::v2::OutputPin;
use pio::{Assembler, JmpCondition, OutDestination, SetDestination};
use probe_core::swd::{Direction, SwdIo};
use rp2040_hal::gpio::bank0::{Gpio2, Gpio3, Gpio4};
use rp2040_hal::gpio::{FunctionPio0, FunctionSioOutput, Pin, PullUp};
use rp2040_hal::pio::{PIOBuilder, Running, StateMachine, StateMachineIndex, Tx, UninitStateMachine, PIO};
use rp2040_pac::PIO0;

/// Assembles the two-mode bit-bang program described above. `out_negedge`
/// is offset 0 (the program's default entry point); `in_posedge` is
/// appended after it so a `jmp` to its offset is all direction switching
/// takes.
pub fn assemble() -> pio::Program<32> {
    let mut a = Assembler::<32>::new();
    let mut out_negedge = a.label();
    let mut in_posedge = a.label();
    let mut wrap_target = a.label();
    let mut wrap_source = a.label();

    a.bind(&mut wrap_target);
    a.bind(&mut out_negedge);
    a.pull(false, true);
    a.out(OutDestination::X, 32);
    let mut write_loop = a.label();
    a.bind(&mut write_loop);
    a.out_with_delay_and_side_set(OutDestination::PINS, 1, 0, 0);
    a.jmp_with_delay_and_side_set(JmpCondition::XDecNonZero, &mut write_loop, 0, 1);
    a.push(false, true);
    a.jmp(JmpCondition::Always, &mut wrap_target);

    a.bind(&mut in_posedge);
    a.pull(false, true);
    a.out(OutDestination::X, 32);
    a.set_with_side_set(SetDestination::PINDIRS, 0, 0);
    let mut read_loop = a.label();
    a.bind(&mut read_loop);
    a.in_with_delay_and_side_set(pio::InSource::PINS, 1, 0, 1);
    a.jmp_with_delay_and_side_set(JmpCondition::XDecNonZero, &mut read_loop, 0, 0);
    a.push(false, true);
    a.set_with_side_set(SetDestination::PINDIRS, 1, 0);
    a.bind(&mut wrap_source);
    a.jmp(JmpCondition::Always, &mut wrap_target);

    a.assemble_with_wrap(wrap_source, wrap_target)
}

/// Offsets of the two labels within the program `assemble()` builds above,
/// needed to jump the running state machine's PC there directly (mirrors
/// `probe.offset + probe_offset_in_posedge` in the source). Must be kept in
/// sync by hand with `assemble()`'s instruction count if that's edited.
pub const OUT_NEGEDGE_OFFSET: u8 = 0;
pub const IN_POSEDGE_OFFSET: u8 = 6;

pub type SwclkPin = Pin<Gpio2, FunctionPio0, PullUp>;
pub type SwdioPin = Pin<Gpio3, FunctionPio0, PullUp>;
pub type ResetPin = Pin<Gpio4, FunctionSioOutput, PullUp>;

/// Drives one PIO state machine as the SWD transport, implementing
/// [`SwdIo`]. The source emulates an open-drain reset line by switching
/// the pin's direction (input = released via its pull-up, output-low =
/// asserted); this keeps it a plain push-pull output instead (`set_low`
/// asserts, `set_high` releases), a simplification noted in DESIGN.md.
pub struct PioSwd<SM: StateMachineIndex> {
    sm: StateMachine<(PIO0, SM), Running>,
    tx: Tx<(PIO0, SM)>,
    rx: rp2040_hal::pio::Rx<(PIO0, SM)>,
    reset: ResetPin,
    program_offset: u8,
    sys_clk_khz: u32,
    current_direction: Direction,
}

impl<SM: StateMachineIndex> PioSwd<SM> {
    /// `uninit_sm` must come from the same `PIO0` instance `program` was
    /// installed into. `sys_clk_khz` is needed to turn a requested SWCLK
    /// frequency into a PIO clock divider, exactly as
    /// `probe_set_swclk_freq` does from `clock_get_hz(clk_sys)`.
    pub fn new(
        pio: &mut PIO<PIO0>,
        uninit_sm: UninitStateMachine<(PIO0, SM)>,
        program_offset: u8,
        installed: pio::InstalledProgram<PIO0>,
        swclk: SwclkPin,
        swdio: SwdioPin,
        reset: ResetPin,
        sys_clk_khz: u32,
    ) -> Self {
        let _ = pio;
        let (mut sm, rx, tx) = PIOBuilder::from_installed_program(installed)
            .side_set_pin_base(swclk.id().num)
            .out_pins(swdio.id().num, 1)
            .in_pin_base(swdio.id().num)
            .set_pins(swdio.id().num, 1)
            .out_shift_direction(rp2040_hal::pio::ShiftDirection::Right)
            .in_shift_direction(rp2040_hal::pio::ShiftDirection::Right)
            .autopull(false)
            .autopush(false)
            .clock_divisor_fixed_point(1, 0)
            .build(uninit_sm);
        sm.set_pindirs([(swdio.id().num, rp2040_hal::pio::PinDir::Output), (swclk.id().num, rp2040_hal::pio::PinDir::Output)]);
        let sm = sm.start();

        let mut driver = PioSwd {
            sm,
            tx,
            rx,
            reset,
            program_offset,
            sys_clk_khz: sys_clk_khz.max(1),
            current_direction: Direction::Out,
        };
        driver.set_clock(1_000);
        driver
    }

    fn jump(&mut self, label_offset: u8) {
        let target = self.program_offset + label_offset;
        self.sm.exec_instruction(pio::Instruction {
            operands: pio::InstructionOperands::JMP {
                condition: JmpCondition::Always,
                address: target,
            },
            delay: 0,
            side_set: None,
        });
    }

    fn push_blocking(&mut self, word: u32) {
        while self.tx.write(word) == false {}
    }

    fn pull_blocking(&mut self) -> u32 {
        loop {
            if let Some(v) = self.rx.read() {
                return v;
            }
        }
    }
}

impl<SM: StateMachineIndex> SwdIo for PioSwd<SM> {
    fn set_clock(&mut self, khz: u32) {
        // Matches `probe_set_swclk_freq`: divider = sys/khz/2, truncated.
        let khz = khz.max(1);
        let divider = (self.sys_clk_khz / khz / 2).max(1);
        self.sm.clock_divisor_fixed_point(divider as u16, 0);
    }

    fn write_bits(&mut self, n: u8, bits: u32) {
        if self.current_direction != Direction::Out {
            self.jump(OUT_NEGEDGE_OFFSET);
            self.current_direction = Direction::Out;
        }
        self.push_blocking((n as u32).wrapping_sub(1));
        self.push_blocking(bits);
        self.pull_blocking();
    }

    fn read_bits(&mut self, n: u8) -> u32 {
        if self.current_direction != Direction::In {
            self.jump(IN_POSEDGE_OFFSET);
            self.current_direction = Direction::In;
        }
        self.push_blocking((n as u32).wrapping_sub(1));
        let word = self.pull_blocking();
        // The shift-in register fills from the top; a read of fewer than
        // 32 bits needs bringing the captured bits down to bit 0, matching
        // `probe_read_bits`'s `data >> (32 - bit_count)`.
        if n >= 32 {
            word
        } else {
            word >> (32 - n as u32)
        }
    }

    fn hiz_clocks(&mut self, n: u8) {
        let _ = self.read_bits(n);
    }

    fn set_direction(&mut self, dir: Direction) {
        match dir {
            Direction::Out => {
                if self.current_direction != Direction::Out {
                    self.jump(OUT_NEGEDGE_OFFSET);
                    self.current_direction = Direction::Out;
                }
            }
            Direction::In => {
                if self.current_direction != Direction::In {
                    self.jump(IN_POSEDGE_OFFSET);
                    self.current_direction = Direction::In;
                }
            }
        }
    }

    fn assert_reset(&mut self, asserted: bool) {
        if asserted {
            let _ = self.reset.set_low();
        } else {
            let _ = self.reset.set_high();
        }
    }
}
