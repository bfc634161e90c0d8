//! Instruction format and opcode table
//!
//! A schedule entry is a triple `(op, rs1, rs2)` with two signed 64-bit
//! operands. The numeric encoding of the opcodes is part of the contract
//! with the schedule generator and must never be reordered.

use core::fmt;

use crate::constants::DONT_CARE;

/// Opcodes of the FS instruction set.
///
/// The discriminants are the wire encoding shared with the schedule
/// generator. New opcodes must be appended, never inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Advance a reactor's logical time under the global scheduler lock
    Adv = 0,

    /// Advance a reactor's logical time, lock-free (single writer)
    Adv2 = 1,

    /// Branch to `rs1` if every reactor has reached the stop tag
    Bit = 2,

    /// Delay until `start_time + rs1 * (iteration + 1)` in wall-clock time
    Du = 3,

    /// Yield reaction `rs1` if its status is queued, otherwise skip
    Eit = 4,

    /// Yield reaction `rs1` unconditionally
    Exe = 5,

    /// Add `rs2` to counter `rs1` under the global scheduler lock
    Inc = 6,

    /// Add `rs2` to counter `rs1`, lock-free (single writer)
    Inc2 = 7,

    /// Jump to `rs1`; if `rs2` is not -1, bump the hyperperiod iteration
    Jmp = 8,

    /// Synchronize all workers and clear the counters
    Sac = 9,

    /// Stop: yield nothing and tell the worker to exit
    Stp = 10,

    /// Spin until counter `rs1` reaches at least `rs2`
    Wu = 11,
}

impl Opcode {
    /// Decode a raw opcode byte from a generator table.
    ///
    /// Returns `None` for values outside the closed set; the caller treats
    /// that as a fatal schedule mismatch.
    #[inline]
    pub const fn from_u8(v: u8) -> Option<Opcode> {
        match v {
            0 => Some(Opcode::Adv),
            1 => Some(Opcode::Adv2),
            2 => Some(Opcode::Bit),
            3 => Some(Opcode::Du),
            4 => Some(Opcode::Eit),
            5 => Some(Opcode::Exe),
            6 => Some(Opcode::Inc),
            7 => Some(Opcode::Inc2),
            8 => Some(Opcode::Jmp),
            9 => Some(Opcode::Sac),
            10 => Some(Opcode::Stp),
            11 => Some(Opcode::Wu),
            _ => None,
        }
    }

    /// Assembler mnemonic, used by the interpreter's debug logging
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Adv => "ADV",
            Opcode::Adv2 => "ADV2",
            Opcode::Bit => "BIT",
            Opcode::Du => "DU",
            Opcode::Eit => "EIT",
            Opcode::Exe => "EXE",
            Opcode::Inc => "INC",
            Opcode::Inc2 => "INC2",
            Opcode::Jmp => "JMP",
            Opcode::Sac => "SAC",
            Opcode::Stp => "STP",
            Opcode::Wu => "WU",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One schedule entry: opcode plus two signed 64-bit operands.
///
/// Negative operands are "don't care" placeholders where an opcode takes
/// fewer than two operands. The constructors below exist so that generated
/// schedules can be `static` arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub rs1: i64,
    pub rs2: i64,
}

/// One worker's straight-line program
pub type Schedule = Box<[Instruction]>;

impl Instruction {
    #[inline]
    pub const fn new(op: Opcode, rs1: i64, rs2: i64) -> Self {
        Instruction { op, rs1, rs2 }
    }

    /// Decode a raw `(op, rs1, rs2)` triple from a generator table.
    ///
    /// Panics on an unknown opcode byte; a corrupt or mismatched schedule
    /// is a programming error in the generator, not a recoverable state.
    pub fn decode(raw: (u8, i64, i64)) -> Self {
        match Opcode::from_u8(raw.0) {
            Some(op) => Instruction::new(op, raw.1, raw.2),
            None => {
                crate::kerror!("unknown opcode {} in schedule table", raw.0);
                panic!("unknown opcode {} in schedule table", raw.0);
            }
        }
    }

    /// ADV: advance reactor `reactor` by `delta` under the global lock
    #[inline]
    pub const fn adv(reactor: i64, delta: i64) -> Self {
        Instruction::new(Opcode::Adv, reactor, delta)
    }

    /// ADV2: advance reactor `reactor` by `delta`, single writer
    #[inline]
    pub const fn adv2(reactor: i64, delta: i64) -> Self {
        Instruction::new(Opcode::Adv2, reactor, delta)
    }

    /// BIT: jump to `target` once every reactor has reached the stop tag
    #[inline]
    pub const fn bit(target: i64) -> Self {
        Instruction::new(Opcode::Bit, target, DONT_CARE)
    }

    /// DU: delay until `start_time + offset * (iteration + 1)`
    #[inline]
    pub const fn du(offset: i64) -> Self {
        Instruction::new(Opcode::Du, offset, DONT_CARE)
    }

    /// EIT: yield reaction `reaction` if it is queued
    #[inline]
    pub const fn eit(reaction: i64) -> Self {
        Instruction::new(Opcode::Eit, reaction, DONT_CARE)
    }

    /// EXE: yield reaction `reaction` unconditionally
    #[inline]
    pub const fn exe(reaction: i64) -> Self {
        Instruction::new(Opcode::Exe, reaction, DONT_CARE)
    }

    /// INC: add `k` to counter `counter` under the global lock
    #[inline]
    pub const fn inc(counter: i64, k: i64) -> Self {
        Instruction::new(Opcode::Inc, counter, k)
    }

    /// INC2: add `k` to counter `counter`, single writer
    #[inline]
    pub const fn inc2(counter: i64, k: i64) -> Self {
        Instruction::new(Opcode::Inc2, counter, k)
    }

    /// JMP: jump to `target` without touching the iteration counter
    #[inline]
    pub const fn jmp(target: i64) -> Self {
        Instruction::new(Opcode::Jmp, target, DONT_CARE)
    }

    /// JMP: jump to `target` and bump the hyperperiod iteration
    #[inline]
    pub const fn jmp_iter(target: i64) -> Self {
        Instruction::new(Opcode::Jmp, target, 1)
    }

    /// SAC: synchronize all workers and clear the counters
    #[inline]
    pub const fn sac() -> Self {
        Instruction::new(Opcode::Sac, DONT_CARE, DONT_CARE)
    }

    /// STP: stop the worker
    #[inline]
    pub const fn stp() -> Self {
        Instruction::new(Opcode::Stp, DONT_CARE, DONT_CARE)
    }

    /// WU: spin until counter `counter` reaches at least `threshold`
    #[inline]
    pub const fn wu(counter: i64, threshold: i64) -> Self {
        Instruction::new(Opcode::Wu, counter, threshold)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.op, self.rs1, self.rs2)
    }
}
