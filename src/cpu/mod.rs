//! 6502 CPU emulated as a two-level tagged state machine.
//!
//! The outer level ([`opcode::OpCodeStatus`]) tracks where the CPU is inside
//! an instruction; the inner level ([`micro::MicroCode`]) is the current bus
//! primitive. Each clock tick advances the machine by exactly one bus
//! transaction (or one internal cycle), so DMA stalls, interrupt latency and
//! instruction timing all fall out of the state machine instead of a
//! cycle-count table.

pub mod cpu;
pub mod flags;
pub mod micro;
pub mod opcode;

#[cfg(test)]
mod tests;

pub use cpu::{Cpu, CpuError, Interrupt};
pub use flags::ProcessorStatus;
