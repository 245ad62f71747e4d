//! CPU core: registers, per-tick dispatch, interrupts, power-up and reset.

use log::trace;
use thiserror::Error;

use crate::bus::{BusError, BusMaster};
use crate::cpu::flags::ProcessorStatus;
use crate::cpu::micro::{AddressState, MicroCode};
use crate::cpu::opcode::{OpCode, OpCodeStatus};

/// Errors the CPU can surface to the run loop.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("invalid opcode {opcode:#04X} at {pc:#06X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Interrupt sources, in rising priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Interrupt {
    Brk,
    Irq,
    Nmi,
    Reset,
}

impl Interrupt {
    /// Address of the 16-bit handler vector.
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::Nmi => 0xFFFA,
            Interrupt::Reset => 0xFFFC,
            Interrupt::Irq | Interrupt::Brk => 0xFFFE,
        }
    }
}

/// The 6502. Does not own its bus: every tick borrows a [`BusMaster`] view
/// from the board, which keeps the CPU free of device aliasing.
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub pc: u16,
    pub status: ProcessorStatus,

    pub(super) next_micro: MicroCode,
    pub(super) next_status: OpCodeStatus,
    pub(super) reading_opcode: bool,
    pub(super) state: AddressState,
    pub(super) pending: Option<Interrupt>,
    pub(super) servicing: Option<Interrupt>,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0,
            pc: 0,
            status: ProcessorStatus::default(),
            next_micro: MicroCode::None,
            next_status: OpCodeStatus::None,
            reading_opcode: false,
            state: AddressState::default(),
            pending: None,
            servicing: None,
        }
    }

    /// Power-up state per <https://www.nesdev.org/wiki/CPU_power_up_state>:
    /// the APU is silenced through the bus, then a Reset interrupt is queued
    /// so the vector fetch happens over the first ticks like real hardware.
    pub fn power_on<M: BusMaster>(&mut self, bus: &mut M) -> Result<(), CpuError> {
        self.next_micro = MicroCode::None;
        self.next_status = OpCodeStatus::None;
        self.reading_opcode = false;
        self.state = AddressState::default();
        self.pending = None;
        self.servicing = None;

        self.status = ProcessorStatus::from_bits(0x34);
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.s = 0xFD;
        self.pc = 0;

        bus.set_value(0);
        bus.write(0x4017)?;
        bus.write(0x4015)?;
        for address in 0x4000..=0x400F {
            bus.write(address)?;
        }

        self.request_interrupt(Interrupt::Reset);
        Ok(())
    }

    /// Reset button: stack pointer drops by 3 without pushes, interrupts are
    /// masked, and the Reset vector is serviced next.
    pub fn reset(&mut self) {
        self.s = self.s.wrapping_sub(3);
        self.status.set_i(true);
        self.request_interrupt(Interrupt::Reset);
    }

    /// Latch an interrupt request. It is acknowledged at the next
    /// instruction boundary; a lower-priority request never displaces a
    /// higher-priority one.
    pub fn request_interrupt(&mut self, interrupt: Interrupt) {
        match self.pending {
            Some(existing) if existing >= interrupt => {}
            _ => self.pending = Some(interrupt),
        }
    }

    /// One clock tick: at most one bus transaction.
    ///
    /// A tick where another master holds the bus does nothing, which is
    /// exactly the OAM DMA stall.
    pub fn tick<M: BusMaster>(&mut self, bus: &mut M) -> Result<(), CpuError> {
        if !bus.try_acquire() {
            return Ok(());
        }

        if self.next_micro == MicroCode::None {
            if self.next_status == OpCodeStatus::None && !self.reading_opcode {
                // Instruction boundary: acknowledge a pending interrupt.
                // A fetched-but-undecoded opcode is still mid-flight, and a
                // started sequence cannot be preempted.
                self.promote_pending_interrupt();
            }

            if self.next_status == OpCodeStatus::None {
                if !self.reading_opcode {
                    self.reading_opcode = true;
                    bus.read(self.pc)?;
                    self.pc = self.pc.wrapping_add(1);
                    return Ok(());
                }

                self.reading_opcode = false;
                let byte = bus.value();
                let opcode = OpCode::decode(byte).ok_or(CpuError::InvalidOpcode {
                    opcode: byte,
                    pc: self.pc.wrapping_sub(1),
                })?;
                trace!("{:04X}  {:?}", self.pc.wrapping_sub(1), opcode);
                self.next_status = self.begin_opcode(opcode);
            }

            let (micro, status) = self.execute_status(self.next_status, bus)?;
            self.next_micro = micro;
            self.next_status = status;
        }

        self.next_micro = self.execute_micro(self.next_micro, bus)?;
        Ok(())
    }

    fn promote_pending_interrupt(&mut self) {
        let masked = matches!(self.pending, Some(Interrupt::Irq)) && self.status.i();
        if masked {
            // The IRQ line stays asserted; it fires once I clears.
            return;
        }
        if let Some(interrupt) = self.pending.take() {
            self.servicing = Some(interrupt);
            self.next_status = OpCodeStatus::Interrupt1;
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
