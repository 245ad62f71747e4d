//! Inner state machine: one micro-step per clock tick.
//!
//! Addressing modes are generic micro-step chains that end in a single
//! `dispatch_addressing` call; the outer machine parameterizes them through
//! [`AddressState`] (which operands to load, which ALU operation to apply,
//! where the result goes). This is what lets `LDA`/`ADC`/`CMP`/`STA` in
//! every mode share the same micro-code.

use crate::bus::BusMaster;
use crate::cpu::cpu::{Cpu, CpuError};

/// A source or destination of the addressing dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressOperand {
    /// As a source: the scratch byte latched by the previous dispatch. As a
    /// destination: latch the result without touching a register.
    #[default]
    None,
    A,
    X,
    Y,
    S,
    /// Destination only: load the resolved address into PC (jumps).
    Pc,
    /// The byte at the resolved memory address.
    Memory,
}

/// ALU operation applied between the loaded operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AluOp {
    /// Pass the first operand through.
    #[default]
    None,
    Inc,
    Dec,
    And,
    Or,
    Xor,
    Adc,
    /// Flags-only subtraction (CMP/CPX/CPY).
    Compare,
    /// Flags-only BIT test: Z from A&M, N/V copied from M bits 7/6.
    BitTest,
    Asl,
    Rol,
    Lsr,
    Ror,
}

/// Scratch shared between the outer machine and the addressing micro-steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressState {
    pub operand_a: AddressOperand,
    pub operand_b: AddressOperand,
    pub dst: AddressOperand,
    pub op: AluOp,
    pub affects_flags: bool,
    /// Resolved 16-bit effective address.
    pub memory_address: u16,
    /// Zero-page pointer scratch for the indirect modes.
    pub memory_address8: u8,
    pub result_a: u8,
    pub result_b: u8,
}

impl AddressState {
    pub fn set(
        &mut self,
        operand_a: AddressOperand,
        operand_b: AddressOperand,
        dst: AddressOperand,
        op: AluOp,
        affects_flags: bool,
    ) {
        self.operand_a = operand_a;
        self.operand_b = operand_b;
        self.dst = dst;
        self.op = op;
        self.affects_flags = affects_flags;
    }
}

/// One bus transaction or internal cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MicroCode {
    /// Machine idle; the outer level picks the next instruction.
    #[default]
    None,

    /// Burn one cycle.
    Nop,

    /// Dispatch on the already-resolved [`AddressState`].
    Addressing,

    /// Operand is the byte at PC.
    Immediate,

    /// Signed 8-bit displacement from PC (branches).
    Relative,

    ZeroPage1,
    ZeroPage2,

    ZeroPageX1,
    ZeroPageX2,
    ZeroPageX3,

    ZeroPageY1,
    ZeroPageY2,
    ZeroPageY3,

    Absolute1,
    Absolute2,
    Absolute3,

    AbsoluteX1,
    AbsoluteX2,
    AbsoluteX3,

    AbsoluteY1,
    AbsoluteY2,
    AbsoluteY3,

    IndirectX1,
    IndirectX2,
    IndirectX3,
    IndirectX4,
    IndirectX5,

    IndirectY1,
    IndirectY2,
    IndirectY3,
    IndirectY4,

    /// Write `result_a` to the stack, post-decrement S.
    Push,
    /// Pre-increment S, read the stack into `result_a`.
    Pop,
}

impl Cpu {
    /// Run one micro-step and return the next one (`None` when the chain is
    /// done and control goes back to the outer machine).
    pub(super) fn execute_micro<M: BusMaster>(
        &mut self,
        code: MicroCode,
        bus: &mut M,
    ) -> Result<MicroCode, CpuError> {
        match code {
            MicroCode::None | MicroCode::Nop => Ok(MicroCode::None),

            MicroCode::Addressing => {
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::Immediate => {
                self.state.memory_address = self.pc;
                self.pc = self.pc.wrapping_add(1);
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::Relative => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                let offset = bus.value() as i8;
                self.state.memory_address = self.pc.wrapping_add_signed(offset as i16);
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::ZeroPage1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::ZeroPage2)
            }
            MicroCode::ZeroPage2 => {
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::ZeroPageX1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::ZeroPageX2)
            }
            MicroCode::ZeroPageX2 => {
                // Index math stays inside the zero page.
                self.state.memory_address =
                    u16::from((self.state.memory_address as u8).wrapping_add(self.x));
                Ok(MicroCode::ZeroPageX3)
            }
            MicroCode::ZeroPageX3 => {
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::ZeroPageY1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::ZeroPageY2)
            }
            MicroCode::ZeroPageY2 => {
                self.state.memory_address =
                    u16::from((self.state.memory_address as u8).wrapping_add(self.y));
                Ok(MicroCode::ZeroPageY3)
            }
            MicroCode::ZeroPageY3 => {
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::Absolute1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::Absolute2)
            }
            MicroCode::Absolute2 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address |= u16::from(bus.value()) << 8;
                Ok(MicroCode::Absolute3)
            }
            MicroCode::Absolute3 => {
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::AbsoluteX1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::AbsoluteX2)
            }
            MicroCode::AbsoluteX2 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address |= u16::from(bus.value()) << 8;
                Ok(MicroCode::AbsoluteX3)
            }
            MicroCode::AbsoluteX3 => {
                self.state.memory_address = self.state.memory_address.wrapping_add(u16::from(self.x));
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::AbsoluteY1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::AbsoluteY2)
            }
            MicroCode::AbsoluteY2 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address |= u16::from(bus.value()) << 8;
                Ok(MicroCode::AbsoluteY3)
            }
            MicroCode::AbsoluteY3 => {
                self.state.memory_address = self.state.memory_address.wrapping_add(u16::from(self.y));
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::IndirectX1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address8 = bus.value();
                Ok(MicroCode::IndirectX2)
            }
            MicroCode::IndirectX2 => {
                self.state.memory_address8 = self.state.memory_address8.wrapping_add(self.x);
                Ok(MicroCode::IndirectX3)
            }
            MicroCode::IndirectX3 => {
                bus.read(u16::from(self.state.memory_address8))?;
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::IndirectX4)
            }
            MicroCode::IndirectX4 => {
                bus.read(u16::from(self.state.memory_address8.wrapping_add(1)))?;
                self.state.memory_address |= u16::from(bus.value()) << 8;
                Ok(MicroCode::IndirectX5)
            }
            MicroCode::IndirectX5 => {
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::IndirectY1 => {
                bus.read(self.pc)?;
                self.pc = self.pc.wrapping_add(1);
                self.state.memory_address8 = bus.value();
                Ok(MicroCode::IndirectY2)
            }
            MicroCode::IndirectY2 => {
                bus.read(u16::from(self.state.memory_address8))?;
                self.state.memory_address = u16::from(bus.value());
                Ok(MicroCode::IndirectY3)
            }
            MicroCode::IndirectY3 => {
                bus.read(u16::from(self.state.memory_address8.wrapping_add(1)))?;
                self.state.memory_address |= u16::from(bus.value()) << 8;
                Ok(MicroCode::IndirectY4)
            }
            MicroCode::IndirectY4 => {
                self.state.memory_address = self.state.memory_address.wrapping_add(u16::from(self.y));
                self.dispatch_addressing(bus)?;
                Ok(MicroCode::None)
            }

            MicroCode::Push => {
                bus.set_value(self.state.result_a);
                bus.write(0x100 + u16::from(self.s))?;
                self.s = self.s.wrapping_sub(1);
                Ok(MicroCode::None)
            }
            MicroCode::Pop => {
                self.s = self.s.wrapping_add(1);
                bus.read(0x100 + u16::from(self.s))?;
                self.state.result_a = bus.value();
                Ok(MicroCode::None)
            }
        }
    }

    /// The final step of every addressing chain: load operands, run the ALU,
    /// store the result. At most one bus transaction happens here (either
    /// the memory operand load or the memory store, never both in one mode).
    fn dispatch_addressing<M: BusMaster>(&mut self, bus: &mut M) -> Result<(), CpuError> {
        if self.state.dst == AddressOperand::Pc {
            self.pc = self.state.memory_address;
            return Ok(());
        }

        let a = self.load_operand(self.state.operand_a, bus)?;
        let b = self.load_operand(self.state.operand_b, bus)?;
        let result = self.alu(a, b);

        match self.state.dst {
            AddressOperand::None => self.state.result_a = result,
            AddressOperand::A => self.a = result,
            AddressOperand::X => self.x = result,
            AddressOperand::Y => self.y = result,
            AddressOperand::S => self.s = result,
            AddressOperand::Pc => self.pc = self.state.memory_address,
            AddressOperand::Memory => {
                bus.set_value(result);
                bus.write(self.state.memory_address)?;
            }
        }
        Ok(())
    }

    fn load_operand<M: BusMaster>(
        &mut self,
        operand: AddressOperand,
        bus: &mut M,
    ) -> Result<u8, CpuError> {
        Ok(match operand {
            // `None` reads the scratch latched by a previous dispatch, which
            // is how two-phase read-modify-write instructions pass the value.
            AddressOperand::None | AddressOperand::Pc => self.state.result_a,
            AddressOperand::A => self.a,
            AddressOperand::X => self.x,
            AddressOperand::Y => self.y,
            AddressOperand::S => self.s,
            AddressOperand::Memory => {
                bus.read(self.state.memory_address)?;
                bus.value()
            }
        })
    }

    fn alu(&mut self, a: u8, b: u8) -> u8 {
        let affects_flags = self.state.affects_flags;
        match self.state.op {
            AluOp::None => {
                if affects_flags {
                    self.status.set_nz(a);
                }
                a
            }
            AluOp::Inc => {
                let result = a.wrapping_add(1);
                if affects_flags {
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Dec => {
                let result = a.wrapping_sub(1);
                if affects_flags {
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::And => {
                let result = a & b;
                if affects_flags {
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Or => {
                let result = a | b;
                if affects_flags {
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Xor => {
                let result = a ^ b;
                if affects_flags {
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Adc => {
                let sum = u16::from(a) + u16::from(b) + u16::from(self.status.c());
                let result = sum as u8;
                if affects_flags {
                    self.status.set_c(sum > 0xFF);
                    self.status.set_v(!(a ^ b) & (a ^ result) & 0x80 != 0);
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Compare => {
                if affects_flags {
                    let diff = a.wrapping_sub(b);
                    self.status.set_c(a >= b);
                    self.status.set_z(a == b);
                    self.status.set_n(diff & 0x80 != 0);
                }
                a
            }
            AluOp::BitTest => {
                if affects_flags {
                    self.status.set_z(a & b == 0);
                    self.status.set_n(b & 0x80 != 0);
                    self.status.set_v(b & 0x40 != 0);
                }
                a
            }
            AluOp::Asl => {
                let result = a << 1;
                if affects_flags {
                    self.status.set_c(a & 0x80 != 0);
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Rol => {
                let result = (a << 1) | u8::from(self.status.c());
                if affects_flags {
                    self.status.set_c(a & 0x80 != 0);
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Lsr => {
                let result = a >> 1;
                if affects_flags {
                    self.status.set_c(a & 0x01 != 0);
                    self.status.set_nz(result);
                }
                result
            }
            AluOp::Ror => {
                let result = (a >> 1) | (u8::from(self.status.c()) << 7);
                if affects_flags {
                    self.status.set_c(a & 0x01 != 0);
                    self.status.set_nz(result);
                }
                result
            }
        }
    }
}
