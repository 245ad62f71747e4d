//! Outer state machine: opcode decode and per-instruction step sequences.
//!
//! Decoding maps an opcode byte to the first [`OpCodeStatus`] of its
//! sequence; `execute_status` runs one step, parameterizing the shared
//! addressing micro-code through [`AddressState`](super::micro::AddressState)
//! and returning the micro-step to run this tick plus the status to resume
//! at once that micro chain finishes.

use crate::bus::BusMaster;
use crate::cpu::cpu::{Cpu, CpuError, Interrupt};
use crate::cpu::micro::{AddressOperand, AluOp, MicroCode};

/// Decoded instruction: mnemonic + addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    BrkImplied,
    OraImmediate,
    OraZeroPage,
    AslAccumulator,
    AslZeroPage,
    PhpImplied,
    BplRelative,
    ClcImplied,
    JsrAbsolute,
    AndImmediate,
    AndZeroPageX,
    BitAbsolute,
    RolAccumulator,
    RolZeroPage,
    PlpImplied,
    BmiRelative,
    SecImplied,
    RtiImplied,
    EorImmediate,
    LsrAccumulator,
    LsrZeroPage,
    PhaImplied,
    JmpAbsolute,
    CliImplied,
    RtsImplied,
    AdcImmediate,
    AdcZeroPage,
    AdcZeroPageX,
    AdcAbsolute,
    AdcAbsoluteX,
    AdcAbsoluteY,
    AdcIndirectX,
    AdcIndirectY,
    RorAccumulator,
    RorZeroPage,
    PlaImplied,
    SeiImplied,
    StaZeroPage,
    StaZeroPageX,
    StaAbsolute,
    StaAbsoluteX,
    StxZeroPage,
    StxAbsolute,
    StyZeroPage,
    StyAbsolute,
    DeyImplied,
    TxaImplied,
    BccRelative,
    TyaImplied,
    TxsImplied,
    LdaImmediate,
    LdaZeroPage,
    LdaZeroPageX,
    LdaAbsolute,
    LdaAbsoluteX,
    LdaAbsoluteY,
    LdaIndirectX,
    LdaIndirectY,
    LdxImmediate,
    LdxZeroPage,
    LdxZeroPageY,
    LdxAbsolute,
    LdyImmediate,
    LdyZeroPage,
    LdyAbsolute,
    TaxImplied,
    TayImplied,
    BcsRelative,
    ClvImplied,
    CmpImmediate,
    CmpZeroPage,
    CmpZeroPageX,
    CmpAbsolute,
    CpxImmediate,
    CpyImmediate,
    DecZeroPage,
    IncZeroPage,
    InxImplied,
    InyImplied,
    DexImplied,
    BneRelative,
    BeqRelative,
    CldImplied,
    NopImplied,
}

impl OpCode {
    /// Decode an opcode byte, `None` for bytes this core does not implement
    /// (the unofficial opcodes).
    pub fn decode(byte: u8) -> Option<OpCode> {
        Some(match byte {
            0x00 => OpCode::BrkImplied,
            0x05 => OpCode::OraZeroPage,
            0x06 => OpCode::AslZeroPage,
            0x08 => OpCode::PhpImplied,
            0x09 => OpCode::OraImmediate,
            0x0A => OpCode::AslAccumulator,
            0x10 => OpCode::BplRelative,
            0x18 => OpCode::ClcImplied,
            0x20 => OpCode::JsrAbsolute,
            0x26 => OpCode::RolZeroPage,
            0x28 => OpCode::PlpImplied,
            0x29 => OpCode::AndImmediate,
            0x2A => OpCode::RolAccumulator,
            0x2C => OpCode::BitAbsolute,
            0x30 => OpCode::BmiRelative,
            0x35 => OpCode::AndZeroPageX,
            0x38 => OpCode::SecImplied,
            0x40 => OpCode::RtiImplied,
            0x46 => OpCode::LsrZeroPage,
            0x48 => OpCode::PhaImplied,
            0x49 => OpCode::EorImmediate,
            0x4A => OpCode::LsrAccumulator,
            0x4C => OpCode::JmpAbsolute,
            0x58 => OpCode::CliImplied,
            0x60 => OpCode::RtsImplied,
            0x61 => OpCode::AdcIndirectX,
            0x65 => OpCode::AdcZeroPage,
            0x66 => OpCode::RorZeroPage,
            0x68 => OpCode::PlaImplied,
            0x69 => OpCode::AdcImmediate,
            0x6A => OpCode::RorAccumulator,
            0x6D => OpCode::AdcAbsolute,
            0x71 => OpCode::AdcIndirectY,
            0x75 => OpCode::AdcZeroPageX,
            0x78 => OpCode::SeiImplied,
            0x79 => OpCode::AdcAbsoluteY,
            0x7D => OpCode::AdcAbsoluteX,
            0x84 => OpCode::StyZeroPage,
            0x85 => OpCode::StaZeroPage,
            0x86 => OpCode::StxZeroPage,
            0x88 => OpCode::DeyImplied,
            0x8A => OpCode::TxaImplied,
            0x8C => OpCode::StyAbsolute,
            0x8D => OpCode::StaAbsolute,
            0x8E => OpCode::StxAbsolute,
            0x90 => OpCode::BccRelative,
            0x95 => OpCode::StaZeroPageX,
            0x98 => OpCode::TyaImplied,
            0x9A => OpCode::TxsImplied,
            0x9D => OpCode::StaAbsoluteX,
            0xA0 => OpCode::LdyImmediate,
            0xA1 => OpCode::LdaIndirectX,
            0xA2 => OpCode::LdxImmediate,
            0xA4 => OpCode::LdyZeroPage,
            0xA5 => OpCode::LdaZeroPage,
            0xA6 => OpCode::LdxZeroPage,
            0xA8 => OpCode::TayImplied,
            0xA9 => OpCode::LdaImmediate,
            0xAA => OpCode::TaxImplied,
            0xAC => OpCode::LdyAbsolute,
            0xAD => OpCode::LdaAbsolute,
            0xAE => OpCode::LdxAbsolute,
            0xB0 => OpCode::BcsRelative,
            0xB1 => OpCode::LdaIndirectY,
            0xB5 => OpCode::LdaZeroPageX,
            0xB6 => OpCode::LdxZeroPageY,
            0xB8 => OpCode::ClvImplied,
            0xB9 => OpCode::LdaAbsoluteY,
            0xBD => OpCode::LdaAbsoluteX,
            0xC0 => OpCode::CpyImmediate,
            0xC5 => OpCode::CmpZeroPage,
            0xC6 => OpCode::DecZeroPage,
            0xC8 => OpCode::InyImplied,
            0xC9 => OpCode::CmpImmediate,
            0xCA => OpCode::DexImplied,
            0xCD => OpCode::CmpAbsolute,
            0xD0 => OpCode::BneRelative,
            0xD5 => OpCode::CmpZeroPageX,
            0xD8 => OpCode::CldImplied,
            0xE0 => OpCode::CpxImmediate,
            0xE6 => OpCode::IncZeroPage,
            0xE8 => OpCode::InxImplied,
            0xEA => OpCode::NopImplied,
            0xF0 => OpCode::BeqRelative,
            _ => return None,
        })
    }
}

/// Where the outer machine is inside the current instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpCodeStatus {
    /// Between instructions.
    #[default]
    None,

    Interrupt1,
    Interrupt2,
    Interrupt3,
    Interrupt4,
    Interrupt5,
    Interrupt6,

    /// Second step of a taken branch.
    RelativeJump,

    Lda1Immediate,
    Lda1ZeroPage,
    Lda1ZeroPageX,
    Lda1Absolute,
    Lda1AbsoluteX,
    Lda1AbsoluteY,
    Lda1IndirectX,
    Lda1IndirectY,

    Ldx1Immediate,
    Ldx1ZeroPage,
    Ldx1ZeroPageY,
    Ldx1Absolute,

    Ldy1Immediate,
    Ldy1ZeroPage,
    Ldy1Absolute,

    Sta1ZeroPage,
    Sta1ZeroPageX,
    Sta1Absolute,
    Sta1AbsoluteX,

    Stx1ZeroPage,
    Stx1Absolute,

    Sty1ZeroPage,
    Sty1Absolute,

    Tax1Implied,
    Tay1Implied,
    Txa1Implied,
    Tya1Implied,
    Txs1Implied,

    Inx1Implied,
    Iny1Implied,
    Dex1Implied,
    Dey1Implied,

    Inc1ZeroPage,
    Inc2ZeroPage,
    Dec1ZeroPage,
    Dec2ZeroPage,

    Adc1Immediate,
    Adc1ZeroPage,
    Adc1ZeroPageX,
    Adc1Absolute,
    Adc1AbsoluteX,
    Adc1AbsoluteY,
    Adc1IndirectX,
    Adc1IndirectY,

    And1Immediate,
    And1ZeroPageX,
    Ora1Immediate,
    Ora1ZeroPage,
    Eor1Immediate,

    Cmp1Immediate,
    Cmp1ZeroPage,
    Cmp1ZeroPageX,
    Cmp1Absolute,
    Cpx1Immediate,
    Cpy1Immediate,

    Bit1Absolute,

    Asl1Accumulator,
    Asl1ZeroPage,
    Asl2ZeroPage,
    Rol1Accumulator,
    Rol1ZeroPage,
    Rol2ZeroPage,
    Lsr1Accumulator,
    Lsr1ZeroPage,
    Lsr2ZeroPage,
    Ror1Accumulator,
    Ror1ZeroPage,
    Ror2ZeroPage,

    Jmp1Absolute,

    Jsr1Absolute,
    Jsr2Absolute,
    Jsr3Absolute,

    Rts1Implied,
    Rts2Implied,
    Rts3Implied,
    Rts4Implied,
    Rts5Implied,

    Rti1Implied,
    Rti2Implied,
    Rti3Implied,
    Rti4Implied,
    Rti5Implied,

    Bpl1Relative,
    Bmi1Relative,
    Bne1Relative,
    Beq1Relative,
    Bcc1Relative,
    Bcs1Relative,

    Sei1Implied,
    Cli1Implied,
    Sec1Implied,
    Clc1Implied,
    Cld1Implied,
    Clv1Implied,

    Pha1Implied,
    Php1Implied,
    Pla1Implied,
    Pla2Implied,
    Plp1Implied,
    Plp2Implied,

    Nop1Implied,
}

impl Cpu {
    /// Map a decoded opcode to the first step of its sequence. BRK enters
    /// the interrupt sequence directly, with the padding byte skipped.
    pub(super) fn begin_opcode(&mut self, opcode: OpCode) -> OpCodeStatus {
        match opcode {
            OpCode::BrkImplied => {
                self.pc = self.pc.wrapping_add(1);
                self.servicing = Some(Interrupt::Brk);
                OpCodeStatus::Interrupt1
            }
            OpCode::OraImmediate => OpCodeStatus::Ora1Immediate,
            OpCode::OraZeroPage => OpCodeStatus::Ora1ZeroPage,
            OpCode::AslAccumulator => OpCodeStatus::Asl1Accumulator,
            OpCode::AslZeroPage => OpCodeStatus::Asl1ZeroPage,
            OpCode::PhpImplied => OpCodeStatus::Php1Implied,
            OpCode::BplRelative => OpCodeStatus::Bpl1Relative,
            OpCode::ClcImplied => OpCodeStatus::Clc1Implied,
            OpCode::JsrAbsolute => OpCodeStatus::Jsr1Absolute,
            OpCode::AndImmediate => OpCodeStatus::And1Immediate,
            OpCode::AndZeroPageX => OpCodeStatus::And1ZeroPageX,
            OpCode::BitAbsolute => OpCodeStatus::Bit1Absolute,
            OpCode::RolAccumulator => OpCodeStatus::Rol1Accumulator,
            OpCode::RolZeroPage => OpCodeStatus::Rol1ZeroPage,
            OpCode::PlpImplied => OpCodeStatus::Plp1Implied,
            OpCode::BmiRelative => OpCodeStatus::Bmi1Relative,
            OpCode::SecImplied => OpCodeStatus::Sec1Implied,
            OpCode::RtiImplied => OpCodeStatus::Rti1Implied,
            OpCode::EorImmediate => OpCodeStatus::Eor1Immediate,
            OpCode::LsrAccumulator => OpCodeStatus::Lsr1Accumulator,
            OpCode::LsrZeroPage => OpCodeStatus::Lsr1ZeroPage,
            OpCode::PhaImplied => OpCodeStatus::Pha1Implied,
            OpCode::JmpAbsolute => OpCodeStatus::Jmp1Absolute,
            OpCode::CliImplied => OpCodeStatus::Cli1Implied,
            OpCode::RtsImplied => OpCodeStatus::Rts1Implied,
            OpCode::AdcImmediate => OpCodeStatus::Adc1Immediate,
            OpCode::AdcZeroPage => OpCodeStatus::Adc1ZeroPage,
            OpCode::AdcZeroPageX => OpCodeStatus::Adc1ZeroPageX,
            OpCode::AdcAbsolute => OpCodeStatus::Adc1Absolute,
            OpCode::AdcAbsoluteX => OpCodeStatus::Adc1AbsoluteX,
            OpCode::AdcAbsoluteY => OpCodeStatus::Adc1AbsoluteY,
            OpCode::AdcIndirectX => OpCodeStatus::Adc1IndirectX,
            OpCode::AdcIndirectY => OpCodeStatus::Adc1IndirectY,
            OpCode::RorAccumulator => OpCodeStatus::Ror1Accumulator,
            OpCode::RorZeroPage => OpCodeStatus::Ror1ZeroPage,
            OpCode::PlaImplied => OpCodeStatus::Pla1Implied,
            OpCode::SeiImplied => OpCodeStatus::Sei1Implied,
            OpCode::StaZeroPage => OpCodeStatus::Sta1ZeroPage,
            OpCode::StaZeroPageX => OpCodeStatus::Sta1ZeroPageX,
            OpCode::StaAbsolute => OpCodeStatus::Sta1Absolute,
            OpCode::StaAbsoluteX => OpCodeStatus::Sta1AbsoluteX,
            OpCode::StxZeroPage => OpCodeStatus::Stx1ZeroPage,
            OpCode::StxAbsolute => OpCodeStatus::Stx1Absolute,
            OpCode::StyZeroPage => OpCodeStatus::Sty1ZeroPage,
            OpCode::StyAbsolute => OpCodeStatus::Sty1Absolute,
            OpCode::DeyImplied => OpCodeStatus::Dey1Implied,
            OpCode::TxaImplied => OpCodeStatus::Txa1Implied,
            OpCode::BccRelative => OpCodeStatus::Bcc1Relative,
            OpCode::TyaImplied => OpCodeStatus::Tya1Implied,
            OpCode::TxsImplied => OpCodeStatus::Txs1Implied,
            OpCode::LdaImmediate => OpCodeStatus::Lda1Immediate,
            OpCode::LdaZeroPage => OpCodeStatus::Lda1ZeroPage,
            OpCode::LdaZeroPageX => OpCodeStatus::Lda1ZeroPageX,
            OpCode::LdaAbsolute => OpCodeStatus::Lda1Absolute,
            OpCode::LdaAbsoluteX => OpCodeStatus::Lda1AbsoluteX,
            OpCode::LdaAbsoluteY => OpCodeStatus::Lda1AbsoluteY,
            OpCode::LdaIndirectX => OpCodeStatus::Lda1IndirectX,
            OpCode::LdaIndirectY => OpCodeStatus::Lda1IndirectY,
            OpCode::LdxImmediate => OpCodeStatus::Ldx1Immediate,
            OpCode::LdxZeroPage => OpCodeStatus::Ldx1ZeroPage,
            OpCode::LdxZeroPageY => OpCodeStatus::Ldx1ZeroPageY,
            OpCode::LdxAbsolute => OpCodeStatus::Ldx1Absolute,
            OpCode::LdyImmediate => OpCodeStatus::Ldy1Immediate,
            OpCode::LdyZeroPage => OpCodeStatus::Ldy1ZeroPage,
            OpCode::LdyAbsolute => OpCodeStatus::Ldy1Absolute,
            OpCode::TaxImplied => OpCodeStatus::Tax1Implied,
            OpCode::TayImplied => OpCodeStatus::Tay1Implied,
            OpCode::BcsRelative => OpCodeStatus::Bcs1Relative,
            OpCode::ClvImplied => OpCodeStatus::Clv1Implied,
            OpCode::CmpImmediate => OpCodeStatus::Cmp1Immediate,
            OpCode::CmpZeroPage => OpCodeStatus::Cmp1ZeroPage,
            OpCode::CmpZeroPageX => OpCodeStatus::Cmp1ZeroPageX,
            OpCode::CmpAbsolute => OpCodeStatus::Cmp1Absolute,
            OpCode::CpxImmediate => OpCodeStatus::Cpx1Immediate,
            OpCode::CpyImmediate => OpCodeStatus::Cpy1Immediate,
            OpCode::DecZeroPage => OpCodeStatus::Dec1ZeroPage,
            OpCode::IncZeroPage => OpCodeStatus::Inc1ZeroPage,
            OpCode::InxImplied => OpCodeStatus::Inx1Implied,
            OpCode::InyImplied => OpCodeStatus::Iny1Implied,
            OpCode::DexImplied => OpCodeStatus::Dex1Implied,
            OpCode::BneRelative => OpCodeStatus::Bne1Relative,
            OpCode::BeqRelative => OpCodeStatus::Beq1Relative,
            OpCode::CldImplied => OpCodeStatus::Cld1Implied,
            OpCode::NopImplied => OpCodeStatus::Nop1Implied,
        }
    }

    /// One outer-machine step: set up the address state and pick the micro
    /// chain for this tick, plus the status to resume at afterwards.
    pub(super) fn execute_status<M: BusMaster>(
        &mut self,
        code: OpCodeStatus,
        bus: &mut M,
    ) -> Result<(MicroCode, OpCodeStatus), CpuError> {
        use AddressOperand::{A, Memory, Pc, S, X, Y};
        use OpCodeStatus as St;

        Ok(match code {
            St::None => (MicroCode::None, St::None),

            // Interrupt acknowledge: push PC and P, fetch the vector, jump.
            St::Interrupt1 => {
                self.state.result_a = (self.pc >> 8) as u8;
                (MicroCode::Push, St::Interrupt2)
            }
            St::Interrupt2 => {
                self.state.result_a = self.pc as u8;
                (MicroCode::Push, St::Interrupt3)
            }
            St::Interrupt3 => {
                let software_break = self.servicing == Some(Interrupt::Brk);
                self.state.result_a = self.status.stack_frame(software_break);
                (MicroCode::Push, St::Interrupt4)
            }
            St::Interrupt4 => {
                let vector = self.servicing.unwrap_or(Interrupt::Irq).vector();
                self.state.memory_address = vector;
                bus.read(self.state.memory_address)?;
                self.state.result_a = bus.value();
                (MicroCode::Nop, St::Interrupt5)
            }
            St::Interrupt5 => {
                self.state.memory_address = self.state.memory_address.wrapping_add(1);
                bus.read(self.state.memory_address)?;
                self.state.result_b = bus.value();
                (MicroCode::Nop, St::Interrupt6)
            }
            St::Interrupt6 => {
                self.state.memory_address =
                    u16::from(self.state.result_b) << 8 | u16::from(self.state.result_a);
                self.status.set_i(true);
                self.servicing = None;
                self.state
                    .set(Memory, AddressOperand::None, Pc, AluOp::None, false);
                (MicroCode::Addressing, St::None)
            }

            St::RelativeJump => {
                self.state
                    .set(Memory, AddressOperand::None, Pc, AluOp::None, false);
                (MicroCode::Relative, St::None)
            }

            // Loads.
            St::Lda1Immediate => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::Immediate, St::None)
            }
            St::Lda1ZeroPage => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Lda1ZeroPageX => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::ZeroPageX1, St::None)
            }
            St::Lda1Absolute => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::Absolute1, St::None)
            }
            St::Lda1AbsoluteX => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::AbsoluteX1, St::None)
            }
            St::Lda1AbsoluteY => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::AbsoluteY1, St::None)
            }
            St::Lda1IndirectX => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::IndirectX1, St::None)
            }
            St::Lda1IndirectY => {
                self.state
                    .set(Memory, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::IndirectY1, St::None)
            }

            St::Ldx1Immediate => {
                self.state
                    .set(Memory, AddressOperand::None, X, AluOp::None, true);
                (MicroCode::Immediate, St::None)
            }
            St::Ldx1ZeroPage => {
                self.state
                    .set(Memory, AddressOperand::None, X, AluOp::None, true);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Ldx1ZeroPageY => {
                self.state
                    .set(Memory, AddressOperand::None, X, AluOp::None, true);
                (MicroCode::ZeroPageY1, St::None)
            }
            St::Ldx1Absolute => {
                self.state
                    .set(Memory, AddressOperand::None, X, AluOp::None, true);
                (MicroCode::Absolute1, St::None)
            }

            St::Ldy1Immediate => {
                self.state
                    .set(Memory, AddressOperand::None, Y, AluOp::None, true);
                (MicroCode::Immediate, St::None)
            }
            St::Ldy1ZeroPage => {
                self.state
                    .set(Memory, AddressOperand::None, Y, AluOp::None, true);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Ldy1Absolute => {
                self.state
                    .set(Memory, AddressOperand::None, Y, AluOp::None, true);
                (MicroCode::Absolute1, St::None)
            }

            // Stores.
            St::Sta1ZeroPage => {
                self.state
                    .set(A, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Sta1ZeroPageX => {
                self.state
                    .set(A, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::ZeroPageX1, St::None)
            }
            St::Sta1Absolute => {
                self.state
                    .set(A, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::Absolute1, St::None)
            }
            St::Sta1AbsoluteX => {
                self.state
                    .set(A, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::AbsoluteX1, St::None)
            }
            St::Stx1ZeroPage => {
                self.state
                    .set(X, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Stx1Absolute => {
                self.state
                    .set(X, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::Absolute1, St::None)
            }
            St::Sty1ZeroPage => {
                self.state
                    .set(Y, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Sty1Absolute => {
                self.state
                    .set(Y, AddressOperand::None, Memory, AluOp::None, false);
                (MicroCode::Absolute1, St::None)
            }

            // Register transfers. TXS does not touch flags.
            St::Tax1Implied => {
                self.state
                    .set(A, AddressOperand::None, X, AluOp::None, true);
                (MicroCode::Addressing, St::None)
            }
            St::Tay1Implied => {
                self.state
                    .set(A, AddressOperand::None, Y, AluOp::None, true);
                (MicroCode::Addressing, St::None)
            }
            St::Txa1Implied => {
                self.state
                    .set(X, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::Addressing, St::None)
            }
            St::Tya1Implied => {
                self.state
                    .set(Y, AddressOperand::None, A, AluOp::None, true);
                (MicroCode::Addressing, St::None)
            }
            St::Txs1Implied => {
                self.state
                    .set(X, AddressOperand::None, S, AluOp::None, false);
                (MicroCode::Addressing, St::None)
            }

            // Register increments/decrements.
            St::Inx1Implied => {
                self.state.set(X, AddressOperand::None, X, AluOp::Inc, true);
                (MicroCode::Addressing, St::None)
            }
            St::Iny1Implied => {
                self.state.set(Y, AddressOperand::None, Y, AluOp::Inc, true);
                (MicroCode::Addressing, St::None)
            }
            St::Dex1Implied => {
                self.state.set(X, AddressOperand::None, X, AluOp::Dec, true);
                (MicroCode::Addressing, St::None)
            }
            St::Dey1Implied => {
                self.state.set(Y, AddressOperand::None, Y, AluOp::Dec, true);
                (MicroCode::Addressing, St::None)
            }

            // Memory read-modify-write: phase one latches the operand, phase
            // two rewinds PC so the same addressing chain resolves the same
            // address for the write-back.
            St::Inc1ZeroPage => {
                self.state.set(
                    Memory,
                    AddressOperand::None,
                    AddressOperand::None,
                    AluOp::None,
                    false,
                );
                (MicroCode::ZeroPage1, St::Inc2ZeroPage)
            }
            St::Inc2ZeroPage => {
                self.pc = self.pc.wrapping_sub(1);
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Memory,
                    AluOp::Inc,
                    true,
                );
                (MicroCode::ZeroPage1, St::None)
            }
            St::Dec1ZeroPage => {
                self.state.set(
                    Memory,
                    AddressOperand::None,
                    AddressOperand::None,
                    AluOp::None,
                    false,
                );
                (MicroCode::ZeroPage1, St::Dec2ZeroPage)
            }
            St::Dec2ZeroPage => {
                self.pc = self.pc.wrapping_sub(1);
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Memory,
                    AluOp::Dec,
                    true,
                );
                (MicroCode::ZeroPage1, St::None)
            }

            // Arithmetic and logic.
            St::Adc1Immediate => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::Immediate, St::None)
            }
            St::Adc1ZeroPage => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Adc1ZeroPageX => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::ZeroPageX1, St::None)
            }
            St::Adc1Absolute => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::Absolute1, St::None)
            }
            St::Adc1AbsoluteX => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::AbsoluteX1, St::None)
            }
            St::Adc1AbsoluteY => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::AbsoluteY1, St::None)
            }
            St::Adc1IndirectX => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::IndirectX1, St::None)
            }
            St::Adc1IndirectY => {
                self.state.set(A, Memory, A, AluOp::Adc, true);
                (MicroCode::IndirectY1, St::None)
            }

            St::And1Immediate => {
                self.state.set(A, Memory, A, AluOp::And, true);
                (MicroCode::Immediate, St::None)
            }
            St::And1ZeroPageX => {
                self.state.set(A, Memory, A, AluOp::And, true);
                (MicroCode::ZeroPageX1, St::None)
            }
            St::Ora1Immediate => {
                self.state.set(A, Memory, A, AluOp::Or, true);
                (MicroCode::Immediate, St::None)
            }
            St::Ora1ZeroPage => {
                self.state.set(A, Memory, A, AluOp::Or, true);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Eor1Immediate => {
                self.state.set(A, Memory, A, AluOp::Xor, true);
                (MicroCode::Immediate, St::None)
            }

            // Compares write flags only.
            St::Cmp1Immediate => {
                self.state
                    .set(A, Memory, AddressOperand::None, AluOp::Compare, true);
                (MicroCode::Immediate, St::None)
            }
            St::Cmp1ZeroPage => {
                self.state
                    .set(A, Memory, AddressOperand::None, AluOp::Compare, true);
                (MicroCode::ZeroPage1, St::None)
            }
            St::Cmp1ZeroPageX => {
                self.state
                    .set(A, Memory, AddressOperand::None, AluOp::Compare, true);
                (MicroCode::ZeroPageX1, St::None)
            }
            St::Cmp1Absolute => {
                self.state
                    .set(A, Memory, AddressOperand::None, AluOp::Compare, true);
                (MicroCode::Absolute1, St::None)
            }
            St::Cpx1Immediate => {
                self.state
                    .set(X, Memory, AddressOperand::None, AluOp::Compare, true);
                (MicroCode::Immediate, St::None)
            }
            St::Cpy1Immediate => {
                self.state
                    .set(Y, Memory, AddressOperand::None, AluOp::Compare, true);
                (MicroCode::Immediate, St::None)
            }

            St::Bit1Absolute => {
                self.state
                    .set(A, Memory, AddressOperand::None, AluOp::BitTest, true);
                (MicroCode::Absolute1, St::None)
            }

            // Shifts and rotates.
            St::Asl1Accumulator => {
                self.state.set(A, AddressOperand::None, A, AluOp::Asl, true);
                (MicroCode::Addressing, St::None)
            }
            St::Asl1ZeroPage => {
                self.state.set(
                    Memory,
                    AddressOperand::None,
                    AddressOperand::None,
                    AluOp::None,
                    false,
                );
                (MicroCode::ZeroPage1, St::Asl2ZeroPage)
            }
            St::Asl2ZeroPage => {
                self.pc = self.pc.wrapping_sub(1);
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Memory,
                    AluOp::Asl,
                    true,
                );
                (MicroCode::ZeroPage1, St::None)
            }
            St::Rol1Accumulator => {
                self.state.set(A, AddressOperand::None, A, AluOp::Rol, true);
                (MicroCode::Addressing, St::None)
            }
            St::Rol1ZeroPage => {
                self.state.set(
                    Memory,
                    AddressOperand::None,
                    AddressOperand::None,
                    AluOp::None,
                    false,
                );
                (MicroCode::ZeroPage1, St::Rol2ZeroPage)
            }
            St::Rol2ZeroPage => {
                self.pc = self.pc.wrapping_sub(1);
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Memory,
                    AluOp::Rol,
                    true,
                );
                (MicroCode::ZeroPage1, St::None)
            }
            St::Lsr1Accumulator => {
                self.state.set(A, AddressOperand::None, A, AluOp::Lsr, true);
                (MicroCode::Addressing, St::None)
            }
            St::Lsr1ZeroPage => {
                self.state.set(
                    Memory,
                    AddressOperand::None,
                    AddressOperand::None,
                    AluOp::None,
                    false,
                );
                (MicroCode::ZeroPage1, St::Lsr2ZeroPage)
            }
            St::Lsr2ZeroPage => {
                self.pc = self.pc.wrapping_sub(1);
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Memory,
                    AluOp::Lsr,
                    true,
                );
                (MicroCode::ZeroPage1, St::None)
            }
            St::Ror1Accumulator => {
                self.state.set(A, AddressOperand::None, A, AluOp::Ror, true);
                (MicroCode::Addressing, St::None)
            }
            St::Ror1ZeroPage => {
                self.state.set(
                    Memory,
                    AddressOperand::None,
                    AddressOperand::None,
                    AluOp::None,
                    false,
                );
                (MicroCode::ZeroPage1, St::Ror2ZeroPage)
            }
            St::Ror2ZeroPage => {
                self.pc = self.pc.wrapping_sub(1);
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Memory,
                    AluOp::Ror,
                    true,
                );
                (MicroCode::ZeroPage1, St::None)
            }

            // Flow control. JSR pushes the address of its own last operand
            // byte; RTS compensates with the +1.
            St::Jmp1Absolute => {
                self.state
                    .set(Memory, AddressOperand::None, Pc, AluOp::None, false);
                (MicroCode::Absolute1, St::None)
            }
            St::Jsr1Absolute => {
                self.state.result_a = (self.pc.wrapping_add(1) >> 8) as u8;
                (MicroCode::Push, St::Jsr2Absolute)
            }
            St::Jsr2Absolute => {
                self.state.result_a = self.pc.wrapping_add(1) as u8;
                (MicroCode::Push, St::Jsr3Absolute)
            }
            St::Jsr3Absolute => {
                self.state
                    .set(Memory, AddressOperand::None, Pc, AluOp::None, false);
                (MicroCode::Absolute1, St::None)
            }

            St::Rts1Implied => (MicroCode::Pop, St::Rts2Implied),
            St::Rts2Implied => {
                self.state.memory_address = u16::from(self.state.result_a);
                (MicroCode::Pop, St::Rts3Implied)
            }
            St::Rts3Implied => {
                self.state.memory_address |= u16::from(self.state.result_a) << 8;
                (MicroCode::Nop, St::Rts4Implied)
            }
            St::Rts4Implied => {
                self.state.memory_address = self.state.memory_address.wrapping_add(1);
                (MicroCode::Nop, St::Rts5Implied)
            }
            St::Rts5Implied => {
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Pc,
                    AluOp::None,
                    false,
                );
                (MicroCode::Addressing, St::None)
            }

            St::Rti1Implied => (MicroCode::Pop, St::Rti2Implied),
            St::Rti2Implied => {
                self.status.set_bits(self.state.result_a);
                (MicroCode::Pop, St::Rti3Implied)
            }
            St::Rti3Implied => {
                self.state.memory_address = u16::from(self.state.result_a);
                (MicroCode::Pop, St::Rti4Implied)
            }
            St::Rti4Implied => {
                self.state.memory_address |= u16::from(self.state.result_a) << 8;
                (MicroCode::Nop, St::Rti5Implied)
            }
            St::Rti5Implied => {
                self.state.set(
                    AddressOperand::None,
                    AddressOperand::None,
                    Pc,
                    AluOp::None,
                    false,
                );
                (MicroCode::Addressing, St::None)
            }

            // Branches: a not-taken branch skips the displacement byte; a
            // taken one spends an extra tick in RelativeJump.
            St::Bpl1Relative => self.branch(!self.status.n()),
            St::Bmi1Relative => self.branch(self.status.n()),
            St::Bne1Relative => self.branch(!self.status.z()),
            St::Beq1Relative => self.branch(self.status.z()),
            St::Bcc1Relative => self.branch(!self.status.c()),
            St::Bcs1Relative => self.branch(self.status.c()),

            // Flag instructions.
            St::Sei1Implied => {
                self.status.set_i(true);
                (MicroCode::Nop, St::None)
            }
            St::Cli1Implied => {
                self.status.set_i(false);
                (MicroCode::Nop, St::None)
            }
            St::Sec1Implied => {
                self.status.set_c(true);
                (MicroCode::Nop, St::None)
            }
            St::Clc1Implied => {
                self.status.set_c(false);
                (MicroCode::Nop, St::None)
            }
            St::Cld1Implied => {
                self.status.set_d(false);
                (MicroCode::Nop, St::None)
            }
            St::Clv1Implied => {
                self.status.set_v(false);
                (MicroCode::Nop, St::None)
            }

            // Stack instructions. PHP pushes with the break bit set.
            St::Pha1Implied => {
                self.state.result_a = self.a;
                (MicroCode::Push, St::None)
            }
            St::Php1Implied => {
                self.state.result_a = self.status.stack_frame(true);
                (MicroCode::Push, St::None)
            }
            St::Pla1Implied => (MicroCode::Pop, St::Pla2Implied),
            St::Pla2Implied => {
                self.a = self.state.result_a;
                self.status.set_nz(self.a);
                (MicroCode::Nop, St::None)
            }
            St::Plp1Implied => (MicroCode::Pop, St::Plp2Implied),
            St::Plp2Implied => {
                self.status.set_bits(self.state.result_a);
                (MicroCode::Nop, St::None)
            }

            St::Nop1Implied => (MicroCode::Nop, St::None),
        })
    }

    fn branch(&mut self, taken: bool) -> (MicroCode, OpCodeStatus) {
        if taken {
            (MicroCode::Nop, OpCodeStatus::RelativeJump)
        } else {
            self.pc = self.pc.wrapping_add(1);
            (MicroCode::Nop, OpCodeStatus::None)
        }
    }
}
