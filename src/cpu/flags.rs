//! 6502 processor status register (P) as a value type.

const CARRY: u8 = 1 << 0;
const ZERO: u8 = 1 << 1;
const INTERRUPT_DISABLE: u8 = 1 << 2;
const DECIMAL: u8 = 1 << 3; // NES ALU ignores decimal mode
const BREAK: u8 = 1 << 4; // Only exists in stack frames
const UNUSED: u8 = 1 << 5; // Always 1 when read on 6502
const OVERFLOW: u8 = 1 << 6;
const NEGATIVE: u8 = 1 << 7;

/// The P register. A plain byte underneath; the accessors keep flag math out
/// of the instruction code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStatus(u8);

impl ProcessorStatus {
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn set_bits(&mut self, bits: u8) {
        self.0 = bits;
    }

    /// The byte pushed during BRK/IRQ/NMI: bit 5 always set, bit 4 set only
    /// for a software break.
    pub fn stack_frame(self, software_break: bool) -> u8 {
        let mut bits = self.0 | UNUSED;
        if software_break {
            bits |= BREAK;
        } else {
            bits &= !BREAK;
        }
        bits
    }

    fn get(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    fn set(&mut self, mask: u8, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    pub fn c(self) -> bool {
        self.get(CARRY)
    }

    pub fn set_c(&mut self, value: bool) {
        self.set(CARRY, value);
    }

    pub fn z(self) -> bool {
        self.get(ZERO)
    }

    pub fn set_z(&mut self, value: bool) {
        self.set(ZERO, value);
    }

    pub fn i(self) -> bool {
        self.get(INTERRUPT_DISABLE)
    }

    pub fn set_i(&mut self, value: bool) {
        self.set(INTERRUPT_DISABLE, value);
    }

    pub fn d(self) -> bool {
        self.get(DECIMAL)
    }

    pub fn set_d(&mut self, value: bool) {
        self.set(DECIMAL, value);
    }

    pub fn v(self) -> bool {
        self.get(OVERFLOW)
    }

    pub fn set_v(&mut self, value: bool) {
        self.set(OVERFLOW, value);
    }

    pub fn n(self) -> bool {
        self.get(NEGATIVE)
    }

    pub fn set_n(&mut self, value: bool) {
        self.set(NEGATIVE, value);
    }

    /// N and Z from a result byte, the update almost every instruction wants.
    pub fn set_nz(&mut self, result: u8) {
        self.set_n(result & 0x80 != 0);
        self.set_z(result == 0);
    }
}
