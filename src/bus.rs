//! Shared address bus: slave registration, cached address decoding, and
//! master arbitration.
//!
//! A [`Bus`] owns a memory map, not the devices themselves: slaves register
//! as `(base, size, device id)` windows and the bus resolves an address to
//! `(device id, offset)` through a per-direction 64 Ki dispatch table,
//! rebuilt lazily after any registration change. The id type is supplied by
//! the board (a small `Copy` enum), which keeps device storage out of the
//! bus entirely.
//!
//! The bus also models the single physical wire: one data latch byte and one
//! ownership token. A bus master (CPU or OAM DMA) checks `try_acquire`
//! before driving a transaction; DMA `acquire`s for the length of a transfer
//! and the CPU skips its turn while the token is held.

use thiserror::Error;

/// Errors raised by bus configuration and bus transactions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    /// Two same-direction slave windows intersect; detected at registration.
    #[error("memory window {base:#06X}+{size:#X} overlaps {other_base:#06X}+{other_size:#X}")]
    Overlap {
        base: u16,
        size: u16,
        other_base: u16,
        other_size: u16,
    },
    /// No slave is registered at the address for the requested direction.
    #[error("no slave mapped at address {address:#06X}")]
    AccessViolation { address: u16 },
    /// The resolved slave does not support reads at this address.
    #[error("read unsupported at address {address:#06X}")]
    ReadUnsupported { address: u16 },
    /// The resolved slave does not support writes at this address (e.g. ROM).
    #[error("write unsupported at address {address:#06X}")]
    WriteUnsupported { address: u16 },
}

/// Which directions a slave window serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveAccess {
    Read,
    Write,
    ReadWrite,
}

impl SlaveAccess {
    fn readable(self) -> bool {
        matches!(self, SlaveAccess::Read | SlaveAccess::ReadWrite)
    }

    fn writable(self) -> bool {
        matches!(self, SlaveAccess::Write | SlaveAccess::ReadWrite)
    }
}

/// A memory-mapped device: a byte-addressable window of `footprint` bytes.
///
/// Offsets passed to `read`/`write` are window-relative. Implementors that
/// are read-only (or write-only) fail loudly instead of faking a value, so
/// mapper and register bugs surface immediately.
pub trait BusSlave {
    /// Size of the address window this device occupies by default.
    fn footprint(&self) -> u16;

    fn read(&mut self, offset: u16) -> Result<u8, BusError>;

    fn write(&mut self, offset: u16, value: u8) -> Result<(), BusError>;
}

/// The master-side handle of a bus: what the CPU and the DMA controller see.
///
/// `read`/`write` move bytes through the `value` data latch, mirroring the
/// physical wire: a read latches the slave's byte into `value`, a write
/// drives the latched byte onto the slave.
pub trait BusMaster {
    /// Seize the bus. Transactions by other masters must be skipped until
    /// `release`.
    fn acquire(&mut self);

    /// True when the bus is free (or already held by the caller this tick).
    /// Does not seize.
    fn try_acquire(&mut self) -> bool;

    fn release(&mut self);

    /// The data latch for the pending transaction.
    fn value(&self) -> u8;

    fn set_value(&mut self, value: u8);

    /// Resolve `address` and latch the slave's byte into `value`.
    fn read(&mut self, address: u16) -> Result<(), BusError>;

    /// Resolve `address` and drive the latched `value` byte onto the slave.
    fn write(&mut self, address: u16) -> Result<(), BusError>;
}

#[derive(Clone, Copy)]
struct Registration<D> {
    base: u16,
    size: u16,
    device: D,
}

impl<D> Registration<D> {
    /// Window end as u32: a window may end exactly at 0x10000.
    fn end(&self) -> u32 {
        u32::from(self.base) + u32::from(self.size)
    }

    fn contains(&self, address: u16) -> bool {
        address >= self.base && u32::from(address) < self.end()
    }
}

/// Address decoder + master arbitration for one bus.
///
/// `D` is the board's device-id type; dispatch tables store `(D, offset)` so
/// resolution after the first access is a single indexed load.
pub struct Bus<D> {
    read_slaves: Vec<Registration<D>>,
    write_slaves: Vec<Registration<D>>,
    read_map: Vec<Option<(D, u16)>>,
    write_map: Vec<Option<(D, u16)>>,
    dirty: bool,
    seized: bool,
    value: u8,
}

impl<D: Copy> Bus<D> {
    pub fn new() -> Self {
        Self {
            read_slaves: Vec::new(),
            write_slaves: Vec::new(),
            read_map: vec![None; 0x10000],
            write_map: vec![None; 0x10000],
            dirty: true,
            seized: false,
            value: 0,
        }
    }

    /// Register a device window at `base`. Fails if the window intersects an
    /// already-registered window in the same direction; read and write maps
    /// are independent, so a write-only window may sit inside a read window.
    pub fn add_slave(
        &mut self,
        base: u16,
        access: SlaveAccess,
        size: u16,
        device: D,
    ) -> Result<(), BusError> {
        let new = Registration { base, size, device };
        if access.readable() {
            Self::insert(&mut self.read_slaves, new)?;
        }
        if access.writable() {
            Self::insert(&mut self.write_slaves, new)?;
        }
        self.dirty = true;
        Ok(())
    }

    fn insert(slaves: &mut Vec<Registration<D>>, new: Registration<D>) -> Result<(), BusError> {
        for existing in slaves.iter() {
            let disjoint =
                new.end() <= u32::from(existing.base) || u32::from(new.base) >= existing.end();
            if !disjoint {
                return Err(BusError::Overlap {
                    base: new.base,
                    size: new.size,
                    other_base: existing.base,
                    other_size: existing.size,
                });
            }
        }
        slaves.push(new);
        Ok(())
    }

    /// Resolve a read address to `(device id, window offset)`, rebuilding the
    /// dispatch tables first if a registration happened since the last
    /// resolution.
    pub fn resolve_read(&mut self, address: u16) -> Result<(D, u16), BusError> {
        self.rebuild_if_dirty();
        self.read_map[address as usize].ok_or(BusError::AccessViolation { address })
    }

    /// Resolve a write address to `(device id, window offset)`.
    pub fn resolve_write(&mut self, address: u16) -> Result<(D, u16), BusError> {
        self.rebuild_if_dirty();
        self.write_map[address as usize].ok_or(BusError::AccessViolation { address })
    }

    fn rebuild_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        for address in 0..=0xFFFFu16 {
            self.read_map[address as usize] = Self::find(&self.read_slaves, address);
            self.write_map[address as usize] = Self::find(&self.write_slaves, address);
        }
        self.dirty = false;
    }

    fn find(slaves: &[Registration<D>], address: u16) -> Option<(D, u16)> {
        slaves
            .iter()
            .find(|r| r.contains(address))
            .map(|r| (r.device, address - r.base))
    }

    // Master-handle state. The token is a plain flag: the whole system is
    // single-threaded and a tick is atomic, so no lock is needed.

    pub fn acquire(&mut self) {
        self.seized = true;
    }

    pub fn try_acquire(&self) -> bool {
        !self.seized
    }

    pub fn release(&mut self) {
        self.seized = false;
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }
}

impl<D: Copy> Default for Bus<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Dev {
        A,
        B,
    }

    #[test]
    fn disjoint_windows_register() {
        let mut bus = Bus::new();
        bus.add_slave(0x0000, SlaveAccess::ReadWrite, 0x800, Dev::A)
            .unwrap();
        bus.add_slave(0x0800, SlaveAccess::ReadWrite, 0x800, Dev::B)
            .unwrap();
        assert_eq!(bus.resolve_read(0x0000).unwrap(), (Dev::A, 0x0000));
        assert_eq!(bus.resolve_read(0x07FF).unwrap(), (Dev::A, 0x07FF));
        assert_eq!(bus.resolve_read(0x0800).unwrap(), (Dev::B, 0x0000));
    }

    #[test]
    fn overlapping_windows_rejected() {
        let mut bus = Bus::new();
        bus.add_slave(0x2000, SlaveAccess::ReadWrite, 0x100, Dev::A)
            .unwrap();
        let err = bus
            .add_slave(0x20FF, SlaveAccess::ReadWrite, 0x10, Dev::B)
            .unwrap_err();
        assert!(matches!(err, BusError::Overlap { base: 0x20FF, .. }));
    }

    #[test]
    fn opposite_directions_may_overlap() {
        let mut bus = Bus::new();
        bus.add_slave(0x4000, SlaveAccess::Read, 0x20, Dev::A)
            .unwrap();
        bus.add_slave(0x4014, SlaveAccess::Write, 1, Dev::B).unwrap();
        assert_eq!(bus.resolve_read(0x4014).unwrap(), (Dev::A, 0x14));
        assert_eq!(bus.resolve_write(0x4014).unwrap(), (Dev::B, 0));
    }

    #[test]
    fn window_may_end_at_address_space_top() {
        let mut bus = Bus::new();
        bus.add_slave(0x4020, SlaveAccess::ReadWrite, 0xBFE0, Dev::A)
            .unwrap();
        assert_eq!(bus.resolve_read(0xFFFF).unwrap(), (Dev::A, 0xBFDF));
    }

    #[test]
    fn unmapped_address_is_access_violation() {
        let mut bus: Bus<Dev> = Bus::new();
        assert_eq!(
            bus.resolve_read(0x5000),
            Err(BusError::AccessViolation { address: 0x5000 })
        );
    }

    #[test]
    fn registration_after_resolution_rebuilds_tables() {
        let mut bus = Bus::new();
        bus.add_slave(0x0000, SlaveAccess::ReadWrite, 0x800, Dev::A)
            .unwrap();
        assert!(bus.resolve_read(0x1000).is_err());
        bus.add_slave(0x1000, SlaveAccess::ReadWrite, 0x800, Dev::B)
            .unwrap();
        assert_eq!(bus.resolve_read(0x1000).unwrap(), (Dev::B, 0));
    }

    #[test]
    fn ownership_token_is_single_owner() {
        let mut bus: Bus<Dev> = Bus::new();
        assert!(bus.try_acquire());
        bus.acquire();
        assert!(!bus.try_acquire());
        bus.release();
        assert!(bus.try_acquire());
    }
}
