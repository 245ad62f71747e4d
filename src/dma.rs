//! OAM DMA ($4014): copies a 256-byte CPU page into sprite memory.
//!
//! A write to $4014 arms the engine; on its next tick it seizes the CPU bus
//! and starts streaming one read/write pair per tick, reading `page << 8 | i`
//! and forwarding the byte to the PPU's OAM data port at $2004. The full page
//! takes 256 ticks, and the CPU sees a seized bus the whole time and stalls.
//! See <https://www.nesdev.org/wiki/DMA>.

use log::debug;

use crate::bus::{BusError, BusMaster, BusSlave};

const DMA_REGISTER: u16 = 0x4014;
const OAM_DATA_PORT: u16 = 0x2004;

pub struct OamDma {
    page: u8,
    armed: bool,
    transfer: Option<u16>,
}

impl OamDma {
    pub fn new() -> Self {
        Self {
            page: 0,
            armed: false,
            transfer: None,
        }
    }

    pub fn power_on(&mut self) {
        *self = Self::new();
    }

    /// A transfer is armed or in flight.
    pub fn active(&self) -> bool {
        self.armed || self.transfer.is_some()
    }

    /// One CPU-rate tick. While a transfer runs the DMA is the sole bus
    /// master, so a tick carries both halves of a byte: the source read and
    /// the $2004 write.
    pub fn tick<M: BusMaster>(&mut self, bus: &mut M) -> Result<(), BusError> {
        if self.armed {
            self.armed = false;
            bus.acquire();
            self.transfer = Some(0);
            debug!("OAM DMA from {:#06X}", u16::from(self.page) << 8);
        }

        let Some(index) = self.transfer else {
            return Ok(());
        };

        bus.read((u16::from(self.page) << 8) | index)?;
        bus.write(OAM_DATA_PORT)?;
        if index == 0xFF {
            bus.release();
            self.transfer = None;
            debug!("OAM DMA complete");
        } else {
            self.transfer = Some(index + 1);
        }
        Ok(())
    }
}

impl Default for OamDma {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSlave for OamDma {
    fn footprint(&self) -> u16 {
        1
    }

    fn read(&mut self, _offset: u16) -> Result<u8, BusError> {
        Err(BusError::ReadUnsupported {
            address: DMA_REGISTER,
        })
    }

    fn write(&mut self, _offset: u16, value: u8) -> Result<(), BusError> {
        self.page = value;
        self.armed = true;
        Ok(())
    }
}
