//! Board wiring: device arena, both buses, and the run surface.
//!
//! All devices live as plain fields on the [`Board`]; the buses only hold
//! `(device id, window)` registrations. Each tick borrows a short-lived bus
//! view over disjoint fields, so the CPU, the DMA engine and the PPU can all
//! drive transactions without any shared-ownership plumbing.
//!
//! Address map (CPU side): work RAM mirrored four times through $0000-$1FFF,
//! PPU registers mirrored through $2000-$3FFF, APU registers at $4000-$4013
//! and $4015-$4017 bracketing the write-only OAM DMA port at $4014, and the
//! cartridge over $4020-$FFFF. PPU side: cartridge CHR at $0000-$1FFF,
//! nametables at $2000-$2FFF plus their $3000-$3EFF mirror, palette RAM at
//! $3F00-$3FFF.

use log::info;
use thiserror::Error;

use crate::apu::ApuRegisters;
use crate::bus::{Bus, BusError, BusMaster, BusSlave, SlaveAccess};
use crate::cartridge::{Cartridge, CartridgeError};
use crate::clock::{Clock, SinkHost};
use crate::cpu::{Cpu, CpuError, Interrupt};
use crate::dma::OamDma;
use crate::ppu::{NametableMirror, PaletteRam, PixelSink, Ppu};
use crate::ram::OnChipRam;

#[derive(Debug, Error)]
pub enum EmuError {
    #[error(transparent)]
    Cpu(#[from] CpuError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Cartridge(#[from] CartridgeError),

    #[error("no cartridge inserted")]
    NoCartridge,
}

/// Devices addressable on the CPU bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CpuDevice {
    Ram,
    PpuRegisters,
    ApuLow,
    ApuHigh,
    OamDma,
    Cartridge,
}

/// Devices addressable on the PPU bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PpuDevice {
    Cartridge,
    Nametables,
    Palette,
}

/// Clock sinks, in schedule order: CPU, work RAM and DMA in the 1× domain,
/// PPU 3×. RAM has no per-tick work but still sits in the schedule for its
/// power-on hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkId {
    Cpu,
    Ram,
    Dma,
    Ppu,
}

const CARTRIDGE_CPU_BASE: u16 = 0x4020;

/// The PPU's side of the machine as one [`BusMaster`]: address decoding over
/// CHR, nametables and palette RAM.
struct PpuBusView<'a> {
    bus: &'a mut Bus<PpuDevice>,
    nametables: &'a mut NametableMirror,
    palette: &'a mut PaletteRam,
    cartridge: &'a mut Option<Cartridge>,
}

impl PpuBusView<'_> {
    fn cartridge(&mut self, address: u16) -> Result<&mut Cartridge, BusError> {
        self.cartridge
            .as_mut()
            .ok_or(BusError::AccessViolation { address })
    }
}

impl BusMaster for PpuBusView<'_> {
    fn acquire(&mut self) {
        self.bus.acquire();
    }

    fn try_acquire(&mut self) -> bool {
        self.bus.try_acquire()
    }

    fn release(&mut self) {
        self.bus.release();
    }

    fn value(&self) -> u8 {
        self.bus.value()
    }

    fn set_value(&mut self, value: u8) {
        self.bus.set_value(value);
    }

    fn read(&mut self, address: u16) -> Result<(), BusError> {
        let (device, offset) = self.bus.resolve_read(address)?;
        let byte = match device {
            PpuDevice::Cartridge => self.cartridge(address)?.ppu_read(offset)?,
            PpuDevice::Nametables => self.nametables.read(offset)?,
            PpuDevice::Palette => self.palette.read(offset)?,
        };
        self.bus.set_value(byte);
        Ok(())
    }

    fn write(&mut self, address: u16) -> Result<(), BusError> {
        let (device, offset) = self.bus.resolve_write(address)?;
        let value = self.bus.value();
        match device {
            PpuDevice::Cartridge => self.cartridge(address)?.ppu_write(offset, value),
            PpuDevice::Nametables => self.nametables.write(offset, value),
            PpuDevice::Palette => self.palette.write(offset, value),
        }
    }
}

/// The CPU's (and DMA's) side of the machine as one [`BusMaster`].
///
/// `dma` is `None` while the DMA engine itself is the driving master, so the
/// engine never aliases itself; during that window a write to $4014 is
/// rejected instead of re-arming.
struct CpuBusView<'a> {
    bus: &'a mut Bus<CpuDevice>,
    ram: &'a mut OnChipRam,
    apu_low: &'a mut ApuRegisters,
    apu_high: &'a mut ApuRegisters,
    dma: Option<&'a mut OamDma>,
    ppu: &'a mut Ppu,
    ppu_bus: &'a mut Bus<PpuDevice>,
    nametables: &'a mut NametableMirror,
    palette: &'a mut PaletteRam,
    cartridge: &'a mut Option<Cartridge>,
}

impl CpuBusView<'_> {
    fn cartridge(&mut self, address: u16) -> Result<&mut Cartridge, BusError> {
        self.cartridge
            .as_mut()
            .ok_or(BusError::AccessViolation { address })
    }
}

impl BusMaster for CpuBusView<'_> {
    fn acquire(&mut self) {
        self.bus.acquire();
    }

    fn try_acquire(&mut self) -> bool {
        self.bus.try_acquire()
    }

    fn release(&mut self) {
        self.bus.release();
    }

    fn value(&self) -> u8 {
        self.bus.value()
    }

    fn set_value(&mut self, value: u8) {
        self.bus.set_value(value);
    }

    fn read(&mut self, address: u16) -> Result<(), BusError> {
        let (device, offset) = self.bus.resolve_read(address)?;
        let byte = match device {
            CpuDevice::Ram => self.ram.read(offset)?,
            CpuDevice::PpuRegisters => {
                let mut ppu_bus = PpuBusView {
                    bus: self.ppu_bus,
                    nametables: self.nametables,
                    palette: self.palette,
                    cartridge: self.cartridge,
                };
                self.ppu.read_register(offset & 0x07, &mut ppu_bus)?
            }
            CpuDevice::ApuLow => self.apu_low.read(offset)?,
            CpuDevice::ApuHigh => self.apu_high.read(offset)?,
            // $4014 is registered write-only; a read never resolves here.
            CpuDevice::OamDma => return Err(BusError::ReadUnsupported { address }),
            CpuDevice::Cartridge => self.cartridge(address)?.cpu_read(offset)?,
        };
        self.bus.set_value(byte);
        Ok(())
    }

    fn write(&mut self, address: u16) -> Result<(), BusError> {
        let (device, offset) = self.bus.resolve_write(address)?;
        let value = self.bus.value();
        match device {
            CpuDevice::Ram => self.ram.write(offset, value),
            CpuDevice::PpuRegisters => {
                let mut ppu_bus = PpuBusView {
                    bus: self.ppu_bus,
                    nametables: self.nametables,
                    palette: self.palette,
                    cartridge: self.cartridge,
                };
                self.ppu.write_register(offset & 0x07, value, &mut ppu_bus)
            }
            CpuDevice::ApuLow => self.apu_low.write(offset, value),
            CpuDevice::ApuHigh => self.apu_high.write(offset, value),
            CpuDevice::OamDma => match self.dma.as_deref_mut() {
                Some(dma) => dma.write(offset, value),
                None => Err(BusError::WriteUnsupported { address }),
            },
            CpuDevice::Cartridge => self.cartridge(address)?.cpu_write(offset, value),
        }
    }
}

/// Owns every device. Ticked by the [`Clock`] through [`SinkHost`]; the
/// first fault latches and freezes the board until the caller collects it.
struct Board<V> {
    cpu: Cpu,
    ram: OnChipRam,
    apu_low: ApuRegisters,
    apu_high: ApuRegisters,
    dma: OamDma,
    ppu: Ppu,
    nametables: NametableMirror,
    palette: PaletteRam,
    cartridge: Option<Cartridge>,
    cpu_bus: Bus<CpuDevice>,
    ppu_bus: Bus<PpuDevice>,
    sink: V,
    fault: Option<EmuError>,
}

impl<V: PixelSink> Board<V> {
    fn tick_cpu(&mut self) -> Result<(), EmuError> {
        let Board {
            cpu,
            ram,
            apu_low,
            apu_high,
            dma,
            ppu,
            nametables,
            palette,
            cartridge,
            cpu_bus,
            ppu_bus,
            ..
        } = self;
        let mut view = CpuBusView {
            bus: cpu_bus,
            ram,
            apu_low,
            apu_high,
            dma: Some(dma),
            ppu,
            ppu_bus,
            nametables,
            palette,
            cartridge,
        };
        cpu.tick(&mut view)?;
        Ok(())
    }

    fn tick_dma(&mut self) -> Result<(), EmuError> {
        if !self.dma.active() {
            return Ok(());
        }
        let Board {
            dma,
            ram,
            apu_low,
            apu_high,
            ppu,
            nametables,
            palette,
            cartridge,
            cpu_bus,
            ppu_bus,
            ..
        } = self;
        let mut view = CpuBusView {
            bus: cpu_bus,
            ram,
            apu_low,
            apu_high,
            dma: None,
            ppu,
            ppu_bus,
            nametables,
            palette,
            cartridge,
        };
        dma.tick(&mut view)?;
        Ok(())
    }

    fn tick_ppu(&mut self) -> Result<(), EmuError> {
        let Board {
            cpu,
            ppu,
            nametables,
            palette,
            cartridge,
            ppu_bus,
            sink,
            ..
        } = self;
        let mut view = PpuBusView {
            bus: ppu_bus,
            nametables,
            palette,
            cartridge,
        };
        ppu.tick(&mut view, sink)?;
        if ppu.take_nmi_request() {
            cpu.request_interrupt(Interrupt::Nmi);
        }
        Ok(())
    }

    fn power_on_cpu(&mut self) -> Result<(), EmuError> {
        let Board {
            cpu,
            ram,
            apu_low,
            apu_high,
            dma,
            ppu,
            nametables,
            palette,
            cartridge,
            cpu_bus,
            ppu_bus,
            ..
        } = self;
        let mut view = CpuBusView {
            bus: cpu_bus,
            ram,
            apu_low,
            apu_high,
            dma: Some(dma),
            ppu,
            ppu_bus,
            nametables,
            palette,
            cartridge,
        };
        cpu.power_on(&mut view)?;
        Ok(())
    }

    fn record(&mut self, result: Result<(), EmuError>) {
        if self.fault.is_none()
            && let Err(error) = result
        {
            self.fault = Some(error);
        }
    }

    fn take_fault(&mut self) -> Result<(), EmuError> {
        match self.fault.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<V: PixelSink> SinkHost<SinkId> for Board<V> {
    fn tick(&mut self, sink: SinkId) {
        if self.fault.is_some() {
            return;
        }
        let result = match sink {
            SinkId::Cpu => self.tick_cpu(),
            SinkId::Ram => Ok(()),
            SinkId::Dma => self.tick_dma(),
            SinkId::Ppu => self.tick_ppu(),
        };
        self.record(result);
    }

    fn power_on(&mut self, sink: SinkId) {
        match sink {
            SinkId::Cpu => {
                let result = self.power_on_cpu();
                self.record(result);
            }
            SinkId::Ram => self.ram.power_on(),
            SinkId::Dma => self.dma.power_on(),
            SinkId::Ppu => self.ppu.power_on(),
        }
    }

    fn reset(&mut self, sink: SinkId) {
        match sink {
            SinkId::Cpu => self.cpu.reset(),
            SinkId::Ram => {}
            SinkId::Dma => self.dma.power_on(),
            SinkId::Ppu => self.ppu.reset(),
        }
    }
}

/// A complete console: clock plus board. `V` receives the video output.
pub struct NesSystem<V> {
    clock: Clock<SinkId>,
    board: Board<V>,
}

impl<V: PixelSink> NesSystem<V> {
    pub fn new(sink: V) -> Result<Self, EmuError> {
        let ram = OnChipRam::new();
        let apu_low = ApuRegisters::new(0x4000, 0x14);
        let apu_high = ApuRegisters::new(0x4015, 3);
        let dma = OamDma::new();
        let nametables = NametableMirror::new();
        let palette = PaletteRam::new();

        // Devices sit at their natural footprint; explicit sizes are only
        // given for windows wider than the device (register mirrors, the
        // cartridge span) or narrower ones (the $3000 nametable mirror).
        let mut cpu_bus = Bus::new();
        let ram_size = ram.footprint();
        for mirror in 0..4 {
            cpu_bus.add_slave(
                mirror * ram_size,
                SlaveAccess::ReadWrite,
                ram_size,
                CpuDevice::Ram,
            )?;
        }
        cpu_bus.add_slave(0x2000, SlaveAccess::ReadWrite, 0x2000, CpuDevice::PpuRegisters)?;
        cpu_bus.add_slave(
            0x4000,
            SlaveAccess::ReadWrite,
            apu_low.footprint(),
            CpuDevice::ApuLow,
        )?;
        cpu_bus.add_slave(0x4014, SlaveAccess::Write, dma.footprint(), CpuDevice::OamDma)?;
        cpu_bus.add_slave(
            0x4015,
            SlaveAccess::ReadWrite,
            apu_high.footprint(),
            CpuDevice::ApuHigh,
        )?;
        cpu_bus.add_slave(
            CARTRIDGE_CPU_BASE,
            SlaveAccess::ReadWrite,
            0xBFE0,
            CpuDevice::Cartridge,
        )?;

        let mut ppu_bus = Bus::new();
        ppu_bus.add_slave(0x0000, SlaveAccess::ReadWrite, 0x2000, PpuDevice::Cartridge)?;
        ppu_bus.add_slave(
            0x2000,
            SlaveAccess::ReadWrite,
            nametables.footprint(),
            PpuDevice::Nametables,
        )?;
        ppu_bus.add_slave(0x3000, SlaveAccess::ReadWrite, 0xF00, PpuDevice::Nametables)?;
        ppu_bus.add_slave(
            0x3F00,
            SlaveAccess::ReadWrite,
            palette.footprint(),
            PpuDevice::Palette,
        )?;

        let mut clock = Clock::new();
        clock.add_sink(SinkId::Cpu);
        clock.add_sink(SinkId::Ram);
        clock.add_sink(SinkId::Dma);
        clock.add_3x_sink(SinkId::Ppu);

        Ok(Self {
            clock,
            board: Board {
                cpu: Cpu::new(),
                ram,
                apu_low,
                apu_high,
                dma,
                ppu: Ppu::new(),
                nametables,
                palette,
                cartridge: None,
                cpu_bus,
                ppu_bus,
                sink,
                fault: None,
            },
        })
    }

    /// Bind a cartridge to both buses and take its mirroring wiring.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        info!("cartridge inserted, {:?} mirroring", cartridge.mirroring());
        self.board.nametables.set_mirroring(cartridge.mirroring());
        self.board.cartridge = Some(cartridge);
    }

    /// Fire every power-on hook. The CPU queues its Reset interrupt here, so
    /// the reset vector is fetched over the first few [`Self::step`]s.
    pub fn power_up(&mut self) -> Result<(), EmuError> {
        if self.board.cartridge.is_none() {
            return Err(EmuError::NoCartridge);
        }
        info!("power up");
        self.clock.power_up(&mut self.board);
        self.board.take_fault()
    }

    /// Power up and run the clock until a device faults. Frontends that need
    /// to pump an event loop drive [`Self::step_frame`] instead.
    pub fn run(&mut self) -> Result<(), EmuError> {
        self.power_up()?;
        loop {
            self.step()?;
        }
    }

    /// The console's reset button.
    pub fn reset(&mut self) -> Result<(), EmuError> {
        self.clock.reset(&mut self.board);
        self.board.take_fault()
    }

    /// One master cycle: one CPU tick, one DMA tick, three PPU ticks.
    pub fn step(&mut self) -> Result<(), EmuError> {
        self.clock.step(&mut self.board);
        self.board.take_fault()
    }

    /// Step until the PPU finishes the current frame.
    pub fn step_frame(&mut self) -> Result<(), EmuError> {
        let start = self.board.ppu.frames();
        while self.board.ppu.frames() == start {
            self.step()?;
        }
        Ok(())
    }

    pub fn cpu(&self) -> &Cpu {
        &self.board.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.board.ppu
    }

    pub fn sink(&self) -> &V {
        &self.board.sink
    }

    pub fn sink_mut(&mut self) -> &mut V {
        &mut self.board.sink
    }

    /// Read a byte through the CPU bus, outside the tick schedule.
    pub fn read_memory(&mut self, address: u16) -> Result<u8, EmuError> {
        let board = &mut self.board;
        let Board {
            ram,
            apu_low,
            apu_high,
            dma,
            ppu,
            nametables,
            palette,
            cartridge,
            cpu_bus,
            ppu_bus,
            ..
        } = board;
        let mut view = CpuBusView {
            bus: cpu_bus,
            ram,
            apu_low,
            apu_high,
            dma: Some(dma),
            ppu,
            ppu_bus,
            nametables,
            palette,
            cartridge,
        };
        view.read(address)?;
        Ok(view.value())
    }

    /// Write a byte through the CPU bus, outside the tick schedule.
    pub fn write_memory(&mut self, address: u16, value: u8) -> Result<(), EmuError> {
        let board = &mut self.board;
        let Board {
            ram,
            apu_low,
            apu_high,
            dma,
            ppu,
            nametables,
            palette,
            cartridge,
            cpu_bus,
            ppu_bus,
            ..
        } = board;
        let mut view = CpuBusView {
            bus: cpu_bus,
            ram,
            apu_low,
            apu_high,
            dma: Some(dma),
            ppu,
            ppu_bus,
            nametables,
            palette,
            cartridge,
        };
        view.set_value(value);
        view.write(address)?;
        Ok(())
    }
}
