//! Vesper: a cycle-accurate NES (Nintendo Entertainment System) emulator core.
//!
//! Emulates the console at bus-transaction granularity: the master [`clock`]
//! ticks the CPU once and the PPU three times per master cycle, every CPU
//! instruction executes one bus cycle at a time, and OAM DMA steals the bus
//! from the CPU exactly as the hardware does. References follow the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide).
//!
//! ## Modules
//!
//! - **apu** – register-level stub reserving $4000-$4017 (no synthesis)
//! - **bus** – address decoding with slave registration, a cached 64 Ki
//!   dispatch table per direction, and single-owner master arbitration
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) parsing and the
//!   [Mapper](https://www.nesdev.org/wiki/Mapper) seam; NROM (0)
//! - **clock** – the deterministic scheduler: 1× domain (CPU, RAM, DMA) and
//!   3× domain (PPU)
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) as a two-level tagged
//!   state machine, one bus transaction per tick
//! - **dma** – [OAM DMA](https://www.nesdev.org/wiki/PPU_OAM#DMA): 256-cycle
//!   sprite upload that stalls the CPU
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU) per-dot pipeline:
//!   341×262 frame cadence, tile fetch, vblank NMI
//! - **ram** – 2 KiB on-chip work RAM
//! - **system** – board wiring: buses, device arena, power-up/reset/run

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod clock;
pub mod cpu;
pub mod dma;
pub mod ppu;
pub mod ram;
pub mod system;
