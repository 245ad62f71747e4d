use crate::bus::{BusError, BusMaster};
use crate::cpu::cpu::{Cpu, CpuError, Interrupt};

/// Flat 64 KiB memory with the full master handle, enough to run any
/// instruction sequence without board wiring.
struct TestBus {
    mem: [u8; 0x10000],
    value: u8,
    seized: bool,
}

impl TestBus {
    fn new() -> Self {
        Self {
            mem: [0; 0x10000],
            value: 0,
            seized: false,
        }
    }

    fn load(&mut self, base: u16, program: &[u8]) {
        let base = base as usize;
        self.mem[base..base + program.len()].copy_from_slice(program);
    }
}

impl BusMaster for TestBus {
    fn acquire(&mut self) {
        self.seized = true;
    }

    fn try_acquire(&mut self) -> bool {
        !self.seized
    }

    fn release(&mut self) {
        self.seized = false;
    }

    fn value(&self) -> u8 {
        self.value
    }

    fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    fn read(&mut self, address: u16) -> Result<(), BusError> {
        self.value = self.mem[address as usize];
        Ok(())
    }

    fn write(&mut self, address: u16) -> Result<(), BusError> {
        self.mem[address as usize] = self.value;
        Ok(())
    }
}

fn new_cpu(pc: u16) -> Cpu {
    let mut cpu = Cpu::new();
    cpu.pc = pc;
    cpu.s = 0xFD;
    cpu
}

fn run(cpu: &mut Cpu, bus: &mut TestBus, ticks: usize) {
    for _ in 0..ticks {
        cpu.tick(bus).unwrap();
    }
}

#[test]
fn lda_immediate_loads_value() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x42]); // LDA #$42

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.a, 0x42);
    assert!(!cpu.status.z());
    assert!(!cpu.status.n());
    assert_eq!(cpu.pc, 0x8002);
}

#[test]
fn lda_zero_sets_zero_flag() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x00]);

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2);

    assert!(cpu.status.z());
    assert!(!cpu.status.n());
}

#[test]
fn sta_zero_page_stores_accumulator() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x77, 0x85, 0x10]); // LDA #$77; STA $10

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 3);

    assert_eq!(bus.mem[0x10], 0x77);
}

#[test]
fn sta_absolute_x_stores_at_indexed_address() {
    let mut bus = TestBus::new();
    // LDX #$05; LDA #$AB; STA $0200,X
    bus.load(0x8000, &[0xA2, 0x05, 0xA9, 0xAB, 0x9D, 0x00, 0x02]);

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2 + 4);

    assert_eq!(bus.mem[0x0205], 0xAB);
}

#[test]
fn lda_indirect_y_reads_through_pointer() {
    let mut bus = TestBus::new();
    bus.mem[0x0040] = 0x00; // pointer -> $0300
    bus.mem[0x0041] = 0x03;
    bus.mem[0x0305] = 0x5A;
    // LDY #$05; LDA ($40),Y
    bus.load(0x8000, &[0xA0, 0x05, 0xB1, 0x40]);

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 5);

    assert_eq!(cpu.a, 0x5A);
}

#[test]
fn adc_sets_overflow_on_sign_change() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x7F, 0x69, 0x01]); // LDA #$7F; ADC #$01

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);

    assert_eq!(cpu.a, 0x80);
    assert!(cpu.status.v());
    assert!(cpu.status.n());
    assert!(!cpu.status.c());
    assert!(!cpu.status.z());
}

#[test]
fn adc_carries_into_carry_flag() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0xFF, 0x69, 0x01]); // LDA #$FF; ADC #$01

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);

    assert_eq!(cpu.a, 0x00);
    assert!(cpu.status.c());
    assert!(cpu.status.z());
    assert!(!cpu.status.v());
}

#[test]
fn cmp_equal_sets_carry_and_zero() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x40, 0xC9, 0x40]); // LDA #$40; CMP #$40

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);

    assert!(cpu.status.c());
    assert!(cpu.status.z());
    assert!(!cpu.status.n());
}

#[test]
fn cmp_takes_negative_from_subtraction_result() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x10, 0xC9, 0x20]); // 0x10 - 0x20 = 0xF0

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);

    assert!(!cpu.status.c());
    assert!(!cpu.status.z());
    assert!(cpu.status.n());
}

#[test]
fn and_zero_flag_comes_from_result() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0xF0, 0x29, 0x0F]); // LDA #$F0; AND #$0F

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);

    assert_eq!(cpu.a, 0x00);
    assert!(cpu.status.z());
}

#[test]
fn bit_copies_operand_bits_to_n_and_v() {
    let mut bus = TestBus::new();
    bus.mem[0x0200] = 0xC0;
    bus.load(0x8000, &[0xA9, 0x3F, 0x2C, 0x00, 0x02]); // LDA #$3F; BIT $0200

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 4);

    assert!(cpu.status.z()); // A & M == 0
    assert!(cpu.status.n());
    assert!(cpu.status.v());
    assert_eq!(cpu.a, 0x3F); // BIT never writes A
}

#[test]
fn asl_accumulator_shifts_into_carry() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x81, 0x0A]); // LDA #$81; ASL A

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);

    assert_eq!(cpu.a, 0x02);
    assert!(cpu.status.c());
    assert!(!cpu.status.n());
}

#[test]
fn ror_rotates_carry_into_bit_7() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0x38, 0xA9, 0x02, 0x6A]); // SEC; LDA #$02; ROR A

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2 + 2);

    assert_eq!(cpu.a, 0x81);
    assert!(!cpu.status.c());
    assert!(cpu.status.n());
}

#[test]
fn inc_zero_page_is_a_five_tick_read_modify_write() {
    let mut bus = TestBus::new();
    bus.mem[0x10] = 0x41;
    bus.load(0x8000, &[0xE6, 0x10]); // INC $10

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 5);

    assert_eq!(bus.mem[0x10], 0x42);
    assert_eq!(cpu.pc, 0x8002);
    assert!(!cpu.status.z());
}

#[test]
fn dec_zero_page_wraps_to_ff() {
    let mut bus = TestBus::new();
    bus.mem[0x10] = 0x00;
    bus.load(0x8000, &[0xC6, 0x10]); // DEC $10

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 5);

    assert_eq!(bus.mem[0x10], 0xFF);
    assert!(cpu.status.n());
}

#[test]
fn jsr_rts_round_trip_returns_past_the_operand() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0x20, 0x05, 0x80]); // JSR $8005
    bus.load(0x8005, &[0x60]); // RTS

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 6);
    assert_eq!(cpu.pc, 0x8005);
    // Return address - 1 on the stack: $8002.
    assert_eq!(bus.mem[0x01FD], 0x80);
    assert_eq!(bus.mem[0x01FC], 0x02);
    assert_eq!(cpu.s, 0xFB);

    run(&mut cpu, &mut bus, 6);
    assert_eq!(cpu.pc, 0x8003);
    assert_eq!(cpu.s, 0xFD);
}

#[test]
fn branch_not_taken_skips_the_displacement() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x00, 0xD0, 0x02]); // LDA #$00; BNE +2

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);

    assert_eq!(cpu.pc, 0x8004);
}

#[test]
fn branch_taken_costs_one_extra_tick() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x01, 0xD0, 0x02]); // LDA #$01; BNE +2

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2);
    // One tick short: still mid-branch.
    assert_ne!(cpu.pc, 0x8006);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc, 0x8006);
}

#[test]
fn branch_backwards_takes_negative_displacement() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x01, 0xD0, 0xFC]); // BNE -4 -> $8000

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 3);

    assert_eq!(cpu.pc, 0x8000);
}

#[test]
fn pha_pla_round_trips_through_the_stack() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x42, 0x48, 0xA9, 0x00, 0x68]);

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2 + 2 + 2 + 3);

    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.s, 0xFD);
    assert!(!cpu.status.z());
}

#[test]
fn power_up_state_and_reset_vector_delivery() {
    let mut bus = TestBus::new();
    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0xC0;

    let mut cpu = Cpu::new();
    cpu.power_on(&mut bus).unwrap();

    assert_eq!(cpu.status.bits(), 0x34);
    assert_eq!(cpu.s, 0xFD);
    assert_eq!(cpu.a, 0);
    // Power-up silenced the APU registers through the bus.
    assert_eq!(bus.mem[0x4017], 0);
    assert_eq!(bus.mem[0x4015], 0);

    // Reset is serviced before any instruction runs.
    run(&mut cpu, &mut bus, 6);
    assert_eq!(cpu.pc, 0xC000);
}

#[test]
fn nmi_pushes_frame_with_break_clear() {
    let mut bus = TestBus::new();
    bus.mem[0xFFFA] = 0x00;
    bus.mem[0xFFFB] = 0x90;
    bus.load(0x8000, &[0xEA]); // NOP

    let mut cpu = new_cpu(0x8000);
    cpu.request_interrupt(Interrupt::Nmi);
    run(&mut cpu, &mut bus, 6);

    assert_eq!(cpu.pc, 0x9000);
    assert!(cpu.status.i());
    // Pushed frame: PCH, PCL, then P with bit 5 set and bit 4 clear.
    assert_eq!(bus.mem[0x01FD], 0x80);
    assert_eq!(bus.mem[0x01FC], 0x00);
    let frame = bus.mem[0x01FB];
    assert_eq!(frame & 0x30, 0x20);
}

#[test]
fn nmi_during_opcode_fetch_waits_for_the_boundary() {
    let mut bus = TestBus::new();
    bus.mem[0xFFFA] = 0x00;
    bus.mem[0xFFFB] = 0x90;
    bus.load(0x8000, &[0xEA, 0xEA, 0xEA, 0xEA]); // NOP sled
    bus.load(0x9000, &[0xA9, 0x11]); // handler: LDA #$11

    let mut cpu = new_cpu(0x8000);
    // Fetch issued, byte not yet decoded: the NMI must not displace it.
    run(&mut cpu, &mut bus, 1);
    cpu.request_interrupt(Interrupt::Nmi);

    // NOP finishes (1 tick), acknowledge (6), handler LDA (2), next fetch.
    run(&mut cpu, &mut bus, 1 + 6 + 2 + 1);
    assert_eq!(cpu.a, 0x11);
    assert_eq!(cpu.pc, 0x9003);
    // The interrupted NOP completed: pushed PC is its successor.
    assert_eq!(bus.mem[0x01FD], 0x80);
    assert_eq!(bus.mem[0x01FC], 0x01);
}

#[test]
fn brk_pushes_frame_with_break_set() {
    let mut bus = TestBus::new();
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0x90;
    bus.load(0x8000, &[0x00]); // BRK

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 7);

    assert_eq!(cpu.pc, 0x9000);
    // BRK pushes PC+2 (opcode + padding byte).
    assert_eq!(bus.mem[0x01FD], 0x80);
    assert_eq!(bus.mem[0x01FC], 0x02);
    let frame = bus.mem[0x01FB];
    assert_eq!(frame & 0x30, 0x30);
}

#[test]
fn rti_restores_status_and_pc() {
    let mut bus = TestBus::new();
    bus.mem[0xFFFA] = 0x00;
    bus.mem[0xFFFB] = 0x90;
    bus.load(0x9000, &[0x40]); // RTI

    let mut cpu = new_cpu(0x8000);
    cpu.request_interrupt(Interrupt::Nmi);
    run(&mut cpu, &mut bus, 6);
    assert_eq!(cpu.pc, 0x9000);

    run(&mut cpu, &mut bus, 6);
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(cpu.s, 0xFD);
}

#[test]
fn irq_is_masked_while_i_is_set() {
    let mut bus = TestBus::new();
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0x90;
    bus.load(0x8000, &[0x78, 0xEA, 0x58, 0xEA]); // SEI; NOP; CLI; NOP

    let mut cpu = new_cpu(0x8000);
    run(&mut cpu, &mut bus, 2); // SEI
    cpu.request_interrupt(Interrupt::Irq);

    run(&mut cpu, &mut bus, 2); // NOP runs, IRQ stays pending
    assert_eq!(cpu.pc, 0x8002);

    run(&mut cpu, &mut bus, 2); // CLI
    run(&mut cpu, &mut bus, 6); // acknowledge sequence
    assert_eq!(cpu.pc, 0x9000);
}

#[test]
fn cpu_skips_ticks_while_bus_is_seized() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xA9, 0x42]);

    let mut cpu = new_cpu(0x8000);
    bus.acquire();
    run(&mut cpu, &mut bus, 10);
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(cpu.a, 0);

    bus.release();
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.a, 0x42);
}

#[test]
fn invalid_opcode_is_reported_with_its_address() {
    let mut bus = TestBus::new();
    bus.load(0x8000, &[0xFF]);

    let mut cpu = new_cpu(0x8000);
    cpu.tick(&mut bus).unwrap();
    let err = cpu.tick(&mut bus).unwrap_err();

    match err {
        CpuError::InvalidOpcode { opcode, pc } => {
            assert_eq!(opcode, 0xFF);
            assert_eq!(pc, 0x8000);
        }
        other => panic!("unexpected error: {other}"),
    }
}
