//! Simulation driver.
//!
//! `TestHarness` owns the processor, the timing memory, the accelerator, the
//! three ports between them and the test source/sink. One [`TestHarness::tick`]
//! is one cycle:
//!
//! 1. processor, memory, accelerator, source and sink compute their next
//!    state from what is currently visible on the ports;
//! 2. every port latches what was sent this cycle.
//!
//! ```
//! use tinyrv0_sim::config::HarnessConfig;
//! use tinyrv0_sim::harness::{ExpectedState, TestHarness};
//! use tinyrv0_sim::image::MemoryImage;
//!
//! let image = MemoryImage::new().with_text(&[
//!     0x00500093, // addi x1, x0, 5
//!     0x00700113, // addi x2, x0, 7
//!     0x002081B3, // add  x3, x1, x2
//! ]);
//! let mut th = TestHarness::new(HarnessConfig::rand_delays()).unwrap();
//! th.load(&image).unwrap();
//! th.run().unwrap();
//! th.check(&ExpectedState::new().reg(3, 12)).unwrap();
//! ```

use std::collections::BTreeMap;

use log::{info, trace};

use crate::config::HarnessConfig;
use crate::cpu::{ProcIo, ProcStats, Processor};
use crate::error::{Location, Mismatch, SimError};
use crate::image::MemoryImage;
use crate::memory::{FlatMemory, Memory};
use crate::port::{MemPort, XcelPort};
use crate::stream::{TestSink, TestSource};
use crate::timing::{MemPortId, PortStats, TimingMemory};
use crate::xcel::XcelRegBank;

const PORT_CAPACITY: usize = 2;

/// Expected final architectural state produced alongside a test program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedState {
    pub regs: Vec<(u8, u32)>,
    pub csrs: Vec<(u16, u32)>,
    pub mem: Vec<(u32, u32)>,
}

impl ExpectedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reg(mut self, reg: u8, value: u32) -> Self {
        self.regs.push((reg, value));
        self
    }

    pub fn csr(mut self, addr: u16, value: u32) -> Self {
        self.csrs.push((addr, value));
        self
    }

    pub fn mem_word(mut self, addr: u32, value: u32) -> Self {
        self.mem.push((addr, value));
        self
    }
}

/// Full architectural state, for comparing runs under different timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchState {
    pub regs: [u32; 32],
    pub csrs: BTreeMap<u16, u32>,
    pub memory: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub retired: u64,
    pub stats: ProcStats,
    pub imem: PortStats,
    pub dmem: PortStats,
}

pub struct TestHarness {
    config: HarnessConfig,
    proc: Processor,
    mem: TimingMemory,
    xcel: XcelRegBank,
    imem: MemPort,
    dmem: MemPort,
    xcel_port: XcelPort,
    src: TestSource,
    sink: TestSink,
    cycle: u64,
}

impl TestHarness {
    pub fn new(config: HarnessConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            proc: Processor::new(config.max_inflight),
            mem: TimingMemory::new(
                FlatMemory::new(config.mem_size, 0),
                config.mem_latency,
                config.mem_stall_prob,
                config.seed,
            ),
            xcel: XcelRegBank::new(config.xcel_latency),
            imem: MemPort::new(PORT_CAPACITY),
            dmem: MemPort::new(PORT_CAPACITY),
            xcel_port: XcelPort::new(PORT_CAPACITY),
            src: TestSource::new(std::iter::empty(), config.src_delay),
            sink: TestSink::new(std::iter::empty(), config.sink_delay),
            cycle: 0,
            config,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Install an image and reset every component. The stall PRNG is reseeded,
    /// so loading the same image twice reproduces the same schedule.
    pub fn load(&mut self, image: &MemoryImage) -> Result<(), SimError> {
        self.mem.reset(self.config.seed);
        image.write_to(self.mem.mem_mut())?;
        self.xcel.reset();
        self.imem.clear();
        self.dmem.clear();
        self.xcel_port.clear();
        self.src = TestSource::new(image.mngr2proc.iter().copied(), self.config.src_delay);
        self.sink = TestSink::new(image.proc2mngr.iter().copied(), self.config.sink_delay);
        self.proc.reset(image.entry, image.halt_pc);
        self.cycle = 0;

        info!(
            "Loaded image: entry=0x{:08x} halt={} sections={} ({} bytes) mngr2proc={} proc2mngr={}",
            image.entry,
            image.halt_pc.map_or_else(|| "none".to_string(), |pc| format!("0x{pc:08x}")),
            image.sections.len(),
            image.total_bytes(),
            image.mngr2proc.len(),
            image.proc2mngr.len(),
        );
        Ok(())
    }

    /// Advance the whole system by one cycle.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let cycle = self.cycle;
        let mut io = ProcIo {
            imem: &mut self.imem,
            dmem: &mut self.dmem,
            xcel: &mut self.xcel_port,
            src: &mut self.src,
            sink: &mut self.sink,
        };
        self.proc.tick(cycle, &mut io)?;
        self.mem.tick(cycle, &mut self.imem, &mut self.dmem)?;
        self.xcel.tick(cycle, &mut self.xcel_port)?;
        self.src.tick();
        self.sink.tick();

        self.imem.commit();
        self.dmem.commit();
        self.xcel_port.commit();
        self.cycle += 1;
        Ok(())
    }

    pub fn done(&self) -> bool {
        self.src.done() && self.sink.done() && self.proc.is_finished()
    }

    pub fn line_trace(&self) -> String {
        format!(
            "{:>8} > {}|{}|{}|{} > {}",
            self.src.line_trace(),
            self.proc.line_trace(),
            self.imem.line_trace(14),
            self.dmem.line_trace(23),
            self.xcel_port.line_trace(21),
            self.sink.line_trace(),
        )
    }

    /// Tick until `done()` or the cycle budget runs out.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        self.run_with_trace(|_, _| {})
    }

    /// Like [`run`](Self::run), handing every cycle's line trace to `f`.
    pub fn run_with_trace<F: FnMut(u64, &str)>(&mut self, mut f: F) -> Result<RunSummary, SimError> {
        while !self.done() {
            if self.cycle >= self.config.max_cycles {
                return Err(SimError::SimulationTimeout { cycles: self.cycle });
            }
            let cycle = self.cycle;
            self.tick()?;
            let line = self.line_trace();
            trace!("{cycle:>4}: {line}");
            f(cycle, &line);
        }

        let summary = self.summary();
        info!(
            "Finished in {} cycles, {} instructions retired ({} stall cycles)",
            summary.cycles, summary.retired, summary.stats.stall_cycles
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        let stats = self.proc.stats();
        RunSummary {
            cycles: self.cycle,
            retired: stats.retired,
            stats,
            imem: self.mem.stats(MemPortId::Imem),
            dmem: self.mem.stats(MemPortId::Dmem),
        }
    }

    /// Compare registers, CSRs and memory words against `expected`, reporting
    /// the first difference. Naming a register above x31 or an undeclared CSR
    /// is a `Config` error.
    pub fn check(&self, expected: &ExpectedState) -> Result<(), SimError> {
        for &(reg, value) in &expected.regs {
            if reg >= 32 {
                return Err(SimError::Config(format!("expected state names x{reg}")));
            }
            let observed = self.read_reg(reg);
            if observed != value {
                return Err(Mismatch { location: Location::Register(reg), expected: value, observed }.into());
            }
        }
        for &(csr, value) in &expected.csrs {
            let observed = self
                .proc
                .csr(csr)
                .ok_or_else(|| SimError::Config(format!("expected state names undeclared csr 0x{csr:03x}")))?;
            if observed != value {
                return Err(Mismatch { location: Location::Csr(csr), expected: value, observed }.into());
            }
        }
        for &(addr, value) in &expected.mem {
            let observed = self.read_mem_word(addr)?;
            if observed != value {
                return Err(Mismatch { location: Location::Memory(addr), expected: value, observed }.into());
            }
        }
        Ok(())
    }

    pub fn arch_state(&self) -> ArchState {
        let snapshot = self.proc.snapshot();
        ArchState {
            regs: snapshot.int,
            csrs: snapshot.csr,
            memory: self.mem.mem().as_bytes().to_vec(),
        }
    }

    /// Panics if `reg` is not below 32.
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.proc.read_reg(reg)
    }

    pub fn read_mem_word(&self, addr: u32) -> Result<u32, SimError> {
        Ok(self.mem.mem().load32(addr)?)
    }

    pub fn read_xcel_reg(&self, xr: u8) -> u32 {
        self.xcel.read(xr)
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn processor(&self) -> &Processor {
        &self.proc
    }

    /// proc2mngr messages received so far.
    pub fn received(&self) -> &[u32] {
        self.sink.received()
    }
}
