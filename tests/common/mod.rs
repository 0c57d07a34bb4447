//! Shared support for the integration tests: encoder, program builder,
//! program generators and run helpers.

#![allow(dead_code)]

pub mod encode;
pub mod generators;

use tinyrv0_sim::config::HarnessConfig;
use tinyrv0_sim::cpu::csr_def::{CSR_MNGR2PROC, CSR_PROC2MNGR};
use tinyrv0_sim::harness::{ArchState, ExpectedState, TestHarness};
use tinyrv0_sim::image::MemoryImage;
use tinyrv0_sim::isa;

use encode::{csrr, csrw, nop};

/// Base address of the data section used by memory tests.
pub const DATA_BASE: u32 = 0x2000;

/// A test program: text, data, manager streams and the expected final state.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub text: Vec<u32>,
    pub data: Vec<(u32, Vec<u32>)>,
    pub mngr2proc: Vec<u32>,
    pub proc2mngr: Vec<u32>,
    pub expected: ExpectedState,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inst(mut self, word: u32) -> Self {
        self.text.push(word);
        self
    }

    pub fn insts(mut self, words: &[u32]) -> Self {
        self.text.extend_from_slice(words);
        self
    }

    pub fn nops(mut self, n: usize) -> Self {
        self.text.extend(std::iter::repeat_n(nop(), n));
        self
    }

    /// `csrr rd, mngr2proc` fed with `value`.
    pub fn recv(mut self, rd: u8, value: u32) -> Self {
        self.text.push(csrr(rd, CSR_MNGR2PROC));
        self.mngr2proc.push(value);
        self
    }

    /// `csrw proc2mngr, rs` expecting `value` at the sink.
    pub fn send(mut self, rs: u8, value: u32) -> Self {
        self.text.push(csrw(CSR_PROC2MNGR, rs));
        self.proc2mngr.push(value);
        self
    }

    pub fn data(mut self, addr: u32, words: &[u32]) -> Self {
        self.data.push((addr, words.to_vec()));
        self
    }

    pub fn expect_reg(mut self, reg: u8, value: u32) -> Self {
        self.expected = self.expected.reg(reg, value);
        self
    }

    pub fn expect_csr(mut self, csr: u16, value: u32) -> Self {
        self.expected = self.expected.csr(csr, value);
        self
    }

    pub fn expect_mem(mut self, addr: u32, value: u32) -> Self {
        self.expected = self.expected.mem_word(addr, value);
        self
    }

    /// Run `other` right after this program.
    pub fn then(mut self, other: Program) -> Self {
        self.text.extend(other.text);
        self.data.extend(other.data);
        self.mngr2proc.extend(other.mngr2proc);
        self.proc2mngr.extend(other.proc2mngr);
        self.expected.regs.extend(other.expected.regs);
        self.expected.csrs.extend(other.expected.csrs);
        self.expected.mem.extend(other.expected.mem);
        self
    }

    pub fn image(&self) -> MemoryImage {
        let mut image = MemoryImage::new()
            .with_text(&self.text)
            .with_mngr2proc(self.mngr2proc.iter().copied())
            .with_proc2mngr(self.proc2mngr.iter().copied());
        for (addr, words) in &self.data {
            image = image.with_data_words(*addr, words);
        }
        image
    }

    /// Disassembly, for failure messages.
    pub fn listing(&self) -> String {
        self.text
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let text = isa::decode(w).map_or_else(|| "<illegal>".to_string(), |d| d.instr.to_string());
                format!("  {:08x}: {w:08x}  {text}\n", 0x200 + 4 * i)
            })
            .collect()
    }
}

/// Load, run and check `program` under `config`.
pub fn run_with(program: &Program, config: HarnessConfig) -> TestHarness {
    let mut th = TestHarness::new(config.clone()).expect("valid config");
    th.load(&program.image()).expect("image fits in memory");
    if let Err(e) = th.run() {
        panic!("run failed under {config:?}: {e}\n{}", program.listing());
    }
    if let Err(e) = th.check(&program.expected) {
        panic!("check failed under {config:?}: {e}\n{}", program.listing());
    }
    th
}

/// Run under the zero-delay configuration and the random delay preset.
pub fn run_test(program: &Program) {
    run_with(program, HarnessConfig::default());
    run_with(program, HarnessConfig::rand_delays());
}

/// Timing configurations whose final state must match the zero-delay run.
pub fn timing_configs() -> Vec<HarnessConfig> {
    let mut configs = vec![
        HarnessConfig::rand_delays(),
        HarnessConfig::default().with_mem_latency(5),
        HarnessConfig::default().with_mem_stall_prob(1.0).with_max_cycles(100_000),
        HarnessConfig::default().with_src_delay(7).with_sink_delay(2),
        HarnessConfig::default().with_xcel_latency(6).with_mem_latency(2),
        HarnessConfig::rand_delays().with_max_inflight(1),
    ];
    for seed in [1, 42, 0x1234_5678] {
        configs.push(HarnessConfig::rand_delays().with_seed(seed).with_mem_stall_prob(0.3));
    }
    configs
}

/// Final architectural state of `program` under `config`.
pub fn final_state(program: &Program, config: HarnessConfig) -> ArchState {
    run_with(program, config).arch_state()
}
