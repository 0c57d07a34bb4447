//! CPU architectural state components: register file and CSR bank.

use std::collections::BTreeMap;

/// Generic register file with configurable count, element type, and zero-hardwire behavior.
///
/// - `N`: number of registers
/// - `T`: element type
/// - `ZERO_HARDWIRE`: if true, register 0 always reads as zero and writes are ignored
#[derive(Clone)]
pub struct GenericRegFile<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> {
    regs: [T; N],
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> GenericRegFile<N, T, ZERO_HARDWIRE> {
    pub fn new() -> Self {
        Self { regs: [T::default(); N] }
    }

    #[inline]
    pub fn read(&self, reg: u8) -> T {
        if ZERO_HARDWIRE && reg == 0 {
            T::default()
        } else {
            self.regs[reg as usize]
        }
    }

    #[inline]
    pub fn write(&mut self, reg: u8, value: T) {
        if ZERO_HARDWIRE && reg == 0 {
            return;
        }
        self.regs[reg as usize] = value;
    }

    pub fn snapshot(&self) -> &[T; N] {
        &self.regs
    }
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> Default for GenericRegFile<N, T, ZERO_HARDWIRE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer register file x0..x31. x0 is hard-wired to zero.
pub type RegFile = GenericRegFile<32, u32, true>;

/// How a CSR responds to reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrAccess {
    ReadOnly,
    ReadWrite,
    /// Reads pop the test source; writes are illegal.
    Mngr2Proc,
    /// Writes push to the test sink; reads return 0.
    Proc2Mngr,
}

impl CsrAccess {
    pub fn writable(self) -> bool {
        matches!(self, CsrAccess::ReadWrite | CsrAccess::Proc2Mngr)
    }
}

/// Table entry for CSR declaration: name, address, reset value, access kind.
#[derive(Debug, Clone, Copy)]
pub struct CsrEntry {
    pub name: &'static str,
    pub addr: u16,
    pub reset: u32,
    pub access: CsrAccess,
}

/// CSR bank: declared entries plus their current values, ordered by address.
#[derive(Clone, Default)]
pub struct CsrBank {
    entries: BTreeMap<u16, (CsrEntry, u32)>,
}

impl CsrBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of CSRs declared as a table.
    pub fn register(&mut self, entries: &[CsrEntry]) {
        for e in entries {
            self.entries.insert(e.addr, (*e, e.reset));
        }
    }

    /// Restore every CSR to its reset value.
    pub fn reset(&mut self) {
        for (entry, value) in self.entries.values_mut() {
            *value = entry.reset;
        }
    }

    pub fn entry(&self, addr: u16) -> Option<&CsrEntry> {
        self.entries.get(&addr).map(|(e, _)| e)
    }

    /// Raw value, `None` for undeclared CSRs.
    #[inline]
    pub fn read(&self, addr: u16) -> Option<u32> {
        self.entries.get(&addr).map(|(_, v)| *v)
    }

    /// Store a value; returns false for undeclared CSRs.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u32) -> bool {
        match self.entries.get_mut(&addr) {
            Some((_, v)) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> BTreeMap<u16, u32> {
        self.entries.iter().map(|(a, (_, v))| (*a, *v)).collect()
    }
}

/// Aggregated architectural state: integer RF and CSR bank.
#[derive(Clone)]
pub struct Status {
    pub int: RegFile,
    pub csr: CsrBank,
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    pub fn new() -> Self {
        let mut csr = CsrBank::new();
        csr.register(super::csr_def::TINYRV0_CSRS);
        Self { int: RegFile::new(), csr }
    }

    pub fn reset(&mut self) {
        self.int = RegFile::new();
        self.csr.reset();
    }

    #[inline]
    pub fn int_read(&self, reg: u8) -> u32 {
        self.int.read(reg)
    }

    #[inline]
    pub fn int_write(&mut self, reg: u8, value: u32) {
        self.int.write(reg, value)
    }

    pub fn csr_snapshot(&self) -> BTreeMap<u16, u32> {
        self.csr.snapshot()
    }

    /// Snapshot all architectural state at once.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            int: *self.int.snapshot(),
            csr: self.csr.snapshot(),
        }
    }
}

/// Immutable snapshot of architectural state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub int: [u32; 32],
    pub csr: BTreeMap<u16, u32>,
}
