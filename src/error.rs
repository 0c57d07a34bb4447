//! 仿真错误分类
//!
//! 解码/对齐错误属于程序错误，立即终止当前仿真；
//! 超时与架构状态不一致由 harness 作为测试失败返回，不会导致进程崩溃。

use std::fmt;

use thiserror::Error;

use crate::memory::MemError;

/// 架构状态不一致的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// 通用寄存器 xN
    Register(u8),
    /// 内存字地址
    Memory(u32),
    /// CSR 编号
    Csr(u16),
    /// proc2mngr 流中的第 N 条消息
    Proc2Mngr(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Register(r) => write!(f, "x{}", r),
            Location::Memory(addr) => write!(f, "mem[0x{:08x}]", addr),
            Location::Csr(csr) => write!(f, "csr[0x{:03x}]", csr),
            Location::Proc2Mngr(idx) => write!(f, "proc2mngr[{}]", idx),
        }
    }
}

/// 一次不一致：位置 + 期望值 + 观测值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{location}: expected 0x{expected:08x}, observed 0x{observed:08x}")]
pub struct Mismatch {
    pub location: Location,
    pub expected: u32,
    pub observed: u32,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("illegal instruction 0x{raw:08x} at pc 0x{pc:08x}")]
    IllegalInstruction { pc: u32, raw: u32 },

    #[error("misaligned {access} address 0x{addr:08x} at pc 0x{pc:08x}")]
    AlignmentFault {
        pc: u32,
        addr: u32,
        access: &'static str,
    },

    #[error("simulation did not finish within {cycles} cycles")]
    SimulationTimeout { cycles: u64 },

    #[error("architectural mismatch at {0}")]
    ArchitecturalMismatch(#[from] Mismatch),

    #[error("unexpected proc2mngr message 0x{value:08x}")]
    UnexpectedMessage { value: u32 },

    #[error("memory error: {0}")]
    Memory(#[from] MemError),

    #[error("port protocol violation: {0}")]
    Protocol(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("ELF parse error: {0}")]
    ElfParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// 是否属于 harness 层面的测试失败（而非程序本身的致命错误）
    pub fn is_test_failure(&self) -> bool {
        matches!(
            self,
            SimError::SimulationTimeout { .. }
                | SimError::ArchitecturalMismatch(_)
                | SimError::UnexpectedMessage { .. }
        )
    }
}
