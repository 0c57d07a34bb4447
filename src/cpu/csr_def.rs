//! CSR definitions for TinyRV0.
//!
//! 设计原则：
//! - 每个 CSR 先定义地址常量 `CSR_XXX`
//! - CsrEntry 使用这些常量，避免重复硬编码地址
//! - 常量用于代码中快速引用（如 mngr2proc/proc2mngr 的特殊处理）
//! - CsrEntry 用于 CSR 注册和管理

use super::status::{CsrAccess, CsrEntry};

// ============================================================================
// Test manager interface
// ============================================================================

/// 读取时从 test source 弹出一条消息
pub const CSR_MNGR2PROC: u16 = 0xFC0;
/// 写入时向 test sink 发送一条消息
pub const CSR_PROC2MNGR: u16 = 0x7C0;

// ============================================================================
// Core information / statistics
// ============================================================================

pub const CSR_NUMCORES: u16 = 0xFC1;
pub const CSR_COREID: u16 = 0xF14;
pub const CSR_STATS_EN: u16 = 0x7C1;
pub const CSR_MSCRATCH: u16 = 0x340;

// ============================================================================
// Accelerator window
// ============================================================================

/// 加速器寄存器 xr0 对应的 CSR 编号
pub const XCEL_CSR_BASE: u16 = 0x7E0;
/// 加速器寄存器 xr31 对应的 CSR 编号
pub const XCEL_CSR_LAST: u16 = 0x7FF;

/// TinyRV0 CSR table.
pub const TINYRV0_CSRS: &[CsrEntry] = &[
    CsrEntry { name: "mngr2proc", addr: CSR_MNGR2PROC, reset: 0, access: CsrAccess::Mngr2Proc },
    CsrEntry { name: "proc2mngr", addr: CSR_PROC2MNGR, reset: 0, access: CsrAccess::Proc2Mngr },
    CsrEntry { name: "numcores",  addr: CSR_NUMCORES,  reset: 1, access: CsrAccess::ReadOnly },
    CsrEntry { name: "coreid",    addr: CSR_COREID,    reset: 0, access: CsrAccess::ReadOnly },
    CsrEntry { name: "stats_en",  addr: CSR_STATS_EN,  reset: 0, access: CsrAccess::ReadWrite },
    CsrEntry { name: "mscratch",  addr: CSR_MSCRATCH,  reset: 0, access: CsrAccess::ReadWrite },
];

/// Look up a CSR declaration by number.
pub fn lookup(addr: u16) -> Option<&'static CsrEntry> {
    TINYRV0_CSRS.iter().find(|e| e.addr == addr)
}
