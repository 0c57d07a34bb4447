//! 定义指令的语义表达式，用于解码和执行阶段

use std::fmt;

use crate::cpu::csr_def;

/// CSR 读改写操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrOp {
    /// 写入新值
    Write,
    /// 按位置位
    Set,
    /// 按位清零
    Clear,
}

/// CSR 指令的写入来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrSrc {
    /// 通用寄存器 rs1
    Reg(u8),
    /// 5-bit 零扩展立即数
    Imm(u8),
}

impl CsrSrc {
    /// 源为 x0 或立即数 0
    pub fn is_zero(self) -> bool {
        matches!(self, CsrSrc::Reg(0) | CsrSrc::Imm(0))
    }
}

/// TinyRV0 指令的语义化表示
///
/// 解码阶段一次性做完字段提取与符号扩展，执行阶段只需匹配枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    // ========== R-type ==========
    /// ADD: rd = rs1 + rs2
    Add { rd: u8, rs1: u8, rs2: u8 },
    /// AND: rd = rs1 & rs2
    And { rd: u8, rs1: u8, rs2: u8 },
    /// SLL: rd = rs1 << rs2[4:0]
    Sll { rd: u8, rs1: u8, rs2: u8 },
    /// SRL: rd = rs1 >> rs2[4:0] (逻辑右移)
    Srl { rd: u8, rs1: u8, rs2: u8 },

    // ========== I-type ==========
    /// ADDI: rd = rs1 + imm
    Addi { rd: u8, rs1: u8, imm: i32 },

    // ========== 控制流 ==========
    /// BNE: if (rs1 != rs2) pc = pc + offset
    Bne { rs1: u8, rs2: u8, offset: i32 },

    // ========== 访存 ==========
    /// LW: rd = mem[rs1 + offset]
    Lw { rd: u8, rs1: u8, offset: i32 },
    /// SW: mem[rs1 + offset] = rs2
    Sw { rs1: u8, rs2: u8, offset: i32 },

    // ========== Zicsr ==========
    /// t = CSR[csr]; CSR[csr] = op(t, src); rd = t
    Csr { op: CsrOp, rd: u8, src: CsrSrc, csr: u16 },

    // ========== 加速器 ==========
    /// `csrr rd, 0x7Ex`：读取加速器寄存器 xr
    XcelRead { rd: u8, xr: u8 },
    /// `csrw 0x7Ex, rs1`：写加速器寄存器 xr
    XcelWrite { rs1: u8, xr: u8 },
}

impl Instr {
    /// 该指令读取的源寄存器
    pub fn sources(&self) -> [Option<u8>; 2] {
        match *self {
            Instr::Add { rs1, rs2, .. }
            | Instr::And { rs1, rs2, .. }
            | Instr::Sll { rs1, rs2, .. }
            | Instr::Srl { rs1, rs2, .. }
            | Instr::Bne { rs1, rs2, .. }
            | Instr::Sw { rs1, rs2, .. } => [Some(rs1), Some(rs2)],
            Instr::Addi { rs1, .. } | Instr::Lw { rs1, .. } | Instr::XcelWrite { rs1, .. } => {
                [Some(rs1), None]
            }
            Instr::Csr { src: CsrSrc::Reg(rs1), .. } => [Some(rs1), None],
            Instr::Csr { src: CsrSrc::Imm(_), .. } | Instr::XcelRead { .. } => [None, None],
        }
    }

    /// 该指令写回的目的寄存器（x0 视为无目的寄存器）
    pub fn dest(&self) -> Option<u8> {
        let rd = match *self {
            Instr::Add { rd, .. }
            | Instr::And { rd, .. }
            | Instr::Sll { rd, .. }
            | Instr::Srl { rd, .. }
            | Instr::Addi { rd, .. }
            | Instr::Lw { rd, .. }
            | Instr::Csr { rd, .. }
            | Instr::XcelRead { rd, .. } => rd,
            Instr::Bne { .. } | Instr::Sw { .. } | Instr::XcelWrite { .. } => return None,
        };
        (rd != 0).then_some(rd)
    }

    /// 助记符
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instr::Add { .. } => "add",
            Instr::And { .. } => "and",
            Instr::Sll { .. } => "sll",
            Instr::Srl { .. } => "srl",
            Instr::Addi { rd: 0, rs1: 0, imm: 0 } => "nop",
            Instr::Addi { .. } => "addi",
            Instr::Bne { .. } => "bne",
            Instr::Lw { .. } => "lw",
            Instr::Sw { .. } => "sw",
            Instr::Csr { op: CsrOp::Set, src, .. } if src.is_zero() => "csrr",
            Instr::Csr { op: CsrOp::Write, rd: 0, src: CsrSrc::Reg(_), .. } => "csrw",
            Instr::Csr { op, src, .. } => match (op, src) {
                (CsrOp::Write, CsrSrc::Reg(_)) => "csrrw",
                (CsrOp::Set, CsrSrc::Reg(_)) => "csrrs",
                (CsrOp::Clear, CsrSrc::Reg(_)) => "csrrc",
                (CsrOp::Write, CsrSrc::Imm(_)) => "csrrwi",
                (CsrOp::Set, CsrSrc::Imm(_)) => "csrrsi",
                (CsrOp::Clear, CsrSrc::Imm(_)) => "csrrci",
            },
            Instr::XcelRead { .. } => "csrr",
            Instr::XcelWrite { .. } => "csrw",
        }
    }
}

/// 反汇编（用于 line trace 与日志）
impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        match *self {
            Instr::Add { rd, rs1, rs2 }
            | Instr::And { rd, rs1, rs2 }
            | Instr::Sll { rd, rs1, rs2 }
            | Instr::Srl { rd, rs1, rs2 } => write!(f, "{m} x{rd}, x{rs1}, x{rs2}"),
            Instr::Addi { rd: 0, rs1: 0, imm: 0 } => write!(f, "{m}"),
            Instr::Addi { rd, rs1, imm } => write!(f, "{m} x{rd}, x{rs1}, {imm}"),
            Instr::Bne { rs1, rs2, offset } => write!(f, "{m} x{rs1}, x{rs2}, {offset}"),
            Instr::Lw { rd, rs1, offset } => write!(f, "{m} x{rd}, {offset}(x{rs1})"),
            Instr::Sw { rs1, rs2, offset } => write!(f, "{m} x{rs2}, {offset}(x{rs1})"),
            Instr::Csr { rd, src, csr, .. } => {
                let name = CsrName(csr);
                match (m, src) {
                    ("csrr", _) => write!(f, "{m} x{rd}, {name}"),
                    ("csrw", CsrSrc::Reg(rs1)) => write!(f, "{m} {name}, x{rs1}"),
                    (_, CsrSrc::Reg(rs1)) => write!(f, "{m} x{rd}, {name}, x{rs1}"),
                    (_, CsrSrc::Imm(zimm)) => write!(f, "{m} x{rd}, {name}, {zimm}"),
                }
            }
            Instr::XcelRead { rd, xr } => write!(f, "{m} x{rd}, xr{xr}"),
            Instr::XcelWrite { rs1, xr } => write!(f, "{m} xr{xr}, x{rs1}"),
        }
    }
}

struct CsrName(u16);

impl fmt::Display for CsrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match csr_def::lookup(self.0) {
            Some(entry) => write!(f, "{}", entry.name),
            None => write!(f, "0x{:03x}", self.0),
        }
    }
}

/// 已解码的指令
///
/// 包含原始编码与解码后的语义信息
#[derive(Debug, Clone, Copy)]
pub struct DecodedInstr {
    /// 原始 32-bit 指令编码
    pub raw: u32,
    /// 解码后的语义表示
    pub instr: Instr,
}
