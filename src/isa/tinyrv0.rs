//! TinyRV0 指令集解码表
//!
//! add / and / sll / srl / addi / lw / sw / bne 以及 Zicsr 六条指令。
//! 落在加速器 CSR 区间 (0x7E0..=0x7FF) 的 csrr/csrw 被解码为加速器访问。

use crate::cpu::csr_def::{XCEL_CSR_BASE, XCEL_CSR_LAST};
use crate::isa::fields::*;
use crate::isa::instr::{CsrOp, CsrSrc, Instr};
use crate::isa::instr_def::{i_match, r_match, InstrDef, TableDrivenDecoder, I_TYPE_MASK, R_TYPE_MASK};

fn decode_csr(raw: u32, op: CsrOp, imm: bool) -> Option<Instr> {
    let csr = csr_addr(raw);
    let rd = rd(raw);
    let field = rs1(raw);

    if (XCEL_CSR_BASE..=XCEL_CSR_LAST).contains(&csr) {
        let xr = (csr - XCEL_CSR_BASE) as u8;
        return match (op, imm) {
            // csrr rd, 0x7Ex == csrrs rd, 0x7Ex, x0
            (CsrOp::Set, false) if field == 0 => Some(Instr::XcelRead { rd, xr }),
            // csrw 0x7Ex, rs1 == csrrw x0, 0x7Ex, rs1
            (CsrOp::Write, false) if rd == 0 => Some(Instr::XcelWrite { rs1: field, xr }),
            _ => None,
        };
    }

    let src = if imm { CsrSrc::Imm(csr_zimm(raw)) } else { CsrSrc::Reg(field) };
    Some(Instr::Csr { op, rd, src, csr })
}

/// TinyRV0 指令定义表
pub static TINYRV0_INSTRS: &[InstrDef] = &[
    // ========== R-type ==========
    InstrDef::new("ADD", R_TYPE_MASK, r_match(0b0000000, 0b000, OP_REG), |raw| {
        Some(Instr::Add { rd: rd(raw), rs1: rs1(raw), rs2: rs2(raw) })
    }),
    InstrDef::new("AND", R_TYPE_MASK, r_match(0b0000000, 0b111, OP_REG), |raw| {
        Some(Instr::And { rd: rd(raw), rs1: rs1(raw), rs2: rs2(raw) })
    }),
    InstrDef::new("SLL", R_TYPE_MASK, r_match(0b0000000, 0b001, OP_REG), |raw| {
        Some(Instr::Sll { rd: rd(raw), rs1: rs1(raw), rs2: rs2(raw) })
    }),
    InstrDef::new("SRL", R_TYPE_MASK, r_match(0b0000000, 0b101, OP_REG), |raw| {
        Some(Instr::Srl { rd: rd(raw), rs1: rs1(raw), rs2: rs2(raw) })
    }),

    // ========== I-type ==========
    InstrDef::new("ADDI", I_TYPE_MASK, i_match(0b000, OP_IMM), |raw| {
        Some(Instr::Addi { rd: rd(raw), rs1: rs1(raw), imm: imm_i(raw) })
    }),

    // ========== 访存 ==========
    InstrDef::new("LW", I_TYPE_MASK, i_match(0b010, OP_LOAD), |raw| {
        Some(Instr::Lw { rd: rd(raw), rs1: rs1(raw), offset: imm_i(raw) })
    }),
    InstrDef::new("SW", I_TYPE_MASK, i_match(0b010, OP_STORE), |raw| {
        Some(Instr::Sw { rs1: rs1(raw), rs2: rs2(raw), offset: imm_s(raw) })
    }),

    // ========== B-type ==========
    InstrDef::new("BNE", I_TYPE_MASK, i_match(0b001, OP_BRANCH), |raw| {
        Some(Instr::Bne { rs1: rs1(raw), rs2: rs2(raw), offset: imm_b(raw) })
    }),

    // ========== Zicsr ==========
    InstrDef::new("CSRRW", I_TYPE_MASK, i_match(0b001, OP_SYSTEM), |raw| {
        decode_csr(raw, CsrOp::Write, false)
    }),
    InstrDef::new("CSRRS", I_TYPE_MASK, i_match(0b010, OP_SYSTEM), |raw| {
        decode_csr(raw, CsrOp::Set, false)
    }),
    InstrDef::new("CSRRC", I_TYPE_MASK, i_match(0b011, OP_SYSTEM), |raw| {
        decode_csr(raw, CsrOp::Clear, false)
    }),
    InstrDef::new("CSRRWI", I_TYPE_MASK, i_match(0b101, OP_SYSTEM), |raw| {
        decode_csr(raw, CsrOp::Write, true)
    }),
    InstrDef::new("CSRRSI", I_TYPE_MASK, i_match(0b110, OP_SYSTEM), |raw| {
        decode_csr(raw, CsrOp::Set, true)
    }),
    InstrDef::new("CSRRCI", I_TYPE_MASK, i_match(0b111, OP_SYSTEM), |raw| {
        decode_csr(raw, CsrOp::Clear, true)
    }),
];

/// TinyRV0 解码器实例
pub static TINYRV0_DECODER: TableDrivenDecoder = TableDrivenDecoder::new("TinyRV0", TINYRV0_INSTRS);
