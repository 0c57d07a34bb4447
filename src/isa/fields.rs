//! 指令字段提取
//!
//! TinyRV0 沿用 RV32I 的字段位置，只用到 R / I / S / B 型与 CSR 变体。
//! 立即数提取函数都返回符号扩展后的 `i32`。

#[inline]
pub fn rd(raw: u32) -> u8 {
    ((raw >> 7) & 0x1F) as u8
}

#[inline]
pub fn rs1(raw: u32) -> u8 {
    ((raw >> 15) & 0x1F) as u8
}

#[inline]
pub fn rs2(raw: u32) -> u8 {
    ((raw >> 20) & 0x1F) as u8
}

/// I 型：imm[11:0] = raw[31:20]
#[inline]
pub fn imm_i(raw: u32) -> i32 {
    (raw as i32) >> 20
}

/// S 型：imm[11:5] = raw[31:25]，imm[4:0] = raw[11:7]
#[inline]
pub fn imm_s(raw: u32) -> i32 {
    let hi = (raw & 0xFE00_0000) as i32 >> 20;
    let lo = ((raw >> 7) & 0x1F) as i32;
    hi | lo
}

/// B 型：imm[12|10:5] = raw[31:25]，imm[4:1|11] = raw[11:7]，最低位恒为 0
#[inline]
pub fn imm_b(raw: u32) -> i32 {
    let sign = (raw & 0x8000_0000) as i32 >> 19;
    let bit11 = ((raw >> 7) & 0x1) << 11;
    let bits10_5 = ((raw >> 25) & 0x3F) << 5;
    let bits4_1 = ((raw >> 8) & 0xF) << 1;
    sign | (bit11 | bits10_5 | bits4_1) as i32
}

/// CSR 编号 raw[31:20]
#[inline]
pub fn csr_addr(raw: u32) -> u16 {
    ((raw >> 20) & 0xFFF) as u16
}

/// csrr*i 的 5-bit 零扩展立即数，与 rs1 同位置
#[inline]
pub fn csr_zimm(raw: u32) -> u8 {
    rs1(raw)
}

// opcode
pub const OP_BRANCH: u32 = 0b1100011;
pub const OP_LOAD: u32 = 0b0000011;
pub const OP_STORE: u32 = 0b0100011;
pub const OP_IMM: u32 = 0b0010011;
pub const OP_REG: u32 = 0b0110011;
pub const OP_SYSTEM: u32 = 0b1110011;
