//! Minimal TinyRV0 encoder for building test programs.

const OP_REG: u32 = 0b0110011;
const OP_IMM: u32 = 0b0010011;
const OP_LOAD: u32 = 0b0000011;
const OP_STORE: u32 = 0b0100011;
const OP_BRANCH: u32 = 0b1100011;
const OP_SYSTEM: u32 = 0b1110011;

fn r_type(funct7: u32, rs2: u8, rs1: u8, funct3: u32, rd: u8, opcode: u32) -> u32 {
    (funct7 << 25) | (u32::from(rs2) << 20) | (u32::from(rs1) << 15) | (funct3 << 12) | (u32::from(rd) << 7) | opcode
}

fn i_type(imm: i32, rs1: u8, funct3: u32, rd: u8, opcode: u32) -> u32 {
    ((imm as u32 & 0xfff) << 20) | (u32::from(rs1) << 15) | (funct3 << 12) | (u32::from(rd) << 7) | opcode
}

fn s_type(imm: i32, rs2: u8, rs1: u8, funct3: u32, opcode: u32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7f) << 25)
        | (u32::from(rs2) << 20)
        | (u32::from(rs1) << 15)
        | (funct3 << 12)
        | ((imm & 0x1f) << 7)
        | opcode
}

fn b_type(imm: i32, rs2: u8, rs1: u8, funct3: u32, opcode: u32) -> u32 {
    let imm = imm as u32;
    (((imm >> 12) & 1) << 31)
        | (((imm >> 5) & 0x3f) << 25)
        | (u32::from(rs2) << 20)
        | (u32::from(rs1) << 15)
        | (funct3 << 12)
        | (((imm >> 1) & 0xf) << 8)
        | (((imm >> 11) & 1) << 7)
        | opcode
}

pub fn add(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(0, rs2, rs1, 0b000, rd, OP_REG)
}

pub fn and(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(0, rs2, rs1, 0b111, rd, OP_REG)
}

pub fn sll(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(0, rs2, rs1, 0b001, rd, OP_REG)
}

pub fn srl(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(0, rs2, rs1, 0b101, rd, OP_REG)
}

pub fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(imm, rs1, 0b000, rd, OP_IMM)
}

pub fn nop() -> u32 {
    addi(0, 0, 0)
}

/// `lw rd, offset(rs1)`
pub fn lw(rd: u8, rs1: u8, offset: i32) -> u32 {
    i_type(offset, rs1, 0b010, rd, OP_LOAD)
}

/// `sw rs2, offset(rs1)`
pub fn sw(rs2: u8, rs1: u8, offset: i32) -> u32 {
    s_type(offset, rs2, rs1, 0b010, OP_STORE)
}

/// Offset is relative to the branch itself.
pub fn bne(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b_type(offset, rs2, rs1, 0b001, OP_BRANCH)
}

pub fn csrrw(rd: u8, csr: u16, rs1: u8) -> u32 {
    i_type(i32::from(csr), rs1, 0b001, rd, OP_SYSTEM)
}

pub fn csrrs(rd: u8, csr: u16, rs1: u8) -> u32 {
    i_type(i32::from(csr), rs1, 0b010, rd, OP_SYSTEM)
}

pub fn csrrc(rd: u8, csr: u16, rs1: u8) -> u32 {
    i_type(i32::from(csr), rs1, 0b011, rd, OP_SYSTEM)
}

pub fn csrrwi(rd: u8, csr: u16, zimm: u8) -> u32 {
    i_type(i32::from(csr), zimm & 0x1f, 0b101, rd, OP_SYSTEM)
}

pub fn csrrsi(rd: u8, csr: u16, zimm: u8) -> u32 {
    i_type(i32::from(csr), zimm & 0x1f, 0b110, rd, OP_SYSTEM)
}

pub fn csrrci(rd: u8, csr: u16, zimm: u8) -> u32 {
    i_type(i32::from(csr), zimm & 0x1f, 0b111, rd, OP_SYSTEM)
}

pub fn csrr(rd: u8, csr: u16) -> u32 {
    csrrs(rd, csr, 0)
}

pub fn csrw(csr: u16, rs1: u8) -> u32 {
    csrrw(0, csr, rs1)
}

pub fn csrwi(csr: u16, zimm: u8) -> u32 {
    csrrwi(0, csr, zimm)
}
