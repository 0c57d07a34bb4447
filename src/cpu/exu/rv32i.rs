use crate::isa::Instr;

/// 计算 ALU 类指令的结果；非 ALU 指令返回 `None`
///
/// `a` 为 rs1 的值，`b` 为 rs2 的值（`addi` 时忽略）。
pub fn alu(instr: Instr, a: u32, b: u32) -> Option<u32> {
    let result = match instr {
        // ========== R-type 算术/逻辑指令 ==========
        Instr::Add { .. } => a.wrapping_add(b),
        Instr::And { .. } => a & b,
        Instr::Sll { .. } => a << (b & 0x1F),
        Instr::Srl { .. } => a >> (b & 0x1F),

        // ========== I-type 立即数算术指令 ==========
        Instr::Addi { imm, .. } => a.wrapping_add(imm as u32),

        _ => return None,
    };
    Some(result)
}

/// BNE 的下一条 PC
#[inline]
pub fn bne_next_pc(pc: u32, offset: i32, a: u32, b: u32) -> u32 {
    if a != b {
        pc.wrapping_add(offset as u32)
    } else {
        pc.wrapping_add(4)
    }
}

/// 访存有效地址：base + sign_extend(offset)
#[inline]
pub fn agen(base: u32, offset: i32) -> u32 {
    base.wrapping_add(offset as u32)
}
