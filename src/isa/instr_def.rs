//! 指令定义结构
//!
//! 统一的指令定义，同时用于解码和冲突检测

use super::instr::{DecodedInstr, Instr};

/// 指令定义
///
/// 一处定义，两处使用：
/// - 解码：通过 mask/match 匹配后调用 decode 函数
/// - 冲突检测：通过 mask/match 判断两条指令是否可能冲突
#[derive(Clone)]
pub struct InstrDef {
    /// 指令名称（用于调试和冲突报告）
    pub name: &'static str,
    /// 匹配掩码：哪些位需要检查
    pub mask: u32,
    /// 匹配值：这些位应该是什么
    pub match_val: u32,
    /// 解码函数：从原始编码提取字段并构造 Instr
    ///
    /// 返回 `None` 表示编码虽命中 mask/match，但字段组合非法
    /// （例如加速器 CSR 上的非 csrr/csrw 形式）。
    pub decode: fn(u32) -> Option<Instr>,
}

impl InstrDef {
    pub const fn new(
        name: &'static str,
        mask: u32,
        match_val: u32,
        decode: fn(u32) -> Option<Instr>,
    ) -> Self {
        Self {
            name,
            mask,
            match_val,
            decode,
        }
    }

    /// 检查指令是否匹配此定义
    #[inline]
    pub fn matches(&self, raw: u32) -> bool {
        (raw & self.mask) == self.match_val
    }

    #[inline]
    pub fn decode_instr(&self, raw: u32) -> Option<DecodedInstr> {
        (self.decode)(raw).map(|instr| DecodedInstr { raw, instr })
    }

    /// 检查两个指令定义是否冲突
    ///
    /// 两个定义冲突当且仅当存在某个指令字同时匹配两者
    pub fn conflicts_with(&self, other: &InstrDef) -> bool {
        let common_mask = self.mask & other.mask;
        (self.match_val & common_mask) == (other.match_val & common_mask)
    }
}

impl std::fmt::Debug for InstrDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrDef")
            .field("name", &self.name)
            .field("mask", &format_args!("0x{:08X}", self.mask))
            .field("match_val", &format_args!("0x{:08X}", self.match_val))
            .finish()
    }
}

// ========== 类型掩码常量 ==========

/// R-type 指令的 mask（检查 opcode + funct3 + funct7）
pub const R_TYPE_MASK: u32 = 0xFE00707F;

/// I/S/B-type 指令的 mask（检查 opcode + funct3）
pub const I_TYPE_MASK: u32 = 0x707F;

// ========== 辅助函数：构造 match 值 ==========

/// 构造 R-type 的 match 值
#[inline]
pub const fn r_match(funct7: u32, funct3: u32, opcode: u32) -> u32 {
    (funct7 << 25) | (funct3 << 12) | opcode
}

/// 构造 I-type 的 match 值
#[inline]
pub const fn i_match(funct3: u32, opcode: u32) -> u32 {
    (funct3 << 12) | opcode
}

// ========== 表驱动解码器 ==========

/// 表驱动解码器
///
/// 顺序扫描 InstrDef 数组，命中即返回
#[derive(Clone, Copy)]
pub struct TableDrivenDecoder {
    name: &'static str,
    instrs: &'static [InstrDef],
}

impl TableDrivenDecoder {
    pub const fn new(name: &'static str, instrs: &'static [InstrDef]) -> Self {
        Self { name, instrs }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取指令定义表
    pub fn instrs(&self) -> &'static [InstrDef] {
        self.instrs
    }

    /// 尝试解码；未命中任何定义或字段组合非法时返回 `None`
    pub fn decode(&self, raw: u32) -> Option<DecodedInstr> {
        self.instrs
            .iter()
            .find(|def| def.matches(raw))
            .and_then(|def| def.decode_instr(raw))
    }

    /// 找出表内所有互相冲突的定义对
    pub fn conflicts(&self) -> Vec<(&'static str, &'static str)> {
        let mut out = Vec::new();
        for (i, a) in self.instrs.iter().enumerate() {
            for b in &self.instrs[i + 1..] {
                if a.conflicts_with(b) {
                    out.push((a.name, b.name));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::tinyrv0::TINYRV0_INSTRS;

    #[test]
    fn test_instr_def_matches() {
        let add_def = TINYRV0_INSTRS.iter().find(|d| d.name == "ADD").unwrap();

        // add x3, x1, x2: funct7=0, rs2=2, rs1=1, funct3=0, rd=3, op=0110011
        let add_raw = 0x002081B3;
        assert!(add_def.matches(add_raw));

        // sub x3, x1, x2: funct7=0100000
        let sub_raw = 0x402081B3;
        assert!(!add_def.matches(sub_raw));
    }

    #[test]
    fn test_instr_def_decode() {
        let addi_def = TINYRV0_INSTRS.iter().find(|d| d.name == "ADDI").unwrap();

        let raw = 0x02A00093; // addi x1, x0, 42
        let decoded = addi_def.decode_instr(raw).unwrap();
        assert_eq!(decoded.instr, Instr::Addi { rd: 1, rs1: 0, imm: 42 });
    }

    #[test]
    fn test_conflict_detection() {
        let def1 = InstrDef::new("TEST1", I_TYPE_MASK, 0x0033, |_| None);
        let def2 = InstrDef::new("TEST2", R_TYPE_MASK, 0x0033, |_| None);
        assert!(def1.conflicts_with(&def2));

        let def3 = InstrDef::new("TEST3", R_TYPE_MASK, r_match(0b0000001, 0, 0x33), |_| None);
        assert!(!def2.conflicts_with(&def3));
    }
}
