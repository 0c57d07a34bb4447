//! Zicsr 扩展执行单元
//!
//! 只负责读改写的数值计算与读/写抑制规则，CSR 本身的访问由处理器完成。

use crate::isa::{CsrOp, CsrSrc};

/// 是否读取 CSR 旧值
///
/// CSRRW/CSRRWI 在 rd = x0 时不读取（有副作用的 CSR 不会被读取）
#[inline]
pub fn reads_csr(op: CsrOp, rd: u8) -> bool {
    !(op == CsrOp::Write && rd == 0)
}

/// 是否写入 CSR
///
/// CSRRS/CSRRC 在 rs1 = x0、CSRRSI/CSRRCI 在 zimm = 0 时为纯读取
#[inline]
pub fn writes_csr(op: CsrOp, src: CsrSrc) -> bool {
    op == CsrOp::Write || !src.is_zero()
}

/// 计算写入 CSR 的新值
#[inline]
pub fn csr_update(op: CsrOp, old: u32, operand: u32) -> u32 {
    match op {
        CsrOp::Write => operand,
        CsrOp::Set => old | operand,
        CsrOp::Clear => old & !operand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_suppression() {
        assert!(!reads_csr(CsrOp::Write, 0));
        assert!(reads_csr(CsrOp::Write, 1));
        assert!(reads_csr(CsrOp::Set, 0));

        assert!(writes_csr(CsrOp::Write, CsrSrc::Reg(0)));
        assert!(writes_csr(CsrOp::Write, CsrSrc::Imm(0)));
        assert!(!writes_csr(CsrOp::Set, CsrSrc::Reg(0)));
        assert!(!writes_csr(CsrOp::Clear, CsrSrc::Imm(0)));
        assert!(writes_csr(CsrOp::Clear, CsrSrc::Imm(3)));
    }

    #[test]
    fn test_csr_update() {
        assert_eq!(csr_update(CsrOp::Write, 0xF0, 0x0F), 0x0F);
        assert_eq!(csr_update(CsrOp::Set, 0xF0, 0x0F), 0xFF);
        assert_eq!(csr_update(CsrOp::Clear, 0xFF, 0x0F), 0xF0);
    }
}
