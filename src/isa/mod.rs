//! TinyRV0 ISA 抽象与解码
//!
//! - `Instr`: 指令的语义表示
//! - `InstrDef`: 统一的指令定义，同时用于解码和冲突检测
//! - `TableDrivenDecoder`: 顺序扫描定义表的解码器
//! - `TINYRV0_DECODER`: 本模拟器支持的唯一指令集

mod fields;
mod instr;
mod instr_def;
mod tinyrv0;

pub use fields::*;
pub use instr::{CsrOp, CsrSrc, DecodedInstr, Instr};
pub use instr_def::{InstrDef, TableDrivenDecoder};
pub use tinyrv0::{TINYRV0_DECODER, TINYRV0_INSTRS};

/// 使用 TinyRV0 解码器解码一条指令，非法编码返回 `None`
pub fn decode(raw: u32) -> Option<DecodedInstr> {
    TINYRV0_DECODER.decode(raw)
}
