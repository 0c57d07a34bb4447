//! Execution units split by ISA modules
//!
//! 执行单元是无状态的纯函数：输入为已读出的操作数，输出为结果。
//! 寄存器写回、CSR 副作用和端口请求由 `Processor` 负责。
pub mod rv32i;
pub mod zicsr;
