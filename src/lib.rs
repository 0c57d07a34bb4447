//! tinyrv0_sim: TinyRV0 周期级仿真库
//!
//! 处理器通过带延迟的请求/响应端口访问指令存储、数据存储和加速器，
//! 并通过 mngr2proc / proc2mngr 两条消息流与测试环境通信。
//! 无论存储延迟、随机停顿和消息流延迟如何设置，程序结束时的架构状态
//! 都与零延迟执行一致。
//!
//! # 模块结构
//!
//! - `isa`: TinyRV0 指令定义、表驱动解码与反汇编
//! - `cpu`: 处理器核心（寄存器、CSR、未完成请求表、执行单元）
//! - `memory`: 平坦内存阵列
//! - `port`: 锁存式请求/响应通道与消息类型
//! - `timing`: 双端口定时存储（固定延迟 + 随机停顿）
//! - `xcel`: 寄存器型加速器
//! - `stream`: 测试源与测试汇
//! - `image`: 内存镜像与 ELF / 二进制加载
//! - `config`: harness 配置（TOML）
//! - `harness`: 逐周期驱动与结果检查
//! - `error`: 错误分类

pub mod config;
pub mod cpu;
pub mod error;
pub mod harness;
pub mod image;
pub mod isa;
pub mod memory;
pub mod port;
pub mod stream;
pub mod timing;
pub mod xcel;

pub use config::HarnessConfig;
pub use error::SimError;
pub use harness::{ExpectedState, TestHarness};
pub use image::MemoryImage;
