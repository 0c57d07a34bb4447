//! 处理器核心与执行引擎
//!
//! 本模块定义了 TinyRV0 处理器 `Processor`。与一次执行一条指令的
//! 纯功能模型不同，它通过请求/响应端口访问指令存储、数据存储和加速器，
//! 因此每个周期由 harness 调用一次 [`Processor::tick`]。
//!
//! 每周期按以下顺序推进：
//! 1. 接收响应：dmem / xcel 各至多一个，与该端口最老的等待记录匹配
//! 2. 提交：从表头按发射顺序提交已收到响应的记录
//! 3. 接收取指响应
//! 4. 发射：检查冒险后执行 ALU/分支/CSR，或为访存/加速器请求分配记录
//! 5. 取指：无未完成取指且无待发射指令时，对 `pc` 发起取指
//!
//! 设计约定：
//! - x0 永远为 0，写入时丢弃
//! - PC 为字节地址，所有指令 4 字节对齐
//! - 源或目的寄存器是任一未提交记录的目的寄存器时停顿，
//!   因此任何时刻观察到的寄存器值都与零延迟执行一致

use log::debug;

use crate::error::SimError;
use crate::isa::{self, CsrOp, CsrSrc, Instr};
use crate::port::{MemPort, MemReq, ReqKind, XcelPort, XcelReq};
use crate::stream::{TestSink, TestSource};

pub mod csr_def;
mod exu;
mod inflight;
mod status;

pub use inflight::{InFlight, InFlightKind, InFlightState, InFlightTable, ReqPort};
pub use status::{CsrAccess, CsrBank, CsrEntry, RegFile, Status, StatusSnapshot};

/// 处理器在一个周期内可见的全部外部接口
pub struct ProcIo<'a> {
    pub imem: &'a mut MemPort,
    pub dmem: &'a mut MemPort,
    pub xcel: &'a mut XcelPort,
    pub src: &'a mut TestSource,
    pub sink: &'a mut TestSink,
}

/// 取指状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// 没有未完成的取指
    Idle,
    /// 取指请求已发出，等待 imem 响应
    Waiting { pc: u32, tag: u8 },
    /// 指令已取回，等待发射
    Ready { pc: u32, raw: u32 },
}

/// 处理器统计计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStats {
    pub cycles: u64,
    pub retired: u64,
    /// 有指令待发射但因冒险或端口背压未能发射的周期数
    pub stall_cycles: u64,
    pub fetches: u64,
    pub mem_requests: u64,
    pub xcel_requests: u64,
    /// stats_en 非零期间的周期数
    pub stats_cycles: u64,
    /// stats_en 非零期间提交的指令数
    pub stats_retired: u64,
}

/// TinyRV0 处理器
///
/// 包含：
/// - 32 个 32-bit 通用寄存器 x0..x31 与 CSR
/// - 取指 PC 与取指状态
/// - 未完成访存/加速器请求表
pub struct Processor {
    /// 架构状态（寄存器文件 + CSR）
    status: Status,
    /// 下一次取指的 PC
    pc: u32,
    fetch: FetchState,
    fetch_tag: u8,
    inflight: InFlightTable,
    /// 单调递增的发射计数，低 8 位作为请求 tag
    next_seq: u64,
    /// 到达该 PC 时停止取指
    halt_pc: Option<u32>,
    stats: ProcStats,
    /// 本周期发射情况（line trace 用）
    trace: String,
}

impl Processor {
    /// 创建一个处理器
    ///
    /// ```
    /// use tinyrv0_sim::cpu::Processor;
    ///
    /// let proc = Processor::new(4);
    /// assert_eq!(proc.read_reg(0), 0);
    /// assert!(proc.is_finished());
    /// ```
    pub fn new(max_inflight: usize) -> Self {
        Self {
            status: Status::new(),
            pc: 0,
            fetch: FetchState::Idle,
            fetch_tag: 0,
            inflight: InFlightTable::new(max_inflight),
            next_seq: 0,
            halt_pc: None,
            stats: ProcStats::default(),
            trace: String::new(),
        }
    }

    /// 复位：清空寄存器、CSR、请求表与统计，从 `entry` 开始取指
    pub fn reset(&mut self, entry: u32, halt_pc: Option<u32>) {
        self.status.reset();
        self.pc = entry;
        self.fetch = FetchState::Idle;
        self.fetch_tag = 0;
        self.inflight.clear();
        self.next_seq = 0;
        self.halt_pc = halt_pc;
        self.stats = ProcStats::default();
        self.trace.clear();
    }

    /// 下一次取指的 PC
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// 读取 x0 总是返回 0
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.status.int_read(reg)
    }

    /// CSR 当前值，未声明的 CSR 返回 `None`
    pub fn csr(&self, addr: u16) -> Option<u32> {
        self.status.csr.read(addr)
    }

    /// 获取完整架构状态快照
    pub fn snapshot(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    pub fn stats(&self) -> ProcStats {
        self.stats
    }

    /// 处理器是否已经执行完毕
    ///
    /// 有停机点时：PC 到达停机点、没有未完成取指且请求表为空；
    /// 没有停机点时：请求表为空。
    pub fn is_finished(&self) -> bool {
        match self.halt_pc {
            Some(halt) => self.pc == halt && self.fetch == FetchState::Idle && self.inflight.is_empty(),
            None => self.inflight.is_empty(),
        }
    }

    fn stats_enabled(&self) -> bool {
        self.status.csr.read(csr_def::CSR_STATS_EN).is_some_and(|v| v != 0)
    }

    fn retire(&mut self) {
        self.stats.retired += 1;
        if self.stats_enabled() {
            self.stats.stats_retired += 1;
        }
    }

    /// 推进一个周期
    pub fn tick(&mut self, cycle: u64, io: &mut ProcIo<'_>) -> Result<(), SimError> {
        self.stats.cycles += 1;
        if self.stats_enabled() {
            self.stats.stats_cycles += 1;
        }
        self.trace.clear();
        self.inflight.advance();

        // 1. 接收响应
        if let Some(resp) = io.dmem.resp.recv() {
            self.inflight.complete(ReqPort::Dmem, resp.opaque, resp.data)?;
        }
        if let Some(resp) = io.xcel.resp.recv() {
            self.inflight.complete(ReqPort::Xcel, resp.opaque, resp.data)?;
        }

        // 2. 按发射顺序提交
        while let Some(record) = self.inflight.pop_committed() {
            if let Some(rd) = record.dest {
                self.status.int_write(rd, record.data);
            }
            debug!(
                "[{cycle}] commit #{} {:?} pc=0x{:08x} addr=0x{:08x} data=0x{:08x} (issued @{})",
                record.seq, record.kind, record.pc, record.addr, record.data, record.issue_cycle
            );
            self.retire();
        }

        // 3. 取指响应
        if let FetchState::Waiting { pc, tag } = self.fetch
            && let Some(resp) = io.imem.resp.recv()
        {
            if resp.opaque != tag {
                return Err(SimError::Protocol(format!(
                    "imem response tag {:#04x} does not match fetch tag {tag:#04x}",
                    resp.opaque
                )));
            }
            self.fetch = FetchState::Ready { pc, raw: resp.data };
        }

        // 4. 发射
        if let FetchState::Ready { pc, raw } = self.fetch {
            match self.issue(cycle, pc, raw, io)? {
                Some(next_pc) => {
                    self.pc = next_pc;
                    self.fetch = FetchState::Idle;
                }
                None => {
                    self.stats.stall_cycles += 1;
                    self.trace = "#".to_string();
                }
            }
        }

        // 5. 取指
        if self.fetch == FetchState::Idle && Some(self.pc) != self.halt_pc {
            let pc = self.pc;
            if !pc.is_multiple_of(4) {
                return Err(SimError::AlignmentFault { pc, addr: pc, access: "fetch" });
            }
            if io.imem.req.can_send() {
                let tag = self.fetch_tag;
                io.imem
                    .req
                    .send(MemReq::read(tag, pc))
                    .map_err(|_| SimError::Protocol("imem request channel full".into()))?;
                self.fetch_tag = self.fetch_tag.wrapping_add(1);
                self.fetch = FetchState::Waiting { pc, tag };
                self.stats.fetches += 1;
            }
        }

        Ok(())
    }

    /// 尝试发射一条指令；发射成功返回下一条 PC，停顿返回 `None`
    fn issue(&mut self, cycle: u64, pc: u32, raw: u32, io: &mut ProcIo<'_>) -> Result<Option<u32>, SimError> {
        let instr = isa::decode(raw)
            .ok_or(SimError::IllegalInstruction { pc, raw })?
            .instr;

        let srcs = instr.sources();
        let hazard = srcs
            .iter()
            .flatten()
            .copied()
            .chain(instr.dest())
            .any(|r| self.inflight.writes_pending(r));
        if hazard {
            debug!("[{cycle}] stall pc=0x{pc:08x} {instr}: register hazard");
            return Ok(None);
        }

        let a = srcs[0].map_or(0, |r| self.status.int_read(r));
        let b = srcs[1].map_or(0, |r| self.status.int_read(r));
        let next_pc = pc.wrapping_add(4);

        if let Some(value) = exu::rv32i::alu(instr, a, b) {
            if let Some(rd) = instr.dest() {
                self.status.int_write(rd, value);
            }
            self.retire();
            self.issued(cycle, pc, instr);
            return Ok(Some(next_pc));
        }

        let issued = match instr {
            Instr::Bne { offset, .. } => {
                self.retire();
                self.issued(cycle, pc, instr);
                return Ok(Some(exu::rv32i::bne_next_pc(pc, offset, a, b)));
            }
            Instr::Lw { offset, .. } | Instr::Sw { offset, .. } => {
                let addr = exu::rv32i::agen(a, offset);
                let (kind, access) = match instr {
                    Instr::Lw { .. } => (InFlightKind::Load, "load"),
                    _ => (InFlightKind::Store, "store"),
                };
                if !addr.is_multiple_of(4) {
                    return Err(SimError::AlignmentFault { pc, addr, access });
                }
                self.issue_mem(cycle, pc, instr, kind, addr, b, io)?
            }
            Instr::XcelRead { xr, .. } => self.issue_xcel(cycle, pc, instr, InFlightKind::XcelRead, xr, 0, io)?,
            Instr::XcelWrite { xr, .. } => self.issue_xcel(cycle, pc, instr, InFlightKind::XcelWrite, xr, a, io)?,
            Instr::Csr { op, rd, src, csr } => {
                let issued = self.issue_csr(cycle, pc, raw, op, rd, src, csr, a, io)?;
                if issued {
                    self.retire();
                }
                issued
            }
            _ => return Err(SimError::IllegalInstruction { pc, raw }),
        };

        if issued {
            self.issued(cycle, pc, instr);
            Ok(Some(next_pc))
        } else {
            Ok(None)
        }
    }

    fn issued(&mut self, cycle: u64, pc: u32, instr: Instr) {
        debug!("[{cycle}] issue pc=0x{pc:08x} {instr}");
        self.trace = format!("{pc:08x} {instr}");
    }

    fn alloc_record(&mut self, cycle: u64, pc: u32, port: ReqPort, kind: InFlightKind, addr: u32, data: u32, dest: Option<u8>) -> u8 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let tag = seq as u8;
        self.inflight.push(InFlight {
            seq,
            tag,
            port,
            kind,
            pc,
            addr,
            data,
            issue_cycle: cycle,
            dest,
            state: InFlightState::Issued,
        });
        tag
    }

    #[allow(clippy::too_many_arguments)]
    fn issue_mem(
        &mut self,
        cycle: u64,
        pc: u32,
        instr: Instr,
        kind: InFlightKind,
        addr: u32,
        data: u32,
        io: &mut ProcIo<'_>,
    ) -> Result<bool, SimError> {
        if !io.dmem.req.can_send() || !self.inflight.has_room() {
            debug!("[{cycle}] stall pc=0x{pc:08x} {instr}: dmem busy");
            return Ok(false);
        }
        let tag = self.alloc_record(cycle, pc, ReqPort::Dmem, kind, addr, data, instr.dest());
        let req = match kind {
            InFlightKind::Load => MemReq::read(tag, addr),
            _ => MemReq::write(tag, addr, data),
        };
        io.dmem
            .req
            .send(req)
            .map_err(|_| SimError::Protocol("dmem request channel full".into()))?;
        self.stats.mem_requests += 1;
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    fn issue_xcel(
        &mut self,
        cycle: u64,
        pc: u32,
        instr: Instr,
        kind: InFlightKind,
        xr: u8,
        data: u32,
        io: &mut ProcIo<'_>,
    ) -> Result<bool, SimError> {
        if !io.xcel.req.can_send() || !self.inflight.has_room() {
            debug!("[{cycle}] stall pc=0x{pc:08x} {instr}: xcel busy");
            return Ok(false);
        }
        let tag = self.alloc_record(cycle, pc, ReqPort::Xcel, kind, u32::from(xr), data, instr.dest());
        let req_kind = match kind {
            InFlightKind::XcelRead => ReqKind::Read,
            _ => ReqKind::Write,
        };
        io.xcel
            .req
            .send(XcelReq { kind: req_kind, opaque: tag, addr: xr, data })
            .map_err(|_| SimError::Protocol("xcel request channel full".into()))?;
        self.stats.xcel_requests += 1;
        Ok(true)
    }

    /// CSR 读改写。所有停顿条件在任何副作用之前检查。
    #[allow(clippy::too_many_arguments)]
    fn issue_csr(
        &mut self,
        cycle: u64,
        pc: u32,
        raw: u32,
        op: CsrOp,
        rd: u8,
        src: CsrSrc,
        csr: u16,
        rs1_val: u32,
        io: &mut ProcIo<'_>,
    ) -> Result<bool, SimError> {
        let Some(entry) = self.status.csr.entry(csr).copied() else {
            return Err(SimError::IllegalInstruction { pc, raw });
        };
        let read = exu::zicsr::reads_csr(op, rd);
        let write = exu::zicsr::writes_csr(op, src);
        if write && !entry.access.writable() {
            return Err(SimError::IllegalInstruction { pc, raw });
        }

        match entry.access {
            CsrAccess::Mngr2Proc if read && !io.src.valid() => {
                debug!("[{cycle}] stall pc=0x{pc:08x}: mngr2proc empty");
                return Ok(false);
            }
            CsrAccess::Proc2Mngr if write && !io.sink.ready() => {
                debug!("[{cycle}] stall pc=0x{pc:08x}: proc2mngr not ready");
                return Ok(false);
            }
            _ => {}
        }

        let old = match entry.access {
            CsrAccess::Mngr2Proc if read => io
                .src
                .recv()
                .ok_or_else(|| SimError::Protocol("mngr2proc message vanished".into()))?,
            CsrAccess::Mngr2Proc | CsrAccess::Proc2Mngr => 0,
            CsrAccess::ReadOnly | CsrAccess::ReadWrite => self.status.csr.read(csr).unwrap_or(entry.reset),
        };

        if write {
            let operand = match src {
                CsrSrc::Reg(_) => rs1_val,
                CsrSrc::Imm(zimm) => u32::from(zimm),
            };
            let new = exu::zicsr::csr_update(op, old, operand);
            if entry.access == CsrAccess::Proc2Mngr {
                debug!("[{cycle}] proc2mngr <- 0x{new:08x}");
                io.sink.send(new)?;
            } else {
                if csr == csr_def::CSR_STATS_EN && (old != 0) != (new != 0) {
                    debug!("[{cycle}] stats_en {} at pc=0x{pc:08x}", if new != 0 { "on" } else { "off" });
                }
                self.status.csr.write(csr, new);
            }
        }

        if read {
            self.status.int_write(rd, old);
        }
        Ok(true)
    }

    /// 本周期的发射情况：发射的指令、`#`（停顿）或空白
    pub fn line_trace(&self) -> String {
        format!("{:<32}", self.trace)
    }

    /// 打印寄存器与 CSR（用于调试）
    pub fn dump_regs(&self) {
        println!("PC: 0x{:08x}  Fetch: {:?}  In-flight: {}", self.pc, self.fetch, self.inflight.len());
        for i in 0..32u8 {
            if i % 4 == 0 {
                print!("  ");
            }
            print!("x{:02}: 0x{:08x}  ", i, self.read_reg(i));
            if i % 4 == 3 {
                println!();
            }
        }
        for (addr, value) in self.status.csr_snapshot() {
            let name = csr_def::lookup(addr).map_or("?", |e| e.name);
            println!("  {name:>9} (0x{addr:03x}): 0x{value:08x}");
        }
    }
}
