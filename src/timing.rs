//! Timing-injection memory model.
//!
//! Wraps a [`FlatMemory`] shared by two ports (instruction and data). Each
//! cycle each port may accept at most one request:
//!
//! - The first cycle a request sits at the head of a port's queue it draws one
//!   Bernoulli trial with the configured stall probability. A hit delays
//!   acceptance by one cycle.
//! - On acceptance the access is performed against the array and the response
//!   becomes visible to the processor `latency` cycles later.
//! - Responses leave a port in acceptance order.
//!
//! Stall draws come from a seeded `Pcg32`, so a fixed seed reproduces the
//! identical schedule.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::SimError;
use crate::memory::{AccessSize, FlatMemory, MemError, Memory};
use crate::port::{LatencyPipe, MemPort, MemReq, MemResp, ReqKind};

/// Port index into [`TimingMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemPortId {
    Imem = 0,
    Dmem = 1,
}

impl MemPortId {
    pub fn name(self) -> &'static str {
        match self {
            MemPortId::Imem => "imem",
            MemPortId::Dmem => "dmem",
        }
    }
}

/// Per-port counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    pub accepted: u64,
    pub stalls: u64,
}

#[derive(Debug, Default)]
struct PortState {
    /// The current head request already drew its stall trial.
    head_drawn: bool,
    pipe: LatencyPipe<MemResp>,
    stats: PortStats,
}

pub struct TimingMemory {
    mem: FlatMemory,
    latency: u64,
    stall_prob: f64,
    rng: Pcg32,
    ports: [PortState; 2],
}

impl TimingMemory {
    pub fn new(mem: FlatMemory, latency: u32, stall_prob: f64, seed: u64) -> Self {
        Self {
            mem,
            latency: u64::from(latency.max(1)),
            stall_prob: stall_prob.clamp(0.0, 1.0),
            rng: Pcg32::seed_from_u64(seed),
            ports: [PortState::default(), PortState::default()],
        }
    }

    /// Drop in-flight responses, clear the array and reseed the stall PRNG.
    pub fn reset(&mut self, seed: u64) {
        self.mem.clear();
        self.rng = Pcg32::seed_from_u64(seed);
        self.ports = [PortState::default(), PortState::default()];
    }

    pub fn mem(&self) -> &FlatMemory {
        &self.mem
    }

    /// Direct array access for image loading. Bypasses timing.
    pub fn mem_mut(&mut self) -> &mut FlatMemory {
        &mut self.mem
    }

    pub fn stats(&self, id: MemPortId) -> PortStats {
        self.ports[id as usize].stats
    }

    /// Advance both ports by one cycle.
    pub fn tick(&mut self, cycle: u64, imem: &mut MemPort, dmem: &mut MemPort) -> Result<(), SimError> {
        self.tick_port(cycle, MemPortId::Imem, imem)?;
        self.tick_port(cycle, MemPortId::Dmem, dmem)
    }

    fn tick_port(&mut self, cycle: u64, id: MemPortId, port: &mut MemPort) -> Result<(), SimError> {
        self.accept(cycle, id, port)?;

        // deliver due responses (with latency 1, the one accepted this cycle)
        let idx = id as usize;
        if port.resp.can_send()
            && let Some(resp) = self.ports[idx].pipe.pop_ready(cycle)
        {
            debug!("[{cycle}] {} resp {resp}", id.name());
            port.resp
                .send(resp)
                .map_err(|_| SimError::Protocol(format!("{} response channel full", id.name())))?;
        }
        Ok(())
    }

    fn accept(&mut self, cycle: u64, id: MemPortId, port: &mut MemPort) -> Result<(), SimError> {
        let idx = id as usize;
        if port.req.peek().is_none() {
            return Ok(());
        }

        if !self.ports[idx].head_drawn {
            self.ports[idx].head_drawn = true;
            if self.rng.gen_bool(self.stall_prob) {
                self.ports[idx].stats.stalls += 1;
                debug!("[{cycle}] {} stall", id.name());
                return Ok(());
            }
        }

        let Some(req) = port.req.recv() else {
            return Ok(());
        };
        let resp = self.access(&req)?;
        let state = &mut self.ports[idx];
        state.head_drawn = false;
        state.stats.accepted += 1;
        // a message sent this cycle is visible next cycle, so it is due one cycle early
        state.pipe.push(cycle + self.latency - 1, resp);
        debug!("[{cycle}] {} accept {req}", id.name());
        Ok(())
    }

    fn access(&mut self, req: &MemReq) -> Result<MemResp, SimError> {
        let size = AccessSize::from_len(req.len).ok_or(MemError::BadLength {
            addr: req.addr,
            len: req.len,
        })?;
        let data = match req.kind {
            ReqKind::Read => self.mem.load(req.addr, size)?,
            ReqKind::Write => {
                self.mem.store(req.addr, size, req.data)?;
                0
            }
        };
        Ok(MemResp {
            kind: req.kind,
            opaque: req.opaque,
            len: req.len,
            data,
        })
    }
}
