//! Accelerator model behind the accelerator port.
//!
//! A bank of 32 registers. One request is accepted per cycle and answered
//! after a fixed latency, strictly in acceptance order. Reads return the
//! register value, writes return an acknowledgement.

use log::debug;

use crate::error::SimError;
use crate::port::{LatencyPipe, ReqKind, XcelPort, XcelResp};

pub const NUM_XCEL_REGS: usize = 32;

pub struct XcelRegBank {
    regs: [u32; NUM_XCEL_REGS],
    latency: u64,
    pipe: LatencyPipe<XcelResp>,
}

impl XcelRegBank {
    pub fn new(latency: u32) -> Self {
        Self {
            regs: [0; NUM_XCEL_REGS],
            latency: u64::from(latency.max(1)),
            pipe: LatencyPipe::new(),
        }
    }

    pub fn reset(&mut self) {
        self.regs = [0; NUM_XCEL_REGS];
        self.pipe.clear();
    }

    pub fn read(&self, xr: u8) -> u32 {
        self.regs[usize::from(xr) % NUM_XCEL_REGS]
    }

    pub fn is_idle(&self) -> bool {
        self.pipe.is_empty()
    }

    pub fn tick(&mut self, cycle: u64, port: &mut XcelPort) -> Result<(), SimError> {
        if let Some(req) = port.req.recv() {
            let idx = usize::from(req.addr);
            if idx >= NUM_XCEL_REGS {
                return Err(SimError::Protocol(format!("accelerator register xr{idx} out of range")));
            }
            let data = match req.kind {
                ReqKind::Read => self.regs[idx],
                ReqKind::Write => {
                    self.regs[idx] = req.data;
                    0
                }
            };
            debug!("[{cycle}] xcel accept {req}");
            self.pipe.push(
                cycle + self.latency - 1,
                XcelResp { kind: req.kind, opaque: req.opaque, data },
            );
        }

        if port.resp.can_send()
            && let Some(resp) = self.pipe.pop_ready(cycle)
        {
            debug!("[{cycle}] xcel resp {resp}");
            port.resp
                .send(resp)
                .map_err(|_| SimError::Protocol("xcel response channel full".into()))?;
        }
        Ok(())
    }
}
