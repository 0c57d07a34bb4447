//! Request/response port protocol.
//!
//! Every port is a pair of latched channels. A message sent during cycle `t`
//! becomes visible to the receiver in cycle `t + 1`, after the harness calls
//! [`Port::commit`] at the end of the tick. Responses carry the `opaque` tag of
//! the request they answer.

use std::collections::VecDeque;
use std::fmt;

/// Request/response direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReqKind {
    Read,
    Write,
}

impl ReqKind {
    fn tag(self) -> &'static str {
        match self {
            ReqKind::Read => "rd",
            ReqKind::Write => "wr",
        }
    }
}

/// Memory request. `len` is in bytes, 0 means a full word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemReq {
    pub kind: ReqKind,
    pub opaque: u8,
    pub addr: u32,
    pub len: u8,
    pub data: u32,
}

impl MemReq {
    pub fn read(opaque: u8, addr: u32) -> Self {
        Self { kind: ReqKind::Read, opaque, addr, len: 0, data: 0 }
    }

    pub fn write(opaque: u8, addr: u32, data: u32) -> Self {
        Self { kind: ReqKind::Write, opaque, addr, len: 0, data }
    }
}

impl fmt::Display for MemReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReqKind::Read => write!(f, "{}:{:02x}:{:08x}", self.kind.tag(), self.opaque, self.addr),
            ReqKind::Write => write!(
                f,
                "{}:{:02x}:{:08x}:{:08x}",
                self.kind.tag(),
                self.opaque,
                self.addr,
                self.data
            ),
        }
    }
}

/// Memory response. Write responses carry no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemResp {
    pub kind: ReqKind,
    pub opaque: u8,
    pub len: u8,
    pub data: u32,
}

impl fmt::Display for MemResp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReqKind::Read => write!(f, "{}:{:02x}:{:08x}", self.kind.tag(), self.opaque, self.data),
            ReqKind::Write => write!(f, "{}:{:02x}", self.kind.tag(), self.opaque),
        }
    }
}

/// Accelerator request addressing one of the 32 accelerator registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XcelReq {
    pub kind: ReqKind,
    pub opaque: u8,
    pub addr: u8,
    pub data: u32,
}

impl fmt::Display for XcelReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReqKind::Read => write!(f, "{}:{:02x}:xr{:02}", self.kind.tag(), self.opaque, self.addr),
            ReqKind::Write => write!(
                f,
                "{}:{:02x}:xr{:02}:{:08x}",
                self.kind.tag(),
                self.opaque,
                self.addr,
                self.data
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XcelResp {
    pub kind: ReqKind,
    pub opaque: u8,
    pub data: u32,
}

impl fmt::Display for XcelResp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReqKind::Read => write!(f, "{}:{:02x}:{:08x}", self.kind.tag(), self.opaque, self.data),
            ReqKind::Write => write!(f, "{}:{:02x}", self.kind.tag(), self.opaque),
        }
    }
}

/// Bounded, latched queue.
///
/// `send` stages a message; it only becomes visible to `peek`/`recv` after
/// `commit`. Capacity counts both staged and visible messages.
#[derive(Debug, Clone)]
pub struct Channel<T> {
    capacity: usize,
    staged: VecDeque<T>,
    visible: VecDeque<T>,
}

impl<T> Channel<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            staged: VecDeque::new(),
            visible: VecDeque::new(),
        }
    }

    pub fn can_send(&self) -> bool {
        self.len() < self.capacity
    }

    /// Stage a message. Returns it back if the channel is full.
    pub fn send(&mut self, msg: T) -> Result<(), T> {
        if !self.can_send() {
            return Err(msg);
        }
        self.staged.push_back(msg);
        Ok(())
    }

    pub fn peek(&self) -> Option<&T> {
        self.visible.front()
    }

    pub fn recv(&mut self) -> Option<T> {
        self.visible.pop_front()
    }

    /// Latch staged messages. Called once per cycle by the harness.
    pub fn commit(&mut self) {
        self.visible.append(&mut self.staged);
    }

    pub fn len(&self) -> usize {
        self.staged.len() + self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.staged.clear();
        self.visible.clear();
    }
}

/// Request channel towards the model plus response channel back.
#[derive(Debug, Clone)]
pub struct Port<Req, Resp> {
    pub req: Channel<Req>,
    pub resp: Channel<Resp>,
}

impl<Req: fmt::Display, Resp: fmt::Display> Port<Req, Resp> {
    pub fn new(capacity: usize) -> Self {
        Self {
            req: Channel::new(capacity),
            resp: Channel::new(capacity),
        }
    }

    pub fn commit(&mut self) {
        self.req.commit();
        self.resp.commit();
    }

    pub fn clear(&mut self) {
        self.req.clear();
        self.resp.clear();
    }

    /// Visible head of each direction, blank-padded to `width`.
    pub fn line_trace(&self, width: usize) -> String {
        let req = self.req.peek().map(ToString::to_string).unwrap_or_default();
        let resp = self.resp.peek().map(ToString::to_string).unwrap_or_default();
        format!("{req:<width$}()>{resp:<width$}")
    }
}

pub type MemPort = Port<MemReq, MemResp>;
pub type XcelPort = Port<XcelReq, XcelResp>;

/// Fixed-latency delivery queue used inside the timing models.
///
/// Entries must be pushed with non-decreasing ready cycles, which keeps
/// delivery in acceptance order.
#[derive(Debug, Clone)]
pub struct LatencyPipe<T> {
    entries: VecDeque<(u64, T)>,
}

impl<T> Default for LatencyPipe<T> {
    fn default() -> Self {
        Self { entries: VecDeque::new() }
    }
}

impl<T> LatencyPipe<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ready_cycle: u64, item: T) {
        self.entries.push_back((ready_cycle, item));
    }

    /// Pop the oldest entry if it is ready by `now`.
    pub fn pop_ready(&mut self, now: u64) -> Option<T> {
        match self.entries.front() {
            Some((ready, _)) if *ready <= now => self.entries.pop_front().map(|(_, item)| item),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_latches_on_commit() {
        let mut ch: Channel<u32> = Channel::new(2);
        ch.send(1).unwrap();
        assert!(ch.peek().is_none());
        ch.commit();
        assert_eq!(ch.peek(), Some(&1));
        assert_eq!(ch.recv(), Some(1));
        assert!(ch.is_empty());
    }

    #[test]
    fn test_channel_capacity() {
        let mut ch: Channel<u32> = Channel::new(2);
        ch.send(1).unwrap();
        ch.commit();
        ch.send(2).unwrap();
        assert!(!ch.can_send());
        assert_eq!(ch.send(3), Err(3));
        ch.commit();
        assert_eq!(ch.recv(), Some(1));
        assert_eq!(ch.recv(), Some(2));
    }

    #[test]
    fn test_latency_pipe_order() {
        let mut pipe = LatencyPipe::new();
        pipe.push(3, 'a');
        pipe.push(3, 'b');
        pipe.push(5, 'c');
        assert_eq!(pipe.pop_ready(2), None);
        assert_eq!(pipe.pop_ready(3), Some('a'));
        assert_eq!(pipe.pop_ready(3), Some('b'));
        assert_eq!(pipe.pop_ready(4), None);
        assert_eq!(pipe.pop_ready(9), Some('c'));
        assert!(pipe.is_empty());
    }

    #[test]
    fn test_message_display() {
        assert_eq!(MemReq::read(1, 0x200).to_string(), "rd:01:00000200");
        assert_eq!(MemReq::write(2, 0, 12).to_string(), "wr:02:00000000:0000000c");
        let resp = XcelResp { kind: ReqKind::Write, opaque: 3, data: 0 };
        assert_eq!(resp.to_string(), "wr:03");
    }
}
