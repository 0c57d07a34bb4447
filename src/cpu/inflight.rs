//! In-flight request table.
//!
//! One record per outstanding memory or accelerator request, kept in global
//! issue order. Responses are matched to the oldest waiting record of their
//! port and records commit strictly from the head.

use std::collections::VecDeque;

use crate::error::SimError;

/// Port a record is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReqPort {
    Dmem,
    Xcel,
}

/// What the request does on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlightKind {
    Load,
    Store,
    XcelRead,
    XcelWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlightState {
    /// Request sent this cycle.
    Issued,
    Waiting,
    Received,
}

#[derive(Debug, Clone)]
pub struct InFlight {
    pub seq: u64,
    pub tag: u8,
    pub port: ReqPort,
    pub kind: InFlightKind,
    pub pc: u32,
    pub addr: u32,
    pub data: u32,
    pub issue_cycle: u64,
    pub dest: Option<u8>,
    pub state: InFlightState,
}

#[derive(Debug, Clone)]
pub struct InFlightTable {
    capacity: usize,
    records: VecDeque<InFlight>,
}

impl InFlightTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: VecDeque::new(),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn has_room(&self) -> bool {
        self.records.len() < self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn push(&mut self, record: InFlight) {
        self.records.push_back(record);
    }

    /// An uncommitted record will write `reg`.
    pub fn writes_pending(&self, reg: u8) -> bool {
        self.records.iter().any(|r| r.dest == Some(reg))
    }

    /// Records issued last cycle start waiting.
    pub fn advance(&mut self) {
        for r in &mut self.records {
            if r.state == InFlightState::Issued {
                r.state = InFlightState::Waiting;
            }
        }
    }

    /// Match a response to the oldest waiting record of `port`.
    pub fn complete(&mut self, port: ReqPort, tag: u8, data: u32) -> Result<&InFlight, SimError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.port == port && r.state == InFlightState::Waiting)
            .ok_or_else(|| SimError::Protocol(format!("{port:?} response with tag {tag:#04x} has no request")))?;

        if record.tag != tag {
            return Err(SimError::Protocol(format!(
                "{port:?} response tag {tag:#04x} does not match oldest request tag {:#04x}",
                record.tag
            )));
        }

        if matches!(record.kind, InFlightKind::Load | InFlightKind::XcelRead) {
            record.data = data;
        }
        record.state = InFlightState::Received;
        Ok(record)
    }

    /// Remove the head record if its response has arrived.
    pub fn pop_committed(&mut self) -> Option<InFlight> {
        match self.records.front() {
            Some(r) if r.state == InFlightState::Received => self.records.pop_front(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: u64, port: ReqPort, kind: InFlightKind, dest: Option<u8>) -> InFlight {
        InFlight {
            seq,
            tag: seq as u8,
            port,
            kind,
            pc: 0x200,
            addr: 0,
            data: 0,
            issue_cycle: 0,
            dest,
            state: InFlightState::Issued,
        }
    }

    #[test]
    fn test_commit_in_issue_order() {
        let mut t = InFlightTable::new(4);
        t.push(record(0, ReqPort::Dmem, InFlightKind::Load, Some(1)));
        t.push(record(1, ReqPort::Xcel, InFlightKind::XcelRead, Some(2)));
        t.advance();

        // xcel answers first but waits for the older dmem record
        t.complete(ReqPort::Xcel, 1, 22).unwrap();
        assert!(t.pop_committed().is_none());
        assert!(t.writes_pending(2));

        t.complete(ReqPort::Dmem, 0, 11).unwrap();
        let first = t.pop_committed().unwrap();
        assert_eq!((first.dest, first.data), (Some(1), 11));
        let second = t.pop_committed().unwrap();
        assert_eq!((second.dest, second.data), (Some(2), 22));
        assert!(t.is_empty());
    }

    #[test]
    fn test_tag_mismatch_is_protocol_error() {
        let mut t = InFlightTable::new(4);
        t.push(record(5, ReqPort::Dmem, InFlightKind::Store, None));
        t.advance();
        assert!(matches!(t.complete(ReqPort::Dmem, 6, 0), Err(SimError::Protocol(_))));
    }

    #[test]
    fn test_response_before_wait_is_rejected() {
        let mut t = InFlightTable::new(4);
        t.push(record(0, ReqPort::Dmem, InFlightKind::Load, Some(1)));
        assert!(t.complete(ReqPort::Dmem, 0, 0).is_err());
    }

    #[test]
    fn test_capacity() {
        let mut t = InFlightTable::new(1);
        assert!(t.has_room());
        t.push(record(0, ReqPort::Dmem, InFlightKind::Store, None));
        assert!(!t.has_room());
    }
}
