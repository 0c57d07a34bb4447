//! Test source (`mngr2proc`) and test sink (`proc2mngr`).
//!
//! Both ends hold back for a configurable number of cycles after every
//! transfer, and once before the first one. The processor observes them
//! through `valid`/`recv` and `ready`/`send` during its tick; the harness
//! calls `tick` once per cycle afterwards.

use std::collections::VecDeque;

use crate::error::{Location, Mismatch, SimError};

/// Countdown shared by source and sink.
#[derive(Debug, Clone)]
struct Delay {
    delay: u32,
    countdown: u32,
    fired: bool,
}

impl Delay {
    fn new(delay: u32) -> Self {
        Self { delay, countdown: delay, fired: false }
    }

    fn open(&self) -> bool {
        self.countdown == 0
    }

    fn fire(&mut self) {
        self.countdown = self.delay;
        self.fired = true;
    }

    fn tick(&mut self) {
        if self.fired {
            self.fired = false;
        } else {
            self.countdown = self.countdown.saturating_sub(1);
        }
    }
}

/// Feeds `mngr2proc` messages to the processor.
#[derive(Debug, Clone)]
pub struct TestSource {
    msgs: VecDeque<u32>,
    delay: Delay,
    sent: usize,
}

impl TestSource {
    pub fn new(msgs: impl IntoIterator<Item = u32>, delay: u32) -> Self {
        Self {
            msgs: msgs.into_iter().collect(),
            delay: Delay::new(delay),
            sent: 0,
        }
    }

    /// A message is offered this cycle.
    pub fn valid(&self) -> bool {
        self.delay.open() && !self.msgs.is_empty()
    }

    pub fn recv(&mut self) -> Option<u32> {
        if !self.valid() {
            return None;
        }
        let msg = self.msgs.pop_front()?;
        self.sent += 1;
        self.delay.fire();
        Some(msg)
    }

    pub fn tick(&mut self) {
        self.delay.tick();
    }

    pub fn done(&self) -> bool {
        self.msgs.is_empty()
    }

    pub fn line_trace(&self) -> String {
        match self.msgs.front() {
            Some(msg) if self.valid() => format!("{msg:08x}"),
            Some(_) => "#".to_string(),
            None => " ".to_string(),
        }
    }
}

/// Checks `proc2mngr` messages against the expected stream.
#[derive(Debug, Clone)]
pub struct TestSink {
    expected: Vec<u32>,
    received: Vec<u32>,
    delay: Delay,
}

impl TestSink {
    pub fn new(expected: impl IntoIterator<Item = u32>, delay: u32) -> Self {
        Self {
            expected: expected.into_iter().collect(),
            received: Vec::new(),
            delay: Delay::new(delay),
        }
    }

    /// The sink accepts a message this cycle.
    pub fn ready(&self) -> bool {
        self.delay.open()
    }

    /// Deliver one message. Fails on the first mismatch or on an extra message.
    pub fn send(&mut self, value: u32) -> Result<(), SimError> {
        let idx = self.received.len();
        let Some(&expected) = self.expected.get(idx) else {
            return Err(SimError::UnexpectedMessage { value });
        };
        self.received.push(value);
        self.delay.fire();
        if value != expected {
            return Err(Mismatch {
                location: Location::Proc2Mngr(idx),
                expected,
                observed: value,
            }
            .into());
        }
        Ok(())
    }

    pub fn tick(&mut self) {
        self.delay.tick();
    }

    pub fn done(&self) -> bool {
        self.received.len() >= self.expected.len()
    }

    pub fn received(&self) -> &[u32] {
        &self.received
    }

    pub fn line_trace(&self) -> String {
        if self.ready() { " ".to_string() } else { "#".to_string() }
    }
}
