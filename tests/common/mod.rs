//! A simulated PS/2 host and key matrix behind `embedded-hal` pins.
//!
//! Both bus lines are wired-AND: a line is high unless the device or the host
//! pulls it low. Time only moves when the keyboard calls its delay provider.
//! Device frames are decoded on device-generated falling CLOCK edges; host
//! bytes are clocked out one bit per falling edge, the way a host controller
//! answers the device's clock.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use ps2_kbd::key_code::{COLS, ROWS};
use ps2_kbd::{Column, Config, Keyboard, Matrix, Port, TickCounter};

/// A frame the device put on the wire.
#[derive(Debug, Clone)]
pub struct Captured {
    pub byte: u8,
    pub start: bool,
    pub parity: bool,
    pub stop: bool,
    /// Falling CLOCK edges, in simulated microseconds.
    pub falls: Vec<u64>,
    /// Rising CLOCK edges.
    pub rises: Vec<u64>,
}

impl Captured {
    pub fn is_well_formed(&self) -> bool {
        let ones = self.byte.count_ones() + self.parity as u32;
        !self.start && self.stop && ones % 2 == 1
    }

    /// When the device let CLOCK go after the last bit.
    pub fn end(&self) -> u64 {
        self.rises.last().copied().unwrap_or_default()
    }
}

/// Traffic on the bus, in order.
#[derive(Debug, Clone)]
pub enum Event {
    Device(Captured),
    Host { byte: u8, acked: bool },
}

struct HostTx {
    byte: u8,
    /// d0..d7, parity, stop.
    bits: u16,
    edge: usize,
}

#[derive(Default)]
struct Sim {
    now_us: u64,

    dev_data: bool,
    dev_clock: bool,
    host_data: bool,
    host_clock: bool,

    rx_bits: Vec<bool>,
    rx_falls: Vec<u64>,
    rx_rises: Vec<u64>,

    queue: VecDeque<(u8, bool)>,
    tx: Option<HostTx>,
    /// False while the host waits for the device to answer its last byte.
    ready: bool,

    inhibit_after: Option<usize>,
    /// Bytes queued once the device frame count reaches the first field.
    send_after: Vec<(usize, u8)>,
    inhibit_us: u64,
    inhibit_until: Option<u64>,

    events: Vec<Event>,

    /// Columns being driven high. A released column floats.
    cols: [bool; COLS],
    most_cols_driven: usize,
    pressed: [[bool; ROWS]; COLS],
    caps_lock: bool,
}

impl Sim {
    fn data(&self) -> bool {
        self.dev_data && self.host_data
    }

    fn clock(&self) -> bool {
        self.dev_clock && self.host_clock
    }

    fn device_frames(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Device(_)))
            .count()
    }

    /// The host starts a transfer as soon as the device looks at an idle bus.
    fn maybe_request_to_send(&mut self) {
        if self.tx.is_some() || !self.ready || !self.rx_bits.is_empty() {
            return;
        }
        if !self.clock() || !self.host_clock {
            return;
        }
        if let Some((byte, good_parity)) = self.queue.pop_front() {
            let parity = (byte.count_ones() % 2 == 0) == good_parity;
            let bits = byte as u16 | (parity as u16) << 8 | 1 << 9;
            self.host_data = false;
            self.tx = Some(HostTx { byte, bits, edge: 0 });
        }
    }

    fn set_clock(&mut self, high: bool) {
        let before = self.clock();
        self.dev_clock = high;
        let after = self.clock();
        if before && !after {
            self.falling_edge();
        } else if !before && after && self.tx.is_none() && !self.rx_falls.is_empty() {
            self.rx_rises.push(self.now_us);
            if self.rx_bits.len() == 11 {
                self.finish_frame();
            }
        }
    }

    fn falling_edge(&mut self) {
        if let Some(tx) = self.tx.as_mut() {
            if tx.edge < 10 {
                self.host_data = tx.bits >> tx.edge & 1 != 0;
                tx.edge += 1;
            } else {
                let acked = !self.dev_data;
                let byte = tx.byte;
                self.host_data = true;
                self.tx = None;
                self.ready = false;
                self.events.push(Event::Host { byte, acked });
            }
            return;
        }
        self.rx_bits.push(self.data());
        self.rx_falls.push(self.now_us);
    }

    fn finish_frame(&mut self) {
        let bits = std::mem::take(&mut self.rx_bits);
        let mut byte = 0u8;
        for (i, bit) in bits[1..9].iter().enumerate() {
            byte |= (*bit as u8) << i;
        }
        let captured = Captured {
            byte,
            start: bits[0],
            parity: bits[9],
            stop: bits[10],
            falls: std::mem::take(&mut self.rx_falls),
            rises: std::mem::take(&mut self.rx_rises),
        };
        self.events.push(Event::Device(captured));
        self.ready = true;
        if Some(self.device_frames()) == self.inhibit_after {
            self.inhibit_after = None;
            self.host_clock = false;
            self.inhibit_until = Some(self.now_us + self.inhibit_us);
        }
        let frames = self.device_frames();
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.send_after)
            .into_iter()
            .partition(|(after, _)| *after == frames);
        self.send_after = later;
        for (_, byte) in due {
            self.queue.push_back((byte, true));
        }
    }

    fn advance(&mut self, us: u64) {
        self.now_us += us;
        if let Some(until) = self.inhibit_until {
            if self.now_us >= until {
                self.inhibit_until = None;
                self.host_clock = true;
            }
        }
    }

    fn drive_col(&mut self, col: usize, high: bool) {
        self.cols[col] = high;
        let driven = self.cols.iter().filter(|c| **c).count();
        self.most_cols_driven = self.most_cols_driven.max(driven);
    }

    /// Only driven columns reach the rows; the pull-downs win otherwise.
    fn row(&self, row: usize) -> bool {
        (0..COLS).any(|col| self.cols[col] && self.pressed[col][row])
    }
}

#[derive(Clone, Copy)]
enum Role {
    Data,
    Clock,
    Col(usize),
    Row(usize),
    CapsLock,
}

/// Any pin of the simulated board.
pub struct SimPin {
    sim: Rc<RefCell<Sim>>,
    role: Role,
}

impl InputPin for SimPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        let mut sim = self.sim.borrow_mut();
        Ok(match self.role {
            Role::Data => {
                sim.maybe_request_to_send();
                sim.data()
            }
            Role::Clock => {
                sim.maybe_request_to_send();
                sim.clock()
            }
            Role::Col(col) => sim.cols[col],
            Role::Row(row) => sim.row(row),
            Role::CapsLock => sim.caps_lock,
        })
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

impl SimPin {
    fn set(&mut self, high: bool) {
        let mut sim = self.sim.borrow_mut();
        match self.role {
            Role::Data => sim.dev_data = high,
            Role::Clock => sim.set_clock(high),
            Role::Col(_) | Role::Row(_) => {}
            Role::CapsLock => sim.caps_lock = high,
        }
    }
}

impl Column for SimPin {
    type Error = Infallible;

    fn strobe(&mut self) -> Result<(), Infallible> {
        if let Role::Col(col) = self.role {
            self.sim.borrow_mut().drive_col(col, true);
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        if let Role::Col(col) = self.role {
            self.sim.borrow_mut().drive_col(col, false);
        }
        Ok(())
    }
}

/// Microsecond delays that advance simulated time.
pub struct SimDelay(Rc<RefCell<Sim>>);

impl DelayUs<u16> for SimDelay {
    fn delay_us(&mut self, us: u16) {
        self.0.borrow_mut().advance(us as u64);
    }
}

pub type SimKeyboard<'t> = Keyboard<'t, SimPin, SimPin, SimDelay, SimPin, SimPin, SimPin>;

/// The host side of the simulation.
#[derive(Clone)]
pub struct Host(Rc<RefCell<Sim>>);

impl Host {
    pub fn new() -> Self {
        let sim = Sim {
            dev_data: true,
            dev_clock: true,
            host_data: true,
            host_clock: true,
            ready: true,
            inhibit_us: 1_000,
            ..Default::default()
        };
        Host(Rc::new(RefCell::new(sim)))
    }

    /// Build a keyboard wired to this host.
    pub fn keyboard<'t>(&self, ticks: &'t TickCounter, config: Config) -> SimKeyboard<'t> {
        let pin = |role| SimPin {
            sim: self.0.clone(),
            role,
        };
        let cols = core::array::from_fn(|col| pin(Role::Col(col)));
        let rows = core::array::from_fn(|row| pin(Role::Row(row)));
        Keyboard::new(
            Port::new(pin(Role::Data), pin(Role::Clock)),
            SimDelay(self.0.clone()),
            Matrix::new(cols, rows),
            pin(Role::CapsLock),
            ticks,
            config,
        )
    }

    /// Queue a byte for the host to send at the next opportunity.
    pub fn send(&self, byte: u8) {
        self.0.borrow_mut().queue.push_back((byte, true));
    }

    /// Queue a byte with the wrong parity bit.
    pub fn send_bad_parity(&self, byte: u8) {
        self.0.borrow_mut().queue.push_back((byte, false));
    }

    pub fn pending(&self) -> usize {
        let sim = self.0.borrow();
        sim.queue.len() + sim.tx.is_some() as usize
    }

    /// Hold CLOCK low for a millisecond once `frames` device frames have been
    /// logged since the last [`Host::take_bytes`].
    pub fn inhibit_after(&self, frames: usize) {
        self.0.borrow_mut().inhibit_after = Some(frames);
    }

    /// Queue `byte` as soon as `frames` device frames have been logged since
    /// the last [`Host::take_bytes`].
    pub fn send_after(&self, frames: usize, byte: u8) {
        self.0.borrow_mut().send_after.push((frames, byte));
    }

    /// Hold CLOCK low until [`Host::release`].
    pub fn inhibit(&self) {
        self.0.borrow_mut().host_clock = false;
    }

    pub fn release(&self) {
        self.0.borrow_mut().host_clock = true;
    }

    pub fn press(&self, col: usize, row: usize) {
        self.0.borrow_mut().pressed[col][row] = true;
    }

    pub fn lift(&self, col: usize, row: usize) {
        self.0.borrow_mut().pressed[col][row] = false;
    }

    /// The most columns ever driven high at the same moment.
    pub fn most_cols_driven(&self) -> usize {
        self.0.borrow().most_cols_driven
    }

    /// Columns driven high right now.
    pub fn driven_cols(&self) -> Vec<usize> {
        let sim = self.0.borrow();
        (0..COLS).filter(|col| sim.cols[*col]).collect()
    }

    pub fn caps_lock_led(&self) -> bool {
        self.0.borrow().caps_lock
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now_us
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub fn frames(&self) -> Vec<Captured> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Device(frame) => Some(frame),
                Event::Host { .. } => None,
            })
            .collect()
    }

    /// Data bytes of every device frame so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.frames().iter().map(|f| f.byte).collect()
    }

    /// Take the bytes received so far, leaving the log empty.
    pub fn take_bytes(&self) -> Vec<u8> {
        let events = std::mem::take(&mut self.0.borrow_mut().events);
        events
            .into_iter()
            .filter_map(|e| match e {
                Event::Device(frame) => Some(frame.byte),
                Event::Host { .. } => None,
            })
            .collect()
    }

    /// Runs of device frames with no host byte in between.
    pub fn device_runs(&self) -> Vec<Vec<Captured>> {
        let mut runs = vec![Vec::new()];
        for event in self.events() {
            match event {
                Event::Device(frame) => runs.last_mut().unwrap().push(frame),
                Event::Host { .. } => runs.push(Vec::new()),
            }
        }
        runs.retain(|run| !run.is_empty());
        runs
    }
}

/// Poll until the host has nothing left to send. Replies go out within the
/// poll that receives the command.
pub fn serve(keyboard: &mut SimKeyboard<'_>, host: &Host) {
    for _ in 0..16 {
        if host.pending() == 0 {
            break;
        }
        keyboard.poll().unwrap();
    }
}

/// A keyboard that has already reported power-on, with its BAT byte taken.
pub fn powered<'t>(host: &Host, ticks: &'t TickCounter, config: Config) -> SimKeyboard<'t> {
    let mut keyboard = host.keyboard(ticks, config);
    keyboard.power_on().unwrap();
    assert_eq!(host.take_bytes(), [0xAA]);
    keyboard
}
