//! Software simulation of the two-wire bus with a DS3231 slave.
//!
//! Both lines are modeled as wired-AND open-drain nets shared between the
//! master under test and an event-driven slave state machine that mirrors
//! the DS3231's register file and transfer protocol. Faults can be
//! injected on the data line to exercise the master's error paths.

// Not every test binary uses every knob.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ds3231_bitbang::{BusLine, Direction};

/// Fault injection on the master's view of the data line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Fault {
    None,
    /// The master reads the data line as stuck high
    SdaReadsHigh,
    /// The master reads the data line as stuck low
    SdaReadsLow,
    /// While the slave is sending, the master's second sample within one
    /// clock-high phase reads inverted, once
    FlipSecondSampleOnce,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    Idle,
    /// Shifting a byte in from the master
    Receive { shift: u8, nbits: u8, is_addr: bool },
    /// Acknowledge clock for a received byte
    Ack { ack: bool, read: bool, driving: bool },
    /// Shifting a byte out to the master
    Send { byte: u8, bit: u8 },
    /// Master's acknowledge clock during a read
    MasterAck { acked: Option<bool> },
}

/// DS3231 slave: register file plus transfer state machine.
pub struct Slave {
    state: State,
    /// Register file, 0x00-0x12
    pub regs: [u8; 19],
    pointer: usize,
    /// The next received data byte sets the register pointer
    expect_pointer: bool,
    /// Refuse the acknowledge of the address byte
    pub nack_address: bool,
    /// Refuse the acknowledge of data bytes
    pub nack_data: bool,
    /// Hold the data line low after the next start condition
    pub jam_after_start: bool,
    jammed: bool,
    /// Master acknowledge bits observed during reads
    pub master_acks: Vec<bool>,
}

impl Slave {
    fn new() -> Self {
        Slave {
            state: State::Idle,
            regs: [0; 19],
            pointer: 0,
            expect_pointer: false,
            nack_address: false,
            nack_data: false,
            jam_after_start: false,
            jammed: false,
            master_acks: Vec::new(),
        }
    }

    fn is_sending(&self) -> bool {
        matches!(self.state, State::Send { .. })
    }

    /// The slave's open-drain contribution to the data line.
    fn sda_out(&self) -> bool {
        if self.jammed {
            return false;
        }
        match self.state {
            State::Ack {
                ack: true,
                driving: true,
                ..
            } => false,
            State::Send { byte, bit } if bit < 8 => byte & (0x80 >> bit) != 0,
            _ => true,
        }
    }

    fn on_start(&mut self) {
        self.state = State::Receive {
            shift: 0,
            nbits: 0,
            is_addr: true,
        };
        if self.jam_after_start {
            self.jammed = true;
        }
    }

    fn on_stop(&mut self) {
        self.state = State::Idle;
    }

    fn on_scl_rise(&mut self, sda: bool) {
        match self.state {
            State::Receive {
                shift,
                nbits,
                is_addr,
            } => {
                let shift = (shift << 1) | u8::from(sda);
                let nbits = nbits + 1;
                if nbits < 8 {
                    self.state = State::Receive {
                        shift,
                        nbits,
                        is_addr,
                    };
                    return;
                }
                let (ack, read) = if is_addr {
                    let addressed = shift & 0xFE == 0xD0;
                    let read = shift & 0x01 != 0;
                    if addressed && !read {
                        self.expect_pointer = true;
                    }
                    (addressed && !self.nack_address, read)
                } else {
                    if self.expect_pointer {
                        self.pointer = usize::from(shift) % self.regs.len();
                        self.expect_pointer = false;
                    } else {
                        self.regs[self.pointer] = shift;
                        self.pointer = (self.pointer + 1) % self.regs.len();
                    }
                    (!self.nack_data, false)
                };
                self.state = State::Ack {
                    ack,
                    read,
                    driving: false,
                };
            }
            State::MasterAck { .. } => {
                // Master drives low to request another byte
                self.state = State::MasterAck { acked: Some(!sda) };
                self.master_acks.push(!sda);
            }
            _ => {}
        }
    }

    fn on_scl_fall(&mut self) {
        match self.state {
            State::Ack {
                ack,
                read,
                driving: false,
            } => {
                self.state = State::Ack {
                    ack,
                    read,
                    driving: true,
                };
            }
            State::Ack {
                ack,
                read,
                driving: true,
            } => {
                if !ack {
                    self.state = State::Idle;
                } else if read {
                    self.state = State::Send {
                        byte: self.fetch(),
                        bit: 0,
                    };
                } else {
                    self.state = State::Receive {
                        shift: 0,
                        nbits: 0,
                        is_addr: false,
                    };
                }
            }
            State::Send { byte, bit } => {
                let bit = bit + 1;
                if bit < 8 {
                    self.state = State::Send { byte, bit };
                } else {
                    self.state = State::MasterAck { acked: None };
                }
            }
            State::MasterAck { acked } => {
                if acked == Some(true) {
                    self.state = State::Send {
                        byte: self.fetch(),
                        bit: 0,
                    };
                } else {
                    self.state = State::Idle;
                }
            }
            _ => {}
        }
    }

    fn fetch(&mut self) -> u8 {
        let byte = self.regs[self.pointer];
        self.pointer = (self.pointer + 1) % self.regs.len();
        byte
    }
}

/// The two shared nets and everything hanging off them.
pub struct Wire {
    scl_master: bool,
    scl_dir: Direction,
    sda_master: bool,
    sda_dir: Direction,
    sda_slave: bool,
    prev_scl: bool,
    prev_sda: bool,
    pub slave: Slave,
    pub fault: Fault,
    /// Rising clock edges since construction (or the last reset)
    pub clock_rises: u32,
    reads_this_high: u32,
}

impl Wire {
    fn new() -> Self {
        Wire {
            scl_master: true,
            scl_dir: Direction::Output,
            sda_master: true,
            sda_dir: Direction::Output,
            sda_slave: true,
            prev_scl: true,
            prev_sda: true,
            slave: Slave::new(),
            fault: Fault::None,
            clock_rises: 0,
            reads_this_high: 0,
        }
    }

    fn scl_level(&self) -> bool {
        match self.scl_dir {
            Direction::Output => self.scl_master,
            Direction::Input => true,
        }
    }

    fn sda_level(&self) -> bool {
        let master = match self.sda_dir {
            Direction::Output => self.sda_master,
            Direction::Input => true,
        };
        master && self.sda_slave
    }

    /// Propagates a master-side line change to the slave.
    fn update(&mut self) {
        let scl = self.scl_level();
        let sda = self.sda_level();

        if scl == self.prev_scl {
            if scl && sda != self.prev_sda {
                if sda {
                    self.slave.on_stop();
                } else {
                    self.slave.on_start();
                }
            }
        } else if scl {
            self.clock_rises += 1;
            self.reads_this_high = 0;
            self.slave.on_scl_rise(sda);
        } else {
            self.slave.on_scl_fall();
        }

        self.sda_slave = self.slave.sda_out();
        self.prev_scl = scl;
        self.prev_sda = self.sda_level();
    }

    fn read_sda(&mut self) -> bool {
        let real = self.sda_level();
        if self.scl_level() {
            self.reads_this_high += 1;
        }
        match self.fault {
            Fault::SdaReadsHigh => true,
            Fault::SdaReadsLow => false,
            Fault::FlipSecondSampleOnce => {
                if self.slave.is_sending() && self.scl_level() && self.reads_this_high == 2 {
                    self.fault = Fault::None;
                    !real
                } else {
                    real
                }
            }
            Fault::None => real,
        }
    }
}

#[derive(Copy, Clone)]
enum Role {
    Sda,
    Scl,
}

/// One master-side handle to a simulated line.
pub struct SimLine {
    wire: Rc<RefCell<Wire>>,
    role: Role,
}

impl BusLine for SimLine {
    fn set_level(&mut self, high: bool) {
        let mut wire = self.wire.borrow_mut();
        match self.role {
            Role::Sda => wire.sda_master = high,
            Role::Scl => wire.scl_master = high,
        }
        wire.update();
    }

    fn level(&self) -> bool {
        let mut wire = self.wire.borrow_mut();
        match self.role {
            Role::Sda => wire.read_sda(),
            Role::Scl => wire.scl_level(),
        }
    }

    fn set_direction(&mut self, direction: Direction) {
        let mut wire = self.wire.borrow_mut();
        match self.role {
            Role::Sda => wire.sda_dir = direction,
            Role::Scl => wire.scl_dir = direction,
        }
        wire.update();
    }
}

/// Builds a simulated bus: data line, clock line, and the shared wire.
pub fn sim() -> (SimLine, SimLine, Rc<RefCell<Wire>>) {
    let wire = Rc::new(RefCell::new(Wire::new()));
    let sda = SimLine {
        wire: Rc::clone(&wire),
        role: Role::Sda,
    };
    let scl = SimLine {
        wire: Rc::clone(&wire),
        role: Role::Scl,
    };
    (sda, scl, wire)
}
