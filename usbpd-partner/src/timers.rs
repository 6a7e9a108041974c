//! Timers that model the response latency of the simulated port partner.

use core::future::Future;

/// The timer trait to implement by the user application.
pub trait Timer {
    /// Expire after the specified number of milliseconds.
    fn after_millis(milliseconds: u64) -> impl Future<Output = ()>;
}

/// Types of timers that are used for simulated delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerType {
    /// Time that the sink persona takes before its message arrives at the port manager.
    SinkResponse,
    /// Time that the source persona takes before its message arrives at the port manager.
    SourceResponse,
    /// Time that the source persona takes for ramping up VBUS after attaching.
    VbusRampUp,
}

impl TimerType {
    /// The duration of a timer in milliseconds.
    pub const fn millis(&self) -> u64 {
        match self {
            TimerType::SinkResponse => 2,
            TimerType::SourceResponse => 2,
            TimerType::VbusRampUp => 5,
        }
    }

    /// Create a new timer for a given type.
    pub fn new<TIMER: Timer>(timer_type: TimerType) -> impl Future<Output = ()> {
        TIMER::after_millis(timer_type.millis())
    }
}
