//! Definition of counters, used for message IDs.

/// Errors that can occur when counting.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The counter wrapped around to zero.
    Overrun,
}

/// A counter that wraps around after reaching its maximum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counter {
    value: u8,
    max_value: u8,
}

/// Types of counters.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterType {
    /// The 3 bit message ID that every message header carries.
    MessageId,
}

impl Counter {
    /// Create a new counter, starting at zero.
    pub fn new(counter_type: CounterType) -> Self {
        let max_value = match counter_type {
            CounterType::MessageId => 7,
        };

        Self { value: 0, max_value }
    }

    /// Create a new counter, starting at `value`.
    pub fn new_from_value(counter_type: CounterType, value: u8) -> Self {
        let mut counter = Self::new(counter_type);
        counter.set(value);
        counter
    }

    /// Set the counter value. Values beyond the maximum wrap around.
    pub fn set(&mut self, value: u8) {
        self.value = value % (self.max_value + 1);
    }

    /// The current counter value.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Increment the counter, reporting an overrun when it wraps around.
    pub fn increment(&mut self) -> Result<(), Error> {
        self.set(self.value + 1);

        if self.value == 0 {
            Err(Error::Overrun)
        } else {
            Ok(())
        }
    }

    /// Reset the counter to zero.
    pub fn reset(&mut self) {
        self.value = 0;
    }
}
