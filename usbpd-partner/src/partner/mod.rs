//! The simulated port partner.
//!
//! A [`PartnerState`] holds everything that the partner knows about the simulated link: the
//! active persona and its negotiation state, the electrical state of the CC lines and VBUS, the
//! pending work items, and the single message slot towards the port manager.
//!
//! All methods are synchronous. They are driven by the event core in [`crate::port`], which owns
//! the state behind a mutex and turns the collected [`Notification`]s into port manager callbacks.
mod sink;
mod source;
pub mod vdm;

#[cfg(test)]
mod tests;

use core::fmt;
use core::str::FromStr;

use heapless::Vec;
use proc_bitfield::bitfield;
use usbpd_partner_traits::{CcStatus, Polarity, TransmitStatus, TransmitType};

use crate::counters::{Counter, CounterType};
use crate::protocol_layer::MAX_MESSAGE_SIZE;
use crate::protocol_layer::log::{Direction, log_message};
use crate::protocol_layer::message::Message;
use crate::protocol_layer::message::data::Data;
use crate::protocol_layer::message::data::source_capabilities::PdoKinds;
use crate::protocol_layer::message::header::{ControlMessageType, DataMessageType, Header, SUPPORTED_REVISION};
use crate::timers::TimerType;
use crate::{DataRole, PowerRole};

/// The largest number of notifications that one processing pass can produce.
pub const MAX_NOTIFICATIONS: usize = 8;

/// The persona that the partner currently plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Detached.
    #[default]
    None,
    /// Attached as a sink.
    Sink,
    /// Attached as a source.
    Source,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::None => "none",
            Mode::Sink => "snk",
            Mode::Source => "src",
        })
    }
}

/// A mode change, as requested through the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeRequest {
    /// Detach.
    #[default]
    None,
    /// Detach, and have the port manager reset its port controller.
    Reset,
    /// Attach as a sink.
    Sink,
    /// Attach as a source.
    Source,
}

/// The control surface input is not a known mode.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("unknown mode (expected one of `none`, `reset`, `snk`, `src`)")]
pub struct ModeParseError;

impl FromStr for ModeRequest {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Self::None),
            "reset" => Ok(Self::Reset),
            "snk" => Ok(Self::Sink),
            "src" => Ok(Self::Source),
            _ => Err(ModeParseError),
        }
    }
}

impl fmt::Display for ModeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModeRequest::None => "none",
            ModeRequest::Reset => "reset",
            ModeRequest::Sink => "snk",
            ModeRequest::Source => "src",
        })
    }
}

/// Negotiation states of the sink persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkState {
    /// Assert the sink's CC terminations.
    Attach,
    /// Attached, waiting for source capabilities and an explicit contract.
    AdvertiseSinkReady,
    /// The contract is established.
    Run,
}

/// Negotiation states of the source persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceState {
    /// Assert the source's CC terminations.
    Attach,
    /// Waiting for VBUS to ramp up.
    VbusRampUp,
    /// Waiting for the port manager to enable PD reception, then advertise capabilities.
    AdvertiseSourceCapabilities,
    /// Waiting for a request.
    AwaitRequest,
    /// Accept the request.
    SendAccept,
    /// Signal that the power supply is ready, once the accept message was delivered.
    SendPowerReady,
    /// The contract is established.
    Run,
}

/// The state of the partner's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No persona is attached.
    #[default]
    Idle,
    /// The sink persona is attached.
    Sink(SinkState),
    /// The source persona is attached.
    Source(SourceState),
    /// Detach the active persona.
    ReturnToIdle,
}

bitfield! {
    /// Work items that are pending for the event core.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Requests(pub u8): Debug, FromStorage, IntoStorage {
        /// A mode change was requested.
        pub mode_set: bool @ 0,
        /// A message waits for delivery to the port manager.
        pub msg_rx: bool @ 1,
        /// The port manager transmitted something.
        pub msg_tx: bool @ 2,
        /// The presence of VBUS changed.
        pub vbus_change: bool @ 3,
    }
}

/// Electrical state of the simulated link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Electrical {
    /// Status of CC1, as presented to the port manager.
    pub cc1: CcStatus,
    /// Status of CC2, as presented to the port manager.
    pub cc2: CcStatus,
    /// Whether VBUS is present.
    pub vbus_present: bool,
    /// The orientation that the port manager selected.
    pub polarity: Polarity,
    /// Whether the port manager sources VCONN.
    pub vconn_enabled: bool,
    /// Whether the port manager receives PD messages.
    pub pd_rx_enabled: bool,
}

impl Default for Electrical {
    fn default() -> Self {
        Self {
            cc1: CcStatus::Open,
            cc2: CcStatus::Open,
            vbus_present: false,
            polarity: Polarity::default(),
            vconn_enabled: false,
            pd_rx_enabled: false,
        }
    }
}

/// A transmission of the port manager, kept until the event core processes it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transmission {
    /// What is transmitted.
    pub transmit_type: TransmitType,
    /// The message in its wire format, empty for plain signaling.
    pub data: Vec<u8, MAX_MESSAGE_SIZE>,
}

/// Events that the port manager must be told about.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// The CC lines changed.
    CcChanged,
    /// VBUS presence changed.
    VbusChanged,
    /// A message arrives at the port manager.
    Receive(Message),
    /// The port manager's transmission completed.
    TransmitComplete(TransmitStatus),
    /// The partner signals a hard reset.
    HardResetReceived,
    /// The port manager shall reset its port controller.
    Reset,
}

/// Notifications, collected during one processing pass.
pub type Notifications = Vec<Notification, MAX_NOTIFICATIONS>;

fn notify(notifications: &mut Notifications, notification: Notification) {
    if let Err(notification) = notifications.push(notification) {
        error!("Dropping notification {:?}", notification);
    }
}

/// The complete state of the simulated partner.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerState {
    mode: Mode,
    mode_request: ModeRequest,
    state: State,
    electrical: Electrical,
    power_role: PowerRole,
    data_role: DataRole,
    message_id: Counter,
    pdo_kinds: PdoKinds,
    requests: Requests,
    rx_message: Option<Message>,
    delivery_scheduled: bool,
    transmission: Option<Transmission>,
    delay: Option<TimerType>,
    epoch: u32,
}

impl Default for PartnerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PartnerState {
    /// Create a detached partner.
    pub fn new() -> Self {
        Self {
            mode: Mode::None,
            mode_request: ModeRequest::None,
            state: State::Idle,
            electrical: Electrical::default(),
            power_role: PowerRole::Sink,
            data_role: DataRole::Ufp,
            message_id: Counter::new(CounterType::MessageId),
            pdo_kinds: PdoKinds::default(),
            requests: Requests::default(),
            rx_message: None,
            delivery_scheduled: false,
            transmission: None,
            delay: None,
            epoch: 0,
        }
    }

    /// The active persona.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The state machine's state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The electrical state of the link.
    pub fn electrical(&self) -> &Electrical {
        &self.electrical
    }

    /// Pending work items.
    pub fn requests(&self) -> Requests {
        self.requests
    }

    /// The roles that the port manager reported for its own port.
    pub fn roles(&self) -> (PowerRole, DataRole) {
        (self.power_role, self.data_role)
    }

    /// The session epoch. Every hard reset starts a new one.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// The kinds of PDOs in the most recent source capabilities.
    pub fn pdo_kinds(&self) -> &PdoKinds {
        &self.pdo_kinds
    }

    /// Request a mode change, which is applied during the next processing pass.
    pub fn request_mode(&mut self, request: ModeRequest) {
        self.mode_request = request;
        self.requests.set_mode_set(true);
    }

    /// Set VBUS presence, as driven by the port manager. Returns whether it changed.
    pub fn set_vbus(&mut self, present: bool) -> bool {
        if present == self.electrical.vbus_present {
            return false;
        }

        self.electrical.vbus_present = present;
        self.requests.set_vbus_change(true);
        true
    }

    /// Enable or disable PD reception. Returns whether it changed.
    pub fn set_pd_rx(&mut self, enable: bool) -> bool {
        let changed = enable != self.electrical.pd_rx_enabled;
        self.electrical.pd_rx_enabled = enable;
        changed
    }

    /// Record the cable orientation.
    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.electrical.polarity = polarity;
    }

    /// Record whether VCONN is sourced.
    pub fn set_vconn(&mut self, enable: bool) {
        self.electrical.vconn_enabled = enable;
    }

    /// Record the port manager's roles.
    pub fn set_roles(&mut self, power_role: PowerRole, data_role: DataRole) {
        self.power_role = power_role;
        self.data_role = data_role;
    }

    /// Keep a transmission of the port manager for processing.
    ///
    /// A transmission that was not processed yet is replaced.
    pub fn queue_transmission(&mut self, transmission: Transmission) {
        if self.transmission.is_some() {
            warn!("Replacing unprocessed transmission");
        }

        self.transmission = Some(transmission);
        self.requests.set_msg_tx(true);
    }

    /// Process all pending work items, and step the state machine until it settles.
    ///
    /// Returns the delay that the event core shall arm, if any.
    pub fn process(&mut self, notifications: &mut Notifications) -> Option<TimerType> {
        loop {
            if self.requests.mode_set() {
                self.requests.set_mode_set(false);
                self.apply_mode_request();
            }

            if self.requests.vbus_change() {
                self.requests.set_vbus_change(false);
                notify(notifications, Notification::VbusChanged);
            }

            if self.requests.msg_tx() {
                self.requests.set_msg_tx(false);
                let status = self.process_transmission(notifications);
                notify(notifications, Notification::TransmitComplete(status));
            }

            let changed = self.step(false, notifications);
            if !changed && !self.requests.mode_set() && !self.requests.vbus_change() {
                break;
            }
        }

        if self.requests.msg_rx() && !self.delivery_scheduled {
            self.delivery_scheduled = true;
            self.delay = Some(self.response_timer());
        }

        self.delay.take()
    }

    /// Handle expiry of the delay that was armed during session `epoch`.
    ///
    /// Delivers the pending message, if any, and lets the state machine see the timeout.
    pub fn expire(&mut self, epoch: u32, notifications: &mut Notifications) {
        if epoch != self.epoch {
            warn!("Ignoring timer of session {}, now in session {}", epoch, self.epoch);
            return;
        }

        if self.requests.msg_rx() {
            self.requests.set_msg_rx(false);
            self.delivery_scheduled = false;

            if let Some(message) = self.rx_message.take() {
                self.observe(Direction::Receive, TransmitType::Sop, &message);
                notify(notifications, Notification::Receive(message));
            }
        }

        self.step(true, notifications);
    }

    fn apply_mode_request(&mut self) {
        debug!("Mode request {:?} in mode {:?}", self.mode_request, self.mode);

        match (self.mode_request, self.mode) {
            (ModeRequest::None | ModeRequest::Reset, Mode::None) => (),
            (ModeRequest::None | ModeRequest::Reset, _) => self.state = State::ReturnToIdle,
            (ModeRequest::Sink, Mode::None) => {
                self.mode = Mode::Sink;
                self.state = State::Sink(SinkState::Attach);
            }
            (ModeRequest::Source, Mode::None) => {
                self.mode = Mode::Source;
                self.state = State::Source(SourceState::Attach);
            }
            (request, mode) => warn!("Ignoring mode request {:?}, detach from mode {:?} first", request, mode),
        }
    }

    /// Run one step of the state machine. Returns whether the state changed.
    fn step(&mut self, timeout: bool, notifications: &mut Notifications) -> bool {
        let previous = self.state;

        match self.state {
            State::Idle => (),
            State::Sink(state) => self.sink_step(state, notifications),
            State::Source(state) => self.source_step(state, timeout, notifications),
            State::ReturnToIdle => self.return_to_idle(notifications),
        }

        if self.state != previous {
            trace!("State {:?} -> {:?}", previous, self.state);
        }

        self.state != previous
    }

    fn return_to_idle(&mut self, notifications: &mut Notifications) {
        let vbus_was_present = self.electrical.vbus_present;

        self.electrical.cc1 = CcStatus::Open;
        self.electrical.cc2 = CcStatus::Open;
        self.electrical.vbus_present = false;
        self.hard_reset(false, notifications);

        if vbus_was_present {
            self.requests.set_vbus_change(true);
        }

        notify(
            notifications,
            match self.mode_request {
                ModeRequest::Reset => Notification::Reset,
                _ => Notification::CcChanged,
            },
        );

        self.mode = Mode::None;
        self.state = State::Idle;
    }

    fn process_transmission(&mut self, notifications: &mut Notifications) -> TransmitStatus {
        let Some(transmission) = self.transmission.take() else {
            error!("Transmission flagged, but none is present");
            return TransmitStatus::Discarded;
        };

        if self.mode == Mode::None {
            debug!("No persona attached, {:?} fails", transmission.transmit_type);
            return TransmitStatus::Failed;
        }

        if !transmission.transmit_type.carries_message() {
            if transmission.transmit_type == TransmitType::HardReset {
                info!("Hard reset from the port manager");
                self.hard_reset(false, notifications);
                self.restart_persona();
            } else {
                debug!("Ignoring {:?} signaling", transmission.transmit_type);
            }

            return TransmitStatus::Success;
        }

        let message = match Message::from_bytes_with_state(&transmission.data, &self.pdo_kinds) {
            Ok(message) => message,
            Err(e) => {
                warn!("Discarding {:?} transmission: {:?}", transmission.transmit_type, e);
                return TransmitStatus::Discarded;
            }
        };

        self.observe(Direction::Transmit, transmission.transmit_type, &message);

        if transmission.transmit_type != TransmitType::Sop {
            debug!("Ignoring message to {:?}", transmission.transmit_type);
            return TransmitStatus::Success;
        }

        match self.mode {
            Mode::Sink => self.sink_receive(&message, notifications),
            Mode::Source => self.source_receive(&message, notifications),
            Mode::None => (),
        }

        TransmitStatus::Success
    }

    /// Log a message that crosses the wire, and keep track of offered PDOs.
    fn observe(&mut self, direction: Direction, transmit_type: TransmitType, message: &Message) {
        log_message(direction, transmit_type, message);

        if transmit_type != TransmitType::Sop {
            return;
        }

        if let Some(Data::SourceCapabilities(capabilities)) = &message.payload {
            self.pdo_kinds.record(capabilities);
        }
    }

    /// Reset the session: pending work, message IDs and offered PDOs are forgotten.
    ///
    /// With `from_peer`, the partner signals the hard reset to the port manager.
    fn hard_reset(&mut self, from_peer: bool, notifications: &mut Notifications) {
        self.requests = Requests::default();
        self.message_id.reset();
        self.pdo_kinds.clear();
        self.rx_message = None;
        self.transmission = None;
        self.delivery_scheduled = false;
        self.delay = None;
        self.epoch = self.epoch.wrapping_add(1);

        if from_peer {
            notify(notifications, Notification::HardResetReceived);
        }
    }

    /// Restart the active persona's negotiation after a hard reset.
    fn restart_persona(&mut self) {
        match self.mode {
            Mode::None => (),
            Mode::Sink => self.state = State::Sink(SinkState::AdvertiseSinkReady),
            Mode::Source => {
                if self.electrical.vbus_present {
                    self.electrical.vbus_present = false;
                    self.requests.set_vbus_change(true);
                }

                self.state = State::Source(SourceState::VbusRampUp);
                self.delay = Some(TimerType::VbusRampUp);
            }
        }
    }

    /// An inbound message does not fit the session state.
    fn protocol_violation(&mut self, message: &Message, notifications: &mut Notifications) {
        warn!("Protocol violation in state {:?}: {:?}", self.state, message.header);
        self.hard_reset(true, notifications);
        self.restart_persona();
    }

    fn response_timer(&self) -> TimerType {
        match self.mode {
            Mode::Source => TimerType::SourceResponse,
            Mode::None | Mode::Sink => TimerType::SinkResponse,
        }
    }

    fn persona_header(&self) -> Header {
        match self.mode {
            Mode::Source => Header::new_template(DataRole::Dfp, PowerRole::Source, SUPPORTED_REVISION),
            Mode::None | Mode::Sink => Header::new_template(DataRole::Ufp, PowerRole::Sink, SUPPORTED_REVISION),
        }
    }

    fn queue_control(&mut self, message_type: ControlMessageType) {
        let header = Header::new_control(self.persona_header(), self.message_id, message_type);
        self.queue(Message::new(header));
    }

    fn queue_data(&mut self, message_type: DataMessageType, data: Data) {
        let header = Header::new_data(self.persona_header(), self.message_id, message_type, data.num_objects());
        self.queue(Message::new_with_data(header, data));
    }

    /// Put a message into the slot towards the port manager.
    fn queue(&mut self, message: Message) {
        if let Some(previous) = &self.rx_message {
            warn!("Replacing undelivered {:?}", previous.header.message_type());
        }

        // The 3 bit message ID wraps around, so an overrun is expected.
        _ = self.message_id.increment();
        self.rx_message = Some(message);
        self.requests.set_msg_rx(true);
    }
}
