//! The event core of a simulated port.
//!
//! A [`PartnerPort`] accepts the port manager's calls from any context. Entry points only update
//! shared state under a lock and wake the worker, which is driven by [`PartnerPort::run`]. The
//! worker is the only context that runs the partner's state machine, and the only context that
//! calls back into the port manager.
use core::cell::RefCell;
use core::future::pending;
use core::marker::PhantomData;
use core::pin::pin;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;
use usbpd_partner_traits::{CcStatus, Polarity, PortManager, TransmitType};

use crate::config::Config;
use crate::partner::{Mode, ModeParseError, ModeRequest, Notification, Notifications, PartnerState, Transmission};
use crate::protocol_layer::MAX_MESSAGE_SIZE;
use crate::timers::{Timer, TimerType};
use crate::{DataRole, PowerRole};


struct Shared {
    partner: PartnerState,
    shutdown: bool,
}

/// A simulated port partner, attached to one port of the port manager.
pub struct PartnerPort<M: RawMutex, TIMER: Timer> {
    config: Config,
    shared: Mutex<M, RefCell<Shared>>,
    wakeup: Signal<M, ()>,
    _timer: PhantomData<TIMER>,
}

/// Pins down the type of an unarmed timer future.
fn unarmed<F>(_: fn(TimerType) -> F) -> Option<F> {
    None
}

impl<M: RawMutex, TIMER: Timer> PartnerPort<M, TIMER> {
    /// Create a detached port partner.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shared: Mutex::new(RefCell::new(Shared {
                partner: PartnerState::new(),
                shutdown: false,
            })),
            wakeup: Signal::new(),
            _timer: PhantomData,
        }
    }

    fn with_partner<R>(&self, f: impl FnOnce(&mut PartnerState) -> R) -> R {
        self.shared.lock(|shared| f(&mut shared.borrow_mut().partner))
    }

    fn wake(&self) {
        self.wakeup.signal(());
    }

    /// The port description that the port manager registers.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A snapshot of the partner's state.
    pub fn snapshot(&self) -> PartnerState {
        self.with_partner(|partner| partner.clone())
    }

    /// The active persona.
    pub fn mode(&self) -> Mode {
        self.with_partner(|partner| partner.mode())
    }

    /// Request a mode change.
    pub fn request_mode(&self, request: ModeRequest) {
        info!("Mode request {:?}", request);
        self.with_partner(|partner| partner.request_mode(request));
        self.wake();
    }

    /// Request a mode change by its control surface name (`none`, `reset`, `snk` or `src`).
    pub fn set_mode(&self, mode: &str) -> Result<(), ModeParseError> {
        self.request_mode(mode.parse()?);
        Ok(())
    }

    /// Initialize the port controller.
    pub fn init(&self) {
        debug!("init");
    }

    /// The status of both CC lines.
    pub fn get_cc(&self) -> (CcStatus, CcStatus) {
        let (cc1, cc2) = self.with_partner(|partner| (partner.electrical().cc1, partner.electrical().cc2));
        debug!("get_cc: {:?} {:?}", cc1, cc2);
        (cc1, cc2)
    }

    /// Apply a termination to the CC lines. Has no effect on the simulated link.
    pub fn set_cc(&self, cc: CcStatus) {
        debug!("set_cc: {:?}", cc);
    }

    /// Start toggling between source and sink terminations. Has no effect on the simulated link.
    pub fn start_drp_toggling(&self, cc: CcStatus) {
        debug!("start_drp_toggling: {:?}", cc);
    }

    /// Select the CC line that carries PD communication.
    pub fn set_polarity(&self, polarity: Polarity) {
        debug!("set_polarity: {:?}", polarity);
        self.with_partner(|partner| partner.set_polarity(polarity));
    }

    /// Source VCONN, or stop sourcing it.
    pub fn set_vconn(&self, enable: bool) {
        debug!("set_vconn: {}", enable);
        self.with_partner(|partner| partner.set_vconn(enable));
    }

    /// Set the roles that the port manager's port takes.
    pub fn set_roles(&self, attached: bool, power_role: PowerRole, data_role: DataRole) {
        debug!("set_roles: attached {}, {:?}, {:?}", attached, power_role, data_role);
        self.with_partner(|partner| partner.set_roles(power_role, data_role));
    }

    /// Enable or disable PD message reception.
    pub fn set_pd_rx(&self, enable: bool) {
        debug!("set_pd_rx: {}", enable);
        if self.with_partner(|partner| partner.set_pd_rx(enable)) {
            self.wake();
        }
    }

    /// Whether VBUS is present.
    pub fn get_vbus(&self) -> bool {
        let present = self.with_partner(|partner| partner.electrical().vbus_present);
        debug!("get_vbus: {}", present);
        present
    }

    /// Drive VBUS as a source, or sink from it.
    pub fn set_vbus(&self, source: bool, sink: bool) {
        debug!("set_vbus: source {}, sink {}", source, sink);
        if self.with_partner(|partner| partner.set_vbus(source || sink)) {
            self.wake();
        }
    }

    /// Transmit a message or signaling to the partner.
    ///
    /// Completion is reported through [`PortManager::transmit_complete`]. A message that does not
    /// fit into a PD message is discarded.
    pub fn pd_transmit(&self, transmit_type: TransmitType, data: Option<&[u8]>) {
        debug!("pd_transmit: {:?}", transmit_type);

        let data = data.unwrap_or_default();
        let data = Vec::from_slice(data).unwrap_or_else(|_| {
            warn!("Message of {} bytes exceeds the maximum size", data.len());
            Vec::new()
        });

        self.with_partner(|partner| partner.queue_transmission(Transmission { transmit_type, data }));
        self.wake();
    }

    /// Stop the worker. [`Self::run`] returns without issuing further callbacks.
    pub fn shutdown(&self) {
        debug!("shutdown");
        self.shared.lock(|shared| shared.borrow_mut().shutdown = true);
        self.wake();
    }

    fn is_shut_down(&self) -> bool {
        self.shared.lock(|shared| shared.borrow().shutdown)
    }

    /// Run the worker, until [`Self::shutdown`] is called.
    pub async fn run<PM: PortManager>(&self, manager: &mut PM) {
        let mut timer = pin!(unarmed(TimerType::new::<TIMER>));
        let mut timer_epoch = 0;
        let mut expired = false;
        let mut notifications = Notifications::new();

        loop {
            let processed = self.shared.lock(|shared| {
                let mut shared = shared.borrow_mut();
                if shared.shutdown {
                    return None;
                }

                if expired {
                    shared.partner.expire(timer_epoch, &mut notifications);
                }

                let delay = shared.partner.process(&mut notifications);
                Some((delay, shared.partner.epoch()))
            });

            let Some((delay, epoch)) = processed else {
                info!("Worker shut down");
                return;
            };

            if let Some(timer_type) = delay {
                trace!("Arming {:?}", timer_type);
                timer_epoch = epoch;
                timer.set(Some(TimerType::new::<TIMER>(timer_type)));
            } else if expired {
                timer.set(None);
            }

            for notification in &notifications {
                if self.is_shut_down() {
                    break;
                }

                Self::notify(manager, notification).await;
            }
            notifications.clear();

            let armed = async {
                match timer.as_mut().as_pin_mut() {
                    Some(timer) => timer.await,
                    None => pending().await,
                }
            };

            expired = matches!(select(self.wakeup.wait(), armed).await, Either::Second(()));
        }
    }

    async fn notify<PM: PortManager>(manager: &mut PM, notification: &Notification) {
        match notification {
            Notification::CcChanged => manager.cc_changed().await,
            Notification::VbusChanged => manager.vbus_changed().await,
            Notification::Receive(message) => {
                let mut buffer = [0u8; MAX_MESSAGE_SIZE];
                let length = message.to_bytes(&mut buffer);
                manager.pd_receive(&buffer[..length]).await;
            }
            Notification::TransmitComplete(status) => manager.transmit_complete(*status).await,
            Notification::HardResetReceived => manager.hard_reset_received().await,
            Notification::Reset => manager.reset().await,
        }
    }
}
