//! The event reactor: a state machine fed one notification at a time by
//! the hosting message sink.
//!
//! ```text
//! Idle --SinkCreated--> Armed --subscribed--> Watching
//! Watching --DeviceChange(Arrival, class)--> Watching   (lock once)
//! * --SinkClosing--> Closing --SinkDestroyed--> Terminated
//! ```
//!
//! The reactor never calls back into the sink itself. Anything that would
//! re-enter the sink (tearing it down, stopping its loop, killing the
//! process) is returned as a [`Directive`] for the host to carry out after
//! [`Reactor::handle`] has returned.

use tracing::{event, Level};

use crate::error::Error;
use crate::event::{DeviceChangeKind, DeviceInterface, NotificationEvent};
use crate::subscription::{subscribe, unsubscribe, Platform, SinkHandle, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorState {
    Idle,
    Armed,
    Watching,
    Closing,
    Terminated,
}

/// What the host must do once an event has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Nothing further; the event was consumed.
    Handled,
    /// Hand the event to the default handler.
    PassThrough,
    /// Tear the sink down.
    DestroySink,
    /// Stop the receive loop.
    StopLoop,
    /// Terminate the process with this status. Registration failure while
    /// reacting to sink creation is unrecoverable and is not retried.
    ExitProcess(u32),
}

pub struct Reactor<P: Platform> {
    platform: P,
    interface_class: String,
    state: ReactorState,
    subscription: Option<Subscription>,
}

impl<P: Platform> Reactor<P> {
    pub fn new(platform: P, interface_class: impl Into<String>) -> Self {
        Self {
            platform,
            interface_class: interface_class.into(),
            state: ReactorState::Idle,
            subscription: None,
        }
    }

    pub fn state(&self) -> ReactorState {
        self.state
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Handle a single event. Any lock request it triggers has completed
    /// by the time this returns.
    pub fn handle(&mut self, sink: SinkHandle, notification: NotificationEvent) -> Directive {
        event!(Level::DEBUG, "{:?} in {:?}", notification, self.state);

        match notification {
            NotificationEvent::SinkCreated => self.on_sink_created(sink),
            NotificationEvent::DeviceChange { kind, interface } => {
                self.on_device_change(kind, interface.as_ref());
                Directive::Handled
            }
            NotificationEvent::SinkClosing => self.on_sink_closing(),
            NotificationEvent::SinkDestroyed => {
                self.release();
                self.state = ReactorState::Terminated;
                Directive::StopLoop
            }
            NotificationEvent::Other(_) => Directive::PassThrough,
        }
    }

    fn on_sink_created(&mut self, sink: SinkHandle) -> Directive {
        if self.state != ReactorState::Idle {
            event!(Level::WARN, "Sink {:?} created again in {:?}", sink, self.state);
            return Directive::Handled;
        }
        self.state = ReactorState::Armed;

        match subscribe(&mut self.platform, sink, &self.interface_class) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.state = ReactorState::Watching;
                Directive::Handled
            }
            Err(err) => {
                event!(Level::ERROR, "Cannot watch for devices, exiting: {err}");
                self.state = ReactorState::Terminated;
                Directive::ExitProcess(err.exit_code())
            }
        }
    }

    fn on_device_change(&mut self, kind: DeviceChangeKind, interface: Option<&DeviceInterface>) {
        if self.state != ReactorState::Watching || kind != DeviceChangeKind::Arrival {
            return;
        }
        let (Some(subscription), Some(interface)) = (&self.subscription, interface) else {
            return;
        };
        if interface.class != *subscription.class() {
            event!(Level::DEBUG, "Ignoring arrival of {} ({})", interface.path, interface.class);
            return;
        }

        event!(Level::INFO, "Identified keyboard {}. Locking.", interface.path);
        if let Err(code) = self.platform.lock_session() {
            let err = Error::LockActionFailed { code };
            event!(Level::WARN, "{err}");
        }
    }

    fn on_sink_closing(&mut self) -> Directive {
        if matches!(self.state, ReactorState::Closing | ReactorState::Terminated) {
            return Directive::Handled;
        }
        self.release();
        self.state = ReactorState::Closing;
        Directive::DestroySink
    }

    /// Release the subscription, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            unsubscribe(&mut self.platform, &mut subscription);
        }
    }
}

impl<P: Platform> Drop for Reactor<P> {
    fn drop(&mut self) {
        self.release();
    }
}
