//! Watchdog that locks the interactive session whenever a new keyboard
//! HID interface shows up on the host.
//!
//! The core ([`reactor`], [`subscription`], [`event`]) is platform
//! neutral and talks to the OS through the [`Platform`] trait. The
//! Windows backend in `win32` supplies the message sink, the raw
//! bindings and the blocking message pump.

#[cfg_attr(not(windows), allow(dead_code))]
mod broadcast;
pub mod classid;
pub mod config;
pub mod error;
pub mod event;
pub mod reactor;
pub mod subscription;

#[cfg(windows)]
pub mod win32;

pub use classid::{ClassId, KEYBOARD_HID_CLASS};
pub use config::Config;
pub use error::{Error, OsError};
pub use event::{DeviceChangeKind, DeviceInterface, NotificationEvent};
pub use reactor::{Directive, Reactor, ReactorState};
pub use subscription::{subscribe, unsubscribe, NotifyHandle, Platform, SinkHandle, Subscription};
