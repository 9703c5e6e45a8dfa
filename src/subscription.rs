//! Registration of interest in one device-interface class.

use tracing::{event, Level};

use crate::classid::ClassId;
use crate::error::{Error, OsError};

/// The message sink a subscription is bound to (a window handle on
/// Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkHandle(pub isize);

/// Opaque handle returned by the OS for a live registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotifyHandle(pub usize);

/// OS capabilities the watchdog needs.
pub trait Platform {
    /// Ask for device-interface notifications of `class` to be delivered
    /// to `sink`.
    fn register(&mut self, sink: SinkHandle, class: &ClassId) -> Result<NotifyHandle, OsError>;

    /// Drop a registration made by [`Platform::register`].
    fn unregister(&mut self, handle: NotifyHandle) -> Result<(), OsError>;

    /// Request that the interactive session be locked.
    fn lock_session(&mut self) -> Result<(), OsError>;
}

#[derive(Debug)]
pub struct Subscription {
    class: ClassId,
    sink: SinkHandle,
    handle: Option<NotifyHandle>,
}

impl Subscription {
    pub fn class(&self) -> &ClassId {
        &self.class
    }

    /// False once the subscription has been released.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

/// Register `sink` for device-interface changes of `interface_class`.
pub fn subscribe<P: Platform>(
    platform: &mut P,
    sink: SinkHandle,
    interface_class: &str,
) -> Result<Subscription, Error> {
    let class = ClassId::parse(interface_class)?;

    let handle = platform.register(sink, &class).map_err(|code| {
        event!(Level::ERROR, "RegisterDeviceNotification {class} {code}");
        Error::RegistrationFailed { code }
    })?;
    event!(Level::INFO, "Subscribed to {class} on sink {:?}", sink);

    Ok(Subscription {
        class,
        sink,
        handle: Some(handle),
    })
}

/// Release a subscription. Best-effort: failures are swallowed and a
/// subscription that was already released is left alone.
pub fn unsubscribe<P: Platform>(platform: &mut P, subscription: &mut Subscription) {
    let Some(handle) = subscription.handle.take() else {
        return;
    };
    match platform.unregister(handle) {
        Ok(()) => event!(
            Level::INFO,
            "Unsubscribed sink {:?} from {}",
            subscription.sink,
            subscription.class
        ),
        Err(code) => event!(Level::DEBUG, "UnregisterDeviceNotification ignored {code}"),
    }
}
