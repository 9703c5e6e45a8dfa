//! Notifications delivered to the message sink, already classified.

use crate::classid::ClassId;

pub const WM_CREATE: u32 = 0x0001;
pub const WM_DESTROY: u32 = 0x0002;
pub const WM_CLOSE: u32 = 0x0010;
pub const WM_DEVICECHANGE: u32 = 0x0219;

const DBT_DEVNODES_CHANGED: usize = 0x0007;
const DBT_DEVICEARRIVAL: usize = 0x8000;
const DBT_DEVICEQUERYREMOVE: usize = 0x8001;
const DBT_DEVICEQUERYREMOVEFAILED: usize = 0x8002;
const DBT_DEVICEREMOVEPENDING: usize = 0x8003;
const DBT_DEVICEREMOVECOMPLETE: usize = 0x8004;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChangeKind {
    Arrival,
    QueryRemove,
    QueryRemoveFailed,
    RemovePending,
    RemoveComplete,
    DevNodesChanged,
    Other(usize),
}

impl DeviceChangeKind {
    /// Whether the message parameter points at a broadcast header.
    pub fn carries_broadcast(&self) -> bool {
        matches!(
            self,
            Self::Arrival
                | Self::QueryRemove
                | Self::QueryRemoveFailed
                | Self::RemovePending
                | Self::RemoveComplete
        )
    }
}

impl From<usize> for DeviceChangeKind {
    fn from(wparam: usize) -> Self {
        match wparam {
            DBT_DEVICEARRIVAL => Self::Arrival,
            DBT_DEVICEQUERYREMOVE => Self::QueryRemove,
            DBT_DEVICEQUERYREMOVEFAILED => Self::QueryRemoveFailed,
            DBT_DEVICEREMOVEPENDING => Self::RemovePending,
            DBT_DEVICEREMOVECOMPLETE => Self::RemoveComplete,
            DBT_DEVNODES_CHANGED => Self::DevNodesChanged,
            other => Self::Other(other),
        }
    }
}

/// Device-interface payload carried by a device change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInterface {
    pub class: ClassId,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    SinkCreated,
    DeviceChange {
        kind: DeviceChangeKind,
        interface: Option<DeviceInterface>,
    },
    SinkClosing,
    SinkDestroyed,
    Other(u32),
}

impl NotificationEvent {
    /// Classify a raw message. `interface` is the decoded payload, if the
    /// message carried a device-interface broadcast.
    pub fn decode(message: u32, wparam: usize, interface: Option<DeviceInterface>) -> Self {
        match message {
            WM_CREATE => Self::SinkCreated,
            WM_DEVICECHANGE => Self::DeviceChange {
                kind: wparam.into(),
                interface,
            },
            WM_CLOSE => Self::SinkClosing,
            WM_DESTROY => Self::SinkDestroyed,
            raw => Self::Other(raw),
        }
    }

    /// Value the sink returns once it has consumed this event: TRUE grants
    /// a device change, lifecycle messages expect zero.
    pub fn handled_result(&self) -> isize {
        match self {
            Self::DeviceChange { .. } => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classid::KEYBOARD_HID_CLASS;

    fn keyboard() -> DeviceInterface {
        DeviceInterface {
            class: ClassId::parse(KEYBOARD_HID_CLASS).unwrap(),
            path: r"\\?\HID#VID_046D&PID_C31C#7&1".into(),
        }
    }

    #[test]
    fn decodes_lifecycle_messages() {
        let decode = |message| NotificationEvent::decode(message, 0, None);

        assert_eq!(decode(WM_CREATE), NotificationEvent::SinkCreated);
        assert_eq!(decode(WM_CLOSE), NotificationEvent::SinkClosing);
        assert_eq!(decode(WM_DESTROY), NotificationEvent::SinkDestroyed);
        assert_eq!(decode(0x000F), NotificationEvent::Other(0x000F));
    }

    #[test]
    fn only_device_changes_are_granted() {
        let granted = |message| NotificationEvent::decode(message, 0x8000, None).handled_result();

        assert_eq!(granted(WM_DEVICECHANGE), 1);
        assert_eq!(granted(WM_CREATE), 0);
        assert_eq!(granted(WM_CLOSE), 0);
        assert_eq!(granted(WM_DESTROY), 0);
    }

    #[test]
    fn decodes_arrival_with_payload() {
        let event = NotificationEvent::decode(WM_DEVICECHANGE, 0x8000, Some(keyboard()));
        assert_eq!(
            event,
            NotificationEvent::DeviceChange {
                kind: DeviceChangeKind::Arrival,
                interface: Some(keyboard()),
            }
        );
    }

    #[test]
    fn device_change_sub_codes() {
        assert_eq!(DeviceChangeKind::from(0x8004), DeviceChangeKind::RemoveComplete);
        assert_eq!(DeviceChangeKind::from(0x0007), DeviceChangeKind::DevNodesChanged);
        assert_eq!(DeviceChangeKind::from(0x0018), DeviceChangeKind::Other(0x0018));
        assert!(DeviceChangeKind::Arrival.carries_broadcast());
        assert!(!DeviceChangeKind::DevNodesChanged.carries_broadcast());
    }
}
