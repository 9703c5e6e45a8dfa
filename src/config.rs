use crate::classid::KEYBOARD_HID_CLASS;

/// Registered window class of the message sink.
pub const SINK_CLASS_NAME: &str = "HIDLOCK_WindowClass";

/// Title of the message sink.
pub const SINK_TITLE: &str = "hid-lock";

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface class whose arrival locks the session.
    pub interface_class: &'static str,
    pub sink_class_name: &'static str,
    pub sink_title: &'static str,
    pub log_filter: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface_class: KEYBOARD_HID_CLASS,
            sink_class_name: SINK_CLASS_NAME,
            sink_title: SINK_TITLE,
            log_filter: DEFAULT_LOG_FILTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classid::ClassId;

    #[test]
    fn default_watches_keyboards() {
        let config = Config::default();
        assert_eq!(config.interface_class, KEYBOARD_HID_CLASS);
        assert!(ClassId::parse(config.interface_class).is_ok());
    }
}
