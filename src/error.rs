use core::fmt;

use thiserror::Error;

/// Status the platform's identifier parser reports for a malformed class
/// identifier string.
pub const CO_E_IIDSTRING: u32 = 0x8004_01F4;

/// Raw last-error code reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsError(pub u32);

impl OsError {
    pub fn code(&self) -> u32 {
        self.0
    }

    fn name(&self) -> Option<&'static str> {
        let name = match self.0 {
            5 => "ERROR_ACCESS_DENIED",
            6 => "ERROR_INVALID_HANDLE",
            13 => "ERROR_INVALID_DATA",
            87 => "ERROR_INVALID_PARAMETER",
            127 => "ERROR_PROC_NOT_FOUND",
            998 => "ERROR_NOACCESS",
            1400 => "ERROR_INVALID_WINDOW_HANDLE",
            1407 => "ERROR_CANNOT_FIND_WND_CLASS",
            1408 => "ERROR_WINDOW_OF_OTHER_THREAD",
            1410 => "ERROR_CLASS_ALREADY_EXISTS",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "os error {}", self.0),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The configured class identifier is not a braced 128-bit value.
    /// The identifier is a compile-time constant, so this is a defect.
    #[error("invalid interface class identifier {input:?}")]
    InvalidClassId { input: String },

    /// The OS declined the device-interface registration. Fatal.
    #[error("device notification registration failed: {code}")]
    RegistrationFailed { code: OsError },

    /// The session lock request failed. Logged, never fatal.
    #[error("session lock request failed: {code}")]
    LockActionFailed { code: OsError },

    /// Creating the message sink failed before the reactor ever ran.
    #[error("{step} failed: {code}")]
    SinkSetup { step: &'static str, code: OsError },

    #[error("device notifications are not supported on this platform")]
    Unsupported,
}

impl Error {
    /// Process status used when this error terminates the host.
    pub fn exit_code(&self) -> u32 {
        match self {
            Error::InvalidClassId { .. } => CO_E_IIDSTRING,
            Error::RegistrationFailed { code }
            | Error::LockActionFailed { code }
            | Error::SinkSetup { code, .. } => code.code(),
            Error::Unsupported => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_render_by_name() {
        assert_eq!(OsError(6).to_string(), "ERROR_INVALID_HANDLE (6)");
        assert_eq!(OsError(4242).to_string(), "os error 4242");
    }

    #[test]
    fn registration_failure_exits_with_os_code() {
        let err = Error::RegistrationFailed { code: OsError(13) };
        assert_eq!(err.exit_code(), 13);
        assert_eq!(
            err.to_string(),
            "device notification registration failed: ERROR_INVALID_DATA (13)"
        );
    }

    #[test]
    fn invalid_class_id_exits_with_parser_status() {
        let err = Error::InvalidClassId {
            input: "nope".into(),
        };
        assert_eq!(err.exit_code(), CO_E_IIDSTRING);
    }
}
