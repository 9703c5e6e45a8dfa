//! Device-interface class identifiers.
//!
//! A class identifier is a 128-bit value. Textually it is written the way
//! the platform's own parser expects it: hyphenated and wrapped in braces,
//! e.g. `{884b96c3-56ef-11d1-bc8c-00a0c91405dd}`.

use core::fmt;

use uuid::Uuid;

use crate::error::Error;

/// Interface class of HID keyboards.
pub const KEYBOARD_HID_CLASS: &str = "{884b96c3-56ef-11d1-bc8c-00a0c91405dd}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(Uuid);

impl ClassId {
    /// Parse the braced textual form. Anything else, including the bare
    /// hyphenated form, is rejected.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidClassId {
            input: input.to_owned(),
        };

        if !(input.starts_with('{') && input.ends_with('}')) {
            return Err(invalid());
        }
        // The braced form is 38 characters; uuid would also accept other
        // layouts inside braces.
        if input.len() != 38 {
            return Err(invalid());
        }
        Uuid::parse_str(input).map(Self).map_err(|_| invalid())
    }

    /// Build from the platform's four-field layout.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self(Uuid::from_fields(data1, data2, data3, &data4))
    }

    /// Split into the platform's four-field layout.
    pub fn fields(&self) -> (u32, u16, u16, [u8; 8]) {
        let (data1, data2, data3, data4) = self.0.as_fields();
        (data1, data2, data3, *data4)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.braced(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keyboard_class() {
        let class = ClassId::parse(KEYBOARD_HID_CLASS).unwrap();
        assert_eq!(
            class.fields(),
            (
                0x884b96c3,
                0x56ef,
                0x11d1,
                [0xbc, 0x8c, 0x00, 0xa0, 0xc9, 0x14, 0x05, 0xdd]
            )
        );
        assert_eq!(class.to_string(), KEYBOARD_HID_CLASS);
    }

    #[test]
    fn accepts_uppercase_digits() {
        let upper = ClassId::parse("{884B96C3-56EF-11D1-BC8C-00A0C91405DD}").unwrap();
        assert_eq!(upper, ClassId::parse(KEYBOARD_HID_CLASS).unwrap());
    }

    #[test]
    fn rejects_malformed_input() {
        for input in [
            "",
            "884b96c3-56ef-11d1-bc8c-00a0c91405dd",
            "{884b96c3-56ef-11d1-bc8c-00a0c91405d}",
            "{884b96c356ef11d1bc8c00a0c91405dd}",
            "{884b96c3-56ef-11d1-bc8c-00a0c91405zz}",
            "{884b96c3-56ef-11d1-bc8c-00a0c91405dd",
        ] {
            match ClassId::parse(input) {
                Err(Error::InvalidClassId { input: reported }) => assert_eq!(reported, input),
                other => panic!("{input:?} parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn field_layout_is_reversible() {
        let class = ClassId::parse(KEYBOARD_HID_CLASS).unwrap();
        let (d1, d2, d3, d4) = class.fields();
        assert_eq!(ClassId::from_fields(d1, d2, d3, d4), class);
    }
}
