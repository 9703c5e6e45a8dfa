//! Layout of the device-interface broadcast that accompanies a device
//! change, and decoding of it straight from the message parameter.
#![allow(non_camel_case_types)]

use core::mem::{offset_of, size_of};
use core::ptr::addr_of;

use crate::classid::ClassId;
use crate::event::DeviceInterface;

pub(crate) type WCHAR = u16;

pub(crate) const DBT_DEVTYP_DEVICEINTERFACE: u32 = 5;

#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct GUID {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl From<&ClassId> for GUID {
    fn from(class: &ClassId) -> Self {
        let (data1, data2, data3, data4) = class.fields();
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

#[repr(C)]
#[allow(dead_code)]
pub(crate) struct DEV_BROADCAST_HDR {
    pub dbch_size: u32,
    pub dbch_devicetype: u32,
    pub dbch_reserved: u32,
}

#[repr(C)]
#[allow(dead_code)]
pub(crate) struct DEV_BROADCAST_DEVICEINTERFACE_W {
    pub dbcc_size: u32,
    pub dbcc_devicetype: u32,
    pub dbcc_reserved: u32,
    pub dbcc_classguid: GUID,
    // Variable length, NUL terminated, bounded by dbcc_size.
    pub dbcc_name: [WCHAR; 1],
}

impl DEV_BROADCAST_DEVICEINTERFACE_W {
    /// Registration filter for one interface class.
    pub fn filter(class: &ClassId) -> Self {
        Self {
            dbcc_size: size_of::<Self>() as u32,
            dbcc_devicetype: DBT_DEVTYP_DEVICEINTERFACE,
            dbcc_reserved: 0,
            dbcc_classguid: class.into(),
            dbcc_name: [0],
        }
    }
}

/// Read the device-interface payload a device change points at, if it has
/// one.
///
/// Only raw pointers derived from `lparam` touch the buffer: the name runs
/// past the end of the declared struct.
///
/// # Safety
/// `lparam` is either zero or points at a broadcast header whose
/// `dbch_size` bytes are readable.
pub(crate) unsafe fn device_interface(lparam: isize) -> Option<DeviceInterface> {
    let base = lparam as *const u8;
    if base.is_null() {
        return None;
    }

    let header = base as *const DEV_BROADCAST_HDR;
    let size = addr_of!((*header).dbch_size).read() as usize;
    if addr_of!((*header).dbch_devicetype).read() != DBT_DEVTYP_DEVICEINTERFACE {
        return None;
    }
    let name_offset = offset_of!(DEV_BROADCAST_DEVICEINTERFACE_W, dbcc_name);
    if size < name_offset {
        return None;
    }

    let broadcast = base as *const DEV_BROADCAST_DEVICEINTERFACE_W;
    let guid = addr_of!((*broadcast).dbcc_classguid).read();
    let class = ClassId::from_fields(guid.data1, guid.data2, guid.data3, guid.data4);

    let name = base.add(name_offset) as *const WCHAR;
    let max_len = (size - name_offset) / size_of::<WCHAR>();
    let len = (0..max_len).take_while(|&i| name.add(i).read() != 0).count();
    let path = String::from_utf16_lossy(core::slice::from_raw_parts(name, len));

    Some(DeviceInterface { class, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classid::KEYBOARD_HID_CLASS;

    const PATH: &str = r"\\?\HID#VID_046D&PID_C52B&MI_00#7&2b4c1e0&0&0000#{884b96c3}";

    #[repr(C)]
    #[allow(dead_code)]
    struct Broadcast {
        dbcc_size: u32,
        dbcc_devicetype: u32,
        dbcc_reserved: u32,
        dbcc_classguid: GUID,
        dbcc_name: [WCHAR; 96],
    }

    fn broadcast(path: &str) -> Broadcast {
        let class = ClassId::parse(KEYBOARD_HID_CLASS).unwrap();
        let mut broadcast = Broadcast {
            dbcc_size: size_of::<Broadcast>() as u32,
            dbcc_devicetype: DBT_DEVTYP_DEVICEINTERFACE,
            dbcc_reserved: 0,
            dbcc_classguid: (&class).into(),
            dbcc_name: [0; 96],
        };
        let wide: Vec<WCHAR> = path.encode_utf16().collect();
        broadcast.dbcc_name[..wide.len()].copy_from_slice(&wide);
        broadcast
    }

    #[test]
    fn reads_name_past_the_declared_struct() {
        let payload = broadcast(PATH);

        let interface = unsafe { device_interface(&payload as *const _ as isize) }.unwrap();

        assert_eq!(interface.class.to_string(), KEYBOARD_HID_CLASS);
        assert_eq!(interface.path, PATH);
    }

    #[test]
    fn name_is_bounded_by_declared_size() {
        let mut payload = broadcast("ABCDEFGH");
        let name_offset = offset_of!(Broadcast, dbcc_name);
        payload.dbcc_size = (name_offset + 4 * size_of::<WCHAR>()) as u32;

        let interface = unsafe { device_interface(&payload as *const _ as isize) }.unwrap();

        assert_eq!(interface.path, "ABCD");
    }

    #[test]
    fn other_broadcast_types_decode_to_none() {
        let header = DEV_BROADCAST_HDR {
            dbch_size: size_of::<DEV_BROADCAST_HDR>() as u32,
            dbch_devicetype: 2,
            dbch_reserved: 0,
        };
        assert!(unsafe { device_interface(&header as *const _ as isize) }.is_none());
    }

    #[test]
    fn null_payload_decodes_to_none() {
        assert!(unsafe { device_interface(0) }.is_none());
    }

    #[test]
    fn filter_carries_class_fields() {
        let class = ClassId::parse(KEYBOARD_HID_CLASS).unwrap();
        let filter = DEV_BROADCAST_DEVICEINTERFACE_W::filter(&class);
        let guid = filter.dbcc_classguid;

        assert_eq!(filter.dbcc_devicetype, DBT_DEVTYP_DEVICEINTERFACE);
        assert_eq!(ClassId::from_fields(guid.data1, guid.data2, guid.data3, guid.data4), class);
    }
}
