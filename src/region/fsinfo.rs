// Reserved region: the FSInfo sector

use crate::endian::Little as LE;
use crate::io::{Sector, SECTOR_SIZE};

#[derive(Copy, Clone)]
#[repr(C, packed)]
pub(crate) struct FsInfoSector {
    lead_signature: LE<u32>,
    _reserved: [u8; 484],
    free_count: LE<u32>,
    next_free: LE<u32>,
    _reserved2: [u8; 12],
    trail_signature: LE<u32>,
}

const _: () = assert!(core::mem::size_of::<FsInfoSector>() == SECTOR_SIZE);

impl FsInfoSector {
    /// The skeleton written at format time. Both counters stay "unknown"
    /// and are never maintained afterwards; readers must treat them as
    /// hints.
    pub fn new() -> Self {
        Self {
            lead_signature: 0x41615252u32.into(),
            _reserved: [0; 484],
            free_count: 0xFFFF_FFFFu32.into(),
            next_free: 0xFFFF_FFFFu32.into(),
            _reserved2: [0; 12],
            trail_signature: 0xAA55_0000u32.into(),
        }
    }

    pub fn bytes(&self) -> Sector {
        unsafe { core::mem::transmute(*self) }
    }
}
