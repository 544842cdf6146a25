use alloc::vec;
use alloc::vec::Vec;

use super::{Sector, SECTOR_SIZE};
use crate::types::SectorID;

/// A volume held entirely in memory, zero-filled at creation.
pub struct RamDisk {
    sectors: Vec<Sector>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutOfRange(pub SectorID);

impl core::fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sector {} out of range", self.0)
    }
}

impl RamDisk {
    pub fn new(num_sectors: u32) -> Self {
        Self { sectors: vec![[0u8; SECTOR_SIZE]; num_sectors as usize] }
    }

    /// Raw view of one sector, bypassing the IO trait.
    pub fn sector(&self, id: SectorID) -> &Sector {
        &self.sectors[u32::from(id) as usize]
    }

    pub fn sector_mut(&mut self, id: SectorID) -> &mut Sector {
        &mut self.sectors[u32::from(id) as usize]
    }
}

impl super::IO for RamDisk {
    type Error = OutOfRange;

    fn num_sectors(&self) -> u32 {
        self.sectors.len() as u32
    }

    fn read(&mut self, id: SectorID) -> Result<Sector, Self::Error> {
        let index = u32::from(id) as usize;
        self.sectors.get(index).copied().ok_or(OutOfRange(id))
    }

    fn write(&mut self, id: SectorID, data: &Sector) -> Result<(), Self::Error> {
        let index = u32::from(id) as usize;
        let sector = self.sectors.get_mut(index).ok_or(OutOfRange(id))?;
        *sector = *data;
        Ok(())
    }
}
