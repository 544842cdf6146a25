#[cfg(feature = "std")]
pub mod std;

pub mod mem;

use core::fmt::Debug;

use crate::types::SectorID;

pub const SECTOR_SIZE: usize = 512;
pub type Sector = [u8; SECTOR_SIZE];

/// Sector-granular access to a volume.
///
/// LBAs are 0-based and sectors are always 512 bytes. Reads and writes are
/// assumed atomic at sector granularity.
pub trait IO {
    type Error: Debug;

    fn num_sectors(&self) -> u32;
    fn read(&mut self, id: SectorID) -> Result<Sector, Self::Error>;
    fn write(&mut self, id: SectorID, data: &Sector) -> Result<(), Self::Error>;
}
