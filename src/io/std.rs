use std::fs::File;
use std::io::prelude::*;
use std::io::SeekFrom;
use std::path::Path;

use super::{Sector, SECTOR_SIZE};
use crate::types::SectorID;

/// A volume backed by a regular file, one sector per 512-byte slice of it.
#[derive(Debug)]
pub struct FileIO {
    file: File,
    num_sectors: u32,
}

impl FileIO {
    pub fn open<P: AsRef<Path>>(filepath: P) -> std::io::Result<Self> {
        let file = File::options().read(true).write(true).open(filepath)?;
        let num_sectors = (file.metadata()?.len() / SECTOR_SIZE as u64) as u32;
        Ok(Self { file, num_sectors })
    }
}

impl super::IO for FileIO {
    type Error = std::io::Error;

    fn num_sectors(&self) -> u32 {
        self.num_sectors
    }

    fn read(&mut self, id: SectorID) -> Result<Sector, Self::Error> {
        let position = u32::from(id) as u64 * SECTOR_SIZE as u64;
        self.file.seek(SeekFrom::Start(position))?;
        let mut sector = [0u8; SECTOR_SIZE];
        self.file.read_exact(&mut sector)?;
        Ok(sector)
    }

    fn write(&mut self, id: SectorID, data: &Sector) -> Result<(), Self::Error> {
        let position = u32::from(id) as u64 * SECTOR_SIZE as u64;
        self.file.seek(SeekFrom::Start(position))?;
        self.file.write_all(data)
    }
}
