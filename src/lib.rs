#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

#[macro_use]
extern crate hex_literal;
#[macro_use]
extern crate log;

mod chain;
mod endian;
pub mod error;
mod fat;
pub(crate) mod fs;
pub mod io;
mod region;
pub(crate) mod sync;
pub mod types;

use core::fmt::Debug;
use core::mem;

pub use chain::{Chain, SeekFrom};
use error::{DataError, Error};
pub use fat::EOF;
use fat::Fat;
pub use region::boot::{BootSector, ExtFlags};
use region::fsinfo::FsInfoSector;
use sync::{shared, Shared};
use types::{ClusterID, SectorID};

/// A FAT32 volume on a sector-addressable device.
///
/// Holds the parsed boot sector and the derived geometry; every data
/// access beyond that goes to the device. Chains built from it share the
/// device handle, so the filesystem and its chains stay usable side by
/// side.
pub struct Fat32<IO> {
    io: Shared<IO>,
    boot: BootSector,
    fat: Fat,
    info: fs::Info,
    root: ClusterID,
}

impl<E: Debug, IO: io::IO<Error = E>> Fat32<IO> {
    /// Open an existing FAT32 volume.
    pub fn new(mut io: IO) -> Result<Self, Error<E>> {
        let sector = io.read(SectorID::BOOT).map_err(|e| Error::io("NewFS", e))?;
        let boot: BootSector = unsafe { mem::transmute(sector) };
        if !boot.is_fat32() {
            return Err(Error::new("NewFS", DataError::NotFat32));
        }
        debug!(
            "FAT at sector {}, {} sectors per copy, {} copies",
            boot.reserved_sectors(),
            boot.sectors_per_fat(),
            boot.num_fats()
        );
        let flags = boot.ext_flags();
        if flags.mirroring_disabled() != 0 {
            debug!("mirroring disabled, active FAT {}", flags.active_fat());
        }
        let root = ClusterID::from(boot.root_cluster());
        debug!("root directory on cluster {}", root);
        let fat = Fat::new(&boot);
        let info = fs::Info::new(&boot);
        Ok(Self { io: shared(io), boot, fat, info, root })
    }

    /// Create a FAT32 filesystem on the device, then open it.
    ///
    /// With `erase` set, every reserved and FAT sector is zeroed first;
    /// callers promise the data region is already zero either way.
    pub fn format(mut io: IO, label: &str, erase: bool) -> Result<Self, Error<E>> {
        let boot =
            BootSector::new(io.num_sectors(), label).map_err(|e| Error::new("Format", e))?;
        let fat = Fat::new(&boot);
        if erase {
            let zero = [0u8; io::SECTOR_SIZE];
            let sectors =
                boot.reserved_sectors() as u32 + boot.num_fats() as u32 * boot.sectors_per_fat();
            for sector in 0..sectors {
                io.write(SectorID::from(sector), &zero).map_err(|e| Error::io("Format", e))?;
            }
        }
        io.write(SectorID::BOOT, &boot.bytes()).map_err(|e| Error::io("Format", e))?;
        io.write(SectorID::FSINFO, &FsInfoSector::new().bytes())
            .map_err(|e| Error::io("Format", e))?;
        // Entries 0 and 1 are reserved; entry 2 makes the root directory a
        // single-cluster chain.
        for entry in 0..=2u32 {
            fat.write(&mut io, ClusterID::from(entry), EOF)?;
        }
        info!(
            "formatted {} sectors: {} byte clusters, {} FAT sectors per copy",
            boot.total_sectors(),
            boot.cluster_size(),
            boot.sectors_per_fat()
        );
        Self::new(io)
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot
    }

    /// Bytes per cluster.
    pub fn cluster_size(&self) -> usize {
        self.boot.cluster_size()
    }

    /// One past the highest addressable cluster.
    pub fn num_clusters(&self) -> u32 {
        self.fat.num_clusters()
    }

    pub fn volume_label(&self) -> heapless::String<11> {
        self.boot.volume_label()
    }

    /// The 28-bit FAT entry of `cluster`, read from the primary copy.
    pub fn read_fat(&mut self, cluster: ClusterID) -> Result<u32, Error<E>> {
        let mut io = acquire!(self.io);
        self.fat.read(&mut *io, cluster)
    }

    /// Store the 28-bit FAT entry of `cluster` into every FAT copy,
    /// keeping the reserved high nibble each copy holds on disk.
    pub fn write_fat(&mut self, cluster: ClusterID, value: u32) -> Result<(), Error<E>> {
        let mut io = acquire!(self.io);
        self.fat.write(&mut *io, cluster, value)
    }

    /// Claim the first free cluster and mark it end-of-chain.
    pub fn alloc(&mut self) -> Result<ClusterID, Error<E>> {
        let mut io = acquire!(self.io);
        self.fat.allocate(&mut *io)
    }

    /// A chain rooted at `start`, typically a starting cluster taken from
    /// a directory entry.
    pub fn chain(&self, start: ClusterID) -> Chain<IO> {
        Chain::new(self.io.clone(), self.fat, self.info, start)
    }

    /// The chain holding the root directory.
    pub fn root_chain(&self) -> Chain<IO> {
        self.chain(self.root)
    }

    /// Reclaim the device. Fails if any chain still holds a handle on it.
    pub fn try_free(self) -> Result<IO, Self> {
        let Fat32 { io, boot, fat, info, root } = self;
        let io = match () {
            #[cfg(all(feature = "sync", feature = "std"))]
            () => alloc::sync::Arc::try_unwrap(io).map(|mutex| mutex.into_inner().unwrap()),
            #[cfg(all(feature = "sync", not(feature = "std")))]
            () => alloc::sync::Arc::try_unwrap(io).map(|mutex| mutex.into_inner()),
            #[cfg(not(feature = "sync"))]
            () => alloc::rc::Rc::try_unwrap(io).map(|cell| cell.into_inner()),
        };
        match io {
            Ok(io) => Ok(io),
            Err(io) => Err(Self { io, boot, fat, info, root }),
        }
    }
}
