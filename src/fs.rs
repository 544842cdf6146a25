use crate::io::SECTOR_SIZE;
use crate::region::boot::BootSector;
use crate::types::{ClusterID, SectorID};

/// Data-area geometry derived from the boot sector at open.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Info {
    pub data_offset: u32,
    pub sectors_per_cluster: u32,
}

impl Info {
    pub fn new(boot: &BootSector) -> Self {
        Self {
            data_offset: boot.first_data_sector(),
            sectors_per_cluster: boot.sectors_per_cluster() as u32,
        }
    }

    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    /// First sector of a data cluster.
    pub fn sector(&self, cluster: ClusterID) -> SectorID {
        SectorID::from(self.data_offset) + cluster.offset() * self.sectors_per_cluster
    }
}
