use core::fmt::Debug;

use alloc::vec::Vec;

use crate::error::{Error, InputError, OperationError};
#[cfg(feature = "std")]
use crate::error::ErrorKind;
use crate::fat::{Fat, EOF, FREE};
use crate::fs;
use crate::io::{Sector, SECTOR_SIZE};
use crate::sync::{acquire, Shared};
use crate::types::ClusterID;

/// Where a cluster-granular seek is measured from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeekFrom {
    Start(u64),
    End(i64),
    Current(i64),
}

/// A readable, writeable, expandable run of clusters joined through the
/// FAT.
///
/// A chain behaves like a tape: it always points at one cluster, and it
/// may be wound back and forth, extended at the end, or truncated. The
/// clusters walked since the start are kept in memory, so rewinding never
/// re-reads the FAT.
pub struct Chain<IO> {
    io: Shared<IO>,
    fat: Fat,
    info: fs::Info,
    cluster: ClusterID,
    prev: Vec<ClusterID>,
}

impl<IO> Chain<IO> {
    pub(crate) fn new(io: Shared<IO>, fat: Fat, info: fs::Info, start: ClusterID) -> Self {
        Self { io, fat, info, cluster: start, prev: Vec::new() }
    }

    /// First cluster of the chain.
    pub fn first_cluster(&self) -> ClusterID {
        match self.prev.first() {
            Some(&first) => first,
            None => self.cluster,
        }
    }

    /// Cluster offset of the cursor within the chain.
    pub fn position(&self) -> u64 {
        self.prev.len() as u64
    }

    /// Bytes per cluster.
    pub fn cluster_size(&self) -> usize {
        self.info.cluster_size()
    }
}

impl<E: Debug, IO: crate::io::IO<Error = E>> Chain<IO> {
    /// Read the cluster under the cursor.
    pub fn read_cluster(&mut self) -> Result<Vec<u8>, Error<E>> {
        let mut data = Vec::with_capacity(self.info.cluster_size());
        let offset = self.info.sector(self.cluster);
        let mut io = acquire!(self.io);
        for i in 0..self.info.sectors_per_cluster {
            let sector = io.read(offset + i).map_err(|e| Error::io("ReadCluster", e))?;
            data.extend_from_slice(&sector);
        }
        Ok(data)
    }

    /// Write the cluster under the cursor. `data` must be exactly one
    /// cluster long.
    pub fn write_cluster(&mut self, data: &[u8]) -> Result<(), Error<E>> {
        if data.len() != self.info.cluster_size() {
            return Err(Error::new("WriteCluster", InputError::ClusterSize));
        }
        let offset = self.info.sector(self.cluster);
        let mut io = acquire!(self.io);
        let mut chunk: Sector = [0; SECTOR_SIZE];
        for i in 0..self.info.sectors_per_cluster {
            let begin = i as usize * SECTOR_SIZE;
            chunk.copy_from_slice(&data[begin..begin + SECTOR_SIZE]);
            io.write(offset + i, &chunk).map_err(|e| Error::io("WriteCluster", e))?;
        }
        Ok(())
    }

    /// Move the cursor by whole clusters. Returns the new cluster offset
    /// within the chain.
    ///
    /// Seeking past the end stops at the last cluster; it never
    /// allocates.
    pub fn seek(&mut self, whence: SeekFrom) -> Result<u64, Error<E>> {
        match whence {
            SeekFrom::Start(offset) => {
                if self.prev.len() as u64 > offset {
                    self.cluster = self.prev[offset as usize];
                    self.prev.truncate(offset as usize);
                    return Ok(offset);
                }
                if self.prev.len() as u64 == offset {
                    return Ok(offset);
                }
                let ahead = offset - self.prev.len() as u64;
                self.seek(SeekFrom::Current(i64::try_from(ahead).unwrap_or(i64::MAX)))
            }
            SeekFrom::Current(offset) if offset < 0 => {
                if offset.unsigned_abs() > self.prev.len() as u64 {
                    return Err(Error::new("Seek", InputError::SeekBeforeStart));
                }
                let length = self.prev.len() - offset.unsigned_abs() as usize;
                self.cluster = self.prev[length];
                self.prev.truncate(length);
                Ok(self.prev.len() as u64)
            }
            SeekFrom::Current(offset) => {
                let mut io = acquire!(self.io);
                for _ in 0..offset {
                    let next = self.fat.read(&mut *io, self.cluster)?;
                    if next >= EOF {
                        return Ok(self.prev.len() as u64);
                    }
                    self.prev.push(self.cluster);
                    self.cluster = ClusterID::from(next);
                }
                Ok(self.prev.len() as u64)
            }
            SeekFrom::End(offset) => {
                // No chain can hold 2^32 clusters, so this lands on the
                // last one.
                self.seek(SeekFrom::Current(1 << 32))?;
                self.seek(SeekFrom::Current(offset))
            }
        }
    }

    /// Append a fresh cluster to the end of the chain and move onto it.
    pub fn extend(&mut self) -> Result<(), Error<E>> {
        self.seek(SeekFrom::End(0))?;
        let mut io = acquire!(self.io);
        let cluster = self.fat.allocate(&mut *io)?;
        if let Err(error) = self.fat.write(&mut *io, self.cluster, cluster.into()) {
            // Hand the fresh cluster back before surfacing the failed
            // link; if that fails too the cluster leaks as an orphan.
            let _ = self.fat.write(&mut *io, cluster, FREE);
            return Err(error);
        }
        self.prev.push(self.cluster);
        self.cluster = cluster;
        Ok(())
    }

    /// Drop the last cluster of the chain and park the cursor on the new
    /// end. Fails on a chain of one cluster, which is the minimum.
    pub fn truncate(&mut self) -> Result<(), Error<E>> {
        self.seek(SeekFrom::End(0))?;
        let previous = match self.prev.last() {
            Some(&previous) => previous,
            None => return Err(Error::new("Truncate", OperationError::SingleCluster)),
        };
        let mut io = acquire!(self.io);
        // The predecessor is terminated before the departing entry is
        // cleared, so the chain stays traversable at every step.
        self.fat.write(&mut *io, previous, EOF)?;
        self.fat.write(&mut *io, self.cluster, FREE)?;
        self.prev.pop();
        self.cluster = previous;
        Ok(())
    }

    /// Release every cluster of the chain. Consumes the chain; the
    /// clusters are free for reuse afterwards.
    pub fn free(mut self) -> Result<(), Error<E>> {
        self.seek(SeekFrom::Start(0))?;
        let mut io = acquire!(self.io);
        while u32::from(self.cluster) < EOF {
            let next = self.fat.read(&mut *io, self.cluster)?;
            self.fat.write(&mut *io, self.cluster, FREE)?;
            self.cluster = ClusterID::from(next);
        }
        Ok(())
    }

    /// Read the cluster under the cursor, then advance one step.
    ///
    /// `done` is true when the cursor was already on the last cluster; the
    /// cursor stays there in that case.
    pub fn read_next(&mut self) -> Result<(Vec<u8>, bool), Error<E>> {
        let data = self.read_cluster()?;
        let offset = self.position();
        let advanced = self.seek(SeekFrom::Current(1))?;
        Ok((data, advanced == offset))
    }

    /// Replace the chain's contents with exactly `clusters`, growing or
    /// shrinking as needed. At least one cluster must be supplied.
    pub fn set_clusters<D: AsRef<[u8]>>(&mut self, clusters: &[D]) -> Result<(), Error<E>> {
        assert!(!clusters.is_empty(), "must write at least one cluster");
        let target = clusters.len() as u64;
        let mut length = self.seek(SeekFrom::End(0))? + 1;
        while length < target {
            self.extend()?;
            length += 1;
        }
        while length > target {
            self.truncate()?;
            length -= 1;
        }
        self.seek(SeekFrom::Start(0))?;
        for cluster in clusters {
            self.write_cluster(cluster.as_ref())?;
            self.seek(SeekFrom::Current(1))?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<E: Debug, IO: crate::io::IO<Error = E>> Chain<IO> {
    /// Drain `reader` and write its bytes from the end of the chain on.
    ///
    /// The current end cluster is overwritten by the first drained
    /// cluster; callers wanting a pure append on a non-empty chain must
    /// `extend` once beforehand. A partial tail is written as a full,
    /// zero-padded cluster. Returns the bytes consumed from `reader`; on a
    /// reader error everything drained so far is already on disk.
    pub fn read_from<R: std::io::Read>(&mut self, reader: &mut R) -> Result<u64, Error<E>> {
        self.seek(SeekFrom::End(0))?;
        let mut buffer = alloc::vec![0u8; self.info.cluster_size()];
        let mut consumed = 0u64;
        let mut needs_extend = false;
        loop {
            buffer.fill(0);
            let (filled, stream_error) = read_full(reader, &mut buffer);
            consumed += filled as u64;
            if filled > 0 {
                if needs_extend {
                    self.extend()?;
                }
                needs_extend = true;
                self.write_cluster(&buffer)?;
            }
            if let Some(error) = stream_error {
                return Err(Error::new("ReadFrom", ErrorKind::Stream(error)));
            }
            if filled < buffer.len() {
                return Ok(consumed);
            }
        }
    }

    /// Write the whole chain, from the first cluster on, into `writer`.
    /// Returns the bytes written.
    pub fn write_to<W: std::io::Write>(&mut self, writer: &mut W) -> Result<u64, Error<E>> {
        self.seek(SeekFrom::Start(0))?;
        let mut written = 0u64;
        let mut offset = 0u64;
        loop {
            let data = self.read_cluster()?;
            writer
                .write_all(&data)
                .map_err(|e| Error::new("WriteTo", ErrorKind::Stream(e)))?;
            written += data.len() as u64;
            let advanced = self.seek(SeekFrom::Current(1))?;
            if advanced == offset {
                return Ok(written);
            }
            offset = advanced;
        }
    }
}

/// Fill `buffer` from `reader`, stopping early only at end of input or on
/// an error. Returns the bytes filled and the error, if any.
#[cfg(feature = "std")]
fn read_full<R: std::io::Read>(
    reader: &mut R,
    buffer: &mut [u8],
) -> (usize, Option<std::io::Error>) {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return (filled, Some(e)),
        }
    }
    (filled, None)
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, InputError, OperationError};
    use crate::io::mem::RamDisk;
    use crate::io::{Sector, IO};
    use crate::types::{ClusterID, SectorID};
    use crate::{Fat32, SeekFrom, EOF};

    fn formatted() -> Fat32<RamDisk> {
        Fat32::format(RamDisk::new(2048), "CHAIN", true).unwrap()
    }

    /// A chain of `count` clusters rooted at the root directory, each
    /// cluster filled with its own index.
    fn stamped(fs: &Fat32<RamDisk>, count: u8) -> crate::Chain<RamDisk> {
        let mut chain = fs.root_chain();
        let clusters: Vec<Vec<u8>> =
            (0..count).map(|index| vec![index; chain.cluster_size()]).collect();
        chain.set_clusters(&clusters).unwrap();
        chain.seek(SeekFrom::Start(0)).unwrap();
        chain
    }

    #[test]
    fn fresh_root_chain() {
        let fs = formatted();
        let mut chain = fs.root_chain();
        assert_eq!(u32::from(chain.first_cluster()), 2);
        assert_eq!(chain.position(), 0);
        assert_eq!(chain.seek(SeekFrom::End(0)).unwrap(), 0);
        assert_eq!(chain.read_cluster().unwrap(), vec![0u8; 512]);
    }

    #[test]
    fn extend_then_truncate_restores_the_fat() {
        let mut fs = formatted();
        let mut chain = fs.root_chain();
        chain.extend().unwrap();
        assert_eq!(chain.position(), 1);
        assert_eq!(fs.read_fat(ClusterID::from(2u32)).unwrap(), 3);
        assert_eq!(fs.read_fat(ClusterID::from(3u32)).unwrap(), EOF);
        chain.truncate().unwrap();
        assert_eq!(chain.position(), 0);
        assert_eq!(fs.read_fat(ClusterID::from(2u32)).unwrap(), EOF);
        assert_eq!(fs.read_fat(ClusterID::from(3u32)).unwrap(), 0);
    }

    #[test]
    fn truncate_keeps_the_last_cluster() {
        let fs = formatted();
        let mut chain = fs.root_chain();
        let error = chain.truncate().unwrap_err();
        assert_eq!(error.op, "Truncate");
        assert!(matches!(
            error.kind,
            ErrorKind::Operation(OperationError::SingleCluster)
        ));
    }

    #[test]
    fn seek_walks_and_rewinds() {
        let fs = formatted();
        let mut chain = stamped(&fs, 4);
        assert_eq!(chain.seek(SeekFrom::Current(2)).unwrap(), 2);
        assert_eq!(chain.read_cluster().unwrap()[0], 2);
        assert_eq!(chain.seek(SeekFrom::Current(-1)).unwrap(), 1);
        assert_eq!(chain.read_cluster().unwrap()[0], 1);
        assert_eq!(chain.seek(SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(chain.read_cluster().unwrap()[0], 3);
        assert_eq!(chain.seek(SeekFrom::Start(0)).unwrap(), 0);
        assert_eq!(chain.read_cluster().unwrap()[0], 0);
        assert_eq!(chain.seek(SeekFrom::End(-2)).unwrap(), 1);
        assert_eq!(chain.read_cluster().unwrap()[0], 1);
    }

    #[test]
    fn seek_past_the_end_clamps() {
        let mut fs = formatted();
        let mut chain = stamped(&fs, 3);
        assert_eq!(chain.seek(SeekFrom::Current(100)).unwrap(), 2);
        assert_eq!(chain.seek(SeekFrom::Start(50)).unwrap(), 2);
        assert_eq!(chain.seek(SeekFrom::End(0)).unwrap(), 2);
        // Clamping never allocates: the next free cluster stays free.
        assert_eq!(fs.read_fat(ClusterID::from(5u32)).unwrap(), 0);
    }

    #[test]
    fn seek_before_the_start_fails() {
        let fs = formatted();
        let mut chain = stamped(&fs, 3);
        chain.seek(SeekFrom::Current(1)).unwrap();
        let error = chain.seek(SeekFrom::Current(-2)).unwrap_err();
        assert_eq!(error.op, "Seek");
        assert!(matches!(
            error.kind,
            ErrorKind::Input(InputError::SeekBeforeStart)
        ));
        // The failed seek leaves the cursor alone.
        assert_eq!(chain.position(), 1);
    }

    #[test]
    fn write_cluster_checks_the_size() {
        let fs = formatted();
        let mut chain = fs.root_chain();
        let error = chain.write_cluster(&[0u8; 100]).unwrap_err();
        assert_eq!(error.op, "WriteCluster");
        assert!(matches!(error.kind, ErrorKind::Input(InputError::ClusterSize)));
    }

    #[test]
    fn free_zeroes_every_link() {
        let mut fs = formatted();
        // A 4-cluster chain at 5..=8, built by hand.
        for cluster in 5u32..8 {
            fs.write_fat(ClusterID::from(cluster), cluster + 1).unwrap();
        }
        fs.write_fat(ClusterID::from(8u32), EOF).unwrap();
        fs.chain(ClusterID::from(5u32)).free().unwrap();
        for cluster in 5u32..=8 {
            assert_eq!(fs.read_fat(ClusterID::from(cluster)).unwrap(), 0);
        }
        // First-fit allocation now lands on the smallest free cluster.
        assert_eq!(u32::from(fs.alloc().unwrap()), 3);
    }

    #[cfg(feature = "std")]
    #[test]
    fn read_from_then_write_to_round_trips() {
        let fs = formatted();
        let mut chain = fs.root_chain();
        let input: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(chain.read_from(&mut &input[..]).unwrap(), 1500);
        assert_eq!(chain.seek(SeekFrom::End(0)).unwrap(), 2);
        chain.seek(SeekFrom::Start(0)).unwrap();
        let mut output = Vec::new();
        assert_eq!(chain.write_to(&mut output).unwrap(), 1536);
        assert_eq!(&output[..1500], &input[..]);
        assert!(output[1500..].iter().all(|&byte| byte == 0));
    }

    #[cfg(feature = "std")]
    #[test]
    fn read_from_reuses_the_end_cluster_first() {
        let fs = formatted();
        let mut chain = stamped(&fs, 2);
        let input = vec![0xABu8; chain.cluster_size()];
        chain.read_from(&mut &input[..]).unwrap();
        // Two clusters still: the old end was overwritten, not extended.
        assert_eq!(chain.seek(SeekFrom::End(0)).unwrap(), 1);
        assert_eq!(chain.read_cluster().unwrap(), input);
    }

    #[test]
    fn read_next_reports_the_last_cluster() {
        let fs = formatted();
        let mut chain = stamped(&fs, 3);
        let (data, done) = chain.read_next().unwrap();
        assert_eq!((data[0], done), (0, false));
        let (data, done) = chain.read_next().unwrap();
        assert_eq!((data[0], done), (1, false));
        let (data, done) = chain.read_next().unwrap();
        assert_eq!((data[0], done), (2, true));
        // The cursor stays parked on the last cluster.
        assert_eq!(chain.position(), 2);
        assert_eq!(chain.read_cluster().unwrap()[0], 2);
    }

    #[test]
    fn set_clusters_grows_and_shrinks() {
        let mut fs = formatted();
        let mut chain = stamped(&fs, 3);
        let single = vec![vec![7u8; chain.cluster_size()]];
        chain.set_clusters(&single).unwrap();
        assert_eq!(fs.read_fat(ClusterID::from(2u32)).unwrap(), EOF);
        assert_eq!(fs.read_fat(ClusterID::from(3u32)).unwrap(), 0);
        assert_eq!(fs.read_fat(ClusterID::from(4u32)).unwrap(), 0);
        chain.seek(SeekFrom::Start(0)).unwrap();
        let (data, done) = chain.read_next().unwrap();
        assert!(done);
        assert!(data.iter().all(|&byte| byte == 7));
    }

    #[test]
    #[should_panic(expected = "at least one cluster")]
    fn set_clusters_requires_input() {
        let fs = formatted();
        let mut chain = fs.root_chain();
        let none: Vec<Vec<u8>> = Vec::new();
        let _ = chain.set_clusters(&none);
    }

    /// Forwards to a RamDisk but injects a failure into the nth write
    /// landing in the FAT region.
    struct FailingFatWrite {
        inner: RamDisk,
        fat_writes_seen: u32,
        fail_on: u32,
    }

    #[derive(Debug)]
    enum Failure {
        Injected,
        Disk(crate::io::mem::OutOfRange),
    }

    impl IO for FailingFatWrite {
        type Error = Failure;

        fn num_sectors(&self) -> u32 {
            self.inner.num_sectors()
        }

        fn read(&mut self, id: SectorID) -> Result<Sector, Self::Error> {
            self.inner.read(id).map_err(Failure::Disk)
        }

        fn write(&mut self, id: SectorID, data: &Sector) -> Result<(), Self::Error> {
            let lba = u32::from(id);
            if (32..64).contains(&lba) {
                self.fat_writes_seen += 1;
                if self.fat_writes_seen == self.fail_on {
                    return Err(Failure::Injected);
                }
            }
            self.inner.write(id, data).map_err(Failure::Disk)
        }
    }

    #[test]
    fn extend_rolls_back_a_failed_link() {
        let fs = formatted();
        let disk = fs.try_free().ok().unwrap();
        // Allocation marks the fresh cluster in both mirrors (writes 1 and
        // 2); the third FAT write is the link to the old end.
        let device = FailingFatWrite { inner: disk, fat_writes_seen: 0, fail_on: 3 };
        let mut fs = Fat32::new(device).unwrap();
        let mut chain = fs.root_chain();
        let error = chain.extend().unwrap_err();
        assert_eq!(error.op, "WriteFAT");
        assert!(matches!(error.kind, ErrorKind::IO(Failure::Injected)));
        assert_eq!(chain.position(), 0);
        drop(chain);
        // The allocated cluster was handed back and the end still
        // terminates the chain.
        assert_eq!(fs.read_fat(ClusterID::from(3u32)).unwrap(), 0);
        assert_eq!(fs.read_fat(ClusterID::from(2u32)).unwrap(), EOF);
    }

    /// After any sequence of seeks, walking the FAT from the first
    /// cluster for `position` steps lands on the cursor's cluster.
    #[test]
    fn back_path_matches_the_fat() {
        let mut fs = formatted();
        let mut chain = stamped(&fs, 5);
        for whence in [
            SeekFrom::Current(3),
            SeekFrom::Current(-2),
            SeekFrom::End(-1),
            SeekFrom::Start(2),
            SeekFrom::End(0),
            SeekFrom::Start(0),
            SeekFrom::Current(4),
        ] {
            chain.seek(whence).unwrap();
            let mut cluster = chain.first_cluster();
            for _ in 0..chain.position() {
                cluster = ClusterID::from(fs.read_fat(cluster).unwrap());
            }
            let stamp = chain.read_cluster().unwrap()[0];
            assert_eq!(chain.position(), stamp as u64);
            // The stamped content pins the cursor to the walked cluster.
            let mut probe = fs.chain(cluster);
            assert_eq!(probe.read_cluster().unwrap()[0], stamp);
        }
    }
}
