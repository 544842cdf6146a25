use core::fmt::{Display, Formatter, Result};

/// Arguments or cursor moves the caller got wrong.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputError {
    ClusterSize,
    SeekBeforeStart,
}

/// Requests the volume cannot satisfy in its current state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperationError {
    NoFreeClusters,
    SingleCluster,
}

/// Rejections while building a fresh filesystem.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
    TooSmall,
    InvalidLabel,
}

/// On-disk data that does not parse as FAT32.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataError {
    NotFat32,
}

#[derive(Debug)]
pub enum ErrorKind<E> {
    IO(E),
    Data(DataError),
    Input(InputError),
    Operation(OperationError),
    Format(FormatError),
    /// A caller-supplied reader or writer failed mid-transfer.
    #[cfg(feature = "std")]
    Stream(std::io::Error),
}

/// An error kind tagged with the operation that first observed it.
#[derive(Debug)]
pub struct Error<E> {
    pub op: &'static str,
    pub kind: ErrorKind<E>,
}

impl<E> Error<E> {
    pub(crate) fn new(op: &'static str, kind: impl Into<ErrorKind<E>>) -> Self {
        Self { op, kind: kind.into() }
    }

    pub(crate) fn io(op: &'static str, device: E) -> Self {
        Self { op, kind: ErrorKind::IO(device) }
    }
}

impl<E> From<InputError> for ErrorKind<E> {
    fn from(error: InputError) -> Self {
        Self::Input(error)
    }
}

impl<E> From<OperationError> for ErrorKind<E> {
    fn from(error: OperationError) -> Self {
        Self::Operation(error)
    }
}

impl<E> From<FormatError> for ErrorKind<E> {
    fn from(error: FormatError) -> Self {
        Self::Format(error)
    }
}

impl<E> From<DataError> for ErrorKind<E> {
    fn from(error: DataError) -> Self {
        Self::Data(error)
    }
}

impl<E: Display> Display for ErrorKind<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::IO(e) => write!(f, "IO({})", e),
            Self::Data(DataError::NotFat32) => write!(f, "not a FAT32 filesystem"),
            Self::Input(InputError::ClusterSize) => write!(f, "incorrect cluster size"),
            Self::Input(InputError::SeekBeforeStart) => {
                write!(f, "went before the start of the chain")
            }
            Self::Operation(OperationError::NoFreeClusters) => write!(f, "no free clusters"),
            Self::Operation(OperationError::SingleCluster) => write!(f, "no clusters to remove"),
            Self::Format(FormatError::TooSmall) => write!(f, "volume too small for FAT32"),
            Self::Format(FormatError::InvalidLabel) => {
                write!(f, "volume label must be ASCII")
            }
            #[cfg(feature = "std")]
            Self::Stream(e) => write!(f, "stream: {}", e),
        }
    }
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}: {}", self.op, self.kind)
    }
}
