use std::collections::TryReserveError;

use thiserror::Error;

use crate::{AllocError, TransferFault, PUBLIC_LEN};

/// Why an address failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("address family is not service-class")]
    UnsupportedFamily,
    #[error("neither a public nor a private part is present")]
    Empty,
    #[error("public part is not terminated within {} characters", PUBLIC_LEN)]
    Unterminated,
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid address: {0}")]
    InvalidAddress(InvalidReason),
    #[error("address is already registered")]
    DuplicateAddress,
    #[error("address is not registered")]
    AddressNotFound,
    #[error("out of memory")]
    OutOfMemory,
    /// The destination received the first `written` bytes of a `needed` byte snapshot.
    #[error("destination too small: {needed} bytes needed, {written} written")]
    BufferTooSmall { needed: usize, written: usize },
    #[error("transfer to destination faulted")]
    TransferFault,
}

impl RegistryError {
    /// The negative errno a C-style control interface reports for this error.
    pub fn errno(&self) -> i32 {
        const E2BIG: i32 = 7;
        const ENOENT: i32 = 2;
        const ENOMEM: i32 = 12;
        const EFAULT: i32 = 14;
        const EEXIST: i32 = 17;
        const EINVAL: i32 = 22;
        const EAFNOSUPPORT: i32 = 97;

        let code = match self {
            RegistryError::InvalidAddress(InvalidReason::UnsupportedFamily) => EAFNOSUPPORT,
            RegistryError::InvalidAddress(_) => EINVAL,
            RegistryError::DuplicateAddress => EEXIST,
            RegistryError::AddressNotFound => ENOENT,
            RegistryError::OutOfMemory => ENOMEM,
            RegistryError::BufferTooSmall { .. } => E2BIG,
            RegistryError::TransferFault => EFAULT,
        };
        -code
    }
}

impl From<AllocError> for RegistryError {
    fn from(_: AllocError) -> Self {
        RegistryError::OutOfMemory
    }
}

impl From<TryReserveError> for RegistryError {
    fn from(_: TryReserveError) -> Self {
        RegistryError::OutOfMemory
    }
}

impl From<TransferFault> for RegistryError {
    fn from(_: TransferFault) -> Self {
        RegistryError::TransferFault
    }
}
