//! Service-class address values.
//!
//! An [`SvcAddress`] carries two independently optional parts: a short public
//! (dialable) text and a fixed-length private binary part. Values can be built
//! in any shape, including malformed ones; [`SvcAddress::validate`] decides
//! whether the registry accepts them.

use std::fmt;

use crate::{InvalidReason, RegistryError};

/// Maximum length of the public text, excluding its terminator.
pub const PUBLIC_LEN: usize = 15;

/// Length of the private part in bytes.
pub const PRIVATE_LEN: usize = 20;

const FAMILY_END: usize = 2;
const PUBLIC_END: usize = FAMILY_END + PUBLIC_LEN + 1;

/// Opaque address family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressFamily(u16);

impl AddressFamily {
    /// Permanent virtual circuit addressing.
    pub const PVC: Self = Self(8);
    /// Switched (service-class) addressing, the only family the registry accepts.
    pub const SVC: Self = Self(20);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Interface number of the device owning a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceNumber(pub u32);

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "itf{}", self.0)
    }
}

/// A service-class address.
///
/// `PartialEq` is byte equality of the whole value. Whether two addresses name
/// the same registration is answered by [`SvcAddress::identical`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SvcAddress {
    family: AddressFamily,
    public: [u8; PUBLIC_LEN + 1],
    private: [u8; PRIVATE_LEN],
}

impl SvcAddress {
    /// Size of one address in an enumeration snapshot.
    pub const SIZE: usize = PUBLIC_END + PRIVATE_LEN;

    /// Builds a service-class address from raw parts.
    ///
    /// At most `PUBLIC_LEN + 1` bytes of `public` are kept, so text longer than
    /// [`PUBLIC_LEN`] yields an unterminated public part that fails validation.
    pub fn new(public: &[u8], private: [u8; PRIVATE_LEN]) -> Self {
        let mut buf = [0u8; PUBLIC_LEN + 1];
        let n = public.len().min(buf.len());
        buf[..n].copy_from_slice(&public[..n]);
        Self {
            family: AddressFamily::SVC,
            public: buf,
            private,
        }
    }

    /// An address with only a public part.
    pub fn from_public(public: &str) -> Self {
        Self::new(public.as_bytes(), [0; PRIVATE_LEN])
    }

    /// An address with only a private part.
    pub fn from_private(private: [u8; PRIVATE_LEN]) -> Self {
        Self::new(&[], private)
    }

    #[must_use]
    pub fn with_family(mut self, family: AddressFamily) -> Self {
        self.family = family;
        self
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// The public text up to its terminator, or `None` when absent.
    pub fn public_text(&self) -> Option<&[u8]> {
        let end = self
            .public
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.public.len());
        (end > 0).then(|| &self.public[..end])
    }

    /// The private part, or `None` when it is all zero.
    pub fn private_part(&self) -> Option<&[u8; PRIVATE_LEN]> {
        self.private.iter().any(|&b| b != 0).then_some(&self.private)
    }

    /// Checks that the address may be registered.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidAddress`] when the family is not service-class,
    /// when both parts are absent, or when the public text is not terminated
    /// within [`PUBLIC_LEN`] characters.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.family != AddressFamily::SVC {
            return Err(RegistryError::InvalidAddress(
                InvalidReason::UnsupportedFamily,
            ));
        }
        if self.public[0] == 0 {
            return match self.private_part() {
                Some(_) => Ok(()),
                None => Err(RegistryError::InvalidAddress(InvalidReason::Empty)),
            };
        }
        if self.public[1..].contains(&0) {
            Ok(())
        } else {
            Err(RegistryError::InvalidAddress(InvalidReason::Unterminated))
        }
    }

    /// Whether `other` denotes the same registration as `self`.
    ///
    /// A private part on `self` must match `other` byte for byte. The public
    /// texts must then agree, with absent only matching absent. The relation
    /// is not symmetric when exactly one side carries a private part.
    pub fn identical(&self, other: &Self) -> bool {
        if self.private_part().is_some() && self.private != other.private {
            return false;
        }
        match (self.public_text(), other.public_text()) {
            (None, theirs) => theirs.is_none(),
            (Some(_), None) => false,
            (Some(ours), Some(theirs)) => ours == theirs,
        }
    }

    /// Serializes into the fixed snapshot layout: little-endian family,
    /// public buffer, private part.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..FAMILY_END].copy_from_slice(&self.family.0.to_le_bytes());
        out[FAMILY_END..PUBLIC_END].copy_from_slice(&self.public);
        out[PUBLIC_END..].copy_from_slice(&self.private);
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut public = [0u8; PUBLIC_LEN + 1];
        let mut private = [0u8; PRIVATE_LEN];
        public.copy_from_slice(&bytes[FAMILY_END..PUBLIC_END]);
        private.copy_from_slice(&bytes[PUBLIC_END..]);
        Self {
            family: AddressFamily(u16::from_le_bytes([bytes[0], bytes[1]])),
            public,
            private,
        }
    }
}

impl fmt::Display for SvcAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "svc:")?;
        if let Some(text) = self.public_text() {
            write!(f, "{}", String::from_utf8_lossy(text))?;
        }
        write!(f, "/")?;
        match self.private_part() {
            Some(private) => private.iter().try_for_each(|b| write!(f, "{b:02x}")),
            None => write!(f, "-"),
        }
    }
}

/// Splits an enumeration snapshot back into addresses.
///
/// A trailing partial record, as left by a truncated transfer, is ignored.
pub fn decode_snapshot(bytes: &[u8]) -> Vec<SvcAddress> {
    bytes
        .chunks_exact(SvcAddress::SIZE)
        .map(|chunk| {
            let mut record = [0u8; SvcAddress::SIZE];
            record.copy_from_slice(chunk);
            SvcAddress::from_bytes(&record)
        })
        .collect()
}
