//! Per-device registry of local service-class addresses.
//!
//! Each [`LocalAddressRegistry`] owns an insertion-ordered list of addresses
//! behind its own lock. The lock is only held for bounded work on the list:
//! allocation under it goes through the non-blocking [`Allocator`], and both
//! the change notification and the transfer of an enumeration snapshot happen
//! after it is released.
//!
//! # Examples
//!
//! ```
//! use local_addr_registry::{DeviceNumber, LocalAddressRegistry, SliceSink, SvcAddress};
//!
//! let registry = LocalAddressRegistry::new(DeviceNumber(0));
//! registry.add(&SvcAddress::from_public("12345")).unwrap();
//!
//! let mut buf = [0u8; SvcAddress::SIZE];
//! let mut sink = SliceSink::new(&mut buf);
//! assert_eq!(registry.enumerate(&mut sink), Ok(SvcAddress::SIZE));
//! ```

use std::{
    fmt, mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::trace;

use crate::{
    AddressSink, Allocator, ChangeNotifier, DeviceNumber, Heap, RegistryError, SvcAddress,
};

// -------------------------------------------------------------------------------------------------
// Entries
// -------------------------------------------------------------------------------------------------

/// One registration. Owned by the list; addresses leave only as copies.
#[derive(Debug)]
struct Entry {
    addr: SvcAddress,
}

/// Bytes charged to the allocator per entry.
const ENTRY_BYTES: usize = mem::size_of::<Entry>();

/// Holds the optional change notifier.
type NotifierSlot = Mutex<Option<Arc<dyn ChangeNotifier>>>;

// -------------------------------------------------------------------------------------------------
// Registry
// -------------------------------------------------------------------------------------------------

/// The local address registry of one device.
///
/// Registries of different devices share no state.
///
/// # Lock Poisoning Recovery
///
/// Every mutation of the list is a single `push`, `remove` or `take`, so a
/// panic elsewhere while the lock was held cannot leave it half-updated. A
/// poisoned lock is recovered by extracting the inner value.
pub struct LocalAddressRegistry {
    device: DeviceNumber,
    entries: Mutex<Vec<Entry>>,
    notifier: NotifierSlot,
    allocator: Arc<dyn Allocator>,
}

impl LocalAddressRegistry {
    /// Creates an empty registry for `device` with no notifier attached.
    pub fn new(device: DeviceNumber) -> Self {
        Self {
            device,
            entries: Mutex::new(Vec::new()),
            notifier: Mutex::new(None),
            allocator: Arc::new(Heap),
        }
    }

    /// Attaches the notifier informed after each successful mutation.
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl ChangeNotifier + 'static) -> Self {
        *self
            .notifier
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(notifier));
        self
    }

    /// Uses `allocator` for entries and snapshot buffers.
    #[must_use]
    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn device(&self) -> DeviceNumber {
        self.device
    }

    // ---------------------------------------------------------------------------------------------
    // Notification
    // ---------------------------------------------------------------------------------------------

    /// Replaces the change notifier, e.g. when the signaling component restarts.
    pub fn set_notifier(&self, notifier: impl ChangeNotifier + 'static) {
        let mut guard = self.notifier.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(notifier));
    }

    /// Detaches the change notifier. Later mutations notify nobody.
    pub fn clear_notifier(&self) {
        let mut guard = self.notifier.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// Informs the notifier, if any, that the address set changed.
    ///
    /// The notifier runs without any registry lock held, so it may call back
    /// into the registry.
    fn notify_change(&self) {
        let notifier = self
            .notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(notifier) = notifier {
            notifier.notify(self.device);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------------------------

    fn lock_entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `delete(addr)` would find a registration.
    pub fn contains(&self, addr: &SvcAddress) -> bool {
        self.lock_entries()
            .iter()
            .any(|entry| entry.addr.identical(addr))
    }

    // ---------------------------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------------------------

    /// Removes every registration and notifies, even when already empty.
    pub fn reset(&self) {
        let detached = mem::take(&mut *self.lock_entries());
        let count = detached.len();
        for entry in detached {
            self.release(entry);
        }
        trace!(device = %self.device, count, "local addresses reset");
        self.notify_change();
    }

    /// Registers `addr` at the tail of the list.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidAddress`] if `addr` fails validation
    /// - [`RegistryError::DuplicateAddress`] if an existing registration is
    ///   identical to `addr`, in either direction. An address without a
    ///   private part therefore collides with a registration that has the same
    ///   public text and a private part. The classic check, which only asks
    ///   whether the existing entry is identical to `addr`, accepts that
    ///   address and leaves two stored entries that match each other.
    /// - [`RegistryError::OutOfMemory`] if the entry cannot be allocated
    ///
    /// Only a successful add notifies.
    pub fn add(&self, addr: &SvcAddress) -> Result<(), RegistryError> {
        addr.validate()?;

        let count = {
            let mut entries = self.lock_entries();
            if entries
                .iter()
                .any(|entry| entry.addr.identical(addr) || addr.identical(&entry.addr))
            {
                return Err(RegistryError::DuplicateAddress);
            }

            self.allocator.try_alloc(ENTRY_BYTES)?;
            if let Err(err) = entries.try_reserve(1) {
                self.allocator.free(ENTRY_BYTES);
                return Err(err.into());
            }
            entries.push(Entry { addr: *addr });
            entries.len()
        };

        trace!(device = %self.device, address = %addr, count, "local address added");
        self.notify_change();
        Ok(())
    }

    /// Removes the first registration identical to `addr`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidAddress`] if `addr` fails validation
    /// - [`RegistryError::AddressNotFound`] if nothing matches
    pub fn delete(&self, addr: &SvcAddress) -> Result<(), RegistryError> {
        addr.validate()?;

        let (removed, count) = {
            let mut entries = self.lock_entries();
            let index = entries
                .iter()
                .position(|entry| entry.addr.identical(addr))
                .ok_or(RegistryError::AddressNotFound)?;
            let removed = entries.remove(index);
            (removed, entries.len())
        };

        trace!(device = %self.device, address = %removed.addr, count, "local address deleted");
        self.release(removed);
        self.notify_change();
        Ok(())
    }

    fn release(&self, entry: Entry) {
        drop(entry);
        self.allocator.free(ENTRY_BYTES);
    }

    // ---------------------------------------------------------------------------------------------
    // Enumeration
    // ---------------------------------------------------------------------------------------------

    /// Copies every registration, in order, into `dest`.
    ///
    /// The list is serialized into a scratch buffer under the lock, and the
    /// buffer is written to `dest` after the lock is released. At most
    /// `dest.capacity()` bytes are written; each address takes
    /// [`SvcAddress::SIZE`] bytes.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::OutOfMemory`] if the scratch buffer cannot be allocated
    /// - [`RegistryError::TransferFault`] if `dest` fails the write
    /// - [`RegistryError::BufferTooSmall`] if the snapshot was truncated to
    ///   the capacity of `dest`; the truncated prefix has been written
    pub fn enumerate<S>(&self, dest: &mut S) -> Result<usize, RegistryError>
    where
        S: AddressSink + ?Sized,
    {
        let scratch = self.snapshot_bytes()?;
        let total = scratch.len();
        let transfer = total.min(dest.capacity());

        let outcome = dest.write(&scratch[..transfer]);
        drop(scratch);
        self.allocator.free(total);
        outcome?;

        if total > transfer {
            Err(RegistryError::BufferTooSmall {
                needed: total,
                written: transfer,
            })
        } else {
            Ok(total)
        }
    }

    /// Serializes the list into a freshly allocated buffer in one locked pass.
    fn snapshot_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        let entries = self.lock_entries();
        let total = entries.len() * SvcAddress::SIZE;

        self.allocator.try_alloc(total)?;
        let mut scratch = Vec::new();
        if let Err(err) = scratch.try_reserve_exact(total) {
            drop(entries);
            self.allocator.free(total);
            return Err(err.into());
        }
        for entry in entries.iter() {
            scratch.extend_from_slice(&entry.addr.to_bytes());
        }
        Ok(scratch)
    }

    /// Copies every registration, in order, as typed addresses.
    ///
    /// # Errors
    ///
    /// [`RegistryError::OutOfMemory`] if the copy cannot be allocated.
    pub fn snapshot(&self) -> Result<Vec<SvcAddress>, RegistryError> {
        let (addrs, charged) = {
            let entries = self.lock_entries();
            let charged = entries.len() * SvcAddress::SIZE;

            self.allocator.try_alloc(charged)?;
            let mut addrs = Vec::new();
            if let Err(err) = addrs.try_reserve_exact(entries.len()) {
                drop(entries);
                self.allocator.free(charged);
                return Err(err.into());
            }
            addrs.extend(entries.iter().map(|entry| entry.addr));
            (addrs, charged)
        };

        // the copy now belongs to the caller
        self.allocator.free(charged);
        Ok(addrs)
    }
}

impl fmt::Debug for LocalAddressRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAddressRegistry")
            .field("device", &self.device)
            .field("entries", &self.len())
            .field("allocator", &self.allocator)
            .finish_non_exhaustive()
    }
}

impl Drop for LocalAddressRegistry {
    fn drop(&mut self) {
        let entries = mem::take(
            self.entries
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for entry in entries {
            self.release(entry);
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
