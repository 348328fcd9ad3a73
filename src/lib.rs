//! # Local Address Registry
//!
//! A thread-safe, per-device registry of locally registered service-class
//! addresses. Each device owns one [`LocalAddressRegistry`]; registries of
//! different devices are fully independent.
//!
//! Every registration is validated and checked for uniqueness, and a
//! [`ChangeNotifier`] (typically the signaling component) is informed after
//! every successful change.
//!
//! ## Quick Start
//!
//! ```rust
//! use local_addr_registry::{
//!     decode_snapshot, DeviceNumber, LocalAddressRegistry, RegistryError, SvcAddress,
//! };
//!
//! let registry = LocalAddressRegistry::new(DeviceNumber(0));
//!
//! let addr = SvcAddress::from_public("12345");
//! registry.add(&addr).unwrap();
//! assert_eq!(registry.add(&addr), Err(RegistryError::DuplicateAddress));
//!
//! let mut snapshot = Vec::new();
//! registry.enumerate(&mut snapshot).unwrap();
//! assert_eq!(decode_snapshot(&snapshot), vec![addr]);
//! ```
//!
//! ## Features
//!
//! - **Thread-safe**: one lock per registry, never held across notification
//!   or snapshot transfer
//! - **Non-blocking allocation under lock**: pluggable [`Allocator`], failures
//!   surface as [`RegistryError::OutOfMemory`]
//! - **Fault-tolerant enumeration**: snapshot under the lock, write to a
//!   fallible [`AddressSink`] outside it
//! - **Tracing support**: mutations are reported through `tracing`
//!
//! ## Main Operations
//!
//! - [`LocalAddressRegistry::add`] - Register an address
//! - [`LocalAddressRegistry::delete`] - Remove a registration
//! - [`LocalAddressRegistry::reset`] - Remove every registration
//! - [`LocalAddressRegistry::enumerate`] - Copy all registrations into a sink

mod address;
mod allocator;
mod notify;
mod registry;
mod registry_error;
mod sink;

pub use address::{
    decode_snapshot, AddressFamily, DeviceNumber, SvcAddress, PRIVATE_LEN, PUBLIC_LEN,
};
pub use allocator::{AllocError, Allocator, Heap, Quota};
pub use notify::ChangeNotifier;
pub use registry::LocalAddressRegistry;
pub use registry_error::{InvalidReason, RegistryError};
pub use sink::{AddressSink, SliceSink, TransferFault};
