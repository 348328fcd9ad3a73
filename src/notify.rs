use crate::DeviceNumber;

/// Receives "local addresses changed" signals for a device.
///
/// Called after every successful `add`, `delete` and `reset`, with the
/// registry lock released. The registry does not wait on or inspect the
/// outcome; consumers re-read the set through enumeration when they need it.
///
/// Any `Fn(DeviceNumber) + Send + Sync` closure is a notifier:
///
/// ```rust
/// use local_addr_registry::{DeviceNumber, LocalAddressRegistry, SvcAddress};
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// let registry = LocalAddressRegistry::new(DeviceNumber(0))
///     .with_notifier(move |itf: DeviceNumber| {
///         let _ = tx.send(itf);
///     });
///
/// registry.add(&SvcAddress::from_public("12345")).unwrap();
/// assert_eq!(rx.try_recv(), Ok(DeviceNumber(0)));
/// ```
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, device: DeviceNumber);
}

impl<F> ChangeNotifier for F
where
    F: Fn(DeviceNumber) + Send + Sync,
{
    fn notify(&self, device: DeviceNumber) {
        self(device)
    }
}
