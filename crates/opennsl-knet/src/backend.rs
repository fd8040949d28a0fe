//! The hardware control primitive surface.

use crate::error::KnetResult;
use crate::types::{FilterId, KnetFilter, KnetNetif, NetifId, Unit};

/// What a traversal visitor wants the traversal to do next.
///
/// This is the visitor's only signal channel: the native traversal is a C
/// callback mechanism, so visitors must report problems through their own
/// accumulator state and return `Stop` rather than panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraverseControl {
    /// Visit the next entry.
    Continue,
    /// Abort the traversal.
    Stop,
}

/// Visitor closure for [`KnetBackend::netif_traverse`].
pub type NetifVisitor<'a> = dyn FnMut(&KnetNetif) -> TraverseControl + 'a;

/// Narrow interface over the vendor SDK's KNET primitives.
///
/// Every method is a synchronous, blocking call with conventional driver
/// ioctl semantics; there is no cancellation hook. The SDK's thread-safety
/// contract for concurrent calls against the same unit is not documented,
/// so callers must serialize access per unit themselves.
pub trait KnetBackend: Send + Sync {
    /// Enables KNET support on a device unit (`opennsl_knet_init`).
    ///
    /// This is a device-wide state change, not request-scoped. Whether
    /// repeated calls are idempotent is left to the vendor primitive.
    fn knet_init(&self, unit: Unit) -> KnetResult<()>;

    /// Creates a virtual network interface (`opennsl_knet_netif_create`)
    /// and returns the hardware-assigned id.
    fn netif_create(&self, unit: Unit, netif: &KnetNetif) -> KnetResult<NetifId>;

    /// Destroys a network interface (`opennsl_knet_netif_destroy`).
    fn netif_destroy(&self, unit: Unit, id: NetifId) -> KnetResult<()>;

    /// Creates a packet filter (`opennsl_knet_filter_create`) and returns
    /// the hardware-assigned id.
    fn filter_create(&self, unit: Unit, filter: &KnetFilter) -> KnetResult<FilterId>;

    /// Destroys a packet filter (`opennsl_knet_filter_destroy`).
    fn filter_destroy(&self, unit: Unit, id: FilterId) -> KnetResult<()>;

    /// Invokes `visit` once per existing interface in hardware table order
    /// (`opennsl_knet_netif_traverse`). Ordering is not guaranteed sorted
    /// or stable across calls; the visited set is a snapshot at call time.
    fn netif_traverse(&self, unit: Unit, visit: &mut NetifVisitor<'_>) -> KnetResult<()>;
}
