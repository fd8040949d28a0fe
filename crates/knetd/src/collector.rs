//! Traversal collector: accumulates List entries during a hardware
//! traversal.
//!
//! The collector's visitor runs inside the backend's traversal callback,
//! which on real hardware is a native C call frame. It therefore never
//! panics: a descriptor it cannot represent on the wire is counted and
//! skipped through the collector's own state, and the traversal continues.

use opennsl_knet::{KnetNetif, TraverseControl};
use tracing::warn;

use crate::proto::Interface;

/// Accumulates wire-level interface entries during one List traversal.
#[derive(Default)]
pub struct NetifCollector {
    entries: Vec<Interface>,
    skipped: usize,
}

impl NetifCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visits one descriptor, appending its wire representation.
    ///
    /// The MAC is reflected from the hardware descriptor as read, not
    /// re-derived from policy.
    pub fn visit(&mut self, netif: &KnetNetif) -> TraverseControl {
        match netif.id {
            Some(id) => {
                self.entries.push(Interface {
                    id: i64::from(id.as_raw()),
                    port: i64::from(netif.port),
                    name: netif.name.as_str().to_string(),
                    mac: netif.mac_addr.octets().to_vec(),
                });
            }
            // A traversed entry without an id cannot be addressed by a
            // later Delete; skip it rather than emit an unusable row.
            None => self.skipped += 1,
        }
        TraverseControl::Continue
    }

    /// Finishes the traversal, logging any skipped entries, and yields the
    /// collected list. Call only after the traversal reported success;
    /// on traversal failure drop the collector so no partial list leaks.
    pub fn finish(self, unit: i32) -> Vec<Interface> {
        if self.skipped > 0 {
            warn!(
                unit,
                skipped = self.skipped,
                "skipped netif entries without a hardware id during traversal"
            );
        }
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opennsl_knet::{IfName, KnetNetif, NetifId};
    use pretty_assertions::assert_eq;

    fn traversed(id: i32, port: i32, name: &str) -> KnetNetif {
        let mut netif = KnetNetif::new(port, IfName::new(name).unwrap());
        netif.id = Some(NetifId::from_raw(id));
        netif
    }

    #[test]
    fn test_collects_in_traversal_order() {
        let mut collector = NetifCollector::new();
        assert_eq!(
            collector.visit(&traversed(17, 4, "eth4")),
            TraverseControl::Continue
        );
        assert_eq!(
            collector.visit(&traversed(18, 5, "eth5")),
            TraverseControl::Continue
        );
        let entries = collector.finish(0);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 17);
        assert_eq!(entries[0].port, 4);
        assert_eq!(entries[0].name, "eth4");
        assert_eq!(entries[1].id, 18);
    }

    #[test]
    fn test_skips_entries_without_id() {
        let mut collector = NetifCollector::new();
        let no_id = KnetNetif::new(4, IfName::new("eth4").unwrap());
        collector.visit(&no_id);
        collector.visit(&traversed(17, 5, "eth5"));
        let entries = collector.finish(0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 17);
    }

    #[test]
    fn test_reflects_hardware_mac() {
        let mut netif = traversed(17, 4, "eth4");
        netif.mac_addr = opennsl_knet::MacAddr([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        let mut collector = NetifCollector::new();
        collector.visit(&netif);
        let entries = collector.finish(0);
        assert_eq!(entries[0].mac, vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
    }
}
