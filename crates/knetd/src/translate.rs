//! Wire request to native descriptor translation.
//!
//! Pure functions with no hardware calls. All validation a request needs
//! before it may touch the device happens here: a request that cannot be
//! represented in the native descriptors fails translation, and the
//! service never issues a hardware call for it.

use opennsl_knet::{IfName, KnetError, KnetFilter, KnetNetif, KnetResult, NetifId};

/// Builds the native netif descriptor for an Add request.
///
/// Policy fields are fixed: interface type is transmit-via-local-port and
/// the MAC is the base MAC constant; neither is caller-controlled. The
/// name is bounds-checked against the native buffer, never truncated.
pub fn netif_descriptor(port: i64, name: &str) -> KnetResult<KnetNetif> {
    let port = i32::try_from(port)
        .map_err(|_| KnetError::invalid_parameter(format!("port {} out of range", port)))?;
    if port < 0 {
        return Err(KnetError::invalid_parameter(format!(
            "port {} is negative",
            port
        )));
    }
    let name = IfName::new(name)?;
    Ok(KnetNetif::new(port, name))
}

/// Builds the filter descriptor paired with a freshly created netif.
///
/// The filter steers ingress traffic on the netif's own port to the netif:
/// RX packet match, strip-tag on ingress, destination is the new netif's
/// hardware id.
pub fn filter_descriptor(netif_id: NetifId, netif: &KnetNetif) -> KnetFilter {
    KnetFilter::rx_to_netif(netif_id, netif.port)
}
