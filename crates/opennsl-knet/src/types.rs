//! KNET descriptor types and policy constants.
//!
//! These are safe mirrors of the native `opennsl_knet_netif_t` and
//! `opennsl_knet_filter_t` descriptors. The native structs require explicit
//! zero-initialization before use; the safe types here can only be built
//! through constructors that start from a fully zeroed state, so a
//! partially initialized descriptor cannot reach the hardware.

use std::fmt;

use crate::error::{KnetError, KnetResult};

/// Identifies one physical switch ASIC instance under driver control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unit(pub i32);

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hardware-assigned handle for a KNET network interface.
///
/// Distinct from [`FilterId`] so the two id spaces cannot be mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetifId(i32);

impl NetifId {
    pub const fn from_raw(raw: i32) -> Self {
        NetifId(raw)
    }

    pub const fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for NetifId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hardware-assigned handle for a KNET packet filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(i32);

impl FilterId {
    pub const fn from_raw(raw: i32) -> Self {
        FilterId(raw)
    }

    pub const fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Size of the native descriptor's name buffer, NUL terminator included
/// (`OPENNSL_KNET_NETIF_NAME_MAX`).
pub const NETIF_NAME_MAX: usize = 16;

/// A kernel interface name that fits the native fixed-size name buffer.
///
/// The native descriptor stores the name as a NUL-terminated `char[16]`,
/// so at most [`NETIF_NAME_MAX`]` - 1` bytes of name are representable.
/// Construction rejects oversized names instead of truncating them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfName(String);

impl IfName {
    /// Validates and wraps an interface name.
    ///
    /// # Errors
    ///
    /// Returns `KnetError::InvalidParameter` if the name is empty, longer
    /// than the native buffer allows, or contains a NUL byte.
    pub fn new(name: impl Into<String>) -> KnetResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(KnetError::invalid_parameter("interface name is empty"));
        }
        if name.len() > NETIF_NAME_MAX - 1 {
            return Err(KnetError::invalid_parameter(format!(
                "interface name '{}' is {} bytes, max {}",
                name,
                name.len(),
                NETIF_NAME_MAX - 1
            )));
        }
        if name.contains('\0') {
            return Err(KnetError::invalid_parameter(
                "interface name contains a NUL byte",
            ));
        }
        Ok(IfName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the name into the native fixed-size buffer, NUL padded.
    pub fn to_native(&self) -> [u8; NETIF_NAME_MAX] {
        let mut buf = [0u8; NETIF_NAME_MAX];
        buf[..self.0.len()].copy_from_slice(self.0.as_bytes());
        buf
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 48-bit Ethernet MAC address (`opennsl_mac_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Base MAC assigned by policy to every KNET interface.
    pub const BASE: MacAddr = MacAddr([0x02, 0x10, 0x18, 0x00, 0x00, 0x01]);

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// `OPENNSL_KNET_NETIF_T_TX_LOCAL_PORT` - transmit via a local port.
pub const NETIF_T_TX_LOCAL_PORT: i32 = 2;

/// `OPENNSL_KNET_FILTER_T_RX_PKT` - match received packets.
pub const FILTER_T_RX_PKT: i32 = 1;

/// `OPENNSL_KNET_FILTER_F_STRIP_TAG` - strip the VLAN tag on ingress.
pub const FILTER_F_STRIP_TAG: u32 = 0x0000_0001;

/// `OPENNSL_KNET_DEST_T_NETIF` - route matching traffic to a netif.
pub const DEST_T_NETIF: i32 = 1;

/// `OPENNSL_KNET_FILTER_M_INGPORT` - match on the ingress port.
pub const FILTER_M_INGPORT: u32 = 0x0000_0004;

/// Network-interface descriptor (`opennsl_knet_netif_t`).
///
/// `id` is populated by the hardware on successful creation and is absent
/// before that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnetNetif {
    /// Interface type (`NETIF_T_*`).
    pub netif_type: i32,
    /// Physical switch port the interface is bound to.
    pub port: i32,
    /// Kernel interface name.
    pub name: IfName,
    /// MAC address of the kernel interface.
    pub mac_addr: MacAddr,
    /// Hardware-assigned handle, present only after creation.
    pub id: Option<NetifId>,
}

impl KnetNetif {
    /// Builds a descriptor for creation: policy type, policy MAC, no id.
    ///
    /// The remaining native fields (flags, vlan, cosq) stay zeroed, which
    /// is what the SDK's `opennsl_knet_netif_t_init()` leaves them as.
    pub fn new(port: i32, name: IfName) -> Self {
        KnetNetif {
            netif_type: NETIF_T_TX_LOCAL_PORT,
            port,
            name,
            mac_addr: MacAddr::BASE,
            id: None,
        }
    }
}

/// Packet-filter descriptor (`opennsl_knet_filter_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnetFilter {
    /// Filter type (`FILTER_T_*`).
    pub filter_type: i32,
    /// Filter flags (`FILTER_F_*`).
    pub flags: u32,
    /// Filter priority; lower matches first.
    pub priority: i32,
    /// Destination type (`DEST_T_*`).
    pub dest_type: i32,
    /// Destination netif for `DEST_T_NETIF`.
    pub dest_id: NetifId,
    /// Which fields of the packet to match (`FILTER_M_*`).
    pub match_flags: u32,
    /// Ingress port to match for `FILTER_M_INGPORT`.
    pub match_ingport: i32,
    /// Hardware-assigned handle, present only after creation.
    pub id: Option<FilterId>,
}

impl KnetFilter {
    /// Builds the policy filter steering ingress traffic on `ingport` to
    /// the netif `dest_id`: RX packet match, strip-tag, ingress-port match.
    pub fn rx_to_netif(dest_id: NetifId, ingport: i32) -> Self {
        KnetFilter {
            filter_type: FILTER_T_RX_PKT,
            flags: FILTER_F_STRIP_TAG,
            priority: 0,
            dest_type: DEST_T_NETIF,
            dest_id,
            match_flags: FILTER_M_INGPORT,
            match_ingport: ingport,
            id: None,
        }
    }
}
