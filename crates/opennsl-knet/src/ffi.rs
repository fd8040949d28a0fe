//! Raw OpenNSL KNET bindings and the hardware-backed [`KnetBackend`].
//!
//! Only compiled with the `vendor-sdk` feature, which links `libopennsl`.
//!
//! # Safety
//!
//! 1. Native descriptors are fully zero-initialized before any field is
//!    assigned, matching the SDK's `*_t_init()` discipline.
//! 2. The traversal trampoline never lets a Rust panic unwind into the C
//!    call frame; panics are caught and reported as a traversal failure.
//! 3. Strings crossing the boundary are NUL-terminated and bounded by the
//!    native buffer size; oversized names are rejected before the copy.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::backend::{KnetBackend, NetifVisitor, TraverseControl};
use crate::error::{KnetError, KnetResult, OpennslStatus, OpennslStatusExt};
use crate::types::{FilterId, IfName, KnetFilter, KnetNetif, MacAddr, NetifId, Unit, NETIF_NAME_MAX};

/// `opennsl_knet_netif_t`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct opennsl_knet_netif_t {
    pub netif_type: c_int,
    pub flags: u32,
    pub mac_addr: [u8; 6],
    pub vlan: u16,
    pub port: c_int,
    pub cosq: c_int,
    pub id: c_int,
    pub name: [c_char; NETIF_NAME_MAX],
}

impl opennsl_knet_netif_t {
    /// Equivalent of `opennsl_knet_netif_t_init()`.
    pub fn zeroed() -> Self {
        // repr(C), all fields are plain integers; all-zero is the SDK's
        // documented initial state.
        unsafe { std::mem::zeroed() }
    }
}

/// `opennsl_knet_filter_t`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct opennsl_knet_filter_t {
    pub filter_type: c_int,
    pub flags: u32,
    pub priority: c_int,
    pub dest_type: c_int,
    pub dest_id: c_int,
    pub dest_proto: u16,
    pub mirror_type: c_int,
    pub mirror_id: c_int,
    pub match_flags: u32,
    pub m_vlan: u16,
    pub m_ingport: c_int,
    pub id: c_int,
    pub desc: [c_char; NETIF_NAME_MAX],
}

impl opennsl_knet_filter_t {
    /// Equivalent of `opennsl_knet_filter_t_init()`.
    pub fn zeroed() -> Self {
        unsafe { std::mem::zeroed() }
    }
}

type TraverseCb =
    unsafe extern "C" fn(unit: c_int, netif: *mut opennsl_knet_netif_t, user: *mut c_void) -> c_int;

extern "C" {
    fn opennsl_knet_init(unit: c_int) -> c_int;
    fn opennsl_knet_netif_create(unit: c_int, netif: *mut opennsl_knet_netif_t) -> c_int;
    fn opennsl_knet_netif_destroy(unit: c_int, netif_id: c_int) -> c_int;
    fn opennsl_knet_filter_create(unit: c_int, filter: *mut opennsl_knet_filter_t) -> c_int;
    fn opennsl_knet_filter_destroy(unit: c_int, filter_id: c_int) -> c_int;
    fn opennsl_knet_netif_traverse(unit: c_int, cb: TraverseCb, user: *mut c_void) -> c_int;
}

fn to_native_netif(netif: &KnetNetif) -> opennsl_knet_netif_t {
    let mut raw = opennsl_knet_netif_t::zeroed();
    raw.netif_type = netif.netif_type;
    raw.port = netif.port;
    raw.mac_addr = netif.mac_addr.octets();
    if let Some(id) = netif.id {
        raw.id = id.as_raw();
    }
    let name = netif.name.to_native();
    for (dst, src) in raw.name.iter_mut().zip(name.iter()) {
        *dst = *src as c_char;
    }
    raw
}

fn to_native_filter(filter: &KnetFilter) -> opennsl_knet_filter_t {
    let mut raw = opennsl_knet_filter_t::zeroed();
    raw.filter_type = filter.filter_type;
    raw.flags = filter.flags;
    raw.priority = filter.priority;
    raw.dest_type = filter.dest_type;
    raw.dest_id = filter.dest_id.as_raw();
    raw.match_flags = filter.match_flags;
    raw.m_ingport = filter.match_ingport;
    raw
}

fn from_native_netif(raw: &opennsl_knet_netif_t) -> KnetResult<KnetNetif> {
    let len = raw
        .name
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(NETIF_NAME_MAX - 1);
    let bytes: Vec<u8> = raw.name[..len].iter().map(|&c| c as u8).collect();
    let name = String::from_utf8(bytes)
        .map_err(|_| KnetError::invalid_parameter("netif name is not valid UTF-8"))?;
    Ok(KnetNetif {
        netif_type: raw.netif_type,
        port: raw.port,
        name: IfName::new(name)?,
        mac_addr: MacAddr(raw.mac_addr),
        id: Some(NetifId::from_raw(raw.id)),
    })
}

struct TraverseCtx<'a, 'b> {
    visit: &'a mut NetifVisitor<'b>,
    /// Set when the visitor panicked; the panic is contained here and
    /// re-raised as a traversal error on the Rust side of the boundary.
    panicked: bool,
    /// Set when the visitor asked to stop. The SDK has no error-free way
    /// to abort a traversal, so the abort code it returns afterwards is
    /// suppressed when this is set.
    stopped: bool,
    /// Entries whose descriptors could not be translated.
    skipped: usize,
}

unsafe extern "C" fn traverse_trampoline(
    _unit: c_int,
    netif: *mut opennsl_knet_netif_t,
    user: *mut c_void,
) -> c_int {
    let ctx = &mut *(user as *mut TraverseCtx<'_, '_>);
    if netif.is_null() {
        ctx.skipped += 1;
        return OpennslStatus::None.as_raw();
    }
    let raw = &*netif;
    let outcome = catch_unwind(AssertUnwindSafe(|| match from_native_netif(raw) {
        Ok(ref translated) => Some((ctx.visit)(translated)),
        Err(_) => None,
    }));
    match outcome {
        Ok(Some(TraverseControl::Continue)) => OpennslStatus::None.as_raw(),
        Ok(Some(TraverseControl::Stop)) => {
            ctx.stopped = true;
            OpennslStatus::Fail.as_raw()
        }
        Ok(None) => {
            ctx.skipped += 1;
            OpennslStatus::None.as_raw()
        }
        Err(_) => {
            ctx.panicked = true;
            OpennslStatus::Fail.as_raw()
        }
    }
}

/// [`KnetBackend`] implementation backed by the vendor SDK.
pub struct OpennslKnet;

impl OpennslKnet {
    pub fn new() -> Self {
        OpennslKnet
    }
}

impl Default for OpennslKnet {
    fn default() -> Self {
        Self::new()
    }
}

impl KnetBackend for OpennslKnet {
    fn knet_init(&self, unit: Unit) -> KnetResult<()> {
        unsafe { opennsl_knet_init(unit.0) }.to_result("opennsl_knet_init")
    }

    fn netif_create(&self, unit: Unit, netif: &KnetNetif) -> KnetResult<NetifId> {
        let mut raw = to_native_netif(netif);
        unsafe { opennsl_knet_netif_create(unit.0, &mut raw) }
            .to_result("opennsl_knet_netif_create")?;
        Ok(NetifId::from_raw(raw.id))
    }

    fn netif_destroy(&self, unit: Unit, id: NetifId) -> KnetResult<()> {
        unsafe { opennsl_knet_netif_destroy(unit.0, id.as_raw()) }
            .to_result("opennsl_knet_netif_destroy")
    }

    fn filter_create(&self, unit: Unit, filter: &KnetFilter) -> KnetResult<FilterId> {
        let mut raw = to_native_filter(filter);
        unsafe { opennsl_knet_filter_create(unit.0, &mut raw) }
            .to_result("opennsl_knet_filter_create")?;
        Ok(FilterId::from_raw(raw.id))
    }

    fn filter_destroy(&self, unit: Unit, id: FilterId) -> KnetResult<()> {
        unsafe { opennsl_knet_filter_destroy(unit.0, id.as_raw()) }
            .to_result("opennsl_knet_filter_destroy")
    }

    fn netif_traverse(
        &self,
        unit: Unit,
        visit: &mut NetifVisitor<'_>,
    ) -> KnetResult<()> {
        let mut ctx = TraverseCtx {
            visit,
            panicked: false,
            stopped: false,
            skipped: 0,
        };
        let rv = unsafe {
            opennsl_knet_netif_traverse(
                unit.0,
                traverse_trampoline,
                &mut ctx as *mut TraverseCtx<'_, '_> as *mut c_void,
            )
        };
        if ctx.panicked {
            return Err(KnetError::Status {
                call: "opennsl_knet_netif_traverse",
                status: OpennslStatus::Internal,
            });
        }
        if ctx.skipped > 0 {
            warn!(
                unit = unit.0,
                skipped = ctx.skipped,
                "skipped untranslatable netif entries during traversal"
            );
        }
        if ctx.stopped {
            return Ok(());
        }
        rv.to_result("opennsl_knet_netif_traverse")
    }
}
