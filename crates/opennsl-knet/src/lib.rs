//! Safe Rust bindings for the OpenNSL KNET API.
//!
//! KNET is the switch ASIC driver subsystem that exposes hardware switch
//! ports as host-visible virtual network interfaces. This crate wraps the
//! vendor SDK's KNET primitives behind a narrow, typed surface, preventing
//! the usual C-API hazards: uninitialized descriptor fields, unchecked
//! string copies into fixed buffers, and panics unwinding through native
//! callback frames.
//!
//! # Architecture
//!
//! - [`types`]: descriptor types, typed ids, and policy constants
//! - [`error`]: `opennsl_error_t` status codes and error handling
//! - [`backend`]: the [`KnetBackend`] trait, the hardware primitive surface
//! - `ffi` (feature `vendor-sdk`): the real SDK-backed backend
//! - `fake` (feature `testing`): an in-memory backend for tests
//!
//! # Example
//!
//! ```ignore
//! use opennsl_knet::{IfName, KnetBackend, KnetNetif, Unit};
//!
//! fn add_interface(knet: &dyn KnetBackend, unit: Unit) -> opennsl_knet::KnetResult<()> {
//!     let netif = KnetNetif::new(4, IfName::new("eth4")?);
//!     let id = knet.netif_create(unit, &netif)?;
//!     knet.netif_destroy(unit, id)
//! }
//! ```

pub mod backend;
pub mod error;
pub mod types;

#[cfg(feature = "vendor-sdk")]
pub mod ffi;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use backend::{KnetBackend, NetifVisitor, TraverseControl};
pub use error::{KnetError, KnetResult, OpennslStatus, OpennslStatusExt};
pub use types::{FilterId, IfName, KnetFilter, KnetNetif, MacAddr, NetifId, Unit};

#[cfg(feature = "vendor-sdk")]
pub use ffi::OpennslKnet;

#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeCall, FakeKnet};
