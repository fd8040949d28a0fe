//! knetd: gRPC agent for OpenNSL KNET interface management.
//!
//! Exposes the switch ASIC's KNET subsystem - host-visible virtual network
//! interfaces backed by hardware switch ports - over a four-operation gRPC
//! surface:
//!
//! | rpc | effect |
//! |-----|--------|
//! | `Init` | enable KNET support on a unit (device-wide) |
//! | `Add` | create a netif bound to a port plus its ingress filter |
//! | `Delete` | tear down a netif/filter pair, filter first |
//! | `List` | enumerate live netifs by fresh hardware traversal |
//!
//! A netif and its filter are created and destroyed as a pair: `Add`
//! returns both ids or neither, and `Delete` requires both back. The
//! service keeps no in-memory mirror of device state and serializes all
//! hardware access per unit.

pub mod collector;
pub mod proto;
pub mod service;
pub mod translate;

use std::net::SocketAddr;

use opennsl_knet::KnetBackend;

use crate::proto::knet_server::KnetServer;
pub use crate::service::KnetService;

/// Serves the KNET service on `listen` until the connection is dropped or
/// the process is terminated.
pub async fn serve<B: KnetBackend + 'static>(
    listen: SocketAddr,
    backend: B,
) -> anyhow::Result<()> {
    let service = KnetService::new(backend);
    tonic::transport::Server::builder()
        .add_service(KnetServer::new(service))
        .serve(listen)
        .await?;
    Ok(())
}
