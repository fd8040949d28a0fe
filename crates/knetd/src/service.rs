//! The KNET gRPC service: Init, Add, Delete, List against one switch unit.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use opennsl_knet::{FilterId, KnetBackend, KnetError, NetifId, Unit};

use crate::collector::NetifCollector;
use crate::proto::knet_server::Knet;
use crate::proto::{
    AddRequest, AddResponse, DeleteRequest, DeleteResponse, InitRequest, InitResponse,
    ListRequest, ListResponse,
};
use crate::translate;

/// Maps a KNET failure to the RPC status surface.
///
/// Translation failures become `INVALID_ARGUMENT` (no hardware was
/// touched). Hardware failures naming a nonexistent entry become
/// `NOT_FOUND`; every other hardware failure is `UNAVAILABLE`, matching
/// the retry semantics callers expect from a device-layer outage. The
/// message always names the failing native call and its errmsg text.
fn to_status(err: &KnetError) -> Status {
    match err {
        KnetError::InvalidParameter { .. } => Status::invalid_argument(err.to_string()),
        KnetError::Status { .. } if err.is_not_found() => Status::not_found(err.to_string()),
        KnetError::Status { .. } => Status::unavailable(err.to_string()),
    }
}

fn id_from_wire(id: i64, what: &str) -> Result<i32, Status> {
    i32::try_from(id).map_err(|_| Status::invalid_argument(format!("{} {} out of range", what, id)))
}

/// KNET service implementation over a hardware backend.
///
/// Holds no mirror of device state: List always re-derives its answer by
/// fresh traversal, and the netif/filter pairing is the caller's to carry
/// between Add and Delete.
pub struct KnetService<B> {
    backend: Arc<B>,
    /// Per-unit serialization. The vendor SDK's thread-safety contract for
    /// concurrent calls against one unit is undocumented, so every
    /// operation holds its unit's lock across all hardware calls it makes.
    unit_locks: DashMap<i32, Arc<Mutex<()>>>,
}

impl<B: KnetBackend> KnetService<B> {
    pub fn new(backend: B) -> Self {
        KnetService {
            backend: Arc::new(backend),
            unit_locks: DashMap::new(),
        }
    }

    /// Shares an existing backend, e.g. with another service on the same
    /// device.
    pub fn with_backend(backend: Arc<B>) -> Self {
        KnetService {
            backend,
            unit_locks: DashMap::new(),
        }
    }

    fn unit_lock(&self, unit: i32) -> Arc<Mutex<()>> {
        self.unit_locks
            .entry(unit)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[tonic::async_trait]
impl<B: KnetBackend + 'static> Knet for KnetService<B> {
    async fn init(
        &self,
        request: Request<InitRequest>,
    ) -> Result<Response<InitResponse>, Status> {
        let req = request.into_inner();
        let lock = self.unit_lock(req.unit);
        let _guard = lock.lock().await;

        self.backend
            .knet_init(Unit(req.unit))
            .map_err(|e| to_status(&e))?;
        info!(unit = req.unit, "KNET support enabled");
        Ok(Response::new(InitResponse {}))
    }

    async fn add(&self, request: Request<AddRequest>) -> Result<Response<AddResponse>, Status> {
        let req = request.into_inner();
        let unit = Unit(req.unit);
        let iface = req
            .netif
            .ok_or_else(|| Status::invalid_argument("add request is missing the netif"))?;

        // Validation happens before any hardware call; a request that
        // cannot be represented natively never reaches the device.
        let netif =
            translate::netif_descriptor(iface.port, &iface.name).map_err(|e| to_status(&e))?;

        let lock = self.unit_lock(req.unit);
        let _guard = lock.lock().await;

        let netif_id = self
            .backend
            .netif_create(unit, &netif)
            .map_err(|e| to_status(&e))?;
        debug!(unit = req.unit, netif_id = %netif_id, name = %netif.name, "netif created");

        let filter = translate::filter_descriptor(netif_id, &netif);
        let filter_id = match self.backend.filter_create(unit, &filter) {
            Ok(id) => id,
            Err(filter_err) => {
                // The pair is created atomically from the caller's view:
                // destroy the half-created netif so no orphan stays behind.
                return Err(match self.backend.netif_destroy(unit, netif_id) {
                    Ok(()) => {
                        warn!(
                            unit = req.unit,
                            netif_id = %netif_id,
                            error = %filter_err,
                            "filter create failed; destroyed the netif it was paired with"
                        );
                        to_status(&filter_err)
                    }
                    Err(cleanup_err) => Status::aborted(format!(
                        "{}; compensating netif destroy also failed: {}; \
                         netif {} is left on unit {} and needs operator attention",
                        filter_err, cleanup_err, netif_id, req.unit
                    )),
                });
            }
        };

        info!(
            unit = req.unit,
            netif_id = %netif_id,
            filter_id = %filter_id,
            port = netif.port,
            name = %netif.name,
            "netif/filter pair created"
        );
        Ok(Response::new(AddResponse {
            id: i64::from(netif_id.as_raw()),
            filter_id: i64::from(filter_id.as_raw()),
        }))
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let req = request.into_inner();
        let unit = Unit(req.unit);
        let netif_id = NetifId::from_raw(id_from_wire(req.id, "netif id")?);
        let filter_id = FilterId::from_raw(id_from_wire(req.filter_id, "filter id")?);

        let lock = self.unit_lock(req.unit);
        let _guard = lock.lock().await;

        // Reverse of creation order: the filter references the netif as
        // its destination, so it goes first. If it cannot be destroyed,
        // stop here - the pair is still intact and the caller can retry.
        self.backend
            .filter_destroy(unit, filter_id)
            .map_err(|e| to_status(&e))?;

        if let Err(e) = self.backend.netif_destroy(unit, netif_id) {
            return Err(Status::aborted(format!(
                "filter {} destroyed but {}; netif {} is dangling on unit {} and must be \
                 deleted again",
                filter_id, e, netif_id, req.unit
            )));
        }

        info!(
            unit = req.unit,
            netif_id = %netif_id,
            filter_id = %filter_id,
            "netif/filter pair destroyed"
        );
        Ok(Response::new(DeleteResponse {}))
    }

    async fn list(&self, request: Request<ListRequest>) -> Result<Response<ListResponse>, Status> {
        let req = request.into_inner();
        let unit = Unit(req.unit);

        let lock = self.unit_lock(req.unit);
        let _guard = lock.lock().await;

        let mut collector = NetifCollector::new();
        self.backend
            .netif_traverse(unit, &mut |netif| collector.visit(netif))
            .map_err(|e| {
                // Anything collected before the failure is dropped with the
                // collector; partial results are never returned.
                to_status(&e)
            })?;

        let netifs = collector.finish(req.unit);
        debug!(unit = req.unit, count = netifs.len(), "listed netifs");
        Ok(Response::new(ListResponse { netifs }))
    }
}
