//! Integration tests for the KNET service against the fake hardware
//! backend.
//!
//! These drive the four operations through the generated service trait and
//! verify the netif/filter pairing invariant: a pair is created and
//! destroyed atomically from the caller's view, and no orphaned hardware
//! state is left behind on any failure path the service can compensate.

use std::sync::Arc;

use tonic::{Code, Request};

use knetd::proto::knet_server::Knet;
use knetd::proto::{AddRequest, DeleteRequest, InitRequest, Interface, ListRequest};
use knetd::KnetService;
use opennsl_knet::{FakeCall, FakeKnet, OpennslStatus, Unit};

fn service() -> (Arc<FakeKnet>, KnetService<FakeKnet>) {
    let fake = Arc::new(FakeKnet::new());
    (fake.clone(), KnetService::with_backend(fake))
}

fn add_request(unit: i32, port: i64, name: &str) -> Request<AddRequest> {
    Request::new(AddRequest {
        unit,
        netif: Some(Interface {
            id: 0,
            port,
            name: name.to_string(),
            mac: vec![],
        }),
    })
}

#[tokio::test]
async fn happy_path_init_add_list_delete() {
    let (fake, svc) = service();

    svc.init(Request::new(InitRequest { unit: 0 }))
        .await
        .unwrap();
    assert!(fake.is_initialized(Unit(0)));

    let added = svc.add(add_request(0, 4, "eth4")).await.unwrap().into_inner();
    assert!(added.id > 0);
    assert!(added.filter_id > 0);

    let listed = svc
        .list(Request::new(ListRequest { unit: 0 }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(listed.netifs.len(), 1);
    let entry = &listed.netifs[0];
    assert_eq!(entry.id, added.id);
    assert_eq!(entry.port, 4);
    assert_eq!(entry.name, "eth4");
    // Policy MAC, reflected back from the hardware table.
    assert_eq!(entry.mac, vec![0x02, 0x10, 0x18, 0x00, 0x00, 0x01]);

    svc.delete(Request::new(DeleteRequest {
        unit: 0,
        id: added.id,
        filter_id: added.filter_id,
    }))
    .await
    .unwrap();

    let listed = svc
        .list(Request::new(ListRequest { unit: 0 }))
        .await
        .unwrap()
        .into_inner();
    assert!(listed.netifs.iter().all(|n| n.id != added.id));
    assert_eq!(fake.filter_count(Unit(0)), 0);
}

#[tokio::test]
async fn add_returns_both_ids_or_neither() {
    let (fake, svc) = service();

    let added = svc.add(add_request(0, 1, "eth1")).await.unwrap().into_inner();
    assert!(added.id > 0 && added.filter_id > 0);

    fake.fail_next(FakeCall::NetifCreate, OpennslStatus::Full);
    let err = svc.add(add_request(0, 2, "eth2")).await.unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);
    assert!(err.message().contains("opennsl_knet_netif_create"));
    assert!(err.message().contains("Table full"));
}

#[tokio::test]
async fn second_delete_of_same_pair_is_not_found() {
    let (_fake, svc) = service();

    let added = svc.add(add_request(0, 4, "eth4")).await.unwrap().into_inner();
    let req = DeleteRequest {
        unit: 0,
        id: added.id,
        filter_id: added.filter_id,
    };

    svc.delete(Request::new(req.clone())).await.unwrap();
    let err = svc.delete(Request::new(req)).await.unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
    assert!(err.message().contains("opennsl_knet_filter_destroy"));
}

#[tokio::test]
async fn oversized_name_fails_before_any_hardware_call() {
    let (fake, svc) = service();

    // One byte over the native name buffer (16 bytes incl. NUL).
    let err = svc
        .add(add_request(0, 4, &"x".repeat(16)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn filter_create_failure_destroys_the_fresh_netif() {
    let (fake, svc) = service();

    fake.fail_next(FakeCall::FilterCreate, OpennslStatus::Resource);
    let err = svc.add(add_request(0, 4, "eth4")).await.unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);
    assert!(err.message().contains("opennsl_knet_filter_create"));

    // The compensating destroy fired: no orphan netif is listed.
    let listed = svc
        .list(Request::new(ListRequest { unit: 0 }))
        .await
        .unwrap()
        .into_inner();
    assert!(listed.netifs.is_empty());
    assert_eq!(fake.netif_count(Unit(0)), 0);
}

#[tokio::test]
async fn failed_compensation_reports_both_failures() {
    let (fake, svc) = service();

    fake.fail_next(FakeCall::FilterCreate, OpennslStatus::Resource);
    fake.fail_next(FakeCall::NetifDestroy, OpennslStatus::Fail);

    let err = svc.add(add_request(0, 4, "eth4")).await.unwrap_err();
    assert_eq!(err.code(), Code::Aborted);
    assert!(err.message().contains("opennsl_knet_filter_create"));
    assert!(err.message().contains("opennsl_knet_netif_destroy"));
    assert!(err.message().contains("operator attention"));

    // The netif really is stranded on the device.
    assert_eq!(fake.netif_count(Unit(0)), 1);
}

#[tokio::test]
async fn netif_destroy_failure_after_filter_destroy_is_partial() {
    let (fake, svc) = service();

    let added = svc.add(add_request(0, 4, "eth4")).await.unwrap().into_inner();

    fake.fail_next(FakeCall::NetifDestroy, OpennslStatus::Busy);
    let err = svc
        .delete(Request::new(DeleteRequest {
            unit: 0,
            id: added.id,
            filter_id: added.filter_id,
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Aborted);
    assert!(err.message().contains("dangling"));

    // Filter is gone, netif is not: exactly the reported partial state.
    assert_eq!(fake.filter_count(Unit(0)), 0);
    assert_eq!(fake.netif_count(Unit(0)), 1);
}

#[tokio::test]
async fn filter_destroy_failure_leaves_the_pair_intact() {
    let (fake, svc) = service();

    let added = svc.add(add_request(0, 4, "eth4")).await.unwrap().into_inner();

    fake.fail_next(FakeCall::FilterDestroy, OpennslStatus::Busy);
    let err = svc
        .delete(Request::new(DeleteRequest {
            unit: 0,
            id: added.id,
            filter_id: added.filter_id,
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);

    // Netif destroy was never attempted; both halves survive.
    assert_eq!(fake.filter_count(Unit(0)), 1);
    assert_eq!(fake.netif_count(Unit(0)), 1);
}

#[tokio::test]
async fn traversal_failure_returns_no_partial_list() {
    let (fake, svc) = service();

    for (port, name) in [(1, "eth1"), (2, "eth2"), (3, "eth3")] {
        svc.add(add_request(0, port, name)).await.unwrap();
    }

    fake.fail_traverse_after(2, OpennslStatus::Fail);
    let err = svc
        .list(Request::new(ListRequest { unit: 0 }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);
    assert!(err.message().contains("opennsl_knet_netif_traverse"));

    // The next traversal succeeds and sees the full table.
    let listed = svc
        .list(Request::new(ListRequest { unit: 0 }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(listed.netifs.len(), 3);
}

#[tokio::test]
async fn units_have_independent_tables() {
    let (_fake, svc) = service();

    svc.add(add_request(0, 1, "eth1")).await.unwrap();
    svc.add(add_request(1, 2, "eth2")).await.unwrap();

    let unit0 = svc
        .list(Request::new(ListRequest { unit: 0 }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(unit0.netifs.len(), 1);
    assert_eq!(unit0.netifs[0].name, "eth1");

    let unit1 = svc
        .list(Request::new(ListRequest { unit: 1 }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(unit1.netifs.len(), 1);
    assert_eq!(unit1.netifs[0].name, "eth2");
}

#[tokio::test]
async fn add_requires_a_netif() {
    let (_fake, svc) = service();

    let err = svc
        .add(Request::new(AddRequest {
            unit: 0,
            netif: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn init_failure_is_unavailable_with_errmsg() {
    let (fake, svc) = service();

    fake.fail_next(FakeCall::Init, OpennslStatus::Unavail);
    let err = svc
        .init(Request::new(InitRequest { unit: 0 }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);
    assert!(err.message().contains("opennsl_knet_init"));
    assert!(err.message().contains("Feature unavailable"));
}
