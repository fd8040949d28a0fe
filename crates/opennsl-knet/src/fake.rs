//! In-memory fake of the KNET hardware for tests.
//!
//! Simulates the device's netif and filter tables without hardware or the
//! vendor SDK: hardware-assigned ids count up monotonically, destroys of
//! unknown ids return `OPENNSL_E_NOT_FOUND`, and individual calls can be
//! made to fail deterministically for failure-path tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::backend::{KnetBackend, NetifVisitor, TraverseControl};
use crate::error::{KnetError, KnetResult, OpennslStatus};
use crate::types::{FilterId, KnetFilter, KnetNetif, NetifId, Unit, DEST_T_NETIF};

/// Calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeCall {
    Init,
    NetifCreate,
    NetifDestroy,
    FilterCreate,
    FilterDestroy,
    Traverse,
}

impl FakeCall {
    fn native_name(&self) -> &'static str {
        match self {
            FakeCall::Init => "opennsl_knet_init",
            FakeCall::NetifCreate => "opennsl_knet_netif_create",
            FakeCall::NetifDestroy => "opennsl_knet_netif_destroy",
            FakeCall::FilterCreate => "opennsl_knet_filter_create",
            FakeCall::FilterDestroy => "opennsl_knet_filter_destroy",
            FakeCall::Traverse => "opennsl_knet_netif_traverse",
        }
    }
}

#[derive(Default)]
struct FakeState {
    initialized_units: Vec<Unit>,
    netifs: BTreeMap<(Unit, i32), KnetNetif>,
    filters: BTreeMap<(Unit, i32), KnetFilter>,
    next_netif_id: i32,
    next_filter_id: i32,
    /// Injected failures, consumed on first matching call.
    failures: Vec<(FakeCall, OpennslStatus)>,
    /// If set, traversal reports this status after visiting N entries.
    traverse_fail_after: Option<(usize, OpennslStatus)>,
    /// Count of every hardware call made, for no-hardware-touched checks.
    calls: usize,
}

/// Fake hardware backend.
pub struct FakeKnet {
    state: Mutex<FakeState>,
}

impl FakeKnet {
    pub fn new() -> Self {
        FakeKnet {
            state: Mutex::new(FakeState {
                // Arbitrary non-zero starting handles, so tests notice
                // code that confuses the two id spaces.
                next_netif_id: 17,
                next_filter_id: 23,
                ..FakeState::default()
            }),
        }
    }

    /// Makes the next matching call fail with the given status.
    pub fn fail_next(&self, call: FakeCall, status: OpennslStatus) {
        self.state.lock().unwrap().failures.push((call, status));
    }

    /// Makes traversal fail with `status` after visiting `visits` entries.
    pub fn fail_traverse_after(&self, visits: usize, status: OpennslStatus) {
        self.state.lock().unwrap().traverse_fail_after = Some((visits, status));
    }

    /// Total number of hardware calls the fake has received.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// Number of live netifs on `unit`.
    pub fn netif_count(&self, unit: Unit) -> usize {
        let state = self.state.lock().unwrap();
        state.netifs.keys().filter(|(u, _)| *u == unit).count()
    }

    /// Number of live filters on `unit`.
    pub fn filter_count(&self, unit: Unit) -> usize {
        let state = self.state.lock().unwrap();
        state.filters.keys().filter(|(u, _)| *u == unit).count()
    }

    /// True if `knet_init` has been called on `unit`.
    pub fn is_initialized(&self, unit: Unit) -> bool {
        self.state.lock().unwrap().initialized_units.contains(&unit)
    }

    fn take_failure(state: &mut FakeState, call: FakeCall) -> KnetResult<()> {
        state.calls += 1;
        if let Some(pos) = state.failures.iter().position(|(c, _)| *c == call) {
            let (_, status) = state.failures.remove(pos);
            return Err(KnetError::Status {
                call: call.native_name(),
                status,
            });
        }
        Ok(())
    }
}

impl Default for FakeKnet {
    fn default() -> Self {
        Self::new()
    }
}

impl KnetBackend for FakeKnet {
    fn knet_init(&self, unit: Unit) -> KnetResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, FakeCall::Init)?;
        if !state.initialized_units.contains(&unit) {
            state.initialized_units.push(unit);
        }
        Ok(())
    }

    fn netif_create(&self, unit: Unit, netif: &KnetNetif) -> KnetResult<NetifId> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, FakeCall::NetifCreate)?;
        let raw = state.next_netif_id;
        state.next_netif_id += 1;
        let id = NetifId::from_raw(raw);
        let mut stored = netif.clone();
        stored.id = Some(id);
        state.netifs.insert((unit, raw), stored);
        Ok(id)
    }

    fn netif_destroy(&self, unit: Unit, id: NetifId) -> KnetResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, FakeCall::NetifDestroy)?;
        if state.netifs.remove(&(unit, id.as_raw())).is_none() {
            return Err(KnetError::Status {
                call: "opennsl_knet_netif_destroy",
                status: OpennslStatus::NotFound,
            });
        }
        Ok(())
    }

    fn filter_create(&self, unit: Unit, filter: &KnetFilter) -> KnetResult<FilterId> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, FakeCall::FilterCreate)?;
        // Referential model: a DEST_T_NETIF filter must name a live netif.
        if filter.dest_type == DEST_T_NETIF
            && !state.netifs.contains_key(&(unit, filter.dest_id.as_raw()))
        {
            return Err(KnetError::Status {
                call: "opennsl_knet_filter_create",
                status: OpennslStatus::Param,
            });
        }
        let raw = state.next_filter_id;
        state.next_filter_id += 1;
        let id = FilterId::from_raw(raw);
        let mut stored = *filter;
        stored.id = Some(id);
        state.filters.insert((unit, raw), stored);
        Ok(id)
    }

    fn filter_destroy(&self, unit: Unit, id: FilterId) -> KnetResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, FakeCall::FilterDestroy)?;
        if state.filters.remove(&(unit, id.as_raw())).is_none() {
            return Err(KnetError::Status {
                call: "opennsl_knet_filter_destroy",
                status: OpennslStatus::NotFound,
            });
        }
        Ok(())
    }

    fn netif_traverse(&self, unit: Unit, visit: &mut NetifVisitor<'_>) -> KnetResult<()> {
        // Snapshot under the lock, visit outside it, as the real traversal
        // walks a kernel-side copy of the table.
        let (snapshot, fail_after) = {
            let mut state = self.state.lock().unwrap();
            Self::take_failure(&mut state, FakeCall::Traverse)?;
            let snapshot: Vec<KnetNetif> = state
                .netifs
                .iter()
                .filter(|((u, _), _)| *u == unit)
                .map(|(_, netif)| netif.clone())
                .collect();
            (snapshot, state.traverse_fail_after.take())
        };
        for (visited, netif) in snapshot.iter().enumerate() {
            if let Some((visits, status)) = fail_after {
                if visited == visits {
                    return Err(KnetError::Status {
                        call: "opennsl_knet_netif_traverse",
                        status,
                    });
                }
            }
            if visit(netif) == TraverseControl::Stop {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IfName;
    use pretty_assertions::assert_eq;

    fn netif(port: i32, name: &str) -> KnetNetif {
        KnetNetif::new(port, IfName::new(name).unwrap())
    }

    #[test]
    fn test_ids_are_assigned_monotonically() {
        let fake = FakeKnet::new();
        let unit = Unit(0);
        let a = fake.netif_create(unit, &netif(1, "eth1")).unwrap();
        let b = fake.netif_create(unit, &netif(2, "eth2")).unwrap();
        assert!(b.as_raw() > a.as_raw());
    }

    #[test]
    fn test_destroy_unknown_is_not_found() {
        let fake = FakeKnet::new();
        let err = fake
            .netif_destroy(Unit(0), NetifId::from_raw(99))
            .unwrap_err();
        assert_eq!(err.status(), Some(OpennslStatus::NotFound));
    }

    #[test]
    fn test_filter_requires_live_netif() {
        let fake = FakeKnet::new();
        let filter = KnetFilter::rx_to_netif(NetifId::from_raw(99), 4);
        let err = fake.filter_create(Unit(0), &filter).unwrap_err();
        assert_eq!(err.status(), Some(OpennslStatus::Param));
    }

    #[test]
    fn test_traverse_visits_only_requested_unit() {
        let fake = FakeKnet::new();
        fake.netif_create(Unit(0), &netif(1, "eth1")).unwrap();
        fake.netif_create(Unit(1), &netif(2, "eth2")).unwrap();
        let mut seen = Vec::new();
        fake.netif_traverse(Unit(0), &mut |n: &KnetNetif| {
            seen.push(n.name.as_str().to_string());
            TraverseControl::Continue
        })
        .unwrap();
        assert_eq!(seen, vec!["eth1".to_string()]);
    }

    #[test]
    fn test_injected_failure_is_consumed_once() {
        let fake = FakeKnet::new();
        fake.fail_next(FakeCall::Init, OpennslStatus::Unavail);
        assert!(fake.knet_init(Unit(0)).is_err());
        assert!(fake.knet_init(Unit(0)).is_ok());
    }
}
