//! Unit tests for fleet-state.

#[cfg(test)]
mod fixtures {
    use fleet_core::{Coord, Grid, SignalTable};

    use crate::{NewVehicle, RangeType, StateStore, TravelType, VehicleKind};

    /// Distinct entries so every outcome is distinguishable.
    pub const TABLE: SignalTable = SignalTable::new(0.0, 0.5, 2.0);

    pub fn store_with_vehicles(n: usize) -> StateStore {
        let mut s = StateStore::new(Grid::new(10, 10), TABLE);
        for _ in 0..n {
            s.register_vehicle(
                NewVehicle { kind: VehicleKind::Mother, loadable: false, start: Coord::new(0, 0) },
                TravelType::Ground,
                RangeType::Battery,
                1.0,
            );
        }
        s
    }
}

#[cfg(test)]
mod restriction {
    use fleet_core::Signal;

    use crate::Restriction;

    const B: Restriction = Restriction::Bounded { min: 0.0, max: 10.0 };

    #[test]
    fn variant_follows_present_bounds() {
        assert_eq!(Restriction::from_bounds(None, None), Restriction::Unbounded);
        assert_eq!(Restriction::from_bounds(Some(5.0), None), Restriction::UpperOnly { max: 5.0 });
        assert_eq!(Restriction::from_bounds(None, Some(0.0)), Restriction::LowerOnly { min: 0.0 });
        assert_eq!(B.max(), Some(10.0));
        assert_eq!(B.min(), Some(0.0));
    }

    #[test]
    fn add_within_bound() {
        assert_eq!(B.add(Some(8.0), 2.0), (10.0, Signal::NonViolation));
    }

    #[test]
    fn add_past_bound_is_semi_and_unchanged() {
        assert_eq!(B.add(Some(8.0), 3.0), (8.0, Signal::SemiViolation));
        assert_eq!(B.add(Some(8.0), 5.0), (8.0, Signal::SemiViolation));
    }

    #[test]
    fn add_at_bound_is_full() {
        assert_eq!(B.add(Some(10.0), 5.0), (10.0, Signal::FullViolation));
    }

    #[test]
    fn subtract_mirrors_add() {
        assert_eq!(B.subtract(Some(2.0), 2.0), (0.0, Signal::NonViolation));
        assert_eq!(B.subtract(Some(2.0), 3.0), (2.0, Signal::SemiViolation));
        assert_eq!(B.subtract(Some(0.0), 1.0), (0.0, Signal::FullViolation));
    }

    #[test]
    fn undefined_current_passes_delta_through() {
        assert_eq!(Restriction::Unbounded.add(None, 4.0), (4.0, Signal::NonViolation));
        assert_eq!(B.add(None, 40.0), (40.0, Signal::NonViolation));
        assert_eq!(B.subtract(None, 3.0), (-3.0, Signal::NonViolation));
    }

    #[test]
    fn one_sided_bounds_ignore_other_direction() {
        let upper = Restriction::UpperOnly { max: 10.0 };
        assert_eq!(upper.subtract(Some(0.0), 50.0), (-50.0, Signal::NonViolation));
        let lower = Restriction::LowerOnly { min: 0.0 };
        assert_eq!(lower.add(Some(0.0), 50.0), (50.0, Signal::NonViolation));
    }

    #[test]
    fn zero_bound_is_not_absent() {
        let lower = Restriction::from_bounds(None, Some(0.0));
        assert_eq!(lower.subtract(Some(0.0), 1.0), (0.0, Signal::FullViolation));
    }

    #[test]
    fn headroom() {
        assert_eq!(B.headroom_up(8.0), 2.0);
        assert_eq!(B.headroom_down(8.0), 8.0);
        assert!(Restriction::Unbounded.headroom_up(8.0).is_infinite());
    }
}

#[cfg(test)]
mod columns {
    use fleet_core::Coord;

    use crate::{Columns, StateError};

    #[test]
    fn register_is_idempotent() {
        let mut cols = Columns::new();
        let a = cols.register_scalar("battery");
        cols.set(a, 0, Some(3.0));
        let b = cols.register_scalar("battery");
        assert_eq!(a, b);
        assert_eq!(cols.get(a, 0), Some(3.0));
        assert_eq!(cols.scalar_count(), 1);
    }

    #[test]
    fn writes_pad_with_none() {
        let mut cols = Columns::new();
        let a = cols.register_scalar("stock");
        cols.set(a, 3, Some(1.0));
        assert_eq!(cols.scalar(a), &[None, None, None, Some(1.0)]);
        assert_eq!(cols.get(a, 10), None);
    }

    #[test]
    fn unknown_name_is_error() {
        let cols = Columns::new();
        assert!(matches!(cols.scalar_id("nope"), Err(StateError::UnknownColumn(n)) if n == "nope"));
        assert!(cols.coord_id("nope").is_err());
    }

    #[test]
    fn attribute_registers_six_columns() {
        let mut cols = Columns::new();
        let a = cols.register_attribute("battery", 1, Some(100.0), Some(0.0), Some(80.0));
        let names: Vec<_> = cols.scalar_names().collect();
        assert_eq!(
            names,
            ["battery", "max_battery", "min_battery", "init_battery", "signal_battery", "in_time_battery"],
        );
        assert_eq!(cols.get(a.value, 1), Some(80.0));
        assert_eq!(cols.get(a.max, 1), Some(100.0));
        assert_eq!(cols.get(a.value, 0), None);
        assert_eq!(cols.scalar(a.signal).len(), 2);
    }

    #[test]
    fn coord_columns() {
        let mut cols = Columns::new();
        let c = cols.register_coords("c_coord");
        cols.set_coord(c, 1, Coord::new(4, 5));
        assert_eq!(cols.coord(c, 1), Some(Coord::new(4, 5)));
        assert_eq!(cols.coords(c).len(), 2);
        assert_eq!(cols.coord(c, 2), None);
    }
}

#[cfg(test)]
mod tracker {
    use fleet_core::{
        BoundSide, FixedResolver, FleetError, InitParam, Param, RestrictionSpec,
    };

    use super::fixtures::{store_with_vehicles, TABLE};
    use crate::{Group, StateError};

    #[test]
    fn scenario_values_and_signals() {
        let mut s = store_with_vehicles(1);
        let t = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 8.0), &mut FixedResolver)
            .unwrap();

        assert_eq!(s.add_value(t, 5.0), 8.0);
        assert_eq!(s.signal_value(t), Some(TABLE.0[1]));

        assert_eq!(s.add_value(t, 3.0), 8.0);
        assert_eq!(s.signal_value(t), Some(TABLE.0[1]));

        assert_eq!(s.add_value(t, 2.0), 10.0);
        assert_eq!(s.signal_value(t), Some(TABLE.0[0]));

        assert_eq!(s.add_value(t, 5.0), 10.0);
        assert_eq!(s.signal_value(t), Some(TABLE.0[2]));
    }

    #[test]
    fn inactive_attribute_reports_but_does_not_store() {
        let mut s = store_with_vehicles(1);
        let t = s
            .track(Group::Vehicle, "range", 0, &RestrictionSpec::default(), &mut FixedResolver)
            .unwrap();
        assert_eq!(s.add_value(t, 4.0), 4.0);
        assert_eq!(s.value(t), None);
        assert_eq!(s.cur_value(t, -1.0), -1.0);
        assert_eq!(s.signal_value(t), Some(TABLE.non_violation()));
        assert_eq!(s.check_add_value(t, Some(4.0), false), 0.0);
        s.set_to_max(t);
        assert_eq!(s.value(t), None);
    }

    #[test]
    fn init_sentinels() {
        let mut s = store_with_vehicles(2);
        let full = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 50.0, BoundSide::Max), &mut FixedResolver)
            .unwrap();
        let empty = s
            .track(Group::Vehicle, "battery", 1, &RestrictionSpec::bounded(0.0, 50.0, BoundSide::Min), &mut FixedResolver)
            .unwrap();
        assert_eq!(s.value(full), Some(50.0));
        assert_eq!(s.value(empty), Some(0.0));
    }

    #[test]
    fn set_to_bounds() {
        let mut s = store_with_vehicles(1);
        let t = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(1.0, 9.0, 5.0), &mut FixedResolver)
            .unwrap();
        s.set_to_max(t);
        assert_eq!(s.value(t), Some(9.0));
        s.set_to_min(t);
        assert_eq!(s.value(t), Some(1.0));
    }

    #[test]
    fn set_to_missing_bound_is_noop() {
        let mut s = store_with_vehicles(1);
        let spec = RestrictionSpec {
            min:  Some(Param::Value(0.0)),
            init: Some(InitParam::from(3.0)),
            ..RestrictionSpec::default()
        };
        let t = s.track(Group::Vehicle, "cargo", 0, &spec, &mut FixedResolver).unwrap();
        s.set_to_max(t);
        assert_eq!(s.value(t), Some(3.0));
    }

    #[test]
    fn negative_delta_is_treated_as_zero() {
        let mut s = store_with_vehicles(1);
        let t = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 5.0), &mut FixedResolver)
            .unwrap();
        assert_eq!(s.add_value(t, -3.0), 5.0);
        assert_eq!(s.subtract_value(t, f64::NAN), 5.0);
    }

    #[test]
    fn check_then_commit_matches() {
        let mut s = store_with_vehicles(1);
        let t = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 8.0), &mut FixedResolver)
            .unwrap();

        assert_eq!(s.check_add_value(t, Some(5.0), false), 0.0);
        assert_eq!(s.check_add_value(t, None, false), 2.0);
        assert_eq!(s.check_subtract_value(t, None, false), 8.0);

        let before = s.cur_value(t, 0.0);
        let checked = s.check_add_value(t, None, false);
        let after = s.add_value(t, checked);
        assert_eq!(after - before, checked);
        assert_eq!(s.check_add_value(t, Some(1.0), false), 0.0);
    }

    #[test]
    fn rate_clamps_within_frame() {
        let mut s = store_with_vehicles(1);
        let spec = RestrictionSpec::bounded(0.0, 100.0, 0.0).with_rate(5.0);
        let t = s.track(Group::Vehicle, "cargo", 0, &spec, &mut FixedResolver).unwrap();
        assert_eq!(s.time_budget(t), Some(5.0));

        assert_eq!(s.add_value(t, 3.0), 3.0);
        assert_eq!(s.time_budget(t), Some(2.0));
        assert_eq!(s.check_add_value(t, Some(8.0), true), 2.0);
        assert_eq!(s.check_add_value(t, Some(8.0), false), 8.0);

        assert_eq!(s.add_value(t, 4.0), 5.0);
        assert_eq!(s.time_budget(t), Some(0.0));
        assert_eq!(s.add_value(t, 1.0), 5.0);

        s.init_step();
        assert_eq!(s.time_budget(t), Some(5.0));
        assert_eq!(s.add_value(t, 1.0), 6.0);
    }

    #[test]
    fn no_rate_means_no_budget() {
        let mut s = store_with_vehicles(1);
        let t = s
            .track(Group::Vehicle, "cargo", 0, &RestrictionSpec::bounded(0.0, 100.0, 0.0), &mut FixedResolver)
            .unwrap();
        assert_eq!(s.time_budget(t), None);
        assert_eq!(s.add_value(t, 60.0), 60.0);
    }

    #[test]
    fn inverted_bounds_rejected() {
        let mut s = store_with_vehicles(1);
        let err = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(10.0, 0.0, 5.0), &mut FixedResolver)
            .unwrap_err();
        assert!(matches!(err, StateError::Fleet(FleetError::InvertedBounds { .. })));
        assert_eq!(s.tracker_count(), 0);
    }

    #[test]
    fn init_out_of_bounds_rejected() {
        let mut s = store_with_vehicles(1);
        let err = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 11.0), &mut FixedResolver)
            .unwrap_err();
        assert!(matches!(err, StateError::Fleet(FleetError::InitOutOfBounds { .. })));
    }

    #[test]
    fn sentinel_for_missing_bound_rejected() {
        let mut s = store_with_vehicles(1);
        let spec = RestrictionSpec {
            max:  Some(Param::Value(10.0)),
            init: Some(InitParam::Bound(BoundSide::Min)),
            ..RestrictionSpec::default()
        };
        let err = s.track(Group::Vehicle, "battery", 0, &spec, &mut FixedResolver).unwrap_err();
        assert!(matches!(err, StateError::Fleet(FleetError::MissingBound { side: "min", .. })));
    }

    #[test]
    fn random_param_needs_random_resolver() {
        let mut s = store_with_vehicles(1);
        let spec = RestrictionSpec {
            max: Some(Param::Range { low: 5.0, high: 10.0 }),
            ..RestrictionSpec::default()
        };
        assert!(s.track(Group::Vehicle, "battery", 0, &spec, &mut FixedResolver).is_err());
        let mut rng = fleet_core::RngResolver::new(7);
        let t = s.track(Group::Vehicle, "battery", 0, &spec, &mut rng).unwrap();
        let max = s.tracker(t).restriction().max().unwrap();
        assert!((5.0..=10.0).contains(&max));
    }

    #[test]
    fn registration_errors() {
        let mut s = store_with_vehicles(1);
        let spec = RestrictionSpec::bounded(0.0, 10.0, 5.0);
        s.track(Group::Vehicle, "battery", 0, &spec, &mut FixedResolver).unwrap();

        assert!(matches!(
            s.track(Group::Vehicle, "battery", 0, &spec, &mut FixedResolver),
            Err(StateError::DuplicateTracker { slot: 0, .. })
        ));
        assert!(matches!(
            s.track(Group::Vehicle, "battery", 3, &spec, &mut FixedResolver),
            Err(StateError::UnknownEntity { group: "vehicle", slot: 3 })
        ));

        s.register_customer(fleet_core::Coord::new(1, 1));
        assert!(matches!(
            s.track(Group::Customer, "battery", 0, &spec, &mut FixedResolver),
            Err(StateError::GroupConflict { existing: "vehicle", requested: "customer", .. })
        ));
    }

    #[test]
    fn trackers_share_columns() {
        let mut s = store_with_vehicles(2);
        let spec = RestrictionSpec::bounded(0.0, 10.0, 5.0);
        let a = s.track(Group::Vehicle, "battery", 0, &spec, &mut FixedResolver).unwrap();
        let b = s.track(Group::Vehicle, "battery", 1, &spec, &mut FixedResolver).unwrap();
        s.add_value(a, 1.0);
        assert_eq!(s.value(a), Some(6.0));
        assert_eq!(s.value(b), Some(5.0));
        assert_eq!(s.find_tracker("battery", 1), Some(b));
        assert_eq!(s.find_tracker("battery", 2), None);
        assert_eq!(s.attribute_names().collect::<Vec<_>>(), ["battery"]);
    }
}

#[cfg(test)]
mod store {
    use fleet_core::{Coord, CustomerId, DepotId, FixedResolver, FleetError, RestrictionSpec, VehicleId};

    use super::fixtures::{store_with_vehicles, TABLE};
    use crate::{ActionSignal, Group, NodeRef, StateError};

    #[test]
    fn vehicle_flags_seeded() {
        let s = store_with_vehicles(1);
        let f = s.flags();
        assert_eq!(s.flag(f.v_free, 0), Some(1.0));
        assert_eq!(s.flag(f.v_type, 0), Some(1.0));
        assert_eq!(s.flag(f.v_loadable, 0), Some(0.0));
        assert_eq!(s.flag(f.v_loaded, 0), Some(0.0));
        assert_eq!(s.flag(f.range_type, 0), Some(0.0));
        assert_eq!(s.flag(f.speed, 0), Some(1.0));
        assert_eq!(s.vehicle_coord(VehicleId(0)), Some(Coord::new(0, 0)));
        assert!(s.is_free(VehicleId(0)));
    }

    #[test]
    fn node_columns_seeded() {
        let mut s = store_with_vehicles(0);
        let c = s.register_customer(Coord::new(2, 3));
        let d = s.register_depot(Coord::new(9, 9));
        assert_eq!(s.customer_coord(c), Some(Coord::new(2, 3)));
        assert_eq!(s.depot_coord(d), Some(Coord::new(9, 9)));
        assert_eq!(s.flag(s.flags().c_waiting, 0), Some(1.0));
    }

    #[test]
    fn init_step_zeroes_actions_and_signals() {
        let mut s = store_with_vehicles(2);
        let t = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 10.0), &mut FixedResolver)
            .unwrap();
        s.reset_episode();
        s.set_action(ActionSignal::FreeToTravel, VehicleId(1), 1.0);
        s.add_value(t, 1.0);
        assert_eq!(s.signal_value(t), Some(TABLE.0[2]));

        s.init_step();
        assert_eq!(s.actions().get(ActionSignal::FreeToTravel, 1), 0.0);
        assert_eq!(s.actions().vehicle_count(), 2);
        assert_eq!(s.signal_value(t), Some(TABLE.non_violation()));
    }

    #[test]
    fn action_kinds_are_independent() {
        let mut s = store_with_vehicles(1);
        s.reset_episode();
        s.set_action(ActionSignal::CompareCoord, VehicleId(0), 3.0);
        for kind in ActionSignal::ALL {
            let expected = if kind == ActionSignal::CompareCoord { 3.0 } else { 0.0 };
            assert_eq!(s.actions().get(kind, 0), expected, "{kind}");
        }
    }

    #[test]
    fn finish_step_snapshots_signals() {
        let mut s = store_with_vehicles(2);
        let t = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 8.0), &mut FixedResolver)
            .unwrap();
        s.reset_episode();
        s.init_step();
        s.add_value(t, 3.0);
        s.set_action(ActionSignal::FreeToTravel, VehicleId(0), 1.0);

        let snap = s.finish_step();
        assert_eq!(snap.attribute("battery"), Some(&[Some(0.5), None][..]));
        assert_eq!(snap.attribute("range"), None);
        assert_eq!(snap.actions.get(ActionSignal::FreeToTravel, 0), 1.0);
    }

    #[test]
    fn registered_attribute_joins_the_snapshot() {
        let mut s = store_with_vehicles(2);
        let cols = s.register_attribute(Group::Vehicle, "payload", 1, Some(5.0), Some(0.0), Some(2.0)).unwrap();
        assert_eq!(s.flag(cols.value, 1), Some(2.0));
        assert_eq!(s.find_tracker("payload", 1), None);
        assert_eq!(s.attribute_names().collect::<Vec<_>>(), ["payload"]);

        let snap = s.finish_step();
        assert_eq!(snap.attribute("payload"), Some(&[None, None][..]));
    }

    #[test]
    fn registered_attribute_is_checked_like_a_tracker() {
        let mut s = store_with_vehicles(1);
        let err = s.register_attribute(Group::Vehicle, "payload", 0, Some(0.0), Some(5.0), None).unwrap_err();
        assert!(matches!(err, StateError::Fleet(FleetError::InvertedBounds { .. })));
        let err = s.register_attribute(Group::Vehicle, "payload", 3, None, None, None).unwrap_err();
        assert!(matches!(err, StateError::UnknownEntity { .. }));
        assert_eq!(s.attribute_names().count(), 0);

        s.register_customer(Coord::new(1, 1));
        s.track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 10.0), &mut FixedResolver)
            .unwrap();
        let err = s.register_attribute(Group::Customer, "battery", 0, None, None, None).unwrap_err();
        assert!(matches!(err, StateError::GroupConflict { .. }));
        let err = s.register_attribute(Group::Vehicle, "battery", 0, Some(1.0), None, None).unwrap_err();
        assert!(matches!(err, StateError::DuplicateTracker { .. }));
    }

    #[test]
    fn reset_episode_restores_state() {
        let mut s = store_with_vehicles(2);
        let c = s.register_customer(Coord::new(5, 5));
        let t = s
            .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, 8.0), &mut FixedResolver)
            .unwrap();
        s.reset_episode();

        s.subtract_value(t, 6.0);
        s.set_vehicle_coord(VehicleId(0), Coord::new(5, 5));
        s.mark_visited(VehicleId(0), NodeRef::Customer(c));
        s.push_transported(VehicleId(0), VehicleId(1));
        let f = s.flags();
        s.set_flag(f.c_waiting, 0, 0.0);
        s.set_flag(f.v_free, 1, 0.0);

        s.reset_episode();
        assert_eq!(s.value(t), Some(8.0));
        assert_eq!(s.vehicle_coord(VehicleId(0)), Some(Coord::new(0, 0)));
        assert!(s.visited(VehicleId(0)).is_empty());
        assert!(s.transported_by(VehicleId(0)).is_empty());
        assert_eq!(s.flag(f.c_waiting, 0), Some(1.0));
        assert!(s.is_free(VehicleId(1)));
        assert_eq!(s.counts().vehicles, 2);
        assert_eq!(s.counts().nodes(), 1);
    }

    #[test]
    fn transport_list_is_fifo() {
        let mut s = store_with_vehicles(4);
        let m = VehicleId(0);
        s.push_transported(m, VehicleId(1));
        s.push_transported(m, VehicleId(2));
        s.push_transported(m, VehicleId(3));
        assert!(s.remove_transported(m, VehicleId(2)));
        assert!(!s.remove_transported(m, VehicleId(2)));
        assert_eq!(s.transported_by(m), &[VehicleId(1), VehicleId(3)]);
        assert!(s.transported_by(VehicleId(9)).is_empty());
    }

    #[test]
    fn visits_recorded_once() {
        let mut s = store_with_vehicles(1);
        let v = VehicleId(0);
        s.mark_visited(v, NodeRef::Depot(DepotId(0)));
        s.mark_visited(v, NodeRef::Depot(DepotId(0)));
        s.mark_visited(v, NodeRef::Customer(CustomerId(0)));
        assert_eq!(s.visited(v).len(), 2);
    }
}

#[cfg(test)]
mod index {
    use fleet_core::{Coord, CustomerId, DepotId, FixedResolver, RestrictionSpec, VehicleId};

    use super::fixtures::store_with_vehicles;
    use crate::{nearest, Filter, Group, NodeRef, StateError, Target};

    #[test]
    fn nearest_picks_minimum() {
        let cands = [Coord::new(3, 0), Coord::new(0, 3), Coord::new(1, 1)];
        assert_eq!(nearest(Coord::new(0, 0), &cands, |_| true), Some(2));
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let cands = [Coord::new(5, 5), Coord::new(2, 0), Coord::new(0, 2), Coord::new(1, 1)];
        assert_eq!(nearest(Coord::new(0, 0), &cands, |_| true), Some(1));
    }

    #[test]
    fn nothing_admitted() {
        let cands = [Coord::new(1, 0)];
        assert_eq!(nearest(Coord::new(0, 0), &cands, |_| false), None);
        assert_eq!(nearest(Coord::new(0, 0), &[], |_| true), None);
    }

    #[test]
    fn exclude_visited() {
        let mut s = store_with_vehicles(1);
        s.register_customer(Coord::new(1, 0));
        s.register_customer(Coord::new(2, 0));
        s.register_depot(Coord::new(0, 1));
        let v = VehicleId(0);

        // A depot visit with the same slot does not hide customer 0.
        s.mark_visited(v, NodeRef::Depot(DepotId(0)));
        assert_eq!(s.nearest_neighbour(v, Target::Customers, true), Some(0));
        assert_eq!(s.nearest_neighbour(v, Target::Depots, true), None);
        assert_eq!(s.nearest_neighbour(v, Target::Depots, false), Some(0));

        s.mark_visited(v, NodeRef::Customer(CustomerId(0)));
        assert_eq!(s.nearest_neighbour(v, Target::Customers, true), Some(1));
        assert_eq!(s.nearest_neighbour(v, Target::Customers, false), Some(0));
    }

    #[test]
    fn query_is_idempotent() {
        let mut s = store_with_vehicles(1);
        for x in [4, 2, 7] {
            s.register_customer(Coord::new(x, x));
        }
        let v = VehicleId(0);
        let first = s.nearest_neighbour(v, Target::Customers, true);
        assert_eq!(first, Some(1));
        assert_eq!(s.nearest_neighbour(v, Target::Customers, true), first);
    }

    #[test]
    fn unknown_vehicle_has_no_neighbour() {
        let mut s = store_with_vehicles(0);
        s.register_customer(Coord::new(1, 1));
        assert_eq!(s.nearest_neighbour(VehicleId(3), Target::Customers, false), None);
    }

    #[test]
    fn filtered_by_columns() {
        let mut s = store_with_vehicles(1);
        for x in 1..=3 {
            let c = s.register_customer(Coord::new(x, 0));
            let init = if x == 1 { 0.0 } else { 5.0 };
            s.track(Group::Customer, "demand", c.index(), &RestrictionSpec::bounded(0.0, 5.0, init), &mut FixedResolver)
                .unwrap();
        }
        let waiting = s.flags().c_waiting;
        s.set_flag(waiting, 1, 0.0);

        let filter = Filter::new()
            .include("c_waiting", 1.0)
            .exclude("demand", 0.0)
            .resolve(s.columns())
            .unwrap();
        assert!(!filter.admits(s.columns(), 0));
        assert!(!filter.admits(s.columns(), 1));
        assert!(filter.admits(s.columns(), 2));
        assert_eq!(s.nearest_filtered(VehicleId(0), Target::Customers, &filter, false), Some(2));
    }

    #[test]
    fn filter_on_unknown_column() {
        let s = store_with_vehicles(0);
        let err = Filter::new().include("stock", 1.0).resolve(s.columns()).unwrap_err();
        assert!(matches!(err, StateError::UnknownColumn(n) if n == "stock"));
    }
}

#[cfg(test)]
mod proptests {
    use fleet_core::{Coord, FixedResolver, InitParam, Param, RestrictionSpec};
    use proptest::prelude::*;

    use super::fixtures::store_with_vehicles;
    use crate::{nearest, Group};

    fn arb_ops() -> impl Strategy<Value = Vec<(bool, f64)>> {
        prop::collection::vec((any::<bool>(), 0.0f64..20.0), 0..64)
    }

    proptest! {
        #[test]
        fn bounded_value_stays_in_bounds(init in 0.0f64..=10.0, ops in arb_ops()) {
            let mut s = store_with_vehicles(1);
            let t = s
                .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, init), &mut FixedResolver)
                .unwrap();
            for (add, d) in ops {
                let v = if add { s.add_value(t, d) } else { s.subtract_value(t, d) };
                prop_assert!((0.0..=10.0).contains(&v));
                prop_assert_eq!(s.value(t), Some(v));
            }
        }

        #[test]
        fn frame_throughput_never_exceeds_rate(rate in 0.0f64..10.0, ops in arb_ops()) {
            let mut s = store_with_vehicles(1);
            let spec = RestrictionSpec {
                init: Some(InitParam::from(0.0)),
                rate: Some(Param::Value(rate)),
                ..RestrictionSpec::default()
            };
            let t = s.track(Group::Vehicle, "cargo", 0, &spec, &mut FixedResolver).unwrap();

            let mut moved = 0.0;
            for (add, d) in ops {
                let before = s.cur_value(t, 0.0);
                let after = if add { s.add_value(t, d) } else { s.subtract_value(t, d) };
                moved += (after - before).abs();
            }
            prop_assert!(moved <= rate + 1e-9);

            s.init_step();
            prop_assert_eq!(s.time_budget(t), Some(rate));
        }

        #[test]
        fn check_predicts_commit(init in 0.0f64..=10.0, d in 0.0f64..20.0, add in any::<bool>()) {
            let mut s = store_with_vehicles(1);
            let t = s
                .track(Group::Vehicle, "battery", 0, &RestrictionSpec::bounded(0.0, 10.0, init), &mut FixedResolver)
                .unwrap();
            let before = s.cur_value(t, 0.0);
            let (checked, after) = if add {
                (s.check_add_value(t, Some(d), true), s.add_value(t, d))
            } else {
                (s.check_subtract_value(t, Some(d), true), s.subtract_value(t, d))
            };
            prop_assert_eq!((after - before).abs(), checked);
        }

        #[test]
        fn nearest_is_minimal_and_lowest(
            pts in prop::collection::vec((-20i32..20, -20i32..20), 0..32),
            banned in prop::collection::vec(any::<bool>(), 32),
        ) {
            let from = Coord::new(0, 0);
            let cands: Vec<Coord> = pts.into_iter().map(|(x, y)| Coord::new(x, y)).collect();
            match nearest(from, &cands, |i| !banned[i]) {
                None => prop_assert!((0..cands.len()).all(|i| banned[i])),
                Some(best) => {
                    prop_assert!(!banned[best]);
                    let d = from.manhattan(cands[best]);
                    for (i, c) in cands.iter().enumerate() {
                        if banned[i] {
                            continue;
                        }
                        prop_assert!(from.manhattan(*c) >= d);
                        if i < best {
                            prop_assert!(from.manhattan(*c) > d);
                        }
                    }
                }
            }
        }
    }
}
