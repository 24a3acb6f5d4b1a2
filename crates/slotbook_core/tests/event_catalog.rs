use chrono::{NaiveDate, NaiveTime};
use slotbook_core::{CatalogConfig, CatalogError, EventCatalog, EventState, ReminderKind};
use uuid::Uuid;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 14).unwrap()
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 15).unwrap()
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn held_starts(catalog: &EventCatalog, id: Uuid) -> Vec<NaiveTime> {
    catalog
        .reserved_slots(id)
        .unwrap()
        .into_iter()
        .map(|slot| slot.start)
        .collect()
}

#[test]
fn book_conflict_delete_rebook_scenario() {
    let catalog = EventCatalog::new();
    assert_eq!(catalog.grid().len(), 96);

    let a = catalog
        .create_event("planning", "quarterly", monday(), hm(9, 0), hm(10, 0))
        .unwrap();
    assert_eq!(
        held_starts(&catalog, a),
        vec![hm(9, 0), hm(9, 15), hm(9, 30), hm(9, 45)]
    );

    let err = catalog
        .create_event("sync", "", monday(), hm(9, 30), hm(9, 45))
        .unwrap_err();
    match err {
        CatalogError::SlotConflict(conflict) => {
            assert_eq!(conflict.occupant, a);
            assert_eq!(conflict.slot.start, hm(9, 30));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(held_starts(&catalog, a).len(), 4);
    assert_eq!(catalog.list_events(monday()).len(), 1);

    catalog.delete_event(a).unwrap();
    for minute in [0, 15, 30, 45] {
        assert_eq!(catalog.occupant_at(monday(), hm(9, minute)), None);
    }
    assert_eq!(catalog.delete_event(a).unwrap_err(), CatalogError::EventNotFound(a));

    let b = catalog
        .create_event("sync", "", monday(), hm(9, 30), hm(9, 45))
        .unwrap();
    assert_eq!(catalog.occupant_at(monday(), hm(9, 30)), Some(b));
}

#[test]
fn create_validates_title_and_range() {
    let catalog = EventCatalog::new();

    let err = catalog
        .create_event("   ", "", monday(), hm(9, 0), hm(10, 0))
        .unwrap_err();
    assert_eq!(err, CatalogError::EmptyTitle);

    let err = catalog
        .create_event("x", "", monday(), hm(10, 0), hm(9, 0))
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::InvalidRange {
            start: hm(10, 0),
            end: hm(9, 0),
        }
    );
    assert!(catalog.is_empty());
}

#[test]
fn create_with_id_rejects_duplicates_and_nil() {
    let catalog = EventCatalog::new();
    let id = Uuid::new_v4();
    catalog
        .create_event_with_id(id, "import", "", monday(), hm(7, 0), hm(7, 30))
        .unwrap();

    let err = catalog
        .create_event_with_id(id, "again", "", tuesday(), hm(7, 0), hm(7, 30))
        .unwrap_err();
    assert_eq!(err, CatalogError::DuplicateEventId(id));
    assert!(catalog.list_events(tuesday()).is_empty());

    let err = catalog
        .create_event_with_id(Uuid::nil(), "nil", "", monday(), hm(8, 0), hm(9, 0))
        .unwrap_err();
    assert_eq!(err, CatalogError::NilEventId);
}

#[test]
fn update_to_free_range_moves_slots() {
    let catalog = EventCatalog::new();
    let id = catalog
        .create_event("1:1", "", monday(), hm(9, 0), hm(10, 0))
        .unwrap();

    catalog.update_event_time(id, hm(14, 0), hm(14, 30)).unwrap();

    assert_eq!(catalog.occupant_at(monday(), hm(9, 0)), None);
    assert_eq!(held_starts(&catalog, id), vec![hm(14, 0), hm(14, 15)]);
    let event = catalog.get_event(id).unwrap();
    assert_eq!((event.start_at, event.end_at), (hm(14, 0), hm(14, 30)));
    assert_eq!(event.state, EventState::Scheduled);
}

#[test]
fn update_to_conflicting_range_is_fail_open() {
    let catalog = EventCatalog::new();
    let a = catalog
        .create_event("a", "", monday(), hm(9, 0), hm(10, 0))
        .unwrap();
    let b = catalog
        .create_event("b", "", monday(), hm(10, 0), hm(11, 0))
        .unwrap();

    let err = catalog.update_event_time(a, hm(10, 30), hm(11, 30)).unwrap_err();
    match err {
        CatalogError::ReservationLost { event_id, conflict } => {
            assert_eq!(event_id, a);
            assert_eq!(conflict.occupant, b);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(catalog.reserved_slots(a).unwrap().is_empty());
    assert_eq!(catalog.reserved_slots(b).unwrap().len(), 4);

    let stale = catalog.get_event(a).unwrap();
    assert_eq!(stale.state, EventState::Unreserved);
    assert_eq!((stale.start_at, stale.end_at), (hm(9, 0), hm(10, 0)));

    // Unreserved events hold nothing to release but can still be deleted.
    catalog.delete_event(a).unwrap();
    assert!(catalog.get_event(a).is_none());
}

#[test]
fn update_rejects_invalid_range_without_touching_slots() {
    let catalog = EventCatalog::new();
    let id = catalog
        .create_event("a", "", monday(), hm(9, 0), hm(10, 0))
        .unwrap();

    let err = catalog.update_event_time(id, hm(12, 0), hm(12, 0)).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidRange { .. }));
    assert_eq!(held_starts(&catalog, id).len(), 4);

    let missing = Uuid::new_v4();
    let err = catalog
        .update_event_time(missing, hm(12, 0), hm(13, 0))
        .unwrap_err();
    assert_eq!(err, CatalogError::EventNotFound(missing));
}

#[test]
fn reschedule_moves_event_between_days() {
    let catalog = EventCatalog::new();
    let id = catalog
        .create_event("offsite", "", monday(), hm(9, 0), hm(12, 0))
        .unwrap();

    catalog
        .reschedule_event(id, tuesday(), hm(13, 0), hm(14, 0))
        .unwrap();

    assert!(catalog.list_events(monday()).is_empty());
    assert_eq!(catalog.dates(), vec![tuesday()]);
    let event = catalog.get_event(id).unwrap();
    assert_eq!(event.date, tuesday());
    assert_eq!(catalog.occupant_at(tuesday(), hm(13, 45)), Some(id));
}

#[test]
fn reschedule_conflict_on_target_day_keeps_event_on_source_day_unreserved() {
    let catalog = EventCatalog::new();
    let id = catalog
        .create_event("offsite", "", monday(), hm(9, 0), hm(12, 0))
        .unwrap();
    let blocker = catalog
        .create_event("blocker", "", tuesday(), hm(9, 0), hm(12, 0))
        .unwrap();

    let err = catalog
        .reschedule_event(id, tuesday(), hm(11, 0), hm(13, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::ReservationLost { event_id, conflict }
            if event_id == id && conflict.occupant == blocker
    ));

    let event = catalog.get_event(id).unwrap();
    assert_eq!(event.date, monday());
    assert_eq!(event.state, EventState::Unreserved);
    assert_eq!(catalog.occupant_at(monday(), hm(9, 0)), None);
    assert_eq!(catalog.list_events(monday()).len(), 1);
}

#[test]
fn reminders_are_added_and_removed_by_index() {
    let catalog = EventCatalog::new();
    let id = catalog
        .create_event("dentist", "", monday(), hm(15, 0), hm(16, 0))
        .unwrap();
    let at = monday().and_time(hm(14, 0));

    assert_eq!(catalog.add_reminder(id, at, ReminderKind::Email).unwrap(), 0);
    assert_eq!(catalog.add_reminder(id, at, ReminderKind::System).unwrap(), 1);

    let err = catalog.remove_reminder(id, 2).unwrap_err();
    assert_eq!(
        err,
        CatalogError::ReminderNotFound {
            event_id: id,
            index: 2,
        }
    );
    assert_eq!(catalog.get_event(id).unwrap().reminders.len(), 2);

    let removed = catalog.remove_reminder(id, 0).unwrap();
    assert_eq!(removed.kind, ReminderKind::Email);
    let reminders = catalog.get_event(id).unwrap().reminders;
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].kind, ReminderKind::System);

    let missing = Uuid::new_v4();
    assert_eq!(
        catalog.add_reminder(missing, at, ReminderKind::Email).unwrap_err(),
        CatalogError::EventNotFound(missing)
    );
}

#[test]
fn list_events_keeps_insertion_order_and_is_restartable() {
    let catalog = EventCatalog::new();
    let late = catalog
        .create_event("late", "", monday(), hm(18, 0), hm(19, 0))
        .unwrap();
    let early = catalog
        .create_event("early", "", monday(), hm(7, 0), hm(8, 0))
        .unwrap();

    let events = catalog.list_events(monday());
    let first_pass = events.iter().map(|event| event.id).collect::<Vec<_>>();
    let second_pass = events.iter().map(|event| event.id).collect::<Vec<_>>();
    assert_eq!(first_pass, vec![late, early]);
    assert_eq!(first_pass, second_pass);
    assert!(catalog.list_events(tuesday()).is_empty());
}

#[test]
fn configured_granularity_drives_slot_math() {
    let config = CatalogConfig::from_json_str(r#"{"slot_minutes": 30}"#).unwrap();
    let catalog = EventCatalog::with_config(&config).unwrap();
    assert_eq!(catalog.grid().len(), 48);

    let id = catalog
        .create_event("half hours", "", monday(), hm(9, 0), hm(10, 0))
        .unwrap();
    assert_eq!(held_starts(&catalog, id), vec![hm(9, 0), hm(9, 30)]);

    let err = catalog
        .create_event("too short", "", monday(), hm(11, 5), hm(11, 25))
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidRange { .. }));
}

#[test]
fn reschedule_on_the_same_date_updates_in_place() {
    let catalog = EventCatalog::new();
    let id = catalog
        .create_event("standup", "daily", monday(), hm(9, 0), hm(9, 30))
        .unwrap();
    let other = catalog
        .create_event("review", "", monday(), hm(15, 0), hm(16, 0))
        .unwrap();

    catalog
        .reschedule_event(id, monday(), hm(10, 0), hm(10, 30))
        .unwrap();
    assert_eq!(held_starts(&catalog, id), vec![hm(10, 0), hm(10, 15)]);
    assert_eq!(catalog.occupant_at(monday(), hm(9, 0)), None);
    let moved = catalog.get_event(id).unwrap();
    assert_eq!(moved.date, monday());
    assert_eq!((moved.start_at, moved.end_at), (hm(10, 0), hm(10, 30)));
    assert_eq!(moved.state, EventState::Scheduled);

    let err = catalog
        .reschedule_event(id, monday(), hm(15, 30), hm(16, 30))
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::ReservationLost { event_id, conflict }
            if event_id == id && conflict.occupant == other
    ));
    assert!(catalog.reserved_slots(id).unwrap().is_empty());
    assert_eq!(held_starts(&catalog, other).len(), 4);

    let stale = catalog.get_event(id).unwrap();
    assert_eq!(stale.state, EventState::Unreserved);
    assert_eq!(stale.date, monday());
    assert_eq!((stale.start_at, stale.end_at), (hm(10, 0), hm(10, 30)));
    assert_eq!(stale.description, "daily");
    assert_eq!(catalog.list_events(monday()).len(), 2);
}
