use super::*;
use crate::clock::ClockTime;
use crate::persistence::tests::BrokenBackend;
use crate::persistence::{EVENTS_KEY, MemoryBackend, TEMPLATES_KEY};

fn t(s: &str) -> ClockTime {
    s.parse().unwrap()
}

fn new_event(title: &str, start: &str, end: &str) -> NewEvent {
    NewEvent {
        id: None,
        title: title.to_string(),
        start_time: t(start),
        end_time: t(end),
        icon_key: "star".into(),
        color: "var(--accent-blue)".into(),
    }
}

fn record(id: &str, start: &str, end: &str) -> Event {
    Event {
        id: EventId::from(id),
        title: id.to_string(),
        start_time: t(start),
        end_time: t(end),
        duration_minutes: 0,
        icon_key: "book".into(),
        color: "#5856d6".into(),
        is_completed: false,
    }
}

fn empty_store() -> (EventStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = EventStore::with_events(backend.clone(), Arc::new(ChangeHub::new()), Vec::new());
    (store, backend)
}

fn is_sorted(store: &EventStore) -> bool {
    store
        .events()
        .windows(2)
        .all(|w| w[0].start_time <= w[1].start_time)
}

fn starts(store: &EventStore) -> Vec<String> {
    store.events().iter().map(|e| e.start_time.to_string()).collect()
}

// ── Opening ──────────────────────────────────────────────

#[test]
fn open_without_data_uses_seed() {
    let backend = Arc::new(MemoryBackend::new());
    let store = EventStore::open(backend, Arc::new(ChangeHub::new()));
    assert_eq!(store.events(), seed_events().as_slice());
    assert!(store.templates().is_empty());
    assert_eq!(store.version(), 0);
}

#[test]
fn open_with_malformed_data_uses_defaults() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set(EVENTS_KEY, "not json at all").unwrap();
    backend.set(TEMPLATES_KEY, "[1, 2, 3]").unwrap();
    let store = EventStore::open(backend, Arc::new(ChangeHub::new()));
    assert_eq!(store.len(), seed_events().len());
    assert!(store.templates().is_empty());
}

#[test]
fn open_with_unreadable_backend_uses_defaults() {
    let store = EventStore::open(Arc::new(BrokenBackend), Arc::new(ChangeHub::new()));
    assert_eq!(store.len(), 4);
}

#[test]
fn open_normalizes_saved_events() {
    let backend = Arc::new(MemoryBackend::new());
    let saved = vec![record("b", "10:00", "09:00"), record("a", "08:00", "08:45")];
    backend
        .set(EVENTS_KEY, &serde_json::to_string(&saved).unwrap())
        .unwrap();
    let store = EventStore::open(backend, Arc::new(ChangeHub::new()));
    assert_eq!(starts(&store), ["08:00", "10:00"]);
    assert_eq!(store.events()[0].duration_minutes, 45);
    assert_eq!(store.events()[1].duration_minutes, FALLBACK_DURATION_MINUTES);
}

#[test]
fn reassigned_ids_are_stable_across_opens() {
    let backend = Arc::new(MemoryBackend::new());
    let saved = vec![
        record("dup", "08:00", "09:00"),
        record("dup", "10:00", "11:00"),
        record("", "12:00", "13:00"),
    ];
    backend
        .set(EVENTS_KEY, &serde_json::to_string(&saved).unwrap())
        .unwrap();

    let first = EventStore::open(backend.clone(), Arc::new(ChangeHub::new()));
    let ids: Vec<EventId> = first.events().iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids[0], EventId::from("dup"));
    assert_ne!(ids[1], EventId::from("dup"));
    assert!(!ids[2].as_str().is_empty());

    let second = EventStore::open(backend, Arc::new(ChangeHub::new()));
    let reopened: Vec<EventId> = second.events().iter().map(|e| e.id.clone()).collect();
    assert_eq!(reopened, ids);
    assert!(second.get(&ids[1]).is_some());
}

#[test]
fn clean_load_is_not_rewritten() {
    let backend = Arc::new(MemoryBackend::new());
    let raw = serde_json::to_string(&vec![record("a", "08:00", "09:00")]).unwrap();
    backend.set(EVENTS_KEY, &raw).unwrap();
    let _store = EventStore::open(backend.clone(), Arc::new(ChangeHub::new()));
    assert_eq!(backend.get(EVENTS_KEY).unwrap().as_deref(), Some(raw.as_str()));
}

#[test]
fn empty_saved_collection_is_kept_empty() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set(EVENTS_KEY, "[]").unwrap();
    let store = EventStore::open(backend, Arc::new(ChangeHub::new()));
    assert!(store.is_empty());
}

// ── add ──────────────────────────────────────────────────

#[test]
fn add_assigns_id_and_sorts() {
    let (mut store, _) = empty_store();
    let late = store.add(new_event("Lunch", "12:00", "13:00")).unwrap();
    let early = store.add(new_event("Run", "06:30", "07:15")).unwrap();
    assert_ne!(late, early);
    assert_eq!(starts(&store), ["06:30", "12:00"]);
    assert_eq!(store.get(&early).unwrap().duration_minutes, 45);
    assert!(!store.get(&early).unwrap().is_completed);
}

#[test]
fn add_keeps_explicit_id() {
    let (mut store, _) = empty_store();
    let mut ev = new_event("Run", "06:30", "07:15");
    ev.id = Some(EventId::from("run"));
    assert_eq!(store.add(ev.clone()).unwrap(), EventId::from("run"));
    assert_eq!(store.add(ev), Err(StoreError::AlreadyExists(EventId::from("run"))));
    assert_eq!(store.len(), 1);
}

#[test]
fn add_rejects_empty_title_and_id() {
    let (mut store, _) = empty_store();
    assert_eq!(store.add(new_event("   ", "06:30", "07:15")), Err(StoreError::EmptyTitle));
    let mut ev = new_event("Run", "06:30", "07:15");
    ev.id = Some(EventId::from(""));
    assert_eq!(store.add(ev), Err(StoreError::EmptyId));
    assert!(store.is_empty());
    assert_eq!(store.version(), 0);
}

#[test]
fn add_with_inverted_times_falls_back_to_thirty_minutes() {
    let (mut store, _) = empty_store();
    let id = store.add(new_event("Late", "23:00", "01:00")).unwrap();
    assert_eq!(store.get(&id).unwrap().duration_minutes, 30);
    let id = store.add(new_event("Blink", "10:00", "10:00")).unwrap();
    assert_eq!(store.get(&id).unwrap().duration_minutes, 30);
}

#[test]
fn add_sort_is_stable_for_equal_starts() {
    let (mut store, _) = empty_store();
    let first = store.add(new_event("First", "09:00", "10:00")).unwrap();
    let second = store.add(new_event("Second", "09:00", "09:30")).unwrap();
    let ids: Vec<&EventId> = store.events().iter().map(|e| &e.id).collect();
    assert_eq!(ids, [&first, &second]);
}

// ── update ───────────────────────────────────────────────

#[test]
fn update_resorts_and_rederives() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    store.add(new_event("B", "10:00", "11:00")).unwrap();

    let mut upd = EventUpdate::from(store.get(&a).unwrap());
    upd.start_time = t("12:00");
    upd.end_time = t("12:20");
    store.update(&a, upd).unwrap();

    assert_eq!(starts(&store), ["10:00", "12:00"]);
    assert_eq!(store.get(&a).unwrap().duration_minutes, 20);
}

#[test]
fn update_preserves_completion_unless_set() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    store.toggle_completion(&a).unwrap();

    let mut upd = EventUpdate::from(store.get(&a).unwrap());
    upd.title = "Renamed".into();
    store.update(&a, upd.clone()).unwrap();
    assert!(store.get(&a).unwrap().is_completed);
    assert_eq!(store.get(&a).unwrap().title, "Renamed");

    upd.is_completed = Some(false);
    store.update(&a, upd).unwrap();
    assert!(!store.get(&a).unwrap().is_completed);
}

#[test]
fn update_with_inverted_times_falls_back() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    let mut upd = EventUpdate::from(store.get(&a).unwrap());
    upd.end_time = t("07:00");
    store.update(&a, upd).unwrap();
    assert_eq!(store.get(&a).unwrap().duration_minutes, 30);
}

#[test]
fn update_unknown_or_blank_is_rejected() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    let upd = EventUpdate::from(store.get(&a).unwrap());
    let ghost = EventId::from("ghost");
    assert_eq!(store.update(&ghost, upd.clone()), Err(StoreError::NotFound(ghost)));

    let mut blank = upd;
    blank.title = String::new();
    assert_eq!(store.update(&a, blank), Err(StoreError::EmptyTitle));
    assert_eq!(store.get(&a).unwrap().title, "A");
}

// ── delete / toggle / clear ──────────────────────────────

#[test]
fn delete_removes_and_keeps_order() {
    let (mut store, _) = empty_store();
    store.add(new_event("A", "08:00", "09:00")).unwrap();
    let b = store.add(new_event("B", "10:00", "11:00")).unwrap();
    store.add(new_event("C", "12:00", "13:00")).unwrap();

    let removed = store.delete(&b).unwrap();
    assert_eq!(removed.title, "B");
    assert_eq!(starts(&store), ["08:00", "12:00"]);
    assert_eq!(store.delete(&b), Err(StoreError::NotFound(b)));
}

#[test]
fn toggle_flips_back_and_forth() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    assert_eq!(store.toggle_completion(&a), Ok(true));
    assert_eq!(store.toggle_completion(&a), Ok(false));
    assert!(store.toggle_completion(&EventId::from("nope")).is_err());
}

#[test]
fn clear_empties_events_but_keeps_templates() {
    let (mut store, _) = empty_store();
    store.add(new_event("A", "08:00", "09:00")).unwrap();
    store.save_as_template("Weekday").unwrap();
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.templates().len(), 1);
}

// ── import ───────────────────────────────────────────────

#[test]
fn import_replaces_and_sorts() {
    let (mut store, _) = empty_store();
    store.add(new_event("Old", "05:00", "06:00")).unwrap();

    let count = store.import_events(vec![
        record("3", "14:00", "15:30"),
        record("1", "07:30", "08:30"),
        record("2", "09:00", "11:00"),
    ]);
    assert_eq!(count, 3);
    assert_eq!(starts(&store), ["07:30", "09:00", "14:00"]);
    assert_eq!(store.events()[0].id, EventId::from("1"));
    assert_eq!(store.events()[0].duration_minutes, 60);
    assert_eq!(store.events()[2].duration_minutes, 90);
}

#[test]
fn import_regenerates_repeated_and_empty_ids() {
    let (mut store, _) = empty_store();
    store.import_events(vec![
        record("dup", "07:00", "08:00"),
        record("dup", "09:00", "10:00"),
        record("", "11:00", "12:00"),
    ]);
    let ids: HashSet<&EventId> = store.events().iter().map(|e| &e.id).collect();
    assert_eq!(ids.len(), 3);
    // First holder keeps the id.
    assert_eq!(store.events()[0].id, EventId::from("dup"));
    assert!(store.events().iter().all(|e| !e.id.as_str().is_empty()));
}

#[test]
fn import_nothing_empties_collection() {
    let (mut store, _) = empty_store();
    store.add(new_event("A", "08:00", "09:00")).unwrap();
    assert_eq!(store.import_events(Vec::new()), 0);
    assert!(store.is_empty());
}

// ── templates ────────────────────────────────────────────

#[test]
fn save_template_snapshots_stored_order_and_display_fields() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    store.add(new_event("B", "10:00", "11:00")).unwrap();
    store.toggle_completion(&a).unwrap();

    let id = store.save_as_template("  Weekday ").unwrap();
    let tpl = store.template(&id).unwrap();
    assert_eq!(tpl.name, "Weekday");
    let titles: Vec<&str> = tpl.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["A", "B"]);
    assert_eq!(tpl.events[0].start_time, t("08:00"));
}

#[test]
fn save_template_rejects_blank_name() {
    let (mut store, _) = empty_store();
    assert_eq!(store.save_as_template(" "), Err(StoreError::EmptyTemplateName));
}

#[test]
fn template_keeps_creation_order() {
    let (mut store, _) = empty_store();
    store.add(new_event("A", "08:00", "09:00")).unwrap();
    let id = store.save_as_template("T").unwrap();
    // Hand-built out-of-order template entries stay as they are.
    store.templates[0].events.insert(0, EventTemplate {
        title: "Late".into(),
        start_time: t("20:00"),
        end_time: t("21:00"),
        icon_key: "music".into(),
        color: "#ffcc00".into(),
    });
    let tpl = store.template(&id).unwrap();
    assert_eq!(tpl.events[0].title, "Late");
}

#[test]
fn apply_template_materializes_fresh_sorted_events() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    store.add(new_event("Inverted", "10:00", "09:30")).unwrap();
    store.toggle_completion(&a).unwrap();
    let tpl = store.save_as_template("Weekday").unwrap();
    store.templates[0].events.reverse();

    store.clear();
    store.add(new_event("Other", "05:00", "06:00")).unwrap();

    assert_eq!(store.apply_template(&tpl), Ok(2));
    assert_eq!(starts(&store), ["08:00", "10:00"]);
    assert!(store.events().iter().all(|e| !e.is_completed));
    assert!(store.get(&a).is_none(), "ids must be fresh");
    assert_eq!(store.events()[1].duration_minutes, 30);
}

#[test]
fn apply_unknown_template_is_rejected() {
    let (mut store, _) = empty_store();
    store.add(new_event("A", "08:00", "09:00")).unwrap();
    let ghost = TemplateId::from("ghost");
    assert_eq!(store.apply_template(&ghost), Err(StoreError::TemplateNotFound(ghost)));
    assert_eq!(store.len(), 1);
}

#[test]
fn delete_template() {
    let (mut store, _) = empty_store();
    let id = store.save_as_template("Empty day").unwrap();
    assert_eq!(store.delete_template(&id).unwrap().name, "Empty day");
    assert!(store.templates().is_empty());
    assert!(store.delete_template(&id).is_err());
}

// ── persistence, versioning, notification ────────────────

#[test]
fn every_mutation_persists() {
    let (mut store, backend) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    let saved = crate::persistence::load_events(backend.as_ref()).unwrap();
    assert_eq!(saved, store.snapshot());

    store.toggle_completion(&a).unwrap();
    let saved = crate::persistence::load_events(backend.as_ref()).unwrap();
    assert!(saved[0].is_completed);

    store.save_as_template("T").unwrap();
    let saved = crate::persistence::load_templates(backend.as_ref()).unwrap();
    assert_eq!(saved.len(), 1);

    store.clear();
    let saved = crate::persistence::load_events(backend.as_ref()).unwrap();
    assert!(saved.is_empty());
}

#[test]
fn reopen_sees_saved_state() {
    let (mut store, backend) = empty_store();
    store.add(new_event("A", "08:00", "09:00")).unwrap();
    let tpl = store.save_as_template("T").unwrap();

    let reopened = EventStore::open(backend, Arc::new(ChangeHub::new()));
    assert_eq!(reopened.events(), store.events());
    assert_eq!(reopened.template(&tpl), store.template(&tpl));
}

#[test]
fn write_failure_keeps_memory_state() {
    let mut store = EventStore::with_events(
        Arc::new(BrokenBackend),
        Arc::new(ChangeHub::new()),
        Vec::new(),
    );
    let id = store.add(new_event("A", "08:00", "09:00")).unwrap();
    assert_eq!(store.get(&id).unwrap().title, "A");
    assert_eq!(store.version(), 1);
}

#[test]
fn version_counts_only_successful_mutations() {
    let (mut store, _) = empty_store();
    store.add(new_event("A", "08:00", "09:00")).unwrap();
    let _ = store.add(new_event("", "08:00", "09:00"));
    let _ = store.delete(&EventId::from("missing"));
    store.clear();
    assert_eq!(store.version(), 2);
}

#[tokio::test]
async fn mutations_are_broadcast() {
    let (mut store, _) = empty_store();
    let mut rx = store.notify.subscribe();

    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    store.toggle_completion(&a).unwrap();
    store.delete(&a).unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first, StoreChange { version: 1, kind: ChangeKind::EventAdded { id: a.clone() } });
    let second = rx.recv().await.unwrap();
    assert_eq!(
        second.kind,
        ChangeKind::CompletionToggled { id: a.clone(), is_completed: true }
    );
    let third = rx.recv().await.unwrap();
    assert_eq!(third, StoreChange { version: 3, kind: ChangeKind::EventDeleted { id: a } });
}

// ── queries ──────────────────────────────────────────────

#[test]
fn conflict_queries() {
    let (mut store, _) = empty_store();
    let a = store.add(new_event("A", "08:00", "09:00")).unwrap();
    let b = store.add(new_event("B", "08:30", "09:30")).unwrap();
    let c = store.add(new_event("C", "09:30", "10:00")).unwrap();
    assert!(store.has_conflict(&a));
    assert!(store.has_conflict(&b));
    assert!(!store.has_conflict(&c));
    assert_eq!(store.conflicting_ids().len(), 2);
    assert!(!store.has_conflict(&EventId::from("missing")));
}

#[test]
fn sorted_after_every_reordering_mutation() {
    let (mut store, _) = empty_store();
    for (title, start, end) in [("C", "15:00", "16:00"), ("A", "06:00", "07:00"), ("B", "11:00", "12:00")] {
        store.add(new_event(title, start, end)).unwrap();
        assert!(is_sorted(&store));
    }
    let a = store.events()[0].id.clone();
    let mut upd = EventUpdate::from(store.get(&a).unwrap());
    upd.start_time = t("23:00");
    store.update(&a, upd).unwrap();
    assert!(is_sorted(&store));

    store.import_events(vec![record("z", "22:00", "23:00"), record("y", "01:00", "02:00")]);
    assert!(is_sorted(&store));
}

#[test]
fn timeline_uses_store_snapshot() {
    let backend = Arc::new(MemoryBackend::new());
    let store = EventStore::with_events(
        backend,
        Arc::new(ChangeHub::new()),
        vec![record("b", "09:00", "11:00"), record("a", "07:30", "08:30")],
    );
    let tl = store.timeline(crate::geometry::Layout::default());
    assert_eq!(tl.y_at(t("08:00")), 100.0);
    assert_eq!(tl.y_at(t("08:45")), 170.0);
    assert_eq!(tl.y_at(t("07:00")), 10.0);
}
