//! File store durability tests: persistence across handles, legacy documents,
//! and concurrent writers.

use parkade_schema::{SizeClass, VehicleRecord};
use parkade_store::{FacilityStore, FileStore, StoreError, StoreLayout, StoreLock};
use std::fs;
use std::sync::Arc;
use std::thread;

fn vehicle(plate: &str) -> VehicleRecord {
    VehicleRecord {
        license_plate: plate.into(),
        vehicle_type: "Car".to_owned(),
        parked_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileStore::new(dir.path());
        store.insert_level(1).unwrap();
        store.insert_slot(1, 1, SizeClass::Car).unwrap();
        store.insert_slot(1, 2, SizeClass::Bus).unwrap();
        store.record_parking(&vehicle("AAA111"), 1, 2).unwrap();
    }

    let reopened = FileStore::new(dir.path());
    let levels = reopened.levels().unwrap();
    assert_eq!(levels.len(), 1);
    assert_eq!(levels[0].slots.len(), 2);

    let parked = reopened.parked_vehicles().unwrap();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].license_plate, "AAA111");
    assert_eq!(parked[0].slot_number, 2);
}

#[test]
fn document_without_checksum_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StoreLayout::new(dir.path());
    layout.initialize().unwrap();

    let legacy = serde_json::json!({
        "levels": [
            { "level_number": 1, "slots": [
                { "slot_number": 1, "size": 0 },
                { "slot_number": 2, "size": 1, "occupant": "OLD001" }
            ]}
        ],
        "vehicles": [
            { "license_plate": "OLD001", "vehicle_type": "car", "parked_at": "2024-06-01T08:00:00Z" }
        ]
    });
    fs::write(
        layout.facility_file(),
        serde_json::to_string_pretty(&legacy).unwrap(),
    )
    .unwrap();

    let store = FileStore::new(dir.path());
    let parked = store.parked_vehicles().unwrap();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].vehicle_type, "car");

    // The next write seals the document with a checksum.
    store.insert_level(2).unwrap();
    let raw = fs::read_to_string(layout.facility_file()).unwrap();
    assert!(raw.contains("checksum"));
}

#[test]
fn corrupt_json_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StoreLayout::new(dir.path());
    layout.initialize().unwrap();
    fs::write(layout.facility_file(), "{ not json").unwrap();

    let store = FileStore::new(dir.path());
    assert!(matches!(
        store.read_document(),
        Err(StoreError::Serialization(_))
    ));
}

#[test]
fn foreign_format_version_blocks_reads() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StoreLayout::new(dir.path());
    fs::create_dir_all(layout.store_dir()).unwrap();
    fs::write(layout.version_file(), r#"{"format_version": 7}"#).unwrap();

    let store = FileStore::new(dir.path());
    assert!(matches!(
        store.levels(),
        Err(StoreError::VersionMismatch { found: 7, .. })
    ));
}

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    store.insert_level(1).unwrap();

    let handles: Vec<_> = (1..=8u32)
        .map(|n| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.insert_slot(1, n, SizeClass::Car).unwrap())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let levels = FileStore::new(dir.path()).levels().unwrap();
    let mut numbers: Vec<_> = levels[0].slots.iter().map(|s| s.slot_number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=8).collect::<Vec<_>>());
}

#[test]
fn writer_waits_for_external_lock_holder() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.insert_level(1).unwrap();

    let lock_path = store.layout().lock_file();
    assert!(StoreLock::try_acquire(&lock_path).unwrap().is_some());

    let held = StoreLock::acquire(&lock_path).unwrap();
    let root = dir.path().to_path_buf();
    let writer = thread::spawn(move || FileStore::new(root).insert_level(2));
    thread::sleep(std::time::Duration::from_millis(50));
    drop(held);

    writer.join().unwrap().unwrap();
    assert_eq!(store.levels().unwrap().len(), 2);
}
