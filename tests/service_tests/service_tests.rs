//! Tests for TrainerService
//!
//! These tests verify:
//! - Get / delete / update / streaming create / streaming list
//! - Tier precedence and fallback when the durable store is down
//! - Cross-tier name uniqueness on update (and optionally on create)
//! - Validation runs before any I/O
//! - Cancellation of both streaming shapes
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use chrono::Utc;
use crossbeam::channel;
use roster::mirror::Mirror;
use roster::service::{CancelToken, TrainerSink};
use roster::store::{DetachedStore, MemoryStore, StoreClient};
use roster::{
    Config, Medal, MedalTier, NewTrainer, RosterError, StoreBackend, Trainer, TrainerId,
    TrainerService, UpdateTrainer,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_service() -> (Arc<MemoryStore>, TrainerService) {
    let store = Arc::new(MemoryStore::new());
    let service = TrainerService::new(StoreClient::new(store.clone()), Arc::new(Mirror::new()));
    (store, service)
}

fn setup_detached_service() -> TrainerService {
    TrainerService::new(
        StoreClient::new(Arc::new(DetachedStore::new())),
        Arc::new(Mirror::new()),
    )
}

fn create_one(service: &TrainerService, input: NewTrainer) -> Trainer {
    let summary = service.create(vec![input], &CancelToken::new());
    assert_eq!(summary.success_count, 1);
    summary.trainers.into_iter().next().unwrap()
}

fn durable_only(store: &MemoryStore, name: &str) -> Trainer {
    let trainer = Trainer::from_new(TrainerId::generate(), NewTrainer::new(name, 30), Utc::now());
    store.put_raw(trainer.clone());
    trainer
}

/// Sink that fails after accepting a fixed number of items
struct ClosingSink {
    accepted: Vec<Trainer>,
    capacity: usize,
}

impl TrainerSink for ClosingSink {
    fn send(&mut self, trainer: Trainer) -> roster::Result<()> {
        if self.accepted.len() == self.capacity {
            return Err(RosterError::Protocol("closed".to_string()));
        }
        self.accepted.push(trainer);
        Ok(())
    }
}

/// Sink that cancels the call once it has seen one item
struct CancellingSink {
    token: CancelToken,
    accepted: usize,
}

impl TrainerSink for CancellingSink {
    fn send(&mut self, _trainer: Trainer) -> roster::Result<()> {
        self.accepted += 1;
        self.token.cancel();
        Ok(())
    }
}

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_lands_in_both_tiers() {
    let (store, service) = setup_service();

    let ash = create_one(&service, NewTrainer::new("Ash", 10));

    assert!(service.mirror().contains(&ash.id));
    assert!(store.get_raw(&ash.id).is_some());
}

#[test]
fn test_create_stream_returns_all_in_order() {
    let (_store, service) = setup_service();
    let inputs = vec![
        NewTrainer::new("Ash", 10),
        NewTrainer::new("Misty", 12),
        NewTrainer::new("Brock", 15),
    ];

    let summary = service.create(inputs, &CancelToken::new());

    assert_eq!(summary.success_count, 3);
    let names: Vec<&str> = summary.trainers.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Ash", "Misty", "Brock"]);

    let mut ids: Vec<&TrainerId> = summary.trainers.iter().map(|t| &t.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_create_empty_stream() {
    let (_store, service) = setup_service();

    let summary = service.create(Vec::new(), &CancelToken::new());

    assert_eq!(summary.success_count, 0);
    assert!(summary.trainers.is_empty());
}

#[test]
fn test_create_allows_under_age_and_defaults() {
    let (_store, service) = setup_service();

    let kid = create_one(&service, NewTrainer::new("Kid", 10));

    assert_eq!(kid.age, 10);
    assert_eq!(kid.birth_date, chrono::DateTime::<Utc>::UNIX_EPOCH);
    assert!(kid.medals.is_empty());
}

#[test]
fn test_create_survives_durable_outage() {
    let (store, service) = setup_service();
    store.set_available(false);

    let ash = create_one(&service, NewTrainer::new("Ash", 10));

    assert!(service.mirror().contains(&ash.id));
    store.set_available(true);
    assert!(store.get_raw(&ash.id).is_none());
    assert_eq!(service.get(ash.id.as_str()).unwrap(), ash);
}

#[test]
fn test_create_allows_duplicate_names_by_default() {
    let (_store, service) = setup_service();

    create_one(&service, NewTrainer::new("Ana", 20));
    create_one(&service, NewTrainer::new("ana", 20));

    assert_eq!(service.mirror().len(), 2);
}

#[test]
fn test_create_with_unique_names_skips_clashes() {
    let (store, service) = setup_service();
    let service = service.with_unique_names_on_create(true);
    durable_only(&store, "Oak");

    let summary = service.create(
        vec![
            NewTrainer::new("Ana", 20),
            NewTrainer::new("ANA", 20),
            NewTrainer::new("oak", 20),
            NewTrainer::new("Elm", 20),
        ],
        &CancelToken::new(),
    );

    let names: Vec<&str> = summary.trainers.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Elm"]);
    assert_eq!(summary.success_count, 2);
}

#[test]
fn test_create_cancelled_keeps_accepted() {
    let (_store, service) = setup_service();
    let cancel = CancelToken::new();

    let inputs = (0..5).map(|i| {
        if i == 2 {
            cancel.cancel();
        }
        NewTrainer::new(format!("trainer{}", i), 20)
    });
    let summary = service.create(inputs, &cancel);

    assert_eq!(summary.success_count, 2);
    assert_eq!(service.mirror().len(), 2);
}

// =============================================================================
// Get Tests
// =============================================================================

#[test]
fn test_get_after_create_returns_same_record() {
    let (_store, service) = setup_service();
    let input = NewTrainer::new("Ana", 25).with_medal(Medal::new("east", MedalTier::Gold));

    let created = create_one(&service, input);
    let fetched = service.get(created.id.as_str()).unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "Ana");
    assert_eq!(fetched.medals, vec![Medal::new("east", MedalTier::Gold)]);
}

#[test]
fn test_get_malformed_id() {
    let (_store, service) = setup_service();

    assert!(matches!(
        service.get("definitely-not-an-id"),
        Err(RosterError::InvalidArgument(_))
    ));
}

#[test]
fn test_get_unknown_id() {
    let (_store, service) = setup_service();

    assert!(matches!(
        service.get(TrainerId::generate().as_str()),
        Err(RosterError::NotFound(_))
    ));
}

#[test]
fn test_get_prefers_durable_copy() {
    let (store, service) = setup_service();
    let created = create_one(&service, NewTrainer::new("Ash", 10));

    let mut durable = created.clone();
    durable.name = "Ash (durable)".to_string();
    store.put_raw(durable);

    assert_eq!(service.get(created.id.as_str()).unwrap().name, "Ash (durable)");
}

#[test]
fn test_get_falls_back_to_mirror_when_store_down() {
    let (store, service) = setup_service();
    let created = create_one(&service, NewTrainer::new("Ash", 10));

    store.set_available(false);

    assert_eq!(service.get(created.id.as_str()).unwrap().name, "Ash");
}

#[test]
fn test_get_durable_only_record() {
    let (store, service) = setup_service();
    let oak = durable_only(&store, "Oak");

    assert_eq!(service.get(oak.id.as_str()).unwrap(), oak);
    assert!(!service.mirror().contains(&oak.id));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_removes_from_both_tiers() {
    let (store, service) = setup_service();
    let ash = create_one(&service, NewTrainer::new("Ash", 10));

    let removed = service.delete(ash.id.as_str()).unwrap();

    assert_eq!(removed.id, ash.id);
    assert!(!service.mirror().contains(&ash.id));
    assert!(store.get_raw(&ash.id).is_none());
    assert!(matches!(service.get(ash.id.as_str()), Err(RosterError::NotFound(_))));
}

#[test]
fn test_delete_succeeds_when_durable_delete_fails() {
    let (store, service) = setup_service();
    let ash = create_one(&service, NewTrainer::new("Ash", 10));

    store.set_available(false);
    service.delete(ash.id.as_str()).unwrap();

    assert!(!service.mirror().contains(&ash.id));
    assert!(matches!(service.get(ash.id.as_str()), Err(RosterError::NotFound(_))));

    // The stale durable copy must not come back once the store recovers
    store.set_available(true);
    assert!(store.get_raw(&ash.id).is_some());
    assert!(matches!(service.get(ash.id.as_str()), Err(RosterError::NotFound(_))));

    // The read retried the durable delete and dropped the tombstone
    assert!(store.get_raw(&ash.id).is_none());
    assert!(!service.mirror().is_buried(&ash.id));
}

#[test]
fn test_deleted_record_stays_hidden_from_list_update_and_delete() {
    let (store, service) = setup_service();
    let ash = create_one(&service, NewTrainer::new("Ash", 20));
    create_one(&service, NewTrainer::new("Ashley", 20));

    store.set_available(false);
    service.delete(ash.id.as_str()).unwrap();
    store.set_available(true);

    let mut found = Vec::new();
    service.list_by_name("ash", &mut found, &CancelToken::new());
    let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Ashley"]);
    assert!(store.get_raw(&ash.id).is_none());

    let result = service.update(&UpdateTrainer::new(ash.id.as_str(), "Ash", 21));
    assert!(matches!(result, Err(RosterError::NotFound(_))));
    assert!(matches!(service.delete(ash.id.as_str()), Err(RosterError::NotFound(_))));
}

#[test]
fn test_deleted_record_does_not_hold_its_name() {
    let (store, service) = setup_service();
    let ana = create_one(&service, NewTrainer::new("Ana", 20));
    let bob = create_one(&service, NewTrainer::new("Bob", 20));

    store.set_available(false);
    service.delete(ana.id.as_str()).unwrap();
    store.set_available(true);

    let renamed = service
        .update(&UpdateTrainer::new(bob.id.as_str(), "ANA", 20))
        .unwrap();
    assert_eq!(renamed.name, "ANA");
}

#[test]
fn test_delete_durable_only_record() {
    let (store, service) = setup_service();
    let oak = durable_only(&store, "Oak");

    let removed = service.delete(oak.id.as_str()).unwrap();

    assert_eq!(removed, oak);
    assert!(store.get_raw(&oak.id).is_none());
}

#[test]
fn test_delete_unknown_and_malformed() {
    let (_store, service) = setup_service();

    assert!(matches!(
        service.delete(TrainerId::generate().as_str()),
        Err(RosterError::NotFound(_))
    ));
    assert!(matches!(service.delete("nope"), Err(RosterError::InvalidArgument(_))));
}

#[test]
fn test_delete_twice() {
    let (_store, service) = setup_service();
    let ash = create_one(&service, NewTrainer::new("Ash", 10));

    service.delete(ash.id.as_str()).unwrap();
    assert!(matches!(service.delete(ash.id.as_str()), Err(RosterError::NotFound(_))));
}

// =============================================================================
// Update Tests
// =============================================================================

#[test]
fn test_update_overwrites_everything() {
    let (store, service) = setup_service();
    let ana = create_one(
        &service,
        NewTrainer::new("Ana", 25).with_medal(Medal::new("east", MedalTier::Gold)),
    );

    let update = UpdateTrainer::new(ana.id.as_str(), "Ana Maria", 30)
        .with_medal(Medal::new("west", MedalTier::Bronze))
        .with_medal(Medal::new("north", MedalTier::Silver));
    let updated = service.update(&update).unwrap();

    assert_eq!(updated.name, "Ana Maria");
    assert_eq!(updated.age, 30);
    assert_eq!(updated.medals.len(), 2);

    // Propagated to the durable tier
    assert_eq!(store.get_raw(&ana.id).unwrap().name, "Ana Maria");
    assert_eq!(service.get(ana.id.as_str()).unwrap(), updated);
}

#[test]
fn test_update_keeps_created_at_in_both_tiers() {
    let (store, service) = setup_service();
    let ash = create_one(&service, NewTrainer::new("Ash", 20));

    let durable_created = store.get_raw(&ash.id).unwrap().created_at;
    assert_eq!(ash.created_at, durable_created);
    assert_eq!(service.mirror().get(&ash.id).unwrap().created_at, durable_created);

    let updated = service
        .update(&UpdateTrainer::new(ash.id.as_str(), "Ash K", 21))
        .unwrap();

    assert_eq!(updated.created_at, durable_created);
    assert_eq!(store.get_raw(&ash.id).unwrap().created_at, durable_created);
    assert_eq!(service.mirror().get(&ash.id).unwrap().created_at, durable_created);
}

#[test]
fn test_update_validation_errors() {
    let (_store, service) = setup_service();
    let ana = create_one(&service, NewTrainer::new("Ana", 25));

    for request in [
        UpdateTrainer::new("bad-id", "Ana", 25),
        UpdateTrainer::new(ana.id.as_str(), "  ", 25),
        UpdateTrainer::new(ana.id.as_str(), "Ana", 17),
    ] {
        assert!(matches!(
            service.update(&request),
            Err(RosterError::InvalidArgument(_))
        ));
    }

    assert_eq!(service.mirror().get(&ana.id).unwrap().age, 25);
}

#[test]
fn test_update_malformed_id_wins_over_name_clash() {
    let (_store, service) = setup_service();
    create_one(&service, NewTrainer::new("Ana", 25));
    let before = service.mirror().snapshot();

    let result = service.update(&UpdateTrainer::new("bad-id", "ANA", 25));

    assert!(matches!(result, Err(RosterError::InvalidArgument(_))));
    assert_eq!(service.mirror().snapshot(), before);
}

#[test]
fn test_update_unknown_id() {
    let (_store, service) = setup_service();

    let result = service.update(&UpdateTrainer::new(TrainerId::generate().as_str(), "Ana", 25));
    assert!(matches!(result, Err(RosterError::NotFound(_))));
}

#[test]
fn test_update_name_clash_in_mirror() {
    let service = setup_detached_service();
    let ana = create_one(&service, NewTrainer::new("Ana", 25));
    let bob = create_one(&service, NewTrainer::new("Bob", 25));

    let result = service.update(&UpdateTrainer::new(bob.id.as_str(), "aNA", 25));

    assert!(matches!(result, Err(RosterError::AlreadyExists(_))));
    assert_eq!(service.get(ana.id.as_str()).unwrap().name, "Ana");
    assert_eq!(service.get(bob.id.as_str()).unwrap().name, "Bob");
}

#[test]
fn test_update_name_clash_in_durable_store() {
    let (store, service) = setup_service();
    durable_only(&store, "Oak");
    let ash = create_one(&service, NewTrainer::new("Ash", 20));

    let result = service.update(&UpdateTrainer::new(ash.id.as_str(), "OAK", 20));

    assert!(matches!(result, Err(RosterError::AlreadyExists(_))));
    assert_eq!(service.get(ash.id.as_str()).unwrap().name, "Ash");
}

#[test]
fn test_update_keeping_own_name() {
    let (_store, service) = setup_service();
    let ana = create_one(&service, NewTrainer::new("Ana", 25));

    let updated = service
        .update(&UpdateTrainer::new(ana.id.as_str(), "ANA", 26))
        .unwrap();
    assert_eq!(updated.name, "ANA");
}

#[test]
fn test_update_hydrates_durable_only_record() {
    let (store, service) = setup_service();
    let oak = durable_only(&store, "Oak");

    let updated = service
        .update(&UpdateTrainer::new(oak.id.as_str(), "Professor Oak", 60))
        .unwrap();

    assert_eq!(updated.created_at, oak.created_at);
    assert!(service.mirror().contains(&oak.id));
    assert_eq!(store.get_raw(&oak.id).unwrap().name, "Professor Oak");
}

#[test]
fn test_update_with_store_down_uses_mirror_only() {
    let (store, service) = setup_service();
    let ash = create_one(&service, NewTrainer::new("Ash", 20));
    store.set_available(false);

    let updated = service
        .update(&UpdateTrainer::new(ash.id.as_str(), "Ash K", 21))
        .unwrap();

    assert_eq!(updated.name, "Ash K");
    assert_eq!(service.mirror().get(&ash.id).unwrap().name, "Ash K");
}

#[test]
fn test_update_of_mirror_only_record_with_store_up() {
    let (store, service) = setup_service();
    store.set_available(false);
    let ash = create_one(&service, NewTrainer::new("Ash", 20));
    store.set_available(true);

    let updated = service
        .update(&UpdateTrainer::new(ash.id.as_str(), "Ash K", 21))
        .unwrap();

    assert_eq!(updated.name, "Ash K");
    assert!(store.get_raw(&ash.id).is_none());
}

// =============================================================================
// List Tests
// =============================================================================

#[test]
fn test_list_prefers_durable_results() {
    let (store, service) = setup_service();
    store.set_available(false);
    create_one(&service, NewTrainer::new("Gary Oak", 20));
    store.set_available(true);
    let durable = durable_only(&store, "Professor Oak");

    let mut found = Vec::new();
    let summary = service.list_by_name("oak", &mut found, &CancelToken::new());

    assert_eq!(summary.sent, 1);
    assert!(!summary.cancelled);
    assert_eq!(found, vec![durable]);
}

#[test]
fn test_list_falls_back_to_mirror_when_durable_empty() {
    let (store, service) = setup_service();
    store.set_available(false);
    create_one(&service, NewTrainer::new("Gary Oak", 20));
    create_one(&service, NewTrainer::new("Misty", 20));
    store.set_available(true);

    let mut found = Vec::new();
    service.list_by_name("OAK", &mut found, &CancelToken::new());

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Gary Oak");
}

#[test]
fn test_list_falls_back_to_mirror_when_durable_down() {
    let service = setup_detached_service();
    create_one(&service, NewTrainer::new("Ash", 20));
    create_one(&service, NewTrainer::new("Ashley", 20));

    let mut found = Vec::new();
    let summary = service.list_by_name("ash", &mut found, &CancelToken::new());

    assert_eq!(summary.sent, 2);
    assert_eq!(found.len(), 2);
}

#[test]
fn test_list_no_matches() {
    let (_store, service) = setup_service();

    let mut found = Vec::new();
    let summary = service.list_by_name("nobody", &mut found, &CancelToken::new());

    assert_eq!(summary.sent, 0);
    assert!(!summary.cancelled);
}

#[test]
fn test_list_already_cancelled_sends_nothing() {
    let (_store, service) = setup_service();
    create_one(&service, NewTrainer::new("Ash", 20));
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut found = Vec::new();
    let summary = service.list_by_name("ash", &mut found, &cancel);

    assert!(summary.cancelled);
    assert!(found.is_empty());
}

#[test]
fn test_list_cancelled_mid_stream() {
    let (_store, service) = setup_service();
    for i in 0..5 {
        create_one(&service, NewTrainer::new(format!("trainer{}", i), 20));
    }
    let token = CancelToken::new();
    let mut sink = CancellingSink {
        token: token.clone(),
        accepted: 0,
    };

    let summary = service.list_by_name("trainer", &mut sink, &token);

    assert!(summary.cancelled);
    assert_eq!(summary.sent, 1);
    assert_eq!(sink.accepted, 1);
}

#[test]
fn test_list_stops_when_sink_closes() {
    let (_store, service) = setup_service();
    for i in 0..5 {
        create_one(&service, NewTrainer::new(format!("trainer{}", i), 20));
    }
    let mut sink = ClosingSink {
        accepted: Vec::new(),
        capacity: 2,
    };

    let summary = service.list_by_name("trainer", &mut sink, &CancelToken::new());

    assert!(summary.cancelled);
    assert_eq!(summary.sent, 2);
}

#[test]
fn test_list_into_channel() {
    let (_store, service) = setup_service();
    create_one(&service, NewTrainer::new("Ash", 20));
    create_one(&service, NewTrainer::new("Ashley", 20));

    let (mut sender, receiver) = channel::unbounded::<Trainer>();
    let summary = service.list_by_name("ash", &mut sender, &CancelToken::new());
    drop(sender);

    assert_eq!(summary.sent, 2);
    assert_eq!(receiver.iter().count(), 2);
}

#[test]
fn test_list_into_dropped_channel_is_cancellation() {
    let (_store, service) = setup_service();
    create_one(&service, NewTrainer::new("Ash", 20));

    let (mut sender, receiver) = channel::unbounded::<Trainer>();
    drop(receiver);
    let summary = service.list_by_name("ash", &mut sender, &CancelToken::new());

    assert!(summary.cancelled);
    assert_eq!(summary.sent, 0);
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_detached_serves_from_mirror() {
    let config = Config::builder()
        .store_backend(StoreBackend::Detached)
        .seed_store(true)
        .build();
    let service = TrainerService::open(&config).unwrap();

    let ash = create_one(&service, NewTrainer::new("Ash", 20));
    assert_eq!(service.get(ash.id.as_str()).unwrap(), ash);
}

#[test]
fn test_open_with_seed() {
    let config = Config::builder().seed_store(true).build();
    let service = TrainerService::open(&config).unwrap();

    let mut found = Vec::new();
    service.list_by_name("test", &mut found, &CancelToken::new());
    assert_eq!(found.len(), 1);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_creates_and_reads() {
    let (_store, service) = setup_service();
    let service = Arc::new(service);

    let mut handles = vec![];
    for t in 0..4 {
        let service_clone = Arc::clone(&service);
        handles.push(thread::spawn(move || {
            let inputs = (0..25).map(|i| NewTrainer::new(format!("t{}_{}", t, i), 20));
            let summary = service_clone.create(inputs, &CancelToken::new());
            for trainer in &summary.trainers {
                assert_eq!(service_clone.get(trainer.id.as_str()).unwrap().name, trainer.name);
            }
            summary.success_count
        }));
    }

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 100);
    assert_eq!(service.mirror().len(), 100);
}

#[test]
fn test_concurrent_renames_keep_names_unique() {
    let (_store, service) = setup_service();
    let service = Arc::new(service);
    let ids: Vec<TrainerId> = (0..6)
        .map(|i| create_one(&service, NewTrainer::new(format!("trainer{}", i), 20)).id)
        .collect();

    let mut handles = vec![];
    for id in ids {
        let service_clone = Arc::clone(&service);
        handles.push(thread::spawn(move || {
            service_clone
                .update(&UpdateTrainer::new(id.as_str(), "Champion", 30))
                .is_ok()
        }));
    }

    let succeeded = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(service.mirror().find_by_name("champion").len(), 1);
}
