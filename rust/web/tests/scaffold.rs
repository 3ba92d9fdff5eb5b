use defuse_web::events::{ConnectionRegistry, ScoreUpdate};
use std::time::Duration;

#[tokio::test]
async fn registry_fans_out_to_all_live_channels() {
    let registry = ConnectionRegistry::new();
    let mut receivers: Vec<_> = ["alice", "bob", "carol"]
        .into_iter()
        .map(|player| registry.subscribe(player))
        .collect();

    registry.broadcast(&ScoreUpdate::new("alice", 2, 0));

    for rx in receivers.iter_mut() {
        let received = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("channel receive timed out")
            .expect("channel unexpectedly closed");
        assert_eq!(received, ScoreUpdate::new("alice", 2, 0));
    }
}

#[tokio::test]
async fn deregistered_channel_is_skipped() {
    let registry = ConnectionRegistry::new();
    let mut alice = registry.subscribe("alice");
    let mut bob = registry.subscribe("bob");
    let mut carol = registry.subscribe("carol");

    registry.deregister("bob");
    assert_eq!(registry.broadcast(&ScoreUpdate::new("carol", 1, 0)), 2);

    for rx in [&mut alice, &mut carol] {
        let received = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("channel receive timed out");
        assert_eq!(received, Some(ScoreUpdate::new("carol", 1, 0)));
    }
    assert_eq!(bob.recv().await, None);
}

mod scored_draws {
    use defuse_engine::cards::CardKind;
    use defuse_engine::deck::Deck;
    use defuse_engine::game::GameSession;
    use defuse_web::events::{ConnectionRegistry, LiveSubscription};
    use defuse_web::ledger::ScoreLedger;
    use defuse_web::session::{SessionManager, SessionStore, DEFAULT_SESSION_TTL};
    use defuse_web::store::MemoryStore;
    use std::sync::Arc;

    fn drain(sub: &mut LiveSubscription) -> usize {
        let mut n = 0;
        while sub.try_recv().is_some() {
            n += 1;
        }
        n
    }

    #[test]
    fn each_scoring_draw_reaches_every_channel_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store.clone(), DEFAULT_SESSION_TTL);
        let registry = Arc::new(ConnectionRegistry::new());
        let manager = SessionManager::with_seed(
            sessions.clone(),
            Arc::new(ScoreLedger::new(store)),
            Arc::clone(&registry),
            1,
        );
        for id in ["g1", "g2"] {
            let game = GameSession::with_deck(id, "alice", Deck::from_kinds([CardKind::Cat]));
            sessions.save(&game).unwrap();
        }
        let mut subs: Vec<_> = ["alice", "bob", "carol"]
            .into_iter()
            .map(|player| registry.subscribe(player))
            .collect();

        manager.draw("g1").unwrap();
        let counts: Vec<usize> = subs.iter_mut().map(drain).collect();
        assert_eq!(counts, vec![1, 1, 1]);

        assert!(registry.deregister("bob"));
        manager.draw("g2").unwrap();
        let counts: Vec<usize> = subs.iter_mut().map(drain).collect();
        assert_eq!(counts, vec![1, 0, 1]);
    }
}
