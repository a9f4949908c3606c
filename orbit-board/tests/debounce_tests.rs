use orbit_board::{BoardConfig, BoardController, CardEdit, Debouncer};
use orbit_storage::{BoardStore, MemoryBoardStore};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

type Saved = Arc<Mutex<Vec<(u32, String)>>>;

fn recorder(delay_ms: u64) -> (Debouncer<u32, String>, Saved) {
    let saved: Saved = Arc::default();
    let sink = Arc::clone(&saved);
    let debouncer = Debouncer::new(Duration::from_millis(delay_ms), move |key: u32, value: String| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push((key, value));
        }
    });
    (debouncer, saved)
}

fn saved(saved: &Saved) -> Vec<(u32, String)> {
    saved.lock().unwrap().clone()
}

// ── Quiet period ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn saves_latest_value_once_after_quiet_period() {
    let (debouncer, log) = recorder(500);

    debouncer.schedule(1, "a".to_string());
    debouncer.schedule(1, "ab".to_string());
    sleep(Duration::from_millis(400)).await;
    assert!(saved(&log).is_empty());

    sleep(Duration::from_millis(200)).await;
    assert_eq!(saved(&log), vec![(1, "ab".to_string())]);
    assert_eq!(debouncer.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn rescheduling_restarts_the_timer() {
    let (debouncer, log) = recorder(500);

    debouncer.schedule(1, "a".to_string());
    sleep(Duration::from_millis(400)).await;
    debouncer.schedule(1, "b".to_string());
    sleep(Duration::from_millis(400)).await;
    assert!(saved(&log).is_empty());

    sleep(Duration::from_millis(200)).await;
    assert_eq!(saved(&log), vec![(1, "b".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn keys_are_independent() {
    let (debouncer, log) = recorder(500);

    debouncer.schedule(1, "one".to_string());
    sleep(Duration::from_millis(300)).await;
    debouncer.schedule(2, "two".to_string());
    sleep(Duration::from_millis(300)).await;
    assert_eq!(saved(&log), vec![(1, "one".to_string())]);
    assert!(debouncer.is_pending(&2));

    sleep(Duration::from_millis(300)).await;
    assert_eq!(saved(&log).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn merge_folds_pending_values() {
    let (debouncer, log) = recorder(100);
    let debouncer = debouncer.with_merge(|pending: &mut String, later| pending.push_str(&later));

    debouncer.schedule(7, "a".to_string());
    debouncer.schedule(7, "b".to_string());
    sleep(Duration::from_millis(150)).await;

    assert_eq!(saved(&log), vec![(7, "ab".to_string())]);
}

// ── Flush and cancel ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn flush_saves_now_and_disarms_timer() {
    let (debouncer, log) = recorder(500);
    debouncer.schedule(1, "a".to_string());

    assert!(debouncer.flush(&1).await);
    assert_eq!(saved(&log), vec![(1, "a".to_string())]);
    assert!(!debouncer.flush(&1).await);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(saved(&log).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn flush_all_saves_every_key() {
    let (debouncer, log) = recorder(500);
    debouncer.schedule(1, "a".to_string());
    debouncer.schedule(2, "b".to_string());

    assert_eq!(debouncer.flush_all().await, 2);
    let mut entries = saved(&log);
    entries.sort();
    assert_eq!(entries, vec![(1, "a".to_string()), (2, "b".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn cancel_discards_pending_value() {
    let (debouncer, log) = recorder(500);
    debouncer.schedule(1, "a".to_string());

    assert!(debouncer.cancel(&1));
    sleep(Duration::from_secs(1)).await;
    assert!(saved(&log).is_empty());
}

// ── Edit sessions ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn finishing_a_session_flushes_it() {
    let (debouncer, log) = recorder(500);
    let session = debouncer.session(3);
    session.edit("draft".to_string());
    session.edit("final".to_string());

    assert!(session.finish().await);
    assert_eq!(saved(&log), vec![(3, "final".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn dropping_a_session_flushes_it() {
    let (debouncer, log) = recorder(500);
    {
        let session = debouncer.session(4);
        session.edit("typed".to_string());
    }
    sleep(Duration::from_millis(1)).await;

    assert_eq!(saved(&log), vec![(4, "typed".to_string())]);
}

fn slow_recorder(save_ms: u64) -> (Debouncer<u32, String>, Saved) {
    let saved: Saved = Arc::default();
    let sink = Arc::clone(&saved);
    let debouncer = Debouncer::new(Duration::from_millis(500), move |key: u32, value: String| {
        let sink = Arc::clone(&sink);
        async move {
            sleep(Duration::from_millis(save_ms)).await;
            sink.lock().unwrap().push((key, value));
        }
    });
    (debouncer, saved)
}

#[tokio::test(start_paused = true)]
async fn finish_returns_after_a_slow_save_completes() {
    let (debouncer, log) = slow_recorder(100);
    let session = debouncer.session(5);
    session.edit("body".to_string());

    assert!(session.finish().await);
    assert_eq!(saved(&log), vec![(5, "body".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn dropped_session_saves_in_the_background() {
    let (debouncer, log) = slow_recorder(100);
    {
        let session = debouncer.session(6);
        session.edit("body".to_string());
    }
    assert!(saved(&log).is_empty());

    sleep(Duration::from_millis(150)).await;
    assert_eq!(saved(&log), vec![(6, "body".to_string())]);
}

// ── Card autosave ────────────────────────────────────────────────

#[tokio::test]
async fn card_autosave_merges_edits_into_one_update() {
    let config = BoardConfig {
        autosave_debounce_ms: 10,
        default_columns: vec!["One".to_string()],
        ..BoardConfig::default()
    };
    let controller = Arc::new(BoardController::new(
        Arc::new(MemoryBoardStore::new()),
        config,
    ));
    let board = controller.create_board("Work", None).await.unwrap();
    controller.select_board(board.id).await.unwrap();
    let column = controller.columns().await[0].id;
    let card = controller.create_card(column, "Draft", None).await.unwrap();

    let autosave = controller.card_autosave();
    let session = autosave.session(card.id);
    session.edit(CardEdit::new(card.id).title("Final"));
    session.edit(CardEdit::new(card.id).description(Some("body".to_string())));
    assert!(session.finish().await);

    let stored = controller.store().get_card(card.id).unwrap().unwrap();
    assert_eq!(stored.title, "Final");
    assert_eq!(stored.description.as_deref(), Some("body"));
    assert_eq!(controller.cards_in(column).await[0].title, "Final");
}

#[tokio::test]
async fn card_autosave_fires_after_quiet_period() {
    let config = BoardConfig {
        autosave_debounce_ms: 10,
        default_columns: vec!["One".to_string()],
        ..BoardConfig::default()
    };
    let controller = Arc::new(BoardController::new(
        Arc::new(MemoryBoardStore::new()),
        config,
    ));
    let board = controller.create_board("Work", None).await.unwrap();
    controller.select_board(board.id).await.unwrap();
    let column = controller.columns().await[0].id;
    let card = controller.create_card(column, "Draft", None).await.unwrap();

    let autosave = controller.card_autosave();
    autosave.schedule(card.id, CardEdit::new(card.id).title("Saved"));

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let title = controller.store().get_card(card.id).unwrap().map(|c| c.title);
            if title.as_deref() == Some("Saved") {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert!(!autosave.is_pending(&card.id));
}
