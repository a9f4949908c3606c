use clap::Parser;
use orbit_board::{BoardConfig, BoardController};
use orbit_cli::{Cli, execute, open_controller};
use orbit_storage::{BoardStore, MemoryBoardStore};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

async fn run<S>(controller: &BoardController<S>, args: &[&str]) -> Value
where
    S: BoardStore + ?Sized + 'static,
{
    let cli = Cli::try_parse_from(std::iter::once("orbit").chain(args.iter().copied())).unwrap();
    execute(controller, cli.command).await.unwrap()
}

fn id(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

fn memory_controller() -> BoardController<MemoryBoardStore> {
    BoardController::new(Arc::new(MemoryBoardStore::new()), BoardConfig::default())
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parses_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["orbit", "board", "list", "--db", "x.db", "-v"]).unwrap();
    assert_eq!(cli.db.to_str(), Some("x.db"));
    assert!(cli.verbose);
}

#[test]
fn rejects_malformed_ids() {
    assert!(Cli::try_parse_from(["orbit", "card", "delete", "not-a-uuid"]).is_err());
}

#[test]
fn due_and_clear_due_conflict() {
    let id = orbit_types::CardId::new().to_string();
    let parsed = Cli::try_parse_from([
        "orbit", "card", "edit", &id, "--due", "2026-01-01", "--clear-due",
    ]);
    assert!(parsed.is_err());
}

// ── Commands ─────────────────────────────────────────────────────

#[tokio::test]
async fn board_create_then_list() {
    let controller = memory_controller();
    let board = run(&controller, &["board", "create", "Work", "-d", "day job"]).await;
    assert_eq!(board["name"], "Work");

    let boards = run(&controller, &["board", "list"]).await;
    assert_eq!(boards.as_array().unwrap().len(), 1);

    let columns = run(&controller, &["column", "list", &id(&board)]).await;
    let names: Vec<&str> = columns
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
}

#[tokio::test]
async fn card_move_reports_new_order() {
    let controller = memory_controller();
    let board = run(&controller, &["board", "create", "Work"]).await;
    let columns = run(&controller, &["column", "list", &id(&board)]).await;
    let todo = id(&columns[0]);
    let doing = id(&columns[1]);
    run(&controller, &["card", "add", &todo, "A"]).await;
    let b = run(&controller, &["card", "add", &todo, "B"]).await;

    let moved = run(
        &controller,
        &["card", "move", &id(&b), "--column", &doing, "--index", "0"],
    )
    .await;

    assert_eq!(moved["status"]["result"], "confirmed");
    assert_eq!(moved["status"]["rows"], 1);
    assert_eq!(moved["cards"][0]["title"], "B");

    let unchanged = run(&controller, &["card", "move", &id(&b), "--index", "0"]).await;
    assert_eq!(unchanged["status"]["result"], "unchanged");
}

#[tokio::test]
async fn card_edit_sets_and_clears_due_date() {
    let controller = memory_controller();
    let board = run(&controller, &["board", "create", "Work"]).await;
    let columns = run(&controller, &["column", "list", &id(&board)]).await;
    let card = run(&controller, &["card", "add", &id(&columns[0]), "Taxes"]).await;

    let edited = run(
        &controller,
        &["card", "edit", &id(&card), "--due", "2026-04-15", "--notes", "forms"],
    )
    .await;
    assert_eq!(edited["due_date"], "2026-04-15");
    assert_eq!(edited["notes"], "forms");

    let cleared = run(&controller, &["card", "edit", &id(&card), "--clear-due"]).await;
    assert_eq!(cleared["due_date"], Value::Null);
    assert_eq!(cleared["notes"], "forms");
}

#[tokio::test]
async fn labels_attach_and_show_in_card_list() {
    let controller = memory_controller();
    let board = run(&controller, &["board", "create", "Work"]).await;
    let columns = run(&controller, &["column", "list", &id(&board)]).await;
    let card = run(&controller, &["card", "add", &id(&columns[0]), "Bug"]).await;
    let label = run(&controller, &["label", "add", &id(&board), "urgent", "#ef4444"]).await;

    run(&controller, &["label", "attach", &id(&card), &id(&label)]).await;

    let listed = run(&controller, &["card", "list", &id(&columns[0])]).await;
    assert_eq!(listed[0]["labels"][0], "urgent");
}

#[tokio::test]
async fn card_list_reflects_detached_labels() {
    let controller = memory_controller();
    let board = run(&controller, &["board", "create", "Work"]).await;
    let columns = run(&controller, &["column", "list", &id(&board)]).await;
    let bug = run(&controller, &["card", "add", &id(&columns[0]), "Bug"]).await;
    let chore = run(&controller, &["card", "add", &id(&columns[0]), "Chore"]).await;
    let urgent = run(&controller, &["label", "add", &id(&board), "urgent", "#ef4444"]).await;
    let later = run(&controller, &["label", "add", &id(&board), "later", "#94a3b8"]).await;

    run(&controller, &["label", "attach", &id(&bug), &id(&urgent)]).await;
    run(&controller, &["label", "attach", &id(&bug), &id(&later)]).await;
    let detached = run(&controller, &["label", "detach", &id(&bug), &id(&urgent)]).await;
    assert_eq!(detached["labels"][0]["name"], "later");
    assert_eq!(detached["labels"].as_array().map(Vec::len), Some(1));

    let listed = run(&controller, &["card", "list", &id(&columns[0])]).await;
    assert_eq!(listed[0]["card"]["id"], bug["id"]);
    assert_eq!(listed[0]["labels"], json!(["later"]));
    assert_eq!(listed[1]["card"]["id"], chore["id"]);
    assert_eq!(listed[1]["labels"], json!([]));
}

#[tokio::test]
async fn export_and_import_round_trip_through_sqlite() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("backup.json");
    let file_arg = file.to_str().unwrap();

    let source = open_controller(&dir.path().join("a.db")).unwrap();
    let board = run(&source, &["board", "create", "Work"]).await;
    let columns = run(&source, &["column", "list", &id(&board)]).await;
    run(&source, &["card", "add", &id(&columns[0]), "A"]).await;
    let exported = run(&source, &["export", file_arg]).await;
    assert_eq!(exported["boards"], 1);

    let target = open_controller(&dir.path().join("b.db")).unwrap();
    let imported = run(&target, &["import", file_arg]).await;
    assert_eq!(imported["cards"], 1);

    let cards = run(&target, &["card", "list", &id(&columns[0])]).await;
    assert_eq!(cards[0]["card"]["title"], "A");
}
