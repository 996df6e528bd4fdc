//! Router tests on paused tokio time.

use super::*;
use crate::testing::MockCollaborator;
use std::time::Duration;
use tokio::time::Instant;

const SESSION: SessionId = SessionId(1);

fn config(mode: SourceMode) -> GhostConfig {
    GhostConfig {
        mode,
        shell: "bash".to_string(),
        ..Default::default()
    }
}

fn router(collab: &Arc<MockCollaborator>, mode: SourceMode) -> EventRouter {
    let mut router = EventRouter::new(SESSION, collab.clone(), config(mode));
    router.handle_message(RouterMessage::Home("/home/u".to_string()));
    router.handle_message(RouterMessage::WorkingDirectory("/home/u".to_string()));
    router
}

/// Drive background messages until `ms` of (paused) time have passed.
async fn run_for(router: &mut EventRouter, ms: u64) {
    let deadline = Instant::now() + Duration::from_millis(ms);
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            Some(message) = router.next_message() => router.handle_message(message),
        }
    }
}

async fn type_text(router: &mut EventRouter, text: &str) {
    for ch in text.chars() {
        router.handle_key(KeyInput::Char(ch)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_keystrokes_in_window_issue_one_query() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("git s", "git status"),
    );
    let mut router = router(&collab, SourceMode::Model);
    router.handle_message(RouterMessage::History(vec!["ls".to_string()]));

    for ch in "git s".chars() {
        router.handle_key(KeyInput::Char(ch)).await;
        run_for(&mut router, 50).await;
    }
    assert!(collab.queries().is_empty());

    run_for(&mut router, 400).await;

    let queries = collab.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].partial_input, "git s");
    assert_eq!(queries[0].shell, "bash");
    assert_eq!(queries[0].working_directory, "/home/u");
    assert_eq!(queries[0].last_command.as_deref(), Some("ls"));
    assert_eq!(router.ghost_text(), "tatus");
    assert_eq!(router.source(), Some(SuggestionSource::Model));
}

#[tokio::test(start_paused = true)]
async fn test_response_for_old_input_is_discarded() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("gi", "git")
            .with_query_delay(Duration::from_millis(500)),
    );
    let mut router = router(&collab, SourceMode::Model);

    type_text(&mut router, "gi").await;
    run_for(&mut router, 350).await;
    assert_eq!(collab.queries().len(), 1);
    assert!(router.generative().is_querying());

    // input moves on while "gi" is in flight
    type_text(&mut router, "x").await;
    run_for(&mut router, 500).await;

    assert_eq!(router.input(), "gix");
    assert_eq!(router.ghost_text(), "");
    assert_eq!(collab.queries().len(), 1);
    assert_eq!(router.generative().cached("gi"), Some(Some("git")));

    // the superseded response re-armed the debounce for the live input
    run_for(&mut router, 1000).await;
    let queries = collab.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].partial_input, "gix");
    assert_eq!(router.ghost_text(), "");
    assert_eq!(router.generative().cached("gix"), None);
}

#[tokio::test(start_paused = true)]
async fn test_cached_answer_is_offered_without_waiting() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("gi", "git"),
    );
    let mut router = router(&collab, SourceMode::Model);

    type_text(&mut router, "gi").await;
    run_for(&mut router, 400).await;
    assert_eq!(router.ghost_text(), "t");

    router.handle_key(KeyInput::Backspace).await;
    assert_eq!(router.ghost_text(), "it");

    router.handle_key(KeyInput::Char('i')).await;
    assert_eq!(router.ghost_text(), "t");
    run_for(&mut router, 400).await;
    assert_eq!(collab.queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_compound_answer_for_bare_word_is_rejected() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("gi", "git push origin main"),
    );
    let mut router = router(&collab, SourceMode::Model);

    type_text(&mut router, "gi").await;
    run_for(&mut router, 400).await;

    assert_eq!(router.ghost_text(), "");
    assert_eq!(router.generative().cached("gi"), Some(None));
    assert!(collab.path_lookups().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_bare_word_answer_is_accepted() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("gi", "git"),
    );
    let mut router = router(&collab, SourceMode::Hybrid);

    type_text(&mut router, "gi").await;
    assert_eq!(router.ghost_text(), "");
    run_for(&mut router, 400).await;

    assert_eq!(router.ghost_text(), "t");
    assert_eq!(router.source(), Some(SuggestionSource::Model));
    assert_eq!(collab.path_lookups(), vec!["git"]);
}

#[tokio::test(start_paused = true)]
async fn test_hybrid_prefers_local_history() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("gi", "git"),
    );
    let mut router = router(&collab, SourceMode::Hybrid);
    router.handle_message(RouterMessage::History(vec!["git status".to_string()]));

    type_text(&mut router, "gi").await;
    assert_eq!(router.ghost_text(), "t status");
    run_for(&mut router, 400).await;

    assert_eq!(router.source(), Some(SuggestionSource::History));
    assert!(collab.queries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_history_mode_never_queries() {
    let collab = Arc::new(MockCollaborator::new().with_response("gi", "git"));
    let mut router = router(&collab, SourceMode::History);
    router.handle_message(RouterMessage::Executables(vec!["gimp".to_string()]));

    type_text(&mut router, "gi").await;
    run_for(&mut router, 1000).await;

    assert_eq!(router.ghost_text(), "mp");
    assert_eq!(router.source(), Some(SuggestionSource::Command));
    assert!(collab.queries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_accept_forwards_suffix_to_session() {
    let collab = Arc::new(MockCollaborator::new());
    let mut router = router(&collab, SourceMode::Hybrid);
    router.handle_message(RouterMessage::History(vec!["git status".to_string()]));

    type_text(&mut router, "gi").await;
    let outcome = router.handle_key(KeyInput::Accept).await;

    assert_eq!(outcome.accepted.as_deref(), Some("t status"));
    assert_eq!(collab.writes(), vec![(SESSION, "t status".to_string())]);
    assert_eq!(router.input(), "git status");
    assert_eq!(router.ghost_text(), "");
}

#[tokio::test(start_paused = true)]
async fn test_accept_without_suggestion_does_nothing() {
    let collab = Arc::new(MockCollaborator::new());
    let mut router = router(&collab, SourceMode::History);

    type_text(&mut router, "zz").await;
    let outcome = router.handle_key(KeyInput::Accept).await;

    assert_eq!(outcome, KeyOutcome::default());
    assert!(collab.writes().is_empty());
    assert_eq!(router.input(), "zz");
}

#[tokio::test(start_paused = true)]
async fn test_submit_returns_line_and_resets() {
    let collab = Arc::new(MockCollaborator::new());
    let mut router = router(&collab, SourceMode::History);
    router.handle_message(RouterMessage::History(vec!["git status".to_string()]));

    type_text(&mut router, "gi").await;
    let outcome = router.handle_key(KeyInput::Submit).await;

    assert_eq!(outcome.submitted.as_deref(), Some("gi"));
    assert_eq!(router.input(), "");
    assert_eq!(router.ghost_text(), "");
}

#[tokio::test(start_paused = true)]
async fn test_directory_listing_completes_path() {
    let collab = Arc::new(MockCollaborator::new().with_directory(
        "/home/u/",
        vec![DirEntry::directory("project"), DirEntry::directory("projects")],
    ));
    let mut router = router(&collab, SourceMode::Hybrid);

    type_text(&mut router, "cd /home/u/pro").await;
    run_for(&mut router, 400).await;

    assert_eq!(router.ghost_text(), "ject/");
    assert_eq!(router.source(), Some(SuggestionSource::Filesystem));
    assert!(collab.listings().contains(&("/home/u/".to_string(), false)));
    assert!(collab.queries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_listing_for_old_input_is_discarded() {
    let collab = Arc::new(
        MockCollaborator::new().with_directory("/home/u/", vec![DirEntry::directory("project")]),
    );
    let mut router = router(&collab, SourceMode::History);

    type_text(&mut router, "cd /home/u/pro").await;
    router.handle_key(KeyInput::Clear).await;
    run_for(&mut router, 10).await;

    assert!(!collab.listings().is_empty());
    assert!(router.engine().directory().is_none());
    assert_eq!(router.ghost_text(), "");
}

#[tokio::test(start_paused = true)]
async fn test_dot_prefix_lists_hidden_entries() {
    let collab = Arc::new(
        MockCollaborator::new().with_directory("/home/u/", vec![DirEntry::file(".bashrc")]),
    );
    let mut router = router(&collab, SourceMode::History);

    type_text(&mut router, "vim .ba").await;
    run_for(&mut router, 10).await;

    assert!(collab.listings().contains(&("/home/u/".to_string(), true)));
    assert_eq!(router.ghost_text(), "shrc");
}

#[tokio::test(start_paused = true)]
async fn test_bare_word_does_not_list_directories() {
    let collab = Arc::new(MockCollaborator::new());
    let mut router = router(&collab, SourceMode::History);

    type_text(&mut router, "gi").await;
    run_for(&mut router, 10).await;

    assert!(collab.listings().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_loads_snapshots() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_history(&["cargo build"])
            .with_executables(&["cargo"]),
    );
    let mut router = EventRouter::new(SESSION, collab.clone(), config(SourceMode::History));
    router.start();
    run_for(&mut router, 10).await;

    assert_eq!(router.engine().history().to_vec(), vec!["cargo build"]);
    assert_eq!(router.engine().working_directory(), "/home/u");

    collab.set_history(&["cargo build", "cargo test"]);
    run_for(&mut router, 6000).await;
    type_text(&mut router, "car").await;
    assert_eq!(router.full_suggestion(), Some("cargo test"));

    router.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drops_late_responses() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("gi", "git")
            .with_query_delay(Duration::from_millis(500)),
    );
    let mut router = router(&collab, SourceMode::Model);

    type_text(&mut router, "gi").await;
    run_for(&mut router, 350).await;
    assert_eq!(collab.queries().len(), 1);

    router.shutdown();
    run_for(&mut router, 1000).await;

    assert_eq!(router.ghost_text(), "");
    assert_eq!(router.generative().cached("gi"), None);
}

#[tokio::test(start_paused = true)]
async fn test_history_excerpt_is_bounded() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["make"])
            .with_response("make t", "make test"),
    );
    let mut config = config(SourceMode::Model);
    config.history_excerpt = 2;
    let mut router = EventRouter::new(SESSION, collab.clone(), config);
    router.handle_message(RouterMessage::History(vec![
        "ls".to_string(),
        "cd src".to_string(),
        "make".to_string(),
    ]));

    type_text(&mut router, "make t").await;
    run_for(&mut router, 400).await;

    let queries = collab.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].history_excerpt, vec!["cd src", "make"]);
    assert_eq!(queries[0].last_command.as_deref(), Some("make"));
    assert_eq!(router.ghost_text(), "est");
}

#[tokio::test(start_paused = true)]
async fn test_switching_to_history_drops_model_suggestion() {
    let collab = Arc::new(
        MockCollaborator::new()
            .with_on_path(&["git"])
            .with_response("gi", "git"),
    );
    let mut router = router(&collab, SourceMode::Model);

    type_text(&mut router, "gi").await;
    // drain by hand instead of run_for
    tokio::time::sleep(Duration::from_millis(350)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
        router.pump();
    }
    assert_eq!(router.ghost_text(), "t");

    router.set_mode(SourceMode::History);
    assert_eq!(router.mode(), SourceMode::History);
    assert_eq!(router.ghost_text(), "");
}

#[test]
fn test_source_mode_parses() {
    assert_eq!("hybrid".parse::<SourceMode>(), Ok(SourceMode::Hybrid));
    assert_eq!("LLM".parse::<SourceMode>(), Ok(SourceMode::Model));
    assert!("psychic".parse::<SourceMode>().is_err());
}
