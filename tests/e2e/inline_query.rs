use crate::common::harness::EditorTestHarness;
use crate::common::scripted_service::ScriptedService;
use crossterm::event::{KeyCode, KeyModifiers};
use seemless::app::Focus;
use seemless::config::Config;
use seemless::model::document::Mark;
use seemless::query::{ERROR_MARKER, RESOLVING_SENTINEL};

fn enter(harness: &mut EditorTestHarness) {
    harness.send_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
}

#[test]
fn test_templated_query_replaces_whole_line() {
    let answer = "My favorite city is Paris, the capital of France.";
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "My favorite city is /Paris is the capital of which country?",
        ScriptedService::answering(answer),
    )
    .unwrap();

    enter(&mut harness);
    harness.wait_for_async().unwrap();

    let requests = harness.service().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].question, "Paris is the capital of which country?");
    let context = requests[0].context.clone().unwrap();
    assert_eq!(context.prefix, "My favorite city is ");
    assert_eq!(context.suffix, "");
    assert_eq!(context.preceding, "");

    assert_eq!(harness.document_lines(), vec![answer.to_string()]);
    let head = harness.editor().state().selection().head;
    assert_eq!(head, 1 + answer.chars().count());
    harness.assert_screen_contains(answer);
}

#[test]
fn test_freestanding_query_is_spliced_inline() {
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "/Paris is the capital of which country?",
        ScriptedService::answering("France."),
    )
    .unwrap();

    enter(&mut harness);
    harness.wait_for_async().unwrap();

    let requests = harness.service().requests();
    assert_eq!(requests[0].question, "Paris is the capital of which country?");
    assert!(requests[0].context.is_none());
    assert_eq!(harness.document_lines(), vec!["France.".to_string()]);
    assert_eq!(harness.editor().state().selection().head, 8);
}

#[test]
fn test_fill_in_the_blank_between_prefix_and_suffix() {
    let sentence = "Paris is the capital of France.";
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "The / is the capital of France.",
        ScriptedService::answering(sentence),
    )
    .unwrap();
    harness.send_key(KeyCode::Home, KeyModifiers::NONE).unwrap();
    for _ in 0..5 {
        harness.send_key(KeyCode::Right, KeyModifiers::NONE).unwrap();
    }

    enter(&mut harness);
    harness.wait_for_async().unwrap();

    let request = &harness.service().requests()[0];
    assert_eq!(request.question, "");
    let context = request.context.clone().unwrap();
    assert_eq!(context.prefix, "The ");
    assert_eq!(context.suffix, " is the capital of France.");
    assert_eq!(harness.document_lines(), vec![sentence.to_string()]);
}

#[test]
fn test_failure_commits_italic_error_marker() {
    let mut harness =
        EditorTestHarness::with_text(80, 10, "Intro", ScriptedService::failing()).unwrap();
    harness.send_key(KeyCode::Enter, KeyModifiers::SHIFT).unwrap();
    harness.type_text("/capital of France").unwrap();

    enter(&mut harness);
    harness.wait_for_async().unwrap();

    let doc = harness.editor().document();
    let runs = doc.blocks()[1].runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, ERROR_MARKER);
    assert!(runs[0].has_mark(Mark::Italic));
    assert!(!harness.get_status_bar().contains("Thinking..."));
    assert!(harness.get_status_bar().contains("model unavailable"));

    harness.type_text("x").unwrap();
    let doc = harness.editor().document();
    let last = doc.blocks()[1].runs().last().unwrap().clone();
    assert_eq!(last.text, "x");
    assert!(!last.has_mark(Mark::Italic));
}

#[test]
fn test_busy_indicator_while_in_flight() {
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "/q",
        ScriptedService::held(|_| Ok("done".to_string())),
    )
    .unwrap();

    enter(&mut harness);
    harness.wait_for_requests(1).unwrap();
    assert!(harness.editor().is_resolving());
    harness.assert_screen_contains(RESOLVING_SENTINEL);
    assert!(harness.get_status_bar().contains("Thinking..."));

    // Document stays editable while waiting
    harness.send_key(KeyCode::Enter, KeyModifiers::SHIFT).unwrap();
    harness.type_text("more").unwrap();

    harness.service().release(1);
    harness.wait_for_async().unwrap();
    assert!(!harness.get_status_bar().contains("Thinking..."));
    assert_eq!(harness.document_lines(), vec!["done", "more"]);
}

#[test]
fn test_deleted_placeholder_drops_result() {
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "/q",
        ScriptedService::held(|_| Ok("late answer".to_string())),
    )
    .unwrap();

    enter(&mut harness);
    harness.wait_for_requests(1).unwrap();
    for _ in 0..RESOLVING_SENTINEL.chars().count() {
        harness
            .send_key(KeyCode::Backspace, KeyModifiers::NONE)
            .unwrap();
    }
    let before = harness.editor().document().clone();
    assert_eq!(harness.document_lines(), vec![String::new()]);

    harness.service().release(1);
    harness.wait_for_async().unwrap();

    assert_eq!(harness.editor().document(), &before);
    assert_eq!(harness.editor().document().revision(), before.revision());
    assert!(harness.get_status_bar().contains("dropped"));
}

#[test]
fn test_placeholder_found_after_edits_before_it() {
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "/q",
        ScriptedService::held(|_| Ok("answer".to_string())),
    )
    .unwrap();

    enter(&mut harness);
    harness.wait_for_requests(1).unwrap();
    harness.send_key(KeyCode::Home, KeyModifiers::NONE).unwrap();
    harness.type_text("Hey ").unwrap();

    harness.service().release(1);
    harness.wait_for_async().unwrap();
    assert_eq!(harness.document_lines(), vec!["Hey answer".to_string()]);
}

#[test]
fn test_context_keeps_last_five_paragraphs() {
    let text = "one\n\ntwo\nthree\n---\nfour\n   \nfive\nsix\n/summarize";
    let mut harness =
        EditorTestHarness::with_text(80, 20, text, ScriptedService::answering("ok")).unwrap();

    enter(&mut harness);
    harness.wait_for_async().unwrap();

    let context = harness.service().requests()[0].context.clone().unwrap();
    assert_eq!(context.preceding, "two\nthree\nfour\nfive\nsix");
    assert_eq!(context.prefix, "");
    assert_eq!(context.suffix, "");
}

#[test]
fn test_preceding_limit_from_config() {
    let mut config = Config::default();
    config.editor.preceding_block_limit = 1;
    let mut harness = EditorTestHarness::with_config(
        80,
        10,
        "a\nb\n/q",
        ScriptedService::answering("ok"),
        config,
    )
    .unwrap();

    enter(&mut harness);
    harness.wait_for_async().unwrap();
    let context = harness.service().requests()[0].context.clone().unwrap();
    assert_eq!(context.preceding, "b");
}

#[test]
fn test_bare_trigger_falls_through_to_newline() {
    let mut harness =
        EditorTestHarness::with_text(80, 10, "/", ScriptedService::answering("x")).unwrap();
    enter(&mut harness);
    assert!(!harness.editor().is_resolving());
    assert!(harness.service().requests().is_empty());
    assert_eq!(harness.document_lines(), vec!["/".to_string(), String::new()]);
}

#[test]
fn test_slash_inside_word_is_plain_enter() {
    let mut harness =
        EditorTestHarness::with_text(80, 10, "and/or", ScriptedService::answering("x")).unwrap();
    enter(&mut harness);
    assert!(harness.service().requests().is_empty());
    assert_eq!(harness.document_lines().len(), 2);
}

#[test]
fn test_shift_enter_never_resolves() {
    let mut harness =
        EditorTestHarness::with_text(80, 10, "/q", ScriptedService::answering("x")).unwrap();
    harness.send_key(KeyCode::Enter, KeyModifiers::SHIFT).unwrap();
    assert!(harness.service().requests().is_empty());
    assert_eq!(harness.document_lines(), vec!["/q".to_string(), String::new()]);
}

#[test]
fn test_focus_returns_to_body_on_commit() {
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "/q",
        ScriptedService::held(|_| Ok("a".to_string())),
    )
    .unwrap();
    enter(&mut harness);
    harness.wait_for_requests(1).unwrap();
    harness.send_key(KeyCode::Tab, KeyModifiers::NONE).unwrap();
    assert_eq!(harness.editor().focus(), Focus::Title);

    harness.service().release(1);
    harness.wait_for_async().unwrap();
    assert_eq!(harness.editor().focus(), Focus::Body);
}

#[test]
fn test_concurrent_queries_settle_independently() {
    let mut harness = EditorTestHarness::with_text(
        80,
        10,
        "/first",
        ScriptedService::held(|r| Ok(format!("{} done", r.question))),
    )
    .unwrap();

    enter(&mut harness);
    harness.send_key(KeyCode::Enter, KeyModifiers::SHIFT).unwrap();
    harness.type_text("/second").unwrap();
    enter(&mut harness);
    harness.wait_for_requests(2).unwrap();
    assert_eq!(harness.editor().in_flight(), 2);
    assert!(harness.get_status_bar().contains("Thinking... (2)"));

    harness.service().release(2);
    harness.wait_for_async().unwrap();
    assert_eq!(
        harness.document_lines(),
        vec!["first done".to_string(), "second done".to_string()]
    );
}
