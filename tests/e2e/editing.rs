use crate::common::harness::EditorTestHarness;
use crate::common::scripted_service::ScriptedService;
use crossterm::event::{KeyCode, KeyModifiers};
use seemless::app::Focus;

#[test]
fn test_typing_and_paragraph_breaks() {
    let mut harness = EditorTestHarness::new(60, 10).unwrap();
    harness.type_text("first").unwrap();
    harness.send_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
    harness.type_text("second").unwrap();
    assert_eq!(harness.document_lines(), vec!["first", "second"]);
}

#[test]
fn test_backspace_joins_paragraphs() {
    let mut harness =
        EditorTestHarness::with_text(60, 10, "ab\ncd", ScriptedService::answering("x")).unwrap();
    harness.send_key(KeyCode::Home, KeyModifiers::NONE).unwrap();
    harness
        .send_key(KeyCode::Backspace, KeyModifiers::NONE)
        .unwrap();
    assert_eq!(harness.document_lines(), vec!["abcd"]);
    harness.type_text("-").unwrap();
    assert_eq!(harness.document_lines(), vec!["ab-cd"]);
}

#[test]
fn test_delete_at_end_pulls_next_paragraph() {
    let mut harness =
        EditorTestHarness::with_text(60, 10, "ab\ncd", ScriptedService::answering("x")).unwrap();
    harness.send_key(KeyCode::Up, KeyModifiers::NONE).unwrap();
    harness.send_key(KeyCode::End, KeyModifiers::NONE).unwrap();
    harness.send_key(KeyCode::Delete, KeyModifiers::NONE).unwrap();
    assert_eq!(harness.document_lines(), vec!["abcd"]);
}

#[test]
fn test_title_editing_does_not_touch_body() {
    let mut harness = EditorTestHarness::new(60, 10).unwrap();
    harness.send_key(KeyCode::Tab, KeyModifiers::NONE).unwrap();
    assert_eq!(harness.editor().focus(), Focus::Title);
    for _ in 0.."Untitled".len() {
        harness
            .send_key(KeyCode::Backspace, KeyModifiers::NONE)
            .unwrap();
    }
    harness.type_text("Travel notes").unwrap();
    harness.send_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();

    assert_eq!(harness.editor().title(), "Travel notes");
    assert_eq!(harness.editor().focus(), Focus::Body);
    assert_eq!(harness.document_lines(), vec![String::new()]);
    assert!(harness.get_row_text(0).starts_with("Travel notes"));
    assert_eq!(harness.screen_cursor_position(), (0, 2));
}

#[test]
fn test_query_in_title_is_not_resolved() {
    let mut harness = EditorTestHarness::new(60, 10).unwrap();
    harness.send_key(KeyCode::Tab, KeyModifiers::NONE).unwrap();
    harness.type_text(" /q").unwrap();
    harness.send_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
    assert!(harness.service().requests().is_empty());
    assert_eq!(harness.editor().title(), "Untitled /q");
}

#[test]
fn test_ctrl_q_requests_quit() {
    let mut harness = EditorTestHarness::new(60, 10).unwrap();
    harness
        .send_key(KeyCode::Char('q'), KeyModifiers::CONTROL)
        .unwrap();
    assert!(harness.editor().should_quit());
}
