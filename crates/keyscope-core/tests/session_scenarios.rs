//! End-to-end session scenarios driven through the JSON input path.

use keyscope_core::view::PATTERN_PLACEHOLDER;
use keyscope_core::{CaptureGate, KeyEvent, KeyscopeError, Session};
use pretty_assertions::assert_eq;

fn push(session: &mut Session, json: &str) {
    let event = KeyEvent::from_json_str(json).expect("valid encoded input");
    session.dispatch(&event);
}

#[test]
fn hold_repeat_release() {
    let mut session = Session::default();
    push(&mut session, r#"{"phase":"down","key":"a","code":"KeyA","ts":100}"#);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.held.len(), 1);
    assert_eq!(snapshot.held[0].key, "a");
    assert_eq!(snapshot.log.len(), 1);
    assert_eq!(snapshot.pattern_text(), PATTERN_PLACEHOLDER);

    for ts in [600, 633, 666] {
        push(
            &mut session,
            &format!(r#"{{"phase":"down","key":"a","code":"KeyA","repeat":true,"ts":{ts}}}"#),
        );
    }
    let snapshot = session.snapshot();
    assert_eq!(snapshot.pattern, vec!["a", "a", "a"]);
    assert_eq!(snapshot.repeat_counts[0].meta_text(), "KeyA ×3");

    push(&mut session, r#"{"phase":"up","key":"a","code":"KeyA","ts":700}"#);
    let snapshot = session.snapshot();
    assert!(snapshot.held.is_empty());
    assert_eq!(snapshot.log.len(), 5);
    assert_eq!(snapshot.log[0].kind, "keyup");
    assert_eq!(snapshot.log[0].delta, "34 ms");
    assert_eq!(snapshot.log[4].delta, "—");
}

#[test]
fn three_hundred_and_first_append_evicts_one() {
    let mut session = Session::default();
    for i in 0..301 {
        session.dispatch(&KeyEvent::down("a", "KeyA", i > 0, f64::from(i)));
    }
    assert_eq!(session.log().len(), 300);
    assert_eq!(session.log().oldest().map(|r| r.offset_ms), Some(1.0));
    assert_eq!(session.patterns().len(), 80);
    assert_eq!(session.patterns().count_for("KeyA"), 300);
}

#[test]
fn reset_versus_clear() {
    let mut session = Session::default();
    push(&mut session, r#"{"phase":"down","key":"Enter","code":"Enter","repeat":true,"ts":5}"#);
    session.set_paused(true);

    session.reset(10.0);
    assert_eq!(session.gate(), CaptureGate::Paused);
    assert!(session.snapshot().repeat_counts.is_empty());

    push(&mut session, r#"{"phase":"down","key":"b","code":"KeyB","ts":11}"#);
    assert!(session.log().is_empty());

    session.clear(20.0);
    assert_eq!(session.gate(), CaptureGate::Active);
    push(&mut session, r#"{"phase":"down","key":"b","code":"KeyB","ts":21}"#);
    assert_eq!(session.snapshot().log[0].elapsed, "0.001");
}

#[test]
fn multi_character_repeat_uses_code_label() {
    let mut session = Session::default();
    push(&mut session, r#"{"phase":"down","key":"Enter","code":"NumpadEnter","repeat":true,"ts":5}"#);
    assert_eq!(session.snapshot().pattern, vec!["NumpadEnter"]);
    assert_eq!(session.snapshot().repeat_counts[0].key, "Enter");
}

#[test]
fn malformed_input_is_rejected_without_touching_session() {
    let session = Session::default();
    let err = KeyEvent::from_json_str(r#"{"phase":"down","key":"a"}"#).unwrap_err();
    assert!(matches!(err, KeyscopeError::Parse(_)));
    assert!(session.log().is_empty());
}
