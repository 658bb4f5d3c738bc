#![no_main]

use keyscope_core::{KeyEvent, Session, SessionConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let config = SessionConfig {
        log_capacity: 8,
        pattern_capacity: 4,
    };
    let mut session = Session::new(config, 0.0);

    // One encoded event per line.
    for line in text.lines() {
        let Ok(event) = KeyEvent::from_json_str(line) else {
            continue;
        };
        assert!(!event.code.is_empty(), "decoded event with empty code");
        assert!(event.timestamp.is_finite(), "decoded non-finite timestamp");
        session.dispatch(&event);
    }

    assert!(session.log().len() <= config.log_capacity);
    assert!(session.patterns().len() <= config.pattern_capacity);
    let _ = session.snapshot().to_json_string();
});
