#![no_main]

use arbitrary::Arbitrary;
use keyscope_core::{KeyEvent, Session, SessionConfig};
use libfuzzer_sys::fuzz_target;

const CODES: &[(&str, &str)] = &[
    ("KeyA", "a"),
    ("KeyZ", "z"),
    ("Space", " "),
    ("ShiftLeft", "Shift"),
    ("Enter", "Enter"),
    ("ArrowUp", "ArrowUp"),
];

#[derive(Debug, Arbitrary)]
enum Op {
    Down { key: u8, repeat: bool },
    Up { key: u8 },
    Pause(bool),
    Reset,
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    log_capacity: u8,
    pattern_capacity: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let config = SessionConfig {
        log_capacity: usize::from(input.log_capacity).max(1),
        pattern_capacity: usize::from(input.pattern_capacity).max(1),
    };
    let mut session = Session::new(config, 0.0);

    for (i, op) in input.ops.iter().enumerate() {
        let ts = i as f64;
        match *op {
            Op::Down { key, repeat } => {
                let (code, label) = CODES[usize::from(key) % CODES.len()];
                session.dispatch(&KeyEvent::down(label, code, repeat, ts));
            }
            Op::Up { key } => {
                let (code, label) = CODES[usize::from(key) % CODES.len()];
                session.dispatch(&KeyEvent::up(label, code, ts));
            }
            Op::Pause(paused) => session.set_paused(paused),
            Op::Reset => {
                let paused = session.is_paused();
                session.reset(ts);
                assert_eq!(session.is_paused(), paused, "reset changed the gate");
            }
            Op::Clear => {
                session.clear(ts);
                assert!(!session.is_paused(), "clear left the gate paused");
            }
        }

        assert!(session.log().len() <= config.log_capacity);
        assert!(session.patterns().len() <= config.pattern_capacity);
        assert!(session.held().len() <= CODES.len());
    }
});
