//! Console devices for running a node from a terminal.
//!
//! The keypad reads stdin, the display and the actuator write to the log.

use doorlock_core::{AlarmState, Key, MotorCommand, Screen};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::{
    driver::{Actuator, Display},
    ticker::ChannelKeypad,
};

/// Map one typed character to a keypad code.
///
/// Digits become codes 1..=9, `#` is enter, everything else passes through
/// as its ASCII value.
pub fn key_code(c: char) -> Option<u8> {
    match c {
        '#' => Some(Key::ENTER_CODE),
        '1'..='9' => c.to_digit(10).map(|d| d as u8),
        _ if c.is_ascii() && !c.is_ascii_whitespace() => Some(c as u8),
        _ => None,
    }
}

/// Keypad fed from stdin, one line at a time.
///
/// The end of every non-empty line counts as an enter press.
pub fn stdin_keypad() -> ChannelKeypad {
    let (tx, keypad) = ChannelKeypad::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    warn!(%err, "stdin read failed");
                    break;
                },
            };
            let codes: Vec<u8> = line.chars().filter_map(key_code).collect();
            if codes.is_empty() {
                continue;
            }
            for code in codes.into_iter().chain([Key::ENTER_CODE]) {
                if tx.send(code).await.is_err() {
                    return;
                }
            }
        }
        debug!("stdin closed");
    });
    keypad
}

/// Display that logs every screen.
#[derive(Debug, Default)]
pub struct LogDisplay {
    masked: usize,
}

impl Display for LogDisplay {
    fn show(&mut self, screen: Screen) {
        self.masked = 0;
        let (top, bottom) = screen.lines();
        info!(target: "display", top, bottom);
    }

    fn mask_digit(&mut self) {
        self.masked += 1;
        info!(target: "display", input = %"*".repeat(self.masked));
    }
}

/// Actuator that logs every command.
#[derive(Debug, Default)]
pub struct LogActuator;

impl Actuator for LogActuator {
    fn motor(&mut self, command: MotorCommand) {
        info!(target: "actuator", ?command, "motor");
    }

    fn alarm(&mut self, state: AlarmState) {
        info!(target: "actuator", ?state, "alarm");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_keys() {
        assert_eq!(key_code('5'), Some(5));
        assert_eq!(key_code('0'), Some(b'0'));
        assert_eq!(key_code('+'), Some(b'+'));
        assert_eq!(key_code('-'), Some(b'-'));
        assert_eq!(key_code('#'), Some(13));
        assert_eq!(key_code(' '), None);
        assert_eq!(key_code('é'), None);
    }
}
