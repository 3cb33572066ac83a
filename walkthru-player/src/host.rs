//! Line-oriented host commands
//!
//! The bundled binary drives the engine from stdin, one command per line:
//!
//! ```text
//! tap <x> <y>          tap (press and release) at viewport coordinates
//! down <x> <y>         touch start
//! up <x> <y>           touch end
//! phase <start|end>    change the advance trigger phase
//! status               print an engine snapshot
//! quit                 shut down and exit
//! ```

use crate::error::{Error, Result};
use crate::playback::hit_test::{TapPoint, TouchEvent, TouchPhase, TriggerPhase};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    /// Phase-less tap; always eligible for the hit test
    Tap(TapPoint),
    Touch(TouchEvent),
    SetTrigger(TriggerPhase),
    Status,
    Quit,
}

impl HostCommand {
    /// Parse one input line; `Ok(None)` for blank lines and `#` comments
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match verb.as_str() {
            "tap" => HostCommand::Tap(parse_point(&verb, &args)?),
            "down" => HostCommand::Touch(TouchEvent {
                phase: TouchPhase::Start,
                point: parse_point(&verb, &args)?,
            }),
            "up" => HostCommand::Touch(TouchEvent {
                phase: TouchPhase::End,
                point: parse_point(&verb, &args)?,
            }),
            "phase" => match args.as_slice() {
                [phase] => HostCommand::SetTrigger(phase.parse().map_err(Error::InvalidCommand)?),
                _ => return Err(usage(&verb, "<start|end>")),
            },
            "status" => HostCommand::Status,
            "quit" | "exit" => HostCommand::Quit,
            other => {
                return Err(Error::InvalidCommand(format!("unknown command '{}'", other)));
            }
        };
        Ok(Some(command))
    }
}

fn parse_point(verb: &str, args: &[&str]) -> Result<TapPoint> {
    let &[x, y] = args else {
        return Err(usage(verb, "<x> <y>"));
    };
    let coordinate = |raw: &str| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::InvalidCommand(format!("'{}' is not a coordinate", raw)))
    };
    Ok(TapPoint::new(coordinate(x)?, coordinate(y)?))
}

fn usage(verb: &str, expected: &str) -> Error {
    Error::InvalidCommand(format!("usage: {} {}", verb, expected))
}
