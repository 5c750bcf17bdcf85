use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;
use strum_macros::Display;

use crate::clock::MonotonicTime;
use crate::error::FixtureError;
use crate::gesture::{ChannelId, Disambiguator, Gesture, GestureConfig, TimerDirective};

/// One scripted simulation step.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SimulationStep {
    at: MonotonicTime,
    channel: ChannelId,
    action: SimulationAction,
}

impl SimulationStep {
    /// Returns when the step happens.
    #[must_use]
    pub fn at(&self) -> MonotonicTime {
        self.at
    }

    /// Returns the channel the step targets.
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Returns the scripted action.
    #[must_use]
    pub fn action(&self) -> SimulationAction {
        self.action
    }
}

/// Action performed by one simulation step.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub enum SimulationAction {
    /// The device reports the channel switching on.
    #[strum(to_string = "on")]
    DeviceOn,
    /// The device reports the channel switching off.
    #[strum(to_string = "off")]
    DeviceOff,
    /// The application issues a write for the channel.
    #[strum(to_string = "app")]
    AppCommand,
}

impl FromStr for SimulationAction {
    type Err = FixtureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "on" => Ok(Self::DeviceOn),
            "off" => Ok(Self::DeviceOff),
            "app" => Ok(Self::AppCommand),
            other => Err(FixtureError::InvalidAction {
                value: other.to_string(),
            }),
        }
    }
}

/// Parsed timed-event fixture in the form
/// `t_ms|channel|on` records separated by `;` or newlines.
///
/// Timestamps must not decrease; the virtual clock only moves forward.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SimulationFixture {
    steps: Vec<SimulationStep>,
}

impl SimulationFixture {
    /// Returns the scripted steps in time order.
    #[must_use]
    pub fn steps(&self) -> &[SimulationStep] {
        &self.steps
    }
}

impl FromStr for SimulationFixture {
    type Err = FixtureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let records: Vec<&str> = value
            .split(|c| c == ';' || c == '\n')
            .map(str::trim)
            .filter(|record| !record.is_empty())
            .collect();
        if records.is_empty() {
            return Err(FixtureError::EmptyFixture);
        }

        let mut steps = Vec::with_capacity(records.len());
        let mut previous_ms = 0u64;
        for record in records {
            let step = parse_record(record)?;
            let current_ms = step.at.as_millis() as u64;
            if current_ms < previous_ms {
                return Err(FixtureError::NonMonotonicTimestamp {
                    previous_ms,
                    current_ms,
                });
            }
            previous_ms = current_ms;
            steps.push(step);
        }
        Ok(Self { steps })
    }
}

fn parse_record(record: &str) -> Result<SimulationStep, FixtureError> {
    let fields: Vec<&str> = record.split('|').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(FixtureError::InvalidRecordFieldCount);
    }
    if fields.iter().any(|field| field.is_empty()) {
        return Err(FixtureError::EmptyRecordField);
    }

    Ok(SimulationStep {
        at: MonotonicTime::from_millis(fields[0].parse()?),
        channel: ChannelId::from(fields[1]),
        action: fields[2].parse()?,
    })
}

/// One observed simulation outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutcome {
    at_ms: u64,
    channel: ChannelId,
    #[serde(flatten)]
    kind: SimulationOutcomeKind,
}

impl SimulationOutcome {
    /// Returns when the outcome happened, in virtual milliseconds.
    #[must_use]
    pub fn at_ms(&self) -> u64 {
        self.at_ms
    }

    /// Returns the channel the outcome belongs to.
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Returns what happened.
    #[must_use]
    pub fn kind(&self) -> &SimulationOutcomeKind {
        &self.kind
    }
}

/// What one simulation outcome records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SimulationOutcomeKind {
    /// An application command was marked on the channel.
    AppCommandMarked,
    /// The device reported a state value.
    StateChanged { value: bool, physical: bool },
    /// A gesture was recognised.
    Gesture { gesture: Gesture },
}

/// Runs a timed fixture through the disambiguator with a virtual clock.
///
/// Finalize timers fire at their exact virtual deadlines; no wall-clock time
/// passes.
#[must_use]
pub fn run_simulation(
    fixture: &SimulationFixture,
    config: GestureConfig,
) -> Vec<SimulationOutcome> {
    let mut machine = Disambiguator::new(config);
    let mut pending: HashMap<ChannelId, (u64, MonotonicTime)> = HashMap::new();
    let mut outcomes = Vec::new();

    for step in fixture.steps() {
        fire_due_timers(&mut machine, &mut pending, &mut outcomes, Some(step.at()));

        match step.action() {
            SimulationAction::AppCommand => {
                machine.mark_application_command(step.channel(), step.at());
                outcomes.push(SimulationOutcome {
                    at_ms: step.at().as_millis() as u64,
                    channel: step.channel().clone(),
                    kind: SimulationOutcomeKind::AppCommandMarked,
                });
            }
            SimulationAction::DeviceOn | SimulationAction::DeviceOff => {
                let value = step.action() == SimulationAction::DeviceOn;
                let result = machine.on_device_event(step.channel(), value, step.at());
                outcomes.push(SimulationOutcome {
                    at_ms: step.at().as_millis() as u64,
                    channel: step.channel().clone(),
                    kind: SimulationOutcomeKind::StateChanged {
                        value,
                        physical: result.class().is_physical(),
                    },
                });
                if let Some(gesture) = result.gesture() {
                    outcomes.push(SimulationOutcome {
                        at_ms: step.at().as_millis() as u64,
                        channel: step.channel().clone(),
                        kind: SimulationOutcomeKind::Gesture { gesture },
                    });
                }
                match result.timer() {
                    Some(TimerDirective::Arm {
                        channel,
                        deadline,
                        generation,
                    }) => {
                        pending.insert(channel.clone(), (*generation, *deadline));
                    }
                    Some(TimerDirective::Cancel { channel }) => {
                        pending.remove(channel);
                    }
                    None => {}
                }
            }
        }
    }

    fire_due_timers(&mut machine, &mut pending, &mut outcomes, None);
    outcomes
}

fn fire_due_timers(
    machine: &mut Disambiguator,
    pending: &mut HashMap<ChannelId, (u64, MonotonicTime)>,
    outcomes: &mut Vec<SimulationOutcome>,
    up_to: Option<MonotonicTime>,
) {
    loop {
        let due = pending
            .iter()
            .filter(|(_, (_, deadline))| up_to.is_none_or(|limit| *deadline <= limit))
            .min_by_key(|(_, (_, deadline))| *deadline)
            .map(|(channel, (generation, deadline))| (channel.clone(), *generation, *deadline));
        let Some((channel, generation, deadline)) = due else {
            return;
        };

        pending.remove(&channel);
        if let Some(gesture) = machine.finalize(&channel, generation) {
            outcomes.push(SimulationOutcome {
                at_ms: deadline.as_millis() as u64,
                channel,
                kind: SimulationOutcomeKind::Gesture { gesture },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn fixture_parses_records_in_both_separators() {
        let fixture: SimulationFixture = "0|main|app;500|main|on\n3000|main|off"
            .parse()
            .expect("well-formed fixture should parse");
        assert_eq!(3, fixture.steps().len());
        assert_eq!(SimulationAction::AppCommand, fixture.steps()[0].action());
        assert_eq!(&ChannelId::from("main"), fixture.steps()[1].channel());
    }

    #[rstest]
    #[case("", FixtureError::EmptyFixture)]
    #[case("0|main", FixtureError::InvalidRecordFieldCount)]
    #[case("0||on", FixtureError::EmptyRecordField)]
    #[case("0|main|toggle", FixtureError::InvalidAction { value: "toggle".to_string() })]
    #[case(
        "500|main|on;100|main|off",
        FixtureError::NonMonotonicTimestamp { previous_ms: 500, current_ms: 100 }
    )]
    fn fixture_rejects_malformed_records(#[case] raw: &str, #[case] expected: FixtureError) {
        let result = raw.parse::<SimulationFixture>();
        let error = result.expect_err("malformed fixture should be rejected");
        assert_eq!(format!("{expected}"), format!("{error}"));
    }

    #[test]
    fn fixture_rejects_unparseable_timestamps() {
        let result = "soon|main|on".parse::<SimulationFixture>();
        assert_matches!(result, Err(FixtureError::InvalidTimestamp(_)));
    }

    #[test]
    fn echo_suppression_scenario_plays_out() {
        let fixture: SimulationFixture = "0|ch1|app;500|ch1|on;3000|ch1|off"
            .parse()
            .expect("scenario fixture should parse");
        let outcomes = run_simulation(&fixture, GestureConfig::default());

        assert_eq!(
            vec![
                SimulationOutcomeKind::AppCommandMarked,
                SimulationOutcomeKind::StateChanged {
                    value: true,
                    physical: false,
                },
                SimulationOutcomeKind::StateChanged {
                    value: false,
                    physical: true,
                },
            ],
            outcomes
                .iter()
                .map(|outcome| outcome.kind().clone())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn double_click_scenario_finalizes_at_the_virtual_deadline() {
        let fixture: SimulationFixture = "0|main|on;150|main|off;300|main|on;380|main|off"
            .parse()
            .expect("scenario fixture should parse");
        let outcomes = run_simulation(&fixture, GestureConfig::default());

        let gesture = outcomes
            .iter()
            .find(|outcome| matches!(outcome.kind(), SimulationOutcomeKind::Gesture { .. }))
            .expect("double click should finalize");
        assert_eq!(780, gesture.at_ms());
        assert_eq!(
            &SimulationOutcomeKind::Gesture {
                gesture: Gesture::Double,
            },
            gesture.kind()
        );
    }

    #[test]
    fn long_press_emits_inline_without_finalize() {
        let fixture: SimulationFixture = "0|main|on;700|main|off"
            .parse()
            .expect("scenario fixture should parse");
        let outcomes = run_simulation(&fixture, GestureConfig::default());

        let gestures: Vec<_> = outcomes
            .iter()
            .filter(|outcome| matches!(outcome.kind(), SimulationOutcomeKind::Gesture { .. }))
            .collect();
        assert_eq!(1, gestures.len());
        assert_eq!(700, gestures[0].at_ms());
        assert_eq!(
            &SimulationOutcomeKind::Gesture {
                gesture: Gesture::LongPress,
            },
            gestures[0].kind()
        );
    }
}
