use std::collections::HashMap;
use std::time::Duration;

use bon::Builder;
use serde::Serialize;
use serde_with::SerializeDisplay;
use strum_macros::Display;

use crate::clock::MonotonicTime;

/// Identifier of one logical output channel (a "gang" on multi-gang gear).
#[derive(
    Debug,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::Display,
    derive_more::From,
    Serialize,
)]
pub struct ChannelId(String);

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Timing configuration for echo suppression and gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct GestureConfig {
    /// How long after an application write device reports count as echoes.
    #[builder(default = Duration::from_millis(2_000))]
    app_command_window: Duration,
    /// Quiet period after a transition before clicks finalize.
    #[builder(default = Duration::from_millis(400))]
    double_click_window: Duration,
    /// Minimum hold duration that counts as a long press.
    #[builder(default = Duration::from_millis(600))]
    long_press_threshold: Duration,
}

impl GestureConfig {
    /// Returns the application-echo suppression window.
    #[must_use]
    pub fn app_command_window(&self) -> Duration {
        self.app_command_window
    }

    /// Returns the click-finalize quiet period.
    #[must_use]
    pub fn double_click_window(&self) -> Duration {
        self.double_click_window
    }

    /// Returns the long-press hold threshold.
    #[must_use]
    pub fn long_press_threshold(&self) -> Duration {
        self.long_press_threshold
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A recognised press gesture.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, SerializeDisplay)]
pub enum Gesture {
    #[strum(to_string = "single")]
    Single,
    #[strum(to_string = "double")]
    Double,
    #[strum(to_string = "triple")]
    Triple,
    #[strum(to_string = "long_press")]
    LongPress,
}

/// Whether an observed transition originated at the device or is an echo of
/// an application command.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, SerializeDisplay)]
pub enum EventClass {
    #[strum(to_string = "physical")]
    Physical,
    #[strum(to_string = "application_echo")]
    ApplicationEcho,
}

impl EventClass {
    /// Returns whether the event originated at the device.
    #[must_use]
    pub fn is_physical(self) -> bool {
        matches!(self, Self::Physical)
    }
}

/// Timer instruction for the runtime that owns real timers.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TimerDirective {
    /// Arm (or re-arm) the channel's finalize timer.
    Arm {
        channel: ChannelId,
        deadline: MonotonicTime,
        generation: u64,
    },
    /// Cancel the channel's finalize timer.
    Cancel { channel: ChannelId },
}

/// Result of feeding one device-reported transition into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEventOutcome {
    class: EventClass,
    gesture: Option<Gesture>,
    timer: Option<TimerDirective>,
}

impl DeviceEventOutcome {
    /// Returns the echo-vs-physical classification.
    #[must_use]
    pub fn class(&self) -> EventClass {
        self.class
    }

    /// Returns a gesture emitted inline (long presses only).
    #[must_use]
    pub fn gesture(&self) -> Option<Gesture> {
        self.gesture
    }

    /// Returns the timer instruction for the runtime, if any.
    #[must_use]
    pub fn timer(&self) -> Option<&TimerDirective> {
        self.timer.as_ref()
    }
}

#[derive(Debug, Default)]
struct ChannelState {
    last_value: Option<bool>,
    app_command_pending_until: Option<MonotonicTime>,
    press_started_at: Option<MonotonicTime>,
    click_count: u32,
    timer_generation: u64,
    timer_armed: bool,
}

/// Per-device state machine distinguishing physical actuation from command
/// echoes and deriving press gestures.
///
/// The machine is pure: it never sleeps and owns no real timers. It returns
/// [`TimerDirective`]s for the runtime to schedule, and the runtime calls
/// [`Disambiguator::finalize`] back when a deadline fires. Generation
/// counters make stale timer firings no-ops, so a timer that outlives its
/// channel state cannot corrupt anything.
#[derive(Debug)]
pub struct Disambiguator {
    config: GestureConfig,
    channels: HashMap<ChannelId, ChannelState>,
}

impl Disambiguator {
    /// Creates a state machine with the given timing configuration.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            channels: HashMap::new(),
        }
    }

    /// Returns the timing configuration.
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Records an outgoing application write for a channel.
    ///
    /// Device reports arriving within the configured window classify as
    /// echoes. A second call before expiry replaces the deadline; the most
    /// recent command wins.
    pub fn mark_application_command(&mut self, channel: &ChannelId, now: MonotonicTime) {
        let state = self.channels.entry(channel.clone()).or_default();
        state.app_command_pending_until = Some(now + self.config.app_command_window);
    }

    /// Feeds one device-reported boolean value into the state machine.
    ///
    /// The capability state update is never blocked; classification only
    /// gates downstream automation and gesture tracking. Echo-classified
    /// events update the remembered value silently.
    pub fn on_device_event(
        &mut self,
        channel: &ChannelId,
        value: bool,
        now: MonotonicTime,
    ) -> DeviceEventOutcome {
        let config = self.config;
        let state = self.channels.entry(channel.clone()).or_default();

        let class = match state.app_command_pending_until {
            Some(deadline) if now <= deadline => EventClass::ApplicationEcho,
            _ => EventClass::Physical,
        };
        let transition = state.last_value != Some(value);
        state.last_value = Some(value);

        if !transition || !class.is_physical() {
            return DeviceEventOutcome {
                class,
                gesture: None,
                timer: None,
            };
        }

        if value {
            state.press_started_at = Some(now);
            state.click_count += 1;
        } else if let Some(started) = state.press_started_at.take() {
            let held = now.saturating_since(started);
            if held >= config.long_press_threshold {
                state.click_count = 0;
                state.timer_armed = false;
                state.timer_generation += 1;
                return DeviceEventOutcome {
                    class,
                    gesture: Some(Gesture::LongPress),
                    timer: Some(TimerDirective::Cancel {
                        channel: channel.clone(),
                    }),
                };
            }
        }

        if state.click_count == 0 {
            return DeviceEventOutcome {
                class,
                gesture: None,
                timer: None,
            };
        }

        state.timer_generation += 1;
        state.timer_armed = true;
        DeviceEventOutcome {
            class,
            gesture: None,
            timer: Some(TimerDirective::Arm {
                channel: channel.clone(),
                deadline: now + config.double_click_window,
                generation: state.timer_generation,
            }),
        }
    }

    /// Finalizes a channel's pending clicks when its timer fires.
    ///
    /// Stale firings (superseded generation, cleared channel) return `None`.
    pub fn finalize(&mut self, channel: &ChannelId, generation: u64) -> Option<Gesture> {
        let state = self.channels.get_mut(channel)?;
        if !state.timer_armed || state.timer_generation != generation {
            return None;
        }

        state.timer_armed = false;
        let clicks = std::mem::take(&mut state.click_count);
        match clicks {
            0 => None,
            1 => Some(Gesture::Single),
            2 => Some(Gesture::Double),
            _ => Some(Gesture::Triple),
        }
    }

    /// Drops all channel state, invalidating every outstanding timer.
    pub fn reset(&mut self) {
        self.channels.clear();
    }
}
