use std::collections::BTreeSet;

use bon::Builder;
use serde::Serialize;
use serde_with::serde_as;
use tracing::{debug, instrument};

use crate::clock::MonotonicTime;
use crate::codec::{DpId, DpRecord, DpType, DpValue, FrameCodec, FrameCodecError, ValueCodec};
use crate::gesture::{ChannelId, Disambiguator, Gesture, GestureConfig, TimerDirective};
use crate::profile::{
    CapabilityValue, DeviceIdentity, MappingTable, ProfileRegistry, ProfileResolver,
    classify_unmapped,
};
use crate::protocol::ClusterCommand;
use crate::transform::TransformPipeline;

/// Per-device engine configuration.
#[derive(Debug, Clone, Builder)]
pub struct EngineConfig {
    /// Timing windows for echo suppression and gestures.
    #[builder(default)]
    gesture: GestureConfig,
    /// Capabilities the platform declares plausible for this device; the
    /// tier-4 value-range heuristic only proposes capabilities in this set.
    #[builder(default)]
    possible_capabilities: BTreeSet<String>,
    /// First sequence number used for outgoing frames.
    #[builder(default = 0)]
    initial_sequence: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// One decoded capability state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityUpdate {
    capability: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_channel: Option<&'static str>,
    value: CapabilityValue,
    is_physical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    gesture: Option<Gesture>,
    heuristic: bool,
}

impl CapabilityUpdate {
    /// Returns the capability identifier.
    #[must_use]
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    /// Returns the logical sub-channel, for multi-gang devices.
    #[must_use]
    pub fn sub_channel(&self) -> Option<&'static str> {
        self.sub_channel
    }

    /// Returns the decoded capability value.
    #[must_use]
    pub fn value(&self) -> &CapabilityValue {
        &self.value
    }

    /// Returns whether the change originated at the device.
    ///
    /// Echo-classified updates still carry the new value; only automation
    /// triggers are suppressed downstream.
    #[must_use]
    pub fn is_physical(&self) -> bool {
        self.is_physical
    }

    /// Returns a gesture emitted inline with this update.
    #[must_use]
    pub fn gesture(&self) -> Option<Gesture> {
        self.gesture
    }

    /// Returns whether the mapping came from the value-range heuristic.
    #[must_use]
    pub fn heuristic(&self) -> bool {
        self.heuristic
    }
}

/// One datapoint the profile could not map, kept for diagnostics and
/// auto-discovery. Not an error.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedDatapoint {
    dp_id: DpId,
    dp_type: DpType,
    #[serde_as(as = "serde_with::hex::Hex")]
    raw: Vec<u8>,
    value: DpValue,
}

impl UnmappedDatapoint {
    fn from_record(record: &DpRecord) -> Self {
        Self {
            dp_id: record.id(),
            dp_type: record.dp_type(),
            raw: record.raw().to_vec(),
            value: record.value().clone(),
        }
    }

    /// Returns the datapoint id.
    #[must_use]
    pub fn dp_id(&self) -> DpId {
        self.dp_id
    }

    /// Returns the declared payload type.
    #[must_use]
    pub fn dp_type(&self) -> DpType {
        self.dp_type
    }

    /// Returns the raw payload bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the decoded raw value.
    #[must_use]
    pub fn value(&self) -> &DpValue {
        &self.value
    }
}

/// Everything decoded from one incoming cluster payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomingReport {
    sequence: u16,
    command: u8,
    updates: Vec<CapabilityUpdate>,
    unmapped: Vec<UnmappedDatapoint>,
    truncated: bool,
    #[serde(skip)]
    timers: Vec<TimerDirective>,
}

impl IncomingReport {
    /// Returns the frame sequence number.
    #[must_use]
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Returns the cluster command byte.
    #[must_use]
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Returns the decoded capability updates.
    #[must_use]
    pub fn updates(&self) -> &[CapabilityUpdate] {
        &self.updates
    }

    /// Returns the datapoints no mapping covered.
    #[must_use]
    pub fn unmapped(&self) -> &[UnmappedDatapoint] {
        &self.unmapped
    }

    /// Returns whether trailing frame data was dropped as truncated.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Returns timer instructions for the runtime owning real timers.
    #[must_use]
    pub fn timers(&self) -> &[TimerDirective] {
        &self.timers
    }
}

/// Synchronous per-device façade over the codec, profile, transform, and
/// disambiguation layers.
///
/// One engine exists per paired device; the mapping table is resolved once
/// at construction and never re-resolved (identity cannot change at
/// runtime). All methods are non-blocking; timers are delegated to the
/// caller through [`TimerDirective`]s.
#[derive(Debug)]
pub struct DeviceEngine {
    identity: DeviceIdentity,
    table: MappingTable,
    disambiguator: Disambiguator,
    possible_capabilities: BTreeSet<String>,
    sequence: u16,
}

impl DeviceEngine {
    /// Creates an engine for one device identity against injected profiles.
    #[must_use]
    pub fn new(identity: DeviceIdentity, registry: &ProfileRegistry, config: EngineConfig) -> Self {
        let table = ProfileResolver::resolve(registry, &identity);
        debug!(source = %table.source(), mapped = table.len(), "resolved device profile");
        Self {
            identity,
            table,
            disambiguator: Disambiguator::new(config.gesture),
            possible_capabilities: config.possible_capabilities,
            sequence: config.initial_sequence,
        }
    }

    /// Creates an engine against the profiles shipped with the crate.
    ///
    /// ```
    /// use tuyadp::{DeviceEngine, DeviceIdentity, EngineConfig};
    ///
    /// let identity = DeviceIdentity::new("_TZE200_cwbvmsar", "TS0601", "climate_sensor");
    /// let engine = DeviceEngine::with_builtin_profiles(identity, EngineConfig::default());
    /// assert_eq!(false, engine.mapping_table().is_empty());
    /// ```
    #[must_use]
    pub fn with_builtin_profiles(identity: DeviceIdentity, config: EngineConfig) -> Self {
        Self::new(identity, ProfileRegistry::builtin(), config)
    }

    /// Returns the device identity this engine serves.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Returns the resolved mapping table.
    #[must_use]
    pub fn mapping_table(&self) -> &MappingTable {
        &self.table
    }

    /// Decodes one incoming cluster payload into capability updates.
    ///
    /// # Errors
    ///
    /// Returns an error only when the payload is shorter than one frame
    /// header; every other malformation degrades to partial data.
    #[instrument(skip(self, payload), level = "debug", fields(payload_len = payload.len()))]
    pub fn parse_incoming(
        &mut self,
        payload: &[u8],
        now: MonotonicTime,
    ) -> Result<IncomingReport, FrameCodecError> {
        let frame = FrameCodec::parse(payload)?;

        let mut updates = Vec::new();
        let mut unmapped = Vec::new();
        let mut timers = Vec::new();
        for record in frame.datapoints() {
            match self.table.entry(record.id()).copied() {
                Some(entry) => {
                    let value = TransformPipeline::decode(&entry, record.value());
                    let mut is_physical = true;
                    let mut gesture = None;
                    if let (Some(channel_name), CapabilityValue::Bool(flag)) =
                        (entry.gesture_channel(), &value)
                    {
                        let channel = ChannelId::from(channel_name);
                        let outcome = self.disambiguator.on_device_event(&channel, *flag, now);
                        is_physical = outcome.class().is_physical();
                        gesture = outcome.gesture();
                        if let Some(directive) = outcome.timer() {
                            timers.push(directive.clone());
                        }
                    }
                    updates.push(CapabilityUpdate {
                        capability: entry.capability(),
                        sub_channel: entry.sub_channel(),
                        value,
                        is_physical,
                        gesture,
                        heuristic: false,
                    });
                }
                None => {
                    let guess = (record.dp_type() == DpType::Value)
                        .then(|| record.value().numeric())
                        .flatten()
                        .and_then(|raw| classify_unmapped(raw, &self.possible_capabilities));
                    match guess {
                        Some(matched) => updates.push(CapabilityUpdate {
                            capability: matched.capability,
                            sub_channel: None,
                            value: matched.value,
                            is_physical: true,
                            gesture: None,
                            heuristic: true,
                        }),
                        None => unmapped.push(UnmappedDatapoint::from_record(record)),
                    }
                }
            }
        }

        Ok(IncomingReport {
            sequence: frame.sequence(),
            command: frame.command(),
            updates,
            unmapped,
            truncated: frame.truncated(),
            timers,
        })
    }

    /// Builds the outgoing cluster payload for one capability write.
    ///
    /// Returns `None` when the capability is unknown for this device, not
    /// writable, report-only, or the value has no reverse transform. A
    /// successful build marks the application command on the affected
    /// gesture channel and consumes one sequence number.
    #[instrument(skip(self, value), level = "debug")]
    pub fn build_outgoing(
        &mut self,
        capability: &str,
        sub_channel: Option<&str>,
        value: &CapabilityValue,
        now: MonotonicTime,
    ) -> Option<Vec<u8>> {
        let entry = *self.table.entry_for_capability(capability, sub_channel)?;
        if !entry.writable() || entry.report_only() {
            return None;
        }

        let dp_value = TransformPipeline::encode(&entry, value)?;
        let raw = ValueCodec::encode(entry.dp_type(), &dp_value);
        let record = DpRecord::new(entry.dp_id(), entry.dp_type(), raw);

        if let Some(channel_name) = entry.gesture_channel() {
            self.disambiguator
                .mark_application_command(&ChannelId::from(channel_name), now);
        }

        let sequence = self.next_sequence();
        FrameCodec::build(sequence, ClusterCommand::DataRequest.raw(), &[record]).ok()
    }

    /// Records an application command on a channel without building a frame.
    ///
    /// For platform glue that writes through a side path but still needs
    /// echo suppression.
    pub fn mark_application_command(&mut self, channel: &ChannelId, now: MonotonicTime) {
        self.disambiguator.mark_application_command(channel, now);
    }

    /// Finalizes a channel's pending clicks when its timer fires.
    ///
    /// Stale generations return `None`.
    pub fn finalize_channel(&mut self, channel: &ChannelId, generation: u64) -> Option<Gesture> {
        self.disambiguator.finalize(channel, generation)
    }

    /// Drops all channel state at device teardown, invalidating timers.
    pub fn reset_channels(&mut self) {
        self.disambiguator.reset();
    }

    fn next_sequence(&mut self) -> u16 {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        sequence
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::profile::capability;

    use super::*;

    fn at(millis: u64) -> MonotonicTime {
        MonotonicTime::from_millis(millis)
    }

    fn switch_engine() -> DeviceEngine {
        DeviceEngine::with_builtin_profiles(
            DeviceIdentity::new("_TZ3000_18ejxno0", "TS0012", "switch"),
            EngineConfig::default(),
        )
    }

    #[test]
    fn build_outgoing_consumes_sequence_numbers() {
        let mut engine = switch_engine();
        let value = CapabilityValue::Bool(true);

        let first = engine
            .build_outgoing(capability::ONOFF, None, &value, at(0))
            .expect("onoff is writable on the switch profile");
        let second = engine
            .build_outgoing(capability::ONOFF, None, &value, at(10))
            .expect("onoff is writable on the switch profile");

        assert_eq!([0x00, 0x00], [first[0], first[1]]);
        assert_eq!([0x00, 0x01], [second[0], second[1]]);
    }

    #[test]
    fn sequence_wraps_modulo_u16() {
        let mut engine = DeviceEngine::with_builtin_profiles(
            DeviceIdentity::new("_TZ3000_18ejxno0", "TS0012", "switch"),
            EngineConfig::builder().initial_sequence(u16::MAX).build(),
        );
        let value = CapabilityValue::Bool(false);

        let last = engine
            .build_outgoing(capability::ONOFF, None, &value, at(0))
            .expect("onoff is writable on the switch profile");
        let wrapped = engine
            .build_outgoing(capability::ONOFF, None, &value, at(10))
            .expect("onoff is writable on the switch profile");

        assert_eq!([0xFF, 0xFF], [last[0], last[1]]);
        assert_eq!([0x00, 0x00], [wrapped[0], wrapped[1]]);
    }

    #[test]
    fn build_outgoing_rejects_report_only_targets() {
        let mut engine = DeviceEngine::with_builtin_profiles(
            DeviceIdentity::new("_TZE200_cwbvmsar", "TS0601", "climate_sensor"),
            EngineConfig::default(),
        );

        let frame = engine.build_outgoing(
            capability::MEASURE_TEMPERATURE,
            None,
            &CapabilityValue::Number(21.0),
            at(0),
        );
        assert_eq!(None, frame);
    }

    #[test]
    fn build_outgoing_rejects_unknown_capabilities() {
        let mut engine = switch_engine();
        let frame = engine.build_outgoing("volume_set", None, &CapabilityValue::Number(0.5), at(0));
        assert_eq!(None, frame);
    }

    #[test]
    fn writes_mark_their_own_gang_only() {
        let mut engine = switch_engine();
        let payload = engine
            .build_outgoing(
                capability::ONOFF,
                Some("gang2"),
                &CapabilityValue::Bool(true),
                at(0),
            )
            .expect("gang2 is writable on the two-gang profile");
        // DP 2 carries gang2 on this profile.
        assert_eq!(2, payload[5]);

        // The echo lands on gang2; gang1 stays physical.
        let echo = engine
            .parse_incoming(
                &[0x00, 0x01, 0x02, 0x00, 0x05, 0x02, 0x01, 0x00, 0x01, 0x01],
                at(500),
            )
            .expect("well-formed report should parse");
        assert_eq!(false, echo.updates()[0].is_physical());

        let physical = engine
            .parse_incoming(
                &[0x00, 0x02, 0x02, 0x00, 0x05, 0x01, 0x01, 0x00, 0x01, 0x01],
                at(600),
            )
            .expect("well-formed report should parse");
        assert_eq!(true, physical.updates()[0].is_physical());
    }

    #[test]
    fn heuristic_requires_declared_capability() {
        let mut identityless = DeviceEngine::with_builtin_profiles(
            DeviceIdentity::new("_TZE200_unknownx", "TS0601", "garage_door"),
            EngineConfig::default(),
        );
        // DP 103 carries 235; without declared capabilities it stays unmapped.
        let payload = [0x00, 0x01, 0x02, 0x00, 0x08, 0x67, 0x02, 0x00, 0x04, 0x00, 0x00, 0x00, 0xEB];
        let report = identityless
            .parse_incoming(&payload, at(0))
            .expect("well-formed report should parse");
        assert_eq!(0, report.updates().len());
        assert_eq!(1, report.unmapped().len());

        let mut declared = DeviceEngine::with_builtin_profiles(
            DeviceIdentity::new("_TZE200_unknownx", "TS0601", "garage_door"),
            EngineConfig::builder()
                .possible_capabilities(BTreeSet::from([
                    capability::MEASURE_TEMPERATURE.to_string(),
                ]))
                .build(),
        );
        let report = declared
            .parse_incoming(&payload, at(0))
            .expect("well-formed report should parse");
        assert_eq!(1, report.updates().len());
        let update = &report.updates()[0];
        assert_eq!(capability::MEASURE_TEMPERATURE, update.capability());
        assert_eq!(&CapabilityValue::Number(23.5), update.value());
        assert_eq!(true, update.heuristic());
    }
}
