use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::{Mutex, mpsc};

use tuyadp::{
    CapabilityValue, DeviceEngine, DeviceHandle, DeviceIdentity, DpId, DpRecord, DpType,
    EngineConfig, EngineEvent, FrameCodec, FrameTransport, Gesture, TransportError, capability,
};

#[derive(Debug, Default)]
struct RecordingTransport {
    frames: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl FrameTransport for RecordingTransport {
    async fn send_frame(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.frames.lock().await.push(payload.to_vec());
        Ok(())
    }
}

fn switch_engine() -> DeviceEngine {
    DeviceEngine::with_builtin_profiles(
        DeviceIdentity::new("_TZ3000_ji4araar", "TS0001", "switch"),
        EngineConfig::default(),
    )
}

fn switch_report(sequence: u16, on: bool) -> Vec<u8> {
    let id = DpId::new(1).expect("1 is a valid datapoint id");
    let record = DpRecord::new(id, DpType::Bool, vec![u8::from(on)]);
    FrameCodec::build(sequence, 0x02, &[record]).expect("switch report should build")
}

#[tokio::test(start_paused = true)]
async fn short_press_finalizes_as_single_without_wall_clock() {
    let transport = Arc::new(RecordingTransport::default());
    let (events_tx, mut events) = mpsc::channel(16);
    let handle = DeviceHandle::spawn(switch_engine(), transport, events_tx);

    handle
        .deliver(switch_report(1, true))
        .await
        .expect("runtime should accept the press report");
    assert_capability(events.recv().await, true, true);

    handle
        .deliver(switch_report(2, false))
        .await
        .expect("runtime should accept the release report");
    assert_capability(events.recv().await, false, true);

    // The finalize timer fires under the paused clock; no real time passes.
    match events.recv().await {
        Some(EngineEvent::Gesture { gesture, .. }) => assert_eq!(Gesture::Single, gesture),
        other => panic!("expected a finalized gesture, got {other:?}"),
    }

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn writes_mark_echo_windows_and_reach_the_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let (events_tx, mut events) = mpsc::channel(16);
    let handle = DeviceHandle::spawn(switch_engine(), Arc::clone(&transport), events_tx);

    handle
        .write(capability::ONOFF, None, CapabilityValue::Bool(true))
        .await
        .expect("runtime should accept the write");
    handle
        .deliver(switch_report(1, true))
        .await
        .expect("runtime should accept the echo report");
    assert_capability(events.recv().await, true, false);

    tokio::time::advance(Duration::from_secs(3)).await;
    handle
        .deliver(switch_report(2, false))
        .await
        .expect("runtime should accept the manual report");
    assert_capability(events.recv().await, false, true);

    let frames = transport.frames.lock().await;
    assert_eq!(1, frames.len());
    // seq 0, data request, one Bool datapoint on DP 1.
    assert_eq!(
        vec![0x00, 0x00, 0x00, 0x00, 0x05, 0x01, 0x01, 0x00, 0x01, 0x01],
        frames[0]
    );

    drop(frames);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn read_only_writes_never_reach_the_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let (events_tx, _events) = mpsc::channel(16);
    let engine = DeviceEngine::with_builtin_profiles(
        DeviceIdentity::new("_TZE200_cwbvmsar", "TS0201", "climate_sensor"),
        EngineConfig::default(),
    );
    let handle = DeviceHandle::spawn(engine, Arc::clone(&transport), events_tx);

    handle
        .write(
            capability::MEASURE_TEMPERATURE,
            None,
            CapabilityValue::Number(21.0),
        )
        .await
        .expect("runtime should accept and then ignore the write");
    handle.shutdown().await;

    assert_eq!(0, transport.frames.lock().await.len());
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_pending_click_timers() {
    let transport = Arc::new(RecordingTransport::default());
    let (events_tx, mut events) = mpsc::channel(16);
    let handle = DeviceHandle::spawn(switch_engine(), transport, events_tx);

    handle
        .deliver(switch_report(1, true))
        .await
        .expect("runtime should accept the press report");
    assert_capability(events.recv().await, true, true);
    handle
        .deliver(switch_report(2, false))
        .await
        .expect("runtime should accept the release report");
    assert_capability(events.recv().await, false, true);

    // Shut down while the finalize timer is still armed.
    handle.shutdown().await;
    tokio::time::advance(Duration::from_secs(5)).await;

    // The runtime is gone and no gesture ever fires.
    assert_eq!(None, events.recv().await);
}

#[tokio::test(start_paused = true)]
async fn shutdown_completes_cleanly_with_no_traffic() {
    let transport = Arc::new(RecordingTransport::default());
    let (events_tx, mut events) = mpsc::channel(16);
    let handle = DeviceHandle::spawn(switch_engine(), transport, events_tx);

    handle.shutdown().await;
    assert_eq!(None, events.recv().await);
}

fn assert_capability(event: Option<EngineEvent>, value: bool, physical: bool) {
    match event {
        Some(EngineEvent::Capability(update)) => {
            assert_eq!(capability::ONOFF, update.capability());
            assert_eq!(&CapabilityValue::Bool(value), update.value());
            assert_eq!(physical, update.is_physical());
        }
        other => panic!("expected a capability update, got {other:?}"),
    }
}
