//! Button press → local annunciation → outbound alert, end to end.

use aurix::adapters::camera::SimCamera;
use aurix::adapters::gps::{NmeaDecoder, SIM_RMC, SimGps};
use aurix::app::alerts::{AlertKind, BOOT_TEXT};
use aurix::app::events::{AppEvent, Delivery};
use aurix::app::photo::BOUNDARY;
use aurix::app::service::{Collaborators, DeviceService};
use aurix::drivers::button::ButtonId;
use aurix::error::{Error, HardwareError, TransportError};
use aurix::scheduler::Indicator;

use crate::mock_hw::{
    ManualClock, MockMessenger, MockPins, MockUplink, OWNER_CHAT, RecordingSink, at, rig,
    rig_with_gps, test_config,
};

fn presses(events: &[AppEvent], button: ButtonId) -> usize {
    events
        .iter()
        .filter(|e| **e == AppEvent::ButtonPressed(button))
        .count()
}

#[test]
fn start_drives_outputs_low_and_announces() {
    let (_service, io, sink) = rig();
    assert_eq!(io.pins.indicator_calls.len(), Indicator::ALL.len());
    assert!(io.pins.indicator_calls.iter().all(|&(_, on)| !on));
    assert_eq!(io.pins.flash_calls, vec![false]);
    assert_eq!(io.messenger.sent, vec![(OWNER_CHAT, BOOT_TEXT.to_owned())]);
    assert_eq!(sink.events.last(), Some(&AppEvent::Started));
}

#[test]
fn panic_sends_text_and_unavailable_location() {
    let (mut service, mut io, mut sink) = rig();
    io.pins.press(ButtonId::Panic);
    service.tick(&mut io, &mut sink);

    let texts = io.messenger.texts();
    assert_eq!(
        texts[1],
        "🚨 PANIC!\nUser: Asha Rao\nMobile: +91 98450 00000"
    );
    assert_eq!(texts[2], "GPS unavailable.");
    assert_eq!(io.uplink.connects, 0, "panic carries no photo");

    assert!(sink.contains(&AppEvent::ButtonPressed(ButtonId::Panic)));
    assert!(sink.contains(&AppEvent::AlertSent(AlertKind::Panic)));
    assert!(sink.contains(&AppEvent::LocationUnavailable));
    assert!(io.clock.slept >= service.config().location_deadline());
    assert!(io.pins.indicator_calls.contains(&(Indicator::LedA, true)));
}

#[test]
fn defence_sends_text_photo_and_fix() {
    let (mut service, mut io, mut sink) = rig_with_gps(SimGps::new(SIM_RMC.as_bytes()));
    io.pins.press(ButtonId::Defence);
    service.tick(&mut io, &mut sink);

    let texts = io.messenger.texts();
    assert_eq!(texts[1], "⚠️ Defence mode activated\nUser: Asha Rao");
    assert_eq!(
        texts[2],
        "Location: http://maps.google.com/maps?q=12.971600,77.594567"
    );

    assert_eq!(io.uplink.header_lines[0], "POST /bot123:secret/sendPhoto HTTP/1.1");
    assert_eq!(io.uplink.header_lines.last().map(String::as_str), Some(""));
    let body = String::from_utf8_lossy(&io.uplink.body);
    assert!(body.contains(&format!("--{BOUNDARY}")));
    assert!(body.contains(&format!("{OWNER_CHAT}")));
    assert!(io.uplink.body.windows(2).any(|w| w == [0xFF, 0xD8]));
    assert_eq!(io.uplink.closes, 1);

    assert_eq!(io.pins.flash_calls, vec![false, true, false]);
    assert_eq!(io.camera.outstanding(), 0);
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::PhotoUploaded { .. })));
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::LocationResolved { .. })));
}

#[test]
fn safe_alert_includes_photo() {
    let (mut service, mut io, mut sink) = rig_with_gps(SimGps::new(SIM_RMC.as_bytes()));
    io.pins.press(ButtonId::Safe);
    service.tick(&mut io, &mut sink);

    assert_eq!(io.messenger.texts()[1], "✅ User reports SAFE\nUser: Asha Rao");
    assert_eq!(io.uplink.connects, 1);
    assert!(service.scheduler().is_safe_sequence_armed());
}

#[test]
fn upload_failure_still_releases_frame_and_sends_location() {
    let (mut service, mut io, mut sink) = rig();
    io.uplink.fail_send_at = Some(1);
    io.pins.press(ButtonId::Defence);
    service.tick(&mut io, &mut sink);

    assert!(sink.contains(&AppEvent::PhotoFailed(Error::Transport(
        TransportError::WriteFailed
    ))));
    assert_eq!(io.camera.outstanding(), 0);
    assert_eq!(io.uplink.closes, 1);
    assert_eq!(io.messenger.texts().last().copied(), Some("GPS unavailable."));
}

#[test]
fn capture_failure_turns_flash_off() {
    let (mut service, mut io, mut sink) = rig();
    io.camera.fail = true;
    io.pins.press(ButtonId::Defence);
    service.tick(&mut io, &mut sink);

    assert!(sink.contains(&AppEvent::PhotoFailed(Error::HardwareRead(
        HardwareError::CaptureFailed
    ))));
    assert_eq!(io.pins.flash_calls.last(), Some(&false));
    assert_eq!(io.uplink.connects, 0);
}

#[test]
fn failed_delivery_is_reported_not_retried() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.fail_send = true;
    io.pins.press(ButtonId::Panic);
    service.tick(&mut io, &mut sink);

    assert!(sink.contains(&AppEvent::DeliveryFailed {
        what: Delivery::Alert(AlertKind::Panic),
        error: TransportError::ConnectFailed,
    }));
    assert!(!sink.contains(&AppEvent::AlertSent(AlertKind::Panic)));
    // Boot message only.
    assert_eq!(io.messenger.sent.len(), 1);
    // Local annunciation is unaffected.
    assert!(io.pins.indicator_calls.contains(&(Indicator::LedA, true)));
}

#[test]
fn held_button_repeats_once_per_debounce_period() {
    let (mut service, mut io, mut sink) = rig_with_gps(SimGps::new(SIM_RMC.as_bytes()));
    io.pins.press(ButtonId::Panic);
    for t in [0, 100, 199, 200, 350, 399, 400] {
        io.clock.set(at(t));
        service.tick(&mut io, &mut sink);
    }
    assert_eq!(presses(&sink.events, ButtonId::Panic), 3);
}

#[test]
fn buttons_debounce_independently() {
    let (mut service, mut io, mut sink) = rig_with_gps(SimGps::new(SIM_RMC.as_bytes()));
    io.pins.press(ButtonId::Panic);
    service.tick(&mut io, &mut sink);

    io.pins.release_all();
    io.pins.press(ButtonId::Safe);
    let t = io.clock.now + embassy_time::Duration::from_millis(50);
    io.clock.set(t);
    service.tick(&mut io, &mut sink);

    assert_eq!(presses(&sink.events, ButtonId::Panic), 1);
    assert_eq!(presses(&sink.events, ButtonId::Safe), 1);
}

#[test]
fn unreadable_button_is_skipped() {
    let (mut service, mut io, mut sink) = rig();
    io.pins.press(ButtonId::Panic);
    io.pins.unreadable = Some(ButtonId::Panic);
    service.tick(&mut io, &mut sink);

    assert_eq!(presses(&sink.events, ButtonId::Panic), 0);
    assert_eq!(io.messenger.sent.len(), 1);
    assert_eq!(service.tick_count(), 1);
}

#[test]
fn large_photo_streams_in_bounded_chunks() {
    let (mut service, mut io, mut sink) = rig();
    let chunk = usize::from(service.config().upload_chunk_bytes);
    let mut frame = vec![0xFF, 0xD8];
    frame.extend((0..3 * chunk + 500).map(|i| (i % 251) as u8));
    frame.extend([0xFF, 0xD9]);
    io.camera = SimCamera::with_frame(frame.clone());

    io.pins.press(ButtonId::Defence);
    service.tick(&mut io, &mut sink);

    let declared: usize = io
        .uplink
        .header("Content-Length")
        .and_then(|v| v.parse().ok())
        .expect("Content-Length sent");
    assert_eq!(declared, io.uplink.body.len());
    assert!(io.uplink.body.windows(frame.len()).any(|w| w == frame.as_slice()));
    assert!(io.uplink.writes.iter().all(|&n| n <= chunk));
    // Head, four image chunks, tail.
    assert_eq!(io.uplink.writes.len(), 6);
    assert_eq!(io.camera.outstanding(), 0);
}

#[test]
fn missing_camera_still_sends_text_and_location() {
    let mut io = Collaborators {
        pins: MockPins::new(),
        messenger: MockMessenger::new(),
        camera: None::<SimCamera>,
        uplink: MockUplink::new(),
        gps: SimGps::new(SIM_RMC.as_bytes()),
        decoder: NmeaDecoder::new(),
        clock: ManualClock::new(),
    };
    let mut sink = RecordingSink::default();
    let mut service = DeviceService::new(test_config());
    service.start(&mut io, &mut sink);

    io.pins.press(ButtonId::Safe);
    service.tick(&mut io, &mut sink);

    assert!(sink.contains(&AppEvent::AlertSent(AlertKind::Safe)));
    assert!(sink.contains(&AppEvent::PhotoFailed(Error::HardwareRead(
        HardwareError::CaptureFailed
    ))));
    assert_eq!(io.uplink.connects, 0);
    assert!(io.messenger.texts().last().is_some_and(|t| t.starts_with("Location: ")));
    assert!(service.scheduler().is_safe_sequence_armed());
}
