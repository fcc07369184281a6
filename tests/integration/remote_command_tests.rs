//! Bot updates → authorisation → command replies.

use aurix::app::commands::{RemoteCommand, help_text};
use aurix::app::events::AppEvent;
use aurix::app::remote::MAX_COMMANDS_PER_POLL;
use aurix::error::TransportError;
use embassy_time::Duration;

use crate::mock_hw::{OWNER_CHAT, at, rig};

#[test]
fn show_replies_with_owner_details() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.inbound(OWNER_CHAT, "/show");
    service.tick(&mut io, &mut sink);

    assert_eq!(
        io.messenger.sent.last(),
        Some(&(OWNER_CHAT, "Name: Asha Rao\nMobile: +91 98450 00000".to_owned()))
    );
    assert!(sink.contains(&AppEvent::CommandReceived(RemoteCommand::ShowInfo)));
}

#[test]
fn stranger_is_ignored_and_skipped() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.inbound(999, "/show");
    service.tick(&mut io, &mut sink);

    assert!(sink.contains(&AppEvent::UnauthorizedSender { chat_id: 999 }));
    assert_eq!(io.messenger.sent.len(), 1, "only the boot message");
    // The offset moved past the dropped update.
    assert_eq!(io.messenger.polls, vec![1, 101]);
}

#[test]
fn unknown_text_is_dropped() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.inbound(OWNER_CHAT, "/SHOW");
    io.messenger.inbound(OWNER_CHAT, "hello");
    service.tick(&mut io, &mut sink);

    let unrecognised = sink
        .events
        .iter()
        .filter(|e| **e == AppEvent::UnrecognizedCommand)
        .count();
    assert_eq!(unrecognised, 2);
    assert_eq!(io.messenger.sent.len(), 1);
}

#[test]
fn start_lists_commands() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.inbound(OWNER_CHAT, "/start");
    service.tick(&mut io, &mut sink);
    assert_eq!(io.messenger.texts().last().copied(), Some(help_text().as_str()));
}

#[test]
fn location_without_fix_reports_unavailable() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.inbound(OWNER_CHAT, "/location");
    service.tick(&mut io, &mut sink);

    assert_eq!(io.messenger.texts().last().copied(), Some("GPS unavailable."));
    assert!(sink.contains(&AppEvent::LocationUnavailable));
}

#[test]
fn photo_command_acknowledges_then_uploads() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.inbound(OWNER_CHAT, "/photo");
    service.tick(&mut io, &mut sink);

    assert_eq!(io.messenger.texts().last().copied(), Some("Capturing photo..."));
    assert_eq!(io.uplink.connects, 1);
    assert_eq!(io.camera.outstanding(), 0);
}

#[test]
fn track_and_stop_toggle_the_flag() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.inbound(OWNER_CHAT, "/track");
    service.tick(&mut io, &mut sink);
    assert!(service.alerts().is_tracking());
    assert_eq!(service.alerts().tracking_since(), Some(at(0)));
    assert_eq!(
        io.messenger.texts().last().copied(),
        Some("Tracking enabled (manual). Use /stop to disable.")
    );

    io.messenger.inbound(OWNER_CHAT, "/stop");
    io.clock.set(at(1_000));
    service.tick(&mut io, &mut sink);
    assert!(!service.alerts().is_tracking());
    assert_eq!(io.messenger.texts().last().copied(), Some("Tracking stopped."));
    assert!(sink.contains(&AppEvent::TrackingChanged(false)));
}

#[test]
fn polling_is_rate_limited() {
    let (mut service, mut io, mut sink) = rig();
    for t in [0, 300, 999] {
        io.clock.set(at(t));
        service.tick(&mut io, &mut sink);
    }
    assert_eq!(io.messenger.polls.len(), 1);

    io.clock.set(at(1_000));
    service.tick(&mut io, &mut sink);
    assert_eq!(io.messenger.polls.len(), 2);
}

#[test]
fn excess_commands_wait_for_the_next_poll() {
    let (mut service, mut io, mut sink) = rig();
    for _ in 0..10 {
        io.messenger.inbound(OWNER_CHAT, "/stop");
    }
    service.tick(&mut io, &mut sink);
    let replies = |sent: &[(i64, String)]| sent.iter().filter(|(_, t)| t == "Tracking stopped.").count();
    assert_eq!(replies(&io.messenger.sent), MAX_COMMANDS_PER_POLL);

    io.clock.set(at(1_000));
    service.tick(&mut io, &mut sink);
    assert_eq!(replies(&io.messenger.sent), 10);
    assert_eq!(io.messenger.polls[1], 100 + MAX_COMMANDS_PER_POLL as i64);
}

#[test]
fn poll_failure_retries_from_same_offset() {
    let (mut service, mut io, mut sink) = rig();
    io.messenger.fail_poll = true;
    service.tick(&mut io, &mut sink);
    assert!(sink.contains(&AppEvent::PollFailed(TransportError::ReadFailed)));

    io.messenger.fail_poll = false;
    io.messenger.inbound(OWNER_CHAT, "/show");
    io.clock.set(at(0) + Duration::from_millis(1_000));
    service.tick(&mut io, &mut sink);
    assert_eq!(io.messenger.polls, vec![1, 1, 101]);
    assert!(sink.contains(&AppEvent::CommandReceived(RemoteCommand::ShowInfo)));
}
