//! Remote command dispatcher.
//!
//! Polls the bot for new messages at most once per interval.  Messages
//! from any chat other than the recipient are dropped without a reply, as
//! is text that is not an exact command literal.  Recognised commands are
//! returned to the service for execution.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::{debug, warn};

use crate::app::commands::RemoteCommand;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, MessagingPort};

/// Most commands returned from one poll.
pub const MAX_COMMANDS_PER_POLL: usize = 8;

/// Most `get_updates` round trips in one poll.
pub const MAX_BATCHES_PER_POLL: usize = 4;

pub struct RemoteCommandDispatcher {
    interval: Duration,
    authorized_chat: i64,
    last_poll: Option<Instant>,
    /// Highest update id consumed so far.
    last_update_id: i64,
}

impl RemoteCommandDispatcher {
    pub fn new(interval: Duration, authorized_chat: i64) -> Self {
        Self {
            interval,
            authorized_chat,
            last_poll: None,
            last_update_id: 0,
        }
    }

    /// Fetch and filter new messages if the interval has elapsed.
    ///
    /// Updates are consumed in order; once the result is full the rest are
    /// left on the server for the next poll.
    pub fn poll_once(
        &mut self,
        now: Instant,
        messenger: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) -> Vec<RemoteCommand, MAX_COMMANDS_PER_POLL> {
        let mut commands = Vec::new();
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < self.interval {
                return commands;
            }
        }
        self.last_poll = Some(now);

        'batches: for _ in 0..MAX_BATCHES_PER_POLL {
            let updates = match messenger.get_updates(self.last_update_id + 1) {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("Remote: getUpdates failed ({})", e);
                    sink.emit(&AppEvent::PollFailed(e));
                    break;
                }
            };
            if updates.is_empty() {
                break;
            }

            for update in updates {
                if commands.is_full() {
                    break 'batches;
                }
                self.last_update_id = self.last_update_id.max(update.update_id);

                if update.chat_id != self.authorized_chat {
                    debug!("Remote: dropped message from chat {}", update.chat_id);
                    sink.emit(&AppEvent::UnauthorizedSender {
                        chat_id: update.chat_id,
                    });
                    continue;
                }

                match RemoteCommand::parse(&update.text) {
                    Some(command) => {
                        sink.emit(&AppEvent::CommandReceived(command));
                        // Cannot fail: fullness is checked above.
                        let _ = commands.push(command);
                    }
                    None => sink.emit(&AppEvent::UnrecognizedCommand),
                }
            }
        }
        commands
    }

    pub fn last_update_id(&self) -> i64 {
        self.last_update_id
    }
}
