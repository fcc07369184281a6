//! Inbound remote commands.
//!
//! These represent actions requested by the recipient chat.  Text is
//! matched once against a static table (exact, case-sensitive); anything
//! not in the table is unrecognised and dropped.

/// Commands the authorised chat can send to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommand {
    /// `/start` — list the available commands.
    Help,
    /// `/show` — reply with the owner's name and mobile number.
    ShowInfo,
    /// `/photo` — capture and upload a photo.
    CapturePhoto,
    /// `/location` — reply with the current location.
    SendLocation,
    /// `/track` — enable the tracking flag.
    StartTracking,
    /// `/stop` — clear the tracking flag.
    StopTracking,
}

/// Literal → command.  Order is the order shown by `/start`.
pub static COMMAND_TABLE: [(&str, RemoteCommand); 6] = [
    ("/start", RemoteCommand::Help),
    ("/show", RemoteCommand::ShowInfo),
    ("/photo", RemoteCommand::CapturePhoto),
    ("/location", RemoteCommand::SendLocation),
    ("/track", RemoteCommand::StartTracking),
    ("/stop", RemoteCommand::StopTracking),
];

impl RemoteCommand {
    /// Exact-match lookup in [`COMMAND_TABLE`].
    pub fn parse(text: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(literal, _)| *literal == text)
            .map(|&(_, command)| command)
    }

    /// One-line description shown by `/start`.
    pub fn description(self) -> &'static str {
        match self {
            Self::Help => "list commands",
            Self::ShowInfo => "user info",
            Self::CapturePhoto => "capture photo",
            Self::SendLocation => "send location",
            Self::StartTracking => "start simple tracking",
            Self::StopTracking => "stop tracking",
        }
    }

    /// Whether running this command waits on the camera or the GPS.
    pub fn may_stall(self) -> bool {
        matches!(self, Self::CapturePhoto | Self::SendLocation)
    }

    /// The literal that selects this command.
    pub fn literal(self) -> &'static str {
        COMMAND_TABLE
            .iter()
            .find(|(_, command)| *command == self)
            .map_or("", |&(literal, _)| literal)
    }
}

/// Reply to `/start`.
pub fn help_text() -> String {
    let mut text = String::from("Aurix:");
    for (literal, command) in COMMAND_TABLE.iter().skip(1) {
        text.push('\n');
        text.push_str(literal);
        text.push_str(" - ");
        text.push_str(command.description());
    }
    text
}
