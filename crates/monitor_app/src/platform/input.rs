use monitor_core::Msg;

pub(crate) const CANCEL_PROMPT: &str = "Cancel this job? Type `y` + Enter to confirm.";

#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    Send(Msg),
    /// Ask before cancelling; the next line answers.
    Confirm,
    Ignore,
}

/// Line-based stdin commands. Cancelling needs a `y` on the following line.
#[derive(Debug, Default)]
pub(crate) struct CommandReader {
    awaiting_confirmation: bool,
}

impl CommandReader {
    pub(crate) fn read(&mut self, line: &str) -> Command {
        let line = line.trim();
        if std::mem::take(&mut self.awaiting_confirmation) {
            return match line {
                "y" | "yes" => Command::Send(Msg::CancelClicked),
                _ => Command::Ignore,
            };
        }
        match line {
            "c" | "cancel" => {
                self.awaiting_confirmation = true;
                Command::Confirm
            }
            "q" | "quit" => Command::Send(Msg::Detached),
            _ => Command::Ignore,
        }
    }
}
