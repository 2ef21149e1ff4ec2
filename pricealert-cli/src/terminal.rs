//! Rendering the flow's feedback on a terminal.

use ansi_term::Style;
use pricealert_core::ui::{Haptic, Navigate, Notice, Ui};
use std::{
    io::{stderr, Write},
    time::Duration,
};

/// [`Ui`] that prints to stdout and rings the terminal bell for bad news.
#[derive(Debug, Clone, Copy)]
pub struct TerminalUi {
    colors: bool,
    success_delay: Duration,
}

impl TerminalUi {
    /// `success_delay` is only used to tell the user how long the success
    /// message stays up.
    pub fn new(colors: bool, success_delay: Duration) -> Self {
        Self {
            colors,
            success_delay,
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.colors {
            Style::new().bold().paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Ui for TerminalUi {
    fn haptic(&self, feedback: Haptic) {
        tracing::debug!(?feedback, "Haptic feedback");
        if matches!(feedback, Haptic::Warning | Haptic::Error) {
            let mut err = stderr().lock();
            // Best effort, a closed stderr isn't worth failing over.
            let _ = err.write_all(b"\x07").and_then(|()| err.flush());
        }
    }

    fn notify(&self, notice: Notice) {
        println!("{}: {}", self.heading(notice.title()), notice.message());
    }

    fn success_modal(&self, visible: bool) {
        if visible {
            println!();
            println!("{}", self.heading("Email verified"));
            println!("You will now receive daily price alerts.");
            println!(
                "Returning home in {} seconds...",
                self.success_delay.as_secs()
            );
        }
    }

    fn navigate(&self, to: Navigate) {
        match to {
            Navigate::VerifyEmail { email } => {
                println!();
                println!("{}", self.heading("Check your email"));
                println!("We just sent a 6-digit code to {email}.");
            }
            Navigate::Root => {
                tracing::info!("Back at the home screen");
            }
        }
    }
}
