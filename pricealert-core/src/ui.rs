//! The seam to whatever renders the flow: notices, haptics, the success modal
//! and navigation.

use std::fmt;

use crate::email::EmailAddress;

/// Notification feedback kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    /// Something worked
    Success,
    /// Something odd happened but nothing was lost
    Warning,
    /// Something failed
    Error,
}

/// Destinations the flow can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigate {
    /// Code entry for the given address
    VerifyEmail {
        /// Address the code was sent to
        email: EmailAddress,
    },
    /// The application's home screen, replacing the navigation stack
    Root,
}

/// User facing messages of the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The address doesn't look like one
    InvalidEmail,
    /// A code was sent
    OtpSent,
    /// The code request was declined
    RequestFailed {
        /// Server message, shown verbatim when present
        message: Option<String>,
    },
    /// No response from the server
    NetworkError,
    /// Fewer than six digits entered
    IncompleteCode,
    /// The server says the code is wrong
    InvalidCode,
    /// The server answered with something we don't understand
    UnexpectedResponse {
        /// Server message, shown verbatim when present
        message: Option<String>,
    },
    /// A new code was sent
    CodeResent,
    /// The resend was declined
    ResendFailed {
        /// Server message, shown verbatim when present
        message: Option<String>,
    },
    /// Resends are used up for this screen
    ResendLimitReached,
    /// Resend tapped during the cooldown
    ResendCooldown {
        /// Seconds until resending is possible
        seconds_remaining: u32,
    },
}

impl Notice {
    /// Short heading
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "Invalid Email",
            Self::OtpSent => "OTP Sent",
            Self::RequestFailed { .. } | Self::ResendFailed { .. } => "Error",
            Self::NetworkError => "Network Error",
            Self::IncompleteCode => "Incomplete Code",
            Self::InvalidCode => "Invalid Code",
            Self::UnexpectedResponse { .. } => "Unexpected Response",
            Self::CodeResent => "Code Resent",
            Self::ResendLimitReached => "Resend limit reached",
            Self::ResendCooldown { .. } => "Please wait",
        }
    }

    /// Body text
    pub fn message(&self) -> String {
        match self {
            Self::InvalidEmail => "Please enter a valid email address.".to_string(),
            Self::OtpSent => "A verification code has been sent to your email.".to_string(),
            Self::RequestFailed { message } => message
                .clone()
                .unwrap_or_else(|| "Failed to send OTP. Try again.".to_string()),
            Self::NetworkError => "Something went wrong. Please try again.".to_string(),
            Self::IncompleteCode => "Please enter the 6-digit code.".to_string(),
            Self::InvalidCode => "The code you entered is incorrect.".to_string(),
            Self::UnexpectedResponse { message } => message.clone().unwrap_or_else(|| {
                "Unexpected response from server. Please try again.".to_string()
            }),
            Self::CodeResent => "A new verification code has been sent to your email.".to_string(),
            Self::ResendFailed { message } => message
                .clone()
                .unwrap_or_else(|| "Failed to resend code. Try again.".to_string()),
            Self::ResendLimitReached => {
                "You have used all resend attempts. Start again to get a new code.".to_string()
            }
            Self::ResendCooldown { seconds_remaining } => {
                format!("You can request a new code in {seconds_remaining}s.")
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}

/// Everything the flow asks of its presentation layer.
pub trait Ui {
    /// Fire notification feedback
    fn haptic(&self, feedback: Haptic);

    /// Show a message
    fn notify(&self, notice: Notice);

    /// Show or hide the verification success modal
    fn success_modal(&self, visible: bool);

    /// Move to another screen
    fn navigate(&self, to: Navigate);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_server_message_wins() {
        let notice = Notice::RequestFailed {
            message: Some("Email not subscribed".to_string()),
        };
        assert_eq!(notice.to_string(), "Error: Email not subscribed");

        let notice = Notice::RequestFailed { message: None };
        assert_eq!(notice.message(), "Failed to send OTP. Try again.");
    }

    #[test_log::test]
    fn test_cooldown_message_counts_down() {
        let notice = Notice::ResendCooldown {
            seconds_remaining: 42,
        };
        assert_eq!(notice.message(), "You can request a new code in 42s.");
    }
}
