//! The email verification screen: six digit code entry, confirmation, and
//! resending with a cooldown and a limit.

use std::time::Duration;

use crate::{
    api::{interpret_confirmation_response, interpret_otp_request_response, OtpRequestOutcome},
    client::AlertApi,
    cooldown::{Cooldown, ResendState},
    email::EmailAddress,
    error::VerifyError,
    otp::{validate_otp_format, OtpCode},
    settings::ResendPolicy,
    store::{set_best_effort, SecureStore, StoreKey},
    ui::{Haptic, Navigate, Notice, Ui},
};

/// Outcome of submitting a code to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The address is verified
    Success,
    /// The server says the code is wrong
    InvalidCode,
    /// The server answered with something else
    UnexpectedResponse {
        /// Server message, if it sent one
        message: Option<String>,
    },
    /// No answer from the server
    NetworkError,
}

/// Where the screen stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Waiting for the user to enter or fix the code
    Entering,
    /// Waiting for the server to judge the code
    Verifying,
    /// Verified. The screen is done.
    Verified,
}

/// Outcome of a resend attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    /// A new code was sent
    Sent,
    /// The request failed; resending is available again right away
    Failed,
    /// All resends are used up. Nothing was sent.
    LimitReached,
    /// The cooldown is still running. Nothing was sent.
    CoolingDown {
        /// Seconds left on the cooldown
        seconds_remaining: u32,
    },
    /// The address is already verified. Nothing was sent.
    AlreadyVerified,
}

/// One instance of the verification screen, bound to a single address.
///
/// Dropping it stops the cooldown ticker.
#[derive(Debug)]
pub struct Verification<A, S, U> {
    email: EmailAddress,
    code: OtpCode,
    state: VerificationState,
    cooldown: Cooldown,
    success_delay: Duration,
    api: A,
    store: S,
    ui: U,
}

impl<A, S, U> Verification<A, S, U>
where
    A: AlertApi,
    S: SecureStore,
    U: Ui,
{
    /// Open the screen for `email`, whose code was just sent.
    ///
    /// Starts the resend cooldown, so this must run inside a tokio runtime.
    pub fn mount(
        email: EmailAddress,
        api: A,
        store: S,
        ui: U,
        policy: ResendPolicy,
        success_delay: Duration,
    ) -> Self {
        let mut cooldown = Cooldown::new(policy);
        cooldown.start();
        tracing::debug!(%email, "Verification screen mounted");

        Self {
            email,
            code: OtpCode::new(),
            state: VerificationState::Entering,
            cooldown,
            success_delay,
            api,
            store,
            ui,
        }
    }

    /// The address being verified
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// The code entered so far
    pub fn code(&self) -> &OtpCode {
        &self.code
    }

    /// Current screen state
    pub fn state(&self) -> VerificationState {
        self.state
    }

    /// Resend counters as of now
    pub fn resend_state(&self) -> ResendState {
        self.cooldown.snapshot()
    }

    /// Whether the verify action is enabled
    pub fn can_verify(&self) -> bool {
        self.state == VerificationState::Entering
    }

    /// Whether the resend action is enabled
    pub fn can_resend(&self) -> bool {
        self.state == VerificationState::Entering && !self.resend_state().is_disabled()
    }

    /// Text change on cell `index`. Returns the cell to focus next.
    pub fn input(&mut self, index: usize, text: &str) -> usize {
        self.code.input(index, text)
    }

    /// Backspace on cell `index`. Returns the cell to focus next.
    pub fn backspace(&mut self, index: usize) -> usize {
        self.code.backspace(index)
    }

    /// Replace the whole code at once, as when it is typed on a single line.
    pub fn enter_code(&mut self, text: &str) -> usize {
        self.code.clear();
        self.code.input(0, text)
    }

    /// Submit the entered code.
    ///
    /// An incomplete code is refused locally. On success the success modal is
    /// shown for the configured delay, then the user is sent to the root
    /// screen before this returns.
    #[tracing::instrument(skip(self), fields(email = %self.email))]
    pub async fn verify(&mut self) -> Result<VerificationResult, VerifyError> {
        if self.state == VerificationState::Verified {
            return Ok(VerificationResult::Success);
        }

        let otp = self.code.joined();
        if !validate_otp_format(&otp) {
            self.ui.notify(Notice::IncompleteCode);
            return Err(VerifyError::InvalidFormat);
        }

        self.state = VerificationState::Verifying;
        tracing::debug!("Submitting code");

        let result = match self.api.confirm_otp(&self.email, &otp).await {
            Ok(reply) => interpret_confirmation_response(&reply),
            Err(e) => {
                tracing::error!(%e, "Code confirmation failed");
                VerificationResult::NetworkError
            }
        };

        tracing::info!(?result, "Code confirmation finished");

        match &result {
            VerificationResult::Success => {
                set_best_effort(&self.store, StoreKey::VerifiedEmail, self.email.as_str());
                self.state = VerificationState::Verified;
                self.cooldown.shutdown();

                self.ui.haptic(Haptic::Success);
                self.ui.success_modal(true);
                tokio::time::sleep(self.success_delay).await;
                self.ui.success_modal(false);
                self.ui.navigate(Navigate::Root);
            }
            VerificationResult::InvalidCode => {
                self.state = VerificationState::Entering;
                self.ui.haptic(Haptic::Error);
                self.ui.notify(Notice::InvalidCode);
            }
            VerificationResult::UnexpectedResponse { message } => {
                self.state = VerificationState::Entering;
                self.ui.haptic(Haptic::Warning);
                self.ui.notify(Notice::UnexpectedResponse {
                    message: message.clone(),
                });
            }
            VerificationResult::NetworkError => {
                self.state = VerificationState::Entering;
                self.ui.haptic(Haptic::Error);
                self.ui.notify(Notice::NetworkError);
            }
        }

        Ok(result)
    }

    /// Ask for another code.
    ///
    /// Refused without a request once verified, while the cooldown runs or
    /// once the limit is used up. Otherwise the cooldown restarts immediately; a failed
    /// request cancels it again so the user can retry at once.
    #[tracing::instrument(skip(self), fields(email = %self.email))]
    pub async fn resend(&mut self) -> ResendOutcome {
        if self.state == VerificationState::Verified {
            tracing::debug!("Resend refused, already verified");
            return ResendOutcome::AlreadyVerified;
        }

        let resend = self.cooldown.snapshot();
        if resend.limit_reached() {
            tracing::debug!(count = resend.count(), "Resend refused, limit reached");
            self.ui.notify(Notice::ResendLimitReached);
            return ResendOutcome::LimitReached;
        }
        if resend.is_cooling_down() {
            let seconds_remaining = resend.cooldown_remaining();
            tracing::debug!(seconds_remaining, "Resend refused, cooling down");
            self.ui.notify(Notice::ResendCooldown { seconds_remaining });
            return ResendOutcome::CoolingDown { seconds_remaining };
        }

        self.cooldown.start();

        let failure = match self.api.request_otp(&self.email).await {
            Ok(reply) => match interpret_otp_request_response(&reply) {
                OtpRequestOutcome::Accepted => None,
                OtpRequestOutcome::Rejected { message } => Some(Notice::ResendFailed { message }),
            },
            Err(e) => {
                tracing::error!(%e, "Resend request failed");
                Some(Notice::NetworkError)
            }
        };

        match failure {
            None => {
                self.cooldown.record_success();
                self.cooldown.start();
                self.code.clear();
                tracing::info!(count = self.cooldown.snapshot().count(), "Code resent");
                self.ui.haptic(Haptic::Success);
                self.ui.notify(Notice::CodeResent);
                ResendOutcome::Sent
            }
            Some(notice) => {
                self.cooldown.cancel();
                self.ui.haptic(Haptic::Error);
                self.ui.notify(notice);
                ResendOutcome::Failed
            }
        }
    }

    /// Leave the screen, stopping the cooldown ticker.
    pub fn unmount(mut self) {
        self.cooldown.shutdown();
        tracing::debug!(email = %self.email, "Verification screen unmounted");
    }
}
