//! The price alert sign-up screen: take an address, get a code sent to it,
//! hand over to verification.

use crate::{
    api::{interpret_otp_request_response, OtpRequestOutcome},
    client::AlertApi,
    email::{validate_email, EmailAddress},
    error::RequestError,
    store::{set_best_effort, SecureStore, StoreKey},
    ui::{Haptic, Navigate, Notice, Ui},
};

/// Where the code request stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpRequestState {
    /// Nothing sent yet
    #[default]
    Idle,
    /// Waiting for the server
    Sending,
    /// A code is on its way
    Sent,
    /// The last attempt didn't work
    Failed,
}

/// Collects an address and requests a code for it.
#[derive(Debug)]
pub struct AlertRequest<A, S, U> {
    state: OtpRequestState,
    api: A,
    store: S,
    ui: U,
}

impl<A, S, U> AlertRequest<A, S, U>
where
    A: AlertApi,
    S: SecureStore,
    U: Ui,
{
    /// A new screen instance
    pub fn new(api: A, store: S, ui: U) -> Self {
        Self {
            state: OtpRequestState::Idle,
            api,
            store,
            ui,
        }
    }

    /// Current request state
    pub fn state(&self) -> OtpRequestState {
        self.state
    }

    /// Whether submitting `candidate` is allowed right now.
    pub fn can_submit(&self, candidate: &str) -> bool {
        self.state != OtpRequestState::Sending && validate_email(candidate)
    }

    /// The address a code was last requested for, to pre-fill the input.
    pub fn remembered_email(&self) -> Option<String> {
        match self.store.get_item(StoreKey::UserEmail) {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(%e, "Couldn't read remembered email");
                None
            }
        }
    }

    /// Request a code for `candidate` and, on success, navigate to verification.
    ///
    /// Every outcome is also reported through the [`Ui`]. The returned
    /// [`Navigate`] is the same value handed to [`Ui::navigate`].
    #[tracing::instrument(skip(self))]
    pub async fn request_otp(&mut self, candidate: &str) -> Result<Navigate, RequestError> {
        let email = match EmailAddress::parse(candidate) {
            Ok(email) => email,
            Err(e) => {
                self.ui.notify(Notice::InvalidEmail);
                return Err(e);
            }
        };

        self.state = OtpRequestState::Sending;
        tracing::debug!("Requesting OTP");

        let reply = match self.api.request_otp(&email).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(%e, "OTP request failed");
                self.state = OtpRequestState::Failed;
                self.ui.haptic(Haptic::Error);
                self.ui.notify(Notice::NetworkError);
                return Err(e.into());
            }
        };

        match interpret_otp_request_response(&reply) {
            OtpRequestOutcome::Accepted => {
                set_best_effort(&self.store, StoreKey::UserEmail, email.as_str());

                self.state = OtpRequestState::Sent;
                self.ui.haptic(Haptic::Success);
                self.ui.notify(Notice::OtpSent);

                let to = Navigate::VerifyEmail { email };
                self.ui.navigate(to.clone());
                tracing::info!("OTP sent, moving on to verification");
                Ok(to)
            }
            OtpRequestOutcome::Rejected { message } => {
                tracing::info!(status = %reply.status, ?message, "OTP request rejected");
                self.state = OtpRequestState::Failed;
                self.ui.haptic(Haptic::Error);
                self.ui.notify(Notice::RequestFailed {
                    message: message.clone(),
                });
                Err(RequestError::Rejected { message })
            }
        }
    }
}
