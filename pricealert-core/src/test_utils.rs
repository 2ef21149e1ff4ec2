//! Test doubles for the flow's collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use std::{collections::VecDeque, sync::Arc};

use crate::{
    api::ApiReply,
    client::AlertApi,
    email::EmailAddress,
    error::ApiError,
    ui::{Haptic, Navigate, Notice, Ui},
};

type Scripted = Result<ApiReply, String>;

#[derive(Debug, Default)]
struct MockApiInner {
    request_replies: VecDeque<Scripted>,
    confirm_replies: VecDeque<Scripted>,
    requests: Vec<String>,
    confirms: Vec<(String, String)>,
}

/// [`AlertApi`] answering from scripted replies and recording what it was asked.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply_request(&self, status: StatusCode, body: Value) -> &Self {
        self.inner
            .lock()
            .request_replies
            .push_back(Ok(ApiReply::json(status, body)));
        self
    }

    pub(crate) fn reply_request_raw(&self, status: StatusCode, body: &[u8]) -> &Self {
        self.inner
            .lock()
            .request_replies
            .push_back(Ok(ApiReply::from_bytes(status, body)));
        self
    }

    pub(crate) fn fail_request(&self, reason: &str) -> &Self {
        self.inner
            .lock()
            .request_replies
            .push_back(Err(reason.to_string()));
        self
    }

    pub(crate) fn reply_confirm(&self, status: StatusCode, body: Value) -> &Self {
        self.inner
            .lock()
            .confirm_replies
            .push_back(Ok(ApiReply::json(status, body)));
        self
    }

    pub(crate) fn fail_confirm(&self, reason: &str) -> &Self {
        self.inner
            .lock()
            .confirm_replies
            .push_back(Err(reason.to_string()));
        self
    }

    /// Emails for which a code was requested, in order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.inner.lock().requests.clone()
    }

    /// (email, otp) pairs submitted for confirmation, in order
    pub(crate) fn confirms(&self) -> Vec<(String, String)> {
        self.inner.lock().confirms.clone()
    }
}

fn into_result(scripted: Option<Scripted>, call: &str) -> Result<ApiReply, ApiError> {
    match scripted {
        Some(Ok(reply)) => Ok(reply),
        Some(Err(reason)) => Err(ApiError::Transport(
            reqwest_middleware::Error::Middleware(anyhow::anyhow!(reason)),
        )),
        None => panic!("MockApi: unexpected {call} call, no reply scripted"),
    }
}

#[async_trait]
impl AlertApi for MockApi {
    async fn request_otp(&self, email: &EmailAddress) -> Result<ApiReply, ApiError> {
        let scripted = {
            let mut inner = self.inner.lock();
            inner.requests.push(email.to_string());
            inner.request_replies.pop_front()
        };
        into_result(scripted, "request_otp")
    }

    async fn confirm_otp(&self, email: &EmailAddress, otp: &str) -> Result<ApiReply, ApiError> {
        let scripted = {
            let mut inner = self.inner.lock();
            inner.confirms.push((email.to_string(), otp.to_string()));
            inner.confirm_replies.pop_front()
        };
        into_result(scripted, "confirm_otp")
    }
}

/// Everything a [`RecordingUi`] was told, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiEvent {
    Haptic(Haptic),
    Notice(Notice),
    Modal(bool),
    Navigate(Navigate),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingUi {
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl RecordingUi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Notice(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_notice(&self) -> Option<Notice> {
        self.notices().pop()
    }

    pub(crate) fn haptics(&self) -> Vec<Haptic> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Haptic(haptic) => Some(haptic),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn navigations(&self) -> Vec<Navigate> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Navigate(to) => Some(to),
                _ => None,
            })
            .collect()
    }
}

impl Ui for RecordingUi {
    fn haptic(&self, feedback: Haptic) {
        self.events.lock().push(UiEvent::Haptic(feedback));
    }

    fn notify(&self, notice: Notice) {
        self.events.lock().push(UiEvent::Notice(notice));
    }

    fn success_modal(&self, visible: bool) {
        self.events.lock().push(UiEvent::Modal(visible));
    }

    fn navigate(&self, to: Navigate) {
        self.events.lock().push(UiEvent::Navigate(to));
    }
}
