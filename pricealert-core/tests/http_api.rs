//! The HTTP client against a mock proxy, and the whole flow on top of it.
use parking_lot::Mutex;
use pricealert_core::{
    alert_request::AlertRequest,
    api::{interpret_otp_request_response, OtpRequestOutcome},
    client::{AlertApi, HttpAlertApi},
    email::EmailAddress,
    settings::{ApiSettings, ResendPolicy},
    store::{MemoryStore, SecureStore, StoreKey},
    ui::{Haptic, Navigate, Notice, Ui},
    verification::{Verification, VerificationResult},
};
use reqwest::StatusCode;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use testresult::TestResult;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use url::Url;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn api_settings(server: &MockServer) -> Result<ApiSettings, url::ParseError> {
    Ok(ApiSettings {
        otp_request_endpoint: Url::parse(&format!(
            "{}/fs-api/proxy.php?type=daily_alert",
            server.uri()
        ))?,
        otp_confirm_endpoint: Url::parse(&format!(
            "{}/fs-api/proxy.php?type=verify_otp",
            server.uri()
        ))?,
        timeout_ms: 2_000,
    })
}

/// Answers one request with a 200 whose body stops well short of its
/// declared length, then hangs up.
async fn cut_off_body_server() -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      content-type: application/json\r\n\
                      content-length: 64\r\n\r\n\
                      {\"status\":",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });
    Ok(addr)
}

#[derive(Debug, Clone, Default)]
struct Screen {
    notices: Arc<Mutex<Vec<Notice>>>,
    navigations: Arc<Mutex<Vec<Navigate>>>,
}

impl Ui for Screen {
    fn haptic(&self, _feedback: Haptic) {}

    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }

    fn success_modal(&self, _visible: bool) {}

    fn navigate(&self, to: Navigate) {
        self.navigations.lock().push(to);
    }
}

#[test_log::test(tokio::test)]
async fn test_request_otp_posts_email() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fs-api/proxy.php"))
        .and(query_param("type", "daily_alert"))
        .and(body_json(json!({ "email": "user@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpAlertApi::new(&api_settings(&server)?)?;
    let reply = api
        .request_otp(&EmailAddress::parse("user@example.com")?)
        .await?;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        interpret_otp_request_response(&reply),
        OtpRequestOutcome::Accepted
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_error_status_is_a_reply_not_an_error() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "status": "not ok", "message": "Unknown email" })),
        )
        .mount(&server)
        .await;

    let api = HttpAlertApi::new(&api_settings(&server)?)?;
    let reply = api
        .request_otp(&EmailAddress::parse("user@example.com")?)
        .await?;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        interpret_otp_request_response(&reply),
        OtpRequestOutcome::Rejected {
            message: Some("Unknown email".to_string())
        }
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_unreachable_server_is_an_error() -> TestResult {
    let settings = ApiSettings {
        otp_request_endpoint: Url::parse("http://127.0.0.1:9/proxy.php?type=daily_alert")?,
        otp_confirm_endpoint: Url::parse("http://127.0.0.1:9/proxy.php?type=verify_otp")?,
        timeout_ms: 2_000,
    };
    let api = HttpAlertApi::new(&settings)?;

    let result = api
        .request_otp(&EmailAddress::parse("user@example.com")?)
        .await;
    assert!(result.is_err());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_slow_server_times_out() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let settings = ApiSettings {
        timeout_ms: 50,
        ..api_settings(&server)?
    };
    let api = HttpAlertApi::new(&settings)?;

    let result = api
        .confirm_otp(&EmailAddress::parse("user@example.com")?, "123456")
        .await;
    assert!(result.is_err());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_cut_off_confirmation_is_a_network_error() -> TestResult {
    let addr = cut_off_body_server().await?;
    let settings = ApiSettings {
        otp_request_endpoint: Url::parse(&format!("http://{addr}/proxy.php?type=daily_alert"))?,
        otp_confirm_endpoint: Url::parse(&format!("http://{addr}/proxy.php?type=verify_otp"))?,
        timeout_ms: 2_000,
    };
    let api = HttpAlertApi::new(&settings)?;
    let screen = Screen::default();

    let mut verification = Verification::mount(
        EmailAddress::parse("user@example.com")?,
        api,
        MemoryStore::new(),
        screen.clone(),
        ResendPolicy::default(),
        Duration::from_millis(10),
    );
    verification.input(0, "482913");

    assert_eq!(verification.verify().await?, VerificationResult::NetworkError);
    assert_eq!(screen.notices.lock().last(), Some(&Notice::NetworkError));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_subscribe_then_verify() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("type", "daily_alert"))
        .and(body_json(json!({ "email": "user@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "otp": "482913" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("type", "verify_otp"))
        .and(body_json(json!({ "email": "user@example.com", "otp": "482913" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpAlertApi::new(&api_settings(&server)?)?;
    let store = MemoryStore::new();
    let screen = Screen::default();

    let mut request = AlertRequest::new(api.clone(), store.clone(), screen.clone());
    let Navigate::VerifyEmail { email } = request.request_otp("user@example.com").await? else {
        panic!("expected a hand-off to verification");
    };
    assert_eq!(
        store.get_item(StoreKey::UserEmail)?.as_deref(),
        Some("user@example.com")
    );

    let mut verification = Verification::mount(
        email,
        api,
        store.clone(),
        screen.clone(),
        ResendPolicy::default(),
        Duration::from_millis(10),
    );
    verification.input(0, "482 913");
    assert_eq!(verification.verify().await?, VerificationResult::Success);

    assert_eq!(
        store.get_item(StoreKey::VerifiedEmail)?.as_deref(),
        Some("user@example.com")
    );
    assert_eq!(screen.navigations.lock().last(), Some(&Navigate::Root));
    assert_eq!(screen.notices.lock().first(), Some(&Notice::OtpSent));
    Ok(())
}
