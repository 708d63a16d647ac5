use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use doclib::{
    Credential, DownloadError, ListingSchema, Remote, RetrievalError, Secret, SourceUrl,
};
use doclib_ntlm::{LISTING_ACCEPT, NtlmClientConfig, NtlmRemote};
use wiremock::matchers::{header, header_exists, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/sites/pmo/_vti_bin/listdata.svc/Documents";

fn remote() -> NtlmRemote {
    NtlmRemote::new(NtlmClientConfig::default()).unwrap()
}

fn credential() -> Credential {
    Credential::new("AZ", "jdoe", Secret::new("pw"))
}

fn listing_url(server: &MockServer) -> String {
    format!("{}{LISTING_PATH}", server.uri())
}

const NEGOTIATE_PREFIX: &str = "^NTLM TlRMTVNTUAAB";
const AUTHENTICATE_PREFIX: &str = "^NTLM TlRMTVNTUAAD";

fn challenge_header() -> String {
    let message = ntlmclient::Message::Challenge(ntlmclient::ChallengeMessage {
        target_name: "AZ".into(),
        flags: ntlmclient::Flags::NEGOTIATE_UNICODE | ntlmclient::Flags::NEGOTIATE_NTLM,
        challenge: [1, 2, 3, 4, 5, 6, 7, 8],
        context: (0, 0),
        target_information: vec![],
        os_version: Default::default(),
    });
    format!("NTLM {}", STANDARD.encode(message.to_bytes().unwrap()))
}

/// Answer the negotiate leg of `route` with a challenge and the
/// authenticate leg with `success`.
async fn mount_handshake(server: &MockServer, route: &str, success: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header_regex("authorization", NEGOTIATE_PREFIX))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", challenge_header().as_str()),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .and(header_regex("authorization", AUTHENTICATE_PREFIX))
        .respond_with(success)
        .expect(1)
        .mount(server)
        .await;
}

/// Decode the authenticate message the client sent on the last request.
async fn sent_authenticate(server: &MockServer) -> ntlmclient::AuthenticateMessage {
    let requests = server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    let value = last.headers.get("authorization").unwrap().to_str().unwrap();
    let raw = STANDARD.decode(value.strip_prefix("NTLM ").unwrap()).unwrap();

    match ntlmclient::Message::try_from(raw.as_slice()).unwrap() {
        ntlmclient::Message::Authenticate(message) => message,
        other => panic!("expected authenticate message, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_sends_auth_and_accept_headers() {
    let server = MockServer::start().await;
    let fixture = include_str!("fixtures/listing_verbose.json");

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(header("accept", LISTING_ACCEPT))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let body = remote()
        .fetch_listing(&listing_url(&server), &credential())
        .await
        .unwrap();

    assert_eq!(body["d"]["results"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn listing_completes_ntlm_handshake_with_listing_domain() {
    let server = MockServer::start().await;
    let fixture = include_str!("fixtures/listing_verbose.json");
    mount_handshake(
        &server,
        LISTING_PATH,
        ResponseTemplate::new(200).set_body_raw(fixture, "application/json"),
    )
    .await;

    let body = remote()
        .fetch_listing(&listing_url(&server), &credential())
        .await
        .unwrap();
    assert_eq!(body["d"]["results"].as_array().unwrap().len(), 4);

    let authenticate = sent_authenticate(&server).await;
    assert_eq!(authenticate.domain_name, "AZ");
    assert_eq!(authenticate.user_name, "jdoe");
    assert_eq!(authenticate.workstation_name, "DOCLIB-FETCHER");
}

#[tokio::test]
async fn file_completes_ntlm_handshake_with_download_domain() {
    let server = MockServer::start().await;
    mount_handshake(
        &server,
        "/sites/pmo/Shared%20Documents/Scope.xlsx",
        ResponseTemplate::new(200).set_body_bytes(b"sheet".to_vec()),
    )
    .await;

    let url = SourceUrl::normalize(&format!(
        "{}/sites/pmo/Shared Documents/Scope.xlsx",
        server.uri()
    ))
    .unwrap();
    let download_credential = Credential::new("AM", "jdoe", Secret::new("pw"));

    let bytes = remote().fetch_file(&url, &download_credential).await.unwrap();
    assert_eq!(bytes, b"sheet");

    let authenticate = sent_authenticate(&server).await;
    assert_eq!(authenticate.domain_name, "AM");
    assert_eq!(authenticate.user_name, "jdoe");
}

#[tokio::test]
async fn rejected_authenticate_surfaces_401() {
    let server = MockServer::start().await;
    mount_handshake(&server, "/sites/pmo/locked.xlsx", ResponseTemplate::new(401)).await;

    let url = SourceUrl::normalize(&format!("{}/sites/pmo/locked.xlsx", server.uri())).unwrap();
    let result = remote().fetch_file(&url, &credential()).await;
    assert_eq!(result, Err(DownloadError::Status(401)));
}

#[tokio::test]
async fn listing_fixture_extracts_three_records_and_one_malformed() {
    let server = MockServer::start().await;
    let fixture = include_str!("fixtures/listing_verbose.json");

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .mount(&server)
        .await;

    let remote = remote();
    let listing = doclib::fetch_listing(
        &remote,
        &listing_url(&server),
        &credential(),
        &ListingSchema::default(),
    )
    .await
    .unwrap();

    let names: Vec<&str> = listing.records.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["Requirements v1.xlsx", "Kickoff.pptx", "Scope.xlsx"]);
    assert_eq!(
        listing.records[0].source_url.as_str(),
        "http://server/sites/pmo/Shared%20Documents/Requirements%20v1.xlsx"
    );
    assert_eq!(listing.malformed.len(), 1);
    assert_eq!(listing.malformed[0].index, 3);
}

#[tokio::test]
async fn listing_non_success_status_is_retrieval_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = remote().fetch_listing(&listing_url(&server), &credential()).await;
    assert_eq!(result, Err(RetrievalError::Status(500)));
}

#[tokio::test]
async fn unauthorized_without_ntlm_challenge_surfaces_401() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Negotiate"))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote().fetch_listing(&listing_url(&server), &credential()).await;
    assert_eq!(result, Err(RetrievalError::Status(401)));
}

#[tokio::test]
async fn garbled_ntlm_challenge_is_a_handshake_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", "NTLM not-base64!!"),
        )
        .mount(&server)
        .await;

    let result = remote().fetch_listing(&listing_url(&server), &credential()).await;
    match result {
        Err(RetrievalError::Network(msg)) => assert!(msg.contains("NTLM handshake failed")),
        other => panic!("expected handshake failure, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_with_invalid_json_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = remote().fetch_listing(&listing_url(&server), &credential()).await;
    assert!(matches!(result, Err(RetrievalError::Parse(_))));
}

#[tokio::test]
async fn slow_listing_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let remote = NtlmRemote::new(NtlmClientConfig {
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let result = remote.fetch_listing(&listing_url(&server), &credential()).await;
    assert_eq!(result, Err(RetrievalError::Timeout));
}

#[tokio::test]
async fn slow_file_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/pmo/big.xlsx"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let remote = NtlmRemote::new(NtlmClientConfig {
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let url = SourceUrl::normalize(&format!("{}/sites/pmo/big.xlsx", server.uri())).unwrap();
    let result = remote.fetch_file(&url, &credential()).await;
    assert_eq!(result, Err(DownloadError::Timeout));
}

#[tokio::test]
async fn fetch_file_returns_raw_bytes() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = vec![0x50, 0x4b, 0x03, 0x04, 0x00, 0xff];

    Mock::given(method("GET"))
        .and(path("/sites/pmo/Shared%20Documents/Scope.xlsx"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let url = SourceUrl::normalize(&format!(
        "{}/sites/pmo/Shared Documents/Scope.xlsx",
        server.uri()
    ))
    .unwrap();

    let bytes = remote().fetch_file(&url, &credential()).await.unwrap();
    assert_eq!(bytes, payload);
}

#[tokio::test]
async fn fetch_file_404_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/pmo/missing.xlsx"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = SourceUrl::normalize(&format!("{}/sites/pmo/missing.xlsx", server.uri())).unwrap();
    let result = remote().fetch_file(&url, &credential()).await;
    assert_eq!(result, Err(DownloadError::Status(404)));
}

#[tokio::test]
async fn fetch_file_connection_refused_is_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let url = SourceUrl::normalize(&format!("http://127.0.0.1:{port}/a.xlsx")).unwrap();
    let result = remote().fetch_file(&url, &credential()).await;
    assert!(matches!(result, Err(DownloadError::Network(_))));
}
