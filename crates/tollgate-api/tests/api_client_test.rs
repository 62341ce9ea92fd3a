// Integration tests for `ApiClient` using wiremock.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tollgate_api::{ApiClient, EntityKind, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct VoucherRow {
    id: String,
    code: String,
    package_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewVoucher<'a> {
    code: &'a str,
    package_key: &'a str,
}

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "v1", "code": "VOUCHER_AB12CD", "packageKey": "daily" },
            { "id": "v2", "code": "VOUCHER_ZZ99YY", "packageKey": "weekly" },
        ])))
        .mount(&server)
        .await;

    let rows: Vec<VoucherRow> = client.list_entities(EntityKind::Vouchers).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].code, "VOUCHER_AB12CD");
    assert_eq!(rows[1].package_key, "weekly");
}

#[tokio::test]
async fn test_list_data_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "v1", "code": "A_1", "packageKey": "daily" }]
        })))
        .mount(&server)
        .await;

    let rows: Vec<VoucherRow> = client.list_entities(EntityKind::Vouchers).await.unwrap();

    assert_eq!(
        rows,
        vec![VoucherRow {
            id: "v1".into(),
            code: "A_1".into(),
            package_key: "daily".into(),
        }]
    );
}

#[tokio::test]
async fn test_create_posts_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/vouchers"))
        .and(body_json(json!({ "code": "PROMO_X1Y2Z3", "packageKey": "daily" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "new-1", "code": "PROMO_X1Y2Z3", "packageKey": "daily"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = NewVoucher {
        code: "PROMO_X1Y2Z3",
        package_key: "daily",
    };
    let created: VoucherRow = client
        .create_entity(EntityKind::Vouchers, &body)
        .await
        .unwrap();

    assert_eq!(created.id, "new-1");
}

#[tokio::test]
async fn test_update_uses_patch() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/subscriptions/sub-9"))
        .and(body_json(json!({ "suspended": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "sub-9", "suspended": true }
        })))
        .mount(&server)
        .await;

    let updated: serde_json::Value = client
        .update_entity(
            EntityKind::Subscriptions,
            "sub-9",
            &json!({ "suspended": true }),
        )
        .await
        .unwrap();

    assert_eq!(updated["suspended"], json!(true));
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/vouchers/v1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete_entity(EntityKind::Vouchers, "v1")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_api_key_header_is_sent() {
    let server = MockServer::start().await;
    let key = SecretString::from("s3cret-key".to_owned());
    let client =
        ApiClient::from_api_key(&server.uri(), &key, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/payments"))
        .and(header("X-API-KEY", "s3cret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rows: Vec<serde_json::Value> = client.list_entities(EntityKind::Payments).await.unwrap();
    assert!(rows.is_empty());
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/vouchers"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client
        .list_entities::<VoucherRow>(EntityKind::Vouchers)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidApiKey));
}

#[tokio::test]
async fn test_conflict_carries_message_and_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/vouchers"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "code already exists",
            "code": "voucher.code.duplicate"
        })))
        .mount(&server)
        .await;

    let body = NewVoucher {
        code: "DUP_AAAAAA",
        package_key: "daily",
    };
    let err = client
        .create_entity::<VoucherRow, _>(EntityKind::Vouchers, &body)
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.api_error_code(), Some("voucher.code.duplicate"));
    match err {
        Error::Api { status, message, .. } => {
            assert_eq!(status, 409);
            assert_eq!(message, "code already exists");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/vouchers/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let err = client
        .delete_entity(EntityKind::Vouchers, "missing")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        Error::Api { message, code, .. } => {
            assert_eq!(message, "not here");
            assert!(code.is_none());
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/vouchers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client
        .list_entities::<VoucherRow>(EntityKind::Vouchers)
        .await
        .unwrap_err();

    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}
