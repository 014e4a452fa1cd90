//! Tests for the custody API client

use super::{validate_response, CustodyClient};
use crate::crypto::{sign, CryptoProvider, RsaCryptoProvider};
use crate::types::{CustodyConfig, Platform, Web3TransactionRequest, WithdrawRequest};
use crate::CustodyError;
use mockito::{Matcher, Server};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const PRIVATE_PKCS8: &str = include_str!("../../testdata/private_pkcs8.pem");
const PUBLIC_SPKI: &str = include_str!("../../testdata/public.pem");

/// Passes payloads through unchanged so request bodies can be matched
struct PlaintextProvider {
    signature: &'static str,
}

impl CryptoProvider for PlaintextProvider {
    fn encrypt_with_private_key(&self, data: &str) -> crate::Result<String> {
        Ok(data.to_string())
    }

    fn decrypt_with_public_key(&self, encrypted_data: &str) -> crate::Result<String> {
        Ok(encrypted_data.to_string())
    }

    fn sign(&self, _data: &str) -> crate::Result<String> {
        Ok(self.signature.to_string())
    }
}

fn mpc_config(host: &str) -> CustodyConfig {
    CustodyConfig::mpc("app-1")
        .with_host(host)
        .with_private_key(PRIVATE_PKCS8)
        .with_public_key(PUBLIC_SPKI)
}

fn rsa_client(host: &str) -> CustodyClient {
    CustodyClient::new(mpc_config(host)).unwrap()
}

fn plaintext_client(host: &str, signature: &'static str) -> CustodyClient {
    let config = CustodyConfig::mpc("app-1").with_host(host);
    CustodyClient::with_provider(config, Arc::new(PlaintextProvider { signature })).unwrap()
}

/// Encrypt a response document the way the platform does
fn platform_encrypt(document: &Value) -> String {
    let provider = RsaCryptoProvider::new(PRIVATE_PKCS8, "", "").unwrap();
    provider
        .encrypt_with_private_key(&document.to_string())
        .unwrap()
}

fn withdraw_request() -> WithdrawRequest {
    WithdrawRequest::new("req-1", 1000537, "ETH", "1.0001000", "0xabc")
}

fn web3_request() -> Web3TransactionRequest {
    Web3TransactionRequest {
        request_id: "req-2".to_string(),
        sub_wallet_id: 1000537,
        main_chain_symbol: "ETH".to_string(),
        interactive_contract: "0xcontract".to_string(),
        amount: "0".to_string(),
        gas_price: "20".to_string(),
        gas_limit: "60000".to_string(),
        input_data: "0xa9059cbb".to_string(),
        trans_type: "1".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_client_requires_keys() {
    let config = CustodyConfig::mpc("app-1");
    let err = CustodyClient::new(config).unwrap_err();
    assert!(matches!(err, CustodyError::Config { .. }));
}

#[test]
fn test_client_rejects_malformed_key() {
    let config = CustodyConfig::mpc("app-1").with_private_key("not a key");
    let err = CustodyClient::new(config).unwrap_err();
    assert!(matches!(err, CustodyError::KeyFormat { .. }));
}

#[test]
fn test_custom_provider_skips_key_requirements() {
    let client = plaintext_client("https://api.example.com", "sig");
    assert_eq!(client.config().app_id, "app-1");
    assert_eq!(client.config().platform, Platform::Mpc);
}

#[test]
fn test_debug_does_not_leak_keys() {
    let client = rsa_client("https://api.example.com");
    let debug = format!("{:?}", client);
    assert!(!debug.contains("BEGIN PRIVATE KEY"));
}

#[test]
fn test_request_args_carry_time_and_charset() {
    let client = rsa_client("https://api.example.com");
    let mut params = Map::new();
    params.insert("symbol".to_string(), json!("ETH"));

    let raw = client.build_request_args(params).unwrap();
    let args: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(args["symbol"], "ETH");
    assert_eq!(args["charset"], "utf-8");
    assert!(args["time"].as_i64().unwrap() > 1_600_000_000_000);
    assert!(!raw.contains(": "));
}

#[tokio::test]
async fn test_invoke_decrypts_response() {
    let mut server = Server::new_async().await;
    let decrypted = json!({"code": 0, "msg": "success", "data": {"uid": 7}});
    let _mock = server
        .mock("POST", "/api/mpc/wallet/create")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("app_id".into(), "app-1".into()),
            Matcher::Regex("data=".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"code": 0, "data": platform_encrypt(&decrypted)}).to_string())
        .create_async()
        .await;

    let client = rsa_client(&server.url());
    let envelope = client
        .post("/api/mpc/wallet/create", Map::new())
        .await
        .unwrap();
    assert_eq!(envelope, decrypted);
}

#[tokio::test]
async fn test_call_returns_data() {
    let mut server = Server::new_async().await;
    let decrypted = json!({"code": "0", "msg": "success", "data": [{"symbol": "ETH"}]});
    let _mock = server
        .mock("GET", "/api/mpc/wallet/coin_list")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("app_id".into(), "app-1".into()),
            Matcher::Regex("data=".into()),
        ]))
        .with_status(200)
        .with_body(json!({"data": platform_encrypt(&decrypted)}).to_string())
        .create_async()
        .await;

    let client = rsa_client(&server.url());
    let data = client
        .call(Method::GET, "api/mpc/wallet/coin_list", Map::new())
        .await
        .unwrap();
    assert_eq!(data, json!([{"symbol": "ETH"}]));
}

#[tokio::test]
async fn test_plaintext_error_envelope_is_kept() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/mpc/billing/withdraw")
        .with_status(200)
        .with_body(json!({"code": "100004", "msg": "invalid sign", "data": "plain"}).to_string())
        .create_async()
        .await;

    let client = rsa_client(&server.url());
    let envelope = client
        .post("api/mpc/billing/withdraw", Map::new())
        .await
        .unwrap();
    assert_eq!(envelope["msg"], "invalid sign");

    let err = validate_response(Platform::Mpc, envelope).unwrap_err();
    match err {
        CustodyError::Api { code, message } => {
            assert_eq!(code, Some(100004));
            assert_eq!(message, "invalid sign");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_non_200_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/mpc/wallet/create")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let client = rsa_client(&server.url());
    let err = client
        .post("api/mpc/wallet/create", Map::new())
        .await
        .unwrap_err();

    match &err {
        CustodyError::UnexpectedStatus { status, body } => {
            assert_eq!(*status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalid_json_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/mpc/wallet/create")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = rsa_client(&server.url());
    let err = client
        .post("api/mpc/wallet/create", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CustodyError::Json(_)));
}

#[tokio::test]
async fn test_waas_paths_use_version_prefix() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v2/user/info")
        .with_status(200)
        .with_body(json!({"code": 0, "data": {"uid": 1}}).to_string())
        .create_async()
        .await;

    let config = CustodyConfig::waas("app-1").with_host(server.url());
    let client = CustodyClient::with_provider(
        config,
        Arc::new(PlaintextProvider { signature: "" }),
    )
    .unwrap();

    let data = client
        .call(Method::POST, "/user/info", Map::new())
        .await
        .unwrap();
    assert_eq!(data, json!({"uid": 1}));
}

#[tokio::test]
async fn test_unsupported_method() {
    let client = rsa_client("https://api.example.com");
    let err = client
        .invoke(Method::DELETE, "api/mpc/wallet/create", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CustodyError::Config { .. }));
}

#[tokio::test]
async fn test_withdraw_attaches_signature() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/mpc/billing/withdraw")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("%22sign%22%3A%22SIG%22".into()),
            Matcher::Regex("%22request_id%22%3A%22req-1%22".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({"code": 0, "data": r#"{"code":0,"data":{"withdraw_id":42}}"#}).to_string(),
        )
        .create_async()
        .await;

    let client = plaintext_client(&server.url(), "SIG");
    let request = withdraw_request().with_transaction_sign(true);
    let data = client.withdraw(&request).await.unwrap();
    assert_eq!(data, json!({"withdraw_id": 42}));
}

#[tokio::test]
async fn test_withdraw_without_sign_flag_sends_no_signature() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/mpc/billing/withdraw")
        .match_body(Matcher::Regex("%22sign%22".into()))
        .with_status(200)
        .with_body(json!({"code": 0, "data": ""}).to_string())
        .expect(0)
        .create_async()
        .await;
    let _fallback = server
        .mock("POST", "/api/mpc/billing/withdraw")
        .with_status(200)
        .with_body(json!({"code": 0, "data": ""}).to_string())
        .create_async()
        .await;

    let client = plaintext_client(&server.url(), "SIG");
    let data = client.withdraw(&withdraw_request()).await.unwrap();
    assert_eq!(data, json!({}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_signature_is_an_error() {
    let client = plaintext_client("https://api.example.com", "");
    let request = withdraw_request().with_transaction_sign(true);
    let err = client.withdraw(&request).await.unwrap_err();
    assert!(matches!(err, CustodyError::Signature { .. }));
}

#[tokio::test]
async fn test_withdraw_validates_before_sending() {
    let client = plaintext_client("https://api.example.com", "SIG");
    let mut request = withdraw_request();
    request.symbol.clear();

    match client.withdraw(&request).await.unwrap_err() {
        CustodyError::Validation { field, .. } => assert_eq!(field, "symbol"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_withdraw_requires_mpc_platform() {
    let config = CustodyConfig::waas("app-1");
    let client =
        CustodyClient::with_provider(config, Arc::new(PlaintextProvider { signature: "SIG" }))
            .unwrap();
    let err = client.withdraw(&withdraw_request()).await.unwrap_err();
    assert!(matches!(err, CustodyError::Config { .. }));
}

/// Plaintext transport with real RSA signatures
struct RsaSigningPlaintextProvider {
    signer: RsaCryptoProvider,
}

impl CryptoProvider for RsaSigningPlaintextProvider {
    fn encrypt_with_private_key(&self, data: &str) -> crate::Result<String> {
        Ok(data.to_string())
    }

    fn decrypt_with_public_key(&self, encrypted_data: &str) -> crate::Result<String> {
        Ok(encrypted_data.to_string())
    }

    fn sign(&self, data: &str) -> crate::Result<String> {
        self.signer.sign(data)
    }
}

/// Form-encoded `"key":"value"` fragment of the JSON `data` field
fn form_fragment(key: &str, value: &str) -> String {
    url::form_urlencoded::byte_serialize(format!("\"{}\":\"{}\"", key, value).as_bytes())
        .collect()
}

#[tokio::test]
async fn test_web3_transaction_signed_with_rsa_key() {
    let request = web3_request().with_transaction_sign(true);
    let expected_sign =
        sign::generate_web3_sign_with_key(&request.to_params().unwrap(), PRIVATE_PKCS8).unwrap();
    assert!(!expected_sign.is_empty());

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/mpc/web3/trans/create")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(form_fragment("sign", &expected_sign)),
            Matcher::Regex(form_fragment("input_data", "0xa9059cbb")),
        ]))
        .with_status(200)
        .with_body(json!({"code": 0, "data": r#"{"code":0,"data":{"trans_id":9}}"#}).to_string())
        .create_async()
        .await;

    let signer = RsaCryptoProvider::new(PRIVATE_PKCS8, "", "").unwrap();
    let config = CustodyConfig::mpc("app-1").with_host(server.url());
    let client =
        CustodyClient::with_provider(config, Arc::new(RsaSigningPlaintextProvider { signer }))
            .unwrap();
    let data = client.create_web3_transaction(&request).await.unwrap();
    assert_eq!(data, json!({"trans_id": 9}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_web3_transaction_round_trips_with_rsa_transport() {
    let mut server = Server::new_async().await;
    let decrypted = json!({"code": 0, "data": {"trans_id": 9}});
    let _mock = server
        .mock("POST", "/api/mpc/web3/trans/create")
        .with_status(200)
        .with_body(json!({"code": 0, "data": platform_encrypt(&decrypted)}).to_string())
        .create_async()
        .await;

    let client = rsa_client(&server.url());
    let request = web3_request().with_transaction_sign(true);
    let data = client.create_web3_transaction(&request).await.unwrap();
    assert_eq!(data, json!({"trans_id": 9}));
}

#[test]
fn test_validate_response_codes() {
    let data = validate_response(Platform::Mpc, json!({"code": 0, "data": {"a": 1}})).unwrap();
    assert_eq!(data, json!({"a": 1}));

    let data = validate_response(Platform::Mpc, json!({"code": "0", "data": ""})).unwrap();
    assert_eq!(data, json!({}));

    let data = validate_response(Platform::Mpc, json!({"code": 0})).unwrap();
    assert_eq!(data, json!({}));

    let err = validate_response(Platform::Mpc, json!({"msg": "no code"})).unwrap_err();
    assert!(matches!(err, CustodyError::Api { code: None, .. }));

    let err = validate_response(Platform::Waas, json!({"code": 1001})).unwrap_err();
    match err {
        CustodyError::Api { code, message } => {
            assert_eq!(code, Some(1001));
            assert_eq!(message, "Unknown error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_validate_response_waas_leniency() {
    let envelope = json!({"uid": 7, "nickname": "demo"});
    let data = validate_response(Platform::Waas, envelope.clone()).unwrap();
    assert_eq!(data, envelope);

    let data = validate_response(Platform::Waas, json!([1, 2])).unwrap();
    assert_eq!(data, json!([1, 2]));

    assert!(validate_response(Platform::Mpc, json!([1, 2])).is_err());
}

#[test]
fn test_notify_decoder_shares_client_keys() {
    let client = rsa_client("https://api.example.com");
    let cipher = platform_encrypt(&json!({"side": "withdraw", "amount": "1"}));
    let decoded = client.notify_decoder().decode_notification(&cipher).unwrap();
    assert_eq!(decoded["side"], "withdraw");
}
