use anyhow::Result;
use rps_config::VaultConfig;
use rps_secrets::{SecretError, SecretResolver, VaultResolver};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> Result<(MockServer, VaultResolver)> {
    let server = MockServer::start().await;
    let resolver = VaultResolver::new(&VaultConfig {
        address: Url::parse(&server.uri())?,
        token: "test-token".into(),
        secrets_path: "secret/data/".into(),
    })?;
    Ok((server, resolver))
}

#[tokio::test]
async fn reads_kv_v2_record_with_token() -> Result<()> {
    let (server, resolver) = setup().await?;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/profiles/office"))
        .and(header("X-Vault-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": { "AMT_PASSWORD": "Amt!Passw0rd", "MEBX_PASSWORD": "Mebx!Passw0rd" },
                "metadata": { "version": 3 }
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let record = resolver
        .get_secret_at_path("profiles/office")
        .await?
        .expect("record present");
    assert_eq!(record["AMT_PASSWORD"], "Amt!Passw0rd");

    let mebx = resolver
        .get_secret_from_key("profiles/office", "MEBX_PASSWORD")
        .await?;
    assert_eq!(mebx.as_deref(), Some("Mebx!Passw0rd"));
    Ok(())
}

#[tokio::test]
async fn missing_path_is_absent() -> Result<()> {
    let (server, resolver) = setup().await?;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/certs/corp"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "errors": [] })))
        .mount(&server)
        .await;

    assert!(resolver.get_secret_at_path("certs/corp").await?.is_none());
    assert!(
        resolver
            .get_secret_from_key("certs/corp", "CERT")
            .await?
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn server_errors_and_bad_bodies_are_reported() -> Result<()> {
    let (server, resolver) = setup().await?;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/profiles/sealed"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/profiles/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = resolver
        .get_secret_at_path("profiles/sealed")
        .await
        .expect_err("sealed vault");
    assert!(matches!(err, SecretError::Status { status: 503, .. }));

    let err = resolver
        .get_secret_at_path("profiles/garbled")
        .await
        .expect_err("invalid body");
    assert!(matches!(err, SecretError::Decode { .. }));
    Ok(())
}

#[tokio::test]
async fn unreachable_store_is_a_transport_error() -> Result<()> {
    let resolver = VaultResolver::new(&VaultConfig {
        address: Url::parse("http://127.0.0.1:9")?,
        token: "t".into(),
        secrets_path: "secret/data/".into(),
    })?;
    let err = resolver
        .get_secret_at_path("profiles/office")
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, SecretError::Transport { .. }));
    Ok(())
}
