//! Integration tests for the marketplace REST client against a stub backend.

#![allow(clippy::unwrap_used)]

use lunetier_core::MontureId;
use lunetier_integration_tests::StubBackend;
use lunetier_storefront::marketplace::{ListParams, MarketplaceClient, MarketplaceError};
use rust_decimal::Decimal;

fn client_against(stub: &StubBackend) -> MarketplaceClient {
    MarketplaceClient::with_base_url(stub.base_url())
}

#[tokio::test]
async fn test_list_montures_decodes_page() {
    let stub = StubBackend::spawn().await;
    let client = client_against(&stub);

    let page = client.list_montures(&ListParams::default()).await.unwrap();

    assert_eq!(page.montures.len(), 1);
    let monture = page.montures.first().unwrap();
    assert_eq!(monture.id, MontureId::new(1));
    assert_eq!(monture.prix, Decimal::from(249));
    assert_eq!(page.pagination.total_pages, 3);
}

#[tokio::test]
async fn test_monture_detail_is_cached() {
    let stub = StubBackend::spawn().await;
    let client = client_against(&stub);

    let first = client.monture(MontureId::new(3)).await.unwrap();
    let second = client.monture(MontureId::new(3)).await.unwrap();

    assert_eq!(first.id, second.id);
    // second read is served from the moka cache
    assert_eq!(stub.detail_hits(), 1);
}

#[tokio::test]
async fn test_missing_monture_is_not_found() {
    let stub = StubBackend::spawn().await;
    let client = client_against(&stub);

    let err = client.monture(MontureId::new(404)).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::NotFound(_)));
}

#[tokio::test]
async fn test_error_body_message_reaches_the_ui() {
    let stub = StubBackend::spawn().await;
    stub.set_fail_list(true);
    let client = client_against(&stub);

    let err = client.list_montures(&ListParams::default()).await.unwrap_err();

    match &err {
        MarketplaceError::Api { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "Panne générale du catalogue");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    assert_eq!(err.user_message(), "Panne générale du catalogue");
}

#[tokio::test]
async fn test_unreachable_backend_gets_generic_message() {
    // nothing listens here
    let client = MarketplaceClient::with_base_url("http://127.0.0.1:9".to_owned());

    let err = client.list_montures(&ListParams::default()).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::Http(_)));
    assert!(err.user_message().contains("Impossible de contacter"));
}

#[tokio::test]
async fn test_facets_and_stats_decode() {
    let stub = StubBackend::spawn().await;
    let client = client_against(&stub);

    let facets = client.filter_options().await.unwrap();
    assert_eq!(facets.types, vec!["optique", "solaire"]);

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total_opticiens, 4);
    assert_eq!(stats.prix_moyen, Some(Decimal::new(21850, 2)));
}
