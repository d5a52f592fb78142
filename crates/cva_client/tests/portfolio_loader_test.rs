//! Portfolio Loader Integration Tests
//!
//! Loads a universe and counterparty registry from scripted platform
//! responses.

mod common;

use std::collections::HashMap;

use chrono::NaiveDate;
use common::{job_client, ScriptedTransport};
use cva_client::{EndpointResponse, LoaderError, Method, PortfolioLoader};
use serde_json::json;

fn transactions() -> EndpointResponse {
    EndpointResponse::new(
        200,
        json!({
            "values": [
                {"type": "StockIn", "instrumentUid": "LUID_A", "counterpartyId": "100"},
                {"type": "StockIn", "instrumentUid": "LUID_B", "counterpartyId": "200"},
                {"type": "Dividend", "instrumentUid": "LUID_C", "counterpartyId": "300"}
            ]
        }),
    )
}

fn definitions() -> EndpointResponse {
    EndpointResponse::new(
        200,
        json!({
            "values": {
                "LUID_A": {"instrumentDefinition": {"instrumentType": "InterestRateSwap"}},
                "LUID_B": {"instrumentDefinition": {"instrumentType": "CapFloor"}}
            }
        }),
    )
}

fn translations() -> EndpointResponse {
    let swap = json!({
        "instrumentType": "Swap",
        "instrumentDefinition": {"instrumentTag": "x", "endDate": "2030-01-01"}
    });
    let cap = json!({
        "instrumentType": "CapFloor",
        "instrumentDefinition": {"instrumentTag": "y", "endDate": "2028-01-01"}
    });
    EndpointResponse::new(
        200,
        json!({
            "values": {
                "LUID_A": {"content": swap.to_string()},
                "LUID_B": {"content": cap.to_string()}
            }
        }),
    )
}

/// The scope comes from the profile endpoint
#[tokio::test]
async fn test_connect_resolves_scope() {
    let transport = ScriptedTransport::new()
        .respond(EndpointResponse::new(200, json!({"data": {"uuid": "GE-123"}})));
    let client = job_client(transport, 1);

    let loader = PortfolioLoader::connect(&client).await.unwrap();
    assert_eq!(loader.scope(), "GE-123");
}

/// A profile without a uuid is an invalid response
#[tokio::test]
async fn test_connect_without_uuid() {
    let transport = ScriptedTransport::new().respond(EndpointResponse::new(200, json!({})));
    let client = job_client(transport, 1);

    let err = PortfolioLoader::connect(&client).await.err().unwrap();
    assert!(matches!(err, LoaderError::InvalidResponse(_)));
}

/// Portfolios are listed with scope, code and base currency
#[tokio::test]
async fn test_list_portfolios() {
    let transport = ScriptedTransport::new().respond(EndpointResponse::new(
        200,
        json!({
            "values": [
                {"id": {"scope": "GE-123", "code": "CVA_BOOK"}, "baseCurrency": "USD"}
            ]
        }),
    ));
    let client = job_client(transport, 1);
    let loader = PortfolioLoader::new(&client, "GE-123");

    let portfolios = loader.list_portfolios().await.unwrap();
    assert_eq!(portfolios.len(), 1);
    assert_eq!(portfolios[0].code, "CVA_BOOK");
    assert_eq!(portfolios[0].base_currency, "USD");
    assert_eq!(
        client.transport().requests()[0].url,
        "user-data/portfolios/v1/common/GE-123"
    );
}

/// Only StockIn transactions are kept; the effective date becomes a filter
#[tokio::test]
async fn test_load_transactions() {
    let client = job_client(ScriptedTransport::new().respond(transactions()), 1);
    let mut loader = PortfolioLoader::new(&client, "GE-123").with_portfolio("CVA_BOOK");

    let date = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
    let loaded = loader.load_transactions(Some(date)).await.unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded["LUID_A"], "100");
    assert!(!loaded.contains_key("LUID_C"));
    assert_eq!(
        client.transport().requests()[0].url,
        "user-data/portfolios/v1/transactionportfolios/GE-123/CVA_BOOK/transactions\
         ?toTransactionDate=2024-06-28"
    );
}

/// Loading transactions needs a selected portfolio
#[tokio::test]
async fn test_load_transactions_without_portfolio() {
    let client = job_client(ScriptedTransport::new(), 1);
    let mut loader = PortfolioLoader::new(&client, "GE-123");

    let err = loader.load_transactions(None).await.unwrap_err();
    assert!(matches!(err, LoaderError::NoPortfolioSelected));
}

/// Full load: transactions, definitions, translation, registry
#[tokio::test]
async fn test_load_universe_and_registry() {
    let transport = ScriptedTransport::new()
        .respond(transactions())
        .respond(definitions())
        .respond(translations());
    let client = job_client(transport, 1);
    let mut loader = PortfolioLoader::new(&client, "GE-123").with_portfolio("CVA_BOOK");

    let titles = HashMap::from([("100".to_string(), "Acme Bank PLC, London".to_string())]);
    let loaded = loader.load(&titles).await.unwrap();

    assert_eq!(loaded.universe.len(), 2);
    assert_eq!(loaded.universe[0].tag(), "LUID_A");
    assert_eq!(loaded.universe[0].csa_tag(), Some("AcmeBankPLC"));
    assert_eq!(loaded.universe[1].tag(), "LUID_B");
    assert_eq!(loaded.universe[1].csa_tag(), Some("200"));

    assert_eq!(loaded.registry.len(), 2);
    assert_eq!(loaded.registry.get("100").unwrap().name, "AcmeBankPLC");

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(requests[1].body, Some(json!(["LUID_A", "LUID_B"])));
    assert!(requests[1].url.contains("scope=GE-123_CVA_BOOK"));
    assert_eq!(requests[2].body.as_ref().unwrap()["dialect"], "RefinitivQps");
}

/// Untranslatable content is reported with the instrument id
#[tokio::test]
async fn test_translation_with_bad_content() {
    let transport = ScriptedTransport::new().respond(EndpointResponse::new(
        200,
        json!({"values": {"LUID_A": {"content": "not json"}}}),
    ));
    let client = job_client(transport, 1);
    let loader = PortfolioLoader::new(&client, "GE-123");

    let err = loader
        .translate_instruments(serde_json::Map::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("LUID_A"));
}

fn lookup() -> EndpointResponse {
    EndpointResponse::new(
        200,
        json!({
            "Matches": {
                "100": {"DocumentTitle": "Acme Bank PLC, London", "RIC": "ACME.L"},
                "200": {"RIC": "BETA.N"}
            }
        }),
    )
}

/// Without supplied titles, counterparty names come from the symbol lookup
#[tokio::test]
async fn test_load_resolves_counterparty_titles() {
    let transport = ScriptedTransport::new()
        .respond(transactions())
        .respond(definitions())
        .respond(translations())
        .respond(lookup());
    let client = job_client(transport, 1);
    let mut loader = PortfolioLoader::new(&client, "GE-123").with_portfolio("CVA_BOOK");

    let loaded = loader.load(&HashMap::new()).await.unwrap();

    assert_eq!(loaded.universe[0].csa_tag(), Some("AcmeBankPLC"));
    assert_eq!(loaded.universe[1].csa_tag(), Some("200"));
    assert_eq!(loaded.registry.get("100").unwrap().name, "AcmeBankPLC");
    assert_eq!(loaded.registry.get("200").unwrap().name, "200");

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[3].url, "discovery/search/v1/lookup");
    assert_eq!(requests[3].method, Method::Post);
    let body = requests[3].body.as_ref().unwrap();
    assert_eq!(body["Terms"], "100,200");
    assert_eq!(body["Scope"], "OAPermID");
}

/// Only matches carrying a document title are returned
#[tokio::test]
async fn test_resolve_titles() {
    let client = job_client(ScriptedTransport::new().respond(lookup()), 1);
    let loader = PortfolioLoader::new(&client, "GE-123");

    let ids = vec!["100".to_string(), "200".to_string(), "300".to_string()];
    let titles = loader.resolve_titles(&ids).await.unwrap();

    assert_eq!(titles.len(), 1);
    assert_eq!(titles["100"], "Acme Bank PLC, London");
}

/// No ids, no request
#[tokio::test]
async fn test_resolve_titles_without_ids() {
    let client = job_client(ScriptedTransport::new(), 1);
    let loader = PortfolioLoader::new(&client, "GE-123");

    assert!(loader.resolve_titles(&[]).await.unwrap().is_empty());
    assert!(client.transport().requests().is_empty());
}

/// A lookup response without matches is invalid
#[tokio::test]
async fn test_resolve_titles_without_matches() {
    let transport = ScriptedTransport::new().respond(EndpointResponse::new(200, json!({})));
    let client = job_client(transport, 1);
    let loader = PortfolioLoader::new(&client, "GE-123");

    let err = loader
        .resolve_titles(&["100".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::InvalidResponse(_)));
}
