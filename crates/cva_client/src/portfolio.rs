//! Portfolio loading.
//!
//! Reads a transaction portfolio from the platform and turns it into the two
//! inputs of a CVA calculation: the instrument universe (with counterparty
//! assignments) and the counterparty registry.
//!
//! ```text
//! transactions (StockIn) ──▶ instrument uid → counterparty org id
//!        │                                   │
//!        ▼                                   ▼
//! instrument definitions ──translate──▶ instruments ◀──csaTag── raw counterparty records
//! ```
//!
//! Counterparty display names come from the document titles returned by
//! the symbol lookup service for each organisation id.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use cva_core::{CounterpartyRecord, CounterpartyRegistry, Instrument, OrgId};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::LoaderError;
use crate::job::JobClient;
use crate::transport::{Method, Transport};

const PROFILE_ENDPOINT: &str = "user-framework/mobile/user-service/v1/profile/uuid";
const TRANSLATION_ENDPOINT: &str = "partners/lusid/v1/translation/instrumentDefinitions";
const TRANSLATION_DIALECT: &str = "RefinitivQps";
const LOOKUP_ENDPOINT: &str = "discovery/search/v1/lookup";
const STOCK_IN: &str = "StockIn";

/// Portfolio listed under a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioSummary {
    /// Portfolio scope
    pub scope: String,
    /// Portfolio code
    pub code: String,
    /// Base currency
    pub base_currency: String,
}

/// Inputs of a CVA calculation loaded from a portfolio.
#[derive(Debug, Clone)]
pub struct LoadedPortfolio {
    /// Instruments with counterparty assignments
    pub universe: Vec<Instrument>,
    /// Deduplicated counterparties
    pub registry: CounterpartyRegistry,
}

/// Loads portfolio data for the user's scope.
pub struct PortfolioLoader<'a, T> {
    client: &'a JobClient<T>,
    scope: String,
    portfolio_code: Option<String>,
    transactions: Option<BTreeMap<String, String>>,
}

impl<'a, T: Transport> PortfolioLoader<'a, T> {
    /// Creates a loader for a known scope.
    pub fn new(client: &'a JobClient<T>, scope: impl Into<String>) -> Self {
        Self {
            client,
            scope: scope.into(),
            portfolio_code: None,
            transactions: None,
        }
    }

    /// Creates a loader for the scope of the authenticated user.
    pub async fn connect(client: &'a JobClient<T>) -> Result<Self, LoaderError> {
        let scope = Self::resolve_scope(client).await?;
        Ok(Self::new(client, scope))
    }

    /// Looks up the scope (user uuid) of the authenticated user.
    pub async fn resolve_scope(client: &JobClient<T>) -> Result<String, LoaderError> {
        let body = client.get(PROFILE_ENDPOINT).await?.body;
        body.pointer("/data/uuid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LoaderError::invalid("profile response has no data.uuid"))
    }

    /// Selects the portfolio to load; clears previously loaded transactions.
    pub fn with_portfolio(mut self, code: impl Into<String>) -> Self {
        self.portfolio_code = Some(code.into());
        self.transactions = None;
        self
    }

    /// Returns the scope.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the loaded transactions (instrument uid → counterparty org id).
    pub fn transactions(&self) -> Option<&BTreeMap<String, String>> {
        self.transactions.as_ref()
    }

    /// Lists the portfolios of the scope.
    pub async fn list_portfolios(&self) -> Result<Vec<PortfolioSummary>, LoaderError> {
        let url = format!("user-data/portfolios/v1/common/{}", self.scope);
        let body = self.client.get(&url).await?.body;

        values_array(&body)?
            .iter()
            .map(|portfolio| {
                Ok(PortfolioSummary {
                    scope: string_at(portfolio, "/id/scope")?,
                    code: string_at(portfolio, "/id/code")?,
                    base_currency: string_at(portfolio, "/baseCurrency")?,
                })
            })
            .collect()
    }

    /// Loads `StockIn` transactions of the selected portfolio, optionally up
    /// to an effective date.
    pub async fn load_transactions(
        &mut self,
        effective_date: Option<NaiveDate>,
    ) -> Result<&BTreeMap<String, String>, LoaderError> {
        let code = self
            .portfolio_code
            .as_deref()
            .ok_or(LoaderError::NoPortfolioSelected)?;

        let mut url = format!(
            "user-data/portfolios/v1/transactionportfolios/{}/{}/transactions",
            self.scope, code
        );
        if let Some(date) = effective_date {
            url.push_str(&format!("?toTransactionDate={}", date.format("%Y-%m-%d")));
        }

        let body = self.client.get(&url).await?.body;
        let transactions: BTreeMap<String, String> = values_array(&body)?
            .iter()
            .filter(|trade| trade.get("type").and_then(Value::as_str) == Some(STOCK_IN))
            .map(|trade| {
                Ok((
                    string_at(trade, "/instrumentUid")?,
                    string_at(trade, "/counterpartyId")?,
                ))
            })
            .collect::<Result<_, LoaderError>>()?;

        info!(code, count = transactions.len(), "Transactions loaded");
        Ok(&*self.transactions.insert(transactions))
    }

    /// Fetches raw instrument definitions of the loaded transactions.
    pub async fn load_instrument_definitions(
        &mut self,
    ) -> Result<Map<String, Value>, LoaderError> {
        self.ensure_transactions().await?;
        let code = self
            .portfolio_code
            .as_deref()
            .ok_or(LoaderError::NoPortfolioSelected)?;
        let ids: Vec<&String> = self
            .transactions
            .as_ref()
            .map(|t| t.keys().collect())
            .unwrap_or_default();

        let scope = &self.scope;
        let url = format!(
            "partners/lusid/v1/instruments/$get?identifierType=LusidInstrumentId\
             &scope={scope}_{code}&propertyKeys=Instrument/{scope}/AssetType,\
             Instrument/{scope}/AssetClass,Instrument/{scope}/InstrumentType"
        );
        let body = self
            .client
            .submit(&url, Method::Post, Some(json!(ids)))
            .await?
            .body;

        values_object(&body)?
            .iter()
            .map(|(id, instrument)| {
                instrument
                    .get("instrumentDefinition")
                    .cloned()
                    .map(|definition| (id.clone(), definition))
                    .ok_or_else(|| {
                        LoaderError::invalid(format!("instrument {id} has no definition"))
                    })
            })
            .collect()
    }

    /// Translates raw definitions into the analytics dialect.
    pub async fn translate_instruments(
        &self,
        definitions: Map<String, Value>,
    ) -> Result<BTreeMap<String, Instrument>, LoaderError> {
        let request = json!({
            "instruments": definitions,
            "dialect": TRANSLATION_DIALECT,
        });
        let body = self
            .client
            .submit(TRANSLATION_ENDPOINT, Method::Post, Some(request))
            .await?
            .body;

        values_object(&body)?
            .iter()
            .map(|(id, translated)| {
                let content = translated
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        LoaderError::invalid(format!("translation of {id} has no content"))
                    })?;
                let instrument: Instrument = serde_json::from_str(content).map_err(|e| {
                    LoaderError::invalid(format!("translation of {id} is not an instrument: {e}"))
                })?;
                Ok((id.clone(), instrument))
            })
            .collect()
    }

    /// Looks up document titles of organisation ids.
    ///
    /// Ids without a match, or whose match has no title, are left out of
    /// the returned map.
    pub async fn resolve_titles(
        &self,
        org_ids: &[String],
    ) -> Result<HashMap<String, String>, LoaderError> {
        if org_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let request = json!({
            "View": "SearchAll",
            "Terms": org_ids.join(","),
            "Scope": "OAPermID",
            "Select": "DocumentTitle,RIC",
        });
        let body = self
            .client
            .submit(LOOKUP_ENDPOINT, Method::Post, Some(request))
            .await?
            .body;
        let matches = body
            .get("Matches")
            .and_then(Value::as_object)
            .ok_or_else(|| LoaderError::invalid("lookup response has no Matches object"))?;

        let titles: HashMap<String, String> = org_ids
            .iter()
            .filter_map(|org_id| {
                let title = matches.get(org_id)?.get("DocumentTitle")?.as_str()?;
                Some((org_id.clone(), title.to_string()))
            })
            .collect();
        debug!(
            requested = org_ids.len(),
            resolved = titles.len(),
            "Counterparty titles resolved"
        );
        Ok(titles)
    }

    /// Raw counterparty records grouped by organisation id, one per
    /// transaction.
    ///
    /// `titles` maps organisation ids to resolved document titles; the
    /// display name is the first comma-separated part of the title without
    /// spaces, or the organisation id when unresolved.
    pub fn counterparty_records(
        &self,
        titles: &HashMap<String, String>,
    ) -> BTreeMap<OrgId, Vec<CounterpartyRecord>> {
        let mut records: BTreeMap<OrgId, Vec<CounterpartyRecord>> = BTreeMap::new();
        for (instrument_id, org_id) in self.transactions.iter().flatten() {
            let name = titles
                .get(org_id)
                .and_then(|title| display_name(title))
                .unwrap_or_else(|| org_id.clone());
            records
                .entry(OrgId::new(org_id.as_str()))
                .or_default()
                .push(CounterpartyRecord::assigned(name, instrument_id.as_str()));
        }
        records
    }

    /// Loads the universe and counterparty registry of the selected
    /// portfolio.
    ///
    /// With an empty `titles` map the counterparty titles are looked up on
    /// the platform.
    pub async fn load(
        &mut self,
        titles: &HashMap<String, String>,
    ) -> Result<LoadedPortfolio, LoaderError> {
        let definitions = self.load_instrument_definitions().await?;
        let translated = self.translate_instruments(definitions).await?;

        let resolved;
        let titles = if titles.is_empty() {
            resolved = self.resolve_titles(&self.counterparty_ids()).await?;
            &resolved
        } else {
            titles
        };
        let raw = self.counterparty_records(titles);
        let universe = build_universe(translated, &raw);

        debug!(
            instruments = universe.len(),
            counterparties = raw.len(),
            "Portfolio loaded"
        );
        Ok(LoadedPortfolio {
            universe,
            registry: CounterpartyRegistry::from_raw(raw),
        })
    }

    fn counterparty_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&String> = self.transactions.iter().flat_map(|t| t.values()).collect();
        ids.into_iter().cloned().collect()
    }

    async fn ensure_transactions(&mut self) -> Result<(), LoaderError> {
        if self.transactions.is_none() {
            self.load_transactions(None).await?;
        }
        Ok(())
    }
}

/// Tags each translated instrument with its id and the name of the first
/// counterparty assigned to it.
pub fn build_universe(
    translated: BTreeMap<String, Instrument>,
    raw: &BTreeMap<OrgId, Vec<CounterpartyRecord>>,
) -> Vec<Instrument> {
    translated
        .into_iter()
        .map(|(id, mut instrument)| {
            instrument.set_instrument_tag(id.as_str());
            instrument.csa_tag = raw
                .values()
                .flatten()
                .find(|record| record.assigned_to.as_deref() == Some(id.as_str()))
                .map(|record| record.name.replace(' ', ""));
            instrument
        })
        .collect()
}

fn display_name(title: &str) -> Option<String> {
    let name: String = title
        .split(',')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    (!name.is_empty()).then_some(name)
}

fn values_array(body: &Value) -> Result<&Vec<Value>, LoaderError> {
    body.get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| LoaderError::invalid("response has no values array"))
}

fn values_object(body: &Value) -> Result<&Map<String, Value>, LoaderError> {
    body.get("values")
        .and_then(Value::as_object)
        .ok_or_else(|| LoaderError::invalid("response has no values object"))
}

fn string_at(value: &Value, pointer: &str) -> Result<String, LoaderError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LoaderError::invalid(format!("missing {pointer}")))
}
