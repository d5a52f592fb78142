//! Portfolio command implementation
//!
//! Lists the portfolios of a scope, or loads one portfolio into a job file
//! ready for `cva calculate`.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use cva_client::{ClientConfig, LoadedPortfolio, PortfolioLoader, Transport};
use serde_json::{Map, Value};
use tracing::info;

use crate::commands::{job_client, open_output};
use crate::error::{CliError, Result};
use crate::job_file::CvaJob;

/// Writes the portfolios of the loader's scope as `scope,code,baseCurrency`
/// lines.
pub async fn list<T: Transport, W: Write>(
    loader: &PortfolioLoader<'_, T>,
    out: &mut W,
) -> Result<()> {
    let portfolios = loader.list_portfolios().await?;
    writeln!(out, "scope,code,baseCurrency")?;
    for portfolio in &portfolios {
        writeln!(
            out,
            "{},{},{}",
            portfolio.scope, portfolio.code, portfolio.base_currency
        )?;
    }
    info!(
        scope = loader.scope(),
        count = portfolios.len(),
        "Portfolios listed"
    );
    Ok(())
}

/// Fills a job template with a loaded portfolio.
///
/// The template supplies `pricingParameters`, `entity` and optionally
/// `enrichments`; `universe` and `counterparties` are replaced.
pub fn fill_template(template: Value, loaded: &LoadedPortfolio) -> Result<Value> {
    let Value::Object(mut job) = template else {
        return Err(CliError::output("job template must be a JSON object"));
    };

    let universe = serde_json::to_value(&loaded.universe).map_err(CliError::output)?;
    let mut counterparties = Map::new();
    for (org_id, record) in loaded.registry.iter() {
        let record = serde_json::to_value(record).map_err(CliError::output)?;
        counterparties.insert(org_id.to_string(), Value::Array(vec![record]));
    }

    job.insert("universe".into(), universe);
    job.insert("counterparties".into(), Value::Object(counterparties));
    Ok(Value::Object(job))
}

/// Loads a portfolio and writes it as a job file.
pub async fn export<T: Transport, W: Write>(
    loader: &mut PortfolioLoader<'_, T>,
    effective_date: Option<NaiveDate>,
    template: Value,
    out: &mut W,
) -> Result<()> {
    loader.load_transactions(effective_date).await?;
    let loaded = loader.load(&HashMap::new()).await?;
    let job = fill_template(template, &loaded)?;

    // the written file must load as a job
    serde_json::from_value::<CvaJob>(job.clone())
        .map_err(|e| CliError::output(format!("job template is incomplete: {e}")))?;

    serde_json::to_writer_pretty(&mut *out, &job).map_err(CliError::output)?;
    writeln!(out)?;
    info!(
        instruments = loaded.universe.len(),
        counterparties = loaded.registry.len(),
        "Job file written"
    );
    Ok(())
}

/// Run the portfolio command
pub async fn run(
    config: &ClientConfig,
    scope: Option<String>,
    code: Option<String>,
    effective_date: Option<NaiveDate>,
    template: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let client = job_client(config)?;
    let loader = match scope {
        Some(scope) => PortfolioLoader::new(&client, scope),
        None => PortfolioLoader::connect(&client).await?,
    };

    let mut out = open_output(output)?;
    match code {
        None => list(&loader, &mut out).await?,
        Some(code) => {
            let path = template.ok_or(CliError::MissingArgument("--template"))?;
            let content = std::fs::read_to_string(path)?;
            let template: Value =
                serde_json::from_str(&content).map_err(|e| CliError::invalid_input(path, e))?;
            let mut loader = loader.with_portfolio(code);
            export(&mut loader, effective_date, template, &mut out).await?;
        }
    }
    out.flush()?;
    Ok(())
}
