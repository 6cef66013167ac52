//! Driver registry inspection.

use anyhow::Result;
use serde::Serialize;
use shop_query::QueryManager;

use super::DriversArgs;
use crate::context::Context;

/// Shown when no registered driver can serve a model.
const UNAVAILABLE: &str = "unavailable";

#[derive(Serialize)]
struct DriversReport<'a> {
    default: &'a str,
    drivers: Vec<&'a str>,
    routing: Vec<Route>,
}

#[derive(Serialize)]
struct Route {
    model: String,
    best: String,
    requested: String,
}

/// Run the drivers command.
pub async fn run(args: DriversArgs, ctx: &Context) -> Result<()> {
    let manager = &ctx.manager;
    let requested = ctx.driver().unwrap_or(manager.default_driver());
    manager.get_driver(Some(requested))?;

    let models: Vec<String> = match args.model {
        Some(model) => vec![model],
        None => ctx
            .config
            .catalog()?
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let routing = route_models(manager, requested, models);

    let report = DriversReport {
        default: manager.default_driver(),
        drivers: manager.driver_names(),
        routing,
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header("Query drivers");
    ctx.output.kv("Default", report.default);
    ctx.output.kv("Registered", &report.drivers.join(", "));

    ctx.output.header(&format!("Routing with '{}'", requested));
    ctx.output.table_row(&["MODEL", "SERVED BY", "BEST"], &[22, 12, 12]);
    for route in &report.routing {
        ctx.output
            .table_row(&[&route.model, &route.requested, &route.best], &[22, 12, 12]);
    }

    Ok(())
}

/// Where each model's queries go when `requested` is asked for.
fn route_models(manager: &QueryManager, requested: &str, models: Vec<String>) -> Vec<Route> {
    models
        .into_iter()
        .map(|model| {
            let served_by = manager
                .resolve_name(&model, Some(requested))
                .unwrap_or(UNAVAILABLE);
            Route {
                best: manager.get_best_driver_for_model(&model).to_string(),
                requested: served_by.to_string(),
                model,
            }
        })
        .collect()
}
