//! Unpaginated listing command.

use anyhow::Result;

use super::AllArgs;
use crate::context::Context;

/// Run the all command.
pub async fn run(args: AllArgs, ctx: &Context) -> Result<()> {
    let model = &args.model.model;
    let filters = args.model.filters()?;

    let mut records = ctx.manager.all(model, &filters, ctx.driver()).await?;
    let total = records.len();
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    if ctx.output.is_json() {
        ctx.output.json(&records);
        return Ok(());
    }

    ctx.output.header(&format!("All {} records", model));
    ctx.output.records(&records);
    if records.len() < total {
        ctx.output.warn(&format!("Showing {} of {} records", records.len(), total));
    } else {
        ctx.output.kv("Total", &total.to_string());
    }

    Ok(())
}
