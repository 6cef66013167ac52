//! Free-text search command.

use anyhow::Result;

use super::SearchArgs;
use crate::context::Context;

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let model = &args.model.model;
    let filters = args.model.filters()?;

    let hits = ctx
        .manager
        .search(model, &args.query, &args.fields, &filters, ctx.driver())
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&hits);
        return Ok(());
    }

    ctx.output.header(&format!("{} matching '{}'", model, args.query));
    ctx.output.records(&hits);
    ctx.output.kv("Matches", &hits.len().to_string());

    Ok(())
}
