//! Paginated listing commands.

use anyhow::Result;

use super::{CursorArgs, PageArgs};
use crate::context::Context;

/// Run paginate, or simple-paginate when `simple` is set.
pub async fn run(args: PageArgs, simple: bool, ctx: &Context) -> Result<()> {
    let model = &args.model.model;
    let filters = args.model.filters()?;
    let options = args.options()?;
    ctx.output.debug(&format!(
        "Best driver for {}: {}",
        model,
        ctx.manager.get_best_driver_for_model(model)
    ));

    if simple {
        let page = ctx
            .manager
            .simple_paginate(model, &filters, &options, args.per_page, ctx.driver())
            .await?;

        if ctx.output.is_json() {
            ctx.output.json(&page);
            return Ok(());
        }

        ctx.output.header(&format!("{} page {}", model, page.current_page));
        ctx.output.records(&page.items);
        ctx.output.kv("Per page", &page.per_page.to_string());
        ctx.output.kv("More", if page.has_more { "yes" } else { "no" });
        return Ok(());
    }

    let page = ctx
        .manager
        .paginate(model, &filters, &options, args.per_page, ctx.driver())
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&page);
        return Ok(());
    }

    ctx.output.header(&format!(
        "{} page {} of {}",
        model, page.current_page, page.last_page
    ));
    ctx.output.records(&page.items);
    ctx.output.kv(
        "Showing",
        &format!("{}-{} of {}", page.first_item(), page.last_item(), page.total),
    );

    Ok(())
}

/// Run cursor-paginate.
pub async fn run_cursor(args: CursorArgs, ctx: &Context) -> Result<()> {
    let model = &args.model.model;
    let filters = args.model.filters()?;
    let options = args.options()?;

    let page = ctx
        .manager
        .cursor_paginate(
            model,
            &filters,
            &options,
            args.per_page,
            args.cursor.as_deref(),
            ctx.driver(),
        )
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&page);
        return Ok(());
    }

    ctx.output.header(&format!("{} ({} records)", model, page.len()));
    ctx.output.records(&page.items);
    match &page.next_cursor {
        Some(cursor) => ctx.output.kv("Next", cursor.as_str()),
        None => ctx.output.kv("Next", "-"),
    }
    match &page.prev_cursor {
        Some(cursor) => ctx.output.kv("Previous", cursor.as_str()),
        None => ctx.output.kv("Previous", "-"),
    }

    Ok(())
}
