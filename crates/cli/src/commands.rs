use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use shelflife_core::Entity;
use shelflife_infra::{CommitReport, InventoryRepository, InventoryService};
use shelflife_inventory::{
    DeductionPlan, InventoryItem, InventoryView, StockStatus, StockSummary, TakeOrder, days_remaining,
};

use crate::args::{Command, ListArgs};

pub fn run<R, W>(service: &InventoryService<R>, command: Command, today: NaiveDate, out: &mut W) -> Result<()>
where
    R: InventoryRepository,
    W: Write,
{
    match command {
        Command::List(ListArgs { category, alerts }) => {
            let view = match (category, alerts) {
                (_, true) => Some(InventoryView::NeedsAttention),
                (Some(c), false) => Some(InventoryView::Category(c)),
                (None, false) => None,
            };
            write_summaries(out, &service.summaries(view, today)?)?;
        }
        Command::Alerts => {
            write_summaries(out, &service.summaries(Some(InventoryView::NeedsAttention), today)?)?;
        }
        Command::Show { item } => {
            write_item(out, &service.get_item(&item)?, today)?;
        }
        Command::AddItem(args) => {
            let item = service.create_item(&args.name, args.category)?;
            writeln!(out, "created {} ({}) in {}", item.name(), item.id(), item.category())?;
        }
        Command::Rename { item, name } => {
            let item = service.rename_item(&item, &name)?;
            writeln!(out, "renamed {} to {}", item.id(), item.name())?;
        }
        Command::Delete { item } => {
            service.delete_item(&item)?;
            writeln!(out, "deleted {item}")?;
        }
        Command::Intake(args) => {
            let report = service.receive(&args.entries).context("intake rejected")?;
            writeln!(
                out,
                "received {} units across {} item(s)",
                report.units_received, report.items_updated
            )?;
            for missing in &report.missing_items {
                writeln!(out, "  skipped unknown item {missing}")?;
            }
        }
        Command::Correct(args) => {
            let item = service.correct_batch(&args.item, &args.batch, args.quantity, args.expiry)?;
            write_item(out, &item, today)?;
        }
        Command::Take(args) => {
            let order = TakeOrder::new(args.lines).context("invalid take order")?;
            let plans = service.plan_take(&order)?;
            write_plans(out, &plans)?;

            if args.yes {
                let report = service.commit(&plans)?;
                write_commit(out, &report)?;
            } else {
                writeln!(out, "nothing taken yet; re-run with --yes to commit this plan")?;
            }
        }
    }
    Ok(())
}

fn status_label(summary: &StockSummary) -> &'static str {
    match (summary.status, summary.expiring_soon) {
        (StockStatus::OutOfStock, _) => "out of stock",
        (StockStatus::Low, true) => "low, expiring",
        (StockStatus::Low, false) => "low",
        (StockStatus::InStock, true) => "expiring",
        (StockStatus::InStock, false) => "ok",
    }
}

fn write_summaries<W: Write>(out: &mut W, summaries: &[StockSummary]) -> Result<()> {
    if summaries.is_empty() {
        writeln!(out, "no items")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<32}  {:<24}  {:<8}  {:>6}  {:<10}  {:>5}  STATUS",
        "ID", "NAME", "CATEGORY", "STOCK", "NEAREST", "DAYS"
    )?;
    for s in summaries {
        let nearest = s.nearest_expiry.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let days = s.days_remaining.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        writeln!(
            out,
            "{:<32}  {:<24}  {:<8}  {:>6}  {:<10}  {:>5}  {}",
            s.item_id,
            s.name,
            s.category.key(),
            s.total_stock,
            nearest,
            days,
            status_label(s)
        )?;
    }
    Ok(())
}

fn write_item<W: Write>(out: &mut W, item: &InventoryItem, today: NaiveDate) -> Result<()> {
    writeln!(out, "{} ({}) [{}], {} in stock", item.name(), item.id(), item.category(), item.total_stock())?;
    for batch in item.ledger().by_expiry() {
        writeln!(
            out,
            "  {:<32}  {}  {:>6}  {:>4}d",
            batch.id(),
            batch.expiry_date(),
            batch.quantity(),
            days_remaining(batch.expiry_date(), today)
        )?;
    }
    Ok(())
}

fn write_plans<W: Write>(out: &mut W, plans: &[DeductionPlan]) -> Result<()> {
    for plan in plans {
        writeln!(out, "{} ({}): take {}", plan.item_name, plan.item_id, plan.total_requested)?;
        for d in &plan.deductions {
            writeln!(out, "  {}  batch {}  x{}", d.expiry_date, d.batch_id, d.quantity_to_take)?;
        }
        if !plan.is_complete {
            writeln!(out, "  short by {}", plan.shortfall())?;
        }
    }
    Ok(())
}

fn write_commit<W: Write>(out: &mut W, report: &CommitReport) -> Result<()> {
    writeln!(
        out,
        "took {} units from {} item(s)",
        report.units_taken, report.items_updated
    )?;
    for line in &report.skipped {
        writeln!(out, "  skipped batch {} of {} (no longer in stock)", line.batch_id, line.item_id)?;
    }
    Ok(())
}
