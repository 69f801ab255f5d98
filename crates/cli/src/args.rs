use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use shelflife_core::{BatchId, ItemId};
use shelflife_inventory::{Category, IntakeEntry};

#[derive(Parser, Debug)]
#[command(name = "shelflife")]
#[command(about = "Perishable stock by batch: intake, alerts, and FIFO-by-expiry taking")]
pub struct Cli {
    /// Config file (defaults to ./shelflife.toml when present).
    #[arg(long, global = true, env = "SHELFLIFE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override `store.data_file` from the config.
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List items with their stock and nearest expiry.
    List(ListArgs),
    /// List items that are expiring soon or low on stock.
    Alerts,
    /// Show one item's batches in consumption order.
    Show { item: ItemId },
    /// Create an item with an empty ledger.
    AddItem(AddItemArgs),
    Rename { item: ItemId, name: String },
    /// Delete an item together with all of its batches.
    Delete { item: ItemId },
    /// Receive stock.
    Intake(IntakeArgs),
    /// Manually correct one batch (a quantity of 0 removes it).
    Correct(CorrectArgs),
    /// Plan taking stock earliest-expiry first; commit with `--yes`.
    Take(TakeArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only items of this category (key such as `cake`, or its label).
    #[arg(long, conflicts_with = "alerts")]
    pub category: Option<Category>,

    /// Only items needing attention.
    #[arg(long)]
    pub alerts: bool,
}

#[derive(Args, Debug)]
pub struct AddItemArgs {
    pub name: String,
    #[arg(long, default_value = "other")]
    pub category: Category,
}

#[derive(Args, Debug)]
pub struct IntakeArgs {
    /// `ITEM,YYYY-MM-DD,QTY`; repeat for several entries.
    #[arg(long = "entry", required = true, value_parser = parse_intake_entry)]
    pub entries: Vec<IntakeEntry>,
}

#[derive(Args, Debug)]
pub struct CorrectArgs {
    pub item: ItemId,
    pub batch: BatchId,
    #[arg(allow_negative_numbers = true)]
    pub quantity: i64,
    /// Move the batch to a new expiry date (merges into a batch already on that date).
    #[arg(long)]
    pub expiry: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct TakeArgs {
    /// `ITEM=QTY` lines.
    #[arg(required = true, value_parser = parse_take_line)]
    pub lines: Vec<(ItemId, i64)>,

    /// Commit the plan instead of only printing it.
    #[arg(long)]
    pub yes: bool,
}

pub fn parse_intake_entry(raw: &str) -> Result<IntakeEntry, String> {
    let mut parts = raw.split(',').map(str::trim);
    let (Some(item), Some(date), Some(quantity), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected ITEM,YYYY-MM-DD,QTY, got `{raw}`"));
    };

    Ok(IntakeEntry {
        item_id: item.parse().map_err(|e| format!("{e}"))?,
        expiry_date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("invalid expiry date `{date}`: {e}"))?,
        quantity: quantity
            .parse()
            .map_err(|e| format!("invalid quantity `{quantity}`: {e}"))?,
    })
}

pub fn parse_take_line(raw: &str) -> Result<(ItemId, i64), String> {
    let (item, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ITEM=QTY, got `{raw}`"))?;
    let item: ItemId = item.parse().map_err(|e| format!("{e}"))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|e| format!("invalid quantity `{quantity}`: {e}"))?;
    Ok((item, quantity))
}
