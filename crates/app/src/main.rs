use std::error::Error;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    Engine, EntryFilter, EntryKind, EntryStatus, Money, OperationForm, PlanLimits, PlanTier,
    ReportRequest, UploadedFile,
};
use migration::{Migrator, MigratorTrait};
use uuid::Uuid;

use attachments::DirectoryStore;
use settings::Settings;

mod attachments;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "bookkeeper")]
#[command(about = "Operator utilities for the grouped ledger")]
struct Cli {
    /// Settings file, without extension (also read from `BOOKKEEPER_CONFIG`).
    #[arg(long, env = "BOOKKEEPER_CONFIG", default_value = "settings")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations and exit.
    Migrate,
    Owner(Owner),
    Account(Account),
    Category(Named),
    Counterparty(Named),
    Operation(Operation),
    /// Monthly cap usage of an owner.
    Usage(OwnerArgs),
    /// Totals over a date range.
    Report(ReportArgs),
    Balances(Balances),
}

#[derive(Args, Debug)]
struct OwnerArgs {
    #[arg(long)]
    owner: String,
}

#[derive(Args, Debug)]
struct Owner {
    #[command(subcommand)]
    command: OwnerCommand,
}

#[derive(Subcommand, Debug)]
enum OwnerCommand {
    Create(OwnerPlanArgs),
    Plan(OwnerPlanArgs),
}

#[derive(Args, Debug)]
struct OwnerPlanArgs {
    #[arg(long)]
    owner: String,
    #[arg(long, default_value = "free", value_parser = parse_plan)]
    plan: PlanTier,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    List(OwnerArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "bank")]
    kind: String,
    #[arg(long, default_value = "0")]
    initial: Money,
}

#[derive(Args, Debug)]
struct Named {
    #[command(subcommand)]
    command: NamedCommand,
}

#[derive(Subcommand, Debug)]
enum NamedCommand {
    Create(NamedCreateArgs),
    List(OwnerArgs),
}

#[derive(Args, Debug)]
struct NamedCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Operation {
    #[command(subcommand)]
    command: OperationCommand,
}

#[derive(Subcommand, Debug)]
enum OperationCommand {
    /// Create an operation, or replace the one named by `--group-key`.
    Save(OperationSaveArgs),
    List(OperationListArgs),
    Delete(EntryArgs),
    /// Settle a payable entry (`--all` settles its whole operation).
    Settle(SettleArgs),
}

#[derive(Args, Debug)]
struct OperationSaveArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    group_key: Option<String>,
    #[arg(long)]
    description: String,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_kind)]
    kind: EntryKind,
    #[arg(long, default_value = "settled", value_parser = parse_status)]
    status: EntryStatus,
    #[arg(long)]
    category: Option<Uuid>,
    #[arg(long)]
    counterparty: Option<Uuid>,
    #[arg(long)]
    fiscal: Option<bool>,
    /// Payment line as `ACCOUNT_ID=AMOUNT`; repeat to split across accounts.
    #[arg(long = "line", required = true, value_parser = parse_line)]
    lines: Vec<(Uuid, Money)>,
    /// File to upload and attach to every entry of the operation.
    #[arg(long = "attach")]
    attach: Vec<String>,
}

#[derive(Args, Debug)]
struct OperationListArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    account: Option<Uuid>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = parse_status)]
    status: Option<EntryStatus>,
    /// Zero-based page; lists everything when omitted.
    #[arg(long)]
    page: Option<u64>,
    #[arg(long, default_value_t = 20)]
    per_page: u64,
}

#[derive(Args, Debug)]
struct EntryArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    entry: Uuid,
}

#[derive(Args, Debug)]
struct SettleArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    entry: Uuid,
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: NaiveDate,
    #[arg(long, default_value_t = engine::DEFAULT_COST_RATIO_PERCENT)]
    cost_ratio: u32,
}

#[derive(Args, Debug)]
struct Balances {
    #[command(subcommand)]
    command: BalancesCommand,
}

#[derive(Subcommand, Debug)]
enum BalancesCommand {
    /// Report accounts whose balance disagrees with their entries.
    Check(OwnerArgs),
    /// Rewrite drifted balances from the entries.
    Recompute(OwnerArgs),
}

fn parse_plan(raw: &str) -> Result<PlanTier, String> {
    PlanTier::try_from(raw).map_err(|err| err.to_string())
}

fn parse_kind(raw: &str) -> Result<EntryKind, String> {
    EntryKind::try_from(raw.to_lowercase().as_str()).map_err(|err| err.to_string())
}

fn parse_status(raw: &str) -> Result<EntryStatus, String> {
    EntryStatus::try_from(raw.to_lowercase().as_str()).map_err(|err| err.to_string())
}

fn parse_line(raw: &str) -> Result<(Uuid, Money), String> {
    let (account, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ACCOUNT_ID=AMOUNT, got {raw}"))?;
    let account = Uuid::parse_str(account.trim()).map_err(|err| err.to_string())?;
    let amount = amount.trim().parse::<Money>().map_err(|err| err.to_string())?;
    Ok((account, amount))
}

fn read_upload(path: &str) -> Result<UploadedFile, Box<dyn Error + Send + Sync>> {
    let bytes = std::fs::read(path)?;
    let name = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    Ok(UploadedFile::new(name, bytes))
}

async fn connect_engine(settings: &Settings) -> Result<Engine, Box<dyn Error + Send + Sync>> {
    let db = sea_orm::Database::connect(settings.database.url()).await?;
    Migrator::up(&db, None).await?;
    let engine = Engine::builder()
        .database(db)
        .attachment_store(DirectoryStore::new(&settings.attachments.dir))
        .plan_limits(PlanLimits::from(&settings.plans))
        .build()
        .await?;
    Ok(engine)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bookkeeper={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if let Err(err) = run(cli.command, &settings).await {
        tracing::error!("command failed: {err}");
        return Err(err);
    }
    Ok(())
}

async fn run(command: Command, settings: &Settings) -> Result<(), Box<dyn Error + Send + Sync>> {
    let engine = connect_engine(settings).await?;

    match command {
        Command::Migrate => {
            tracing::info!("schema up to date");
        }
        Command::Owner(Owner { command }) => match command {
            OwnerCommand::Create(args) => {
                engine.register_owner(&args.owner, args.plan).await?;
                println!("created owner: {} ({})", args.owner, args.plan.as_str());
            }
            OwnerCommand::Plan(args) => {
                engine.set_owner_plan(&args.owner, args.plan).await?;
                println!("owner {} now on {}", args.owner, args.plan.as_str());
            }
        },
        Command::Account(Account { command }) => match command {
            AccountCommand::Create(args) => {
                let id = engine
                    .new_account(&args.owner, &args.name, &args.kind, args.initial)
                    .await?;
                println!("created account: {} ({id})", args.name);
            }
            AccountCommand::List(args) => {
                for account in engine.accounts(&args.owner).await? {
                    println!(
                        "{}\t{}\t{}\t{}",
                        account.id, account.name, account.kind_label, account.balance
                    );
                }
            }
        },
        Command::Category(Named { command }) => match command {
            NamedCommand::Create(args) => {
                let id = engine.new_category(&args.owner, &args.name).await?;
                println!("created category: {} ({id})", args.name);
            }
            NamedCommand::List(args) => {
                for record in engine.categories(&args.owner).await? {
                    println!("{}\t{}", record.id, record.name);
                }
            }
        },
        Command::Counterparty(Named { command }) => match command {
            NamedCommand::Create(args) => {
                let id = engine.new_counterparty(&args.owner, &args.name).await?;
                println!("created counterparty: {} ({id})", args.name);
            }
            NamedCommand::List(args) => {
                for record in engine.counterparties(&args.owner).await? {
                    println!("{}\t{}", record.id, record.name);
                }
            }
        },
        Command::Operation(Operation { command }) => {
            run_operation(&engine, command).await?;
        }
        Command::Usage(args) => {
            let usage = engine
                .usage_summary(&args.owner, Utc::now().date_naive())
                .await?;
            match usage.cap {
                Some(cap) => println!(
                    "{}: {}/{} operations, {} remaining, {} days left",
                    usage.plan.as_str(),
                    usage.used,
                    cap,
                    usage.remaining.unwrap_or_default(),
                    usage.days_left_in_period
                ),
                None => println!(
                    "{}: {} operations, uncapped",
                    usage.plan.as_str(),
                    usage.used
                ),
            }
        }
        Command::Report(args) => {
            let mut request = ReportRequest::new(args.owner, args.from, args.to);
            request.cost_ratio_percent = args.cost_ratio;
            let summary = engine.period_summary(&request).await?;
            println!("operations:      {}", summary.operation_count);
            println!("settled inflow:  {}", summary.settled_inflow);
            println!("settled outflow: {}", summary.settled_outflow);
            println!("payable inflow:  {}", summary.payable_inflow);
            println!("payable outflow: {}", summary.payable_outflow);
            println!("net:             {}", summary.net);
            println!("revenue target:  {}", summary.revenue_target);
        }
        Command::Balances(Balances { command }) => match command {
            BalancesCommand::Check(args) => {
                let drift = engine.balance_drift(&args.owner).await?;
                if drift.is_empty() {
                    println!("all balances consistent");
                }
                for item in drift {
                    println!(
                        "{} ({}): recorded {}, derived {}",
                        item.name, item.account_id, item.recorded, item.derived
                    );
                }
            }
            BalancesCommand::Recompute(args) => {
                let fixed = engine.recompute_balances(&args.owner).await?;
                println!("recomputed {} balances", fixed.len());
            }
        },
    }

    Ok(())
}

async fn run_operation(
    engine: &Engine,
    command: OperationCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        OperationCommand::Save(args) => {
            let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
            let mut form = OperationForm::new(args.description, date, args.kind, args.status);
            form.group_key = args.group_key;
            form.category_id = args.category;
            form.counterparty_id = args.counterparty;
            form.fiscal_document = args.fiscal;
            for (account, amount) in args.lines {
                form = form.line(account, amount);
            }
            let uploads = args
                .attach
                .iter()
                .map(|path| read_upload(path))
                .collect::<Result<Vec<_>, _>>()?;
            let key = engine.create_or_update(&args.owner, &form, &uploads).await?;
            println!("saved operation: {key}");
        }
        OperationCommand::List(args) => {
            let filter = EntryFilter {
                from: args.from,
                to: args.to,
                account_id: args.account,
                description: args.description,
                status: args.status,
                ..EntryFilter::default()
            };
            let views = match args.page {
                Some(page) => {
                    let page = engine
                        .list_operations_page(&args.owner, &filter, page, args.per_page)
                        .await?;
                    println!(
                        "page {} of {} ({} entries)",
                        page.page + 1,
                        page.total_pages(),
                        page.total
                    );
                    page.items
                }
                None => engine.list_operations(&args.owner, &filter).await?,
            };
            for view in views {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    view.date,
                    view.group_key,
                    view.signed_total(),
                    view.status.as_str(),
                    view.accounts_label,
                    view.description
                );
            }
        }
        OperationCommand::Delete(args) => {
            let removed = engine.delete_operation(&args.owner, args.entry).await?;
            println!("deleted {removed} entries");
        }
        OperationCommand::Settle(args) => {
            if args.all {
                let settled = engine.settle_operation(&args.owner, args.entry).await?;
                println!("settled {settled} entries");
            } else if engine.settle_entry(&args.owner, args.entry).await? {
                println!("entry settled");
            } else {
                println!("entry already settled");
            }
        }
    }
    Ok(())
}
