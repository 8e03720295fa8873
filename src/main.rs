use anyhow::{anyhow, bail, Context, Result};
use brokerdesk::application::forms::LoginForm;
use brokerdesk::domain::accounting::AccountingFilter;
use brokerdesk::domain::entities::{
    Apartment, Client, Commercial, Deal, District, Entity, Land, Metro, User, View,
};
use brokerdesk::domain::value_objects::ResourceName;
use brokerdesk::infrastructure::routes::{guard, GuardDecision};
use brokerdesk::presentation::cli_summary::{
    print_accounting, print_change_page, print_entities, print_perf_summary,
};
use brokerdesk::presentation::writers::{all_writers, write_to_file, writer_for};
use brokerdesk::{
    connect, init_tracing, ApiError, AppConfig, Backend, ChangeLogQuery, EntityStore, LogLevel,
    Operation, PageRequest,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "brokerdesk",
    about = "Brokerdesk: back-office console for the real-estate CRM."
)]
struct Cli {
    /// TOML config file. Environment variables (BROKERDESK_API__BASE_URL, ...) override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print per-request timings after the command.
    #[arg(long, global = true)]
    timings: bool,

    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the token for later commands.
    Login {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// Browse the audit log (superuser only).
    Changes {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Only records of this table.
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        operation: Option<Operation>,
        #[arg(long)]
        user: Option<String>,
        /// Also write the page to the output dir: json, html or all.
        #[arg(long)]
        export: Option<String>,
    },
    /// List one page of a resource.
    List {
        resource: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Delete a record (superuser only).
    Delete { resource: String, id: i64 },
    /// Income, expenses and monthly totals.
    Accounting {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LogLevel::Error
    } else if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    init_tracing(level);

    let cfg = AppConfig::load(cli.config.as_deref())?;
    let backend = connect(&cfg)?;

    let outcome = run(&cli.command, &cfg, &backend).await;

    if cli.timings {
        print_perf_summary(&backend.perf());
    }
    outcome
}

async fn run(command: &Command, cfg: &AppConfig, backend: &Backend) -> Result<()> {
    match command {
        Command::Login { phone, password } => {
            let form = LoginForm {
                phone: phone.clone(),
                password: password.clone(),
            };
            backend.session().login(&form).await.map_err(explain)?;
            println!("Signed in.");
        }
        Command::Logout => {
            backend.session().logout();
            println!("Signed out.");
        }
        Command::Whoami => {
            require_token(backend, "/dashboard")?;
            let me = backend.session().me().await.map_err(explain)?;
            println!(
                "{} ({}){}",
                me.full_name.as_deref().unwrap_or("—"),
                me.phone.as_deref().unwrap_or("—"),
                if me.is_superuser { ", superuser" } else { "" }
            );
        }
        Command::Changes {
            page,
            table,
            operation,
            user,
            export,
        } => {
            require_token(backend, "/changes")?;
            let filter = ChangeLogQuery {
                table_name: table.clone(),
                operation: *operation,
                user: user.clone(),
            };
            let result = backend
                .change_log()
                .page(*page, &filter)
                .await
                .map_err(explain)?;
            print_change_page(&result);

            if let Some(format) = export {
                let dir = Path::new(&cfg.output.dir);
                let writers = match format.as_str() {
                    "all" => all_writers(),
                    fmt => vec![writer_for(fmt).ok_or_else(|| anyhow!("Unknown format: {}", fmt))?],
                };
                for writer in writers {
                    let path = write_to_file(writer.as_ref(), &result, dir)?;
                    println!("Change log written to {}", path.display());
                }
            }
        }
        Command::List { resource, page } => {
            let resource = parse_resource(resource)?;
            require_token(backend, &screen_of(resource))?;
            let page = PageRequest::new(*page, backend.page_size());
            match resource.0 {
                "apartment" => list::<Apartment>(backend, &page).await?,
                "land" => list::<Land>(backend, &page).await?,
                "commercial" => list::<Commercial>(backend, &page).await?,
                "clients" => list::<Client>(backend, &page).await?,
                "deals" => list::<Deal>(backend, &page).await?,
                "views" => list::<View>(backend, &page).await?,
                "user" => list::<User>(backend, &page).await?,
                "metro" => list::<Metro>(backend, &page).await?,
                "district" => list::<District>(backend, &page).await?,
                other => bail!("No listing for {other}"),
            }
        }
        Command::Delete { resource, id } => {
            let resource = parse_resource(resource)?;
            require_token(backend, &screen_of(resource))?;
            backend
                .session()
                .require_superuser()
                .await
                .map_err(explain)?;
            match resource.0 {
                "apartment" => delete::<Apartment>(backend, *id).await?,
                "land" => delete::<Land>(backend, *id).await?,
                "commercial" => delete::<Commercial>(backend, *id).await?,
                "clients" => delete::<Client>(backend, *id).await?,
                "deals" => delete::<Deal>(backend, *id).await?,
                "views" => delete::<View>(backend, *id).await?,
                "user" => delete::<User>(backend, *id).await?,
                "metro" => delete::<Metro>(backend, *id).await?,
                "district" => delete::<District>(backend, *id).await?,
                other => bail!("Cannot delete from {other}"),
            }
            println!("Deleted {} #{}.", resource, id);
        }
        Command::Accounting { from, to } => {
            require_token(backend, "/accounting")?;
            let filter = AccountingFilter {
                date_from: *from,
                date_to: *to,
            };
            let report = backend.accounting().load(&filter).await.map_err(explain)?;
            print_accounting(&report);
        }
    }
    Ok(())
}

async fn list<T: Entity>(backend: &Backend, page: &PageRequest) -> Result<()> {
    let mut store = EntityStore::<T>::new(Arc::clone(&backend.transport));
    store.fetch(page).await.map_err(explain)?;
    print_entities(store.items(), store.state().count);
    Ok(())
}

async fn delete<T: Entity>(backend: &Backend, id: i64) -> Result<()> {
    let mut store = EntityStore::<T>::new(Arc::clone(&backend.transport));
    store.delete(id).await.map_err(explain)
}

/// Screen path of a resource; the user resource lives under `/users`.
fn screen_of(resource: ResourceName) -> String {
    match resource.0 {
        "user" => "/users".to_string(),
        other => format!("/{other}"),
    }
}

fn parse_resource(raw: &str) -> Result<ResourceName> {
    ResourceName::parse(raw).with_context(|| {
        format!(
            "Unknown resource '{}', expected one of: {}",
            raw,
            ResourceName::ALL.join(", ")
        )
    })
}

/// Apply the screen guard for `screen` before any request is sent.
fn require_token(backend: &Backend, screen: &str) -> Result<()> {
    match guard(screen, backend.session().is_authenticated()) {
        GuardDecision::Allow | GuardDecision::RedirectHome => Ok(()),
        GuardDecision::RedirectLogin => bail!("Not signed in. Run `brokerdesk login` first."),
        GuardDecision::NotFound => bail!("Not found: {screen}"),
    }
}

/// Turn a backend failure into the message the operator should read.
fn explain(err: ApiError) -> anyhow::Error {
    match err.login_redirect() {
        Some(_) => anyhow!("{} Run `brokerdesk login`.", err.user_message()),
        None => anyhow!("{}", err.user_message()),
    }
}
