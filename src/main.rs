use std::{
    collections::HashMap,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use adpanel::{
    config::AppConfig,
    delivery::{AdDelivery, AdEvent, HostPage, InitStatus, Placement},
    listing::PageItem,
    models::{AdForm, AdKind, AdStatus, ImageFile},
    optimistic::ActionOutcome,
    query::{AdFilter, DateRange, Selection},
    screens::{
        stats::DEFAULT_RANGE_DAYS,
        AdScreen, BlacklistScreen, ClickStatsScreen, Operator, SettingsPanel, TrafficScreen,
        VisitorStatsScreen,
    },
    table::Direction,
    Console,
};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "adpanel")]
#[command(about = "Operator console for the ads backend")]
#[command(
    after_help = "Environment:\n  API_BASE_URL     Ads backend base URL\n  ADMIN_USERNAME   Operator login (default root)\n  ADMIN_PASSWORD   Operator password\n  RUST_LOG         Log filter"
)]
struct Cli {
    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true, default_value_t = false)]
    yes: bool,
    /// Login name; defaults to ADMIN_USERNAME
    #[arg(long, global = true)]
    username: Option<String>,
    /// Password; prompted on stdin when omitted
    #[arg(long, global = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage ads
    Ads {
        #[command(subcommand)]
        command: AdsCommand,
    },
    /// Delivery switches
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Domain blacklist
    Blacklist {
        #[command(subcommand)]
        command: BlacklistCommand,
    },
    /// Click and visitor statistics
    Stats {
        #[command(subcommand)]
        command: StatsCommand,
    },
    /// Traffic overview and daily series
    Traffic {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Run one ad delivery cycle against a console-backed page
    Preview {
        #[arg(long, default_value = "https:")]
        protocol: String,
        #[arg(long, default_value = "localhost")]
        hostname: String,
        /// Click this placement after rendering
        #[arg(long)]
        click: Option<AdKind>,
        /// Close this placement after rendering
        #[arg(long)]
        close: Option<AdKind>,
    },
}

#[derive(Subcommand)]
enum AdsCommand {
    List {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// main, secondary or all
        #[arg(long = "type", default_value = "all")]
        kind: Selection<AdKind>,
        /// active, inactive or all
        #[arg(long, default_value = "all")]
        status: Selection<AdStatus>,
        /// Sort by id or created_at
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, default_value_t = false)]
        desc: bool,
    },
    Create {
        link: String,
        #[arg(long = "type", default_value = "main")]
        kind: AdKind,
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = false)]
        x_redirect: bool,
    },
    Edit {
        id: i64,
        link: String,
        #[arg(long = "type", default_value = "main")]
        kind: AdKind,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        x_redirect: bool,
    },
    Delete {
        id: i64,
    },
    ToggleStatus {
        id: i64,
    },
    ToggleRedirect {
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    Global,
    Main,
    Secondary,
    MainOncePerDay,
    SecondaryOncePerDay,
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Toggle {
        #[arg(value_enum)]
        switch: Switch,
    },
}

#[derive(Subcommand)]
enum BlacklistCommand {
    List,
    Add { domain: String },
    Remove { id: i64 },
    Check { domain: String },
}

#[derive(Subcommand)]
enum StatsCommand {
    Clicks {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long = "type", default_value = "main")]
        kind: AdKind,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    Visitors {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
}

// ── Operator over stdin/stderr ─────────────────────────────────────────────

struct StdinOperator {
    assume_yes: bool,
}

impl Operator for StdinOperator {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

// ── Console-backed host page ───────────────────────────────────────────────

/// Host page that prints what a browser would show.
struct ConsolePage {
    protocol: String,
    hostname: String,
    containers: HashMap<String, bool>,
}

impl HostPage for ConsolePage {
    fn protocol(&self) -> String {
        self.protocol.clone()
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn has_container(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    fn mount_container(&mut self, placement: &Placement) {
        tracing::debug!("mounting #{}", placement.container_id);
        self.containers.insert(placement.container_id.to_owned(), false);
    }

    fn render(&mut self, id: &str, markup: &str) {
        println!("#{id}: {markup}");
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(shown) = self.containers.get_mut(id) {
            *shown = visible;
        }
        println!("#{id}: {}", if visible { "shown" } else { "hidden" });
    }

    fn open_new_context(&mut self, link: &str) {
        println!("open {link}");
    }
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file is absent; env vars may already be set)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adpanel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    tracing::debug!("backend: {}", config.api_base_url);
    let console = Console::new(config)?;
    let operator = StdinOperator {
        assume_yes: cli.yes,
    };

    // Delivery runs on public pages and needs no operator session
    if matches!(cli.command, Command::Preview { .. }) {
        return run(&console, &operator, cli.command).await;
    }

    let username = cli
        .username
        .clone()
        .unwrap_or_else(|| console.config.admin_username.clone());
    let password = match cli.password.clone() {
        Some(p) => p,
        None => prompt_password()?,
    };
    let token = console
        .login(&username, &password)
        .await
        .context("login failed")?;

    let result = run(&console, &operator, cli.command).await;
    console.logout(&token).await;
    result
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Explicit bounds win; a missing start falls back to `default_days` before `end`.
fn range(start: Option<NaiveDate>, end: Option<NaiveDate>, default_days: u64) -> DateRange {
    let end = end.unwrap_or_else(today);
    match start {
        Some(start) => DateRange::new(start, end),
        None => DateRange::last_days(end, default_days),
    }
}

fn finish(outcome: ActionOutcome) -> Result<()> {
    match outcome {
        ActionOutcome::Applied => Ok(()),
        ActionOutcome::Declined => {
            eprintln!("cancelled");
            Ok(())
        }
        other => anyhow::bail!("action not applied: {:?}", other),
    }
}

async fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());
    Ok(ImageFile { file_name, bytes })
}

fn print_pager(items: &[PageItem]) {
    let bar: Vec<String> = items
        .iter()
        .map(|item| match item {
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "…".into(),
        })
        .collect();
    if !bar.is_empty() {
        println!("pages: {}", bar.join(" "));
    }
}

async fn run(console: &Console, operator: &StdinOperator, command: Command) -> Result<()> {
    let api = &console.api;

    match command {
        Command::Ads { command } => {
            let mut screen = AdScreen::new();
            match command {
                AdsCommand::List {
                    start,
                    end,
                    kind,
                    status,
                    sort,
                    desc,
                } => {
                    let filter = AdFilter {
                        start,
                        end,
                        kind,
                        status,
                    };
                    screen.set_filter(api, filter).await?;
                    if let Some(column) = sort {
                        let direction = if desc {
                            Direction::Descending
                        } else {
                            Direction::Ascending
                        };
                        screen.table_mut().sort_by(&column, direction);
                    }
                    println!("id\ttype\tstatus\tx_redirect\tcreated_at\tlink\timage");
                    for ad in screen.view() {
                        println!(
                            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                            ad.id,
                            ad.kind().as_str(),
                            ad.status.as_str(),
                            ad.x_redirect_enabled,
                            ad.created_at.as_deref().unwrap_or("-"),
                            ad.link,
                            api.http().url(&ad.img_url),
                        );
                    }
                }
                AdsCommand::Create {
                    link,
                    kind,
                    image,
                    x_redirect,
                } => {
                    let form = AdForm {
                        link,
                        kind,
                        x_redirect_enabled: x_redirect,
                        image: Some(read_image(&image).await?),
                    };
                    finish(screen.save(api, operator, None, &form).await)?;
                    println!("{} ad(s)", screen.ads().len());
                }
                AdsCommand::Edit {
                    id,
                    link,
                    kind,
                    image,
                    x_redirect,
                } => {
                    let image = match image {
                        Some(path) => Some(read_image(&path).await?),
                        None => None,
                    };
                    let form = AdForm {
                        link,
                        kind,
                        x_redirect_enabled: x_redirect,
                        image,
                    };
                    finish(screen.save(api, operator, Some(id), &form).await)?;
                }
                AdsCommand::Delete { id } => {
                    screen.load(api).await?;
                    finish(screen.delete(api, operator, id).await)?;
                }
                AdsCommand::ToggleStatus { id } => {
                    screen.load(api).await?;
                    finish(screen.toggle_status(api, operator, id).await)?;
                }
                AdsCommand::ToggleRedirect { id } => {
                    screen.load(api).await?;
                    finish(screen.toggle_x_redirect(api, operator, id).await)?;
                }
            }
        }

        Command::Settings { command } => {
            let mut panel = SettingsPanel::new();
            if let Err(e) = panel.load(api).await {
                operator.notify(&format!("Could not load settings, showing defaults: {}", e.notice()));
            }
            if let SettingsCommand::Toggle { switch } = command {
                let outcome = match switch {
                    Switch::Global => panel.toggle_global(api, operator).await,
                    Switch::Main => panel.toggle_placement(api, operator, AdKind::Main).await,
                    Switch::Secondary => {
                        panel.toggle_placement(api, operator, AdKind::Secondary).await
                    }
                    Switch::MainOncePerDay => {
                        panel.toggle_once_per_day(api, operator, AdKind::Main).await
                    }
                    Switch::SecondaryOncePerDay => {
                        panel
                            .toggle_once_per_day(api, operator, AdKind::Secondary)
                            .await
                    }
                };
                if outcome == ActionOutcome::Rejected {
                    operator.notify("Placement switches are locked while ads are globally disabled.");
                }
                finish(outcome)?;
            }
            let s = panel.settings();
            println!("global_enabled\t{}", s.global_enabled);
            println!("main_enabled\t{}", s.main_enabled);
            println!("secondary_enabled\t{}", s.secondary_enabled);
            println!("main_ad_once_per_day\t{}", s.main_ad_once_per_day);
            println!("secondary_ad_once_per_day\t{}", s.secondary_ad_once_per_day);
        }

        Command::Blacklist { command } => {
            let mut screen = BlacklistScreen::new();
            match command {
                BlacklistCommand::List => {
                    screen.load(api).await?;
                    for d in screen.domains() {
                        println!("{}\t{}\t{}", d.id, d.domain, d.created_at.as_deref().unwrap_or("-"));
                    }
                }
                BlacklistCommand::Add { domain } => {
                    finish(screen.add(api, operator, &domain).await)?;
                    println!("{} domain(s) blacklisted", screen.domains().len());
                }
                BlacklistCommand::Remove { id } => {
                    screen.load(api).await?;
                    finish(screen.remove(api, operator, id).await)?;
                }
                BlacklistCommand::Check { domain } => {
                    let check = screen.check(api, &domain).await?;
                    println!(
                        "{}\t{}",
                        check.domain,
                        if check.blacklisted { "blacklisted" } else { "allowed" }
                    );
                }
            }
        }

        Command::Stats { command } => match command {
            StatsCommand::Clicks {
                start,
                end,
                kind,
                page,
                page_size,
            } => {
                let size = page_size.unwrap_or(console.config.default_page_size);
                let mut screen = ClickStatsScreen::new(today(), size)
                    .with_filter(range(start, end, DEFAULT_RANGE_DAYS), kind);
                screen.fetch_page(api, page, size).await?;

                println!("domain\tip\tclicks\tday");
                for row in screen.view() {
                    println!("{}\t{}\t{}\t{}", row.domain, row.ip, row.clicks, row.day);
                }
                let p = screen.page();
                println!("page {} · {} per page · {} total", p.current, p.page_size, p.total);
                print_pager(&screen.pager());
            }
            StatsCommand::Visitors {
                start,
                end,
                page,
                page_size,
            } => {
                let size = page_size.unwrap_or(console.config.default_page_size);
                let mut screen = VisitorStatsScreen::new(today(), size)
                    .with_range(range(start, end, DEFAULT_RANGE_DAYS));
                screen.fetch_page(api, page, size).await?;

                let summary = screen.summary();
                println!(
                    "visits {} · domains {} · ips {}",
                    summary.total_visits, summary.distinct_domains, summary.distinct_ips
                );
                println!("domain\tip\tvisits\tday");
                for row in screen.view() {
                    println!("{}\t{}\t{}\t{}", row.domain, row.ip, row.visits, row.day);
                }
                let p = screen.page();
                println!("page {} · {} per page · {} total", p.current, p.page_size, p.total);
                print_pager(&screen.pager());
            }
        },

        Command::Traffic { start, end } => {
            let mut screen = TrafficScreen::new(today());
            if start.is_some() || end.is_some() {
                screen.set_range(api, range(start, end, 7)).await?;
            } else {
                screen.load(api).await?;
            }

            let all = screen.overview();
            println!(
                "all time: views {} · clicks {} (main {}, secondary {})",
                all.total_views, all.total_clicks, all.main_clicks, all.secondary_clicks
            );
            let r = screen.range();
            let kpis = screen.kpis();
            println!(
                "{} to {}: views {} · clicks {} (main {}, secondary {})",
                r.start, r.end, kpis.total_views, kpis.total_clicks, kpis.main_clicks, kpis.secondary_clicks
            );
            for day in &screen.daily().page_views {
                println!("{}\t{}", day.day, day.count);
            }
        }

        Command::Preview {
            protocol,
            hostname,
            click,
            close,
        } => preview(console, protocol, hostname, click, close).await?,
    }

    Ok(())
}

async fn preview(
    console: &Console,
    protocol: String,
    hostname: String,
    click: Option<AdKind>,
    close: Option<AdKind>,
) -> Result<()> {
    let page = ConsolePage {
        protocol,
        hostname,
        containers: HashMap::new(),
    };
    let mut delivery = AdDelivery::new(page, console.api.clone());

    match delivery.init().await {
        InitStatus::Skipped => println!("local file page; nothing to do"),
        InitStatus::Started { shown } => println!("{shown} ad(s) shown"),
    }

    if let Some(kind) = click {
        if !delivery.handle(kind, AdEvent::Click).await {
            println!("no {} ad showing", kind.as_str());
        }
    }
    if let Some(kind) = close {
        if !delivery.handle(kind, AdEvent::Close).await {
            println!("no {} ad showing", kind.as_str());
        }
    }
    Ok(())
}
