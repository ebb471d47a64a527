//! Terminal front end for the AI data agent
//!
//! # Usage
//!
//! ```bash
//! # Search, sort by date and export the hits as CSV
//! data-agent search "solar sensors" --sort date --export csv
//!
//! # Ask the assistant (REPL when no message is given)
//! data-agent chat "find reports about battery health"
//!
//! # Keep the insights dashboard refreshing
//! data-agent insights --watch
//!
//! # Narrow by date and show facet counts
//! data-agent search "battery" --since 2024-03-01 --until 2024-03-31 --facets
//!
//! # Manage records
//! data-agent records create --title "Field notes" --content '{"site": 4}'
//! data-agent records import rows.csv --map Name=title
//! data-agent records delete <id>
//! ```

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use data_agent::api::types::{
    BulkOperation, BulkOperationKind, ImportFormat, RecordUpdate, SearchResult,
};
use data_agent::chat::{ChatMessage, ChatOutcome, KeywordIntentClassifier};
use data_agent::data::{DeleteOutcome, RecordForm};
use data_agent::insights::{InsightsSnapshot, RefreshOutcome, RefreshTrigger};
use data_agent::results::export::{write_export, ExportFormat};
use data_agent::results::view::render_table;
use data_agent::results::ResultsRenderer;
use data_agent::search::{DateRange, SearchFilters, SearchMode, SearchOutcome, SortKey, SortOrder};
use data_agent::storage::{ResultsLayout, Theme};
use data_agent::{Agent, AgentConfig, AgentEvent};

#[derive(Parser)]
#[command(name = "data-agent")]
#[command(about = "Search, chat with and analyse a document store", long_about = None)]
struct Cli {
    /// Configuration file (TOML); DATA_AGENT_* variables override it
    #[arg(short, long, default_value = "data-agent.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search and print the results
    Search(SearchArgs),
    /// Show suggestions for a partial query
    Suggest {
        partial: String,
    },
    /// Show or clear recent searches
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Manage saved searches
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
    /// Browse and edit records
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },
    /// Talk to the assistant (interactive when no message is given)
    Chat {
        message: Option<String>,
        /// Classify intent locally instead of asking the backend
        #[arg(long)]
        offline: bool,
    },
    /// Show the insights dashboard
    Insights {
        /// Keep refreshing on the configured interval
        #[arg(long)]
        watch: bool,
    },
    /// Print frames from the push channel
    Watch {
        /// Ask the server to stream a search
        #[arg(long)]
        search: Option<String>,
        /// Send a chat message over the channel
        #[arg(long)]
        chat: Option<String>,
    },
    /// Check backend and AI service health
    Health,
    /// Compute embeddings for the given texts
    Embed {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Show or change local preferences
    Prefs {
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    query: String,
    /// hybrid, semantic, keyword, fuzzy or exact
    #[arg(short, long, default_value = "hybrid")]
    mode: String,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    min_score: Option<f64>,
    /// Only records created on or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    since: Option<String>,
    /// Only records created on or before this date
    #[arg(long)]
    until: Option<String>,
    /// Let the server interpret the query and attach insights (filters are ignored)
    #[arg(long)]
    smart: bool,
    /// Also print category, tag and status counts
    #[arg(long)]
    facets: bool,
    /// relevance, date, title, category or any result field
    #[arg(long, default_value = "relevance")]
    sort: String,
    #[arg(long, default_value = "desc")]
    order: String,
    /// Export instead of printing: csv or json
    #[arg(long)]
    export: Option<String>,
    /// Export destination (defaults to a timestamped file name)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Restrict the export to these result ids
    #[arg(long = "select")]
    selected: Vec<String>,
}

#[derive(Subcommand)]
enum SavedAction {
    List,
    /// Run a search and save it under a name
    Save { name: String, query: String },
    Run { id: Uuid },
    Remove { id: Uuid },
}

#[derive(Subcommand)]
enum RecordsAction {
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        category: Option<String>,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Record content as a JSON object
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Upload a json, csv, xlsx or txt file
    Import {
        path: PathBuf,
        /// Defaults to the file extension
        #[arg(long)]
        format: Option<String>,
        /// Column mapping, e.g. --map Name=title
        #[arg(long = "map")]
        mappings: Vec<String>,
    },
    /// Ask the server to validate a record given as a JSON object
    Validate {
        record: String,
    },
    /// Bulk insert, update or delete
    Bulk {
        #[arg(value_enum)]
        operation: BulkArg,
        /// JSON array of records
        #[arg(long)]
        file: Option<PathBuf>,
        /// JSON object selecting the records to update or delete
        #[arg(long)]
        filters: Option<String>,
    },
    /// Dataset-wide counters
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum BulkArg {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Table,
    Compact,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AgentConfig::load(Some(cli.config.as_path())).context("Failed to load configuration")?;
    init_logging(&config)?;

    let agent = match &cli.command {
        Commands::Chat { offline: true, .. } => {
            let store = Agent::local_store(&config)?;
            Agent::with_parts(config, store, Arc::new(KeywordIntentClassifier::new()))?
        }
        _ => Agent::from_config(config)?,
    };

    match cli.command {
        Commands::Search(args) => run_search(&agent, args).await?,
        Commands::Suggest { partial } => {
            let suggestions = agent.suggestions.fetch(&partial).await;
            if suggestions.is_empty() {
                println!("No suggestions.");
            }
            for suggestion in suggestions {
                println!("{:<40} {:?}", suggestion.text, suggestion.source);
            }
        }
        Commands::History { clear } => {
            if clear {
                agent.search.clear_recent()?;
                println!("✓ Recent searches cleared");
            } else {
                for entry in agent.search.recent()? {
                    println!(
                        "{:<40} {:<9} {:>6} hit(s)  {}",
                        entry.query,
                        entry.mode,
                        entry.result_count,
                        entry.timestamp.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        Commands::Saved { action } => run_saved(&agent, action).await?,
        Commands::Records { action } => run_records(&agent, action).await?,
        Commands::Chat { message, .. } => {
            if !agent.config.features.chat_enabled {
                bail!("Chat is disabled (features.chat_enabled = false)");
            }
            match message {
                Some(message) => chat_turn(&agent, &message).await?,
                None => chat_repl(&agent).await?,
            }
        }
        Commands::Insights { watch } => run_insights(&agent, watch).await?,
        Commands::Watch { search, chat } => run_watch(&agent, search, chat).await?,
        Commands::Health => {
            let health = agent.health().await?;
            let mark = if health.is_healthy() { "✓" } else { "✗" };
            println!("{} Backend is {}", mark, health.status);
            for (service, status) in &health.services {
                println!("  {:<20} {}", service, status);
            }

            let ai_healthy = match agent.api.ai_health().await {
                Ok(ai) => {
                    let mark = if ai.is_healthy() { "✓" } else { "✗" };
                    println!("{} AI service is {}", mark, ai.status);
                    ai.is_healthy()
                }
                Err(e) => {
                    println!("✗ AI service unreachable: {}", e.user_message());
                    false
                }
            };

            if !health.is_healthy() || !ai_healthy {
                std::process::exit(1);
            }
        }
        Commands::Embed { texts } => {
            let response = agent.api.generate_embeddings(&texts).await?;
            println!(
                "✓ {} embedding(s) of dimension {}",
                response.count, response.dimension
            );
            for (text, vector) in texts.iter().zip(&response.embeddings) {
                let head: Vec<String> = vector.iter().take(4).map(|v| format!("{:.4}", v)).collect();
                println!("  {:<32} [{}, ...]", text, head.join(", "));
            }
        }
        Commands::Prefs { theme, layout } => {
            let mut preferences = agent.preferences()?;
            if let Some(theme) = theme {
                preferences.theme = match theme {
                    ThemeArg::Light => Theme::Light,
                    ThemeArg::Dark => Theme::Dark,
                };
            }
            if let Some(layout) = layout {
                preferences.results_layout = match layout {
                    LayoutArg::Table => ResultsLayout::Table,
                    LayoutArg::Compact => ResultsLayout::Compact,
                };
            }
            agent.save_preferences(&preferences)?;
            println!("{}", serde_json::to_string_pretty(&preferences)?);
        }
    }

    Ok(())
}

fn init_logging(config: &AgentConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format.as_str() {
        "json" => tracing::subscriber::set_global_default(builder.json().finish())?,
        "compact" => tracing::subscriber::set_global_default(builder.compact().finish())?,
        _ => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }

    Ok(())
}

async fn run_search(agent: &Agent, args: SearchArgs) -> anyhow::Result<()> {
    let export = args.export.as_deref().map(str::parse::<ExportFormat>).transpose()?;
    if export.is_some() && !agent.config.features.export_enabled {
        bail!("Export is disabled (features.export_enabled = false)");
    }

    let filters = SearchFilters {
        categories: args.categories,
        tags: args.tags,
        date_range: DateRange::from_bounds(args.since.as_deref(), args.until.as_deref())?,
        min_score: args.min_score,
    };
    if args.smart && !filters.is_empty() {
        bail!("--smart does not take filters");
    }
    let query = agent
        .search
        .query(&args.query)
        .with_mode(args.mode.parse::<SearchMode>()?)
        .with_filters(filters);

    let outcome = if args.smart {
        agent.search.smart_search(query).await?
    } else {
        agent.search.search(query).await?
    };
    match outcome {
        SearchOutcome::Ignored => bail!("Nothing to search for"),
        SearchOutcome::Superseded => {
            warn!("Search was superseded before it finished");
            return Ok(());
        }
        SearchOutcome::Completed { .. } => {}
    }

    let state = agent.search.state().await;
    let mut renderer = agent.results_renderer();
    renderer.set_sort(args.sort.parse::<SortKey>()?, args.order.parse::<SortOrder>()?);
    for id in &args.selected {
        renderer.selection_mut().toggle(id);
    }

    if let Some(format) = export {
        let content = renderer.export(format, &args.query, &state.results)?;
        let path = args
            .output
            .unwrap_or_else(|| PathBuf::from(format.file_name(Utc::now())));
        write_export(&path, &content).await?;
        println!("✓ Exported {} result(s) to {}", exported_count(&renderer, &state.results), path.display());
        return Ok(());
    }

    let layout = agent.preferences()?.results_layout;
    let view = renderer.view(&args.query, &state.results, state.total_count);
    println!("{}", render_table(&view, renderer.selection(), layout));
    if !state.hints.is_empty() {
        println!("Did you mean: {}", state.hints.join(", "));
    }
    if let Some(insights) = &state.insights {
        let summary = insights
            .get("summary")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| insights.to_string());
        println!("\n💡 {}", summary);
    }
    println!("({:.0} ms)", state.processing_time);

    if args.facets {
        for (facet, counts) in agent.search.facets(&args.query).await? {
            println!("\n{}:", facet);
            for (value, count) in counts {
                println!("  {:<20} {}", value, count);
            }
        }
    }

    Ok(())
}

fn exported_count(renderer: &ResultsRenderer, results: &[SearchResult]) -> usize {
    if renderer.selection().is_empty() {
        results.len()
    } else {
        renderer.selection().pick(results).len()
    }
}

async fn run_saved(agent: &Agent, action: SavedAction) -> anyhow::Result<()> {
    match action {
        SavedAction::List => {
            let saved = agent.search.saved()?;
            if saved.is_empty() {
                println!("No saved searches.");
            }
            for search in saved {
                println!(
                    "{}  {:<24} {:<32} used {}x, {} hit(s)",
                    search.id, search.name, search.query.text, search.use_count, search.result_count
                );
            }
        }
        SavedAction::Save { name, query } => {
            agent.search.search_text(&query).await?;
            let saved = agent.search.save(&name).await?;
            println!("✓ Saved '{}' as {}", saved.name, saved.id);
        }
        SavedAction::Run { id } => {
            if let SearchOutcome::Completed { result_count, total_count } = agent.search.run_saved(id).await? {
                let state = agent.search.state().await;
                let renderer = agent.results_renderer();
                let view = renderer.view(state.query_text().unwrap_or_default(), &state.results, state.total_count);
                println!("{}", render_table(&view, renderer.selection(), agent.preferences()?.results_layout));
                info!("Saved search returned {} of {} result(s)", result_count, total_count);
            }
        }
        SavedAction::Remove { id } => {
            if agent.search.remove_saved(id)? {
                println!("✓ Removed {}", id);
            } else {
                eprintln!("Error: no saved search {}", id);
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

async fn run_records(agent: &Agent, action: RecordsAction) -> anyhow::Result<()> {
    let mut manager = agent.data_manager();

    match action {
        RecordsAction::List { page, category } => {
            manager.set_category(category);
            manager.load_page(page).await?;
            let state = manager.state();

            if state.records.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            println!("{:<38} {:<32} {:<14} {:<20}", "ID", "Title", "Category", "Updated");
            println!("{:-<106}", "");
            for record in &state.records {
                println!(
                    "{:<38} {:<32} {:<14} {:<20}",
                    record.id,
                    record.title,
                    record.category.as_deref().unwrap_or("-"),
                    record.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            println!(
                "\nPage {} of {} ({} record(s))",
                state.current_page(),
                state.total_pages(),
                state.total_count
            );
        }
        RecordsAction::Show { id } => {
            let record = manager.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        RecordsAction::Create {
            title,
            description,
            content,
            tags,
            category,
        } => {
            let record = manager
                .create(RecordForm {
                    title,
                    description,
                    content,
                    tags,
                    category,
                })
                .await?;
            println!("✓ Created {} ({})", record.title, record.id);
        }
        RecordsAction::Update {
            id,
            title,
            description,
            content,
            tags,
            category,
        } => {
            let patch = RecordUpdate {
                title,
                description,
                content: content
                    .as_deref()
                    .map(data_agent::data::parse_content)
                    .transpose()?,
                tags: (!tags.is_empty()).then_some(tags),
                category,
                ..RecordUpdate::default()
            };
            let record = manager.update(&id, patch).await?;
            println!("✓ Updated {} ({})", record.title, record.id);
        }
        RecordsAction::Delete { id, yes } => {
            let outcome = manager.delete(&id, |id| yes || confirm(&format!("Delete record {}?", id))).await?;
            match outcome {
                DeleteOutcome::Deleted => println!("✓ Deleted {}", id),
                DeleteOutcome::Cancelled => println!("Cancelled."),
            }
        }
        RecordsAction::Import { path, format, mappings } => {
            let format = format.as_deref().map(str::parse::<ImportFormat>).transpose()?;
            let mapping = parse_mappings(&mappings)?;
            let report = manager
                .import(&path, format, (!mapping.is_empty()).then_some(&mapping))
                .await?;
            println!(
                "✓ Imported {} record(s) from {} ({} rejected)",
                report.processed_count,
                path.display(),
                report.error_count
            );
            for error in &report.errors {
                println!("  ✗ {}", error);
            }
            if let Some(warning) = &manager.state().error {
                eprintln!("⚠ {}", warning);
            }
        }
        RecordsAction::Validate { record } => {
            let record = data_agent::data::parse_content(&record)?;
            let report = manager.validate(&record).await?;
            let mark = if report.is_valid { "✓ Valid" } else { "✗ Invalid" };
            println!("{}", mark);
            for (label, items) in [
                ("error", &report.errors),
                ("warning", &report.warnings),
                ("suggestion", &report.suggestions),
            ] {
                for item in items {
                    println!("  {}: {}", label, item);
                }
            }
            if !report.is_valid {
                std::process::exit(1);
            }
        }
        RecordsAction::Bulk { operation, file, filters } => {
            let records = match file {
                Some(path) => {
                    let text = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    serde_json::from_str(&text).context("Bulk file must hold a JSON array of records")?
                }
                None => Vec::new(),
            };
            let filters = filters
                .as_deref()
                .map(data_agent::data::parse_content)
                .transpose()?;
            let operation = match operation {
                BulkArg::Insert => BulkOperationKind::Insert,
                BulkArg::Update => BulkOperationKind::Update,
                BulkArg::Delete => BulkOperationKind::Delete,
            };
            if operation == BulkOperationKind::Delete
                && !confirm("Apply a bulk delete to every matching record?")
            {
                println!("Cancelled.");
                return Ok(());
            }

            let report = manager
                .bulk(BulkOperation {
                    operation,
                    records,
                    filters,
                })
                .await?;
            println!(
                "✓ {} record(s) processed, {} failed",
                report.processed_count, report.error_count
            );
        }
        RecordsAction::Stats => {
            let stats = manager.stats().await?;
            println!("Records:       {} ({} active)", stats.total_records, stats.active_records);
            println!("Created today: {}", stats.created_today);
            println!("Updated today: {}", stats.updated_today);
            if !stats.categories.is_empty() {
                println!("\nCategories:");
                for (category, count) in &stats.categories {
                    println!("  {:<20} {}", category, count);
                }
            }
        }
    }

    Ok(())
}

/// `Source=field` pairs into an import column mapping
fn parse_mappings(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((source, field)) if !source.trim().is_empty() && !field.trim().is_empty() => {
                Ok((source.trim().to_string(), field.trim().to_string()))
            }
            _ => bail!("Invalid mapping '{}', expected Source=field", pair),
        })
        .collect()
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn chat_turn(agent: &Agent, message: &str) -> anyhow::Result<()> {
    if let ChatOutcome::Answered(reply) = agent.chat.submit(message).await? {
        print_reply(&reply);
    }
    Ok(())
}

async fn chat_repl(agent: &Agent) -> anyhow::Result<()> {
    println!("💬 Ask about your data. /clear resets the conversation, /quit exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                agent.chat.clear().await;
                println!("Conversation cleared.");
            }
            text => chat_turn(agent, text).await?,
        }
    }

    Ok(())
}

fn print_reply(reply: &ChatMessage) {
    if reply.is_error {
        println!("✗ {}", reply.content);
        return;
    }

    println!("{}", reply.content);
    if let Some(results) = reply.search_results.as_ref().filter(|r| !r.is_empty()) {
        println!("\nBased on:");
        for result in results {
            println!("  • {} ({:.2})", result.title, result.score);
        }
    }
    if let Some(metadata) = &reply.metadata {
        let searched = metadata
            .searched_for
            .as_deref()
            .map(|q| format!(", searched for \"{}\"", q))
            .unwrap_or_default();
        println!("({} ms{})", metadata.latency_ms, searched);
    }
}

async fn run_insights(agent: &Agent, watch: bool) -> anyhow::Result<()> {
    if !watch {
        if let RefreshOutcome::Refreshed { error } = agent.insights.refresh(RefreshTrigger::Forced).await {
            if let Some(snapshot) = agent.insights.state().await.snapshot {
                print_snapshot(&snapshot);
            }
            if let Some(error) = error {
                eprintln!("⚠ Some insights are unavailable: {}", error);
            }
        }
        return Ok(());
    }

    let mut events = agent.bus.subscribe();
    let cancel = CancellationToken::new();
    let refresher = agent
        .insights
        .spawn_auto_refresh(agent.config.refresh_interval(), cancel.clone());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(AgentEvent::InsightsRefreshed { error }) => {
                    if let Some(snapshot) = agent.insights.state().await.snapshot {
                        print_snapshot(&snapshot);
                    }
                    if let Some(error) = error {
                        eprintln!("⚠ Some insights are unavailable: {}", error);
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => warn!("Missed {} event(s)", n),
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    cancel.cancel();
    refresher.await?;
    Ok(())
}

fn print_snapshot(snapshot: &InsightsSnapshot) {
    println!("\n📊 Insights ({})", snapshot.generated_at.format("%H:%M:%S"));
    if let Some(body) = &snapshot.body {
        if !body.summary.is_empty() {
            println!("{}", body.summary);
        }
        for (title, items) in [
            ("Key patterns", &body.key_patterns),
            ("Trends", &body.trends),
            ("Anomalies", &body.anomalies),
            ("Recommendations", &body.recommendations),
        ] {
            if !items.is_empty() {
                println!("\n{}:", title);
                for item in items {
                    println!("  • {}", item);
                }
            }
        }
    }
    if !snapshot.categories.is_empty() {
        println!("\nCategories:");
        for (category, count) in &snapshot.categories {
            println!("  {:<20} {}", category, count);
        }
    }
    if !snapshot.time_buckets.is_empty() {
        println!("\nTimeline:");
        for (bucket, count) in &snapshot.time_buckets {
            println!("  {:<20} {}", bucket, count);
        }
    }
    if let Some(sentiment) = &snapshot.sentiment {
        println!(
            "\nSentiment: {} (+{:.2} / ={:.2} / -{:.2})",
            sentiment.overall.as_deref().unwrap_or("n/a"),
            sentiment.positive.unwrap_or_default(),
            sentiment.neutral.unwrap_or_default(),
            sentiment.negative.unwrap_or_default()
        );
    }
}

async fn run_watch(agent: &Agent, search: Option<String>, chat: Option<String>) -> anyhow::Result<()> {
    let mut events = agent.bus.subscribe();
    let mut push = agent.connect_push().await?;

    if let Some(query) = search {
        push.send_search(&query).await?;
    }
    if let Some(message) = chat {
        push.send_chat(&message).await?;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(AgentEvent::Push(message)) => println!("{}", serde_json::to_string(&message)?),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => warn!("Missed {} frame(s)", n),
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
        if !push.is_open() {
            info!("Push channel ended");
            break;
        }
    }

    push.close().await?;
    Ok(())
}
