use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mtg_assist::assist::{ActionAssistant, PanelState, PaymentPanel, PendingAction};
use mtg_assist::config::AssistConfig;
use mtg_assist::game::mana::{
    build_default_payment, build_default_payment_detail, build_payment_from_detail,
};
use mtg_assist::game::GameSnapshot;
use mtg_assist::replacement::detect_conflicts;
use mtg_assist::targeting::{HttpLegalityClient, TargetHints, TargetLegalityTracker};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mtg-assist")]
#[command(about = "Payment, replacement-conflict and target-legality assistance for MTG game snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to mtg-assist.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rules engine base URL, overriding config and environment
    #[arg(long)]
    engine_url: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the default payment and any payment errors for an action's cost
    Pay {
        /// Snapshot JSON file
        snapshot: String,

        /// Pending action JSON file (controller, source, graph, cost)
        action: String,

        /// Payment choices JSON file for hybrid/two-brid/phyrexian symbols
        #[arg(short, long)]
        detail: Option<String>,
    },

    /// List replacement effect conflicts in a snapshot
    Conflicts {
        /// Snapshot JSON file
        snapshot: String,
    },

    /// Show target candidates for an action, optionally checking them with the rules engine
    Targets {
        /// Snapshot JSON file
        snapshot: String,

        /// Pending action JSON file
        action: String,

        /// Ask the rules engine for legality of each candidate
        #[arg(long)]
        check: bool,
    },

    /// Re-validate the targets of everything on the stack
    Stack {
        /// Snapshot JSON file
        snapshot: String,
    },
}

fn load_snapshot(path: &str) -> Result<Arc<GameSnapshot>> {
    let snapshot = GameSnapshot::from_file(path)
        .with_context(|| format!("Failed to load snapshot '{}'", path))?;
    eprintln!(
        "✓ Loaded snapshot {} ({} objects, {} on stack)",
        path,
        snapshot.objects.len(),
        snapshot.stack.len()
    );
    Ok(Arc::new(snapshot))
}

fn load_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse '{}'", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AssistConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(url) = cli.engine_url {
        config.engine.base_url = url;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Pay {
            snapshot,
            action,
            detail,
        } => pay(&snapshot, &action, detail.as_deref(), cli.json),
        Commands::Conflicts { snapshot } => conflicts(&snapshot, cli.json),
        Commands::Targets {
            snapshot,
            action,
            check,
        } => targets(&config, &snapshot, &action, check, cli.json).await,
        Commands::Stack { snapshot } => stack(&config, &snapshot, cli.json).await,
    }
}

fn pay(
    snapshot_file: &str,
    action_file: &str,
    detail_file: Option<&str>,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_file)?;
    let action: PendingAction = load_json(action_file)?;
    let Some(cost) = &action.cost else {
        println!("Action {} has no mana cost.", action.source_id);
        return Ok(());
    };

    let pool = snapshot
        .player(&action.controller_id)
        .map(|p| p.mana_pool)
        .with_context(|| format!("Unknown player '{}'", action.controller_id))?;
    let detail = match detail_file {
        Some(path) => load_json(path)?,
        None => build_default_payment_detail(cost, &pool),
    };
    let resolution = build_payment_from_detail(cost, &pool, &detail);
    let payment = PaymentPanel {
        default_payment: build_default_payment(cost, &pool),
        errors: resolution.messages(),
        payment: resolution.payment,
        detail,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&payment)?);
        return Ok(());
    }

    println!("\n=== Payment for {} ===\n", action.source_id);
    println!("Default payment: {}", serde_json::to_string(&payment.default_payment)?);
    println!("Choices:         {}", serde_json::to_string(&payment.detail)?);
    println!("Payment:         {}", serde_json::to_string(&payment.payment)?);
    if payment.errors.is_empty() {
        println!("\n✓ Payment is complete");
    } else {
        println!();
        for error in &payment.errors {
            println!("  ✗ {}", error);
        }
    }
    Ok(())
}

fn conflicts(snapshot_file: &str, json: bool) -> Result<()> {
    let snapshot = load_snapshot(snapshot_file)?;
    let entries = detect_conflicts(&snapshot);
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("\n=== Replacement Conflicts ===\n");
    if entries.is_empty() {
        println!("No conflicts.");
    }
    for entry in &entries {
        println!("{}  [{}]", entry.label(), entry.key());
        for option in entry.options() {
            println!("  - {} ({})", option.description, option.effect_id);
        }
    }
    Ok(())
}

async fn targets(
    config: &AssistConfig,
    snapshot_file: &str,
    action_file: &str,
    check: bool,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_file)?;
    let action: PendingAction = load_json(action_file)?;

    if !check {
        let hints = TargetHints::derive(&action.graph);
        if json {
            println!("{}", serde_json::to_string_pretty(&hints)?);
            return Ok(());
        }
        println!("\n=== Targets for {} ===\n", action.source_id);
        for object in hints.candidate_objects(&snapshot) {
            println!("  {} ({})", object.display_name(), object.id);
        }
        for player in hints.candidate_players(&snapshot) {
            println!("  player {}", player.id);
        }
        return Ok(());
    }

    let client = HttpLegalityClient::new(&config.engine)?;
    info!(url = client.url(), "checking targets with rules engine");
    let mut assistant = ActionAssistant::new(client);
    let panel = assistant.on_snapshot(snapshot, Some(&action)).await;
    print_panel(&panel, json)
}

async fn stack(config: &AssistConfig, snapshot_file: &str, json: bool) -> Result<()> {
    let snapshot = load_snapshot(snapshot_file)?;
    let client = HttpLegalityClient::new(&config.engine)?;
    info!(url = client.url(), "re-validating stack targets");

    let mut tracker = TargetLegalityTracker::new();
    tracker.run_cycles(&snapshot, None, &client).await;

    let statuses: Vec<_> = (0..snapshot.stack.len())
        .map(|i| (i, tracker.stack_status(i)))
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("\n=== Stack ===\n");
    for (position, status) in statuses {
        let source = snapshot.stack[position]
            .source_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:2}: {:<20} {:?}", position, source, status);
        if let Some(result) = tracker.stack_result(position) {
            for issue in &result.issues {
                println!("        ✗ {}", issue);
            }
        }
    }
    Ok(())
}

fn print_panel(panel: &PanelState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(panel)?);
        return Ok(());
    }

    println!("\n=== Targets ===\n");
    for object in &panel.objects {
        println!("  {:<24} {:?}", object.name, object.status);
    }
    for player in &panel.players {
        println!("  player {:<17} {:?}", player.id.to_string(), player.status);
    }
    if !panel.conflicts.is_empty() {
        println!("\n{} replacement conflict(s) pending", panel.conflicts.len());
    }
    Ok(())
}
