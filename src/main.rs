use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use unfold::clock::{Clock, ClockTime, SystemClock};
use unfold::config::Config;
use unfold::icons::IconCatalog;
use unfold::model::{EventId, EventUpdate, NewEvent, TemplateId};
use unfold::notify::ChangeHub;
use unfold::persistence::FileBackend;
use unfold::store::EventStore;
use unfold::ticker::{Ticker, compute_frame};
use unfold::{backup, render};

#[derive(Parser)]
#[command(name = "unfold", about = "A folded day timeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print today's timeline.
    Show,
    /// Add an event.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        start: ClockTime,
        #[arg(long)]
        end: ClockTime,
        #[arg(long, default_value = "star")]
        icon: String,
        #[arg(long, default_value = "var(--accent-blue)")]
        color: String,
        /// Use this id instead of a generated one.
        #[arg(long)]
        id: Option<String>,
    },
    /// Change fields of an existing event.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start: Option<ClockTime>,
        #[arg(long)]
        end: Option<ClockTime>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        done: Option<bool>,
    },
    /// Remove an event.
    Delete { id: String },
    /// Mark an event done / not done.
    Toggle { id: String },
    /// Remove every event.
    Clear,
    /// Write all events to a JSON backup.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all events with the contents of a JSON backup.
    Import { path: PathBuf },
    /// Manage daily templates.
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Keep the timeline on screen, refreshed by the clock, until interrupted.
    Watch,
}

#[derive(Subcommand)]
enum TemplateCommand {
    List,
    Save { name: String },
    Apply { id: String },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    unfold::observability::init(config.metrics_port)?;

    let backend = Arc::new(FileBackend::open(&config.data_dir)?);
    info!("data_dir: {}", config.data_dir.display());
    let mut store = EventStore::open(backend, Arc::new(ChangeHub::new()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => print_day(&store, &config, clock.as_ref()),
        Command::Add {
            title,
            start,
            end,
            icon,
            color,
            id,
        } => {
            let id = store.add(NewEvent {
                id: id.map(EventId::from),
                title,
                start_time: start,
                end_time: end,
                icon_key: icon,
                color,
            })?;
            println!("added {id}");
            if store.has_conflict(&id) {
                println!("warning: overlaps another event");
            }
        }
        Command::Edit {
            id,
            title,
            start,
            end,
            icon,
            color,
            done,
        } => {
            let id = EventId::from(id);
            let current = store
                .get(&id)
                .ok_or_else(|| unfold::store::StoreError::NotFound(id.clone()))?;
            let mut update = EventUpdate::from(current);
            if let Some(title) = title {
                update.title = title;
            }
            if let Some(start) = start {
                update.start_time = start;
            }
            if let Some(end) = end {
                update.end_time = end;
            }
            if let Some(icon) = icon {
                update.icon_key = icon;
            }
            if let Some(color) = color {
                update.color = color;
            }
            update.is_completed = done;
            store.update(&id, update)?;
            println!("updated {id}");
        }
        Command::Delete { id } => {
            let removed = store.delete(&EventId::from(id))?;
            println!("deleted {:?}", removed.title);
        }
        Command::Toggle { id } => {
            let done = store.toggle_completion(&EventId::from(id))?;
            println!("{}", if done { "done" } else { "not done" });
        }
        Command::Clear => {
            store.clear();
            println!("cleared");
        }
        Command::Export { out } => {
            let path = out.unwrap_or_else(|| {
                PathBuf::from(backup::default_file_name(chrono::Local::now().date_naive()))
            });
            backup::export_to_file(&path, store.events())?;
            println!("exported {} events to {}", store.len(), path.display());
        }
        Command::Import { path } => match backup::import_file(&mut store, &path) {
            Ok(count) => println!("imported {count} events"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        Command::Template(cmd) => run_template(&mut store, cmd)?,
        Command::Watch => watch(store, &config, clock).await?,
    }
    Ok(())
}

fn run_template(store: &mut EventStore, cmd: TemplateCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        TemplateCommand::List => {
            for tpl in store.templates() {
                println!("{}  {} ({} events)", tpl.id, tpl.name, tpl.events.len());
            }
        }
        TemplateCommand::Save { name } => {
            let id = store.save_as_template(&name)?;
            println!("saved template {id}");
        }
        TemplateCommand::Apply { id } => {
            let count = store.apply_template(&TemplateId::from(id))?;
            println!("applied template: {count} events");
        }
        TemplateCommand::Delete { id } => {
            let removed = store.delete_template(&TemplateId::from(id))?;
            println!("deleted template {:?}", removed.name);
        }
    }
    Ok(())
}

fn print_day(store: &EventStore, config: &Config, clock: &dyn Clock) {
    let frame = compute_frame(store, config.layout, clock.now());
    print!("{}", render::render_day(store.events(), &frame, &IconCatalog));
}

async fn watch(
    store: EventStore,
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(RwLock::new(store));
    let ticker = Ticker::spawn(store.clone(), clock, config.layout, config.tick).await;
    let mut frames = ticker.frames();
    info!("watching, tick every {:?}", config.tick);

    // Stop on SIGTERM/ctrl-c
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!("no SIGTERM handler: {e}");
                    ctrl_c.await.ok();
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    let mut last = None;
    loop {
        let frame = frames.borrow_and_update().clone();
        // Redraw only when something visible changed.
        if last.as_ref() != Some(&frame) {
            let guard = store.read().await;
            print!("\x1b[2J\x1b[H{}", render::render_day(guard.events(), &frame, &IconCatalog));
            last = Some(frame);
        }
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    ticker.shutdown().await;
    Ok(())
}
