mod app;
mod effects;
mod logging;
mod render;
mod settings;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use scout_engine::TransportSettings;

use crate::logging::LogDestination;
use crate::settings::SettingsStore;

/// Stream supplier offers for a part request from a PartScout search service.
#[derive(Debug, Parser)]
#[command(name = "partscout", version)]
struct Cli {
    /// Free-text request, e.g. `MS21042L3 qty 200`.
    request: Vec<String>,

    /// Information field to ask for (repeatable), e.g. `--info price --info "lead time"`.
    #[arg(short = 'i', long = "info")]
    info: Vec<String>,

    /// Service base address; overrides the saved one.
    #[arg(long, env = "PARTSCOUT_BASE")]
    base: Option<String>,

    /// Directory holding settings.ron.
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Keep running and read commands from stdin.
    #[arg(long)]
    interactive: bool,

    #[arg(long, value_enum, default_value = "file")]
    log: LogDestination,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    /// Seconds to wait for a connection to the service.
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let store = SettingsStore::new(cli.settings_dir.unwrap_or_else(SettingsStore::default_dir));
    let transport = TransportSettings {
        connect_timeout: Duration::from_secs(cli.connect_timeout),
        ..TransportSettings::default()
    };

    app::run(app::AppOptions {
        base_url: cli.base,
        request: cli.request.join(" "),
        info_fields: cli.info,
        interactive: cli.interactive,
        transport,
        store,
    })
}
