use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use setpoint_bridge::{
    bridge::Bridge,
    config::BridgeConfig,
    console::{self, Action},
    setpoint::Setpoint,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Operator panel for the uart setpoint bridge
#[derive(Parser)]
#[command(name = "panel", version)]
struct PanelArgs{
    /// Toml file with bridge settings
    #[arg(short, long, default_value = "setpoint-bridge.toml")]
    config: PathBuf,
    /// Character device to talk to, overrides the config file
    #[arg(short, long)]
    device: Option<PathBuf>,
    /// Csv history written on every execute
    #[arg(long)]
    history: Option<PathBuf>,
    /// Latest state snapshot written on every execute
    #[arg(long)]
    state: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Option<PanelCmd>,
}

#[derive(Subcommand)]
enum PanelCmd{
    /// Interactive console (default)
    Console,
    /// Print connection and setpoints
    Status,
    /// Push one setpoint and exit
    Execute{
        #[arg(long)]
        target: i32,
        #[arg(long)]
        minimum: i32,
        #[arg(long)]
        maximum: i32,
    },
    /// Push free text once and exit
    Send{
        command: String,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = PanelArgs::parse();

    let mut cfg = BridgeConfig::load(&args.config)?;
    if let Some(device) = args.device{
        cfg.device = device;
    }
    if let Some(history) = args.history{
        cfg.history = history;
    }
    if let Some(state) = args.state{
        cfg.state = state;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Could not build tokio runtime")?;
    runtime.block_on(run(cfg, args.cmd.unwrap_or(PanelCmd::Console)))
}

async fn run(cfg: BridgeConfig, cmd: PanelCmd) -> Result<()> {
    info!("Panel started for {}", cfg.device.display());

    let mut builder = Bridge::configured(&cfg).await;
    if let PanelCmd::Execute{target, minimum, maximum} = &cmd{
        let sp = Setpoint::new(*target, *minimum, *maximum).context("Invalid setpoint")?;
        builder = builder.setpoint(sp);
    }
    let bridge = builder.build().await;

    let result = match cmd{
        PanelCmd::Console => interactive(&bridge).await,
        PanelCmd::Status => print_json(&bridge.status().await),
        PanelCmd::Execute{..} => print_json(&bridge.execute().await),
        PanelCmd::Send{command} => print_json(&bridge.send_custom(&command).await),
    };

    bridge.close().await;
    result
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn interactive(bridge: &Arc<Bridge>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all(format!("{}\n", console::HELP).as_bytes()).await?;

    loop{
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let line = match lines.next_line().await?{
            Some(line) => line,
            None => break,
        };
        match console::run(bridge, Action::parse(&line)).await{
            Some(text) if text.is_empty() => {}
            Some(text) => stdout.write_all(format!("{}\n", text).as_bytes()).await?,
            None => break,
        }
    }
    Ok(())
}
