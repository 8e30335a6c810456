//! peershare daemon: entry point for running a peershare node.

use clap::Parser;
use peershare_network::PortScanDiscovery;
use peershare_node::{
    init_logging, Collaborators, LogFormat, NodeConfig, PeerNode, SystemClock,
};
use peershare_nullables::{MemoryBlobStore, MemoryKeyStore, NullEncryptor, NullSigner};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "peershare-daemon", about = "peershare P2P file-sharing node")]
struct Cli {
    /// Node identifier. Defaults to "node-<port>".
    #[arg(long, env = "PEERSHARE_ID")]
    id: Option<String>,

    /// Host to bind and advertise.
    #[arg(long, env = "PEERSHARE_HOST")]
    host: Option<String>,

    /// Port to listen on for peer connections.
    #[arg(long, env = "PEERSHARE_PORT")]
    port: Option<u16>,

    /// First port probed by discovery.
    #[arg(long, env = "PEERSHARE_SCAN_START")]
    scan_start: Option<u16>,

    /// Last port probed by discovery (inclusive).
    #[arg(long, env = "PEERSHARE_SCAN_END")]
    scan_end: Option<u16>,

    /// Seconds between election/rotation cycles.
    #[arg(long, env = "PEERSHARE_TICK_SECS")]
    tick_secs: Option<u64>,

    /// Efficiency score in [0,1]. Randomly seeded when unset.
    #[arg(long, env = "PEERSHARE_EFFICIENCY")]
    efficiency: Option<f64>,

    /// Reputation score in [0,1]. Randomly seeded when unset.
    #[arg(long, env = "PEERSHARE_REPUTATION")]
    reputation: Option<f64>,

    /// Directory for encrypted file staging.
    #[arg(long, env = "PEERSHARE_FILES_DIR")]
    files_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "PEERSHARE_LOG_FORMAT")]
    log_format: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "PEERSHARE_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn build_config(cli: Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match cli.config {
        Some(ref path) => {
            let path = path.to_string_lossy();
            let cfg = NodeConfig::from_toml_file(&path)?;
            tracing::info!("loaded config from {path}");
            cfg
        }
        None => NodeConfig::default(),
    };

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(start) = cli.scan_start {
        config.scan_port_start = start;
    }
    if let Some(end) = cli.scan_end {
        config.scan_port_end = end;
    }
    if let Some(tick) = cli.tick_secs {
        config.tick_secs = tick;
    }
    if let Some(eff) = cli.efficiency {
        config.efficiency_score = Some(eff);
    }
    if let Some(rep) = cli.reputation {
        config.reputation_score = Some(rep);
    }
    if let Some(dir) = cli.files_dir {
        config.files_dir = dir;
    }
    config.node_id = cli.id.unwrap_or_else(|| format!("node-{}", config.port));
    config.log_format = cli.log_format;
    config.log_level = cli.log_level;

    // Scores are advertised to peers; seed unset ones randomly so a fresh
    // network still produces a meaningful ranking.
    let mut rng = rand::thread_rng();
    config
        .efficiency_score
        .get_or_insert_with(|| rng.gen_range(0.0..=1.0));
    config
        .reputation_score
        .get_or_insert_with(|| rng.gen_range(0.0..=1.0));
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LogFormat::from_config(&cli.log_format), &cli.log_level);

    let config = build_config(cli)?;
    tracing::info!(
        id = %config.node_id,
        addr = %config.addr(),
        scan = format!("{}..={}", config.scan_port_start, config.scan_port_end),
        "starting peershare node"
    );

    let discovery = PortScanDiscovery::new(
        config.host.clone(),
        config.scan_ports(),
        config.port,
        config.connect_timeout(),
    );
    let collaborators = Collaborators {
        signer: Arc::new(NullSigner),
        encryptor: Arc::new(NullEncryptor::new()),
        key_store: Arc::new(MemoryKeyStore),
        blob_store: Arc::new(MemoryBlobStore::new()),
        discovery: Arc::new(discovery),
        clock: Arc::new(SystemClock),
    };

    let mut node = PeerNode::new(config, collaborators);
    node.start().await?;

    command_loop(&node).await;

    node.stop().await;
    tracing::info!("peershare daemon exited cleanly");
    Ok(())
}

/// Read commands from stdin until `exit`, EOF or SIGINT.
async fn command_loop(node: &PeerNode) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                _ => break,
            },
        };

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("upload") => match parts.next() {
                Some(path) => match node.upload(std::path::Path::new(path)).await {
                    Ok(index) => println!("upload proposed as block {index}"),
                    Err(e) => println!("upload failed: {e}"),
                },
                None => println!("usage: upload <filePath>"),
            },
            Some("share") => match (parts.next().map(str::parse::<u64>), parts.next()) {
                (Some(Ok(index)), Some(receiver)) => match node.share(index, receiver).await {
                    Ok(new_index) => println!("share proposed as block {new_index}"),
                    Err(e) => println!("share failed: {e}"),
                },
                _ => println!("usage: share <blockIndex> <receiverId>"),
            },
            Some("status") => {
                let state = node.context().state.lock().await;
                let leader = state
                    .current_leader
                    .as_ref()
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "none".into());
                println!(
                    "leader: {leader} | leaders: {} | peers: {} | membership blocks: {} | transaction blocks: {}",
                    state.leaders.len(),
                    state.registry.len(),
                    state.membership_chain.len(),
                    state.transaction_chain.len(),
                );
            }
            Some("help") => print_help(),
            Some("exit") | Some("quit") => break,
            Some(other) => println!("unknown command: {other} (try 'help')"),
            None => {}
        }
    }
}

fn print_help() {
    println!("commands:");
    println!("  upload <filePath>              encrypt, store and propose a file upload");
    println!("  share <blockIndex> <receiverId> share an uploaded file with a peer");
    println!("  status                         current leader, peers and chain lengths");
    println!("  help                           this help");
    println!("  exit                           stop the node");
}
