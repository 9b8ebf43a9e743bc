use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "yoyaku")]
#[command(about = "LINE reservation webhook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook server (GET / and POST /callback). Requires LINE_CHANNEL_SECRET and LINE_CHANNEL_ACCESS_TOKEN.
    Serve {
        /// Config file path (default: YOYAKU_CONFIG_PATH or ./yoyaku.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from PORT env, config, or 8000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 0.0.0.0)
        #[arg(long, short, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Print the X-Line-Signature for a request body, for testing the callback with curl.
    Sign {
        /// Config file path (default: YOYAKU_CONFIG_PATH or ./yoyaku.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Body file, or "-" for stdin
        #[arg(value_name = "FILE")]
        body: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("yoyaku {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Sign { config, body }) => {
            if let Err(e) = run_sign(config, body) {
                log::error!("sign failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = yoyaku::config::load_config(config_path)?;
    log::debug!("config path: {}", path.display());
    let credentials = yoyaku::config::resolve_line_credentials(&config)?;
    if let Some(b) = bind {
        config.gateway.bind = b;
    }
    config.gateway.port = match port {
        Some(p) => p,
        None => yoyaku::config::resolve_port(&config)?,
    };
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    yoyaku::gateway::run_gateway(config, credentials).await
}

fn run_sign(config_path: Option<PathBuf>, body_path: PathBuf) -> anyhow::Result<()> {
    use anyhow::Context;

    let (config, _) = yoyaku::config::load_config(config_path)?;
    let secret = yoyaku::config::resolve_channel_secret(&config).with_context(|| {
        format!(
            "specify {} as environment variable",
            yoyaku::config::CHANNEL_SECRET_ENV
        )
    })?;
    let body = if body_path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("reading body from stdin")?;
        buf
    } else {
        std::fs::read(&body_path)
            .with_context(|| format!("reading body from {}", body_path.display()))?
    };
    println!("{}", yoyaku::channels::line::compute_signature(&secret, &body));
    Ok(())
}
