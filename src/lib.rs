use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use json::{stringify, SelectionError, Selector, Value};
use proxy::{AppState, Target, Upstream, COINGECKO_ADDRESS};
use tokio::net::TcpListener;
use xml::{render, ROOT_TAG};

pub mod io_helpers;
pub mod json;
pub mod proxy;
pub mod xml;

/// Serve JSON APIs as XML or plain-text values for spreadsheet URL imports
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP proxy
    Serve(ServeArgs),
    /// Fetch one CoinGecko route (or any URL) and print it as XML or a value
    Lookup(LookupArgs),
    /// Convert local JSON from FILE or stdin
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UpstreamArgs {
    /// Base URL that CoinGecko routes are resolved against
    #[arg(long, env = "JSON_SHEETS_COINGECKO_URL", default_value = COINGECKO_ADDRESS)]
    pub coingecko_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "JSON_SHEETS_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

impl UpstreamArgs {
    pub fn build(&self) -> Result<Upstream, proxy::UpstreamError> {
        Upstream::new(&self.coingecko_url, Duration::from_secs(self.timeout))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "JSON_SHEETS_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub upstream: UpstreamArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Path selecting part of the JSON, e.g. `bitcoin.usd`, `[1].email` or `$..price`
    #[arg(short, long)]
    pub jsonpath: Option<String>,

    /// Print the selected scalar as plain text instead of XML
    #[arg(long)]
    pub value: bool,

    /// Root element name for XML output
    #[arg(long, default_value = ROOT_TAG)]
    pub root: String,
}

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    /// CoinGecko route such as `simple/price?ids=bitcoin&vs_currencies=usd`
    pub target: String,

    /// Treat TARGET as a full URL rather than a CoinGecko route
    #[arg(long)]
    pub any: bool,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub upstream: UpstreamArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// JSON file, gzip-compressed if it ends in `.gz`; stdin when omitted
    pub file_path: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Output choices resolved once from the command line
#[derive(Debug)]
pub struct Settings {
    pub selector: Selector,
    pub value: bool,
    pub root: String,
}

impl Settings {
    pub fn init(args: &OutputArgs) -> Result<Self, SelectionError> {
        let selector = Selector::parse(args.jsonpath.as_deref().unwrap_or_default())?;
        let root = if args.root.is_empty() {
            ROOT_TAG.to_owned()
        } else {
            args.root.to_owned()
        };
        Ok(Settings {
            selector,
            value: args.value,
            root,
        })
    }

    /// Selects from `json` and formats the result as XML or a single value.
    ///
    /// XML output renders every match of a `$` query; a value needs exactly one.
    pub fn output(&self, json: &Value) -> anyhow::Result<String> {
        if self.value {
            Ok(stringify(self.selector.select(json)?)?)
        } else {
            let selected = self.selector.select_all(json)?;
            Ok(render(&selected, &self.root).to_document()?)
        }
    }
}

pub async fn run(args: Cli) -> anyhow::Result<()> {
    match args.command {
        Command::Serve(args) => serve(args).await,
        Command::Lookup(args) => lookup(args).await,
        Command::Convert(args) => convert(args),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let upstream = args.upstream.build()?;
    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    log::info!(
        "listening on {} (coingecko base {})",
        listener.local_addr()?,
        args.upstream.coingecko_url
    );
    proxy::serve(listener, AppState::new(upstream)).await?;
    Ok(())
}

async fn lookup(args: LookupArgs) -> anyhow::Result<()> {
    let settings = Settings::init(&args.output)?;
    let upstream = args.upstream.build()?;
    let target = if args.any {
        Target::Any(args.target)
    } else {
        Target::CoinGecko(args.target)
    };
    let json = upstream
        .fetch_json(&target, &[])
        .await
        .with_context(|| format!("lookup of {target} failed"))?;
    println!("{}", settings.output(&json)?);
    Ok(())
}

fn convert(args: ConvertArgs) -> anyhow::Result<()> {
    let settings = Settings::init(&args.output)?;
    let json = io_helpers::load_json(args.file_path.as_deref())?;
    println!("{}", settings.output(&json)?);
    Ok(())
}
