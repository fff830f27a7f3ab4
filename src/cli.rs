use clap::Parser;

use loadwire::http::TransportKind;

/// Sends requests through a loadwire transport and reports what came back.
#[derive(Debug, Parser)]
#[command(name = "loadwire", version, about)]
pub(crate) struct ProbeArgs {
    /// Config file (.toml or .json). Defaults to ./loadwire.toml or ./loadwire.json.
    #[arg(long, short = 'c', env = "LOADWIRE_CONFIG")]
    pub(crate) config: Option<String>,

    /// Target URL; overrides the config file.
    #[arg(long, short = 'u')]
    pub(crate) url: Option<String>,

    /// Number of sequential requests.
    #[arg(long, short = 'n', default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) requests: u64,

    /// `pooled` or `standard`; overrides the config file.
    #[arg(long)]
    pub(crate) transport: Option<TransportKind>,

    #[arg(long, short = 'v')]
    pub(crate) verbose: bool,

    #[arg(long)]
    pub(crate) no_color: bool,
}
