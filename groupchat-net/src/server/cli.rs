use clap::Parser;

/// Group chat server: hosts the session table and drives the key-exchange
/// coordinator that every connected participant takes part in.
#[derive(Debug, Parser)]
#[command(name = "server", version, about)]
pub struct Args {
    /// TCP port to listen on.
    #[arg(default_value_t = 8080)]
    pub port: u16,

    /// Address to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Minimum tracing level to emit (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
