use clap::Parser;

/// Group chat client: joins the server's group and takes part in the
/// Burmester-Desmedt key exchange it drives.
#[derive(Debug, Parser)]
#[command(name = "client", version, about)]
pub struct Args {
    /// Server address to connect to.
    #[arg(default_value = "127.0.0.1")]
    pub server_ip: String,

    /// Server port to connect to.
    #[arg(default_value_t = 8080)]
    pub port: u16,

    /// Username to authenticate with. Prompted interactively if omitted.
    #[arg(long)]
    pub username: Option<String>,

    /// Minimum tracing level to emit (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
