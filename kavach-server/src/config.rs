//! Environment-driven configuration, read once at startup.

use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// HTTP port to bind.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory holding the daily `dd-MM-yy.bin` log files.
    #[arg(long, env = "LOG_DIR", default_value = "data/logs")]
    pub log_dir: String,

    /// SQLite database path for the fault-CRUD collaborator.
    #[arg(long, env = "DB_PATH", default_value = "data/kavach.db")]
    pub db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            log_dir: "data/logs".to_string(),
            db_path: "data/kavach.db".to_string(),
        }
    }
}
