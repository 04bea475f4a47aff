mod server;

use clap::Args;
use serde::{Deserialize, Serialize};

pub use server::run;

#[derive(Serialize, Deserialize, Clone, Debug, Args)]
pub struct Config {
    /// The interface to bind the service to.
    #[arg(short, long, default_value_t = String::from("127.0.0.1"))]
    pub ip: String,

    /// The port to use for the service.
    #[arg(short, long, default_value_t = 502)]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip: String::from("127.0.0.1"),
            port: 502,
        }
    }
}
