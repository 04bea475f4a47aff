mod config;
mod util;

use crate::config::AppConfig;
use crate::util::Expect;

use clap::{Parser, Subcommand};
use modbus_log::{Log, LogMsg};
use modbus_mem::DeviceMap;
use modbus_net::{rtu, tcp};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Runtime;

const MAX_LINE_LENGTH: usize = 256;
const LOG_SIZE: usize = 1024;

type SharedLog = Arc<Mutex<Log<MAX_LINE_LENGTH, LOG_SIZE>>>;

#[derive(Subcommand)]
enum Commands {
    /// Serve the device memory via Modbus TCP
    Tcp(tcp::Config),

    /// Serve the device memory via Modbus RTU
    Rtu(rtu::Config),
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the JSON or TOML configuration file describing the device memory.
    #[arg(long)]
    config: Option<String>,

    /// Switch on verbose output. Reads are logged in addition to writes.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn write_log(log: &SharedLog, msg: LogMsg) {
    log.lock().unwrap_or_else(PoisonError::into_inner).write(msg);
}

fn flush_log(log: &SharedLog) {
    let msgs = log
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take_n(LOG_SIZE);
    for msg in msgs.into_iter().flatten() {
        match msg {
            LogMsg::Err(_) => eprintln!("{}", msg),
            _ => println!("{}", msg),
        }
    }
}

/// Record every access of the device memory in the log
fn observe(map: &DeviceMap, log: &SharedLog, verbose: bool) {
    if verbose {
        let log = log.clone();
        map.on_read().register(move |_, access| {
            write_log(&log, LogMsg::info(&format!("Read {}", access)));
            Ok(())
        });
    }
    let log = log.clone();
    map.on_write().register(move |_, access| {
        write_log(&log, LogMsg::ok(&format!("Write {}", access)));
        Ok(())
    });
}

fn main() {
    let args = Args::parse();

    let app_config = args
        .config
        .map(|p| {
            AppConfig::read(&p).panic(|e| format!("Failed to read configuration file. [{}]", e))
        })
        .unwrap_or_default();

    let log: SharedLog = Arc::new(Mutex::new(Log::init()));
    let map = app_config
        .build()
        .panic(|e| format!("Failed to initialize device memory. [{}]", e));
    observe(&map, &log, args.verbose);
    let map = Arc::new(map);

    let logger = {
        let log = log.clone();
        move |s: String| write_log(&log, LogMsg::info(&s))
    };

    // Initialize tokio runtime for modbus server
    let runtime = Runtime::new().panic(|e| format!("Failed to create runtime. [{}]", e));

    runtime.block_on(async {
        let spawned = match args.command {
            Commands::Tcp(config) => tcp::run(&config, map.clone(), logger).await,
            Commands::Rtu(config) => rtu::run(&config, map.clone(), logger).await,
        };
        let mut handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                write_log(&log, LogMsg::err(&format!("Failed to start server. [{}]", e)));
                flush_log(&log);
                return;
            }
        };

        let mut interval =
            tokio::time::interval(Duration::from_millis(app_config.log_interval_ms.max(1)));
        loop {
            tokio::select! {
                result = &mut handle => {
                    let msg = match result {
                        Ok(Ok(())) => LogMsg::info("Server stopped."),
                        Ok(Err(e)) => LogMsg::err(&format!("Server failed. [{}]", e)),
                        Err(e) => LogMsg::err(&format!("Server task aborted. [{}]", e)),
                    };
                    write_log(&log, msg);
                    flush_log(&log);
                    break;
                }
                _ = interval.tick() => flush_log(&log),
            }
        }
    });
}
