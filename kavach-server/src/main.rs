//! kavach-server: CLI + HTTP surface for the KAVACH log backend.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};

use kavach_core::hexio::{
    read_frames, MARKER_FAULT, MARKER_FAULT_GPRS, MARKER_HEALTH_ONBOARD, MARKER_HEALTH_ONBOARD_GPRS,
    MARKER_HEALTH_STATION, MARKER_INTERLOCKING_EVENT, MARKER_INTERLOCKING_PERIODIC, MARKER_POSITION,
    MARKER_STATIONARY,
};
use kavach_core::relays::RelayTable;
use kavach_core::types::{DataSource, Sof};
use kavach_core::{fault, health, interlocking, pos, record, stationary};

mod auth;
mod config;
mod db;
mod web;

use config::Config;

#[derive(Parser)]
#[command(name = "kavach-server", version, about = "KAVACH log decoder and query server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every recognized frame in a `.bin` log file and print a
    /// per-record-type summary table.
    Decode {
        /// Path to a daily `dd-MM-yy.bin` log file.
        file: PathBuf,

        /// Print one line per decoded record instead of the summary table.
        #[arg(short, long)]
        raw: bool,
    },

    /// Start the HTTP server.
    Serve {
        #[command(flatten)]
        config: Config,
    },

    /// Show fault-CRUD database statistics.
    Stats {
        /// SQLite database path.
        #[arg(long, default_value = "data/kavach.db")]
        db_path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { file, raw } => cmd_decode(&file, raw),
        Commands::Serve { config } => cmd_serve(config),
        Commands::Stats { db_path } => cmd_stats(&db_path),
    }
}

fn cmd_serve(config: Config) {
    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Error starting async runtime: {e}");
        std::process::exit(1);
    });
    rt.block_on(web::serve(config.log_dir, config.db_path, config.port));
}

fn cmd_stats(db_path: &str) {
    let database = db::Database::open(db_path).unwrap_or_else(|e| {
        eprintln!("Error opening database {db_path}: {e}");
        std::process::exit(1);
    });

    let far_past = chrono::NaiveDateTime::parse_from_str("2000-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .to_string();
    let far_future = chrono::NaiveDateTime::parse_from_str("2100-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .to_string();
    let count = database.count_faults(&far_past, &far_future).unwrap_or(0);

    println!();
    println!("Database: {db_path}");
    println!();
    println!("  Faults: {count}");
    println!();
}

fn cmd_decode(file: &PathBuf, raw: bool) {
    let relays = RelayTable::builtin_default();
    let mut counts: HashMap<&'static str, u64> = HashMap::new();
    let mut errors: u64 = 0;

    let markers: &[&str] = &[
        MARKER_POSITION,
        MARKER_STATIONARY,
        MARKER_INTERLOCKING_PERIODIC,
        MARKER_INTERLOCKING_EVENT,
        MARKER_HEALTH_STATION,
        MARKER_HEALTH_ONBOARD,
        MARKER_HEALTH_ONBOARD_GPRS,
        MARKER_FAULT,
        MARKER_FAULT_GPRS,
    ];
    let frames = read_frames(file, markers);

    for frame in frames {
        if frame.len() < 3 {
            continue;
        }
        let sof = match Sof::from_bytes([frame[0], frame[1]]) {
            Some(s) => s,
            None => continue,
        };
        let packet_type = frame[2];

        let labeled: Option<(&'static str, Vec<record::Record>)> = match packet_type {
            0x12 => pos::decode(&frame).ok().map(|p| {
                let rec = match p {
                    pos::PosPacket::Regular(p) => record::from_pos_regular(&p, DataSource::Bin, sof),
                    pos::PosPacket::AccessRequest(p) => record::from_pos_access(&p, DataSource::Bin, sof),
                };
                ("loco-movement", vec![rec])
            }),
            0x11 => stationary::decode(&frame).ok().map(|p| {
                let rec = match p {
                    stationary::StaPacket::Regular(p) => record::from_sta_regular(&p, DataSource::Bin, sof),
                    stationary::StaPacket::Access(p) => record::from_sta_access(&p, DataSource::Bin, sof),
                    stationary::StaPacket::Emergency(p) => {
                        record::from_sta_emergency(&p, DataSource::Bin, sof)
                    }
                };
                ("stationary-kavach", vec![rec])
            }),
            0x15 => interlocking::decode_periodic(&frame, &relays)
                .ok()
                .map(|p| ("interlocking-periodic", vec![record::from_periodic(&p, DataSource::Bin, sof)])),
            0x16 => interlocking::decode_event(&frame, &relays)
                .ok()
                .map(|p| ("interlocking-event", vec![record::from_event(&p, DataSource::Bin, sof)])),
            0x17 => health::decode(&frame, health::HealthFamily::Stationary)
                .ok()
                .map(|p| ("health-stationary", vec![record::from_health(&p, DataSource::Bin, sof, 0x17)])),
            0x18 => health::decode(&frame, health::HealthFamily::Onboard)
                .ok()
                .map(|p| ("health-onboard", vec![record::from_health(&p, DataSource::Bin, sof, 0x18)])),
            0x19 => fault::decode(&frame)
                .ok()
                .map(|p| ("fault", record::from_fault(&p, DataSource::Bin, sof))),
            _ => None,
        };

        match labeled {
            Some((kind, records)) => {
                *counts.entry(kind).or_insert(0) += 1;
                if raw {
                    for r in &records {
                        println!("{}", serde_json::to_string(r).unwrap_or_default());
                    }
                }
            }
            None => errors += 1,
        }
    }

    if !raw {
        print_summary(&counts, errors);
    }
}

fn print_summary(counts: &HashMap<&'static str, u64>, errors: u64) {
    println!();
    println!("File decoded. {errors} frame(s) failed to decode.");
    println!();

    if counts.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Record type", "Count"]);

    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by_key(|(kind, _)| *kind);

    for (kind, count) in sorted {
        table.add_row(vec![Cell::new(kind), Cell::new(count)]);
    }

    println!("{table}");
}
