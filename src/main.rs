//! CLI entry point. Argument parsing here is deliberately minimal — full CLI
//! argument parsing is an external collaborator per spec §1 — just enough
//! `std::env::args()` handling to drive the library end to end, mirroring
//! `original_source/src/jmraidstatus.c`'s option surface.

mod array;
mod command;
mod crc;
mod error;
mod frame;
mod hardware;
mod mailbox;
mod models;
mod platform;
mod scrambler;
mod smart;
mod utils;

use std::process::ExitCode;

use error::MailboxError;
use hardware::ControllerIdentity;
use models::{ArraySnapshot, DiskRecord, DiskStatus, ThresholdConfig};
use utils::log::{init_tracing, Verbosity};

const DEFAULT_LBA: u32 = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Summary,
    Full,
    Json,
}

struct Options {
    device_path: String,
    lba: u32,
    expected_disks: Option<u32>,
    disk: Option<u8>,
    config_path: Option<String>,
    output: OutputMode,
    quiet: bool,
    verbose: bool,
    force: bool,
}

fn print_usage() {
    eprintln!(
        "usage: jmraid-status [options] <device>\n\n\
         options:\n\
         \x20\x20--sector <lba>       mailbox sector (default {DEFAULT_LBA})\n\
         \x20\x20--array-size <n>     expected number of disks (1..=5)\n\
         \x20\x20--disk <n>           query a single slot (0..4)\n\
         \x20\x20--config <path>      threshold configuration file (JSON)\n\
         \x20\x20--full               per-attribute output\n\
         \x20\x20--json               machine-readable JSON output\n\
         \x20\x20--quiet              suppress all stderr except the exit code\n\
         \x20\x20--verbose            narrate each slot probe\n\
         \x20\x20--force              skip controller identification\n\
         \x20\x20-h, --help           show this message"
    );
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let _argv0 = args.next();
    let mut device_path = None;
    let mut lba = DEFAULT_LBA;
    let mut expected_disks = None;
    let mut disk = None;
    let mut config_path = None;
    let mut output = OutputMode::Summary;
    let mut quiet = false;
    let mut verbose = false;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "--sector" => {
                let value = args.next().ok_or("--sector requires a value")?;
                lba = value.parse().map_err(|_| "invalid --sector value".to_string())?;
            }
            "--array-size" => {
                let value = args.next().ok_or("--array-size requires a value")?;
                let n: u32 = value.parse().map_err(|_| "invalid --array-size value".to_string())?;
                if !(1..=5).contains(&n) {
                    return Err("--array-size must be between 1 and 5".to_string());
                }
                expected_disks = Some(n);
            }
            "--disk" => {
                let value = args.next().ok_or("--disk requires a value")?;
                let n: u8 = value.parse().map_err(|_| "invalid --disk value".to_string())?;
                if n > 4 {
                    return Err("--disk must be between 0 and 4".to_string());
                }
                disk = Some(n);
            }
            "--config" => {
                config_path = Some(args.next().ok_or("--config requires a value")?);
            }
            "--full" => output = OutputMode::Full,
            "--json" => output = OutputMode::Json,
            "--quiet" => quiet = true,
            "--verbose" => verbose = true,
            "--force" => force = true,
            other if !other.starts_with('-') && device_path.is_none() => {
                device_path = Some(other.to_string());
            }
            other => return Err(format!("unrecognized argument: {other}")),
        }
    }

    Ok(Options {
        device_path: device_path.ok_or("missing required <device> argument")?,
        lba,
        expected_disks,
        disk,
        config_path,
        output,
        quiet,
        verbose,
        force,
    })
}

fn read_config(path: &str) -> anyhow::Result<ThresholdConfig> {
    use anyhow::Context;
    let text = std::fs::read_to_string(path).with_context(|| format!("reading threshold config at {path}"))?;
    let config = serde_json::from_str(&text).with_context(|| format!("parsing threshold config at {path}"))?;
    Ok(config)
}

fn load_config(path: &Option<String>) -> ThresholdConfig {
    let Some(path) = path else {
        return ThresholdConfig::default();
    };
    read_config(path).unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{e:#}"), "failed to load threshold config, using defaults");
        ThresholdConfig::default()
    })
}

fn print_summary(snapshot: &ArraySnapshot) {
    println!(
        "bitmask=0x{:02X} present={} expected={:?} degraded={} oversized={}",
        snapshot.bitmask, snapshot.present_disks, snapshot.expected_disks, snapshot.degraded, snapshot.oversized
    );
    for disk in &snapshot.disks {
        if !disk.present {
            println!("  slot {}: empty", disk.slot);
            continue;
        }
        println!(
            "  slot {}: {} (serial {}, fw {}) size={:?}MB status={:?}",
            disk.slot, disk.model, disk.serial, disk.firmware, disk.size_mb, disk.overall_status
        );
    }
}

fn print_full(snapshot: &ArraySnapshot) {
    print_summary(snapshot);
    for disk in &snapshot.disks {
        if !disk.present {
            continue;
        }
        println!("  -- attributes for slot {} --", disk.slot);
        for attr in &disk.attributes {
            println!(
                "    id=0x{:02X} {:<28} current={:<3} worst={:<3} threshold={:<3} raw={:<12} status={:?}",
                attr.id, attr.name, attr.current, attr.worst, attr.threshold, attr.raw, attr.status
            );
        }
    }
}

fn print_single(disk: &DiskRecord, output: OutputMode) {
    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(disk).unwrap_or_default());
        }
        _ => {
            if !disk.present {
                println!("slot {}: empty", disk.slot);
                return;
            }
            println!(
                "slot {}: {} (serial {}, fw {}) size={:?}MB status={:?}",
                disk.slot, disk.model, disk.serial, disk.firmware, disk.size_mb, disk.overall_status
            );
            if output == OutputMode::Full {
                for attr in &disk.attributes {
                    println!(
                        "  id=0x{:02X} {:<28} current={:<3} worst={:<3} threshold={:<3} raw={:<12} status={:?}",
                        attr.id, attr.name, attr.current, attr.worst, attr.threshold, attr.raw, attr.status
                    );
                }
            }
        }
    }
}

fn exit_code_for_snapshot(snapshot: &ArraySnapshot) -> ExitCode {
    match snapshot.array_status {
        DiskStatus::Passed if !snapshot.degraded => ExitCode::from(0),
        _ => ExitCode::from(1),
    }
}

fn exit_code_for_disk(disk: &DiskRecord) -> ExitCode {
    match disk.overall_status {
        DiskStatus::Passed => ExitCode::from(0),
        DiskStatus::Failed => ExitCode::from(1),
        DiskStatus::Error => ExitCode::from(3),
    }
}

fn map_mailbox_error(err: &MailboxError) -> ExitCode {
    tracing::error!(error = %err, "mailbox operation failed");
    ExitCode::from(3)
}

fn main() -> ExitCode {
    let opts = match parse_args(std::env::args()) {
        Ok(opts) => opts,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            return ExitCode::from(3);
        }
    };

    let verbosity = if opts.quiet {
        Verbosity::Quiet
    } else if opts.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    init_tracing(verbosity);

    if !opts.force {
        let detector = hardware::NullControllerDetector;
        let info = detector.identify(&opts.device_path);
        tracing::info!(found = info.found, description = %info.description, "controller identification");
    }

    let config = load_config(&opts.config_path);

    let mut session = match mailbox::open_mailbox(&opts.device_path, opts.lba) {
        Ok(session) => session,
        Err(e) => return map_mailbox_error(&e),
    };

    if let Err(e) = mailbox::send_wakeup(&mut session) {
        return map_mailbox_error(&e);
    }

    let code = if let Some(slot) = opts.disk {
        let mut coordinator = array::ArrayCoordinator::new(&mut session, config);
        match coordinator.probe_one(slot) {
            Ok(disk) => {
                print_single(&disk, opts.output);
                exit_code_for_disk(&disk)
            }
            Err(e) => map_mailbox_error(&e),
        }
    } else {
        let mut coordinator = array::ArrayCoordinator::new(&mut session, config);
        let snapshot = coordinator.sweep(opts.expected_disks);

        match opts.output {
            OutputMode::Json => println!("{}", serde_json::to_string_pretty(&snapshot).unwrap_or_default()),
            OutputMode::Full => print_full(&snapshot),
            OutputMode::Summary => print_summary(&snapshot),
        }

        if snapshot.degraded && opts.output != OutputMode::Json && !opts.quiet {
            eprintln!(
                "*** DEGRADED ARRAY: expected {:?}, found {} disk(s) present (bitmask 0x{:02X}) ***",
                snapshot.expected_disks, snapshot.present_disks, snapshot.bitmask
            );
        }

        exit_code_for_snapshot(&snapshot)
    };

    if let Err(e) = mailbox::close_mailbox(&mut session) {
        tracing::warn!(error = %e, "failed to close mailbox cleanly");
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_path_and_defaults() {
        let args = vec!["jmraid-status".to_string(), "/dev/sg2".to_string()];
        let opts = parse_args(args.into_iter()).unwrap();
        assert_eq!(opts.device_path, "/dev/sg2");
        assert_eq!(opts.lba, DEFAULT_LBA);
        assert_eq!(opts.expected_disks, None);
        assert_eq!(opts.output, OutputMode::Summary);
    }

    #[test]
    fn parses_full_option_set() {
        let args = [
            "jmraid-status",
            "--sector",
            "64",
            "--array-size",
            "4",
            "--full",
            "--verbose",
            "/dev/sg0",
        ]
        .into_iter()
        .map(String::from);
        let opts = parse_args(args).unwrap();
        assert_eq!(opts.lba, 64);
        assert_eq!(opts.expected_disks, Some(4));
        assert_eq!(opts.output, OutputMode::Full);
        assert!(opts.verbose);
        assert_eq!(opts.device_path, "/dev/sg0");
    }

    #[test]
    fn rejects_missing_device() {
        let args = vec!["jmraid-status".to_string(), "--full".to_string()];
        assert!(parse_args(args.into_iter()).is_err());
    }

    #[test]
    fn rejects_array_size_out_of_range() {
        let args = ["jmraid-status", "--array-size", "9", "/dev/sg0"]
            .into_iter()
            .map(String::from);
        assert!(parse_args(args).is_err());
    }
}
