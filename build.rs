// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: number of parallel workers
fn jobs_arg() -> Arg {
    Arg::new("jobs")
        .short('j')
        .long("jobs")
        .value_name("N")
        .help("Number of parallel conversion workers (default: logical CPU count)")
}

fn build_cli() -> Command {
    Command::new("cbzify")
        .version(env!("CARGO_PKG_VERSION"))
        .author("cbzify Contributors")
        .about("Batch CBR to CBZ comic archive converter with verified repackaging")
        .subcommand_required(false)
        .subcommand(
            Command::new("convert")
                .about("Convert CBR archives to verified CBZ archives")
                .arg(Arg::new("files").required(true).num_args(1..).help("CBR files to convert"))
                .arg(jobs_arg())
                .arg(
                    Arg::new("trash_originals")
                        .long("trash-originals")
                        .action(clap::ArgAction::SetTrue)
                        .help("Move successfully converted originals to the trash"),
                )
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(clap::ArgAction::SetTrue)
                        .help("List what would be converted without converting"),
                ),
        )
        .subcommand(
            Command::new("trash")
                .about("Move files to the trash via gio")
                .arg(Arg::new("files").required(true).num_args(1..).help("Files to trash")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true).help("Shell to generate completions for")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("cbzify.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
        return;
    }

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
