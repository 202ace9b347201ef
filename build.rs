// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: snapshot database path
fn db_arg() -> Arg {
    Arg::new("db")
        .short('d')
        .long("db")
        .value_name("PATH")
        .required(true)
        .help("Path to a published snapshot database")
}

/// Common arguments: paging
fn page_args() -> [Arg; 2] {
    [
        Arg::new("page")
            .long("page")
            .default_value("1")
            .help("Page number, starting at 1"),
        Arg::new("per_page")
            .long("per-page")
            .help("Packages per page; defaults to the configured pagination"),
    ]
}

fn flag(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).action(ArgAction::SetTrue).help(help)
}

fn build_cli() -> Command {
    Command::new("vitrine")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Vitrine Contributors")
        .about("Aggregate APK repository indices into per-version snapshots")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .default_value("/etc/vitrine/config.toml")
                .global(true)
                .help("Configuration file"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Only show warnings and errors"),
        )
        .subcommand(
            Command::new("build")
                .about("Build and publish the snapshot of one or more repository versions")
                .arg(
                    Arg::new("versions")
                        .value_name("VERSION")
                        .required(true)
                        .num_args(1..)
                        .help("Repository versions to build, e.g. edge or v3.12"),
                )
                .arg(
                    Arg::new("output_directory")
                        .short('o')
                        .long("output-directory")
                        .default_value(".")
                        .help("Directory receiving the finished databases"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List main packages, most recently updated first")
                .arg(db_arg())
                .args(page_args()),
        )
        .subcommand(
            Command::new("show")
                .about("Show one package with its versions, dependencies and linked items")
                .arg(Arg::new("name").required(true).help("Package name"))
                .arg(db_arg()),
        )
        .subcommand(
            Command::new("search")
                .about("Search packages")
                .arg(Arg::new("repo").long("repo").help("Repository substring"))
                .arg(Arg::new("name").long("name").help("Name substring"))
                .arg(Arg::new("description").long("description").help("Description substring"))
                .arg(Arg::new("url").long("url").help("URL substring"))
                .arg(Arg::new("license").long("license").help("License substring"))
                .arg(flag("case_sensitive", "case-sensitive", "Match text filters case-sensitively"))
                .arg(
                    Arg::new("maintainer")
                        .long("maintainer")
                        .help("Maintainer name, or \"None\" for unmaintained packages"),
                )
                .arg(flag("subpackages", "subpackages", "Include sub-packages"))
                .arg(flag("arch_deps", "arch-deps", "Only packages with architecture-specific dependencies"))
                .arg(flag("arch_rdeps", "arch-rdeps", "Only packages with architecture-specific reverse dependencies"))
                .arg(flag("missing_deps", "missing-deps", "Only packages with missing dependencies"))
                .arg(flag("bugs", "bugs", "Only packages with linked bugs"))
                .arg(flag("merges", "merges", "Only packages with linked merge requests"))
                .arg(flag("outdated", "outdated", "Only packages missing from an architecture or older there"))
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .default_value("name")
                        .help("Sort order: name or updated"),
                )
                .arg(db_arg())
                .args(page_args()),
        )
        .subcommand(
            Command::new("maintainers")
                .about("List maintainer names")
                .arg(db_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true).help("Shell to generate completions for")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

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

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("vitrine.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
