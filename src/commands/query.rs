// src/commands/query.rs
//! Read commands over a published snapshot

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing::debug;
use vitrine::config::SiteConfig;
use vitrine::db;
use vitrine::db::models::{
    DEFAULT_PAGE_SIZE, DependencyEdge, Direction, MissingDependency, Package, Page, Paginated,
    TrackedItem, TrackerKind, UNMAINTAINED, VersionEntry,
};
use vitrine::db::search::{self, MaintainerFilter, SearchQuery, SortKey};

use crate::cli::SearchArgs;

/// Page size: the explicit value, else the pagination configured for the
/// snapshot's version (its file stem), else the default
fn page_size(config_path: &Path, db_path: &str, explicit: Option<u32>) -> u32 {
    if let Some(per_page) = explicit {
        return per_page;
    }

    let version = Path::new(db_path).file_stem().and_then(|s| s.to_str());
    let configured = version.and_then(|version| {
        let site = SiteConfig::load(config_path).ok()?;
        site.version(version).ok().map(|config| config.pagination)
    });

    debug!("Configured page size: {:?}", configured);
    configured.unwrap_or(DEFAULT_PAGE_SIZE)
}

fn print_page(result: &Paginated<Package>) {
    if result.items.is_empty() {
        println!("No packages found.");
        return;
    }

    for package in &result.items {
        print!("  {} [{}]", package.name, package.repo);
        if let Some(description) = &package.description {
            print!(" - {}", description);
        }
        println!();
    }
    println!(
        "\nPage {} of {} ({} package(s))",
        result.page.number,
        result.pages(),
        result.total
    );
}

/// List main packages, most recently updated first
pub fn cmd_list(config_path: &Path, db_path: &str, page: u32, per_page: Option<u32>) -> Result<()> {
    let conn = db::open_read_only(Path::new(db_path))?;
    let page = Page::new(page, page_size(config_path, db_path, per_page));

    let result = Package::list_main(&conn, page)?;
    print_page(&result);
    Ok(())
}

/// Show a package with everything linked to it
pub fn cmd_show(name: &str, db_path: &str) -> Result<()> {
    let conn = db::open_read_only(Path::new(db_path))?;
    let package = Package::find_by_name(&conn, name)?
        .ok_or_else(|| anyhow!("Package '{}' not found", name))?;
    let id = package.id.context("Package row without id")?;

    println!("{} [{}]", package.name, package.repo);
    if let Some(description) = &package.description {
        println!("  Description: {}", description);
    }
    if let Some(url) = &package.url {
        println!("  URL: {}", url);
    }
    if let Some(license) = &package.license {
        println!("  License: {}", license);
    }
    println!(
        "  Maintainer: {}",
        package.maintainer.as_deref().unwrap_or(UNMAINTAINED)
    );
    println!("  Start directory: {}", package.startdir);
    if let Some(revision) = &package.revision {
        println!("  Revision: {}", revision);
    }

    if let Some(origin) = package.origin_package(&conn)? {
        println!("  Origin: {}", origin.name);
    } else {
        let subpackages = package.subpackages(&conn)?;
        if !subpackages.is_empty() {
            println!("\nSub-packages:");
            for sub in &subpackages {
                println!("  {}", sub.name);
            }
        }
    }

    println!("\nVersions:");
    for entry in VersionEntry::find_by_package(&conn, id)? {
        let version = entry.version.as_deref().unwrap_or("-");
        let marker = match entry.rank {
            Some(0) | None => "",
            Some(_) => " (outdated)",
        };
        println!("  {:<12} {}{}", entry.arch, version, marker);
    }

    for (title, direction) in [
        ("Dependencies", Direction::Forward),
        ("Reverse dependencies", Direction::Reverse),
    ] {
        let related = DependencyEdge::find_by_package(&conn, id, direction)?;
        if related.is_empty() {
            continue;
        }
        println!("\n{}:", title);
        for rel in &related {
            match &rel.arch {
                Some(arch) => println!("  {} [{}]", rel.name, arch),
                None => println!("  {}", rel.name),
            }
        }
    }

    let missing = MissingDependency::find_by_package(&conn, id)?;
    if !missing.is_empty() {
        println!("\nMissing dependencies:");
        for dep in &missing {
            println!("  {} [{}]", dep.spec, dep.arch);
        }
    }

    for kind in [TrackerKind::Bug, TrackerKind::Merge] {
        let items = TrackedItem::find_by_package(&conn, kind, id)?;
        if items.is_empty() {
            continue;
        }
        println!();
        for item in &items {
            print!("{} #{}: {}", kind, item.id, item.summary);
            if !item.tags.is_empty() {
                print!(" [{}]", item.tags.join(", "));
            }
            println!();
        }
    }

    Ok(())
}

/// Search packages
pub fn cmd_search(
    config_path: &Path,
    args: &SearchArgs,
    db_path: &str,
    page: u32,
    per_page: Option<u32>,
) -> Result<()> {
    let sort: SortKey = args.sort.parse().map_err(|e: String| anyhow!(e))?;
    let query = SearchQuery {
        repo: args.repo.clone(),
        name: args.name.clone(),
        description: args.description.clone(),
        url: args.url.clone(),
        license: args.license.clone(),
        case_sensitive: args.case_sensitive,
        maintainer: args.maintainer.as_deref().map(MaintainerFilter::parse),
        subpackages: args.subpackages,
        arch_deps: args.arch_deps,
        arch_rdeps: args.arch_rdeps,
        missing_deps: args.missing_deps,
        bugs: args.bugs,
        merges: args.merges,
        outdated: args.outdated,
        sort,
    };

    let conn = db::open_read_only(Path::new(db_path))?;
    let page = Page::new(page, page_size(config_path, db_path, per_page));

    let result = search::search(&conn, &query, page)?;
    print_page(&result);
    Ok(())
}

/// List maintainer names
pub fn cmd_maintainers(db_path: &str) -> Result<()> {
    let conn = db::open_read_only(Path::new(db_path))?;
    for name in Package::maintainers(&conn)? {
        println!("{}", name);
    }
    Ok(())
}
