// tests/query.rs

//! Read-path tests: listing, searching and maintainer lookups over a built snapshot.

mod common;

use common::{Mirror, StaticBugs, bug, index, output_dir, record, version_config};
use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;
use vitrine::db;
use vitrine::db::models::{Package, Page, UNMAINTAINED};
use vitrine::db::search::{self, MaintainerFilter, SearchQuery, SortKey};
use vitrine::{Error, SnapshotBuilder};

/// Snapshot of a small two-architecture repository
///
/// - foo: both arches, arch-specific dep on libarm on aarch64, with a bug
/// - foo-doc: sub-package of foo
/// - libarm: aarch64 only
/// - Bar: x86_64 only, missing dependency, unmaintained
fn build_snapshot() -> (Mirror, TempDir, PathBuf) {
    let mirror = Mirror::new();
    mirror.publish(
        "v3.12",
        "main",
        "x86_64",
        &index(&[
            record(
                "foo",
                "1.2-r0",
                300,
                &["T:Foo utility", "L:MIT", "m:Jane Doe <jane@example.org>"],
            ),
            record("foo-doc", "1.2-r0", 300, &["o:foo", "T:Foo documentation"]),
            record("Bar", "0.9-r1", 100, &["T:Bar library", "L:GPL-2.0-only", "D:so:libgone.so.3"]),
        ]),
    );
    mirror.publish(
        "v3.12",
        "main",
        "aarch64",
        &index(&[
            record(
                "foo",
                "1.2-r0",
                300,
                &["T:Foo utility", "L:MIT", "m:Jane Doe <jane@example.org>", "D:libarm"],
            ),
            record("libarm", "2.0-r0", 200, &["T:ARM helpers", "m:Joe <joe@example.org>"]),
        ]),
    );

    let config = version_config(
        "v3.12",
        &mirror.template(),
        &[("main", &["x86_64", "aarch64"])],
    );
    let source = mirror.source("v3.12");
    let tracker = StaticBugs(vec![bug(5, "foo")]);
    let (tmp, out) = output_dir();

    SnapshotBuilder::new(&config, &source)
        .with_issue_tracker(&tracker)
        .build(&out)
        .unwrap();

    (mirror, tmp, out)
}

fn names(conn: &Connection, query: &SearchQuery) -> Vec<String> {
    search::search(conn, query, Page::default())
        .unwrap()
        .items
        .into_iter()
        .map(|p| p.name)
        .collect()
}

#[test]
fn test_list_main_packages() {
    let (_mirror, _tmp, out) = build_snapshot();
    let conn = db::open_snapshot(&out, "v3.12").unwrap();

    let page = Package::list_main(&conn, Page::new(1, 2)).unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.pages(), 2);
    assert!(page.has_next());
    let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["foo", "libarm"]);

    let last = Package::list_main(&conn, Page::new(2, 2)).unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].name, "Bar");
    assert!(!last.has_next());
}

#[test]
fn test_subpackages_and_origin() {
    let (_mirror, _tmp, out) = build_snapshot();
    let conn = db::open_snapshot(&out, "v3.12").unwrap();

    let foo = Package::find_by_name(&conn, "foo").unwrap().unwrap();
    let subs = foo.subpackages(&conn).unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].name, "foo-doc");
    assert_eq!(subs[0].origin_package(&conn).unwrap().unwrap().name, "foo");
}

#[test]
fn test_text_filters() {
    let (_mirror, _tmp, out) = build_snapshot();
    let conn = db::open_snapshot(&out, "v3.12").unwrap();

    let query = SearchQuery {
        name: Some("bar".to_string()),
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["Bar"]);

    let query = SearchQuery {
        name: Some("bar".to_string()),
        case_sensitive: true,
        ..SearchQuery::default()
    };
    assert!(names(&conn, &query).is_empty());

    let query = SearchQuery {
        description: Some("foo".to_string()),
        subpackages: true,
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["foo", "foo-doc"]);

    let query = SearchQuery {
        license: Some("gpl".to_string()),
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["Bar"]);
}

#[test]
fn test_relation_filters() {
    let (_mirror, _tmp, out) = build_snapshot();
    let conn = db::open_snapshot(&out, "v3.12").unwrap();

    let query = SearchQuery {
        arch_deps: true,
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["foo"]);

    let query = SearchQuery {
        arch_rdeps: true,
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["libarm"]);

    let query = SearchQuery {
        missing_deps: true,
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["Bar"]);

    let query = SearchQuery {
        bugs: true,
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["foo"]);

    let query = SearchQuery {
        merges: true,
        ..SearchQuery::default()
    };
    assert!(names(&conn, &query).is_empty());
}

#[test]
fn test_outdated_filter_and_sort() {
    let (_mirror, _tmp, out) = build_snapshot();
    let conn = db::open_snapshot(&out, "v3.12").unwrap();

    // Bar and libarm each lack one architecture
    let query = SearchQuery {
        outdated: true,
        sort: SortKey::Updated,
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["libarm", "Bar"]);
}

#[test]
fn test_maintainers() {
    let (_mirror, _tmp, out) = build_snapshot();
    let conn = db::open_snapshot(&out, "v3.12").unwrap();

    let maintainers = Package::maintainers(&conn).unwrap();
    assert_eq!(maintainers, vec![UNMAINTAINED, "Jane Doe", "Joe"]);

    let query = SearchQuery {
        maintainer: Some(MaintainerFilter::parse("Jane Doe")),
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["foo"]);

    let query = SearchQuery {
        maintainer: Some(MaintainerFilter::parse(UNMAINTAINED)),
        ..SearchQuery::default()
    };
    assert_eq!(names(&conn, &query), vec!["Bar"]);
}

#[test]
fn test_open_snapshot_errors() {
    let (_mirror, _tmp, out) = build_snapshot();

    assert!(matches!(
        db::open_snapshot(&out, "edge"),
        Err(Error::NotFoundError(_))
    ));
    assert!(db::open_snapshot(&out, "../v3.12").is_err());
}
