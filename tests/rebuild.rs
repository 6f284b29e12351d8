//! End-to-end rebuild tests on jar, war and ear fixtures.

use std::path::{Path, PathBuf};

use persistence_patcher::{
    BackupPolicy, Error, OverrideSet, RebuildOutcome, RebuildRequest, Rebuilder, SchemaVersion,
    Stage, StatisticsProgress, rebuild,
};
use tempfile::TempDir;
use zip::CompressionMethod;

mod common;

use common::{
    JAR_DESCRIPTOR, WAR_DESCRIPTOR, create_zip, descriptor_xml, dir_names, jar_bytes, pairs,
    read_zip, read_zip_file, simple_descriptor, single_unit_properties, unit_properties, war_bytes,
    write_properties, write_zip, zip_methods,
};

fn overrides(items: &[(&str, &str)]) -> OverrideSet {
    items.iter().copied().collect()
}

/// Writes `bytes` as `<temp>/in/<name>` and returns its path.
fn input(temp: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let dir = temp.path().join("in");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// An ear with two jars and one war, each holding a descriptor.
fn shop_ear(temp: &TempDir) -> PathBuf {
    let orders = jar_bytes(Some(&simple_descriptor("2.0", &[("a", "1")])));
    let billing = jar_bytes(Some(&simple_descriptor("2.1", &[("b", "1")])));
    let web = war_bytes(Some(&simple_descriptor("1.0", &[("a", "1"), ("b", "1")])));
    let plain = jar_bytes(None);
    input(
        temp,
        "shop.ear",
        &create_zip(&[
            ("META-INF/", b""),
            ("META-INF/application.xml", b"<application/>"),
            ("orders.jar", &orders),
            ("lib/billing.jar", &billing),
            ("lib/commons.jar", &plain),
            ("shop-web.war", &web),
        ]),
    )
}

fn rebuilt(outcome: &RebuildOutcome) -> &persistence_patcher::RebuildReport {
    outcome.report().expect("expected a rebuilt artifact")
}

fn nested(outer: &Path, entry: &str) -> Vec<u8> {
    read_zip_file(outer)
        .remove(entry)
        .unwrap_or_else(|| panic!("missing entry {entry}"))
}

// =============================================================================
// Leaf archives
// =============================================================================

#[test]
fn test_jar_without_descriptor_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let artifact = input(&temp, "plain.jar", &jar_bytes(None));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "plain-prod.jar");
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    assert_eq!(outcome, RebuildOutcome::NoDescriptor);
    assert!(dir_names(&work).is_empty(), "left {:?}", dir_names(&work));
}

#[test]
fn test_jar_update_and_insert() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.0", &[("hibernate.hbm2ddl.auto", "update"), ("a", "1")]);
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let original = std::fs::read(&artifact).unwrap();
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "model-prod.jar");
    let outcome = rebuild(&request, &overrides(&[("a", "2"), ("b", "3")])).unwrap();

    let report = rebuilt(&outcome);
    assert_eq!(report.output, work.join("model-prod.jar"));
    assert_eq!(report.backup, None);
    assert_eq!(report.exploded, None);
    assert_eq!(report.changed.len(), 1);

    let changed = report.changed.iter().next().unwrap();
    assert_eq!(changed.archive, "model.jar");
    assert_eq!(changed.entry, JAR_DESCRIPTOR);
    assert_eq!(changed.version, SchemaVersion::V2_0);
    assert_eq!(
        (changed.stats.updated, changed.stats.inserted, changed.stats.unchanged),
        (1, 1, 1)
    );

    let output = read_zip_file(&report.output);
    assert_eq!(
        single_unit_properties(&output[JAR_DESCRIPTOR]),
        pairs(&[("hibernate.hbm2ddl.auto", "update"), ("a", "2"), ("b", "3")])
    );

    // Everything but the descriptor is carried over unchanged
    let before = read_zip(&original);
    for (name, data) in &before {
        if name != JAR_DESCRIPTOR {
            assert_eq!(output.get(name), Some(data), "entry {name} changed");
        }
    }
    assert_eq!(output.len(), before.len());

    // The input is never modified
    assert_eq!(std::fs::read(&artifact).unwrap(), original);
    assert_eq!(dir_names(&work), vec!["model-prod.jar".to_string()]);
}

#[test]
fn test_empty_override_deletes_property() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.1", &[("a", "1"), ("c", "4")]);
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "model.jar");
    let outcome = rebuild(&request, &overrides(&[("a", ""), ("x", "")])).unwrap();

    let report = rebuilt(&outcome);
    let stats = report.total_stats();
    assert_eq!((stats.deleted, stats.inserted, stats.unchanged), (1, 0, 1));

    let output = read_zip_file(&report.output);
    assert_eq!(
        single_unit_properties(&output[JAR_DESCRIPTOR]),
        pairs(&[("c", "4")])
    );
}

#[test]
fn test_units_without_properties_untouched() {
    let temp = TempDir::new().unwrap();
    let properties: &[(&str, &str)] = &[("a", "1")];
    let xml = descriptor_xml("2.0", &[("with", Some(properties)), ("without", None)]);
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "model.jar");
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    let output = read_zip_file(&rebuilt(&outcome).output);
    let units = unit_properties(&output[JAR_DESCRIPTOR]);
    assert_eq!(units.len(), 2);
    assert_eq!(units[0], ("with".to_string(), Some(pairs(&[("a", "2")]))));
    assert_eq!(units[1], ("without".to_string(), None));
}

#[test]
fn test_war_descriptor_location() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.1", &[("a", "1")]);
    let artifact = input(&temp, "shop-web.war", &war_bytes(Some(&xml)));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "war", &work, "shop-web.war");
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    let report = rebuilt(&outcome);
    let changed = report.changed.iter().next().unwrap();
    assert_eq!(changed.entry, WAR_DESCRIPTOR);
    assert_eq!(changed.version, SchemaVersion::V2_1);

    let output = read_zip_file(&report.output);
    assert_eq!(
        single_unit_properties(&output[WAR_DESCRIPTOR]),
        pairs(&[("a", "2")])
    );
    assert_eq!(output["WEB-INF/web.xml"], b"<web-app/>");
}

#[test]
fn test_war_descriptor_in_jar_location_is_ignored() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.0", &[("a", "1")]);
    let artifact = input(
        &temp,
        "odd.war",
        &create_zip(&[(JAR_DESCRIPTOR, xml.as_bytes())]),
    );
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "war", &work, "odd.war");
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();
    assert_eq!(outcome, RebuildOutcome::NoDescriptor);
}

#[test]
fn test_stored_entries_stay_stored() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.0", &[("a", "1")]);
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "model.jar");
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    let methods = zip_methods(&rebuilt(&outcome).output);
    assert_eq!(methods["com/example/Order.class"], CompressionMethod::Stored);
    assert_eq!(methods[JAR_DESCRIPTOR], CompressionMethod::Deflated);
}

// =============================================================================
// Containers
// =============================================================================

#[test]
fn test_ear_patches_every_leaf() {
    let temp = TempDir::new().unwrap();
    let artifact = shop_ear(&temp);
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "ear", &work, "shop-prod.ear");
    let mut progress = StatisticsProgress::new();
    let outcome = Rebuilder::with_progress(&request, &overrides(&[("a", "2"), ("b", "3")]), &mut progress)
        .run()
        .unwrap();

    let report = rebuilt(&outcome);
    let labels: Vec<(&str, &str, SchemaVersion)> = report
        .changed
        .iter()
        .map(|c| (c.archive.as_str(), c.entry.as_str(), c.version))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("lib/billing.jar", JAR_DESCRIPTOR, SchemaVersion::V2_1),
            ("orders.jar", JAR_DESCRIPTOR, SchemaVersion::V2_0),
            ("shop-web.war", WAR_DESCRIPTOR, SchemaVersion::V1_0),
        ]
    );

    let orders = read_zip(&nested(&report.output, "orders.jar"));
    assert_eq!(
        single_unit_properties(&orders[JAR_DESCRIPTOR]),
        pairs(&[("a", "2"), ("b", "3")])
    );
    let billing = read_zip(&nested(&report.output, "lib/billing.jar"));
    assert_eq!(
        single_unit_properties(&billing[JAR_DESCRIPTOR]),
        pairs(&[("b", "3"), ("a", "2")])
    );
    let web = read_zip(&nested(&report.output, "shop-web.war"));
    assert_eq!(
        single_unit_properties(&web[WAR_DESCRIPTOR]),
        pairs(&[("a", "2"), ("b", "3")])
    );

    // Untouched leaves and other entries are carried over
    let input_entries = read_zip_file(&artifact);
    let output_entries = read_zip_file(&report.output);
    assert_eq!(output_entries["lib/commons.jar"], input_entries["lib/commons.jar"]);
    assert_eq!(output_entries["META-INF/application.xml"], b"<application/>");
    assert_eq!(
        output_entries.keys().collect::<Vec<_>>(),
        input_entries.keys().collect::<Vec<_>>()
    );
    assert_eq!(orders["com/example/Order.class"], b"\xCA\xFE\xBA\xBE\x00\x00\x00\x34");

    assert_eq!(progress.candidates, 4);
    assert_eq!(progress.started, 4);
    assert_eq!(progress.patched, 3);
    assert_eq!(progress.skipped, 1);
    assert_eq!(progress.stats, report.total_stats());
    assert_eq!(
        progress.stages,
        vec![
            Stage::Init,
            Stage::Staged,
            Stage::PerFileProcessing,
            Stage::Decided,
            Stage::Cleanup,
            Stage::Done
        ]
    );

    assert_eq!(dir_names(&work), vec!["shop-prod.ear".to_string()]);
}

#[test]
fn test_ear_leaf_without_descriptor_untouched() {
    let temp = TempDir::new().unwrap();
    let patched = jar_bytes(Some(&simple_descriptor("2.0", &[("a", "1")])));
    let plain = jar_bytes(None);
    let artifact = input(
        &temp,
        "app.ear",
        &create_zip(&[("first.jar", &patched), ("second.jar", &plain)]),
    );
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "ear", &work, "app-prod.ear");
    let outcome = rebuild(&request, &overrides(&[("a", "2"), ("b", "3")])).unwrap();

    let report = rebuilt(&outcome);
    assert_eq!(report.changed.len(), 1);
    assert_eq!(report.changed.iter().next().unwrap().archive, "first.jar");

    let first = read_zip(&nested(&report.output, "first.jar"));
    assert_eq!(
        single_unit_properties(&first[JAR_DESCRIPTOR]),
        pairs(&[("a", "2"), ("b", "3")])
    );
    assert_eq!(nested(&report.output, "second.jar"), plain);
}

#[test]
fn test_ear_without_descriptors() {
    let temp = TempDir::new().unwrap();
    let plain = jar_bytes(None);
    let artifact = input(
        &temp,
        "empty.ear",
        &create_zip(&[("META-INF/application.xml", b"<application/>"), ("lib/a.jar", &plain)]),
    );
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "ear", &work, "empty.ear");
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    assert_eq!(outcome, RebuildOutcome::NoDescriptor);
    assert!(dir_names(&work).is_empty());
}

#[test]
fn test_ear_keep_exploded() {
    let temp = TempDir::new().unwrap();
    let artifact = shop_ear(&temp);
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "ear", &work, "shop.ear").keep_exploded(true);
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    let exploded = rebuilt(&outcome).exploded.clone().expect("exploded output");
    assert_eq!(exploded, work.join("shop.ear-update"));
    assert!(exploded.join("META-INF/application.xml").is_file());

    let orders = read_zip_file(&exploded.join("orders.jar"));
    assert_eq!(
        single_unit_properties(&orders[JAR_DESCRIPTOR]),
        pairs(&[("a", "2")])
    );
    assert_eq!(
        dir_names(&work),
        vec!["shop.ear".to_string(), "shop.ear-update".to_string()]
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unsupported_version_fails_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let good = jar_bytes(Some(&simple_descriptor("2.0", &[("a", "1")])));
    let bad = jar_bytes(Some(&simple_descriptor("9.9", &[("a", "1")])));
    let artifact = input(
        &temp,
        "mixed.ear",
        &create_zip(&[("a-good.jar", &good), ("b-bad.jar", &bad)]),
    );
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "ear", &work, "mixed.ear");
    let err = rebuild(&request, &overrides(&[("a", "2")])).unwrap_err();

    match &err {
        Error::Rebuild { stage, .. } => assert_eq!(*stage, Stage::PerFileProcessing),
        other => panic!("unexpected error: {other}"),
    }
    match err.root_cause() {
        Error::UnsupportedSchemaVersion { version, .. } => assert_eq!(version, "9.9"),
        other => panic!("unexpected cause: {other}"),
    }
    assert!(err.is_unsupported());
    assert!(dir_names(&work).is_empty(), "left {:?}", dir_names(&work));
}

#[test]
fn test_missing_version_is_unsupported() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.0", &[("a", "1")]).replace(r#"version="2.0" "#, "");
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "model.jar");
    let err = rebuild(&request, &overrides(&[("a", "2")])).unwrap_err();

    match err.root_cause() {
        Error::UnsupportedSchemaVersion { version, .. } => assert_eq!(version, "<none>"),
        other => panic!("unexpected cause: {other}"),
    }
    assert!(dir_names(&work).is_empty());
}

#[test]
fn test_malformed_descriptor_fails() {
    let temp = TempDir::new().unwrap();
    let xml = r#"<?xml version="1.0"?><persistence version="2.0"><persistence-unit name="u"><properties>"#;
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(xml)));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "model.jar");
    let err = rebuild(&request, &overrides(&[("a", "2")])).unwrap_err();

    assert!(matches!(err.root_cause(), Error::MalformedDescriptor { .. }));
    assert!(dir_names(&work).is_empty());
}

#[test]
fn test_unsupported_packaging_is_skipped() {
    let temp = TempDir::new().unwrap();
    let artifact = input(&temp, "parent.pom", b"<project/>");
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "pom", &work, "parent.pom");
    let outcome = rebuild(&request, &OverrideSet::new()).unwrap();

    assert!(matches!(outcome, RebuildOutcome::Unsupported { ref packaging } if packaging == "pom"));
    assert!(!work.exists());
}

#[test]
fn test_missing_artifact_fails_in_init() {
    let temp = TempDir::new().unwrap();
    let request = RebuildRequest::new(temp.path().join("gone.jar"), "jar", temp.path(), "gone.jar");

    let err = rebuild(&request, &OverrideSet::new()).unwrap_err();
    assert!(matches!(err, Error::Rebuild { stage: Stage::Init, .. }));
    assert!(err.to_string().contains("gone.jar"));
}

// =============================================================================
// Previous outputs
// =============================================================================

#[test]
fn test_previous_output_deleted_by_default() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.0", &[("a", "1")]);
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");
    write_zip(&work.join("model.jar"), &[("stale.txt", b"old")]);

    let request = RebuildRequest::new(&artifact, "jar", &work, "model.jar");
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    let report = rebuilt(&outcome);
    assert_eq!(report.backup, None);
    assert!(!read_zip_file(&report.output).contains_key("stale.txt"));
    assert_eq!(dir_names(&work), vec!["model.jar".to_string()]);
}

#[test]
fn test_previous_output_kept_as_backup() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.0", &[("a", "1")]);
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");
    write_zip(&work.join("model.jar"), &[("stale.txt", b"old")]);
    write_zip(&work.join("model.jar-backup"), &[("older.txt", b"older")]);

    let request =
        RebuildRequest::new(&artifact, "jar", &work, "model.jar").backup(BackupPolicy::Keep);
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    let report = rebuilt(&outcome);
    let backup = report.backup.clone().expect("backup path");
    assert_eq!(backup, work.join("model.jar-backup"));
    assert_eq!(read_zip_file(&backup)["stale.txt"], b"old");
    assert!(read_zip_file(&report.output).contains_key(JAR_DESCRIPTOR));
}

#[test]
fn test_leaf_keep_exploded() {
    let temp = TempDir::new().unwrap();
    let xml = simple_descriptor("2.0", &[("a", "1")]);
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");

    let request = RebuildRequest::new(&artifact, "jar", &work, "model-prod.jar").keep_exploded(true);
    let outcome = rebuild(&request, &overrides(&[("a", "2")])).unwrap();

    let exploded = rebuilt(&outcome).exploded.clone().expect("exploded output");
    assert_eq!(exploded, work.join("model.jar-update"));
    let descriptor = std::fs::read(exploded.join(JAR_DESCRIPTOR)).unwrap();
    assert_eq!(single_unit_properties(&descriptor), pairs(&[("a", "2")]));
}

#[test]
fn test_rebuilt_output_can_be_rebuilt() {
    let temp = TempDir::new().unwrap();
    let artifact = shop_ear(&temp);
    let first = temp.path().join("first");
    let second = temp.path().join("second");

    let once = rebuild(
        &RebuildRequest::new(&artifact, "ear", &first, "shop.ear"),
        &overrides(&[("a", "2")]),
    )
    .unwrap();
    let twice = rebuild(
        &RebuildRequest::new(&rebuilt(&once).output, "ear", &second, "shop.ear"),
        &overrides(&[("a", "2")]),
    )
    .unwrap();

    // The second pass finds the same descriptors and changes nothing
    let report = rebuilt(&twice);
    assert_eq!(report.changed.len(), 3);
    assert_eq!(report.total_stats().changed(), 0);
}

#[test]
fn test_overrides_from_properties_file() {
    let temp = TempDir::new().unwrap();
    let properties = write_properties(
        temp.path(),
        "# production\njavax.persistence.jdbc.url=jdbc:postgresql://db/shop\nhibernate.show_sql=\n",
    );
    let set = OverrideSet::from_properties_file(&properties).unwrap();

    let xml = simple_descriptor(
        "2.0",
        &[
            ("javax.persistence.jdbc.url", "jdbc:h2:mem:test"),
            ("hibernate.show_sql", "true"),
        ],
    );
    let artifact = input(&temp, "model.jar", &jar_bytes(Some(&xml)));
    let work = temp.path().join("work");

    let outcome = rebuild(&RebuildRequest::new(&artifact, "jar", &work, "model.jar"), &set).unwrap();

    let output = read_zip_file(&rebuilt(&outcome).output);
    assert_eq!(
        single_unit_properties(&output[JAR_DESCRIPTOR]),
        pairs(&[("javax.persistence.jdbc.url", "jdbc:postgresql://db/shop")])
    );
}
