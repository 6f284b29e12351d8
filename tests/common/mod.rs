//! Shared test utilities for integration tests.
//!
//! Builders for jar/war/ear fixtures and persistence.xml documents, plus
//! readers to inspect what a rebuild wrote.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use persistence_patcher::descriptor::detect_version_from_reader;
use persistence_patcher::{Descriptor, SchemaVersion};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Descriptor entry of a jar.
pub const JAR_DESCRIPTOR: &str = "META-INF/persistence.xml";

/// Descriptor entry of a war.
pub const WAR_DESCRIPTOR: &str = "WEB-INF/classes/META-INF/persistence.xml";

/// A persistence unit: name plus `Some(properties)` or `None` for no `<properties>` element.
pub type Unit<'a> = (&'a str, Option<&'a [(&'a str, &'a str)]>);

/// Creates an in-memory zip with the given entries.
///
/// Names ending in `/` become directory entries. Entries named `*.class`
/// are stored, everything else is deflated, so tests can check that both
/// methods survive a rebuild.
pub fn create_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut bytes));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .expect("Failed to add directory");
                continue;
            }
            let method = if name.ends_with(".class") {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            writer
                .start_file(*name, SimpleFileOptions::default().compression_method(method))
                .expect("Failed to start entry");
            writer.write_all(data).expect("Failed to write entry");
        }
        writer.finish().expect("Failed to finish zip");
    }
    bytes
}

/// Writes a zip file with the given entries and returns its path.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(path, create_zip(entries)).expect("Failed to write zip");
    path.to_path_buf()
}

/// Reads every file entry of a zip into memory, keyed by entry name.
pub fn read_zip(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("Failed to open zip");
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).expect("Failed to read entry");
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data).expect("Failed to read entry data");
        entries.insert(file.name().to_string(), data);
    }
    entries
}

/// Reads every file entry of a zip file.
pub fn read_zip_file(path: &Path) -> BTreeMap<String, Vec<u8>> {
    read_zip(&std::fs::read(path).expect("Failed to read zip file"))
}

/// Returns the compression method of every entry of a zip file.
pub fn zip_methods(path: &Path) -> BTreeMap<String, CompressionMethod> {
    let file = File::open(path).expect("Failed to open zip file");
    let mut archive = ZipArchive::new(file).expect("Failed to open zip");
    let mut methods = BTreeMap::new();
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).expect("Failed to read entry");
        methods.insert(entry.name().to_string(), entry.compression());
    }
    methods
}

/// Returns the default namespace used for a declared version.
pub fn namespace(version: &str) -> &'static str {
    match version {
        "2.1" => "http://xmlns.jcp.org/xml/ns/persistence",
        _ => "http://java.sun.com/xml/ns/persistence",
    }
}

/// Builds a persistence.xml document.
pub fn descriptor_xml(version: &str, units: &[Unit<'_>]) -> String {
    let ns = namespace(version);
    let schema = format!("{ns} {ns}/persistence_{}.xsd", version.replace('.', "_"));
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<persistence version="{version}" xmlns="{ns}"
             xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
             xsi:schemaLocation="{schema}">
"#
    );
    for (name, properties) in units {
        xml.push_str(&format!(
            "    <persistence-unit name=\"{name}\" transaction-type=\"RESOURCE_LOCAL\">\n"
        ));
        xml.push_str("        <provider>org.hibernate.ejb.HibernatePersistence</provider>\n");
        xml.push_str("        <class>com.example.Order</class>\n");
        if let Some(properties) = properties {
            xml.push_str("        <properties>\n");
            for (key, value) in properties.iter() {
                xml.push_str(&format!(
                    "            <property name=\"{key}\" value=\"{value}\"/>\n"
                ));
            }
            xml.push_str("        </properties>\n");
        }
        xml.push_str("    </persistence-unit>\n");
    }
    xml.push_str("</persistence>\n");
    xml
}

/// Builds a single-unit descriptor named `unit`.
pub fn simple_descriptor(version: &str, properties: &[(&str, &str)]) -> String {
    descriptor_xml(version, &[("unit", Some(properties))])
}

/// Entries of a jar holding `descriptor` plus a class and a manifest.
pub fn jar_entries(descriptor: Option<&str>) -> Vec<(String, Vec<u8>)> {
    let mut entries = vec![
        ("META-INF/".to_string(), Vec::new()),
        (
            "META-INF/MANIFEST.MF".to_string(),
            b"Manifest-Version: 1.0\n".to_vec(),
        ),
        (
            "com/example/Order.class".to_string(),
            b"\xCA\xFE\xBA\xBE\x00\x00\x00\x34".to_vec(),
        ),
    ];
    if let Some(xml) = descriptor {
        entries.push((JAR_DESCRIPTOR.to_string(), xml.as_bytes().to_vec()));
    }
    entries
}

/// Bytes of a jar holding `descriptor`.
pub fn jar_bytes(descriptor: Option<&str>) -> Vec<u8> {
    let entries = jar_entries(descriptor);
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    create_zip(&borrowed)
}

/// Bytes of a war holding `descriptor` under `WEB-INF/classes`.
pub fn war_bytes(descriptor: Option<&str>) -> Vec<u8> {
    let mut entries: Vec<(&str, &[u8])> = vec![
        ("WEB-INF/", b""),
        ("WEB-INF/web.xml", b"<web-app/>"),
        ("index.html", b"<html></html>"),
        ("WEB-INF/classes/com/example/Shop.class", b"\xCA\xFE\xBA\xBE"),
    ];
    if let Some(xml) = descriptor {
        entries.push((WAR_DESCRIPTOR, xml.as_bytes()));
    }
    create_zip(&entries)
}

/// Writes a properties file and returns its path.
pub fn write_properties(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("overrides.properties");
    std::fs::write(&path, contents).expect("Failed to write properties");
    path
}

/// Parses a descriptor document and returns `(unit, properties)` pairs.
///
/// Units without `<properties>` report `None`.
pub fn unit_properties(xml: &[u8]) -> Vec<(String, Option<Vec<(String, String)>>)> {
    let declared = detect_version_from_reader(xml, "test")
        .expect("Failed to detect version")
        .expect("No version attribute");
    let version = SchemaVersion::lookup(&declared).expect("Unsupported version");
    let text = std::str::from_utf8(xml).expect("Descriptor is not UTF-8");
    let descriptor = Descriptor::from_xml(version, text, "test").expect("Failed to parse");
    descriptor
        .units()
        .into_iter()
        .map(|unit| {
            let properties = unit.properties.map(|props| {
                props
                    .iter()
                    .map(|p| (p.name.clone(), p.value.clone()))
                    .collect()
            });
            (unit.name.to_string(), properties)
        })
        .collect()
}

/// Properties of the single unit of a descriptor.
pub fn single_unit_properties(xml: &[u8]) -> Vec<(String, String)> {
    let mut units = unit_properties(xml);
    assert_eq!(units.len(), 1, "expected a single persistence unit");
    units
        .remove(0)
        .1
        .expect("the unit has no properties element")
}

/// Converts borrowed pairs for comparisons.
pub fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Names of the direct children of a directory, sorted.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| {
            e.expect("Failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
