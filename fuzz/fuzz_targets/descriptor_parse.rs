//! Fuzz target for descriptor detection, parsing and the merge.
//!
//! Feeds arbitrary bytes through the same steps a rebuild applies to an
//! extracted persistence.xml. Any error is fine; panics are not.
//!
//! Run with: cargo +nightly fuzz run descriptor_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use persistence_patcher::descriptor::detect_version_from_reader;
use persistence_patcher::{Descriptor, OverrideSet, SchemaVersion};

fuzz_target!(|data: &[u8]| {
    let Ok(Some(declared)) = detect_version_from_reader(data, "fuzz") else {
        return;
    };
    let Some(version) = SchemaVersion::lookup(&declared) else {
        return;
    };
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut descriptor) = Descriptor::from_xml(version, xml, "fuzz") else {
        return;
    };

    let overrides: OverrideSet = [("a", "1"), ("b", ""), ("hibernate.show_sql", "true")]
        .into_iter()
        .collect();
    descriptor.merge(&overrides);

    // A merged model must always render and parse back
    let rendered = descriptor.to_xml().expect("merged descriptor does not render");
    let reparsed = Descriptor::from_xml(version, &rendered, "rendered")
        .expect("rendered descriptor does not parse");
    assert_eq!(reparsed.units().len(), descriptor.units().len());
});
