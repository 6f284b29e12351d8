//! Schema version sniffing.
//!
//! The version must be known before the document can be bound to a typed
//! model, so it is read with a streaming pull parser that stops at the
//! root `persistence` element instead of building a tree.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::{Error, Result};

/// Returns the `version` attribute of the first `persistence` element in a file.
///
/// Returns `Ok(None)` when the document has no such element or the element
/// has no `version` attribute.
///
/// # Errors
///
/// Returns [`Error::MalformedDescriptor`] if the markup before the element
/// is not well formed.
pub fn detect_version(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_op("open", path, e))?;
    detect_version_from_reader(BufReader::new(file), &path.display().to_string())
}

/// Like [`detect_version`], reading from any buffered source.
///
/// `label` names the source in error messages.
///
/// ```
/// use persistence_patcher::descriptor::detect_version_from_reader;
///
/// let xml = r#"<?xml version="1.0"?><persistence version="2.1"><persistence-unit name="u"/></persistence>"#;
/// let version = detect_version_from_reader(xml.as_bytes(), "inline").unwrap();
/// assert_eq!(version.as_deref(), Some("2.1"));
/// ```
pub fn detect_version_from_reader<R: BufRead>(source: R, label: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"persistence" => {
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| Error::malformed(label, err))?;
                    if attr.key.as_ref() == b"version" {
                        let value = attr
                            .decode_and_unescape_value(reader.decoder())
                            .map_err(|err| Error::malformed(label, err))?;
                        log::debug!("'{}' declares persistence version {}", label, value);
                        return Ok(Some(value.into_owned()));
                    }
                }
                log::debug!("'{}' has no persistence version attribute", label);
                return Ok(None);
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(e) => {
                return Err(Error::malformed(
                    label,
                    format!("{} (at byte {})", e, reader.buffer_position()),
                ));
            }
        }
        buf.clear();
    }
}
