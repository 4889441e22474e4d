//! Java `.properties` codec for message bundles
//!
//! Parsing and escaping are handled by `java-properties`; files are read and
//! written as UTF-8. Output keys are sorted so rewritten bundles diff cleanly.

use encoding_rs::UTF_8;
use java_properties::{PropertiesIter, PropertiesWriter};
use std::collections::{BTreeMap, HashMap};

pub use java_properties::PropertiesError;

/// Parse a properties document into a message map
///
/// Later duplicates of a key win.
pub fn parse(content: &str) -> Result<HashMap<String, String>, PropertiesError> {
    let mut map = HashMap::new();
    PropertiesIter::new_with_encoding(content.as_bytes(), UTF_8).read_into(|key, value| {
        map.insert(key, value);
    })?;
    Ok(map)
}

/// Serialize a message map as a properties document
pub fn to_string(messages: &HashMap<String, String>) -> Result<String, PropertiesError> {
    let sorted: BTreeMap<_, _> = messages.iter().collect();
    let mut buffer = Vec::new();

    {
        let mut writer = PropertiesWriter::new_with_encoding(&mut buffer, UTF_8);
        for (key, value) in sorted {
            writer.write(key, value)?;
        }
        writer.finish()?;
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
