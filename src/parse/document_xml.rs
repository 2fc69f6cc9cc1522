//! Parser for XML feature documents.
//!
//! ```xml
//! <Document>
//!   <Object name="Box" type="Part::Box">
//!     <Property name="Length" value="10"/>
//!   </Object>
//!   <Object name="MultiTransform" type="PartDesign::MultiTransform">
//!     <Property name="Originals" value="Box"/>
//!     <Property name="Transformations">Mirrored, Scaled</Property>
//!   </Object>
//! </Document>
//! ```

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use crate::document::{Document, DocumentError, ObjectKind, PropertyError};

/// Result type for document parsing.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML could not be deserialised.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// The XML is well formed but not a feature document.
    #[error("invalid document: {0}")]
    Format(String),
    #[error("object `{object}`: {source}")]
    Property {
        object: String,
        #[source]
        source: PropertyError,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Read a feature document.
pub fn parse_str(input: &str) -> ParseResult<Document> {
    let trimmed = strip_xml_preamble(input);
    if !trimmed.starts_with("<Document") {
        return Err(ParseError::Format(
            "no <Document> root element found".to_owned(),
        ));
    }

    let raw: XmlDocument = from_str(trimmed)?;
    log::debug!("parsing document with {} objects", raw.objects.len());

    let mut document = Document::new();
    for object in raw.objects {
        let name = object.name.trim().to_owned();
        if name.is_empty() {
            return Err(ParseError::Format(format!(
                "object of type `{}` has no name",
                object.type_name
            )));
        }

        let mut kind = ObjectKind::from_type_name(object.type_name.trim());
        if let ObjectKind::Other(type_name) = &kind {
            log::debug!("object `{name}` has unmodelled type `{type_name}`");
        }
        for property in &object.properties {
            let value = property.value().unwrap_or_default();
            kind.set_property(property.name.trim(), &value)
                .map_err(|source| ParseError::Property {
                    object: name.clone(),
                    source,
                })?;
        }
        document.add_object(name, kind)?;
    }

    Ok(document)
}

fn strip_xml_preamble(input: &str) -> &str {
    let trimmed = input.trim_start_matches(|c: char| c == '\u{feff}' || c.is_whitespace());
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(idx) = rest.find("?>") {
            return rest[idx + 2..].trim_start();
        }
    }
    trimmed
}

#[derive(Debug, Deserialize)]
struct XmlDocument {
    #[serde(default, rename = "Object")]
    objects: Vec<XmlObject>,
}

#[derive(Debug, Deserialize)]
struct XmlObject {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@type")]
    type_name: String,
    #[serde(default, rename = "Property")]
    properties: Vec<XmlProperty>,
}

#[derive(Debug, Deserialize)]
struct XmlProperty {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@value")]
    raw_value: Option<String>,
    #[serde(default, rename = "$text")]
    content: Option<String>,
}

impl XmlProperty {
    fn value(&self) -> Option<String> {
        self.raw_value
            .as_ref()
            .or(self.content.as_ref())
            .map(|value| value.trim().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Primitive;
    use crate::geom::Point3;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Document>
  <Object name="Box" type="Part::Box">
    <Property name="Length" value="4"/>
    <Property name="Position" value="1,0,0"/>
  </Object>
  <Object name="Mirrored" type="PartDesign::Mirrored">
    <Property name="Normal" value="0,1,0"/>
  </Object>
  <Object name="Pad" type="PartDesign::Pad">
    <Property name="Length" value="5"/>
  </Object>
  <Object name="MultiTransform" type="PartDesign::MultiTransform">
    <Property name="Originals" value="Box"/>
    <Property name="Transformations">Mirrored</Property>
  </Object>
</Document>"#;

    #[test]
    fn parses_objects_in_order() {
        let doc = parse_str(SAMPLE).unwrap();
        let names: Vec<&str> = doc.objects().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Box", "Mirrored", "Pad", "MultiTransform"]);
        assert_eq!(doc.multi_transforms(), ["MultiTransform"]);
    }

    #[test]
    fn applies_attribute_and_text_values() {
        let doc = parse_str(SAMPLE).unwrap();
        let Some(ObjectKind::Primitive(Primitive::Box {
            position, length, ..
        })) = doc.object("Box").map(|o| &o.kind)
        else {
            panic!("expected a box");
        };
        assert_eq!(*position, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(*length, 4.0);

        let Some(ObjectKind::MultiTransform(feature)) = doc.object("MultiTransform").map(|o| &o.kind)
        else {
            panic!("expected a MultiTransform");
        };
        assert_eq!(feature.transformations, ["Mirrored"]);
    }

    #[test]
    fn keeps_unmodelled_types() {
        let doc = parse_str(SAMPLE).unwrap();
        assert_eq!(doc.object("Pad").unwrap().kind.type_name(), "PartDesign::Pad");
    }

    #[test]
    fn rejects_foreign_root() {
        assert!(matches!(
            parse_str("<ghx><objects/></ghx>"),
            Err(ParseError::Format(_))
        ));
    }

    #[test]
    fn reports_bad_property_with_object_name() {
        let xml = r#"<Document>
  <Object name="Scaled" type="PartDesign::Scaled">
    <Property name="Factor" value="big"/>
  </Object>
</Document>"#;
        let err = parse_str(xml).unwrap_err();
        assert!(matches!(err, ParseError::Property { ref object, .. } if object == "Scaled"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let xml = r#"<Document>
  <Object name="Box" type="Part::Box"/>
  <Object name="Box" type="Part::Box"/>
</Document>"#;
        assert!(matches!(
            parse_str(xml),
            Err(ParseError::Document(DocumentError::DuplicateName(_)))
        ));
    }
}
