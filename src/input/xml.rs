//! Thin layer over `quick_xml::Writer` shared by both document kinds.
//!
//! `quick_xml` escapes text content and attribute values (`& < > " '`) on the
//! way out, so nothing written through these helpers can break the markup.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::ScanError;

pub(crate) type XmlWriter = Writer<Vec<u8>>;

/// Render `<lilithinput><{section} attrs>...</{section}></lilithinput>`.
pub(crate) fn render<F>(
    section: &str,
    attributes: &[(&str, &str)],
    body: F,
) -> Result<String, ScanError>
where
    F: FnOnce(&mut XmlWriter) -> quick_xml::Result<()>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    open(&mut writer, "lilithinput", &[]).map_err(xml_error)?;
    open(&mut writer, section, attributes).map_err(xml_error)?;
    body(&mut writer).map_err(xml_error)?;
    close(&mut writer, section).map_err(xml_error)?;
    close(&mut writer, "lilithinput").map_err(xml_error)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| ScanError::serialization(format!("document is not UTF-8: {e}")))
}

pub(crate) fn open(w: &mut XmlWriter, tag: &str, attributes: &[(&str, &str)]) -> quick_xml::Result<()> {
    w.write_event(Event::Start(
        BytesStart::new(tag).with_attributes(attributes.iter().copied()),
    ))
}

pub(crate) fn close(w: &mut XmlWriter, tag: &str) -> quick_xml::Result<()> {
    w.write_event(Event::End(BytesEnd::new(tag)))
}

/// Write `<tag attr="...">text</tag>`.
pub(crate) fn text_element(
    w: &mut XmlWriter,
    tag: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> quick_xml::Result<()> {
    open(w, tag, attributes)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    close(w, tag)
}

/// Shortest round-trippable decimal form of a validated value.
pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Values are validated on the way in; a non-finite one here is a bug.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64, ScanError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScanError::serialization(format!("{name} resolved to non-finite {value}")))
    }
}

fn xml_error(err: quick_xml::Error) -> ScanError {
    ScanError::serialization(format!("XML writer failed: {err}"))
}
