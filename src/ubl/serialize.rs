use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use super::tree::{Content, Element, OutputTree};
use crate::core::CpeError;

fn xml_io(e: std::io::Error) -> CpeError {
    CpeError::Serialization(format!("XML write error: {e}"))
}

/// Indented XML writer: two spaces per level, UTF-8 declaration first.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, CpeError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    /// Writer for an embeddable fragment: same indentation, no declaration.
    pub fn fragment() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    pub fn into_string(self) -> Result<String, CpeError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| CpeError::Serialization(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, CpeError> {
        self.writer
            .write_event(Event::Start(start(name, attrs)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn empty_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, CpeError> {
        self.writer
            .write_event(Event::Empty(start(name, attrs)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, CpeError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, CpeError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write `element` and its subtree.
    pub fn element(&mut self, element: &Element) -> Result<&mut Self, CpeError> {
        for (key, value) in &element.attrs {
            check_chars(element.name, value)?;
            check_name(key)?;
        }
        check_name(element.name)?;

        let attrs: Vec<(&str, &str)> = element
            .attrs
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();

        match &element.content {
            Content::Empty => self.empty_element_with_attrs(element.name, &attrs),
            Content::Text(text) => {
                check_chars(element.name, text)?;
                self.text_element_with_attrs(element.name, text, &attrs)
            }
            Content::Children(children) => {
                self.start_element_with_attrs(element.name, &attrs)?;
                for child in children {
                    self.element(child)?;
                }
                self.end_element(element.name)
            }
        }
    }
}

fn start<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(name);
    for (k, v) in attrs {
        elem.push_attribute((*k, *v));
    }
    elem
}

/// Reject characters XML 1.0 cannot represent, even escaped.
fn check_chars(element: &str, value: &str) -> Result<(), CpeError> {
    match value.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(CpeError::Serialization(format!(
            "element {element} contains character U+{:04X} not allowed in XML 1.0",
            c as u32
        ))),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn check_name(name: &str) -> Result<(), CpeError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CpeError::Serialization(format!("invalid XML name {name:?}")))
    }
}

/// Render a tree as indented UTF-8 XML with a leading declaration.
///
/// Element and attribute order follow the tree exactly, so identical trees
/// always render to identical text.
pub fn serialize(tree: &OutputTree) -> Result<String, CpeError> {
    let mut w = XmlWriter::new()?;
    w.element(&tree.root)?;
    w.into_string()
}

/// Render a detached element without declaration.
pub fn serialize_fragment(element: &Element) -> Result<String, CpeError> {
    let mut w = XmlWriter::fragment();
    w.element(element)?;
    w.into_string()
}
