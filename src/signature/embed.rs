//! Signature container anchoring.
//!
//! A serialized document carries exactly one signature container. Unsigned,
//! it is the empty placeholder `<ext:ExtensionContent/>`; signed, the same
//! element wraps the `ds:Signature` block. [`splice`] and [`strip`] convert
//! between the two forms without touching any other byte, so
//! `strip(splice(x, b)) == x`.

use crate::core::CpeError;
use crate::ubl::ns;

pub const PLACEHOLDER: &str = "<ext:ExtensionContent/>";
const OPEN: &str = "<ext:ExtensionContent>";
const CLOSE: &str = "</ext:ExtensionContent>";
const VERSION_ID: &str = "<cbc:UBLVersionID>";
const ROOTS: [&str; 3] = ["Invoice", "CreditNote", "DebitNote"];

/// Bring a serialized document to placeholder form.
///
/// A document with the placeholder is returned as is. A signed document has
/// its signature stripped. A document without any container gets one
/// synthesized as the first child of the root element.
pub fn normalize(xml: &str) -> Result<String, CpeError> {
    let placeholders = xml.matches(PLACEHOLDER).count();
    let containers = xml.matches(OPEN).count();

    match (placeholders, containers) {
        (1, 0) => {
            check_position(xml, PLACEHOLDER)?;
            Ok(xml.to_string())
        }
        (0, 1) => strip(xml),
        (0, 0) => synthesize(xml),
        (p, c) => Err(CpeError::InjectionPointNotFound(format!(
            "expected a single signature container, found {}",
            p + c
        ))),
    }
}

/// Replace the placeholder with `<ext:ExtensionContent>` wrapping `block`.
///
/// `block` is re-indented two spaces deeper than the placeholder's line.
pub fn splice(xml: &str, block: &str) -> Result<String, CpeError> {
    if xml.matches(PLACEHOLDER).count() != 1 {
        return Err(CpeError::InjectionPointNotFound(
            "placeholder <ext:ExtensionContent/> must occur exactly once".into(),
        ));
    }
    let at = check_position(xml, PLACEHOLDER)?;
    let indent = line_indent(xml, at);

    let mut container = String::with_capacity(block.len() + 64);
    container.push_str(OPEN);
    container.push('\n');
    for line in block.lines() {
        container.push_str(indent);
        container.push_str("  ");
        container.push_str(line);
        container.push('\n');
    }
    container.push_str(indent);
    container.push_str(CLOSE);

    let mut out = String::with_capacity(xml.len() + container.len());
    out.push_str(&xml[..at]);
    out.push_str(&container);
    out.push_str(&xml[at + PLACEHOLDER.len()..]);
    Ok(out)
}

/// Remove an embedded signature, restoring the placeholder.
pub fn strip(xml: &str) -> Result<String, CpeError> {
    if xml.matches(OPEN).count() != 1 {
        return Err(CpeError::InjectionPointNotFound(
            "signed container <ext:ExtensionContent> must occur exactly once".into(),
        ));
    }
    let start = check_position(xml, OPEN)?;
    let end = xml[start..]
        .find(CLOSE)
        .map(|i| start + i + CLOSE.len())
        .ok_or_else(|| {
            CpeError::InjectionPointNotFound("unterminated <ext:ExtensionContent>".into())
        })?;

    let mut out = String::with_capacity(xml.len());
    out.push_str(&xml[..start]);
    out.push_str(PLACEHOLDER);
    out.push_str(&xml[end..]);
    Ok(out)
}

/// The container must precede the version preamble. Returns its offset.
fn check_position(xml: &str, anchor: &str) -> Result<usize, CpeError> {
    let at = xml.find(anchor).ok_or_else(|| {
        CpeError::InjectionPointNotFound(format!("anchor {anchor} not found"))
    })?;
    match xml.find(VERSION_ID) {
        Some(version) if version < at => Err(CpeError::InjectionPointNotFound(
            "signature container must precede cbc:UBLVersionID".into(),
        )),
        _ => Ok(at),
    }
}

fn line_indent(xml: &str, at: usize) -> &str {
    let line_start = xml[..at].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &xml[line_start..at];
    let width = prefix.len() - prefix.trim_start_matches(' ').len();
    &prefix[..width]
}

/// Insert `ext:UBLExtensions` right after the root start tag, declaring the
/// extension and signature namespaces on the root when missing.
fn synthesize(xml: &str) -> Result<String, CpeError> {
    let (name_start, tag_end) = root_start_tag(xml)?;
    let name_end = xml[name_start..tag_end]
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .map_or(tag_end, |i| name_start + i);
    let root = &xml[name_start..name_end];
    if !ROOTS.contains(&root) {
        return Err(CpeError::InjectionPointNotFound(format!(
            "root element {root} is not a UBL document"
        )));
    }
    if xml[..tag_end].ends_with('/') {
        return Err(CpeError::InjectionPointNotFound(format!(
            "root element {root} is empty"
        )));
    }

    let tag = &xml[name_start..tag_end];
    let mut declarations = String::new();
    for (prefix, uri) in [("ext", ns::EXT), ("ds", ns::DS)] {
        if !tag.contains(&format!("xmlns:{prefix}=")) {
            declarations.push_str(&format!(" xmlns:{prefix}=\"{uri}\""));
        }
    }

    let mut out = String::with_capacity(xml.len() + 160);
    out.push_str(&xml[..tag_end]);
    out.push_str(&declarations);
    out.push('>');
    out.push_str("\n  <ext:UBLExtensions>\n    <ext:UBLExtension>\n      ");
    out.push_str(PLACEHOLDER);
    out.push_str("\n    </ext:UBLExtension>\n  </ext:UBLExtensions>");
    out.push_str(&xml[tag_end + 1..]);
    Ok(out)
}

/// Offsets of the root element name and of its closing `>`.
fn root_start_tag(xml: &str) -> Result<(usize, usize), CpeError> {
    let mut offset = 0;
    while let Some(i) = xml[offset..].find('<') {
        let start = offset + i;
        let rest = &xml[start + 1..];
        if rest.starts_with('?') || rest.starts_with('!') {
            offset = start + 1;
            continue;
        }
        let end = xml[start..].find('>').map(|j| start + j).ok_or_else(|| {
            CpeError::InjectionPointNotFound("unterminated root start tag".into())
        })?;
        return Ok((start + 1, end));
    }
    Err(CpeError::InjectionPointNotFound("no root element".into()))
}
