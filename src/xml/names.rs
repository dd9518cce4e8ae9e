//! Mapping of arbitrary JSON strings onto valid XML names and text.
//!
//! Name rules follow the XML 1.0 (Fifth Edition) `NameStartChar` and
//! `NameChar` productions, minus `:` so that no tag is read as a namespace
//! prefix.

use std::borrow::Cow;

const REPLACEMENT_CHAR: char = '\u{FFFD}';

fn is_name_start(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Characters allowed in XML 1.0 documents at all, escaped or not
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Returns true if `name` can be used verbatim as an element name
pub fn is_valid_tag(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => is_name_start(first) && chars.all(is_name_char),
        None => false,
    }
}

/// Turns a JSON object key into a valid element name.
///
/// Valid keys are kept verbatim. Otherwise every character that is not a
/// `NameChar` becomes `_`, and a leading character that cannot start a name
/// gets a `_` prefix, so `"0invalid key"` becomes `"_0invalid_key"`. Distinct
/// keys may map to the same tag; callers emit both elements.
pub fn sanitize_tag(key: &str) -> Cow<'_, str> {
    if is_valid_tag(key) {
        return Cow::Borrowed(key);
    }
    let mut tag = String::with_capacity(key.len() + 1);
    match key.chars().next() {
        None => tag.push('_'),
        Some(first) if !is_name_start(first) => tag.push('_'),
        Some(_) => {}
    }
    tag.extend(key.chars().map(|c| if is_name_char(c) { c } else { '_' }));
    Cow::Owned(tag)
}

/// Replaces characters XML cannot carry, even escaped, with U+FFFD.
///
/// Markup characters are left alone; the writer escapes those.
pub fn sanitize_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(
            text.chars()
                .map(|c| if is_xml_char(c) { c } else { REPLACEMENT_CHAR })
                .collect(),
        )
    }
}
