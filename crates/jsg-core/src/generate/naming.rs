use crate::model::TypeDef;
use crate::model::type_ref::PATH_SEPARATOR;

/// Turn a camelCase identifier into a human readable title.
///
/// Words split before an uppercase letter that follows a non-uppercase one,
/// inside acronyms before their last letter (`HTMLParser` → `HTML Parser`),
/// and wherever a letter is followed by a non-letter. The first character is
/// uppercased.
pub fn camel_case_to_sentence_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let acronym_end = prev.is_ascii_uppercase()
                && c.is_ascii_uppercase()
                && next.is_some_and(|n| n.is_ascii_lowercase());
            let word_start = !prev.is_ascii_uppercase() && c.is_ascii_uppercase();
            let letter_end = prev.is_ascii_alphabetic() && !c.is_ascii_alphabetic();
            if acronym_end || word_start || letter_end {
                out.push(' ');
            }
        }
        out.push(c);
    }

    let mut result = out.chars();
    match result.next() {
        Some(first) => first.to_uppercase().chain(result).collect(),
        None => String::new(),
    }
}

/// The subtype's qualified name relative to the base type's module, keeping
/// the leading separator. Subtypes outside that module keep their full name.
pub fn minimal_class_id(base: &TypeDef, subtype: &TypeDef) -> String {
    let prefix = base.package_prefix();
    match subtype.name.strip_prefix(prefix) {
        Some(rest) if prefix != PATH_SEPARATOR => format!("{}{}", PATH_SEPARATOR, rest),
        _ => subtype.name.clone(),
    }
}
