use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static UNDERSCORE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(\w)").unwrap());

/// `snake_case` → `UpperCamel`: every `_x` becomes `X`, then the first
/// character is upper-cased.
pub fn underline_to_hump(s: &str) -> String {
    let humped = UNDERSCORE_WORD.replace_all(s, |caps: &Captures| caps[1].to_uppercase());
    let mut chars = humped.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Disambiguated schema name: file stem hump-cased, then the original name.
pub fn name_with_file(name: &str, file_stem: &str) -> String {
    format!("{}{}", underline_to_hump(file_stem), name)
}
