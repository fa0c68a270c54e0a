//! Turns free-form type and relation labels into identifiers that can be embedded unescaped
//! in schema-definition statements.
//!
//! Normalization keeps ASCII letters and digits only, splitting the label into words on every
//! other character. Distinct labels may still normalize to the same identifier; schema
//! inference rejects such collisions instead of silently merging tables.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[A-Za-z0-9]+").unwrap();
    pub(crate) static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Identifier used when a label contains no letter or digit at all.
pub const UNLABELED: &str = "Unlabeled";

fn words(label: &str) -> impl Iterator<Item = String> + '_ {
    WORD.find_iter(label).map(|m| m.as_str().to_ascii_lowercase())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Class-style (PascalCase) identifier, e.g. `"/film/film/genre"` -> `FilmFilmGenre` and
/// `"threat-actor"` -> `ThreatActor`.
pub fn normalize(label: &str) -> String {
    let ident: String = words(label).map(|w| capitalize(&w)).collect();
    match ident.chars().next() {
        None => UNLABELED.to_string(),
        Some(c) if c.is_ascii_digit() => format!("T{ident}"),
        Some(_) => ident,
    }
}

/// Lower snake_case identifier used inside composite relation table names,
/// e.g. `"attributed-to"` -> `attributed_to`.
pub fn normalize_relation_label(label: &str) -> String {
    let ident = words(label).collect::<Vec<_>>().join("_");
    match ident.chars().next() {
        None => UNLABELED.to_ascii_lowercase(),
        Some(c) if c.is_ascii_digit() => format!("t{ident}"),
        Some(_) => ident,
    }
}

/// Lowercase, dash-separated form of a free-form name, safe to use in a directory name.
pub fn slugify(name: &str) -> String {
    let slug = words(name).collect::<Vec<_>>().join("-");
    if slug.is_empty() {
        "dataset".to_string()
    } else {
        slug
    }
}

pub fn is_valid_identifier(ident: &str) -> bool {
    IDENTIFIER.is_match(ident)
}

/// Normalizes each distinct relation label once.
#[derive(Debug, Default)]
pub struct RelationNameCache {
    names: HashMap<String, String>,
}

impl RelationNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_name(&mut self, label: &str) -> &str {
        self.names
            .entry(label.to_string())
            .or_insert_with(|| normalize(label))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
