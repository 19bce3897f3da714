//! Organization slug rules.

use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_SLUG_LEN: usize = 3;
pub const MAX_SLUG_LEN: usize = 64;

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}[a-z0-9]$").expect("slug pattern compiles")
    })
}

pub fn is_valid_slug(slug: &str) -> bool {
    slug_pattern().is_match(slug)
}

/// Lowercase, dash-separated, `[a-z0-9-]` only, no leading/trailing or
/// repeated dashes.
pub fn normalize_slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.to_lowercase().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_dash = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        }
    }
    out
}

/// Clamp to `MIN_SLUG_LEN..=MAX_SLUG_LEN`, padding short slugs with a random
/// suffix.
pub fn ensure_slug_length(slug: &str) -> String {
    let mut next = truncate(slug);

    if next.len() < MIN_SLUG_LEN {
        let base = if next.is_empty() { "org" } else { next.as_str() };
        next = normalize_slug(&format!("{}-{}", base, random_suffix(3)));
    }

    next = truncate(&next);

    if next.len() < MIN_SLUG_LEN {
        next = format!("org-{}", random_suffix(3));
    }
    next
}

/// The slug actually submitted: the user's input if it normalizes to
/// something, else one derived from the name. Never invalid.
pub fn build_valid_slug(raw_slug: &str, name: &str) -> String {
    let mut slug = normalize_slug(raw_slug);
    if slug.is_empty() {
        slug = normalize_slug(name);
    }

    let slug = ensure_slug_length(&slug);
    if is_valid_slug(&slug) {
        slug
    } else {
        format!("org-{}", random_suffix(3))
    }
}

fn truncate(slug: &str) -> String {
    if slug.len() <= MAX_SLUG_LEN {
        return slug.to_string();
    }
    // Normalized slugs are ASCII, so byte slicing is safe.
    slug[..MAX_SLUG_LEN].trim_end_matches('-').to_string()
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}
