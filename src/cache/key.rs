//! Cache key derivation for generation requests.
//!
//! A request is canonicalised (list fields sorted, absent fields empty,
//! delimiters escaped) and the canonical string hashed with a 32-bit
//! polynomial rolling hash (`h = h * 31 + c`, wrapping). `c` runs over
//! UTF-16 code units, so characters outside the Basic Multilingual Plane
//! contribute both surrogates. Keys are session scoped, not a stable format.
//!
//! # Collisions
//!
//! The hash is not collision-free. Two semantically different requests
//! that happen to hash to the same value share a cache entry, so the second
//! gets the first one's recipe until the entry expires. This is an accepted
//! approximation: keys are short and the cache is session scoped. Callers
//! that need exact keying can key on [`CacheKey::canonical`] instead.

use std::fmt;

use crate::types::GenerationRequest;

/// Prefix shared by every recipe cache key in a session store.
pub const CACHE_KEY_PREFIX: &str = "recipe_cache_";

const FIELD_SEPARATOR: char = '|';
const ITEM_SEPARATOR: char = ',';
const ESCAPE: char = '\\';

/// Stable identifier for a [`GenerationRequest`].
///
/// Equal for requests that differ only in the order of `ingredients` or
/// `dietary_restrictions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a request. Pure and total.
    pub fn derive(request: &GenerationRequest) -> Self {
        let canonical = Self::canonical(request);
        CacheKey(format!("{CACHE_KEY_PREFIX}{}", rolling_hash(&canonical)))
    }

    /// Canonical, order-independent form of a request.
    ///
    /// Five fields joined by `|`: sorted ingredients, sorted restrictions,
    /// cuisine, meal type, serving size. List items are joined by `,`.
    /// Absent fields are empty strings, never a placeholder word.
    pub fn canonical(request: &GenerationRequest) -> String {
        let fields = [
            sorted_list(request.ingredients()),
            sorted_list(request.dietary_restrictions()),
            request.cuisine_type().map(escape).unwrap_or_default(),
            request.meal_type().map(escape).unwrap_or_default(),
            request
                .serving_size()
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ];
        fields.join(&FIELD_SEPARATOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn sorted_list(items: &[String]) -> String {
    let mut escaped: Vec<String> = items.iter().map(|s| escape(s)).collect();
    escaped.sort();
    escaped.join(&ITEM_SEPARATOR.to_string())
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == ESCAPE || c == ITEM_SEPARATOR || c == FIELD_SEPARATOR {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// 32-bit polynomial rolling hash over UTF-16 code units.
fn rolling_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(i32::from(unit))
    })
}
