//! Syllable-based name generation.
//!
//! A name is a start, an optional middle, and a gendered ending, drawn
//! from the simulation RNG and capitalised.

use hamlet_types::Gender;
use rand::Rng;
use rand::seq::IndexedRandom;

const STARTS: &[&str] = &[
    "al", "bar", "cor", "dal", "el", "fen", "gar", "hal", "is", "jor", "kel", "lor", "mar", "nor",
    "or", "per", "quin", "ros", "sel", "tam", "ul", "val", "wen", "yor",
];

const MIDDLES: &[&str] = &["a", "e", "i", "o", "an", "el", "ir", "on", "ri", "ve"];

const MASCULINE_ENDS: &[&str] = &[
    "ric", "don", "mund", "ston", "win", "bert", "ald", "wick", "gar", "ton",
];

const FEMININE_ENDS: &[&str] = &["a", "ia", "elle", "ine", "wyn", "ara", "eth", "lie", "ora", "yn"];

/// Chance a name includes a middle syllable.
const MIDDLE_CHANCE: f64 = 0.5;

/// Generate a capitalised name for `gender`.
pub fn generate_name(gender: Gender, rng: &mut impl Rng) -> String {
    let ends = match gender {
        Gender::Masculine => MASCULINE_ENDS,
        Gender::Feminine => FEMININE_ENDS,
    };

    let mut name = String::new();
    name.push_str(STARTS.choose(rng).copied().unwrap_or("al"));
    if rng.random_bool(MIDDLE_CHANCE) {
        name.push_str(MIDDLES.choose(rng).copied().unwrap_or("a"));
    }
    name.push_str(ends.choose(rng).copied().unwrap_or("n"));
    capitalise(&name)
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
