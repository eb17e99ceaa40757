use crate::error::Error;
use crate::features::FeatureKey;
use std::collections::HashSet;

/// The closed alphabet of the captcha, in canonical match order.
pub const ALPHABET: &str = "ABCEFGHJKLMNPRTUXY";

/// The training_data! macro embeds the per-letter key lists in the library.
macro_rules! training_data {
    ( $( $x:expr ),* ) => {
            [$(
                   ($x, include_str!(concat!("training_data/", $x, ".json"))),
            )*]
        };
}

const TRAINING_SOURCES: &[(&str, &str)] = &training_data![
    "A", "B", "C", "E", "F", "G", "H", "J", "K", "L", "M", "N", "P", "R", "T", "U", "X", "Y"
];

/// Known feature keys for every letter of the alphabet.
///
/// Built once and never mutated afterwards, so a shared reference can be
/// used from any number of threads without locking.
pub struct TrainingSet {
    sets: Vec<(char, HashSet<FeatureKey>)>,
}

impl TrainingSet {
    /// The training data embedded in the library.
    pub fn embedded() -> TrainingSet {
        let sources = TRAINING_SOURCES
            .iter()
            .filter_map(|&(letter, json)| letter.chars().next().map(|c| (c, json)));
        // can not fail because the key lists are embedded
        TrainingSet::from_json_sources(sources).unwrap()
    }

    /// Build a training set from per-letter JSON sources, each a list of
    /// key strings.
    pub fn from_json_sources<'a, I>(sources: I) -> Result<TrainingSet, Error>
    where
        I: IntoIterator<Item = (char, &'a str)>,
    {
        let mut sets = Vec::new();
        for (letter, json) in sources {
            let keys: Vec<String> = serde_json::from_str(json)?;
            let keys: HashSet<FeatureKey> = keys.into_iter().map(FeatureKey::from).collect();
            sets.push((letter, keys));
        }
        Ok(TrainingSet { sets })
    }

    /// Build a training set from already extracted keys.
    pub fn from_keys<I, K>(entries: I) -> TrainingSet
    where
        I: IntoIterator<Item = (char, K)>,
        K: IntoIterator<Item = FeatureKey>,
    {
        let sets = entries
            .into_iter()
            .map(|(letter, keys)| (letter, keys.into_iter().collect()))
            .collect();
        TrainingSet { sets }
    }

    /// Resolve a feature key to its letter.
    ///
    /// The letters are scanned in canonical order and the first set that
    /// contains the key wins.
    pub fn lookup(&self, key: &FeatureKey) -> Option<char> {
        self.sets
            .iter()
            .find(|(_, keys)| keys.contains(key))
            .map(|(letter, _)| *letter)
    }

    /// The per-letter key sets, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &HashSet<FeatureKey>)> {
        self.sets.iter().map(|(letter, keys)| (*letter, keys))
    }
}
