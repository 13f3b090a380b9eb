/// Key case-folding policy, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFold {
    /// Keys are stored and compared exactly as given.
    #[default]
    Preserve,
    Lower,
    Upper,
}

impl CaseFold {
    fn apply(self, key: &str) -> String {
        match self {
            CaseFold::Preserve => key.to_owned(),
            CaseFold::Lower => key.to_lowercase(),
            CaseFold::Upper => key.to_uppercase(),
        }
    }
}

/// An insertion-ordered associative container permitting duplicate keys.
///
/// Entries are addressable by integer position or by string key, where keyed
/// lookups always resolve to the *first* matching entry. The decomposer and
/// the fetch strategies lean on both the ordering and the duplicate-key
/// tolerance (the same column can legitimately appear twice in a statement),
/// which is why this is not an `indexmap`.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    keys: Vec<String>,
    values: Vec<String>,
    fold: CaseFold,
}

impl Registry {
    pub fn new(fold: CaseFold) -> Self {
        Self { keys: Vec::new(), values: Vec::new(), fold }
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.keys.push(self.fold.apply(key));
        self.values.push(value.to_owned());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Position of the first entry whose key matches.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        let key = self.fold.apply(key);
        self.keys.iter().position(|k| *k == key)
    }

    /// Value of the first entry whose key matches.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.index_of(key).map(|i| self.values[i].as_str())
    }

    /// Position of the first entry matching both key and value.
    pub fn index_of_pair(&self, key: &str, value: &str) -> Option<usize> {
        let key = self.fold.apply(key);
        self.keys
            .iter()
            .zip(&self.values)
            .position(|(k, v)| *k == key && v == value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    pub fn contains_pair(&self, key: &str, value: &str) -> bool {
        self.index_of_pair(key, value).is_some()
    }

    /// Number of entries sharing `key`.
    pub fn count_matches(&self, key: &str) -> usize {
        let key = self.fold.apply(key);
        self.keys.iter().filter(|k| **k == key).count()
    }

    pub fn remove_at(&mut self, index: usize) -> Option<(String, String)> {
        if index >= self.keys.len() {
            return None;
        }
        Some((self.keys.remove(index), self.values.remove(index)))
    }

    /// Remove the first entry whose key matches.
    pub fn remove_key(&mut self, key: &str) -> Option<(String, String)> {
        self.index_of(key).and_then(|i| self.remove_at(i))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}
