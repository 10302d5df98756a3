use std::collections::HashMap;
use std::hash::Hash;

/// Assigns consecutive integer ids to values in first-seen order.
///
/// The mapping is a bijection: every interned value has exactly one id and
/// every id in `base..base + len()` maps back to one value.
#[derive(Debug, Clone)]
pub struct IdInterner<T> {
    base: u32,
    ids: HashMap<T, u32>,
    values: Vec<T>,
}

impl<T: Eq + Hash + Clone> IdInterner<T> {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            ids: HashMap::new(),
            values: Vec::new(),
        }
    }

    pub fn intern(&mut self, value: &T) -> u32 {
        if let Some(id) = self.ids.get(value) {
            return *id;
        }
        let id = self.base + self.values.len() as u32;
        self.ids.insert(value.clone(), id);
        self.values.push(value.clone());
        id
    }

    pub fn id_of(&self, value: &T) -> Option<u32> {
        self.ids.get(value).copied()
    }

    pub fn value_of(&self, id: u32) -> Option<&T> {
        let offset = id.checked_sub(self.base)?;
        self.values.get(offset as usize)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.base + i as u32, v))
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|(id, _)| id)
    }
}
