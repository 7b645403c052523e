use std::collections::HashMap;

use crate::domain::{EntityRow, Table};

/// Dense, 1-based surrogate key as assigned by the catalog
pub type EntityId = usize;

/// Distinct labels of one entity category with their surrogate keys.
///
/// Ids follow first-appearance order over the whole corpus: the first
/// distinct label seen gets 1, the next new one 2, and so on. Feeding the
/// same labels in the same order always yields the same ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCatalog {
    labels: Vec<String>,
    index: HashMap<String, EntityId>,
}

impl EntityCatalog {
    /// Build a catalog from every label of a category, in corpus order.
    /// Empty labels are discarded.
    pub fn extract<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() || catalog.index.contains_key(label) {
                continue;
            }
            catalog.labels.push(label.to_string());
            catalog.index.insert(label.to_string(), catalog.labels.len());
        }
        catalog
    }

    pub fn id_of(&self, label: &str) -> Option<EntityId> {
        self.index.get(label).copied()
    }

    pub fn label_of(&self, id: EntityId) -> Option<&str> {
        id.checked_sub(1)
            .and_then(|idx| self.labels.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(id, label)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (idx + 1, label.as_str()))
    }

    /// Materialize the entity table.
    ///
    /// Ids that do not fit the stored integer type are left out; junction
    /// rows pointing at them are dropped by the integrity filter with the
    /// same conversion.
    pub fn to_table<R: EntityRow>(&self, name: &'static str) -> Table<R> {
        let rows = self
            .iter()
            .filter_map(|(id, label)| i64::try_from(id).ok().map(|id| R::from_entry(id, label)))
            .collect();
        Table::new(name, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Genre;

    #[test]
    fn test_ids_are_dense_and_follow_first_appearance() {
        let catalog = EntityCatalog::extract(["drama", "comedy", "drama", "crime", "comedy"]);

        let entries: Vec<(EntityId, &str)> = catalog.iter().collect();
        assert_eq!(entries, vec![(1, "drama"), (2, "comedy"), (3, "crime")]);
        assert_eq!(catalog.id_of("crime"), Some(3));
        assert_eq!(catalog.id_of("horror"), None);
        assert_eq!(catalog.label_of(2), Some("comedy"));
        assert_eq!(catalog.label_of(0), None);
    }

    #[test]
    fn test_empty_labels_are_discarded() {
        let catalog = EntityCatalog::extract(["", "Ben", "", "Narrator"]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.id_of(""), None);
        assert_eq!(catalog.id_of("Ben"), Some(1));
    }

    #[test]
    fn test_extraction_is_reproducible() {
        let corpus = vec![
            vec!["documentation", "music"],
            vec!["music", "drama"],
            vec!["comedy"],
        ];
        let first = EntityCatalog::extract(corpus.iter().flatten());
        let second = EntityCatalog::extract(corpus.iter().flatten());
        assert_eq!(first, second);
        assert_eq!(first.id_of("drama"), Some(3));
    }

    #[test]
    fn test_order_is_global_across_rows_not_per_row() {
        // Row 2 lists "b" before "a", but "a" was already seen in row 1
        let rows = vec![vec!["a"], vec!["b", "a"], vec!["c", "b"]];
        let catalog = EntityCatalog::extract(rows.iter().flatten());
        let labels: Vec<&str> = catalog.iter().map(|(_, l)| l).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_to_table() {
        let catalog = EntityCatalog::extract(["drama", "comedy"]);
        let table: Table<Genre> = catalog.to_table("genres");
        assert_eq!(table.name(), "genres");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], Genre::from_entry(2, "comedy"));
    }
}
