use super::entities::{EntityCatalog, EntityId};
use crate::domain::RawCredit;

/// One element of a parent row's list, before it is joined to an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link<P> {
    pub parent: P,
    pub label: String,
}

/// A link after the join; `entity_id` is `None` when the label has no
/// entity, which the integrity filter treats as a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<P> {
    pub parent: P,
    pub label: String,
    pub entity_id: Option<EntityId>,
}

/// Expand one parent row into one link per element of its own list
pub fn fan_out<P, I>(parent: P, labels: I) -> impl Iterator<Item = Link<P>>
where
    P: Clone,
    I: IntoIterator<Item = String>,
{
    labels.into_iter().map(move |label| Link {
        parent: parent.clone(),
        label,
    })
}

/// Substitute each link's label with its entity id
pub fn resolve<P, I>(links: I, catalog: &EntityCatalog) -> Vec<Candidate<P>>
where
    I: IntoIterator<Item = Link<P>>,
{
    links
        .into_iter()
        .map(|link| {
            let entity_id = catalog.id_of(&link.label);
            Candidate {
                parent: link.parent,
                label: link.label,
                entity_id,
            }
        })
        .collect()
}

/// The columns of a raw credit row that survive into the `credits` table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreditContext {
    pub movie_id: String,
    pub person_id: i64,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl CreditContext {
    /// Source row identity for diagnostics
    pub fn describe(&self) -> String {
        format!("movie={} person={}", self.movie_id, self.person_id)
    }
}

impl From<&RawCredit> for CreditContext {
    fn from(raw: &RawCredit) -> Self {
        Self {
            movie_id: raw.movie_id.clone(),
            person_id: raw.person_id,
            name: raw.name.clone(),
            role: raw.role.clone(),
        }
    }
}
