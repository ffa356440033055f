//! The pending query: criteria plus relations to eager load
//!
//! A [`Scope`] is everything a repository has accumulated since its last
//! terminal call. Terminal calls move it out of the repository before doing
//! anything that can fail, so the criteria are cleared no matter how the call
//! ends. Relations are handed back unless the repository is configured to
//! consume them.

use super::criteria::Criteria;
use super::traits::{QueryTarget, RepositoryResult};

/// Relation names accepted by [`Repository::with`](super::Repository::with)
///
/// Converts from a single name or from any sequence of names.
///
/// ```rust
/// use model_repository::repository::Relations;
///
/// assert_eq!(Relations::from("posts").names(), ["posts"]);
/// assert_eq!(Relations::from(["posts", "team"]).names().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations(Vec<String>);

impl Relations {
    /// The relation names, in the order given
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Whether no relation was named
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Relations {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for Relations {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for Relations {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for Relations {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Relations {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Relations {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }
}

/// Accumulated, not yet executed query state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    criteria: Criteria,
    eager: Option<Relations>,
}

impl Scope {
    /// An empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated criteria
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Mutable access for accumulation
    pub fn criteria_mut(&mut self) -> &mut Criteria {
        &mut self.criteria
    }

    /// Relations registered for eager loading, if any
    pub fn relations(&self) -> Option<&Relations> {
        self.eager.as_ref()
    }

    /// Replace the relations to eager load
    ///
    /// Each call replaces the previous set rather than extending it.
    pub fn set_relations(&mut self, relations: Relations) {
        self.eager = Some(relations);
    }

    /// Drop the criteria, keeping the registered relations
    pub(crate) fn keep_relations_only(self) -> Self {
        Self {
            criteria: Criteria::new(),
            eager: self.eager,
        }
    }

    /// Whether nothing has been accumulated
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty() && self.eager.is_none()
    }

    /// Apply the eager loads to `target`
    ///
    /// An empty relation list leaves the target untouched.
    pub fn eager_load<T: QueryTarget>(&self, target: T) -> RepositoryResult<T> {
        match &self.eager {
            Some(relations) if !relations.is_empty() => target.with(relations.names()),
            _ => Ok(target),
        }
    }

    /// Apply eager loads, then filters, then ordering
    pub fn apply<T: QueryTarget>(&self, target: T) -> RepositoryResult<T> {
        let target = self.eager_load(target)?;
        self.criteria.apply(target)
    }
}
