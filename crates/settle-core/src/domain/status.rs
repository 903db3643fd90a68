//! Status sets used by wait specifications.
//!
//! Statuses are opaque tokens compared by equality only. Sets are tiny
//! (a handful of labels), so a `Vec` keeps the bound at `PartialEq`.

/// An ordered, duplicate-free set of status labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSet<S> {
    items: Vec<S>,
}

impl<S: PartialEq> StatusSet<S> {
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    pub fn contains(&self, status: &S) -> bool {
        self.items.iter().any(|s| s == status)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// First element of `self` that is also in `other`.
    pub fn first_shared<'a>(&'a self, other: &StatusSet<S>) -> Option<&'a S> {
        self.items.iter().find(|s| other.contains(s))
    }

    pub fn to_vec(&self) -> Vec<S>
    where
        S: Clone,
    {
        self.items.clone()
    }
}

impl<S: PartialEq> Default for StatusSet<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: PartialEq> FromIterator<S> for StatusSet<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut items = Vec::new();
        for status in iter {
            if !items.contains(&status) {
                items.push(status);
            }
        }
        Self { items }
    }
}

impl<S: PartialEq, const N: usize> From<[S; N]> for StatusSet<S> {
    fn from(items: [S; N]) -> Self {
        items.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_dropped() {
        let set: StatusSet<&str> = ["Deleting", "Normal", "Deleting"].into();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&"Normal"));
        assert!(!set.contains(&"Updated"));
    }

    #[test]
    fn first_shared_finds_overlap() {
        let pending: StatusSet<&str> = ["Pending", "Normal"].into();
        let target: StatusSet<&str> = ["Normal"].into();
        assert_eq!(pending.first_shared(&target), Some(&"Normal"));
        assert_eq!(target.first_shared(&StatusSet::empty()), None);
    }
}
