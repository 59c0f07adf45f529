use serde::{Deserialize, Serialize};

/// Owned sequence of child selectors leading from a root to a subexpression.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnedPath(Vec<usize>);

impl OwnedPath {
    pub fn as_path(&self) -> Path<'_> {
        Path(&self.0)
    }

    /// Adds a new position at the end of the path
    pub fn push(&mut self, location: usize) {
        self.0.push(location)
    }

    /// Returns a copy of this path extended by `location`
    pub fn joined(&self, location: usize) -> Self {
        let mut path = self.clone();
        path.push(location);
        path
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for OwnedPath {
    fn from(selectors: Vec<usize>) -> Self {
        Self(selectors)
    }
}

impl std::fmt::Display for OwnedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_path().fmt(f)
    }
}

/// Path to a subexpression in an expression
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Path<'p>(&'p [usize]);

impl<'p> Path<'p> {
    /// Returns this path without its first selector; the root path stays empty
    pub fn child(&self) -> Self {
        Path(self.0.get(1..).unwrap_or_default())
    }

    /// Returns the first element on the path, or `None` if the path is empty
    pub fn head(&self) -> Option<usize> {
        self.0.first().copied()
    }

    /// Returns the path of the parent, or `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Path(init))
    }

    /// Returns the last selector, i.e. which child of its parent the target is
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn selectors(&self) -> &'p [usize] {
        self.0
    }

    pub fn to_owned_path(&self) -> OwnedPath {
        OwnedPath(self.0.to_vec())
    }
}

impl std::fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/")?;
        for (i, selector) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}
