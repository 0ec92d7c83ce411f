use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

/// The monotonic version number of a node.
pub type Version = u64;

/// An identity token naming a node's line of history.
///
/// An identity is a dotted sequence of integers recording the branch points
/// on the way from the line's original node to this one. Two identities are
/// *related* when they share their leading component; the [`distance`]
/// between related identities counts the steps separating them from their
/// closest common form, so smaller values mean closer version ancestry.
///
/// The delta engine treats identities as opaque: it only ever compares them
/// for equality and ranks replace candidates by distance.
///
/// [`distance`]: NodeId::distance
///
/// ## Examples
/// ```
/// use libtreedelta::NodeId;
///
/// let base = NodeId::from([1, 2]);
/// let near = NodeId::from([1, 2, 1]);
/// let far = NodeId::from([2]);
///
/// assert_eq!(Some(0), base.distance(&base));
/// assert_eq!(Some(1), base.distance(&near));
/// assert_eq!(None, base.distance(&far));
/// ```
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(Box<[u64]>);

impl NodeId {
    /// The number of steps separating `self` and `other` on their shared
    /// line of history, or `None` when the identities are unrelated.
    ///
    /// `distance(a, a)` is always `Some(0)`. The engine uses this value
    /// only as a ranking heuristic for the expected size of a delta
    /// between the two nodes.
    pub fn distance(&self, other: &NodeId) -> Option<u64> {
        if self == other {
            return Some(0);
        }
        if self.0.first().is_none() || self.0.first() != other.0.first() {
            return None;
        }
        let common = self
            .0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count();
        Some((self.0.len() - common + other.0.len() - common) as u64)
    }

    /// Whether `self` and `other` share a line of history.
    #[inline]
    pub fn is_related_to(&self, other: &NodeId) -> bool {
        self.distance(other).is_some()
    }

    /// The components of this identity, most significant first.
    #[inline]
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl From<Vec<u64>> for NodeId {
    #[inline]
    fn from(value: Vec<u64>) -> Self {
        Self(value.into_boxed_slice())
    }
}

impl From<&[u64]> for NodeId {
    #[inline]
    fn from(value: &[u64]) -> Self {
        Self(value.into())
    }
}

impl<const N: usize> From<[u64; N]> for NodeId {
    #[inline]
    fn from(value: [u64; N]) -> Self {
        Self(value.into())
    }
}

impl From<u64> for NodeId {
    /// ## Examples
    /// ```
    /// use libtreedelta::NodeId;
    ///
    /// assert_eq!(NodeId::from([7]), NodeId::from(7));
    /// ```
    #[inline]
    fn from(value: u64) -> Self {
        Self(Box::new([value]))
    }
}

impl Display for NodeId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut components = self.0.iter();
        if let Some(first) = components.next() {
            write!(f, "{first}")?;
            for c in components {
                write!(f, ".{c}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for NodeId {
    type Err = ParseIntError;

    /// ## Examples
    /// ```
    /// use libtreedelta::NodeId;
    ///
    /// let id: NodeId = "1.2.3".parse().unwrap();
    /// assert_eq!(NodeId::from([1, 2, 3]), id);
    /// ```
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self(Box::new([])));
        }
        s.split('.')
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let id = NodeId::from([3, 1, 4]);
        assert_eq!(Some(0), id.distance(&id));
        assert_eq!(Some(0), NodeId::from([] as [u64; 0]).distance(&NodeId::from(vec![])));
    }

    #[test]
    fn distance_counts_both_sides() {
        let a = NodeId::from([1, 2, 3]);
        let b = NodeId::from([1, 2]);
        let c = NodeId::from([1, 5, 6]);
        assert_eq!(Some(1), a.distance(&b));
        assert_eq!(Some(1), b.distance(&a));
        assert_eq!(Some(3), a.distance(&c));
    }

    #[test]
    fn different_lines_are_unrelated() {
        let a = NodeId::from([1, 2]);
        let b = NodeId::from([2, 2]);
        assert_eq!(None, a.distance(&b));
        assert!(!a.is_related_to(&b));
        assert_eq!(None, NodeId::from(vec![]).distance(&a));
    }

    #[test]
    fn display_round_trip() {
        for s in ["", "7", "1.2.3"] {
            let id: NodeId = s.parse().unwrap();
            assert_eq!(s, id.to_string());
        }
        assert!("1.x".parse::<NodeId>().is_err());
    }
}
