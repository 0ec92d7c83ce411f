use crate::error::Result;
use crate::tree::PropertyList;
use std::cmp::Ordering;

/// Emits the property changes that turn `source` into `target`.
///
/// Both lists are walked in lockstep. For every property whose value
/// differs between the two lists, and for every property present on only
/// one side, exactly one call to `change` is made, in ascending name
/// order: `Some(value)` sets the property, `None` deletes it. Properties
/// with equal values on both sides are skipped. An absent `source` is
/// treated as an empty list.
///
/// ## Examples
/// ```
/// use libtreedelta::{diff_properties, PropertyList};
///
/// let source: PropertyList = [("a", "1"), ("b", "2")].into_iter().collect();
/// let target: PropertyList = [("b", "3"), ("c", "4")].into_iter().collect();
///
/// let mut changes = Vec::new();
/// diff_properties(Some(&source), &target, |name, value| {
///     changes.push((name.to_owned(), value.map(<[u8]>::to_vec)));
///     Ok(())
/// })
/// .unwrap();
///
/// assert_eq!(
///     vec![
///         ("a".to_owned(), None),
///         ("b".to_owned(), Some(b"3".to_vec())),
///         ("c".to_owned(), Some(b"4".to_vec())),
///     ],
///     changes
/// );
/// ```
pub fn diff_properties<F>(
    source: Option<&PropertyList>,
    target: &PropertyList,
    mut change: F,
) -> Result<()>
where
    F: FnMut(&str, Option<&[u8]>) -> Result<()>,
{
    let mut source_iter = source.into_iter().flat_map(PropertyList::iter).peekable();
    let mut target_iter = target.iter().peekable();

    loop {
        match (source_iter.peek().copied(), target_iter.peek().copied()) {
            (None, None) => break,
            (Some((name, _)), None) => {
                change(name, None)?;
                source_iter.next();
            }
            (None, Some((name, value))) => {
                change(name, Some(value))?;
                target_iter.next();
            }
            (Some((source_name, source_value)), Some((target_name, target_value))) => {
                match source_name.cmp(target_name) {
                    Ordering::Equal => {
                        if source_value != target_value {
                            change(target_name, Some(target_value))?;
                        }
                        source_iter.next();
                        target_iter.next();
                    }
                    Ordering::Less => {
                        change(source_name, None)?;
                        source_iter.next();
                    }
                    Ordering::Greater => {
                        change(target_name, Some(target_value))?;
                        target_iter.next();
                    }
                }
            }
        }
    }
    Ok(())
}
