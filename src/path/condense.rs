use crate::path::dirent::Dirent;

/// Rewrites a set of target dirents as a common ancestor plus relative
/// remainders.
///
/// The common part is the longest ancestor shared by every target; each
/// remainder is the corresponding target with that ancestor (and its
/// separator) stripped, in input order. With `remove_redundancies`, any
/// target that is a descendant of another target is dropped, as is any
/// target equal to the common ancestor. Targets that share no ancestor at
/// all are returned unchanged next to an empty common part.
///
/// Returns `None` when `targets` is empty; a single target condenses to
/// itself with no remainders.
///
/// ## Examples
/// ```
/// use libtreedelta::{condense_targets, Dirent};
///
/// let targets = [
///     Dirent::from("/a/b"),
///     Dirent::from("/a/b/c"),
///     Dirent::from("/a/d"),
/// ];
/// let (common, rest) = condense_targets(&targets, true).unwrap();
/// assert_eq!("/a", common);
/// assert_eq!(vec!["b", "d"], rest);
/// ```
pub fn condense_targets(
    targets: &[Dirent],
    remove_redundancies: bool,
) -> Option<(Dirent, Vec<Dirent>)> {
    let first = targets.first()?;

    let mut common = first.clone();
    for target in &targets[1..] {
        common = common.longest_common_ancestor(target);
    }
    if targets.len() == 1 {
        return Some((common, Vec::new()));
    }

    let mut removed = vec![false; targets.len()];
    if remove_redundancies {
        // A target whose common part with another target is that other
        // target is a descendant of it.
        for i in 0..targets.len() {
            if removed[i] {
                continue;
            }
            for j in i + 1..targets.len() {
                if removed[j] {
                    continue;
                }
                let ancestor = targets[i].longest_common_ancestor(&targets[j]);
                if ancestor.is_empty() {
                    continue;
                }
                if ancestor == targets[i] {
                    removed[j] = true;
                } else if ancestor == targets[j] {
                    removed[i] = true;
                }
            }
        }
        for i in 0..targets.len() {
            if targets[i] == common && !removed[i] {
                removed[i] = true;
            }
        }
    }

    let common_is_root = common.is_root();
    let remainders = targets
        .iter()
        .zip(&removed)
        .filter(|(_, removed)| !**removed)
        .map(|(target, _)| {
            let mut rest = &target.as_str()[common.as_str().len()..];
            // A root ancestor already ends at the separator.
            if !rest.is_empty() && !common.is_empty() && !common_is_root {
                rest = &rest[1..];
            }
            Dirent::from_canonical(rest)
        })
        .collect();

    Some((common, remainders))
}
