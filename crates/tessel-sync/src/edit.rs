//! Edit scripts between two versions of a list whose elements carry ids.

use rustc_hash::{FxHashMap, FxHashSet};
use tessel_tree::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Edit {
    /// Reuse the next `n` baseline elements unchanged.
    Keep(u32),
    /// Skip the next `n` baseline elements.
    Delete(u32),
    /// `after` replaces the next baseline element, which is `before`.
    Update { after: usize, before: usize },
    /// `after` is the baseline element at `before`, out of order.
    Move { after: usize, before: usize },
    Insert { after: usize },
}

/// Computes the edits turning `before` into `after`.
///
/// Elements are matched by id. Matched elements whose baseline positions form
/// the longest increasing subsequence stay in place, every other match is a
/// move. An id repeated in `after` takes part in the subsequence only at its
/// first occurrence; later ones move the same baseline element again.
pub(crate) fn script(
    after: &[NodeId],
    before: &[NodeId],
    same: impl Fn(usize, usize) -> bool,
) -> Vec<Edit> {
    let mut positions = FxHashMap::default();
    for (index, id) in before.iter().enumerate() {
        positions.entry(*id).or_insert(index);
    }
    let mut seen = FxHashSet::default();
    let mut matches = Vec::with_capacity(after.len());
    let mut repeats = Vec::with_capacity(after.len());
    for id in after {
        let position = positions.get(id).copied();
        let first = seen.insert(*id);
        matches.push(position.filter(|_| first));
        repeats.push(position.filter(|_| !first));
    }
    let anchored = anchored(&matches);

    let mut edits = Vec::new();
    let mut cursor = 0;
    for (index, matched) in matches.iter().enumerate() {
        match *matched {
            Some(position) if anchored[index] => {
                if position > cursor {
                    push(&mut edits, Edit::Delete((position - cursor) as u32));
                }
                if same(index, position) {
                    push(&mut edits, Edit::Keep(1));
                } else {
                    edits.push(Edit::Update { after: index, before: position });
                }
                cursor = position + 1;
            }
            Some(position) => edits.push(Edit::Move { after: index, before: position }),
            None => match repeats[index] {
                Some(position) => edits.push(Edit::Move { after: index, before: position }),
                None => edits.push(Edit::Insert { after: index }),
            },
        }
    }
    if before.len() > cursor {
        push(&mut edits, Edit::Delete((before.len() - cursor) as u32));
    }
    edits
}

/// Merges consecutive keeps and deletes into runs.
fn push(edits: &mut Vec<Edit>, edit: Edit) {
    match (edits.last_mut(), edit) {
        (Some(Edit::Keep(run)), Edit::Keep(n)) | (Some(Edit::Delete(run)), Edit::Delete(n)) => {
            *run += n;
        }
        _ => edits.push(edit),
    }
}

/// Marks the elements of a longest strictly increasing subsequence of the
/// matched positions, in O(n log n).
fn anchored(matches: &[Option<usize>]) -> Vec<bool> {
    // tails[k]: index into `matches` of the smallest tail of an increasing
    // run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; matches.len()];
    for (index, position) in matches.iter().enumerate() {
        let Some(position) = *position else { continue };
        let len = tails.partition_point(|&tail| matches[tail] < Some(position));
        previous[index] = len.checked_sub(1).map(|k| tails[k]);
        if len == tails.len() {
            tails.push(index);
        } else {
            tails[len] = index;
        }
    }

    let mut anchored = vec![false; matches.len()];
    let mut next = tails.last().copied();
    while let Some(index) = next {
        anchored[index] = true;
        next = previous[index];
    }
    anchored
}
