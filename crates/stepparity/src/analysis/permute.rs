//! Legal foot-to-column assignments for one occupied-column pattern.

use std::collections::HashMap;

use crate::foot::{column_of, Foot, FEET};
use crate::layout::StageLayout;
use crate::rows::Row;

/// Every legal assignment of foot parts to the columns set in `mask`.
///
/// Iterative backtracking over occupied columns (ascending), trying feet in `FEET` order.
/// A foot part is used at most once; a heel/toe pair must pass the bracket check (pruned
/// as soon as both are placed); a toe without its heel is rejected at the leaf.
pub fn enumerate_permutations(layout: &StageLayout, mask: u32) -> Vec<Vec<Foot>> {
    let n = layout.column_count();
    let occupied: Vec<usize> = (0..n).filter(|&c| mask & (1 << c) != 0).collect();
    let mut columns = vec![Foot::None; n];
    let mut out = Vec::new();
    if occupied.is_empty() {
        out.push(columns);
        return out;
    }

    // cursor[d]: next index into FEET to try at depth d
    let mut cursor = vec![0usize; occupied.len()];
    let mut depth = 0usize;
    loop {
        let col = occupied[depth];
        columns[col] = Foot::None;
        let mut placed = false;
        while cursor[depth] < FEET.len() {
            let foot = FEET[cursor[depth]];
            cursor[depth] += 1;
            if columns.contains(&foot) {
                continue;
            }
            if let Some(partner) = column_of(&columns, foot.other_part()) {
                if !layout.bracket_check(col, partner) {
                    continue;
                }
            }
            columns[col] = foot;
            placed = true;
            break;
        }
        if !placed {
            cursor[depth] = 0;
            if depth == 0 {
                break;
            }
            depth -= 1;
            continue;
        }
        if depth + 1 < occupied.len() {
            depth += 1;
        } else if toes_have_heels(&columns) {
            out.push(columns.clone());
        }
    }
    out
}

fn toes_have_heels(columns: &[Foot]) -> bool {
    [Foot::LeftToe, Foot::RightToe]
        .into_iter()
        .all(|toe| !columns.contains(&toe) || columns.contains(&toe.heel()))
}

/// Permutation sets memoized by occupied-column mask.
#[derive(Clone, Debug, Default)]
pub struct PermutationCache {
    by_mask: HashMap<u32, Vec<Vec<Foot>>>,
}

impl PermutationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_row(&mut self, layout: &StageLayout, row: &Row) -> &[Vec<Foot>] {
        let mask = row.occupied_mask();
        self.by_mask
            .entry(mask)
            .or_insert_with(|| enumerate_permutations(layout, mask))
    }

    pub fn len(&self) -> usize {
        self.by_mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mask.is_empty()
    }
}
