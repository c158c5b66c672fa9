//! Card placement and column ordering.
//!
//! Everything here is pure list manipulation over a board's columns. Callers
//! own persistence, the grouping-field write and the audit note; the
//! [`MoveOutcome`] tells them which of those apply.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::board::Column;
use super::error::KanbanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved {
        from_index: usize,
        to_index: usize,
        cross_column: bool,
    },
    ItemNotFound,
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }

    pub fn is_cross_column(&self) -> bool {
        matches!(
            self,
            MoveOutcome::Moved {
                cross_column: true,
                ..
            }
        )
    }
}

pub fn column_position(columns: &[Column], name: &str) -> Result<usize, KanbanError> {
    columns
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| KanbanError::ColumnNotFound(name.to_string()))
}

/// Moves `item_id` from `from` to `to`, inserting it at `new_index`.
///
/// `old_index` is trusted only when it points at `item_id`; otherwise the item
/// is located by value. A `new_index` past the end of the destination list
/// appends. When the item is not in the source list nothing is touched and
/// [`MoveOutcome::ItemNotFound`] is returned.
pub fn move_card(
    columns: &mut [Column],
    item_id: &str,
    from: &str,
    to: &str,
    old_index: usize,
    new_index: usize,
) -> Result<MoveOutcome, KanbanError> {
    let from_pos = column_position(columns, from)?;
    let to_pos = column_position(columns, to)?;

    let source = &columns[from_pos].order;
    let resolved = if source.get(old_index).is_some_and(|id| id == item_id) {
        Some(old_index)
    } else {
        source.iter().position(|id| id == item_id)
    };

    let Some(from_index) = resolved else {
        tracing::warn!(
            item_id,
            from_column = from,
            to_column = to,
            old_index,
            "Card not found in source column; move skipped"
        );
        return Ok(MoveOutcome::ItemNotFound);
    };

    let item = columns[from_pos].order.remove(from_index);
    let cross_column = from_pos != to_pos;

    let destination = &mut columns[to_pos].order;
    if cross_column {
        // stale copy left behind by an earlier racing write
        destination.retain(|id| id != item_id);
    }
    let to_index = new_index.min(destination.len());
    destination.insert(to_index, item);

    Ok(MoveOutcome::Moved {
        from_index,
        to_index,
        cross_column,
    })
}

/// Puts `item_id` at the top of `column`.
pub fn add_card(columns: &mut [Column], item_id: &str, column: &str) -> Result<(), KanbanError> {
    let pos = column_position(columns, column)?;
    columns[pos].order.insert(0, item_id.to_string());
    Ok(())
}

/// Columns named in `desired` come first, in that order; the rest follow in
/// their original relative order. Column contents are never touched.
pub fn reorder_columns(columns: Vec<Column>, desired: &[String]) -> Vec<Column> {
    let mut remaining: Vec<Option<Column>> = columns.into_iter().map(Some).collect();
    let mut reordered = Vec::with_capacity(remaining.len());

    for name in desired {
        let slot = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|c| &c.name == name));
        if let Some(slot) = slot {
            reordered.extend(slot.take());
        }
    }

    reordered.extend(remaining.into_iter().flatten());
    reordered
}

/// Replaces order lists wholesale. Returns the names in `orders` that did not
/// match any column.
pub fn replace_orders(columns: &mut [Column], orders: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut unknown = Vec::new();
    for (name, items) in orders {
        match columns.iter_mut().find(|c| &c.name == name) {
            Some(column) => column.order = items.clone(),
            None => unknown.push(name.clone()),
        }
    }
    unknown
}

/// Sorts each column's items by their position in `ranking`. Items missing
/// from the ranking go first; ties keep their submitted order.
pub fn order_by_ranking(
    orders: &BTreeMap<String, Vec<String>>,
    ranking: &[String],
) -> BTreeMap<String, Vec<String>> {
    let rank: HashMap<&str, usize> = ranking
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    orders
        .iter()
        .map(|(column, items)| {
            let mut sorted = items.clone();
            sorted.sort_by_key(|item| rank.get(item.as_str()).copied());
            (column.clone(), sorted)
        })
        .collect()
}
