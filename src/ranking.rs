use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::records::{JournalEntry, SavedMealUse};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UsageRank {
    pub id: i64,
    pub count: usize,
    pub last_used_at: DateTime<Utc>,
}

/// Ranks ids by how often they occur. Equal counts go to the most recently
/// used id first, then to the smaller id, so the result never depends on the
/// order of `items`.
pub fn rank_by_frequency<T, K, W>(items: &[T], id_of: K, used_at: W, limit: usize) -> Vec<UsageRank>
where
    K: Fn(&T) -> i64,
    W: Fn(&T) -> DateTime<Utc>,
{
    let mut counts: HashMap<i64, (usize, DateTime<Utc>)> = HashMap::new();
    for item in items {
        let at = used_at(item);
        let slot = counts.entry(id_of(item)).or_insert((0, at));
        slot.0 += 1;
        if at > slot.1 {
            slot.1 = at;
        }
    }

    let mut ranked: Vec<UsageRank> = counts
        .into_iter()
        .map(|(id, (count, last_used_at))| UsageRank {
            id,
            count,
            last_used_at,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(b.last_used_at.cmp(&a.last_used_at))
            .then(a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}

pub fn most_logged_recipes(entries: &[JournalEntry], limit: usize) -> Vec<UsageRank> {
    rank_by_frequency(entries, |e| e.recipe_id, |e| e.logged_at, limit)
}

pub fn most_used_saved_meals(uses: &[SavedMealUse], limit: usize) -> Vec<UsageRank> {
    rank_by_frequency(uses, |u| u.saved_meal_id, |u| u.used_at, limit)
}
