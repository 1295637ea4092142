use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::database::{DatabaseError, Store};

/// Outcome of a bulk feedback delete. Ids keep the caller's order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub requested: usize,
    pub cleared: usize,
    pub cleared_ids: Vec<Uuid>,
    pub failed_ids: Vec<Uuid>,
}

async fn delete_owned(store: &dyn Store, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
    match store.find_feedback(id).await? {
        Some(feedback) if feedback.user_id == user_id => store.delete_feedback(id).await,
        _ => Ok(false),
    }
}

/// Delete each of the user's tickets independently.
///
/// A missing id, someone else's ticket or a store error only fails that id;
/// the rest still go through. At most `concurrency` deletes are in flight.
pub async fn clear_feedbacks(store: &dyn Store, user_id: Uuid, ids: &[Uuid], concurrency: usize) -> ClearReport {
    let mut outcomes: Vec<(usize, Uuid, bool)> = stream::iter(ids.iter().copied().enumerate())
        .map(|(index, id)| async move {
            let deleted = match delete_owned(store, user_id, id).await {
                Ok(deleted) => deleted,
                Err(e) => {
                    tracing::error!(feedback_id = %id, error = %e, "Feedback delete failed");
                    false
                }
            };
            (index, id, deleted)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut report = ClearReport {
        requested: ids.len(),
        ..ClearReport::default()
    };
    for (_, id, deleted) in outcomes {
        if deleted {
            report.cleared_ids.push(id);
        } else {
            report.failed_ids.push(id);
        }
    }
    report.cleared = report.cleared_ids.len();
    report
}

/// Feedback ids the user has already seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSet {
    ids: BTreeSet<Uuid>,
}

impl ReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_read(&mut self, id: Uuid) -> bool {
        self.ids.insert(id)
    }

    pub fn is_read(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Read ids among `visible`, in the order given.
    pub fn select_read<'a>(&self, visible: impl IntoIterator<Item = &'a Uuid>) -> Vec<Uuid> {
        visible.into_iter().filter(|id| self.is_read(id)).copied().collect()
    }

    /// Forget ids the server actually deleted. Failed ids stay marked.
    pub fn apply(&mut self, report: &ClearReport) {
        for id in &report.cleared_ids {
            self.ids.remove(id);
        }
    }
}

impl FromIterator<Uuid> for ReadSet {
    fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn partial_failure_is_reported_per_id() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut feedbacks = Vec::new();
        for n in 0..5 {
            let row = store
                .insert_feedback(user, format!("note {}", n), "wechat".to_string())
                .await
                .unwrap();
            feedbacks.push(row.id);
        }
        let foreign = store
            .insert_feedback(other, "not yours".to_string(), "mail".to_string())
            .await
            .unwrap();

        let mut read: ReadSet = [feedbacks[0], feedbacks[2], foreign.id].into_iter().collect();
        let targets = read.select_read(feedbacks.iter().chain(std::iter::once(&foreign.id)));
        assert_eq!(targets.len(), 3);

        let report = clear_feedbacks(&store, user, &targets, 2).await;
        assert_eq!(report.requested, 3);
        assert_eq!(report.cleared, 2);
        assert_eq!(report.cleared_ids, vec![feedbacks[0], feedbacks[2]]);
        assert_eq!(report.failed_ids, vec![foreign.id]);

        read.apply(&report);
        assert_eq!(read.len(), 1);
        assert!(read.is_read(&foreign.id));
        assert!(store.find_feedback(foreign.id).await.unwrap().is_some());
        assert_eq!(store.list_feedbacks(Some(user)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn zero_concurrency_still_makes_progress() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let row = store
            .insert_feedback(user, "x".to_string(), "y".to_string())
            .await
            .unwrap();
        let report = clear_feedbacks(&store, user, &[row.id], 0).await;
        assert_eq!(report.cleared, 1);
    }
}
