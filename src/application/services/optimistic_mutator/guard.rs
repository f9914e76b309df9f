use crate::domain::value_objects::EntityId;
use crate::shared::{AppError, ConcurrencyPolicy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = HashMap<EntityId, Arc<Mutex<()>>>;

/// Per-entity in-flight locks used by the guarded concurrency policies.
#[derive(Default)]
pub(crate) struct InFlightGuards {
    locks: Arc<StdMutex<LockTable>>,
}

/// Held for the whole lifetime of one guarded mutation.
pub(crate) struct InFlightPermit {
    table: Arc<StdMutex<LockTable>>,
    id: EntityId,
    lock: Arc<Mutex<()>>,
    permit: Option<OwnedMutexGuard<()>>,
}

fn lock_table(table: &StdMutex<LockTable>) -> MutexGuard<'_, LockTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InFlightGuards {
    pub(crate) async fn acquire(
        &self,
        id: &EntityId,
        policy: ConcurrencyPolicy,
    ) -> Result<Option<InFlightPermit>, AppError> {
        let (lock, permit) = match policy {
            ConcurrencyPolicy::Unguarded => return Ok(None),
            ConcurrencyPolicy::RejectWhilePending => {
                let lock = self.lock_for(id);
                match Arc::clone(&lock).try_lock_owned() {
                    Ok(permit) => (lock, permit),
                    Err(_) => {
                        remove_if_idle(&self.locks, id, &lock);
                        return Err(AppError::Conflict(format!(
                            "{id} already has a change in progress"
                        )));
                    }
                }
            }
            ConcurrencyPolicy::QueuePerEntity => {
                let lock = self.lock_for(id);
                let permit = Arc::clone(&lock).lock_owned().await;
                (lock, permit)
            }
        };

        Ok(Some(InFlightPermit {
            table: Arc::clone(&self.locks),
            id: id.clone(),
            lock,
            permit: Some(permit),
        }))
    }

    pub(crate) fn in_flight(&self) -> usize {
        lock_table(&self.locks).len()
    }

    fn lock_for(&self, id: &EntityId) -> Arc<Mutex<()>> {
        let mut table = lock_table(&self.locks);
        Arc::clone(table.entry(id.clone()).or_default())
    }
}

// The table holds one reference and the caller another; anything more means
// someone else is waiting on or holding the lock.
fn remove_if_idle(table: &StdMutex<LockTable>, id: &EntityId, lock: &Arc<Mutex<()>>) {
    let mut table = lock_table(table);
    if Arc::strong_count(lock) <= 2 {
        table.remove(id);
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.permit.take();
        remove_if_idle(&self.table, &self.id, &self.lock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> EntityId {
        EntityId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_unguarded_takes_no_lock() {
        let guards = InFlightGuards::default();
        let permit = guards
            .acquire(&id("t1"), ConcurrencyPolicy::Unguarded)
            .await
            .unwrap();
        assert!(permit.is_none());
        assert_eq!(guards.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_reject_while_pending_and_cleanup() {
        let guards = InFlightGuards::default();
        let first = guards
            .acquire(&id("t1"), ConcurrencyPolicy::RejectWhilePending)
            .await
            .unwrap();
        assert!(first.is_some());

        let second = guards
            .acquire(&id("t1"), ConcurrencyPolicy::RejectWhilePending)
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let other = guards
            .acquire(&id("t2"), ConcurrencyPolicy::RejectWhilePending)
            .await
            .unwrap();
        assert!(other.is_some());
        assert_eq!(guards.in_flight(), 2);

        drop(first);
        drop(other);
        assert_eq!(guards.in_flight(), 0);
    }
}
