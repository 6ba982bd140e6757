use crate::{
    adapters::ErasedPoisonError,
    domain::{Balance, UserId},
    ports::balance::{BalanceStore, Error},
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

#[derive(Clone, Debug, Default)]
pub struct MemoryBalanceStore {
    balances: Arc<Mutex<HashMap<UserId, Balance>>>,
}

#[async_trait::async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn get(&self, user_id: UserId) -> Result<Balance, Error> {
        let balance = self
            .balances
            .lock()?
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| Balance::new(user_id));

        Ok(balance)
    }

    async fn put(
        &self,
        user_id: UserId,
        points: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<Balance, Error> {
        let balance = Balance {
            user_id,
            points,
            updated_at,
        };
        self.balances.lock()?.insert(user_id, balance.clone());

        Ok(balance)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError::from(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryBalanceStore::default();
        let user_id = Uuid::new_v4();

        let res = store.get(user_id).await;

        // A user without any activity has an implicit zero balance
        assert_that!(res)
            .is_ok()
            .matches(|balance| balance.user_id == user_id && balance.points == 0);
    }

    #[tokio::test]
    async fn test_put_retrieve() {
        let store = MemoryBalanceStore::default();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let res = store.put(user_id, 500, now).await;
        assert_that!(res).is_ok().is_equal_to(Balance {
            user_id,
            points: 500,
            updated_at: now,
        });

        // Retrieving the balance should return the stored value
        let res = store.get(user_id).await;
        assert_that!(res).is_ok().is_equal_to(Balance {
            user_id,
            points: 500,
            updated_at: now,
        });
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = MemoryBalanceStore::default();
        let user_id = Uuid::new_v4();

        store.put(user_id, 500, Utc::now()).await.unwrap();
        store.put(user_id, 20, Utc::now()).await.unwrap();

        let res = store.get(user_id).await;
        assert_that!(res).is_ok().matches(|balance| balance.points == 20);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = MemoryBalanceStore::default();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        store.put(alice, 700, Utc::now()).await.unwrap();

        let res = store.get(bob).await;
        assert_that!(res).is_ok().matches(|balance| balance.points == 0);
    }
}
