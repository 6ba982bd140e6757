use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{TransactionKind, UserId},
    ports::{balance::BalanceStore, history::HistoryStore},
};
use tower::Service;

use super::{Error, PointLedger, PointsResponse};

pub struct ChargeRequest {
    pub user_id: UserId,
    /// Number of points to add
    ///
    /// Zero or negative amounts are rejected.
    pub amount: i64,
}

impl<B, H> Service<ChargeRequest> for PointLedger<B, H>
where
    B: BalanceStore + Send + Sync + 'static,
    H: HistoryStore + Send + Sync + 'static,
{
    type Response = PointsResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ChargeRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move {
            let (old_points, balance) = ledger
                .transition(req.user_id, TransactionKind::Charge, req.amount)
                .await?;

            Ok(PointsResponse {
                user_id: balance.user_id,
                old_points,
                new_points: balance.points,
                updated_at: balance.updated_at,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Balance, HistoryRecord},
        ports::{balance::MockBalanceStore, history::MockHistoryStore},
    };
    use chrono::Utc;
    use mockall::predicate::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[fixture]
    fn user_id() -> Uuid {
        Uuid::new_v4()
    }

    /// Non-positive amounts are rejected without calling any port
    #[rstest]
    #[case(0)]
    #[case(-5)]
    #[tokio::test]
    async fn test_call_invalid_amount(user_id: Uuid, #[case] amount: i64) {
        // GIVEN ports without any expectations
        let ledger = PointLedger::new(
            Arc::new(MockBalanceStore::new()),
            Arc::new(MockHistoryStore::new()),
        );

        // WHEN charging a non-positive amount
        let res = ledger.oneshot(ChargeRequest { user_id, amount }).await;

        // THEN it fails before touching the stores
        assert_that!(res).is_err().matches(|err| {
            matches!(err, Error::InvalidAmount { kind: TransactionKind::Charge, amount: a } if *a == amount)
        });
    }

    #[rstest]
    #[tokio::test]
    async fn test_call_limit_exceeded(user_id: Uuid) {
        // GIVEN
        // * a user with 9000 points
        // * a history port that should not be called
        let mut balances = MockBalanceStore::new();
        balances
            .expect_get()
            .times(1)
            .with(eq(user_id))
            .returning(move |_| {
                Ok(Balance {
                    user_id,
                    points: 9000,
                    updated_at: Utc::now(),
                })
            });
        balances.expect_put().never();
        let ledger = PointLedger::new(Arc::new(balances), Arc::new(MockHistoryStore::new()));

        // WHEN charging over the limit
        let res = ledger
            .oneshot(ChargeRequest {
                user_id,
                amount: 1001,
            })
            .await;

        // THEN it returns the limit error
        assert_that!(res).is_err().matches(|err| {
            matches!(
                err,
                Error::LimitExceeded {
                    current: 9000,
                    amount: 1001,
                    limit: 10_000
                }
            )
        });
    }

    #[rstest]
    #[tokio::test]
    async fn test_call(user_id: Uuid) {
        // GIVEN
        // * a user with 9000 points
        // * ports that accept the update
        let before = Utc::now();
        let updated_at = Utc::now();
        let mut balances = MockBalanceStore::new();
        balances
            .expect_get()
            .times(1)
            .with(eq(user_id))
            .returning(move |_| {
                Ok(Balance {
                    user_id,
                    points: 9000,
                    updated_at: before,
                })
            });
        balances
            .expect_put()
            .times(1)
            .with(eq(user_id), eq(10_000u64), always())
            .returning(move |user_id, points, _| {
                Ok(Balance {
                    user_id,
                    points,
                    updated_at,
                })
            });
        let mut history = MockHistoryStore::new();
        history
            .expect_append()
            .times(1)
            .with(
                eq(user_id),
                eq(TransactionKind::Charge),
                eq(1000u64),
                eq(updated_at),
            )
            .returning(|user_id, kind, amount, occurred_at| {
                Ok(HistoryRecord {
                    id: 1,
                    user_id,
                    kind,
                    amount,
                    occurred_at,
                })
            });
        let ledger = PointLedger::new(Arc::new(balances), Arc::new(history));

        // WHEN calling the service
        let res = ledger
            .oneshot(ChargeRequest {
                user_id,
                amount: 1000,
            })
            .await;

        // THEN
        // * It returns a valid response
        // * All ports are called
        assert_that!(res).is_ok().is_equal_to(PointsResponse {
            user_id,
            old_points: 9000,
            new_points: 10_000,
            updated_at,
        });
    }
}
