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

pub struct UseRequest {
    pub user_id: UserId,
    /// Number of points to spend
    pub amount: i64,
}

impl<B, H> Service<UseRequest> for PointLedger<B, H>
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

    fn call(&mut self, req: UseRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move {
            let (old_points, balance) = ledger
                .transition(req.user_id, TransactionKind::Use, req.amount)
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
