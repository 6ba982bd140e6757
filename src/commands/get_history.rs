use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{HistoryRecord, UserId},
    ports::{balance::BalanceStore, history::HistoryStore},
};
use tower::Service;

use super::{Error, PointLedger};

pub struct GetHistoryRequest {
    pub user_id: UserId,
}

impl<B, H> Service<GetHistoryRequest> for PointLedger<B, H>
where
    B: BalanceStore + Send + Sync + 'static,
    H: HistoryStore + Send + Sync + 'static,
{
    type Response = Vec<HistoryRecord>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetHistoryRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move { ledger.get_history(req.user_id).await })
    }
}
