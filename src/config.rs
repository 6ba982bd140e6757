use crate::domain::POINT_LIMIT;

/// Tunables for a [`PointLedger`](crate::commands::PointLedger)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Maximum number of points a user can hold after a charge
    pub point_limit: u64,
}

impl LedgerConfig {
    pub fn with_point_limit(mut self, point_limit: u64) -> Self {
        self.point_limit = point_limit;
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            point_limit: POINT_LIMIT,
        }
    }
}
