use thiserror::Error;

use crate::ids::StationId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Precondition violation: the station was never `ensure`d. Indicates the
    /// caller skipped reconciliation.
    #[error("station {0} is not in the reachability store")]
    UnknownStation(StationId),
}
