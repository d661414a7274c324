//! Travel-time resolver contract.

use async_trait::async_trait;

/// Looks up how long it takes to travel between two addresses.
#[async_trait]
pub trait TravelTimeResolver: Send + Sync {
    /// Returns the travel time in whole minutes, or `None` when it cannot be
    /// determined. Implementations never fail the caller; lookup errors are
    /// logged and reported as `None`.
    async fn duration(&self, origin: &str, destination: &str) -> Option<u32>;
}

/// Resolver used when no travel-time service is configured.
pub struct NoTravelTime;

#[async_trait]
impl TravelTimeResolver for NoTravelTime {
    async fn duration(&self, _origin: &str, _destination: &str) -> Option<u32> {
        None
    }
}
