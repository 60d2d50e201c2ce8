use async_trait::async_trait;
use crate::{DateWindow, FetchError, RawPriceHistory};

/// Trait for daily price providers.
///
/// `Ok(None)` means the provider does not know the symbol; callers treat that
/// as a recoverable miss. Any `Err` is fatal for the whole download.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_history(
        &self,
        symbol: &str,
        window: &DateWindow,
    ) -> Result<Option<RawPriceHistory>, FetchError>;
}
