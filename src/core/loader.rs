use crate::core::navigation::NavigationState;
use crate::domain::model::{
    District, DistrictId, Neighborhood, NeighborhoodBatch, NeighborhoodId, PriceRecord, Region,
    RegionId,
};
use crate::domain::ports::Backend;
use crate::utils::error::{NavError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Navigation context a fetch was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchContext {
    pub epoch: u64,
    pub state: NavigationState,
}

impl FetchContext {
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub what: &'static str,
    pub message: String,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to load {}: {}", self.what, self.message)
    }
}

/// Shared loading flag and last-error slot for all top-level fetches.
#[derive(Debug, Default)]
pub struct LoadStatus {
    in_flight: usize,
    error: Option<LoadError>,
}

impl LoadStatus {
    pub fn begin(&mut self) {
        self.in_flight += 1;
    }

    pub fn succeeded(&mut self) {
        self.end();
        self.error = None;
    }

    pub fn failed(&mut self, what: &'static str, err: &NavError) {
        self.end();
        self.error = Some(LoadError {
            what,
            message: err.user_friendly_message(),
        });
    }

    /// Stale or aborted fetch: only the flag is affected.
    pub fn discarded(&mut self) {
        self.end();
    }

    fn end(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

/// Fetches each hierarchy level from the backend.
pub struct CascadingLoader<B: Backend> {
    backend: Arc<B>,
    price_concurrency: usize,
}

impl<B: Backend + 'static> CascadingLoader<B> {
    pub fn new(backend: Arc<B>, price_concurrency: usize) -> Self {
        Self {
            backend,
            price_concurrency: price_concurrency.max(1),
        }
    }

    pub async fn load_regions(&self) -> Result<Vec<Region>> {
        let regions = self.backend.regions().await?;
        tracing::debug!("📡 Loaded {} regions", regions.len());
        Ok(regions)
    }

    pub async fn load_districts(&self, region: RegionId) -> Result<Vec<District>> {
        let districts = self.backend.districts(region).await?;
        tracing::debug!("📡 Loaded {} districts for region {}", districts.len(), region);
        Ok(districts)
    }

    pub async fn load_neighborhoods(&self, district: DistrictId) -> Result<Vec<Neighborhood>> {
        let neighborhoods = self.backend.neighborhoods(district).await?;
        tracing::debug!(
            "📡 Loaded {} neighborhoods for district {}",
            neighborhoods.len(),
            district
        );
        Ok(neighborhoods)
    }

    /// Never fails; a failed fetch yields an all-empty record.
    pub async fn load_price_record(&self, neighborhood: NeighborhoodId) -> PriceRecord {
        let (record, _) = Self::price_or_empty(&*self.backend, neighborhood).await;
        record
    }

    /// The fetched record and `true`, or an empty record and `false`.
    async fn price_or_empty(backend: &B, neighborhood: NeighborhoodId) -> (PriceRecord, bool) {
        match backend.price(neighborhood).await {
            Ok(record) => (record, true),
            Err(e) => {
                tracing::warn!("⚠️ Price fetch failed for neighborhood {}: {}", neighborhood, e);
                (PriceRecord::default(), false)
            }
        }
    }

    /// Neighborhoods of a district plus one price fetch per neighborhood.
    ///
    /// Only the neighborhood list can fail the batch. Each price failure is
    /// isolated to its neighborhood, which gets an empty record.
    pub async fn load_neighborhood_batch(&self, district: DistrictId) -> Result<NeighborhoodBatch> {
        let neighborhoods = self.load_neighborhoods(district).await?;
        let mut prices = HashMap::with_capacity(neighborhoods.len());
        let mut failed_prices = Vec::new();

        for chunk in neighborhoods.chunks(self.price_concurrency) {
            let mut tasks = JoinSet::new();
            for neighborhood in chunk {
                let backend = Arc::clone(&self.backend);
                let id = neighborhood.id;
                tasks.spawn(async move { (id, Self::price_or_empty(&*backend, id).await) });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((id, (record, fetched))) => {
                        if !fetched {
                            failed_prices.push(id);
                        }
                        prices.insert(id, record);
                    }
                    Err(e) => tracing::warn!("⚠️ Price fetch task aborted: {}", e),
                }
            }
        }

        // 任務中斷的社區也要有空記錄
        for neighborhood in &neighborhoods {
            if !prices.contains_key(&neighborhood.id) {
                prices.insert(neighborhood.id, PriceRecord::default());
                failed_prices.push(neighborhood.id);
            }
        }

        if !failed_prices.is_empty() {
            tracing::warn!(
                "⚠️ {}/{} price records defaulted to empty for district {}",
                failed_prices.len(),
                neighborhoods.len(),
                district
            );
        }

        Ok(NeighborhoodBatch {
            neighborhoods,
            prices,
            failed_prices,
        })
    }

    pub async fn submit_price(&self, neighborhood: NeighborhoodId, record: &PriceRecord) -> Result<()> {
        self.backend.update_price(neighborhood, record).await?;
        tracing::info!("💾 Saved prices for neighborhood {}", neighborhood);
        Ok(())
    }
}
