//! Maps a validated indicator request onto a cached symbol series.

use crate::cache::MarketDataCache;
use crate::indicators::{compute_series, IndicatorId, IndicatorParams};
use crate::{Candle, DateWindow, SeriesPoint, Symbol};

/// Dispatch failure: the symbol is unknown, the window holds no data, or the
/// cache is degraded. All of these surface as a lookup miss to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchMiss {
    pub symbol: String,
}

/// Runs registered algorithms over slices of the shared dataset.
#[derive(Clone)]
pub struct IndicatorDispatcher {
    cache: MarketDataCache,
}

impl IndicatorDispatcher {
    pub fn new(cache: MarketDataCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &MarketDataCache {
        &self.cache
    }

    /// Compute `indicator` over `symbol` restricted to `window` (inclusive).
    ///
    /// An `Ok` with an empty series means the symbol and window were valid but
    /// the indicator produced no defined points; that is distinct from a miss.
    pub async fn compute(
        &self,
        symbol_text: &str,
        indicator: IndicatorId,
        window: DateWindow,
        params: &IndicatorParams,
    ) -> Result<(Symbol, Vec<SeriesPoint>), DispatchMiss> {
        // Symbols that fail validation cannot exist in the dataset; they are a
        // miss, not a request error, matching lookup-by-normalized-name.
        let Ok(symbol) = Symbol::parse(symbol_text) else {
            return Err(DispatchMiss {
                symbol: symbol_text.trim().to_ascii_uppercase(),
            });
        };

        let Some(series) = self.cache.series(&symbol).await else {
            return Err(DispatchMiss {
                symbol: symbol.as_str().to_owned(),
            });
        };

        let sliced: Vec<Candle> = series
            .iter()
            .copied()
            .filter(|candle| window.contains(candle.date))
            .collect();
        if sliced.is_empty() {
            return Err(DispatchMiss {
                symbol: symbol.as_str().to_owned(),
            });
        }

        let points = compute_series(indicator, &sliced, params);
        Ok((symbol, points))
    }
}
