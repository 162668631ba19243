//! Lazily-loaded, process-wide market-data cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::dataset::{CandleRow, DatasetSource};
use crate::{Candle, Symbol};

enum LoadState {
    Unloaded,
    Ready(HashMap<Symbol, Arc<Vec<Candle>>>),
    /// Bulk read failed; every lookup misses until an explicit reload.
    Degraded,
}

/// Holds the immutable per-symbol series in memory. The dataset is read from
/// the backing source at most once per process lifetime (or per explicit
/// [`reload`](Self::reload)); concurrent first-accessors wait for the same
/// completed or failed load instead of triggering duplicate reads.
#[derive(Clone)]
pub struct MarketDataCache {
    source: Arc<dyn DatasetSource>,
    state: Arc<RwLock<LoadState>>,
}

impl MarketDataCache {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(LoadState::Unloaded)),
        }
    }

    /// Ordered candle series for a symbol, or `None` when the symbol is
    /// unknown or the cache is degraded.
    pub async fn series(&self, symbol: &Symbol) -> Option<Arc<Vec<Candle>>> {
        {
            let state = self.state.read().await;
            match &*state {
                LoadState::Ready(series) => return series.get(symbol).cloned(),
                LoadState::Degraded => return None,
                LoadState::Unloaded => {}
            }
        }

        let mut state = self.state.write().await;
        // Another task may have completed the load while we waited for the
        // write guard.
        if let LoadState::Unloaded = &*state {
            *state = self.load();
        }

        match &*state {
            LoadState::Ready(series) => series.get(symbol).cloned(),
            _ => None,
        }
    }

    /// Symbols present in the loaded dataset, sorted. Empty when degraded.
    pub async fn symbols(&self) -> Vec<Symbol> {
        {
            let state = self.state.read().await;
            match &*state {
                LoadState::Ready(series) => return sorted_symbols(series),
                LoadState::Degraded => return Vec::new(),
                LoadState::Unloaded => {}
            }
        }

        let mut state = self.state.write().await;
        if let LoadState::Unloaded = &*state {
            *state = self.load();
        }

        match &*state {
            LoadState::Ready(series) => sorted_symbols(series),
            _ => Vec::new(),
        }
    }

    /// Whether the last load attempt failed.
    pub async fn is_degraded(&self) -> bool {
        matches!(&*self.state.read().await, LoadState::Degraded)
    }

    /// Drop the loaded dataset (or the degraded marker) so the next access
    /// reads from the backing source again. This is the only recovery path
    /// after a failed load.
    pub async fn reload(&self) {
        let mut state = self.state.write().await;
        *state = LoadState::Unloaded;
    }

    fn load(&self) -> LoadState {
        match self.source.load_all() {
            Ok(rows) => LoadState::Ready(group_rows(rows)),
            Err(error) => {
                warn!(error = %error, "dataset load failed; cache degraded until reload");
                LoadState::Degraded
            }
        }
    }
}

fn group_rows(rows: Vec<CandleRow>) -> HashMap<Symbol, Arc<Vec<Candle>>> {
    let mut grouped: HashMap<Symbol, Vec<Candle>> = HashMap::new();
    for row in rows {
        grouped.entry(row.symbol).or_default().push(row.candle);
    }

    grouped
        .into_iter()
        .map(|(symbol, mut candles)| {
            candles.sort_by_key(|candle| candle.date);
            (symbol, Arc::new(candles))
        })
        .collect()
}

fn sorted_symbols(series: &HashMap<Symbol, Arc<Vec<Candle>>>) -> Vec<Symbol> {
    let mut symbols: Vec<Symbol> = series.keys().cloned().collect();
    symbols.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetError;
    use crate::TradingDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl DatasetSource for CountingSource {
        fn load_all(&self) -> Result<Vec<CandleRow>, DatasetError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DatasetError::new("backing file missing"));
            }

            let symbol = Symbol::parse("AAPL").expect("valid symbol");
            let mut rows = Vec::new();
            for day in ["2024-01-03", "2024-01-01", "2024-01-02"] {
                let date = TradingDate::parse(day).expect("valid date");
                let candle = Candle::new(date, 10.0, 11.0, 9.0, 10.5, None).expect("valid");
                rows.push(CandleRow {
                    symbol: symbol.clone(),
                    candle,
                });
            }
            Ok(rows)
        }
    }

    #[tokio::test]
    async fn loads_once_and_sorts_by_date() {
        let source = Arc::new(CountingSource::new(false));
        let cache = MarketDataCache::new(source.clone());
        let symbol = Symbol::parse("AAPL").expect("valid");

        let series = cache.series(&symbol).await.expect("symbol present");
        assert_eq!(series.len(), 3);
        assert!(series.windows(2).all(|pair| pair[0].date < pair[1].date));

        let _ = cache.series(&symbol).await;
        let _ = cache.symbols().await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_degrades_without_retry() {
        let source = Arc::new(CountingSource::new(true));
        let cache = MarketDataCache::new(source.clone());
        let symbol = Symbol::parse("AAPL").expect("valid");

        assert!(cache.series(&symbol).await.is_none());
        assert!(cache.series(&symbol).await.is_none());
        assert!(cache.is_degraded().await);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reload_clears_degraded_state() {
        let source = Arc::new(CountingSource::new(true));
        let cache = MarketDataCache::new(source.clone());
        let symbol = Symbol::parse("AAPL").expect("valid");

        let _ = cache.series(&symbol).await;
        cache.reload().await;
        let _ = cache.series(&symbol).await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_symbol_misses_on_loaded_cache() {
        let cache = MarketDataCache::new(Arc::new(CountingSource::new(false)));
        let unknown = Symbol::parse("MSFT").expect("valid");
        assert!(cache.series(&unknown).await.is_none());
        assert!(!cache.is_degraded().await);
    }
}
