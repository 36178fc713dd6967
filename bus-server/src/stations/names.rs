//! Station name suggestions.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::store::{BookingStore, StoreError};

/// Popular cities always offered, even before the catalogue is loaded.
pub const DEFAULT_STATIONS: [&str; 9] = [
    "Bangalore",
    "Chennai",
    "Hyderabad",
    "Mumbai",
    "Pune",
    "Delhi",
    "Chandigarh",
    "Kochi",
    "Coimbatore",
];

/// Suggestions returned when the caller does not ask for a count.
pub const DEFAULT_LIMIT: usize = 5;

/// Upper bound on suggestions per query.
pub const MAX_LIMIT: usize = 20;

/// Thread-safe station name list.
///
/// Built from every route in the catalogue plus [`DEFAULT_STATIONS`], with
/// support for background refresh.
#[derive(Clone)]
pub struct StationNames {
    inner: Arc<RwLock<Vec<String>>>,
    store: Arc<dyn BookingStore>,
}

impl StationNames {
    /// Build the list from the store's routes.
    ///
    /// A store failure is logged and leaves the defaults alone in place.
    pub async fn load(store: Arc<dyn BookingStore>) -> Self {
        let names = match store.list_routes().await {
            Ok(routes) => build_names(routes),
            Err(e) => {
                warn!(error = %e, "could not load routes, using default stations");
                build_names(Vec::new())
            }
        };

        Self {
            inner: Arc::new(RwLock::new(names)),
            store,
        }
    }

    /// Number of known stations.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Stations whose name contains `query`, ignoring case, in sorted order.
    ///
    /// A blank query returns nothing. `limit` is clamped to [`MAX_LIMIT`].
    pub async fn search(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let guard = self.inner.read().await;
        guard
            .iter()
            .filter(|name| name.to_lowercase().contains(&query))
            .take(limit.min(MAX_LIMIT))
            .cloned()
            .collect()
    }

    /// Refresh from the store.
    ///
    /// On success, replaces the current list. On failure, the existing list
    /// is preserved and the error is returned.
    pub async fn refresh(&self) -> Result<usize, StoreError> {
        let routes = self.store.list_routes().await?;
        let names = build_names(routes);
        let count = names.len();

        let mut guard = self.inner.write().await;
        *guard = names;

        Ok(count)
    }
}

/// Merge route endpoints with the defaults, deduplicated and sorted.
fn build_names(routes: Vec<(String, String)>) -> Vec<String> {
    let mut names: BTreeSet<String> = DEFAULT_STATIONS.iter().map(|s| s.to_string()).collect();
    for (source, destination) in routes {
        for name in [source, destination] {
            let name = name.trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
    }
    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BusType;
    use crate::store::{MockStore, fixtures};

    #[test]
    fn build_names_merges_and_sorts() {
        let names = build_names(vec![
            ("Mysore".to_string(), "Bangalore".to_string()),
            ("  ".to_string(), "Goa".to_string()),
        ]);
        assert_eq!(names.len(), DEFAULT_STATIONS.len() + 2);
        assert_eq!(names.first().map(String::as_str), Some("Bangalore"));
        assert!(names.contains(&"Mysore".to_string()));
        assert!(names.contains(&"Goa".to_string()));
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let names = StationNames::load(Arc::new(fixtures::store())).await;

        assert_eq!(names.search("che", 5).await, vec!["Chennai"]);
        assert_eq!(
            names.search("CH", 5).await,
            vec!["Chandigarh", "Chennai", "Kochi"]
        );
        assert_eq!(names.search("i", 2).await.len(), 2);
    }

    #[tokio::test]
    async fn blank_query_returns_nothing() {
        let names = StationNames::load(Arc::new(fixtures::store())).await;
        assert!(names.search("", 5).await.is_empty());
        assert!(names.search("   ", 5).await.is_empty());
    }

    #[tokio::test]
    async fn limit_is_capped() {
        let routes: Vec<_> = (0..30)
            .map(|i| fixtures::bus(&format!("b{i}"), &format!("Town {i:02}"), "Pune", 8, BusType::AcSeater))
            .collect();
        let names = StationNames::load(Arc::new(MockStore::new(routes, Vec::new()))).await;
        assert_eq!(names.search("town", 100).await.len(), MAX_LIMIT);
    }

    #[tokio::test]
    async fn refresh_picks_up_new_routes() {
        let store = MockStore::new(Vec::new(), Vec::new());
        let names = StationNames::load(Arc::new(store.clone())).await;
        assert_eq!(names.len().await, DEFAULT_STATIONS.len());
        assert!(names.search("mysore", 5).await.is_empty());

        let mock = MockStore::new(
            vec![fixtures::bus("b1", "Mysore", "Bangalore", 8, BusType::AcSeater)],
            Vec::new(),
        );
        let names = StationNames {
            inner: names.inner.clone(),
            store: Arc::new(mock),
        };
        let count = names.refresh().await.unwrap();
        assert_eq!(count, DEFAULT_STATIONS.len() + 1);
        assert_eq!(names.search("mysore", 5).await, vec!["Mysore"]);
    }
}
