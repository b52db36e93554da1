use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

use crate::content::{ContentItem, ContentPool, Pool};

/// Result of drawing from a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draw<'a> {
    Item { index: usize, item: &'a ContentItem },
    /// The category is missing or its pool is empty. Callers show `NO_CONTENT_MESSAGE`.
    NoContent,
}

impl<'a> Draw<'a> {
    pub fn item(&self) -> Option<&'a ContentItem> {
        match self {
            Draw::Item { item, .. } => Some(*item),
            Draw::NoContent => None,
        }
    }
}

/// Picks content without repeating an item until its whole category has been seen.
#[derive(Debug, Clone)]
pub struct Selector {
    pools: ContentPool,
    history: HashMap<String, HashSet<usize>>,
    rng: StdRng,
}

impl Selector {
    pub fn new(pools: ContentPool) -> Self {
        Self::with_rng(pools, StdRng::from_entropy())
    }

    pub fn with_seed(pools: ContentPool, seed: u64) -> Self {
        Self::with_rng(pools, StdRng::seed_from_u64(seed))
    }

    fn with_rng(pools: ContentPool, rng: StdRng) -> Self {
        Self {
            pools,
            history: HashMap::new(),
            rng,
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    pub fn pool(&self, category: &str) -> Option<&Pool> {
        self.pools.get(category)
    }

    pub fn select(&mut self, category: &str) -> Draw<'_> {
        let pool = match self.pools.get(category) {
            Some(pool) if !pool.is_empty() => pool,
            _ => {
                log::warn!("No content for category '{}'", category);
                return Draw::NoContent;
            }
        };

        let used = self.history.entry(category.to_string()).or_default();
        if used.len() >= pool.len() {
            log::debug!("Category '{}' exhausted, starting a new cycle", category);
            used.clear();
        }

        let unused: Vec<usize> = (0..pool.len()).filter(|i| !used.contains(i)).collect();
        let index = match unused.choose(&mut self.rng) {
            Some(&index) => index,
            None => return Draw::NoContent,
        };
        used.insert(index);

        match pool.get(index) {
            Some(item) => Draw::Item { index, item },
            None => Draw::NoContent,
        }
    }

    /// Draws up to `count` distinct options from a category, independent of the
    /// non-repeat history. Used to fill the choices offered for one stage.
    pub fn offer(&mut self, category: &str, count: usize) -> Vec<ContentItem> {
        match self.pools.get(category) {
            Some(pool) => offer_from(pool, count, &mut self.rng),
            None => Vec::new(),
        }
    }

    /// Indices still available in the current cycle.
    pub fn remaining(&self, category: &str) -> usize {
        let total = self.pools.get(category).map(Pool::len).unwrap_or(0);
        let used = self.history.get(category).map(HashSet::len).unwrap_or(0);
        if used >= total { total } else { total - used }
    }

    /// Swaps the pool behind a category. History never carries over to the new pool.
    pub fn replace_pool(&mut self, category: &str, pool: Pool) {
        self.history.remove(category);
        self.pools.insert(category.to_string(), pool);
    }

    pub fn reset(&mut self, category: &str) {
        self.history.remove(category);
    }

    pub fn reset_all(&mut self) {
        self.history.clear();
    }
}

fn offer_from(pool: &Pool, count: usize, rng: &mut StdRng) -> Vec<ContentItem> {
    let amount = count.min(pool.len());
    index::sample(rng, pool.len(), amount)
        .into_iter()
        .filter_map(|i| pool.get(i).cloned())
        .collect()
}
