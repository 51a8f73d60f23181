// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{pattern::PathPattern, DeviceId, HashMap};
use quick_cache::sync::Cache as QuickCache;
use std::sync::{Arc, RwLock};

/// TTL value meaning "data never expires"
pub const NO_TTL: i64 = i64::MAX;

/// Resolves the retention duration (in milliseconds) of devices
///
/// Implementations return [`NO_TTL`] if no TTL is set.
pub trait TtlSource: Send + Sync {
    /// Gets the TTL of a tree-model device.
    fn ttl_for_tree(&self, device: &DeviceId) -> i64;

    /// Gets the TTL of a table, scoped to its owning database.
    fn ttl_for_table(&self, database: &str, table: &str) -> i64;
}

/// Rule based TTL cache
///
/// Tree-model TTLs are attached to path patterns (the most specific
/// matching pattern wins), table-model TTLs to `(database, table)` pairs.
///
/// Resolved tree-model TTLs are memoized; changing any rule
/// invalidates the memo.
pub struct TtlCache {
    tree_rules: RwLock<Vec<(PathPattern, i64)>>,
    table_rules: RwLock<HashMap<(Arc<str>, Arc<str>), i64>>,

    // NOTE: rustc_hash performed best: https://fjall-rs.github.io/post/fjall-2-1
    resolved: QuickCache<DeviceId, i64, quick_cache::UnitWeighter, rustc_hash::FxBuildHasher>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::with_capacity(100_000)
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TtlCache(resolved={})", self.resolved.len())
    }
}

impl TtlCache {
    /// Creates a TTL cache memoizing up to `capacity` resolved devices.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        use quick_cache::sync::DefaultLifecycle;

        #[allow(clippy::default_trait_access)]
        let resolved = QuickCache::with(
            capacity,
            capacity as u64,
            quick_cache::UnitWeighter,
            Default::default(),
            DefaultLifecycle::default(),
        );

        Self {
            tree_rules: RwLock::default(),
            table_rules: RwLock::default(),
            resolved,
        }
    }

    /// Sets the TTL of all tree-model devices matching `pattern`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the TTL is not positive.
    pub fn set_tree_ttl<P: Into<PathPattern>>(&self, pattern: P, ttl: i64) -> crate::Result<()> {
        if ttl <= 0 {
            return Err(crate::Error::InvalidTtl(ttl));
        }

        let pattern = pattern.into();
        log::debug!("Setting TTL of {pattern} to {ttl}ms");

        let mut rules = self.tree_rules.write().expect("lock is poisoned");
        rules.retain(|(p, _)| p != &pattern);
        rules.push((pattern, ttl));

        self.resolved.clear();

        Ok(())
    }

    /// Removes the TTL rule of exactly `pattern`.
    pub fn unset_tree_ttl(&self, pattern: &PathPattern) {
        let mut rules = self.tree_rules.write().expect("lock is poisoned");
        rules.retain(|(p, _)| p != pattern);

        self.resolved.clear();
    }

    /// Sets the TTL of a table.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the TTL is not positive.
    pub fn set_table_ttl(&self, database: &str, table: &str, ttl: i64) -> crate::Result<()> {
        if ttl <= 0 {
            return Err(crate::Error::InvalidTtl(ttl));
        }

        log::debug!("Setting TTL of {database}.{table} to {ttl}ms");

        self.table_rules
            .write()
            .expect("lock is poisoned")
            .insert((database.into(), table.into()), ttl);

        Ok(())
    }

    /// Removes the TTL of a table.
    pub fn unset_table_ttl(&self, database: &str, table: &str) {
        self.table_rules
            .write()
            .expect("lock is poisoned")
            .remove(&(Arc::from(database), Arc::from(table)));
    }

    fn resolve_tree(rules: &[(PathPattern, i64)], path: &str) -> i64 {
        rules
            .iter()
            .filter(|(pattern, _)| pattern.matches(path))
            .max_by_key(|(pattern, _)| pattern.specificity())
            .map_or(NO_TTL, |(_, ttl)| *ttl)
    }
}

impl TtlSource for TtlCache {
    fn ttl_for_tree(&self, device: &DeviceId) -> i64 {
        if let Some(ttl) = self.resolved.get(device) {
            return ttl;
        }

        // NOTE: Hold the read lock while memoizing, so a concurrent
        // rule change cannot be overwritten by a stale result
        let rules = self.tree_rules.read().expect("lock is poisoned");

        let ttl = match device {
            DeviceId::Tree(path) => Self::resolve_tree(&rules, path),
            DeviceId::Table { .. } => NO_TTL,
        };

        self.resolved.insert(device.clone(), ttl);
        ttl
    }

    fn ttl_for_table(&self, database: &str, table: &str) -> i64 {
        self.table_rules
            .read()
            .expect("lock is poisoned")
            .get(&(Arc::from(database), Arc::from(table)))
            .copied()
            .unwrap_or(NO_TTL)
    }
}
