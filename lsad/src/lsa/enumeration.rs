//! Enumeration Engine
//!
//! Listings of accounts, trusted domains and privileges are returned in
//! batches. A caller resumes a listing by presenting the resume handle
//! returned with the previous batch.
//!
//! # Cursor Semantics
//! Cursors are live: each context records the key of the last item it
//! returned (an object id or a privilege LUID), and the next batch starts
//! strictly after it. Keys are allocated in creation order, so:
//! - an object present throughout the enumeration is returned exactly once
//! - an object created after the cursor passed is still returned
//! - a deleted object disappears without shifting any other
//!
//! # Contexts
//! Resume handle 0 starts a new listing. A context lives until its listing
//! is exhausted, until it sits idle past the configured TTL, or until it is
//! evicted to make room (least recently used first). Contexts belong to
//! the session that started them and are used by one call at a time; a
//! handle that is unknown, expired, foreign or already in use fails with
//! `InvalidParameter` and leaves the cursor untouched.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, warn};
use spin::Mutex;

use crate::config::LsaConfig;
use crate::se::SessionId;
use crate::status::{LsaResult, NtStatus};

/// Collection being listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Privileges,
    Accounts,
    TrustedDomains,
    TrustedDomainsEx,
}

/// One batch of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerated<T> {
    pub items: Vec<T>,
    /// Handle resuming the listing, 0 once it is complete
    pub resume_handle: u32,
    /// MoreEntries, Success (final batch) or NoMoreEntries (nothing left)
    pub status: NtStatus,
}

impl<T> Enumerated<T> {
    /// Status for a batch
    pub fn status_for(count: usize, more: bool) -> NtStatus {
        if more {
            NtStatus::MoreEntries
        } else if count == 0 {
            NtStatus::NoMoreEntries
        } else {
            NtStatus::Success
        }
    }

    /// A complete, single-batch result
    pub fn complete(items: Vec<T>) -> Self {
        let status = Self::status_for(items.len(), false);
        Self {
            items,
            resume_handle: 0,
            status,
        }
    }
}

/// Take up to `max` keyed items and report whether more remain
pub fn take_page<T>(items: impl Iterator<Item = (u64, T)>, max: usize) -> (Vec<(u64, T)>, bool) {
    let mut page: Vec<(u64, T)> = items.take(max.saturating_add(1)).collect();
    let more = page.len() > max;
    page.truncate(max);
    (page, more)
}

#[derive(Debug)]
struct Context {
    kind: CollectionKind,
    cursor: u64,
    session: SessionId,
    last_used: Instant,
    in_flight: bool,
}

#[derive(Debug, Default)]
struct ContextTable {
    contexts: HashMap<u32, Context>,
    next_token: u32,
}

impl ContextTable {
    fn allocate_token(&mut self) -> u32 {
        loop {
            self.next_token = self.next_token.wrapping_add(1);
            if self.next_token != 0 && !self.contexts.contains_key(&self.next_token) {
                return self.next_token;
            }
        }
    }

    /// Drop idle contexts past their TTL
    fn reclaim(&mut self, ttl: Duration, now: Instant) -> usize {
        let before = self.contexts.len();
        self.contexts
            .retain(|_, ctx| ctx.in_flight || now.duration_since(ctx.last_used) < ttl);
        before - self.contexts.len()
    }

    /// Evict the least recently used idle context
    fn evict_lru(&mut self) -> Option<u32> {
        let victim = self
            .contexts
            .iter()
            .filter(|(_, ctx)| !ctx.in_flight)
            .min_by_key(|(_, ctx)| ctx.last_used)
            .map(|(token, _)| *token)?;
        self.contexts.remove(&victim);
        Some(victim)
    }
}

/// Outstanding enumeration contexts
#[derive(Debug)]
pub struct EnumerationContexts {
    table: Mutex<ContextTable>,
    max_contexts: usize,
    ttl: Duration,
    max_batch: u32,
}

impl EnumerationContexts {
    pub fn new(config: &LsaConfig) -> Self {
        Self {
            table: Mutex::new(ContextTable::default()),
            max_contexts: config.max_enumeration_contexts.max(1),
            ttl: config.enumeration_context_ttl,
            max_batch: config.max_enumeration_batch.max(1),
        }
    }

    /// Run one enumeration call
    ///
    /// `fetch` receives the cursor and batch size and returns the keyed
    /// items after the cursor plus whether more remain.
    pub fn enumerate<T>(
        &self,
        kind: CollectionKind,
        resume_handle: u32,
        session: SessionId,
        max_count: u32,
        fetch: impl FnOnce(u64, usize) -> (Vec<(u64, T)>, bool),
    ) -> LsaResult<Enumerated<T>> {
        if max_count == 0 {
            return Err(NtStatus::InvalidParameter);
        }
        let batch = max_count.min(self.max_batch) as usize;

        let lease = self.begin(kind, resume_handle, session)?;
        let (page, more) = fetch(lease.cursor, batch);
        let last_key = page.last().map(|(key, _)| *key);
        let items: Vec<T> = page.into_iter().map(|(_, item)| item).collect();
        let status = Enumerated::<T>::status_for(items.len(), more);

        let resume_handle = lease.finish(last_key, more)?;
        Ok(Enumerated {
            items,
            resume_handle,
            status,
        })
    }

    fn begin(&self, kind: CollectionKind, resume_handle: u32, session: SessionId) -> LsaResult<Lease<'_>> {
        if resume_handle == 0 {
            return Ok(Lease {
                owner: self,
                token: None,
                kind,
                session,
                cursor: 0,
                finished: false,
            });
        }

        let mut table = self.table.lock();
        let now = Instant::now();
        let ttl = self.ttl;
        let ctx = match table.contexts.get_mut(&resume_handle) {
            Some(ctx) => ctx,
            None => {
                debug!("[LSA] unknown resume handle {:#x}", resume_handle);
                return Err(NtStatus::InvalidParameter);
            }
        };
        if ctx.session != session || ctx.kind != kind || ctx.in_flight {
            debug!("[LSA] resume handle {:#x} rejected", resume_handle);
            return Err(NtStatus::InvalidParameter);
        }
        if now.duration_since(ctx.last_used) >= ttl {
            table.contexts.remove(&resume_handle);
            warn!("[LSA] resume handle {:#x} expired", resume_handle);
            return Err(NtStatus::InvalidParameter);
        }
        ctx.in_flight = true;
        let cursor = ctx.cursor;

        Ok(Lease {
            owner: self,
            token: Some(resume_handle),
            kind,
            session,
            cursor,
            finished: false,
        })
    }

    /// Store a fresh context and return its token
    fn insert(&self, kind: CollectionKind, session: SessionId, cursor: u64) -> LsaResult<u32> {
        let mut table = self.table.lock();
        let now = Instant::now();

        let reclaimed = table.reclaim(self.ttl, now);
        if reclaimed > 0 {
            warn!("[LSA] reclaimed {} idle enumeration contexts", reclaimed);
        }
        if table.contexts.len() >= self.max_contexts {
            match table.evict_lru() {
                Some(victim) => warn!("[LSA] evicted enumeration context {:#x}", victim),
                None => return Err(NtStatus::InsufficientResources),
            }
        }

        let token = table.allocate_token();
        table.contexts.insert(
            token,
            Context {
                kind,
                cursor,
                session,
                last_used: now,
                in_flight: false,
            },
        );
        Ok(token)
    }

    /// Drop every context owned by `session`
    pub fn close_session(&self, session: SessionId) -> usize {
        let mut table = self.table.lock();
        let before = table.contexts.len();
        table.contexts.retain(|_, ctx| ctx.session != session);
        before - table.contexts.len()
    }

    /// Number of outstanding contexts
    pub fn count(&self) -> usize {
        self.table.lock().contexts.len()
    }
}

/// Exclusive use of one context for the duration of a call
struct Lease<'a> {
    owner: &'a EnumerationContexts,
    token: Option<u32>,
    kind: CollectionKind,
    session: SessionId,
    cursor: u64,
    finished: bool,
}

impl Lease<'_> {
    /// Advance or retire the context
    ///
    /// # Returns
    /// The resume handle for the next call, 0 when the listing is done
    fn finish(mut self, last_key: Option<u64>, more: bool) -> LsaResult<u32> {
        self.finished = true;
        let cursor = last_key.unwrap_or(self.cursor);

        match (self.token, more) {
            (Some(token), true) => {
                let mut table = self.owner.table.lock();
                if let Some(ctx) = table.contexts.get_mut(&token) {
                    ctx.cursor = cursor;
                    ctx.last_used = Instant::now();
                    ctx.in_flight = false;
                }
                Ok(token)
            }
            (Some(token), false) => {
                self.owner.table.lock().contexts.remove(&token);
                Ok(0)
            }
            (None, true) => self.owner.insert(self.kind, self.session, cursor),
            (None, false) => Ok(0),
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(token) = self.token {
            if let Some(ctx) = self.owner.table.lock().contexts.get_mut(&token) {
                ctx.in_flight = false;
            }
        }
    }
}
