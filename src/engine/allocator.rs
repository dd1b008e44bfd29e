//! engine::allocator
//!
//! Hierarchical id allocation.
//!
//! # Algorithm
//!
//! A canonical URL splits into three scope keys (domain, path, query). Each
//! key is resolved in turn:
//!
//! 1. Look for metadata at the hash-derived location for the key. If it
//!    exists, its id is the answer.
//! 2. Otherwise reserve the next number from the governing counter with a
//!    compare-and-swap write, render it through the codec, and write the
//!    metadata create-only.
//!
//! Domain numbers come from the root counter; path and query numbers from
//! the domain's counter. The query counter is shared by every path of a
//! domain. Finally the record is written at `domain/path/query`.
//!
//! # Crash Safety
//!
//! The counter is advanced before the metadata is written. A crash in
//! between wastes one number but can never hand the same id to two keys.
//! A missing domain counter reads as zero, so re-running an interrupted
//! allocation completes it.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::objects::{read_json, to_json_bytes};
use super::{Context, EngineError};
use crate::core::codec::Codec;
use crate::core::layout::{is_data_object, Layout, Location};
use crate::core::types::{
    Code, DomainCounter, Record, RootCounter, ScopeLevel, ScopeMeta, UrlParts, UtcTimestamp,
};
use crate::store::{ContentStore, Precondition};
use crate::ui::output::{self, Verbosity};

/// Attempts at a counter compare-and-swap before giving up.
pub const MAX_CAS_ATTEMPTS: u32 = 5;

/// Seed for counters that start from zero.
async fn fresh_counter<T: Default>() -> Result<T, EngineError> {
    Ok(T::default())
}

/// Input to [`Allocator::allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    /// URL as submitted
    pub original: String,
    /// Canonical form of `original`
    pub canonical: String,
    /// Who asked for the code
    pub submitter: String,
    /// Issue number that requested the code, if any
    pub external_ref: Option<u64>,
}

impl AllocationRequest {
    /// Create a request without an external reference.
    pub fn new(
        original: impl Into<String>,
        canonical: impl Into<String>,
        submitter: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            canonical: canonical.into(),
            submitter: submitter.into(),
            external_ref: None,
        }
    }

    /// Attach an external reference.
    pub fn with_external_ref(mut self, issue: u64) -> Self {
        self.external_ref = Some(issue);
        self
    }

    /// Suffix for commit messages: `[#42]` or `[cli]`.
    fn tag(&self) -> String {
        match self.external_ref {
            Some(issue) => format!("[#{}]", issue),
            None => "[cli]".to_string(),
        }
    }
}

/// Result of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// `domain/path/query`
    pub code: String,
    pub domain_id: String,
    pub path_id: String,
    pub query_id: String,
}

/// Which scope an id is being resolved for.
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    Domain,
    Path { domain_id: &'a str },
    Query { domain_id: &'a str },
}

impl Scope<'_> {
    fn level(&self) -> ScopeLevel {
        match self {
            Scope::Domain => ScopeLevel::Domain,
            Scope::Path { .. } => ScopeLevel::Path,
            Scope::Query { .. } => ScopeLevel::Query,
        }
    }
}

/// Mints ids and writes records.
pub struct Allocator<'a> {
    store: &'a dyn ContentStore,
    codec: Codec,
    layout: Layout,
    verbosity: Verbosity,
}

impl<'a> Allocator<'a> {
    /// Create an allocator over a store.
    pub fn new(store: &'a dyn ContentStore, codec: Codec, layout: Layout) -> Self {
        Self {
            store,
            codec,
            layout,
            verbosity: Verbosity::Normal,
        }
    }

    /// Take output settings from a command context.
    pub fn with_context(mut self, ctx: &Context) -> Self {
        self.verbosity = ctx.verbosity;
        self
    }

    /// Allocate (or look up) the code for a canonical URL.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if `canonical` has no host
    /// - `Storage` for backend failures
    /// - `Conflict` if a counter stays contended for [`MAX_CAS_ATTEMPTS`]
    /// - `CorruptObject` if existing metadata or counters cannot be decoded
    pub async fn allocate(&self, request: &AllocationRequest) -> Result<Allocation, EngineError> {
        let parts = UrlParts::from_canonical(&request.canonical)?;
        let tag = request.tag();

        let domain_loc = self.layout.domain_meta(&parts.domain);
        let domain_id = self
            .scope_id(Scope::Domain, &domain_loc, &parts.domain, &tag)
            .await?;

        let path_loc = self.layout.path_meta(&domain_id, &parts.path);
        let path_id = self
            .scope_id(
                Scope::Path {
                    domain_id: &domain_id,
                },
                &path_loc,
                &parts.path,
                &tag,
            )
            .await?;

        let query_loc = self.layout.query_meta(&domain_id, &path_id, &parts.query);
        let query_id = self
            .scope_id(
                Scope::Query {
                    domain_id: &domain_id,
                },
                &query_loc,
                &parts.query,
                &tag,
            )
            .await?;

        let code = Code::full(&domain_id, &path_id, &query_id);
        let record = Record {
            original: request.original.clone(),
            canonical: request.canonical.clone(),
            by: request.submitter.clone(),
            issue: request.external_ref,
            created_at: UtcTimestamp::now(),
        };
        self.store
            .write(
                &self.layout.record(&domain_id, &path_id, &query_id),
                &to_json_bytes(&record)?,
                &format!("create record {} {}", code, tag),
                Precondition::Any,
            )
            .await?;

        output::debug(
            format!("allocated {} for {}", code, request.canonical),
            self.verbosity,
        );

        Ok(Allocation {
            code,
            domain_id,
            path_id,
            query_id,
        })
    }

    /// Resolve the id for a scope key, minting one if the key is new.
    async fn scope_id(
        &self,
        scope: Scope<'_>,
        meta_loc: &Location,
        key: &str,
        tag: &str,
    ) -> Result<String, EngineError> {
        if let Some((meta, _)) = read_json::<ScopeMeta>(self.store, meta_loc).await? {
            output::debug(
                format!("{} '{}' is {}", scope.level(), key, meta.id),
                self.verbosity,
            );
            return Ok(meta.id);
        }

        let number = self.reserve(scope, tag).await?;
        let id = self.codec.render(number);
        let target = match scope {
            Scope::Domain => id.clone(),
            Scope::Path { domain_id } | Scope::Query { domain_id } => {
                format!("{}/{}", domain_id, id)
            }
        };

        let meta = ScopeMeta::new(&id, key);
        let message = format!("create {} meta {} {}", scope.level(), target, tag);
        match self
            .store
            .write(meta_loc, &to_json_bytes(&meta)?, &message, Precondition::Absent)
            .await
        {
            Ok(_) => {}
            Err(err) if err.is_conflict() => {
                // Someone else minted this key first; their id stands.
                return match read_json::<ScopeMeta>(self.store, meta_loc).await? {
                    Some((existing, _)) => {
                        output::debug(
                            format!(
                                "{} '{}' created concurrently as {}, abandoning {}",
                                scope.level(),
                                key,
                                existing.id,
                                id
                            ),
                            self.verbosity,
                        );
                        Ok(existing.id)
                    }
                    None => Err(err.into()),
                };
            }
            Err(err) => return Err(err.into()),
        }

        if let Scope::Domain = scope {
            self.init_domain_counter(&id, tag).await?;
        }

        output::debug(
            format!("created {} '{}' as {}", scope.level(), key, id),
            self.verbosity,
        );
        Ok(id)
    }

    /// Create `{domain}/counter.json` if it does not exist yet.
    async fn init_domain_counter(&self, domain_id: &str, tag: &str) -> Result<(), EngineError> {
        let loc = self.layout.domain_counter(domain_id);
        let result = self
            .store
            .write(
                &loc,
                &to_json_bytes(&DomainCounter::default())?,
                &format!("create domain counter {} {}", domain_id, tag),
                Precondition::Absent,
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_conflict() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Reserve the next number for a scope.
    async fn reserve(&self, scope: Scope<'_>, tag: &str) -> Result<u64, EngineError> {
        match scope {
            Scope::Domain => {
                self.take_number(
                    &self.layout.root_counter(),
                    || self.seed_root_counter(),
                    &format!("update root counter {}", tag),
                    RootCounter::take_domain,
                )
                .await
            }
            Scope::Path { domain_id } => {
                self.take_number(
                    &self.layout.domain_counter(domain_id),
                    fresh_counter::<DomainCounter>,
                    &format!("update domain counter {} {}", domain_id, tag),
                    DomainCounter::take_path,
                )
                .await
            }
            Scope::Query { domain_id } => {
                self.take_number(
                    &self.layout.domain_counter(domain_id),
                    fresh_counter::<DomainCounter>,
                    &format!("update domain counter {} {}", domain_id, tag),
                    DomainCounter::take_query,
                )
                .await
            }
        }
    }

    /// Root counter for trees that predate it: one past every existing
    /// domain metadata object.
    async fn seed_root_counter(&self) -> Result<RootCounter, EngineError> {
        let names = self.store.list(&self.layout.domains_meta_dir()).await?;
        Ok(RootCounter {
            next_domain: names.iter().filter(|n| is_data_object(n)).count() as u64,
        })
    }

    /// Compare-and-swap loop over a counter object.
    ///
    /// `seed` is only called when the counter does not exist yet.
    async fn take_number<T, S, Fut, F>(
        &self,
        loc: &Location,
        seed: S,
        message: &str,
        take: F,
    ) -> Result<u64, EngineError>
    where
        T: Serialize + DeserializeOwned,
        S: Fn() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
        F: Fn(&mut T) -> u64,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let (mut counter, precondition) = match read_json::<T>(self.store, loc).await? {
                Some((counter, version)) => (counter, Precondition::Matches(version)),
                None => (seed().await?, Precondition::Absent),
            };
            let number = take(&mut counter);

            match self
                .store
                .write(loc, &to_json_bytes(&counter)?, message, precondition)
                .await
            {
                Ok(_) => return Ok(number),
                Err(err) if err.is_conflict() => {
                    output::debug(
                        format!("{} changed concurrently (attempt {})", loc, attempt),
                        self.verbosity,
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::Conflict {
            location: loc.clone(),
            attempts: MAX_CAS_ATTEMPTS,
        })
    }
}
