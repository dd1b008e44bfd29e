//! engine::resolver
//!
//! Read-only walks of the persisted tree.
//!
//! # Resolution
//!
//! | Segments | Result                                              |
//! |----------|-----------------------------------------------------|
//! | 1        | the domain's counter snapshot, if any               |
//! | 2        | query scopes under `domain/path`, by numeric id     |
//! | 3        | the record at `domain/path/query`, if any           |
//!
//! Anything else is a malformed code.

use num_bigint::BigUint;
use serde::Serialize;

use super::objects::read_json;
use super::EngineError;
use crate::core::codec::Codec;
use crate::core::layout::{is_data_object, Layout, Location};
use crate::core::types::{Code, DomainCounter, Record, ScopeMeta};
use crate::store::ContentStore;

/// What a code resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// One segment: the domain's counters.
    Domain {
        domain_id: String,
        counter: Option<DomainCounter>,
    },
    /// Two segments: every query scope under the path.
    Queries {
        domain_id: String,
        path_id: String,
        queries: Vec<ScopeMeta>,
    },
    /// Three segments: the terminal record.
    Record {
        code: String,
        record: Option<Record>,
    },
}

/// Looks up codes.
pub struct Resolver<'a> {
    store: &'a dyn ContentStore,
    codec: Codec,
    layout: Layout,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a store.
    pub fn new(store: &'a dyn ContentStore, codec: Codec, layout: Layout) -> Self {
        Self {
            store,
            codec,
            layout,
        }
    }

    /// Resolve a full or partial code.
    ///
    /// Empty segments are ignored, so `/0/1/` is the same as `0/1`.
    pub async fn resolve(&self, code: &str) -> Result<Resolution, EngineError> {
        match Code::parse(code)? {
            Code::Domain { domain } => {
                let counter = read_json::<DomainCounter>(
                    self.store,
                    &self.layout.domain_counter(&domain),
                )
                .await?
                .map(|(counter, _)| counter);
                Ok(Resolution::Domain {
                    domain_id: domain,
                    counter,
                })
            }
            Code::Path { domain, path } => {
                let queries = self
                    .scopes_in(&self.layout.queries_dir(&domain, &path))
                    .await?;
                Ok(Resolution::Queries {
                    domain_id: domain,
                    path_id: path,
                    queries,
                })
            }
            Code::Full {
                domain,
                path,
                query,
            } => {
                let record =
                    read_json::<Record>(self.store, &self.layout.record(&domain, &path, &query))
                        .await?
                        .map(|(record, _)| record);
                Ok(Resolution::Record {
                    code: Code::full(&domain, &path, &query),
                    record,
                })
            }
        }
    }

    /// Every known domain scope, by numeric id.
    pub async fn list_domains(&self) -> Result<Vec<ScopeMeta>, EngineError> {
        self.scopes_in(&self.layout.domains_meta_dir()).await
    }

    /// Read every metadata object in a directory, ordered by id value.
    async fn scopes_in(&self, dir: &Location) -> Result<Vec<ScopeMeta>, EngineError> {
        let mut entries: Vec<(BigUint, ScopeMeta)> = Vec::new();

        for name in self.store.list(dir).await? {
            if !is_data_object(&name) {
                continue;
            }
            let loc = dir.join(&name);
            let Some((meta, _)) = read_json::<ScopeMeta>(self.store, &loc).await? else {
                continue;
            };
            let value = self
                .codec
                .value_of(&meta.id)
                .map_err(|e| EngineError::CorruptObject {
                    location: loc.clone(),
                    message: e.to_string(),
                })?;
            entries.push((value, meta));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries.into_iter().map(|(_, meta)| meta).collect())
    }
}
