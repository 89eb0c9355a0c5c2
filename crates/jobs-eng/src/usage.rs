//! Per-author usage totals across the build-sh and swagger-py collections.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    models::{AuthorCount, Collection},
    store::{DocumentStore, StoreResult},
};

/// Usage counts of a single author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorUsageCount {
    pub count_build_sh: i64,
    pub count_swagger_py: i64,
}

/// Merged view rendered by the detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageDetail {
    pub total_usages: BTreeMap<String, AuthorUsageCount>,
    pub total_build_sh: i64,
    pub total_swagger_py: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageSource {
    BuildSh,
    SwaggerPy,
}

impl UsageSource {
    pub fn collection(self) -> Collection {
        match self {
            UsageSource::BuildSh => Collection::BuildShUsages,
            UsageSource::SwaggerPy => Collection::SwaggerPyUsages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    WaitingBoth,
    WaitingOne,
    BothReady,
}

/// Two-slot accumulator for the concurrent aggregations of one request.
#[derive(Debug, Default)]
pub struct UsageJoin {
    build_sh: Option<Vec<AuthorCount>>,
    swagger_py: Option<Vec<AuthorCount>>,
}

impl UsageJoin {
    pub fn state(&self) -> JoinState {
        match (self.build_sh.is_some(), self.swagger_py.is_some()) {
            (true, true) => JoinState::BothReady,
            (false, false) => JoinState::WaitingBoth,
            _ => JoinState::WaitingOne,
        }
    }

    pub fn is_filled(&self, source: UsageSource) -> bool {
        match source {
            UsageSource::BuildSh => self.build_sh.is_some(),
            UsageSource::SwaggerPy => self.swagger_py.is_some(),
        }
    }

    pub fn fill(&mut self, source: UsageSource, counts: Vec<AuthorCount>) -> JoinState {
        let slot = match source {
            UsageSource::BuildSh => &mut self.build_sh,
            UsageSource::SwaggerPy => &mut self.swagger_py,
        };
        *slot = Some(counts);
        self.state()
    }

    /// The merged detail once both slots are filled.
    pub fn merged(&self) -> Option<UsageDetail> {
        match (&self.build_sh, &self.swagger_py) {
            (Some(build_sh), Some(swagger_py)) => Some(merge_counts(build_sh, swagger_py)),
            _ => None,
        }
    }
}

/// Merge the two group-by-author results; an author missing from one side
/// counts zero there.
pub fn merge_counts(build_sh: &[AuthorCount], swagger_py: &[AuthorCount]) -> UsageDetail {
    let mut detail = UsageDetail::default();

    for group in build_sh {
        detail
            .total_usages
            .entry(group.author_key())
            .or_default()
            .count_build_sh = group.count;
        detail.total_build_sh += group.count;
    }

    for group in swagger_py {
        detail
            .total_usages
            .entry(group.author_key())
            .or_default()
            .count_swagger_py = group.count;
        detail.total_swagger_py += group.count;
    }

    detail
}

/// Run both aggregations concurrently and merge them once the slower one
/// completes. The first store error ends the request; the other aggregation
/// is dropped.
pub async fn collect_usage_detail(store: &dyn DocumentStore) -> StoreResult<UsageDetail> {
    let build_sh = store.count_by_author(UsageSource::BuildSh.collection());
    let swagger_py = store.count_by_author(UsageSource::SwaggerPy.collection());
    tokio::pin!(build_sh, swagger_py);

    let mut join = UsageJoin::default();
    loop {
        let state = tokio::select! {
            counts = &mut build_sh, if !join.is_filled(UsageSource::BuildSh) => {
                join.fill(UsageSource::BuildSh, counts?)
            }
            counts = &mut swagger_py, if !join.is_filled(UsageSource::SwaggerPy) => {
                join.fill(UsageSource::SwaggerPy, counts?)
            }
        };
        tracing::debug!(?state, "Usage aggregation progressed");

        if let Some(detail) = join.merged() {
            return Ok(detail);
        }
    }
}
