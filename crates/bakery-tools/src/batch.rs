//! Concurrent runs of a driver over many targets

use crate::error::{Result, ToolError};
use bakery_core::ImageTarget;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::future::Future;

/// Outcome for one target of a batch
#[derive(Debug)]
pub struct TargetResult<T> {
    pub uid: String,
    pub result: Result<T>,
}

/// Run `run` for every target concurrently
///
/// Every target runs to completion; results keep the order of `targets`.
pub async fn run_all<'t, 'c, T, F, Fut>(
    targets: &'t [ImageTarget<'c>],
    run: F,
) -> Vec<TargetResult<T>>
where
    F: Fn(&'t ImageTarget<'c>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let futures: Vec<_> = targets
        .iter()
        .map(|target| {
            let uid = target.uid();
            let fut = run(target);
            async move {
                TargetResult {
                    uid,
                    result: fut.await,
                }
            }
        })
        .collect();

    join_all(futures).await
}

/// Group failed results, and successes rejected by `check`, into one error
pub fn group_failures<T>(
    results: &[TargetResult<T>],
    check: impl Fn(&T) -> Result<()>,
) -> Result<()> {
    let failures: BTreeMap<String, String> = results
        .iter()
        .filter_map(|r| {
            let message = match &r.result {
                Ok(value) => check(value).err().map(|e| e.to_string()),
                Err(e) => Some(e.to_string()),
            };
            message.map(|m| (r.uid.clone(), m))
        })
        .collect();

    match ToolError::group(failures) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
