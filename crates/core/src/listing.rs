//! Paged listing and size aggregation
//!
//! Object stores have no server-side "size of prefix" query, so every size is
//! computed by walking the full flat key space page by page.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::error::{Error, Result};
use crate::traits::{ListOptions, ListPage, ObjectEntry, ObjectStore};

/// Page size requested from the store
pub const PAGE_SIZE: i32 = 1000;

/// Operations built on top of the [`ObjectStore`] primitives
#[async_trait]
pub trait ObjectStoreExt: ObjectStore {
    /// Stream every page of a listing, following continuation tokens
    fn pages<'a>(&'a self, bucket: &'a str, options: ListOptions)
    -> BoxStream<'a, Result<ListPage>>;

    /// Sum of object sizes over the whole bucket
    async fn calculate_total_size(&self, bucket: &str) -> Result<i64>;

    /// Sum of object sizes over keys starting with `prefix`
    async fn calculate_prefix_size(&self, bucket: &str, prefix: &str) -> Result<i64>;

    /// One level of hierarchy under `prefix`: folders first, then objects
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<ObjectEntry>>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStoreExt for T {
    fn pages<'a>(
        &'a self,
        bucket: &'a str,
        options: ListOptions,
    ) -> BoxStream<'a, Result<ListPage>> {
        stream::try_unfold(Some(options), move |next| fetch_page(self, bucket, next)).boxed()
    }

    async fn calculate_total_size(&self, bucket: &str) -> Result<i64> {
        self.calculate_prefix_size(bucket, "").await
    }

    async fn calculate_prefix_size(&self, bucket: &str, prefix: &str) -> Result<i64> {
        let options = ListOptions {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            max_keys: Some(PAGE_SIZE),
            ..Default::default()
        };

        let total = self
            .pages(bucket, options)
            .try_fold(0i64, |total, page| async move {
                let page_size: i64 = page.objects.iter().filter_map(|o| o.size).sum();
                Ok::<_, Error>(total + page_size)
            })
            .await?;

        tracing::debug!(bucket, prefix, total, "Calculated size");
        Ok(total)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<ObjectEntry>> {
        let options = ListOptions {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            delimiter: Some(delimiter.to_string()),
            max_keys: Some(PAGE_SIZE),
            continuation_token: None,
        };

        let mut folders = Vec::new();
        let mut objects = Vec::new();
        let mut pages = self.pages(bucket, options);
        while let Some(page) = pages.try_next().await? {
            folders.extend(page.prefixes.into_iter().map(ObjectEntry::folder));
            objects.extend(page.objects);
        }

        folders.extend(objects);
        Ok(folders)
    }
}

/// Fetch one page and work out the options for the page after it
async fn fetch_page<T: ObjectStore + ?Sized>(
    store: &T,
    bucket: &str,
    next: Option<ListOptions>,
) -> Result<Option<(ListPage, Option<ListOptions>)>> {
    let Some(options) = next else {
        return Ok(None);
    };
    if bucket.is_empty() {
        return Err(Error::NoBucketSelected);
    }

    let page = store.list_page(bucket, options.clone()).await?;
    let next = match (page.truncated, &page.continuation_token) {
        (true, Some(token)) => Some(ListOptions {
            continuation_token: Some(token.clone()),
            ..options
        }),
        (true, None) => {
            tracing::warn!(bucket, "Truncated listing without continuation token");
            None
        }
        (false, _) => None,
    };

    Ok(Some((page, next)))
}
