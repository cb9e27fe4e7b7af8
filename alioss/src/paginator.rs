// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::client::Client;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::Stream;

/// A list request that can be continued page by page.
#[async_trait]
pub trait Paginate: Clone + Send + Sync + Sized + 'static {
    /// Result of one page.
    type Output: Send;

    /// Fetch one page.
    async fn fetch(&self, client: &Client) -> Result<Self::Output>;

    /// Build the request of the next page, `None` if `output` is the last page.
    fn next_request(&self, output: &Self::Output) -> Result<Option<Self>>;

    /// Cap the number of entries in each page.
    fn set_limit(&mut self, limit: i32);
}

/// Paginator walks all pages of a list request.
///
/// ```no_run
/// use alioss::{Client, Config, ListObjectsV2Request};
/// use futures::TryStreamExt;
///
/// # async fn example() -> alioss::Result<()> {
/// let client = Client::new(Config::new("cn-hangzhou"))?;
/// let pages = client
///     .paginator(ListObjectsV2Request::new("examplebucket").with_prefix("logs/"))
///     .with_limit(100)
///     .into_stream();
/// futures::pin_mut!(pages);
/// while let Some(page) = pages.try_next().await? {
///     for obj in page.contents {
///         println!("{}", obj.key);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Paginator<R: Paginate> {
    client: Client,
    next: Option<R>,
}

impl<R: Paginate> Paginator<R> {
    /// Create a paginator starting from `request`.
    pub fn new(client: Client, request: R) -> Self {
        Self {
            client,
            next: Some(request),
        }
    }

    /// Cap the number of entries in each page.
    pub fn with_limit(mut self, limit: i32) -> Self {
        if let Some(req) = self.next.as_mut() {
            req.set_limit(limit);
        }
        self
    }

    /// Check if there are more pages.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Fetch the next page.
    ///
    /// The paginator stops after an error.
    pub async fn next_page(&mut self) -> Result<R::Output> {
        let req = self
            .next
            .take()
            .ok_or_else(|| Error::invalid_argument("no more pages"))?;
        let output = req.fetch(&self.client).await?;
        self.next = req.next_request(&output)?;
        Ok(output)
    }

    /// Turn into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<R::Output>> + Send {
        futures::stream::try_unfold(self, |mut p| async move {
            if !p.has_next() {
                return Ok(None);
            }
            let page = p.next_page().await?;
            Ok(Some((page, p)))
        })
    }
}

impl Client {
    /// Create a paginator for a list request.
    pub fn paginator<R: Paginate>(&self, request: R) -> Paginator<R> {
        Paginator::new(self.clone(), request)
    }
}

/// Resolve the marker of the next page.
///
/// A truncated page must carry a marker, otherwise the listing would restart forever.
pub(crate) fn next_marker(
    op: &'static str,
    truncated: bool,
    marker: Option<&str>,
) -> Result<Option<String>> {
    if !truncated {
        return Ok(None);
    }
    match marker {
        Some(m) if !m.is_empty() => Ok(Some(m.to_string())),
        _ => Err(Error::deserialize("truncated page without next marker").with_operation(op)),
    }
}
