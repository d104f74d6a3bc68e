use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{Error, PagerBoundary, Result},
    spotify::client::SpotifyClient,
    types::Paging,
};

/// Outcome of a cursor move: the new page, or the boundary that stopped it.
pub type Step<'p, T> = std::result::Result<&'p [T], PagerBoundary>;

/// Bidirectional cursor over a `limit`/`offset` paginated collection.
///
/// The cursor only moves after a page was fetched successfully, so `offset`
/// is always a multiple of `limit` and `items` always belong to `offset`.
pub struct Pager<'c, T> {
    client: &'c SpotifyClient,
    endpoint: String,
    limit: u32,
    offset: u32,
    total: Option<u32>,
    items: Vec<T>,
    raw: Value,
}

impl<'c, T> Pager<'c, T>
where
    T: DeserializeOwned + Clone,
{
    /// Creates a pager and fetches the first page.
    ///
    /// # Arguments
    ///
    /// * `client` - Client used for every page fetch
    /// * `endpoint` - Collection endpoint answering with `{"items": [...], "total": n}`
    /// * `limit` - Page size, must be greater than 0
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut pager = Pager::<Playlist>::new(&client, "me/playlists", 10).await?;
    /// match pager.next().await? {
    ///     Ok(items) => println!("{} more playlists", items.len()),
    ///     Err(boundary) => println!("{boundary}"),
    /// }
    /// ```
    pub async fn new(
        client: &'c SpotifyClient,
        endpoint: impl Into<String>,
        limit: u32,
    ) -> Result<Self> {
        if limit == 0 {
            return Err(Error::InvalidInput(
                "limit must be greater than 0".to_string(),
            ));
        }

        let endpoint = endpoint.into();
        let (page, raw) = fetch_page(client, &endpoint, limit, 0).await?;
        Ok(Self {
            client,
            endpoint,
            limit,
            offset: 0,
            total: page.total,
            items: page.items,
            raw,
        })
    }

    /// Items of the current page.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Offset of the current page; always a multiple of [`limit`](Self::limit).
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Collection size as last reported by the API, if it reports one.
    pub fn total(&self) -> Option<u32> {
        self.total
    }

    /// Body of the last successful fetch.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Whether another page follows. Without a `total`, a full page is taken
    /// to mean there may be more.
    pub fn has_next(&self) -> bool {
        match self.total {
            Some(total) => self.offset + self.limit < total,
            None => self.items.len() >= self.limit as usize,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    /// Moves to the next page.
    ///
    /// Returns `Ok(Err(PagerBoundary::LimitReached))` without a request when
    /// the current page is the last one. If the fetch fails, the error is
    /// returned and the cursor stays on the current page.
    pub async fn next(&mut self) -> Result<Step<'_, T>> {
        if !self.has_next() {
            return Ok(Err(PagerBoundary::LimitReached));
        }
        self.move_to(self.offset + self.limit).await
    }

    /// Moves to the previous page.
    pub async fn previous(&mut self) -> Result<Step<'_, T>> {
        if !self.has_previous() {
            return Ok(Err(PagerBoundary::PreviousUnavailable));
        }
        self.move_to(self.offset.saturating_sub(self.limit)).await
    }

    async fn move_to(&mut self, offset: u32) -> Result<Step<'_, T>> {
        let (page, raw) = fetch_page(self.client, &self.endpoint, self.limit, offset).await?;
        self.offset = offset;
        self.total = page.total.or(self.total);
        self.items = page.items;
        self.raw = raw;
        Ok(Ok(&self.items))
    }

    /// Fetches the whole collection from offset 0, `limit` items per request,
    /// stopping at the first short page or once `total` is reached.
    ///
    /// The page currently held is reused instead of fetched again. The cursor
    /// is left where it is.
    pub async fn content(&self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut offset = 0;
        let mut total = self.total;

        loop {
            let items = if offset == self.offset {
                self.items.clone()
            } else {
                let (page, _) = fetch_page(self.client, &self.endpoint, self.limit, offset).await?;
                total = page.total.or(total);
                page.items
            };

            let fetched = items.len();
            all.extend(items);
            offset += self.limit;

            // a short page ends the collection even if `total` claims more
            let exhausted =
                fetched < self.limit as usize || total.is_some_and(|total| offset >= total);
            if exhausted {
                break;
            }
        }

        Ok(all)
    }
}

async fn fetch_page<T: DeserializeOwned>(
    client: &SpotifyClient,
    endpoint: &str,
    limit: u32,
    offset: u32,
) -> Result<(Paging<T>, Value)> {
    tracing::debug!(endpoint, limit, offset, "fetching page");
    let raw = client
        .request_with_query(
            Method::GET,
            endpoint,
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
            None,
        )
        .await?;
    let page: Paging<T> = serde_json::from_value(raw.clone())?;
    Ok((page, raw))
}
