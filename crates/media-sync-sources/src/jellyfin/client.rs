use crate::error::SourceError;
use crate::fetch::{FetchClient, FetchRequest};
use crate::jellyfin::api::{ItemsResponse, MovieDto, UserDto, UserItemDto};
use crate::traits::MediaServer;
use async_trait::async_trait;
use media_sync_models::{CollectionItem, LibraryItem, MediaServerUser};
use std::sync::Arc;
use tracing::debug;

const NO_CONTENT: u16 = 204;

pub struct JellyfinClient {
    fetcher: Arc<dyn FetchClient>,
    base_url: String,
    api_key: String,
}

impl JellyfinClient {
    pub fn new(fetcher: Arc<dyn FetchClient>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> FetchRequest {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        FetchRequest::new(method, url)
            .header("content-type", "application/json; charset=utf-8")
            .param("ApiKey", self.api_key.as_str())
    }

    fn collection_items_path(collection_id: &str) -> String {
        format!("Collections/{}/Items", urlencoding::encode(collection_id))
    }
}

#[async_trait]
impl MediaServer for JellyfinClient {
    fn server_name(&self) -> &str {
        "jellyfin"
    }

    async fn users(&self) -> Result<Vec<MediaServerUser>, SourceError> {
        let response = self.fetcher.fetch(self.request(reqwest::Method::GET, "Users")).await?;
        let users: Vec<UserDto> = response.json()?;
        Ok(users.into_iter().map(MediaServerUser::from).collect())
    }

    async fn library_movies(&self) -> Result<Vec<LibraryItem>, SourceError> {
        let request = self
            .request(reqwest::Method::GET, "Items")
            .param("Recursive", "true")
            .param("IncludeItemTypes", "Movie")
            .param("fields", "MediaSources,People");
        let response = self.fetcher.fetch(request).await?;
        let movies: ItemsResponse<MovieDto> = response.json()?;
        debug!(movies = movies.items.len(), "Fetched library snapshot");
        Ok(movies.items.into_iter().map(LibraryItem::from).collect())
    }

    async fn collection_items(&self, user_id: &str, collection_id: &str) -> Result<Vec<CollectionItem>, SourceError> {
        let request = self
            .request(reqwest::Method::GET, "Items")
            .param("ParentId", collection_id)
            .param("Recursive", "true")
            .param("IncludeItemTypes", "Movie")
            .param("enableUserData", "true")
            .param("userId", user_id);
        let response = self.fetcher.fetch(request).await?;
        let items: ItemsResponse<UserItemDto> = response.json()?;
        Ok(items.items.into_iter().map(CollectionItem::from).collect())
    }

    async fn remove_from_collection(&self, collection_id: &str, item_id: &str) -> Result<(), SourceError> {
        let request = self
            .request(reqwest::Method::DELETE, &Self::collection_items_path(collection_id))
            .param("ids", item_id)
            .accept(&[NO_CONTENT]);
        self.fetcher.fetch(request).await?;
        Ok(())
    }

    async fn add_to_collection(&self, collection_id: &str, item_ids: &[String]) -> Result<(), SourceError> {
        if item_ids.is_empty() {
            return Ok(());
        }
        let request = self
            .request(reqwest::Method::POST, &Self::collection_items_path(collection_id))
            .param("ids", item_ids.join(","))
            .accept(&[NO_CONTENT]);
        self.fetcher.fetch(request).await?;
        Ok(())
    }
}
