use crate::error::SourceError;
use crate::fetch::{FetchClient, FetchRequest};
use crate::radarr::api::{AddMovieBody, MovieLookup};
use crate::traits::AcquisitionService;
use async_trait::async_trait;
use media_sync_models::{AcquisitionOutcome, AcquisitionRecord, AcquisitionRequest};
use std::sync::Arc;
use tracing::debug;

const API_KEY_HEADER: &str = "X-Api-Key";

/// Radarr v3 API client
pub struct RadarrClient {
    fetcher: Arc<dyn FetchClient>,
    base_url: String,
    api_key: String,
}

impl RadarrClient {
    /// `base_url` is the API root, e.g. `http://localhost:7878/api/v3/`
    pub fn new(fetcher: Arc<dyn FetchClient>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AcquisitionService for RadarrClient {
    fn service_name(&self) -> &str {
        "radarr"
    }

    async fn lookup_movie(&self, tmdb_id: &str) -> Result<Vec<AcquisitionRecord>, SourceError> {
        let request = FetchRequest::get(self.endpoint("movie/lookup"))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .param("term", format!("tmdb:{}", tmdb_id));
        let response = self.fetcher.fetch(request).await?;
        let rows: Vec<MovieLookup> = response.json()?;
        debug!(tmdb_id, results = rows.len(), "Radarr lookup");
        Ok(rows.into_iter().map(AcquisitionRecord::from).collect())
    }

    async fn add_movie(&self, request: &AcquisitionRequest) -> Result<AcquisitionOutcome, SourceError> {
        // Radarr answers 400 when the movie is already in the library
        let fetch = FetchRequest::post(self.endpoint("movie"))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header("Content-Type", "application/json")
            .json(&AddMovieBody::from(request))?
            .accept(&[201, 400]);
        let response = self.fetcher.fetch(fetch).await?;
        Ok(match response.status {
            201 => AcquisitionOutcome::Added,
            _ => AcquisitionOutcome::AlreadyPresent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeFetcher;
    use media_sync_models::MovieCategory;
    use reqwest::Method;

    const BASE: &str = "http://radarr.test/api/v3/";
    const LOOKUP: &str = "http://radarr.test/api/v3/movie/lookup";
    const MOVIE: &str = "http://radarr.test/api/v3/movie";

    fn client(fetcher: &Arc<FakeFetcher>) -> RadarrClient {
        RadarrClient::new(fetcher.clone(), BASE, "secret")
    }

    fn request() -> AcquisitionRequest {
        AcquisitionRequest {
            tmdb_id: 129,
            title: "Spirited Away".to_string(),
            year: 2001,
            quality_profile_id: 11,
            monitored: true,
            root_folder_path: "/anime_movies".to_string(),
            search_on_add: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_maps_records() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.respond(
            Method::GET,
            LOOKUP,
            200,
            r#"[{"movieFile":{"relativePath":"Spirited Away (2001).mkv"},"monitored":true,"title":"Spirited Away","tmdbId":129,"year":2001,"genres":["Animation","Family","Fantasy"]},
                {"title":"Spirited Away","tmdbId":129,"year":2001,"genres":[]}]"#,
        );

        let records = client(&fetcher).lookup_movie("129").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Spirited Away");
        assert!(records[0].has_file);
        assert!(records[0].monitored);
        assert_eq!(records[0].category, MovieCategory::Animation);
        assert!(!records[1].has_file);
        assert_eq!(records[1].category, MovieCategory::General);

        let sent = &fetcher.requests()[0];
        assert_eq!(sent.params.get("term").map(String::as_str), Some("tmdb:129"));
        assert_eq!(sent.headers.get(API_KEY_HEADER).map(String::as_str), Some("secret"));
        assert!(!sent.use_proxy);
    }

    #[tokio::test]
    async fn test_empty_path_is_not_a_file() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.respond(
            Method::GET,
            LOOKUP,
            200,
            r#"[{"movieFile":{"relativePath":""},"title":"Heat","tmdbId":949,"year":1995,"genres":["Crime"]}]"#,
        );
        let records = client(&fetcher).lookup_movie("949").await.unwrap();
        assert!(!records[0].has_file);
    }

    #[tokio::test]
    async fn test_unknown_id_is_empty() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.respond(Method::GET, LOOKUP, 200, "[]");
        assert!(client(&fetcher).lookup_movie("0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lookup_is_decode_error() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.respond(Method::GET, LOOKUP, 200, "<html>login</html>");
        let err = client(&fetcher).lookup_movie("1").await.unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_add_created_and_existing_both_succeed() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.respond(Method::POST, MOVIE, 201, "{}");
        fetcher.respond(Method::POST, MOVIE, 400, r#"[{"errorMessage":"This movie has already been added"}]"#);
        let radarr = client(&fetcher);

        assert_eq!(radarr.add_movie(&request()).await.unwrap(), AcquisitionOutcome::Added);
        assert_eq!(radarr.add_movie(&request()).await.unwrap(), AcquisitionOutcome::AlreadyPresent);

        let body = fetcher.requests()[0].body.clone().unwrap();
        assert_eq!(body["tmdbId"], 129);
        assert_eq!(body["qualityProfileId"], 11);
        assert_eq!(body["rootFolderPath"], "/anime_movies");
        assert_eq!(body["monitored"], true);
        assert_eq!(body["addOptions"]["searchForMovie"], true);
    }

    #[tokio::test]
    async fn test_add_other_status_fails() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.respond(Method::POST, MOVIE, 401, "");
        let err = client(&fetcher).add_movie(&request()).await.unwrap_err();
        assert!(matches!(err, SourceError::UnexpectedStatus { status: 401, .. }));
    }
}
