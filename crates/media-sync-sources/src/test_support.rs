use crate::error::SourceError;
use crate::fetch::{FetchClient, FetchRequest, FetchResponse};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Route = (Method, String);

/// In-memory `FetchClient`. Responses are keyed by method and url without
/// query parameters; a queue of several responses is consumed in order and
/// its last entry repeats. Status codes go through the same accepted-set
/// check as the real gateway.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<Route, VecDeque<Result<(u16, Vec<u8>), SourceError>>>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, url: &str, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.push(method, url, Ok((status, body.into())));
        self
    }

    pub fn fail(&self, method: Method, url: &str, error: SourceError) -> &Self {
        self.push(method, url, Err(error));
        self
    }

    fn push(&self, method: Method, url: &str, response: Result<(u16, Vec<u8>), SourceError>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

#[async_trait]
impl FetchClient for FakeFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, SourceError> {
        self.requests.lock().unwrap().push(request.clone());

        let next = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&(request.method.clone(), request.url.clone())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let (status, body) = match next {
            Some(response) => response?,
            None => {
                return Err(SourceError::Transport {
                    url: request.url,
                    message: "no route".to_string(),
                })
            }
        };

        if !request.accepts(status) {
            return Err(SourceError::UnexpectedStatus {
                url: request.url,
                status,
                expected: request.accepted_statuses,
            });
        }
        Ok(FetchResponse {
            url: request.url,
            status,
            body,
        })
    }
}
