//! Background page fetching.
//!
//! The terminal host must keep drawing while a page is being produced, so
//! the data source lives on a worker thread and requests/responses travel
//! over channels. The worker exits once the fetcher is dropped.

use super::DataSource;
use crate::model::{FetchError, ItemRecord, PageNumber};
use crate::pagination::FetchRequest;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Outcome of one page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    /// Page that was requested.
    pub page: PageNumber,
    /// Records, or why the page could not be produced.
    pub result: Result<Vec<ItemRecord>, FetchError>,
}

/// Data source running on its own thread.
#[derive(Debug)]
pub struct PageFetcher {
    requests: Sender<FetchRequest>,
    responses: Receiver<PageResponse>,
}

impl PageFetcher {
    /// Move `source` onto a worker thread.
    pub fn spawn(mut source: Box<dyn DataSource>) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<FetchRequest>();
        let (response_tx, response_rx) = mpsc::channel();

        thread::spawn(move || {
            for request in request_rx {
                let result = source.fetch_page(&request);
                let response = PageResponse {
                    page: request.page,
                    result,
                };
                if response_tx.send(response).is_err() {
                    break;
                }
            }
            debug!("Page fetcher stopped");
        });

        Self {
            requests: request_tx,
            responses: response_rx,
        }
    }

    /// Queue a request. Returns false if the worker has gone away.
    pub fn request(&self, request: FetchRequest) -> bool {
        self.requests.send(request).is_ok()
    }

    /// A finished response, if one is ready.
    pub fn try_recv(&self) -> Option<PageResponse> {
        self.responses.try_recv().ok()
    }

    /// Wait up to `timeout` for a response.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PageResponse> {
        self.responses.recv_timeout(timeout).ok()
    }
}
