//! Threaded host for the search loop.
//!
//! The search runs on its own thread. The host sends commands and reads
//! events over `crossbeam-channel` queues; neither side touches the other's
//! state. Between batches the worker polls for commands, so a stop takes
//! effect within one batch, and the cancel token cuts the in-flight batch
//! short as soon as the host asks.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::challenge::{ChallengeDescriptor, StartSearch};
use crate::config::SearchConfig;
use crate::encoding::EncodingError;
use crate::error::{Error, Result};
use crate::hash::{HashScheme, Hasher, KeccakHasher};
use crate::search::{CancelToken, Search, SearchEvent};

/// Identifies one search started on a worker.
pub type SearchId = u64;

/// An event tagged with the search that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerEvent {
    pub search: SearchId,
    #[serde(flatten)]
    pub event: SearchEvent,
}

enum SearchRequest {
    Parsed(ChallengeDescriptor, usize),
    Raw(StartSearch),
}

enum Command {
    Start {
        id: SearchId,
        request: SearchRequest,
        cancel: CancelToken,
    },
    Stop,
    Shutdown,
}

/// Handle to a search thread. Dropping it shuts the thread down.
pub struct Worker {
    commands: Sender<Command>,
    events: Receiver<WorkerEvent>,
    active: Option<CancelToken>,
    next_id: SearchId,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker hashing with the contract-compatible Keccak hasher.
    pub fn spawn(config: SearchConfig) -> Result<Self> {
        Self::spawn_with(config, |descriptor: &ChallengeDescriptor, scheme: HashScheme| {
            KeccakHasher::new(descriptor, scheme)
        })
    }

    /// Spawn a worker that builds a hasher per search with `make_hasher`.
    pub fn spawn_with<H, F>(config: SearchConfig, make_hasher: F) -> Result<Self>
    where
        H: Hasher + 'static,
        F: FnMut(&ChallengeDescriptor, HashScheme) -> std::result::Result<H, EncodingError> + Send + 'static,
    {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("nonce-search".to_string())
            .spawn(move || run(config, make_hasher, command_rx, event_tx))?;

        Ok(Worker {
            commands: command_tx,
            events: event_rx,
            active: None,
            next_id: 0,
            handle: Some(handle),
        })
    }

    /// Start a search, stopping any search already running.
    pub fn start(&mut self, descriptor: ChallengeDescriptor, difficulty: usize) -> Result<SearchId> {
        self.begin(SearchRequest::Parsed(descriptor, difficulty))
    }

    /// Start a search from a host command. Invalid fields are reported as
    /// an `Error` event for the returned search id.
    pub fn start_command(&mut self, command: StartSearch) -> Result<SearchId> {
        self.begin(SearchRequest::Raw(command))
    }

    /// Stop the running search, if any. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(cancel) = self.active.take() {
            cancel.cancel();
        }
        self.commands.send(Command::Stop).map_err(|_| Error::WorkerGone)
    }

    /// Events from all searches, in the order they were generated.
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    fn begin(&mut self, request: SearchRequest) -> Result<SearchId> {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }

        let id = self.next_id;
        self.next_id += 1;
        let cancel = CancelToken::new();
        self.commands
            .send(Command::Start {
                id,
                request,
                cancel: cancel.clone(),
            })
            .map_err(|_| Error::WorkerGone)?;
        self.active = Some(cancel);
        Ok(id)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(cancel) = self.active.take() {
            cancel.cancel();
        }
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<H, F>(
    config: SearchConfig,
    mut make_hasher: F,
    commands: Receiver<Command>,
    events: Sender<WorkerEvent>,
) where
    H: Hasher,
    F: FnMut(&ChallengeDescriptor, HashScheme) -> std::result::Result<H, EncodingError>,
{
    let mut current: Option<(SearchId, Search<H>)> = None;

    loop {
        let running = current.as_ref().map_or(false, |(_, search)| search.is_running());

        // Block while idle, poll between batches while searching.
        let command = if running {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            current = None;
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        };

        match command {
            Some(Command::Start { id, request, cancel }) => {
                if let Some((previous, _)) = current.take() {
                    debug!("search {} replaced by search {}", previous, id);
                }
                match build_search(&config, &mut make_hasher, request) {
                    Ok(search) => current = Some((id, search.with_cancel_token(cancel))),
                    Err(e) => {
                        warn!("search {} rejected: {}", id, e);
                        let event = SearchEvent::Error { message: e.to_string() };
                        if events.send(WorkerEvent { search: id, event }).is_err() {
                            break;
                        }
                    }
                }
            }
            Some(Command::Stop) => {
                if let Some((_, mut search)) = current.take() {
                    search.stop();
                }
            }
            Some(Command::Shutdown) => break,
            None => {}
        }

        if let Some((id, search)) = current.as_mut() {
            let id = *id;
            let mut host_gone = false;
            search.run_batch(config.batch_size, |event| {
                host_gone |= events.send(WorkerEvent { search: id, event }).is_err();
            });
            if host_gone {
                break;
            }
        }
    }

    debug!("search worker exiting");
}

fn build_search<H, F>(config: &SearchConfig, make_hasher: &mut F, request: SearchRequest) -> Result<Search<H>>
where
    H: Hasher,
    F: FnMut(&ChallengeDescriptor, HashScheme) -> std::result::Result<H, EncodingError>,
{
    let (descriptor, difficulty) = match request {
        SearchRequest::Parsed(descriptor, difficulty) => (descriptor, difficulty),
        SearchRequest::Raw(command) => command.parse()?,
    };
    let hasher = make_hasher(&descriptor, config.scheme)?;
    Search::with_config(hasher, difficulty, config)
}
