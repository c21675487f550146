//! In-memory backend that replays a scripted sequence of statuses and records
//! every call the poller makes.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use shelver_core::client::{ClientError, DownloadClient, DownloadState, DownloadStatus, Protocol};
use shelver_core::poller::{CancelFlag, StatusReporter, StatusTag};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FindExisting(String),
    Add {
        url: String,
        name: String,
        category: Option<String>,
    },
    Status(String),
    Path(String),
    Remove { id: String, delete_files: bool },
}

pub struct ScriptedClient {
    name: String,
    existing: Option<(String, DownloadStatus)>,
    add_result: Result<String, String>,
    statuses: Mutex<VecDeque<DownloadStatus>>,
    downloads: HashMap<String, String>,
    scripts: Mutex<HashMap<String, VecDeque<DownloadStatus>>>,
    download_path: Option<String>,
    cancel_after_polls: Option<(usize, CancelFlag)>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            existing: None,
            add_result: Ok("new-id".to_string()),
            statuses: Mutex::new(VecDeque::new()),
            downloads: HashMap::new(),
            scripts: Mutex::new(HashMap::new()),
            download_path: None,
            cancel_after_polls: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_existing(mut self, id: &str, status: DownloadStatus) -> Self {
        self.existing = Some((id.to_string(), status));
        self
    }

    pub fn with_add_error(mut self, reason: &str) -> Self {
        self.add_result = Err(reason.to_string());
        self
    }

    /// Statuses returned in order; the last one repeats forever.
    pub fn with_statuses(self, statuses: Vec<DownloadStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// Adding `url` yields `id`, whose statuses replay independently of the
    /// shared script.
    pub fn with_download(mut self, url: &str, id: &str, statuses: Vec<DownloadStatus>) -> Self {
        self.downloads.insert(url.to_string(), id.to_string());
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), statuses.into());
        self
    }

    pub fn with_download_path(mut self, path: impl Into<String>) -> Self {
        self.download_path = Some(path.into());
        self
    }

    /// Sets `flag` while answering the `polls`-th status query.
    pub fn cancel_after_polls(mut self, polls: usize, flag: CancelFlag) -> Self {
        self.cancel_after_polls = Some((polls, flag));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn removals(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Remove { id, delete_files } => Some((id, delete_files)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DownloadClient for ScriptedClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn find_existing(&self, url: &str) -> Option<(String, DownloadStatus)> {
        self.record(Call::FindExisting(url.to_string()));
        self.existing.clone()
    }

    async fn add_download(
        &self,
        url: &str,
        name: &str,
        category: Option<&str>,
    ) -> Result<String, ClientError> {
        self.record(Call::Add {
            url: url.to_string(),
            name: name.to_string(),
            category: category.map(str::to_string),
        });
        self.add_result
            .clone()
            .map(|id| self.downloads.get(url).cloned().unwrap_or(id))
            .map_err(|reason| ClientError::rejected(self.name.clone(), reason))
    }

    async fn get_status(&self, download_id: &str) -> DownloadStatus {
        self.record(Call::Status(download_id.to_string()));

        if let Some((polls, flag)) = &self.cancel_after_polls
            && self.count(|c| matches!(c, Call::Status(_))) >= *polls
        {
            flag.cancel();
        }

        if let Some(script) = self.scripts.lock().unwrap().get_mut(download_id) {
            return next_status(script);
        }
        next_status(&mut self.statuses.lock().unwrap())
    }

    async fn get_download_path(&self, download_id: &str) -> Option<String> {
        self.record(Call::Path(download_id.to_string()));
        self.download_path.clone()
    }

    async fn remove(&self, download_id: &str, delete_files: bool) -> bool {
        self.record(Call::Remove {
            id: download_id.to_string(),
            delete_files,
        });
        true
    }
}

fn next_status(script: &mut VecDeque<DownloadStatus>) -> DownloadStatus {
    if script.len() > 1 {
        script.pop_front().unwrap()
    } else {
        script
            .front()
            .cloned()
            .unwrap_or_else(|| DownloadStatus::new(0.0, DownloadState::Downloading))
    }
}

/// Reporter that keeps every progress and status report.
#[derive(Default)]
pub struct RecordingReporter {
    progress: Mutex<Vec<f64>>,
    statuses: Mutex<Vec<(StatusTag, Option<String>)>>,
}

impl RecordingReporter {
    pub fn progress_reports(&self) -> Vec<f64> {
        self.progress.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<(StatusTag, Option<String>)> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn last_status(&self) -> (StatusTag, Option<String>) {
        self.statuses().last().cloned().unwrap()
    }

    pub fn messages_for(&self, tag: StatusTag) -> Vec<String> {
        self.statuses()
            .into_iter()
            .filter(|(t, _)| *t == tag)
            .filter_map(|(_, message)| message)
            .collect()
    }
}

impl StatusReporter for RecordingReporter {
    fn progress(&self, percent: f64) {
        self.progress.lock().unwrap().push(percent);
    }

    fn status(&self, tag: StatusTag, message: Option<&str>) {
        self.statuses
            .lock()
            .unwrap()
            .push((tag, message.map(str::to_string)));
    }
}
