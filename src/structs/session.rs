use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, RwLock};
use std::thread;

use tracing::{debug, info, warn};

use super::client::ApiClient;
use super::organization::OrganizationTree;
use super::{Credential, SessionToken};
use crate::errors::LinkError;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful.\nPlease select your studio below.";

/// Outcome notifications of a login or fetch, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoginFailed(LinkError),
    OrganizationLoaded { studios: usize },
    OrganizationFailed(LinkError),
}

impl SessionEvent {
    /// Text to show the user for this event.
    pub fn message(&self) -> String {
        match self {
            SessionEvent::LoggedIn => LOGIN_SUCCESS_MESSAGE.to_string(),
            SessionEvent::LoginFailed(err) => failure_message("Login failed:", err),
            SessionEvent::OrganizationLoaded { studios } => format!("Loaded {} studio(s).", studios),
            SessionEvent::OrganizationFailed(err) => {
                failure_message("Failed to retrieve studios:", err)
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SessionEvent::LoginFailed(_) | SessionEvent::OrganizationFailed(_)
        )
    }
}

fn failure_message(title: &str, err: &LinkError) -> String {
    let mut message = format!("{}\n", title);
    for line in err.lines() {
        message.push_str(&line);
        message.push('\n');
    }
    message
}

/// Claim on the session's single busy flag. Released on drop.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn try_claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Account session: runs the login → organization fetch sequence and owns the tree.
///
/// Clones share the busy flag and the tree. At most one call of either step is in
/// flight per session; a call made while busy is dropped and returns `None`.
#[derive(Debug, Clone)]
pub struct Session {
    client: Arc<ApiClient>,
    busy: Arc<AtomicBool>,
    tree: Arc<RwLock<OrganizationTree>>,
}

impl Session {
    /// Creates an idle session with an empty organization tree.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
            busy: Arc::new(AtomicBool::new(false)),
            tree: Arc::new(RwLock::new(OrganizationTree::default())),
        }
    }

    /// Whether a login or fetch is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the current organization tree.
    pub fn organization(&self) -> OrganizationTree {
        match self.tree.read() {
            Ok(tree) => tree.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Starts a login. On success the organization fetch follows on the same worker.
    ///
    /// Returns immediately. The receiver yields the events and closes when the
    /// sequence is over.
    pub fn login(&self, credential: Credential) -> Option<Receiver<SessionEvent>> {
        let Some(guard) = BusyGuard::try_claim(&self.busy) else {
            debug!("login ignored: a user API request is already in flight");
            return None;
        };

        let worker = self.worker();
        Some(spawn_worker(guard, SessionEvent::LoginFailed, move |tx| {
            worker.login(credential, tx)
        }))
    }

    /// Starts an organization fetch with a token from a previous login.
    pub fn fetch_organization(&self, token: SessionToken) -> Option<Receiver<SessionEvent>> {
        let Some(guard) = BusyGuard::try_claim(&self.busy) else {
            debug!("organization fetch ignored: a user API request is already in flight");
            return None;
        };

        let worker = self.worker();
        Some(spawn_worker(guard, SessionEvent::OrganizationFailed, move |tx| {
            worker.fetch(&token, tx)
        }))
    }

    fn worker(&self) -> Worker {
        Worker {
            client: Arc::clone(&self.client),
            tree: Arc::clone(&self.tree),
        }
    }
}

/// Runs `job` on a worker thread holding `guard`. If the thread cannot start,
/// the receiver gets a single `failed` event instead.
fn spawn_worker<F>(
    guard: BusyGuard,
    failed: fn(LinkError) -> SessionEvent,
    job: F,
) -> Receiver<SessionEvent>
where
    F: FnOnce(&Sender<SessionEvent>) + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawn_tx = tx.clone();

    let spawned = thread::Builder::new()
        .name("ga-link-session".to_string())
        .spawn(move || {
            let _guard = guard;
            job(&tx);
        });

    if let Err(e) = spawned {
        report_spawn_failure(&spawn_tx, failed, &e);
    }

    rx
}

fn report_spawn_failure(
    tx: &Sender<SessionEvent>,
    failed: fn(LinkError) -> SessionEvent,
    err: &std::io::Error,
) {
    warn!(error = %err, "failed to start session worker");
    let _ = tx.send(failed(LinkError::Transport(err.to_string())));
}

struct Worker {
    client: Arc<ApiClient>,
    tree: Arc<RwLock<OrganizationTree>>,
}

impl Worker {
    fn login(&self, credential: Credential, tx: &Sender<SessionEvent>) {
        let result = self.client.request_token(&credential);
        drop(credential);

        match result {
            Ok(token) => {
                info!("login succeeded");
                let _ = tx.send(SessionEvent::LoggedIn);
                self.fetch(&token, tx);
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                let _ = tx.send(SessionEvent::LoginFailed(err));
            }
        }
    }

    fn fetch(&self, token: &SessionToken, tx: &Sender<SessionEvent>) {
        match self.client.fetch_studios(token) {
            Ok(studios) => {
                let count = studios.len();
                match self.tree.write() {
                    Ok(mut tree) => tree.replace(studios),
                    Err(poisoned) => poisoned.into_inner().replace(studios),
                }

                info!(studios = count, "organization loaded");
                let _ = tx.send(SessionEvent::OrganizationLoaded { studios: count });
            }
            Err(err) => {
                warn!(error = %err, "organization fetch failed");
                let _ = tx.send(SessionEvent::OrganizationFailed(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::client::ClientOptions;

    #[test]
    fn busy_flag_drops_second_call() {
        let mut server = mockito::Server::new();
        let token_mock = server
            .mock("POST", "/ext/v1/token")
            .with_status(200)
            .with_body(r#"{"errors":[],"results":[{"token":"t"}]}"#)
            .expect(0)
            .create();

        let session = Session::new(
            ApiClient::new(ClientOptions {
                base_url: server.url(),
                ..ClientOptions::default()
            })
            .unwrap(),
        );

        let held = BusyGuard::try_claim(&session.busy).unwrap();
        assert!(session.is_busy());
        assert!(session
            .login(Credential::new("dev@studio.io", "pw"))
            .is_none());
        assert!(session
            .fetch_organization(SessionToken::new("t"))
            .is_none());
        drop(held);

        assert!(!session.is_busy());
        token_mock.assert();
    }

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        let first = BusyGuard::try_claim(&flag).unwrap();
        assert!(BusyGuard::try_claim(&flag).is_none());
        drop(first);
        assert!(BusyGuard::try_claim(&flag).is_some());
    }

    #[test]
    fn spawn_failure_reports_the_calling_step() {
        let (tx, rx) = mpsc::channel();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");

        report_spawn_failure(&tx, SessionEvent::OrganizationFailed, &err);
        report_spawn_failure(&tx, SessionEvent::LoginFailed, &err);
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert!(matches!(
            events[0],
            SessionEvent::OrganizationFailed(LinkError::Transport(_))
        ));
        assert!(matches!(
            events[1],
            SessionEvent::LoginFailed(LinkError::Transport(_))
        ));
    }

    #[test]
    fn failure_messages_list_server_messages() {
        let event = SessionEvent::LoginFailed(LinkError::Rejected {
            status: 401,
            messages: vec!["Wrong password".into(), "Try again".into()],
        });
        assert_eq!(event.message(), "Login failed:\nWrong password\nTry again\n");
        assert!(event.is_failure());
        assert!(!SessionEvent::LoggedIn.is_failure());
    }
}
