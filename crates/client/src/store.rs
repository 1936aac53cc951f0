//! Session broadcast store.
//!
//! One [`SessionStore`] per mounted UI tree owns the [`Session`] and the
//! listener on the provider's session-change stream. Components get a
//! [`SessionContext`]: read access plus the session operations, never a mutable
//! handle.
//!
//! Two counters, both only touched under the watch channel's lock:
//!
//! - `busy` counts the initial fetch plus local operations in flight;
//!   `loading` is exactly `busy > 0`, and `error` follows the operations.
//! - `generation` orders writes of `user`. A provider event, or a sign-in,
//!   sign-up or sign-out whose provider call has completed, takes a new
//!   generation; a user result is only published if its generation is still
//!   the latest. A fetch that resolves after a newer sign-out (or sign-in) has
//!   published is dropped instead of resurrecting stale state. Failed sign-ins
//!   and password operations never take a generation, so they cannot cancel a
//!   pending fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use tableside_auth::{RoleSet, User};
use tableside_events::Subscription;
use tableside_identity::{AuthChangeEvent, AuthError, SessionService};

/// Live authentication state of one client context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    /// True while the initial fetch or a session operation is in flight.
    pub loading: bool,
    /// Message of the last failed operation; cleared when the next one starts.
    pub error: Option<String>,
}

/// A user result tagged with the generation it was taken under.
type UserResult = (u64, Option<User>);

struct Shared {
    service: SessionService,
    state: watch::Sender<Session>,
    generation: AtomicU64,
    busy: AtomicUsize,
    disposed: AtomicBool,
}

/// A local operation in flight. Settles on `finish`, or on drop if the
/// caller abandoned the future.
struct Operation<'a> {
    shared: &'a Shared,
    finished: bool,
}

impl Operation<'_> {
    fn finish(mut self, user: Option<UserResult>, error: Option<String>) {
        self.finished = true;
        self.shared.settle(user, error);
    }
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.settle(None, None);
        }
    }
}

impl Shared {
    fn start(&self) -> Operation<'_> {
        self.state.send_if_modified(|session| {
            self.busy.fetch_add(1, Ordering::SeqCst);
            if self.disposed.load(Ordering::SeqCst) {
                return false;
            }
            session.loading = true;
            session.error = None;
            true
        });
        Operation {
            shared: self,
            finished: false,
        }
    }

    /// Take a new user generation, superseding every user result in flight.
    fn advance(&self) -> u64 {
        let mut generation = 0;
        self.state.send_if_modified(|_| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            false
        });
        generation
    }

    /// Write `user` if `generation` is still the latest and the store is mounted.
    /// Leaves `loading` and `error` alone.
    fn publish_user(&self, generation: u64, user: Option<User>) {
        self.state.send_if_modified(|session| {
            if self.disposed.load(Ordering::SeqCst) {
                return false;
            }
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::trace!(generation, "discarded superseded user result");
                return false;
            }
            session.user = user;
            true
        });
    }

    /// Retire one unit of busy work with its outcome.
    fn settle(&self, user: Option<UserResult>, error: Option<String>) {
        self.state.send_if_modified(|session| {
            let remaining = self.busy.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            if self.disposed.load(Ordering::SeqCst) {
                return false;
            }
            if let Some((generation, user)) = user {
                if self.generation.load(Ordering::SeqCst) == generation {
                    session.user = user;
                } else {
                    tracing::trace!(generation, "discarded superseded user result");
                }
            }
            if error.is_some() {
                session.error = error;
            }
            session.loading = remaining > 0;
            true
        });
    }

    async fn apply_event(&self, event: AuthChangeEvent) {
        let generation = self.advance();
        if event.principal().is_some() {
            tracing::debug!(kind = ?event.kind, generation, "auth state changed; refetching user");
            let user = self.service.fetch_current_user().await;
            self.publish_user(generation, user);
        } else {
            tracing::debug!(kind = ?event.kind, generation, "auth state changed; signed out");
            self.publish_user(generation, None);
        }
    }
}

async fn listen(shared: Arc<Shared>, mut events: Subscription<AuthChangeEvent>, initial: u64) {
    let user = shared.service.fetch_current_user().await;
    shared.settle(Some((initial, user)), None);

    while let Some(event) = events.recv().await {
        shared.apply_event(event).await;
    }
}

/// Owner of one session: created when a UI tree mounts, disposed (or dropped)
/// when it unmounts. Must be mounted inside a Tokio runtime.
pub struct SessionStore {
    shared: Arc<Shared>,
    listener: JoinHandle<()>,
}

impl SessionStore {
    /// Start with `loading = true, user = None`, fetch the current user, and
    /// follow provider session changes until disposed.
    pub fn mount(service: SessionService) -> Self {
        let (state, _) = watch::channel(Session {
            user: None,
            loading: true,
            error: None,
        });
        // Subscribe before the initial fetch so no change is missed in between.
        let events = service.subscribe();
        let shared = Arc::new(Shared {
            service,
            state,
            generation: AtomicU64::new(0),
            // The initial fetch.
            busy: AtomicUsize::new(1),
            disposed: AtomicBool::new(false),
        });
        let initial = shared.advance();
        let listener = tokio::spawn(listen(shared.clone(), events, initial));

        Self { shared, listener }
    }

    pub fn context(&self) -> SessionContext {
        SessionContext {
            shared: self.shared.clone(),
        }
    }

    /// Tear down the subscription. Nothing is published afterwards, including
    /// results of operations still in flight through a [`SessionContext`].
    pub fn dispose(self) {}
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shared.disposed.store(true, Ordering::SeqCst);
        self.listener.abort();
    }
}

/// Consumer handle onto a [`SessionStore`]. Cheap to clone.
#[derive(Clone)]
pub struct SessionContext {
    shared: Arc<Shared>,
}

impl SessionContext {
    pub fn snapshot(&self) -> Session {
        self.shared.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.shared.state.borrow().user.clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.state.subscribe()
    }

    /// Wait until nothing is loading and return that state. Never resolves if
    /// the provider never answers.
    pub async fn settled(&self) -> Session {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| !s.loading).await {
            Ok(session) => session.clone(),
            Err(_) => self.snapshot(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let op = self.shared.start();
        match self.shared.service.authenticate(email, password).await {
            Ok(_) => {
                let generation = self.shared.advance();
                let user = self.shared.service.fetch_current_user().await;
                op.finish(Some((generation, user)), None);
                Ok(())
            }
            Err(e) => {
                op.finish(None, Some(e.message()));
                Err(e)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<(), AuthError> {
        let op = self.shared.start();
        match self.shared.service.register_account(email, password, name).await {
            Ok(_) => {
                let generation = self.shared.advance();
                let user = self.shared.service.fetch_current_user().await;
                op.finish(Some((generation, user)), None);
                Ok(())
            }
            Err(e) => {
                op.finish(None, Some(e.message()));
                Err(e)
            }
        }
    }

    /// Always clears the local user, even when the remote invalidation fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let op = self.shared.start();
        let result = self.shared.service.end_session().await;
        let generation = self.shared.advance();
        op.finish(Some((generation, None)), result.as_ref().err().map(AuthError::message));
        result
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let op = self.shared.start();
        let result = self.shared.service.request_password_reset(email).await;
        op.finish(None, result.as_ref().err().map(AuthError::message));
        result
    }

    pub async fn update_password(&self, password: &str) -> Result<(), AuthError> {
        let op = self.shared.start();
        let result = self.shared.service.set_password(password).await;
        op.finish(None, result.as_ref().err().map(AuthError::message));
        result
    }

    // Role predicates read the current user on every call.

    pub fn has_role(&self, allowed: RoleSet) -> bool {
        tableside_auth::has_role(self.shared.state.borrow().user.as_ref(), allowed)
    }

    pub fn is_owner(&self) -> bool {
        tableside_auth::is_owner(self.shared.state.borrow().user.as_ref())
    }

    pub fn is_manager(&self) -> bool {
        tableside_auth::is_manager(self.shared.state.borrow().user.as_ref())
    }

    pub fn can_manage_inventory(&self) -> bool {
        tableside_auth::can_manage_inventory(self.shared.state.borrow().user.as_ref())
    }

    pub fn can_manage_orders(&self) -> bool {
        tableside_auth::can_manage_orders(self.shared.state.borrow().user.as_ref())
    }
}
