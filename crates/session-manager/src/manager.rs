//! Session manager with FSM-validated transitions and generation-based
//! staleness detection.
//!
//! All reads and writes of the session record go through one mutex. Calls
//! into connectors and error handlers happen outside of it; anything that
//! awaits captures the generation first and re-checks it before committing.

use crate::machine::{SessionMachine, SessionPhase};
use crate::reconcile;
use crate::state::{reduce, Action, SessionSnapshot, SessionState};
use crate::{SessionError, SessionResult};
use chain_normalizers::{normalize_account, normalize_chain_id, Account, ChainId, RawChainId};
use connector_core::{
    ensure_supported_chain, Connector, ConnectorUpdate, ProviderHandle, SubscriptionId,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Callback receiving errors that would otherwise be stored in the session.
pub type ErrorHandler = Arc<dyn Fn(SessionError) + Send + Sync>;

/// How `activate` surfaces failures.
///
/// Precedence is `throw_errors`, then `on_error`, then storing the error in
/// the session. The handler is also kept for errors raised later by the
/// connector's events.
#[derive(Clone, Default)]
pub struct ActivateOptions {
    pub on_error: Option<ErrorHandler>,
    pub throw_errors: bool,
}

impl ActivateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(SessionError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub fn throw_errors(mut self) -> Self {
        self.throw_errors = true;
        self
    }
}

impl fmt::Debug for ActivateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivateOptions")
            .field("on_error", &self.on_error.as_ref().map(|_| "<handler>"))
            .field("throw_errors", &self.throw_errors)
            .finish()
    }
}

/// The connector currently subscribed to.
pub(crate) struct Attachment {
    pub(crate) id: u64,
    pub(crate) connector: Arc<dyn Connector>,
    subscription: SubscriptionId,
}

pub(crate) struct Core {
    pub(crate) state: SessionState,
    pub(crate) generation: u64,
    machine: SessionMachine,
    pub(crate) attachment: Option<Attachment>,
    next_attachment: u64,
}

impl Core {
    pub(crate) fn attachment_id(&self) -> Option<u64> {
        self.attachment.as_ref().map(|a| a.id)
    }

    fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.machine.state())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.state, self.phase(), self.generation)
    }
}

pub(crate) struct Inner {
    pub(crate) core: Mutex<Core>,
    snapshots: watch::Sender<SessionSnapshot>,
}

/// Owner of the single active connector session.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    pub(crate) inner: Arc<Inner>,
}

/// Fully resolved activation result.
struct Augmented {
    account: Option<Account>,
    chain_id: ChainId,
    provider: ProviderHandle,
}

/// What `activate` decided under the lock.
enum Outcome {
    Stale,
    Committed {
        released: Option<Arc<dyn Connector>>,
        auth_token: Option<String>,
        chain_id: ChainId,
    },
    Throw(SessionError),
    Route(ErrorHandler, SessionError),
    Stored {
        released: Option<Arc<dyn Connector>>,
        error: SessionError,
    },
}

impl SessionManager {
    /// Create an empty session manager.
    pub fn new() -> Self {
        let core = Core {
            state: SessionState::default(),
            generation: 0,
            machine: SessionMachine::new(),
            attachment: None,
            next_attachment: 0,
        };
        let (snapshots, _) = watch::channel(core.snapshot());
        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(core),
                snapshots,
            }),
        }
    }

    /// Number of committed transitions so far.
    pub fn generation(&self) -> u64 {
        self.inner.core.lock().generation
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.core.lock().phase()
    }

    pub fn is_active(&self) -> bool {
        self.inner.core.lock().state.is_active()
    }

    /// Current view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.core.lock().snapshot()
    }

    /// Receive a fresh snapshot after every committed transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Activate `connector` and make it the session's connector.
    ///
    /// Missing account and chain are fetched concurrently, the chain is
    /// checked against the connector's supported set, and a provider is
    /// fetched if the connector did not hand one over. If any other
    /// transition committed while this was in flight, the result is dropped,
    /// the connector is deactivated (if its activation succeeded) and
    /// `Ok(None)` is returned.
    ///
    /// Returns the connector's auth token, if it issued one.
    pub async fn activate(
        &self,
        connector: Arc<dyn Connector>,
        options: ActivateOptions,
    ) -> SessionResult<Option<String>> {
        let started_at = self.generation();
        debug!(
            connector = connector.name(),
            generation = started_at,
            "Activating connector"
        );

        let mut activated = false;
        let result = match connector.activate().await {
            Ok(update) => {
                activated = true;
                let auth_token = update.auth_token.clone();
                augment(connector.as_ref(), update)
                    .await
                    .map(|augmented| (augmented, auth_token))
            }
            Err(e) => Err(SessionError::from(e)),
        };

        let (outcome, discard) = {
            let mut core = self.inner.core.lock();
            // Never tear down the connector the live session is using.
            let discard = activated
                && !core
                    .attachment
                    .as_ref()
                    .is_some_and(|a| same_connector(&a.connector, &connector));
            let outcome = if core.generation != started_at {
                Outcome::Stale
            } else {
                match result {
                    Ok((augmented, auth_token)) => {
                        let chain_id = augmented.chain_id;
                        let released = self.commit(
                            &mut core,
                            Action::ActivateConnector {
                                connector: connector.clone(),
                                account: augmented.account,
                                chain_id,
                                provider: augmented.provider,
                                on_error: options.on_error.clone(),
                            },
                        )?;
                        Outcome::Committed {
                            released,
                            auth_token,
                            chain_id,
                        }
                    }
                    Err(error) if options.throw_errors => Outcome::Throw(error),
                    Err(error) => match options.on_error.clone() {
                        Some(handler) => Outcome::Route(handler, error),
                        None => {
                            let released = self.commit(
                                &mut core,
                                Action::ErrorFromActivation {
                                    connector: connector.clone(),
                                    error: error.clone(),
                                },
                            )?;
                            Outcome::Stored { released, error }
                        }
                    },
                }
            };
            (outcome, discard)
        };

        match outcome {
            Outcome::Stale => {
                if discard {
                    deactivate_quietly(connector.as_ref()).await;
                }
                warn!(
                    connector = connector.name(),
                    started_at, "Suppressed stale connector activation"
                );
                Ok(None)
            }
            Outcome::Committed {
                released,
                auth_token,
                chain_id,
            } => {
                info!(connector = connector.name(), chain_id, "Connector activated");
                release_replaced(released).await;
                Ok(auth_token)
            }
            Outcome::Throw(error) => {
                if discard {
                    deactivate_quietly(connector.as_ref()).await;
                }
                warn!(connector = connector.name(), %error, "Activation failed");
                Err(error)
            }
            Outcome::Route(handler, error) => {
                if discard {
                    deactivate_quietly(connector.as_ref()).await;
                }
                warn!(connector = connector.name(), %error, "Activation failed, routing to error handler");
                handler(error);
                Ok(None)
            }
            Outcome::Stored { released, error } => {
                warn!(connector = connector.name(), %error, "Activation failed, storing error");
                release_replaced(released).await;
                Ok(None)
            }
        }
    }

    /// Deactivate the attached connector and clear the session.
    ///
    /// The session is cleared even when the connector fails to deactivate;
    /// that failure is returned afterwards. A connector that was attached
    /// while this one was deactivating is cleared and deactivated as well.
    pub async fn deactivate(&self) -> SessionResult<()> {
        let connector = {
            let core = self.inner.core.lock();
            match &core.attachment {
                Some(a) => a.connector.clone(),
                None => return Err(SessionError::NoActiveSession),
            }
        };
        let result = connector.deactivate().await;

        let cleared = {
            let mut core = self.inner.core.lock();
            if core.phase() == SessionPhase::Empty {
                None
            } else {
                Some(self.commit(&mut core, Action::DeactivateConnector)?)
            }
        };

        match cleared {
            Some(released) => {
                info!(connector = connector.name(), "Session deactivated");
                if let Some(other) = released.filter(|c| !same_connector(c, &connector)) {
                    debug!(
                        connector = other.name(),
                        "Deactivating connector attached during deactivation"
                    );
                    deactivate_quietly(other.as_ref()).await;
                }
            }
            None => debug!(
                connector = connector.name(),
                "Session already cleared during deactivation"
            ),
        }

        result.map_err(SessionError::from)
    }

    /// Put the session in the error state, keeping the connector and handler.
    pub fn set_error(&self, error: SessionError) {
        let mut core = self.inner.core.lock();
        if let Err(e) = self.commit(&mut core, Action::Error { error }) {
            warn!(error = %e, "Failed to store session error");
        }
    }

    /// Provider for `chain_id`, switching the connector's chain if needed.
    ///
    /// A cache hit on the current chain returns immediately. Chains outside
    /// the connector's supported set fail without touching the session.
    /// Connector failures are routed to the error handler or stored, and
    /// yield `Ok(None)`.
    pub async fn get_provider(
        &self,
        chain_id: impl Into<RawChainId>,
    ) -> SessionResult<Option<ProviderHandle>> {
        let chain_id = normalize_chain_id(chain_id)?;

        let (attachment, connector, on_error) = {
            let core = self.inner.core.lock();
            let attachment = match &core.attachment {
                Some(a) => a,
                None => return Err(SessionError::NoActiveSession),
            };
            if core.state.chain_id == Some(chain_id) {
                if let Some(provider) = &core.state.provider {
                    return Ok(Some(provider.clone()));
                }
            }
            ensure_supported_chain(attachment.connector.supported_chain_ids(), chain_id)?;
            (
                attachment.id,
                attachment.connector.clone(),
                core.state.on_error.clone(),
            )
        };

        debug!(connector = connector.name(), chain_id, "Fetching provider");
        match connector.get_provider(chain_id).await {
            Ok(provider) => {
                let mut core = self.inner.core.lock();
                if core.attachment_id() == Some(attachment) {
                    self.commit(
                        &mut core,
                        Action::Update {
                            account: None,
                            chain_id: Some(chain_id),
                            provider: Some(provider.clone()),
                        },
                    )?;
                }
                Ok(Some(provider))
            }
            Err(e) => {
                self.route_error(attachment, on_error, e.into());
                Ok(None)
            }
        }
    }

    /// Deactivate `connector` and clear the session if it is still attached.
    ///
    /// Used for a connector's own Deactivate event, which must not clear a
    /// session that has since moved to another connector.
    pub(crate) async fn release(
        &self,
        attachment: u64,
        connector: Arc<dyn Connector>,
    ) -> SessionResult<()> {
        let result = connector.deactivate().await;

        let cleared = {
            let mut core = self.inner.core.lock();
            if core.attachment_id() == Some(attachment) {
                self.commit(&mut core, Action::DeactivateConnector)?;
                true
            } else {
                false
            }
        };

        if cleared {
            info!(connector = connector.name(), "Session deactivated");
        } else {
            debug!(
                connector = connector.name(),
                "Connector replaced during deactivation, keeping new session"
            );
        }

        result.map_err(SessionError::from)
    }

    /// Hand `error` to the handler, or store it if the connector is still
    /// attached.
    pub(crate) fn route_error(
        &self,
        attachment: u64,
        on_error: Option<ErrorHandler>,
        error: SessionError,
    ) {
        if let Some(handler) = on_error {
            debug!(%error, "Routing error to handler");
            handler(error);
            return;
        }

        let mut core = self.inner.core.lock();
        if core.attachment_id() != Some(attachment) {
            debug!(%error, "Dropping error from detached connector");
            return;
        }
        if let Err(e) = self.commit(&mut core, Action::Error { error }) {
            warn!(error = %e, "Failed to store session error");
        }
    }

    /// Apply `action` and bump the generation.
    ///
    /// Must be called with the core lock held. Returns the previously
    /// attached connector when the action replaced it; the caller is
    /// responsible for deactivating it once the lock is released.
    pub(crate) fn commit(
        &self,
        core: &mut Core,
        action: Action,
    ) -> SessionResult<Option<Arc<dyn Connector>>> {
        let old_phase = core.phase();
        core.machine.consume(&action.input()).map_err(|_| {
            SessionError::InvalidTransition(format!(
                "Cannot apply {} in phase {:?}",
                action.name(),
                old_phase
            ))
        })?;

        let name = action.name();
        core.state = reduce(&core.state, action);
        core.generation += 1;
        let released = self.sync_attachment(core);

        let new_phase = core.phase();
        debug!(
            action = name,
            old_phase = ?old_phase,
            new_phase = ?new_phase,
            generation = core.generation,
            "Session transition"
        );
        self.inner.snapshots.send_replace(core.snapshot());

        Ok(released)
    }

    /// Keep the event subscription in step with `state.connector`.
    fn sync_attachment(&self, core: &mut Core) -> Option<Arc<dyn Connector>> {
        let unchanged = match (&core.attachment, &core.state.connector) {
            (Some(attached), Some(current)) => same_connector(&attached.connector, current),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return None;
        }

        let released = core.attachment.take().map(|old| {
            old.connector.events().unsubscribe(old.subscription);
            debug!(connector = old.connector.name(), "Unsubscribed from connector events");
            old.connector
        });

        if let Some(connector) = core.state.connector.clone() {
            let (subscription, receiver) = connector.events().subscribe().into_parts();
            core.next_attachment += 1;
            let id = core.next_attachment;
            debug!(
                connector = connector.name(),
                attachment = id,
                "Subscribed to connector events"
            );
            core.attachment = Some(Attachment {
                id,
                connector,
                subscription,
            });
            tokio::spawn(reconcile::run_event_pump(
                Arc::downgrade(&self.inner),
                id,
                receiver,
            ));
        }

        released
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.inner.core.lock().state)
            .finish()
    }
}

/// Resolve the fields `activate()` left out and validate the result.
async fn augment(connector: &dyn Connector, update: ConnectorUpdate) -> SessionResult<Augmented> {
    let ConnectorUpdate {
        account,
        chain_id,
        provider,
        ..
    } = update;

    let (raw_chain_id, raw_account) = tokio::try_join!(
        async {
            match chain_id {
                Some(chain_id) => Ok(chain_id),
                None => connector.get_chain_id().await,
            }
        },
        async {
            match account {
                Some(account) => Ok(account),
                None => connector.get_account().await,
            }
        }
    )?;

    let chain_id = normalize_chain_id(raw_chain_id)?;
    ensure_supported_chain(connector.supported_chain_ids(), chain_id)?;
    let account = match raw_account {
        Some(raw) => Some(normalize_account(&raw)?),
        None => None,
    };
    let provider = match provider {
        Some(provider) => provider,
        None => connector.get_provider(chain_id).await?,
    };

    Ok(Augmented {
        account,
        chain_id,
        provider,
    })
}

pub(crate) fn same_connector(a: &Arc<dyn Connector>, b: &Arc<dyn Connector>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

async fn deactivate_quietly(connector: &dyn Connector) {
    if let Err(error) = connector.deactivate().await {
        warn!(connector = connector.name(), %error, "Failed to deactivate connector");
    }
}

/// Deactivate a connector that a new activation replaced.
async fn release_replaced(released: Option<Arc<dyn Connector>>) {
    if let Some(connector) = released {
        debug!(connector = connector.name(), "Deactivating replaced connector");
        deactivate_quietly(connector.as_ref()).await;
    }
}
