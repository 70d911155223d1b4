//! Reconciliation of events pushed by the attached connector.
//!
//! Each attachment gets its own pump task draining the connector's event
//! subscription in order. Events that arrive after the connector was
//! replaced or released are ignored.
//!
//! Updates take one of two paths:
//! - healthy session: validate and merge the present fields
//! - errored session: resolve the account again and clear the error if the
//!   session did not move on in the meantime

use crate::manager::{ErrorHandler, Inner, SessionManager};
use crate::state::Action;
use crate::{SessionError, SessionResult};
use chain_normalizers::{normalize_account, normalize_chain_id, Account, ChainId};
use connector_core::{
    ensure_supported_chain, Connector, ConnectorEvent, ConnectorUpdate, ProviderHandle,
};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// Session facts captured when an event starts being handled.
struct EventContext {
    attachment: u64,
    connector: Arc<dyn Connector>,
    errored: bool,
    on_error: Option<ErrorHandler>,
    generation: u64,
}

/// Fields resolved while recovering from the error state.
struct Recovery {
    account: Option<Account>,
    chain_id: Option<ChainId>,
    provider: Option<ProviderHandle>,
}

pub(crate) async fn run_event_pump(
    manager: Weak<Inner>,
    attachment: u64,
    mut receiver: UnboundedReceiver<ConnectorEvent>,
) {
    while let Some(event) = receiver.recv().await {
        let Some(inner) = manager.upgrade() else {
            break;
        };
        SessionManager { inner }.handle_event(attachment, event).await;
    }
    debug!(attachment, "Connector event pump stopped");
}

impl SessionManager {
    async fn handle_event(&self, attachment: u64, event: ConnectorEvent) {
        let context = {
            let core = self.inner.core.lock();
            match &core.attachment {
                Some(a) if a.id == attachment => Some(EventContext {
                    attachment,
                    connector: a.connector.clone(),
                    errored: core.state.error.is_some(),
                    on_error: core.state.on_error.clone(),
                    generation: core.generation,
                }),
                _ => None,
            }
        };
        let Some(context) = context else {
            debug!(
                kind = event.kind(),
                attachment, "Ignoring event from detached connector"
            );
            return;
        };

        debug!(
            connector = context.connector.name(),
            kind = event.kind(),
            errored = context.errored,
            "Handling connector event"
        );

        match event {
            ConnectorEvent::Update(update) if context.errored => {
                self.recover(context, update).await
            }
            ConnectorEvent::Update(update) => self.apply_update(context, update),
            ConnectorEvent::Error(error) => {
                self.route_error(context.attachment, context.on_error, error.into())
            }
            ConnectorEvent::Deactivate => {
                let connector = context.connector.clone();
                if let Err(error) = self.release(context.attachment, connector).await {
                    warn!(
                        connector = context.connector.name(),
                        %error,
                        "Connector failed to deactivate after its Deactivate event"
                    );
                }
            }
        }
    }

    /// Merge an update into a healthy session.
    fn apply_update(&self, context: EventContext, update: ConnectorUpdate) {
        let chain_id = match update.chain_id {
            Some(raw) => match normalize_chain_id(raw) {
                Ok(chain_id) => Some(chain_id),
                Err(e) => return self.route_error(context.attachment, context.on_error, e.into()),
            },
            None => None,
        };

        if let Some(chain_id) = chain_id {
            if let Err(e) = ensure_supported_chain(context.connector.supported_chain_ids(), chain_id)
            {
                warn!(
                    connector = context.connector.name(),
                    chain_id, "Connector switched to an unsupported chain"
                );
                return self.route_error(context.attachment, context.on_error, e.into());
            }
        }

        let account = match update.account {
            Some(Some(raw)) => match normalize_account(&raw) {
                Ok(account) => Some(Some(account)),
                Err(e) => return self.route_error(context.attachment, context.on_error, e.into()),
            },
            Some(None) => Some(None),
            None => None,
        };

        let mut core = self.inner.core.lock();
        if core.attachment_id() != Some(context.attachment) {
            return;
        }
        if let Err(e) = self.commit(
            &mut core,
            Action::Update {
                account,
                chain_id,
                provider: update.provider,
            },
        ) {
            warn!(error = %e, "Failed to apply connector update");
        }
    }

    /// Try to leave the error state on an update.
    async fn recover(&self, context: EventContext, update: ConnectorUpdate) {
        let result = resolve_recovery(context.connector.as_ref(), update).await;

        let routed = {
            let mut core = self.inner.core.lock();
            if core.generation != context.generation
                || core.attachment_id() != Some(context.attachment)
            {
                warn!(
                    connector = context.connector.name(),
                    started_at = context.generation,
                    "Suppressed stale connector update from error state"
                );
                return;
            }

            match result {
                Ok(recovery) => {
                    let committed = self.commit(
                        &mut core,
                        Action::UpdateFromError {
                            account: recovery.account,
                            chain_id: recovery.chain_id,
                            provider: recovery.provider,
                        },
                    );
                    match committed {
                        Ok(_) => info!(
                            connector = context.connector.name(),
                            "Session recovered from error"
                        ),
                        Err(e) => warn!(error = %e, "Failed to apply recovery"),
                    }
                    None
                }
                Err(error) => match context.on_error.clone() {
                    Some(handler) => Some((handler, error)),
                    None => {
                        if let Err(e) = self.commit(&mut core, Action::Error { error }) {
                            warn!(error = %e, "Failed to store session error");
                        }
                        None
                    }
                },
            }
        };

        if let Some((handler, error)) = routed {
            debug!(%error, "Routing recovery failure to handler");
            handler(error);
        }
    }
}

/// Resolve the account for a recovering session.
///
/// A chain present in the update is validated and carried over; a missing
/// chain is not fetched.
async fn resolve_recovery(
    connector: &dyn Connector,
    update: ConnectorUpdate,
) -> SessionResult<Recovery> {
    let chain_id = match update.chain_id {
        Some(raw) => {
            let chain_id = normalize_chain_id(raw)?;
            ensure_supported_chain(connector.supported_chain_ids(), chain_id)?;
            Some(chain_id)
        }
        None => None,
    };

    let raw_account = match update.account {
        Some(account) => account,
        None => connector
            .get_account()
            .await
            .map_err(SessionError::from)?,
    };
    let account = match raw_account {
        Some(raw) => Some(normalize_account(&raw)?),
        None => None,
    };

    Ok(Recovery {
        account,
        chain_id,
        provider: update.provider,
    })
}
