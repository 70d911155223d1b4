//! Session record, reducer actions and observer snapshots.

use crate::machine::SessionMachineInput;
use crate::{ErrorHandler, SessionError, SessionPhase};
use chain_normalizers::{Account, ChainId};
use connector_core::{Connector, ProviderHandle};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// The single authoritative session record.
///
/// `account` is doubly optional: `None` is unknown, `Some(None)` means the
/// connector resolved that it has no account.
#[derive(Clone, Default)]
pub struct SessionState {
    pub connector: Option<Arc<dyn Connector>>,
    pub account: Option<Option<Account>>,
    pub chain_id: Option<ChainId>,
    pub provider: Option<ProviderHandle>,
    pub error: Option<SessionError>,
    pub on_error: Option<ErrorHandler>,
}

impl SessionState {
    /// Connector set, account resolved and no error.
    pub fn is_active(&self) -> bool {
        self.connector.is_some() && self.account.is_some() && self.error.is_none()
    }

    pub fn connector_name(&self) -> Option<&str> {
        self.connector.as_ref().map(|c| c.name())
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("connector", &self.connector_name())
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("provider", &self.provider.as_ref().map(|_| "<provider>"))
            .field("error", &self.error)
            .field("on_error", &self.on_error.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

/// A state change dispatched to the reducer.
#[derive(Clone)]
pub enum Action {
    /// Replace the whole record after a successful activation.
    ActivateConnector {
        connector: Arc<dyn Connector>,
        account: Option<Account>,
        chain_id: ChainId,
        provider: ProviderHandle,
        on_error: Option<ErrorHandler>,
    },
    /// Merge the present fields into a healthy session.
    Update {
        account: Option<Option<Account>>,
        chain_id: Option<ChainId>,
        provider: Option<ProviderHandle>,
    },
    /// Merge a recovered account and clear the error.
    UpdateFromError {
        account: Option<Account>,
        chain_id: Option<ChainId>,
        provider: Option<ProviderHandle>,
    },
    /// Reduce the record to connector + error, keeping the error handler.
    Error { error: SessionError },
    /// Bind a failed activation's error to its connector.
    ErrorFromActivation {
        connector: Arc<dyn Connector>,
        error: SessionError,
    },
    /// Clear the record.
    DeactivateConnector,
}

impl Action {
    /// Phase machine input for this action.
    pub fn input(&self) -> SessionMachineInput {
        match self {
            Action::ActivateConnector { .. } => SessionMachineInput::Activated,
            Action::Update { .. } => SessionMachineInput::Updated,
            Action::UpdateFromError { .. } => SessionMachineInput::Recovered,
            Action::Error { .. } => SessionMachineInput::Failed,
            Action::ErrorFromActivation { .. } => SessionMachineInput::ActivationFailed,
            Action::DeactivateConnector => SessionMachineInput::Released,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::ActivateConnector { .. } => "activate_connector",
            Action::Update { .. } => "update",
            Action::UpdateFromError { .. } => "update_from_error",
            Action::Error { .. } => "error",
            Action::ErrorFromActivation { .. } => "error_from_activation",
            Action::DeactivateConnector => "deactivate_connector",
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ActivateConnector {
                connector,
                account,
                chain_id,
                ..
            } => f
                .debug_struct("ActivateConnector")
                .field("connector", &connector.name())
                .field("account", account)
                .field("chain_id", chain_id)
                .finish_non_exhaustive(),
            Action::Update {
                account, chain_id, ..
            } => f
                .debug_struct("Update")
                .field("account", account)
                .field("chain_id", chain_id)
                .finish_non_exhaustive(),
            Action::UpdateFromError {
                account, chain_id, ..
            } => f
                .debug_struct("UpdateFromError")
                .field("account", account)
                .field("chain_id", chain_id)
                .finish_non_exhaustive(),
            Action::Error { error } => f.debug_struct("Error").field("error", error).finish(),
            Action::ErrorFromActivation { connector, error } => f
                .debug_struct("ErrorFromActivation")
                .field("connector", &connector.name())
                .field("error", error)
                .finish(),
            Action::DeactivateConnector => f.write_str("DeactivateConnector"),
        }
    }
}

/// Pure reducer: the next record given the current one and an action.
pub fn reduce(state: &SessionState, action: Action) -> SessionState {
    match action {
        Action::ActivateConnector {
            connector,
            account,
            chain_id,
            provider,
            on_error,
        } => SessionState {
            connector: Some(connector),
            account: Some(account),
            chain_id: Some(chain_id),
            provider: Some(provider),
            error: None,
            on_error,
        },
        Action::Update {
            account,
            chain_id,
            provider,
        } => {
            let mut next = state.clone();
            merge_chain(&mut next, chain_id, provider);
            if let Some(account) = account {
                next.account = Some(account);
            }
            next
        }
        Action::UpdateFromError {
            account,
            chain_id,
            provider,
        } => {
            let mut next = state.clone();
            merge_chain(&mut next, chain_id, provider);
            next.account = Some(account);
            next.error = None;
            next
        }
        Action::Error { error } => SessionState {
            connector: state.connector.clone(),
            error: Some(error),
            on_error: state.on_error.clone(),
            ..SessionState::default()
        },
        Action::ErrorFromActivation { connector, error } => SessionState {
            connector: Some(connector),
            error: Some(error),
            ..SessionState::default()
        },
        Action::DeactivateConnector => SessionState::default(),
    }
}

// A chain switch without a new provider invalidates the cached one.
fn merge_chain(
    state: &mut SessionState,
    chain_id: Option<ChainId>,
    provider: Option<ProviderHandle>,
) {
    if let Some(chain_id) = chain_id {
        if state.chain_id != Some(chain_id) && provider.is_none() {
            state.provider = None;
        }
        state.chain_id = Some(chain_id);
    }
    if let Some(provider) = provider {
        state.provider = Some(provider);
    }
}

/// Read-only view of the session handed to callers and observers.
#[derive(Clone, Serialize)]
pub struct SessionSnapshot {
    #[serde(skip)]
    pub connector: Option<Arc<dyn Connector>>,
    pub connector_name: Option<String>,
    pub account: Option<Option<Account>>,
    pub chain_id: Option<ChainId>,
    #[serde(skip)]
    pub provider: Option<ProviderHandle>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<SessionError>,
    pub phase: SessionPhase,
    pub active: bool,
    pub generation: u64,
}

impl SessionSnapshot {
    pub(crate) fn capture(state: &SessionState, phase: SessionPhase, generation: u64) -> Self {
        Self {
            connector: state.connector.clone(),
            connector_name: state.connector_name().map(str::to_string),
            account: state.account.clone(),
            chain_id: state.chain_id,
            provider: state.provider.clone(),
            error: state.error.clone(),
            phase,
            active: state.is_active(),
            generation,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The resolved account, if any.
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref().and_then(Option::as_ref)
    }
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("connector", &self.connector_name)
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("provider", &self.provider.as_ref().map(|_| "<provider>"))
            .field("error", &self.error)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish()
    }
}

fn serialize_error<S>(error: &Option<SessionError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}
