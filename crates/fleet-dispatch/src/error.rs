use fleet_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    State(#[from] StateError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
