use fleet_core::FleetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error("column {0:?} has not been registered")]
    UnknownColumn(String),

    #[error("attribute {attribute:?} already belongs to the {existing} group, cannot register it for {requested}")]
    GroupConflict {
        attribute: String,
        existing:  &'static str,
        requested: &'static str,
    },

    #[error("attribute {attribute:?} is already tracked for slot {slot}")]
    DuplicateTracker {
        attribute: String,
        slot:      usize,
    },

    #[error("{group} slot {slot} has not been registered")]
    UnknownEntity {
        group: &'static str,
        slot:  usize,
    },
}

pub type StateResult<T> = Result<T, StateError>;
