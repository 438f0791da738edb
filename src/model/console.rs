//! Admin console action state.
//!
//! The user management screens offer several mutually exclusive actions on a
//! selected user. A single [`ActionController`] owns which one is active so
//! that at most one action form is ever open.
//!
//! This is a library surface for the dashboard's user management screens; no
//! HTTP route drives it.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: String,
    pub user_name: String
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "action", content = "target", rename_all = "camelCase")]
pub enum ActiveAction {
    #[default]
    None,
    Ban(UserRef),
    Delete(UserRef),
    Email(UserRef),
    Notify(UserRef),
    Edit(UserRef)
}

impl ActiveAction {
    pub fn target(&self) -> Option<&UserRef> {
        match self {
            ActiveAction::None => None,
            ActiveAction::Ban(user)
            | ActiveAction::Delete(user)
            | ActiveAction::Email(user)
            | ActiveAction::Notify(user)
            | ActiveAction::Edit(user) => Some(user)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActiveAction::None => "none",
            ActiveAction::Ban(_) => "ban",
            ActiveAction::Delete(_) => "delete",
            ActiveAction::Email(_) => "email",
            ActiveAction::Notify(_) => "notify",
            ActiveAction::Edit(_) => "edit"
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ActiveAction::None)
    }
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConsoleError {
    #[display(fmt = "another action is already open: {}", _0)]
    AlreadyOpen(&'static str)
}

impl std::error::Error for ConsoleError {}

#[derive(Debug, Default)]
pub struct ActionController {
    active: ActiveAction
}

impl ActionController {
    pub fn new() -> ActionController {
        ActionController::default()
    }

    pub fn active(&self) -> &ActiveAction {
        &self.active
    }

    pub fn target(&self) -> Option<&UserRef> {
        self.active.target()
    }

    /// Opening `ActiveAction::None` closes whatever is open.
    pub fn open(&mut self, action: ActiveAction) -> Result<(), ConsoleError> {
        if action.is_none() {
            self.close();
            return Ok(());
        }
        if !self.active.is_none() {
            return Err(ConsoleError::AlreadyOpen(self.active.label()));
        }
        self.active = action;
        Ok(())
    }

    pub fn close(&mut self) -> ActiveAction {
        std::mem::take(&mut self.active)
    }
}
