//! Simulated telephony.
//!
//! Implements [`TelephonyPort`] by logging what would be dialled.  Direct
//! calling can be switched off to exercise the dialer path.

use core::time::Duration;

use log::info;

use crate::app::ports::TelephonyPort;
use crate::error::ProviderError;

/// What the simulated phone was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneAction {
    Call(String),
    Dialer(String),
}

#[derive(Debug)]
pub struct SimPhone {
    direct_call: bool,
    actions: Vec<PhoneAction>,
}

impl SimPhone {
    pub fn new(direct_call: bool) -> Self {
        Self {
            direct_call,
            actions: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[PhoneAction] {
        &self.actions
    }
}

impl TelephonyPort for SimPhone {
    fn native_call_available(&self) -> bool {
        self.direct_call
    }

    fn place_call(&mut self, number: &str, timeout: Duration) -> Result<(), ProviderError> {
        if !self.direct_call {
            return Err(ProviderError::Unavailable);
        }
        info!("PHONE | calling {} (budget {:?})", number, timeout);
        self.actions.push(PhoneAction::Call(number.to_owned()));
        Ok(())
    }

    fn open_dialer(&mut self, number: &str) -> Result<(), ProviderError> {
        info!("PHONE | dialer opened: tel:{}", number);
        self.actions.push(PhoneAction::Dialer(number.to_owned()));
        Ok(())
    }
}
