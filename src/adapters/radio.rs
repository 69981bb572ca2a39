//! Simulated radio stack.
//!
//! Implements [`RadioPort`] for host runs and the demo binary.  A helmet
//! can be placed "in range" so discovery finds it, and telemetry frames
//! can be pushed as if the peripheral had notified them.
//!
//! Frames are queued only while a subscription is live, the same as a
//! real GATT client: anything notified before subscribe or after
//! unsubscribe is lost.

use core::time::Duration;
use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::app::ports::{
    Advertisement, MAX_NOTIFICATION_BYTES, Notification, PeripheralRef, RadioError, RadioPort,
    ScanFilter, SubscriptionHandle,
};
use crate::config::FrameEncoding;
use crate::link::frame;

/// Pending notifications beyond this are dropped, oldest first.
const NOTIFY_BACKLOG: usize = 32;

#[derive(Debug, Default)]
pub struct SimRadio {
    initialised: bool,
    permissions: bool,
    stack_broken: bool,
    connect_fails: bool,
    in_range: Vec<Advertisement>,
    scan_queue: VecDeque<Advertisement>,
    scanning: bool,
    connected: Option<PeripheralRef>,
    discovered: bool,
    subscription: Option<SubscriptionHandle>,
    next_handle: u32,
    notes: VecDeque<Notification>,
}

impl SimRadio {
    /// A working stack with permissions granted and nothing in range.
    pub fn new() -> Self {
        Self {
            permissions: true,
            ..Self::default()
        }
    }

    pub fn set_permissions(&mut self, granted: bool) {
        self.permissions = granted;
    }

    /// Make `init` fail.
    pub fn set_stack_broken(&mut self, broken: bool) {
        self.stack_broken = broken;
    }

    pub fn set_connect_fails(&mut self, fails: bool) {
        self.connect_fails = fails;
    }

    /// Advertise a peripheral on every subsequent scan.
    pub fn add_peripheral(&mut self, id: &str, name: Option<&str>, service_ids: &[&str]) {
        self.in_range.push(Advertisement {
            peripheral: PeripheralRef {
                id: id.to_owned(),
                name: name.map(str::to_owned),
            },
            service_ids: service_ids.iter().map(|s| (*s).to_owned()).collect(),
            rssi: -60,
        });
    }

    pub fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Queue a raw notification on the live subscription.  Returns
    /// `false` when nothing is subscribed or the payload does not fit.
    pub fn notify_raw(&mut self, payload: &[u8]) -> bool {
        let Some(handle) = self.subscription else {
            debug!("SimRadio: no subscriber, frame lost");
            return false;
        };
        let Ok(payload) = heapless::Vec::<u8, MAX_NOTIFICATION_BYTES>::from_slice(payload) else {
            warn!("SimRadio: {} byte frame exceeds MTU buffer", payload.len());
            return false;
        };
        if self.notes.len() == NOTIFY_BACKLOG {
            self.notes.pop_front();
        }
        self.notes.push_back(Notification {
            subscription: handle,
            payload,
        });
        true
    }

    /// Queue a JSON frame, wrapped the way the peripheral would send it.
    pub fn notify_json(&mut self, json: &str, encoding: FrameEncoding) -> bool {
        match encoding {
            FrameEncoding::Base64 => self.notify_raw(frame::encode_base64(json).as_bytes()),
            FrameEncoding::Raw => self.notify_raw(json.as_bytes()),
        }
    }

    /// The peripheral went away on its own.
    pub fn drop_link(&mut self) {
        if let Some(p) = self.connected.take() {
            info!("SimRadio: {} dropped the link", p.id);
        }
        self.subscription = None;
        self.discovered = false;
        self.notes.clear();
    }
}

impl RadioPort for SimRadio {
    fn init(&mut self) -> Result<(), RadioError> {
        if self.stack_broken {
            return Err(RadioError::StackUnavailable);
        }
        if !self.initialised {
            self.initialised = true;
            info!("SimRadio: stack up");
        }
        Ok(())
    }

    fn permissions_granted(&mut self) -> bool {
        self.permissions
    }

    fn start_scan(&mut self, _filter: &ScanFilter) -> Result<(), RadioError> {
        if !self.initialised {
            return Err(RadioError::ScanFailed);
        }
        self.scanning = true;
        self.scan_queue = self.in_range.iter().cloned().collect();
        Ok(())
    }

    fn next_advertisement(&mut self, wait: Duration) -> Option<Advertisement> {
        if !self.scanning {
            return None;
        }
        let adv = self.scan_queue.pop_front();
        if adv.is_none() {
            std::thread::sleep(wait);
        }
        adv
    }

    fn stop_scan(&mut self) {
        self.scanning = false;
        self.scan_queue.clear();
    }

    fn connect(&mut self, peripheral: &PeripheralRef) -> Result<(), RadioError> {
        if self.connect_fails || !self.in_range.iter().any(|a| a.peripheral == *peripheral) {
            return Err(RadioError::ConnectFailed);
        }
        self.connected = Some(peripheral.clone());
        Ok(())
    }

    fn discover(&mut self) -> Result<(), RadioError> {
        if self.connected.is_none() {
            return Err(RadioError::NotConnected);
        }
        self.discovered = true;
        Ok(())
    }

    fn subscribe(
        &mut self,
        service_id: &str,
        characteristic_id: &str,
    ) -> Result<SubscriptionHandle, RadioError> {
        if !self.discovered {
            return Err(RadioError::SubscribeFailed);
        }
        self.next_handle += 1;
        let handle = SubscriptionHandle(self.next_handle);
        self.subscription = Some(handle);
        debug!(
            "SimRadio: subscribed {}/{} as {:?}",
            service_id, characteristic_id, handle
        );
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), RadioError> {
        if self.subscription != Some(handle) {
            return Err(RadioError::NotConnected);
        }
        self.subscription = None;
        self.notes.clear();
        Ok(())
    }

    fn disconnect(&mut self, peripheral: &PeripheralRef) -> Result<(), RadioError> {
        match &self.connected {
            Some(p) if p == peripheral => {
                self.drop_link();
                Ok(())
            }
            _ => Err(RadioError::NotConnected),
        }
    }

    fn next_notification(&mut self) -> Option<Notification> {
        self.notes.pop_front()
    }
}
