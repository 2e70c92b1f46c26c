//! Mounting the connect control into the host page.
//!
//! The control itself belongs to the wallet UI; the bridge only decides what
//! it shows and where it goes. `MountHost` is the seam to the document.

use crate::config::ConnectionEndpoint;
use crate::error::BridgeError;
use crate::provider::WalletState;
use crate::pubkey::PubkeyExt;

pub const SELECT_WALLET_LABEL: &str = "Select Wallet";

/// What the connect control renders for a given wallet state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectControl {
    pub label: String,
    pub connected: bool,
    pub endpoint: String,
}

impl ConnectControl {
    pub fn for_state(state: &WalletState, endpoint: &ConnectionEndpoint) -> Self {
        let label = match state {
            WalletState::Connected(pubkey) => pubkey.short_address(),
            WalletState::Disconnected => SELECT_WALLET_LABEL.to_string(),
        };
        ConnectControl {
            label,
            connected: state.is_connected(),
            endpoint: endpoint.to_string(),
        }
    }
}

/// Document access needed to place the control.
pub trait MountHost {
    /// Replace the contents of element `target_id` with `control`.
    ///
    /// Fails with `BridgeError::NotFound` when the element does not exist.
    fn render(&self, target_id: &str, control: &ConnectControl) -> Result<(), BridgeError>;

    /// Remove whatever the bridge rendered into `target_id`.
    fn clear(&self, target_id: &str) -> Result<(), BridgeError>;
}

/// Mount lifecycle of one bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounted(WalletState),
}

impl MountState {
    pub fn is_mounted(&self) -> bool {
        matches!(self, MountState::Mounted(_))
    }
}
