// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine

pub mod types;
pub mod error;
pub mod tariff;
pub mod loyalty;
pub mod notification;
pub mod terminal_state;
pub mod terminal;
pub mod communication;
pub mod client;
pub mod network;
pub mod parser;

pub use client::Client;
pub use communication::{Communication, CommunicationStatus, LifecycleError};
pub use error::{ErrorKind, NetworkError, Result};
pub use loyalty::{LoyaltyPolicy, LoyaltyTier};
pub use network::{Network, NetworkConfig};
pub use notification::{DeliveryChannel, Notification, NotificationKind};
pub use tariff::{TariffError, TariffPlan};
pub use terminal::{Terminal, TerminalKind};
pub use terminal_state::{StateConflict, TerminalState};
pub use types::*;

use wasm_bindgen::prelude::*;

fn js_error(err: NetworkError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl Network {
    #[wasm_bindgen(constructor)]
    pub fn create() -> Network {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        Network::new()
    }

    #[wasm_bindgen(js_name = registerClient)]
    pub fn js_register_client(&mut self, key: &str, name: &str, tax_id: u32) -> std::result::Result<(), JsValue> {
        self.register_client(key, name, tax_id).map_err(js_error)
    }

    #[wasm_bindgen(js_name = registerTerminal)]
    pub fn js_register_terminal(&mut self, id: &str, kind: &str, owner: &str) -> std::result::Result<(), JsValue> {
        let kind: TerminalKind = kind.parse().map_err(js_error)?;
        self.register_terminal(id, kind, owner).map_err(js_error)
    }

    #[wasm_bindgen(js_name = addFriend)]
    pub fn js_add_friend(&mut self, terminal: &str, friend: &str) -> std::result::Result<(), JsValue> {
        self.add_friend(terminal, friend).map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeFriend)]
    pub fn js_remove_friend(&mut self, terminal: &str, friend: &str) -> std::result::Result<(), JsValue> {
        self.remove_friend(terminal, friend).map_err(js_error)
    }

    #[wasm_bindgen(js_name = turnOn)]
    pub fn js_turn_on(&mut self, terminal: &str) -> std::result::Result<(), JsValue> {
        self.turn_on(terminal).map_err(js_error)
    }

    #[wasm_bindgen(js_name = turnOff)]
    pub fn js_turn_off(&mut self, terminal: &str) -> std::result::Result<(), JsValue> {
        self.turn_off(terminal).map_err(js_error)
    }

    #[wasm_bindgen(js_name = silence)]
    pub fn js_silence(&mut self, terminal: &str) -> std::result::Result<(), JsValue> {
        self.silence(terminal).map_err(js_error)
    }

    /// Returns the new communication id.
    #[wasm_bindgen(js_name = sendText)]
    pub fn js_send_text(&mut self, origin: &str, destination: &str, message: &str) -> std::result::Result<u32, JsValue> {
        self.send_text(origin, destination, message).map(|id| id.0).map_err(js_error)
    }

    /// `kind` is `"voice"` or `"video"`, any case.
    #[wasm_bindgen(js_name = startInteractive)]
    pub fn js_start_interactive(&mut self, origin: &str, destination: &str, kind: &str) -> std::result::Result<u32, JsValue> {
        let kind: CommunicationKind = kind.parse().map_err(js_error)?;
        self.start_interactive(origin, destination, kind).map(|id| id.0).map_err(js_error)
    }

    /// Returns the rounded cost.
    #[wasm_bindgen(js_name = endInteractive)]
    pub fn js_end_interactive(&mut self, terminal: &str, duration: u32) -> std::result::Result<i64, JsValue> {
        self.end_interactive(terminal, duration).map(|cost| cost.rounded()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = performPayment)]
    pub fn js_perform_payment(&mut self, terminal: &str, communication: u32) -> std::result::Result<(), JsValue> {
        self.perform_payment(terminal, communication).map_err(js_error)
    }

    #[wasm_bindgen(js_name = enableNotifications)]
    pub fn js_enable_notifications(&mut self, client: &str) -> std::result::Result<(), JsValue> {
        self.enable_notifications(client).map_err(js_error)
    }

    #[wasm_bindgen(js_name = disableNotifications)]
    pub fn js_disable_notifications(&mut self, client: &str) -> std::result::Result<(), JsValue> {
        self.disable_notifications(client).map_err(js_error)
    }

    /// Drains the client's buffer; each entry is rendered as `TAG|terminal`.
    #[wasm_bindgen(js_name = readNotifications)]
    pub fn js_read_notifications(&mut self, client: &str) -> std::result::Result<JsValue, JsValue> {
        let lines: Vec<String> = self.read_notifications(client).map_err(js_error)?.iter().map(ToString::to_string).collect();
        Ok(to_js(&lines))
    }

    #[wasm_bindgen(js_name = importText)]
    pub fn js_import_text(&mut self, text: &str) -> std::result::Result<(), JsValue> {
        self.import_str(text).map_err(js_error)
    }

    #[wasm_bindgen(js_name = exportText)]
    pub fn js_export_text(&self) -> String {
        self.export_string()
    }

    pub fn get_clients(&self) -> JsValue {
        let lines: Vec<String> = self.clients().map(|c| c.describe(self.communications())).collect();
        to_js(&lines)
    }

    pub fn get_terminals(&self) -> JsValue {
        let lines: Vec<String> = self.terminals().map(|t| t.describe(self.communications())).collect();
        to_js(&lines)
    }

    pub fn get_communications(&self) -> JsValue {
        let lines: Vec<String> = self.communications().iter().map(ToString::to_string).collect();
        to_js(&lines)
    }

    pub fn get_client(&self, key: &str) -> JsValue {
        self.client(key).map(|c| to_js(c)).unwrap_or(JsValue::NULL)
    }

    pub fn get_terminal(&self, id: &str) -> JsValue {
        self.terminal(id).map(|t| to_js(t)).unwrap_or(JsValue::NULL)
    }

    pub fn get_global_balance(&self) -> i64 {
        self.global_balance().rounded()
    }

    #[wasm_bindgen(js_name = isChanged)]
    pub fn js_is_changed(&self) -> bool {
        self.is_changed()
    }

    #[wasm_bindgen(js_name = markSaved)]
    pub fn js_mark_saved(&mut self) {
        self.mark_saved();
    }

    /// Reset to an empty network
    pub fn reset(&mut self) {
        *self = Network::new();
    }
}
