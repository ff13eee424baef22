// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Import / Export

//! Line-oriented import and export.
//!
//! ```text
//! CLIENT|key|name|taxId
//! BASIC|id|clientKey[|ON|SILENCE|OFF]
//! FANCY|id|clientKey[|ON|SILENCE|OFF]
//! FRIENDS|id|friend,friend,...
//! ```
//!
//! Import is all-or-nothing: entries are applied to a staged copy of the
//! network, which replaces the live one only if every entry succeeded.
//! Communications are not part of the format.

use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::network::Network;
use crate::terminal::TerminalKind;

const SEPARATOR: char = '|';
const LIST_SEPARATOR: char = ',';

impl Network {
    /// Import newline-separated entries. Blank lines are skipped.
    pub fn import_str(&mut self, text: &str) -> Result<()> {
        self.import_lines(text.lines())
    }

    /// Import entries one per item. Any failure is reported as
    /// [`NetworkError::UnrecognizedEntry`] naming the offending line, and the
    /// network is left untouched.
    pub fn import_lines<'a, I>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut staged = self.clone();
        let mut applied = 0usize;
        for line in lines.into_iter().map(str::trim).filter(|l| !l.is_empty()) {
            staged.apply_entry(line).map_err(|err| match err {
                NetworkError::UnrecognizedEntry { .. } => err,
                other => NetworkError::bad_entry(line, other),
            })?;
            applied += 1;
        }
        debug!(entries = applied, "import applied");
        *self = staged;
        Ok(())
    }

    fn apply_entry(&mut self, line: &str) -> Result<()> {
        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        match fields.as_slice() {
            ["CLIENT", key, name, tax_id] => {
                let tax_id = tax_id.parse::<u32>().map_err(|e| NetworkError::bad_entry(line, e))?;
                self.register_client(key, name, tax_id)
            }
            [kind @ ("BASIC" | "FANCY"), id, owner] => self.register_terminal(id, kind.parse()?, owner),
            [kind @ ("BASIC" | "FANCY"), id, owner, state] => {
                let kind: TerminalKind = kind.parse()?;
                self.register_terminal(id, kind, owner)?;
                match state.to_ascii_uppercase().as_str() {
                    "ON" => Ok(()),
                    "SILENCE" => self.silence(id),
                    "OFF" => self.turn_off(id),
                    _ => Err(NetworkError::bad_entry(line, format!("unknown state {state:?}"))),
                }
            }
            ["FRIENDS", id, friends] => friends
                .split(LIST_SEPARATOR)
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .try_for_each(|friend| self.add_friend(id, friend)),
            _ => Err(NetworkError::bad_entry(line, "unrecognized entry")),
        }
    }

    /// Entries that rebuild this network's clients, terminals and friend
    /// links. Busy terminals are written with the state they will resume.
    pub fn export_lines(&self) -> Vec<String> {
        let clients = self
            .clients
            .values()
            .map(|c| format!("CLIENT{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}", c.key(), c.name(), c.tax_id()));
        let terminals = self.terminals.values().map(|t| {
            format!(
                "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
                t.kind(),
                t.id(),
                t.owner(),
                t.state().resting_token()
            )
        });
        let friends = self.terminals.values().filter(|t| t.has_friends()).map(|t| {
            let list: Vec<&str> = t.friends().map(|f| f.as_str()).collect();
            format!("FRIENDS{SEPARATOR}{}{SEPARATOR}{}", t.id(), list.join(","))
        });
        clients.chain(terminals).chain(friends).collect()
    }

    pub fn export_string(&self) -> String {
        self.export_lines().join("\n")
    }
}
