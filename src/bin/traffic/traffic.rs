// Command Stream Generator: seedable, weighted mix of network commands
// Draws every choice from one ChaCha8Rng so a seed fully determines the stream

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use telecom_engine::{CommunicationKind, Network};

/// Cumulative weights of the command mix.
/// Text 30%, call 20%, hang-up 15%, payment 15%, power 12%, friends 3%,
/// notification toggles 2%, inbox reads 3%.
const COMMAND_CDF: [f64; 8] = [0.30, 0.50, 0.65, 0.80, 0.92, 0.95, 0.97, 1.00];

/// Longest text generated; spans every text band of the base plan.
const MAX_TEXT_LEN: usize = 160;

const MAX_CALL_DURATION: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SendText { origin: String, destination: String, message: String },
    StartCall { origin: String, destination: String, kind: CommunicationKind },
    EndCall { terminal: String, duration: u32 },
    Pay { terminal: String, communication: u32 },
    TurnOn(String),
    TurnOff(String),
    Silence(String),
    AddFriend { terminal: String, friend: String },
    ToggleNotifications(String),
    ReadNotifications(String),
}

impl Command {
    /// Apply to `network`, returning whatever the command reported.
    pub fn apply(&self, network: &mut Network) -> telecom_engine::Result<()> {
        match self {
            Self::SendText { origin, destination, message } => network.send_text(origin, destination, message).map(drop),
            Self::StartCall { origin, destination, kind } => network.start_interactive(origin, destination, *kind).map(drop),
            Self::EndCall { terminal, duration } => network.end_interactive(terminal, *duration).map(drop),
            Self::Pay { terminal, communication } => network.perform_payment(terminal, *communication),
            Self::TurnOn(t) => network.turn_on(t),
            Self::TurnOff(t) => network.turn_off(t),
            Self::Silence(t) => network.silence(t),
            Self::AddFriend { terminal, friend } => network.add_friend(terminal, friend),
            Self::ToggleNotifications(c) => {
                if network.client(c)?.notifications_enabled() {
                    network.disable_notifications(c)
                } else {
                    network.enable_notifications(c)
                }
            }
            Self::ReadNotifications(c) => network.read_notifications(c).map(drop),
        }
    }
}

pub struct TrafficGenerator {
    rng: ChaCha8Rng,
    terminals: Vec<String>,
    clients: Vec<String>,
    pub command_counts: [u32; 8],
}

impl TrafficGenerator {
    pub fn new(rng: ChaCha8Rng, terminals: Vec<String>, clients: Vec<String>) -> Self {
        Self { rng, terminals, clients, command_counts: [0; 8] }
    }

    fn pick_terminal(&mut self) -> String {
        let i = self.rng.gen_range(0..self.terminals.len());
        self.terminals[i].clone()
    }

    fn pick_client(&mut self) -> String {
        let i = self.rng.gen_range(0..self.clients.len());
        self.clients[i].clone()
    }

    /// Draw the next command. Hang-ups and payments look at `network` so they
    /// usually target something that exists.
    pub fn next_command(&mut self, network: &Network) -> Option<Command> {
        if self.terminals.is_empty() || self.clients.is_empty() {
            return None;
        }
        let slot = select_slot(&mut self.rng);
        self.command_counts[slot] += 1;

        let command = match slot {
            0 => {
                let len = self.rng.gen_range(0..=MAX_TEXT_LEN);
                Command::SendText {
                    origin: self.pick_terminal(),
                    destination: self.pick_terminal(),
                    message: "x".repeat(len),
                }
            }
            1 => {
                let kind = if self.rng.gen_bool(0.5) { CommunicationKind::Voice } else { CommunicationKind::Video };
                Command::StartCall { origin: self.pick_terminal(), destination: self.pick_terminal(), kind }
            }
            2 => {
                let callers: Vec<String> = network
                    .terminals()
                    .filter(|t| t.is_busy())
                    .filter(|t| {
                        t.ongoing_communication()
                            .and_then(|id| network.communication(id.0).ok())
                            .is_some_and(|c| c.origin() == t.id())
                    })
                    .map(|t| t.id().to_string())
                    .collect();
                let terminal = if callers.is_empty() {
                    self.pick_terminal()
                } else {
                    callers[self.rng.gen_range(0..callers.len())].clone()
                };
                Command::EndCall { terminal, duration: self.rng.gen_range(0..=MAX_CALL_DURATION) }
            }
            3 => {
                let total = network.communications().len();
                if total == 0 {
                    Command::Pay { terminal: self.pick_terminal(), communication: 1 }
                } else {
                    let comm = &network.communications()[self.rng.gen_range(0..total)];
                    Command::Pay { terminal: comm.origin().to_string(), communication: comm.id().0 }
                }
            }
            4 => match self.rng.gen_range(0..3) {
                0 => Command::TurnOn(self.pick_terminal()),
                1 => Command::TurnOff(self.pick_terminal()),
                _ => Command::Silence(self.pick_terminal()),
            },
            5 => Command::AddFriend { terminal: self.pick_terminal(), friend: self.pick_terminal() },
            6 => Command::ToggleNotifications(self.pick_client()),
            _ => Command::ReadNotifications(self.pick_client()),
        };
        Some(command)
    }
}

fn select_slot(rng: &mut ChaCha8Rng) -> usize {
    let r: f64 = rng.gen();
    COMMAND_CDF.iter().position(|&cdf| r < cdf).unwrap_or(COMMAND_CDF.len() - 1)
}
