//! Socket messages exchanged between a client and the daemon.
//!
//! Leveraging `serde`, the messages are serialized to JSON, one message per line. A connection
//! starts with [`ClientCommand::Init`], which picks the game and opens a session; every other
//! command is then served by [`handle_command`] against that session's controller.

use serde::{Deserialize, Serialize};

use crate::{
    controller::GameController,
    machine::SpinOutcome,
    par_table::ParTable,
    payline::Payline,
    session::{GameStatus, SessionSnapshot},
    Credits,
};

/// Error code: the requested game folder is unknown.
pub const ERR_UNKNOWN_GAME: u64 = 1;
/// Error code: a command arrived before `Init`.
pub const ERR_NOT_INITIALISED: u64 = 2;
/// Error code: `Init` arrived twice on one connection.
pub const ERR_ALREADY_INITIALISED: u64 = 3;
/// Error code: the bet was refused.
pub const ERR_INVALID_BET: u64 = 4;
/// Error code: the line was not a valid command.
pub const ERR_MALFORMED: u64 = 5;
/// Error code: the session could not be opened.
pub const ERR_SESSION: u64 = 6;

/// The client commands that can be sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCommand {
    /// Sent once, first, to open a session on a game.
    Init {
        /// Game string identifier (subfolder name in `GAMES_FOLDER`).
        game: String,
    },
    /// Asks for a spin at the current bet.
    Spin,
    /// Changes the bet of the next spins.
    SetBet {
        /// Requested bet.
        bet: Credits,
    },
    /// Dismisses the win on display, returning the session to idle.
    FinishWin,
    /// Asks for the session's balance, bet and status.
    Status,
}

/// The server responses that will be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerResponse {
    /// In response to the client starting a new game.
    Init {
        /// Starting balance. Resets on every connection.
        balance: Credits,
        /// Current bet.
        bet: Credits,
        /// Lines the game scores, so the client can draw them.
        paylines: Vec<Payline>,
        /// Height of the visible window.
        visible_rows: usize,
        /// Number of reels.
        reels: usize,
    },
    /// In response to a spin that produced an outcome.
    Spin {
        /// Result of the spin.
        outcome: SpinOutcome,
        /// Balance after the debit and the win.
        balance: Credits,
        /// Bet after any clamping.
        bet: Credits,
        /// `showingWin` after a win, `idle` otherwise.
        status: GameStatus,
    },
    /// The request was valid but could not be served in the current session state.
    Rejected {
        /// Why no outcome was produced.
        reason: String,
    },
    /// In response to an accepted bet change.
    Bet {
        /// Bet now in effect.
        bet: Credits,
    },
    /// In response to `Status` and `FinishWin`.
    Status(SessionSnapshot),
    /// Sent when an invalid request is received or when a request could not be fulfilled.
    Error {
        /// Error code identifier.
        code: u64,
        /// Error message.
        message: String,
    },
}

impl ServerResponse {
    /// Shorthand for [`ServerResponse::Error`].
    pub fn error(code: u64, message: impl Into<String>) -> Self {
        ServerResponse::Error {
            code,
            message: message.into(),
        }
    }
}

/// First response of a connection, describing the game that was opened.
pub fn init_response(controller: &GameController, table: &ParTable) -> ServerResponse {
    let snapshot = controller.snapshot();
    ServerResponse::Init {
        balance: snapshot.balance,
        bet: snapshot.bet,
        paylines: table.paylines.clone(),
        visible_rows: table.visible_rows,
        reels: table.reel_count,
    }
}

/// Serves one command against an open session.
pub async fn handle_command(controller: &GameController, command: ClientCommand) -> ServerResponse {
    match command {
        ClientCommand::Init { game } => ServerResponse::error(
            ERR_ALREADY_INITIALISED,
            format!("A game is already open, cannot switch to \"{}\"", game),
        ),
        ClientCommand::Spin => match controller.try_spin().await {
            Ok(outcome) => {
                let snapshot = controller.snapshot();
                ServerResponse::Spin {
                    outcome,
                    balance: snapshot.balance,
                    bet: snapshot.bet,
                    status: snapshot.status,
                }
            }
            Err(rejection) => ServerResponse::Rejected {
                reason: rejection.to_string(),
            },
        },
        ClientCommand::SetBet { bet } => match controller.set_bet(bet) {
            Ok(()) => ServerResponse::Bet {
                bet: controller.bet(),
            },
            Err(e) => ServerResponse::error(ERR_INVALID_BET, e.to_string()),
        },
        ClientCommand::FinishWin => {
            if controller.finish_win_presentation() {
                ServerResponse::Status(controller.snapshot())
            } else {
                ServerResponse::Rejected {
                    reason: "No win on display".to_string(),
                }
            }
        }
        ClientCommand::Status => ServerResponse::Status(controller.snapshot()),
    }
}
