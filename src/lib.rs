#![warn(missing_docs)]
#![doc = include_str!("../docs/reel_engine.md")]

pub mod controller;
pub mod error;
pub mod fsm;
pub mod machine;
pub mod par_table;
pub mod payline;
pub mod paytable;
pub mod protocol;
pub mod provider;
pub mod reel_strip;
pub mod rng;
pub mod rtp;
pub mod session;
pub mod settings;
pub mod symbol;
pub mod utils;
/// Generated build information made available in the code by the `built` crate.
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use controller::GameController;
pub use error::{EngineError, Result};
pub use machine::{SlotMachine, SpinOutcome};
pub use symbol::Symbol;

/// Amount of money, in credits. Signed so that negative requests can be reported.
pub type Credits = i64;

/// Client / server UNIX socket file path.
pub const SOCKET_PATH: &str = "/tmp/reel_engine.sock";
/// Maximum amount of bytes for a single socket read.
pub const MAX_BYTES_READ: u64 = 4096;
/// Games folder path.
pub const GAMES_FOLDER: &str = "./data/games/";
