//! Game server listening on a UNIX socket.
//!
//! Every folder under `GAMES_FOLDER` is loaded at start-up as a game (par table CSV files plus an
//! optional `game.json`). Each connection opens its own session with an `Init` command and then
//! plays with the JSON-lines protocol of [`reel_engine::protocol`].
use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
    net::{UnixListener, UnixStream},
    sync::watch,
};

use reel_engine::{
    built_info,
    par_table::ParTable,
    protocol::{
        handle_command, init_response, ClientCommand, ServerResponse, ERR_MALFORMED,
        ERR_NOT_INITIALISED, ERR_SESSION, ERR_UNKNOWN_GAME,
    },
    session::{GameStatus, SessionObserver, SessionSnapshot},
    settings::{GameSettings, SETTINGS_FILE},
    utils::{format_matrix, write_message},
    Credits, GameController, GAMES_FOLDER, MAX_BYTES_READ, SOCKET_PATH,
};

struct Game {
    table: ParTable,
    settings: GameSettings,
}

/// Traces one connection's session changes.
struct SessionLog {
    client: u64,
}

impl SessionObserver for SessionLog {
    fn on_balance_change(&self, balance: Credits, _: &SessionSnapshot) {
        debug!("[client {}] balance {}", self.client, balance);
    }

    fn on_bet_change(&self, bet: Credits, _: &SessionSnapshot) {
        debug!("[client {}] bet {}", self.client, bet);
    }

    fn on_state_change(&self, from: GameStatus, to: GameStatus, _: &SessionSnapshot) {
        debug!("[client {}] {} -> {}", self.client, from, to);
    }
}

fn load_games(root: &Path) -> Result<BTreeMap<String, Game>> {
    let mut games = BTreeMap::new();

    for entry in fs::read_dir(root).with_context(|| format!("Cannot read {}", root.display()))? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_owned(),
            None => continue,
        };

        info!("Loading game files for {:?}...", path);
        let table = ParTable::from_folder(&path)
            .with_context(|| format!("Failed to load par table of \"{}\"", name))?;
        let settings = GameSettings::load(path.join(SETTINGS_FILE))
            .with_context(|| format!("Failed to load settings of \"{}\"", name))?;

        info!("Loaded \"{}\"\n{}", name, table);
        games.insert(name, Game { table, settings });
    }

    Ok(games)
}

async fn serve(
    command: ClientCommand,
    session: &mut Option<GameController>,
    games: &BTreeMap<String, Game>,
    client: u64,
) -> ServerResponse {
    if let Some(controller) = session.as_ref() {
        let response = handle_command(controller, command).await;
        if let ServerResponse::Spin { outcome, .. } = &response {
            debug!("[client {}] spin\n{}", client, format_matrix(&outcome.matrix));
        }
        return response;
    }

    let ClientCommand::Init { game } = command else {
        return ServerResponse::error(ERR_NOT_INITIALISED, "Send Init first");
    };
    let Some(definition) = games.get(&game) else {
        return ServerResponse::error(ERR_UNKNOWN_GAME, format!("Unknown game \"{}\"", game));
    };

    match GameController::for_game(&definition.table, &definition.settings) {
        Ok(controller) => {
            controller.subscribe(Arc::new(SessionLog { client }));
            info!("[client {}] playing \"{}\"", client, game);
            let response = init_response(&controller, &definition.table);
            *session = Some(controller);
            response
        }
        Err(e) => ServerResponse::error(ERR_SESSION, e.to_string()),
    }
}

async fn handle_client(
    stream: UnixStream,
    games: Arc<BTreeMap<String, Game>>,
    client: u64,
) -> Result<()> {
    info!("Accepted client {}", client);
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut session = None;

    loop {
        let mut line = String::new();
        let bytes_read = (&mut reader)
            .take(MAX_BYTES_READ)
            .read_line(&mut line)
            .await
            .context("Could not read line")?;
        if bytes_read == 0 {
            break;
        }

        let response = match serde_json::from_str::<ClientCommand>(line.trim_end()) {
            Ok(command) => {
                debug!("[client {}] {:?}", client, command);
                serve(command, &mut session, &games, client).await
            }
            Err(e) => {
                warn!("[client {}] malformed command: {}", client, e);
                ServerResponse::error(ERR_MALFORMED, e.to_string())
            }
        };

        write_message(&mut writer, &response)
            .await
            .context("Could not write to client")?;
    }

    info!("Client {} connection terminated", client);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("reel-engine daemon v{}", built_info::PKG_VERSION);

    let games = load_games(Path::new(GAMES_FOLDER))?;
    info!(
        "Loaded {} games: {:?}",
        games.len(),
        games.keys().collect::<Vec<_>>()
    );
    let games = Arc::new(games);

    let _ = fs::remove_file(SOCKET_PATH);
    info!("Starting new listening socket on \"{}\"...", SOCKET_PATH);
    let listener = UnixListener::bind(SOCKET_PATH).context("Could not bind socket")?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })
    .context("Error setting Ctrl-C handler")?;

    let mut next_client = 0u64;
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("Could not accept client")?;
                next_client += 1;
                let client = next_client;
                let games = games.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, games, client).await {
                        error!("Client {}: {:#}", client, e);
                    }
                });
            }
            _ = shutdown_rx.changed() => {
                info!("Shutting down");
                break;
            }
        }
    }

    let _ = fs::remove_file(SOCKET_PATH);
    Ok(())
}
