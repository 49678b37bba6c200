//! party-lobby: a "categories" word game served by Parlor.

mod game;

use std::time::Duration;

use clap::Parser;
use parlor::prelude::*;

use crate::game::PartyGame;

/// party-lobby: browser party game server
#[derive(Parser, Debug)]
#[command(name = "party-lobby", version, about = "Browser party game server")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Seconds a disconnected player keeps their identity
    #[arg(long, default_value_t = 30 * 60)]
    forget_after_secs: u64,

    /// Seconds between sweeps for expired identities
    #[arg(long, default_value_t = 60)]
    reap_interval_secs: u64,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            forget_after: Duration::from_secs(self.forget_after_secs),
            reap_interval: Duration::from_secs(self.reap_interval_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    parlor::logging::init(&cli.log_level);

    let server = ParlorServerBuilder::new()
        .bind(&cli.bind)
        .session_config(cli.session_config())
        .build::<PartyGame>()
        .await?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %server.local_addr()?,
        "starting party-lobby"
    );
    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let server = ParlorServerBuilder::new()
            .bind("127.0.0.1:0")
            .build::<PartyGame>()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn ws(addr: &str) -> Ws {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        let greeting = recv(&mut ws).await;
        assert_eq!(greeting["action"], "set-server-runtime-identifier");
        ws
    }

    async fn send(ws: &mut Ws, value: Value) {
        ws.send(Message::text(value.to_string())).await.unwrap();
    }

    async fn recv(ws: &mut Ws) -> Value {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout")
            .unwrap()
            .unwrap();
        serde_json::from_str(msg.into_text().unwrap().as_str()).unwrap()
    }

    /// Sends `action` with the stored credentials and game code.
    async fn send_as(ws: &mut Ws, me: &Value, action: &str, mut extra: Value) {
        extra["uuid"] = me["uuid"].clone();
        extra["secret"] = me["secret"].clone();
        extra["slug"] = me["slug"].clone();
        extra["action"] = json!(action);
        send(ws, extra).await;
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["party-lobby"]);
        assert_eq!(cli.bind, "0.0.0.0:8080");
        assert_eq!(cli.session_config().forget_after, Duration::from_secs(1800));
        assert_eq!(cli.session_config().reap_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "party-lobby",
            "--bind",
            "127.0.0.1:9000",
            "--forget-after-secs",
            "5",
            "--reap-interval-secs",
            "1",
        ]);
        assert_eq!(cli.bind, "127.0.0.1:9000");
        assert_eq!(cli.session_config().forget_after, Duration::from_secs(5));
        assert_eq!(cli.session_config().reap_interval, Duration::from_secs(1));
    }

    // Host creates a game, a guest joins by code, both see the same lobby.
    #[tokio::test]
    async fn test_two_players_share_a_lobby() {
        let addr = start().await;
        let mut host = ws(&addr).await;
        let mut guest = ws(&addr).await;

        send(&mut host, json!({ "action": "join-game", "pseudonym": "Ann" })).await;
        assert_eq!(recv(&mut host).await["action"], "set-uuid");
        let slug = recv(&mut host).await["slug"].clone();
        let state = recv(&mut host).await;
        assert_eq!(state["action"], "game-state");
        assert_eq!(state["phase"], "lobby");

        send(&mut guest, json!({ "action": "join-game", "slug": slug, "pseudonym": "Ben" })).await;
        assert_eq!(recv(&mut guest).await["action"], "set-uuid");
        let guest_view = recv(&mut guest).await;
        let host_view = recv(&mut host).await;

        for view in [guest_view, host_view] {
            assert_eq!(view["slug"], slug);
            assert_eq!(view["players"][0]["pseudonym"], "Ann");
            assert_eq!(view["players"][1]["pseudonym"], "Ben");
        }
    }

    // A solo host reloads mid-game and lands back in the same seat.
    #[tokio::test]
    async fn test_reload_rejoins_same_game_with_score_and_host() {
        let addr = start().await;
        let mut tab = ws(&addr).await;

        send(&mut tab, json!({ "action": "join-game", "pseudonym": "Ann" })).await;
        let mut me = recv(&mut tab).await;
        assert_eq!(me["action"], "set-uuid");
        me["slug"] = recv(&mut tab).await["slug"].clone();
        assert_eq!(recv(&mut tab).await["host"], me["uuid"]);

        let config = json!({ "configuration": { "categories": ["Food"], "rounds": 2 } });
        send_as(&mut tab, &me, "update-config", config).await;
        assert_eq!(recv(&mut tab).await["rounds"], 2);

        send_as(&mut tab, &me, "start-game", json!({})).await;
        let state = recv(&mut tab).await;
        assert_eq!(state["phase"], "answering");
        let letter = state["letter"].as_str().unwrap().to_owned();

        let answers = json!({ "answers": { "Food": format!("{letter}ucky dip") } });
        send_as(&mut tab, &me, "send-answers", answers).await;
        assert_eq!(recv(&mut tab).await["phase"], "voting");

        send_as(&mut tab, &me, "vote-ready", json!({})).await;
        let state = recv(&mut tab).await;
        assert_eq!(state["round"], 2);
        assert_eq!(state["players"][0]["score"], 1);

        tab.close(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut reloaded = ws(&addr).await;
        send_as(&mut reloaded, &me, "join-game", json!({ "pseudonym": "Ann" })).await;

        let state = recv(&mut reloaded).await;
        assert_eq!(state["action"], "game-state", "no new credentials, no new slug");
        assert_eq!(state["slug"], me["slug"]);
        assert_eq!(state["host"], me["uuid"]);
        assert_eq!(state["round"], 2);
        assert_eq!(state["phase"], "answering");
        assert_eq!(state["players"].as_array().unwrap().len(), 1);
        assert_eq!(state["players"][0]["score"], 1);
        assert_eq!(state["players"][0]["connected"], true);
    }
}
