//! Walks one full round through the lobby: accounts, a room, a game of
//! uno, and the results landing on profiles.
//!
//! Run with `RUST_LOG=debug` for the engines' own logging.

use boardroom::prelude::*;

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn config() -> LobbyConfig {
    let mut config = LobbyConfig::default();
    // Cheap hashing keeps the demo snappy. Never do this in production.
    config.identity.hash_memory_kib = 1024;
    config.identity.hash_iterations = 1;
    config
}

async fn sign_in(
    identity: &IdentityStore<MemoryStore>,
    tokens: &TokenIssuer,
    name: &str,
) -> Result<PlayerId, Box<dyn std::error::Error>> {
    identity
        .sign_up(name, &format!("{name}@example.com"), "hunter2hunter2")
        .await?;
    let profile = identity.login(name, "hunter2hunter2").await?;
    let pair = tokens.issue(profile.uid.clone()).await;

    // A request handler would only ever see the bearer token.
    let player = tokens.authenticate(&pair.access_token).await?;
    tracing::info!(%player, name, "signed in");
    Ok(player)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boardroom::telemetry::init_tracing("info");

    let config = config();
    let tokens = TokenIssuer::new(config.tokens.clone());
    let lobby = LobbyBuilder::in_memory(config).with_identity().build()?;
    let identity = lobby.identity().ok_or("identity not wired")?;

    let alice = sign_in(identity, &tokens, "alice").await?;
    let bob = sign_in(identity, &tokens, "bob").await?;
    let carol = sign_in(identity, &tokens, "carol").await?;

    // Room
    let room = lobby
        .create_room(
            &alice,
            RoomSettings::new()
                .named("Friday night")
                .game_mode("uno")
                .private("letmein"),
        )
        .await?;
    lobby.join_room(&room.room_id, &bob, Some("letmein")).await?;
    lobby.join_room(&room.room_id, &carol, Some("letmein")).await?;

    // Game
    let game = lobby.start_game_from_room(&room.room_id, &alice).await?;
    let games = lobby.games();
    for _ in 0..4 {
        let turn = games.advance_turn(&game.game_id).await?;
        let draw = games.draw_cards(&game.game_id, 2).await?;
        tracing::info!(player = ?turn.current_player_id, cards = ?draw.cards, left = draw.session.active_deck.len(), "drew");
    }

    // Carol walks out; the default policy eliminates her from the round.
    lobby.leave_room(&room.room_id, &carol).await?;

    let finished = lobby
        .end_game(&game.game_id, &alice, Some(&bob), Some("last card".into()))
        .await?;

    // Summary
    println!("{}", serde_json::to_string_pretty(&finished.summary())?);
    for player in [&alice, &bob, &carol] {
        let profile = identity.find_profile(player).await?;
        println!(
            "{player}: played {} won {} xp {} level {}",
            profile.total_games_played,
            profile.total_games_won,
            profile.experience_points,
            profile.level
        );
    }
    Ok(())
}
