// Rocket routes for the Battlesnake API
//
// Each route pulls the managed Bot out of Rocket's state and hands it the
// parsed game payload. The move route never answers with an error status:
// a payload that fails to parse still gets the configured default move.

use log::warn;
use rocket::http::Status;
use rocket::serde::json::{Error as JsonError, Json};
use serde_json::Value;

use anytime_snake::bot::Bot;
use anytime_snake::types::GameState;

/// GET / returns appearance and API version
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

#[post("/start", format = "json", data = "<state>")]
pub fn start(bot: &rocket::State<Bot>, state: Json<GameState>) -> Status {
    bot.start(&state.game, &state.turn, &state.board, &state.you);
    Status::Ok
}

/// POST /move runs one time-bounded decision
#[post("/move", format = "json", data = "<state>")]
pub async fn get_move(
    bot: &rocket::State<Bot>,
    state: Result<Json<GameState>, JsonError<'_>>,
) -> Json<Value> {
    match state {
        Ok(state) => Json(
            bot.get_move(&state.game, &state.turn, &state.board, &state.you)
                .await,
        ),
        Err(e) => {
            warn!("Unreadable move request: {:?}", e);
            Json(bot.default_move())
        }
    }
}

#[post("/end", format = "json", data = "<state>")]
pub fn end(bot: &rocket::State<Bot>, state: Json<GameState>) -> Status {
    bot.end(&state.game, &state.turn, &state.board, &state.you);
    Status::Ok
}
