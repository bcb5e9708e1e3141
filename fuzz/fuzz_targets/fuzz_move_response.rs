#![no_main]

use cube_four_client::classifier::{classify, resolve_mover};
use cube_four_client::protocol::{AlgoMoveResponse, GameState, MoveResponse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whatever the service sends, parsing and classification must not panic.
    if let Ok(resp) = serde_json::from_slice::<MoveResponse>(data) {
        let _ = classify(&resp);
        let _ = resolve_mover(&resp);
        if let Some(board) = resp.board {
            let _ = board.first_open_column();
        }
    }

    if let Ok(state) = serde_json::from_slice::<GameState>(data) {
        let _ = state.current_side();
        let _ = state.board.first_open_column();
    }

    if let Ok(algo) = serde_json::from_slice::<AlgoMoveResponse>(data) {
        if let Some(column) = algo.suggestion.and_then(|s| s.column()) {
            let _ = column.in_bounds();
        }
    }
});
