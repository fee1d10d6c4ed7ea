use crate::{AppState, Effect, Msg, Notice, RunStatus};

const INVALID_COUNT: &str = "Please enter a valid number for the images.";
const EMPTY_QUERY: &str = "Please enter a subject.";
const NON_POSITIVE_COUNT: &str = "Please enter a positive number of images.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QueryChanged(query) => {
            state.set_query(query);
            Vec::new()
        }
        Msg::CountChanged(count) => {
            state.set_count(count);
            Vec::new()
        }
        Msg::StartClicked => {
            if state.status().is_active() || state.awaiting_destination() {
                return (state, Vec::new());
            }
            try_start(&mut state)
        }
        Msg::DestinationChosen(choice) => {
            if !state.awaiting_destination() {
                return (state, Vec::new());
            }
            state.set_awaiting_destination(false);
            match choice {
                Some(dir) => {
                    state.set_destination(Some(dir));
                    try_start(&mut state)
                }
                // Dismissed prompt: nothing starts, nothing is reported.
                None => Vec::new(),
            }
        }
        Msg::StopClicked => {
            if state.status() == RunStatus::Running {
                state.request_stop();
                vec![Effect::StopHarvest]
            } else {
                Vec::new()
            }
        }
        Msg::Progress {
            percent,
            downloaded,
        } => {
            if state.status().is_active() {
                state.apply_progress(percent, downloaded);
            }
            Vec::new()
        }
        Msg::RunFinished(outcome) => {
            if state.status().is_active() {
                state.finish_run(outcome);
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn try_start(state: &mut AppState) -> Vec<Effect> {
    let target_count = match validate(state.query_input(), state.count_input()) {
        Ok(count) => count,
        Err(message) => {
            state.set_notice(Some(Notice::Error(message.to_string())));
            return Vec::new();
        }
    };

    let Some(destination) = state.destination().map(ToOwned::to_owned) else {
        state.set_awaiting_destination(true);
        return vec![Effect::PromptDestination];
    };

    let query = state.query_input().trim().to_string();
    state.start_run(target_count);
    vec![Effect::StartHarvest {
        query,
        target_count,
        destination,
    }]
}

fn validate(query: &str, count: &str) -> Result<usize, &'static str> {
    let count: i64 = count.trim().parse().map_err(|_| INVALID_COUNT)?;
    if query.trim().is_empty() {
        return Err(EMPTY_QUERY);
    }
    if count <= 0 {
        return Err(NON_POSITIVE_COUNT);
    }
    usize::try_from(count).map_err(|_| INVALID_COUNT)
}
