use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::Instrument;

use crate::api::command::{Command, SlashCommandForm};
use crate::api::response::SlackReply;
use crate::api::signature::SlackForm;
use crate::delivery;
use crate::AppState;

pub const INVALID_ADD_FORMAT: &str = "Invalid format. Use `/add name,phone,email`.";
pub const DOWNLOAD_ACCEPTED: &str =
    "Processing your request. The PhoneBook CSV will be sent shortly.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Use `/add`, `/get`, or `/download`.";

pub async fn slash_command(
    State(state): State<Arc<AppState>>,
    SlackForm(form): SlackForm<SlashCommandForm>,
) -> Json<SlackReply> {
    tracing::debug!(command = %form.command, user_id = %form.user_id, "Received slash command");

    match Command::parse(&form.command, &form.text) {
        Command::Add { name, phone, email } => {
            match state.records.add_record(&name, &phone, &email).await {
                Ok(record) => SlackReply::in_channel(format!(
                    "Added: Name: {}, Phone: {}, Email: {}",
                    record.name, record.phone, record.email
                )),
                Err(_) => SlackReply::ephemeral(INVALID_ADD_FORMAT),
            }
        }
        Command::MalformedAdd => SlackReply::ephemeral(INVALID_ADD_FORMAT),
        Command::Get { name } => match state.records.retrieve_record(&name).await {
            Some(record) => SlackReply::in_channel(format!(
                "Record Found: Name: {}, Phone: {}, Email: {}",
                record.name, record.phone, record.email
            )),
            None => SlackReply::ephemeral(format!("No record found for {name}.")),
        },
        Command::Download => {
            spawn_download(Arc::clone(&state), form.user_id);
            SlackReply::ephemeral(DOWNLOAD_ACCEPTED)
        }
        Command::Unknown(_) => SlackReply::ephemeral(UNKNOWN_COMMAND),
    }
}

/// Run the export and upload off the request path; the outcome reaches the
/// user as a chat message.
fn spawn_download(state: Arc<AppState>, user_id: String) {
    let span = tracing::info_span!("download", job_id = %uuid::Uuid::new_v4(), user_id = %user_id);
    tokio::spawn(
        async move {
            // Outcome already logged and reported to the user.
            let _ = delivery::process_download(
                &state.records,
                state.channel.as_ref(),
                &state.config.export_path,
                &user_id,
            )
            .await;
        }
        .instrument(span),
    );
}
