use std::sync::{Arc, Mutex};

use clap::Parser;
use eyre::{eyre, Context, Result};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

use groupchat_net::client::{cli::Args, reader, sender, writer, ParticipantState, StdioUi};
use groupchat_net::wire::frame::{ClientFrame, JoinPayload};
use groupchat_net::wire::{send_frame, RecvBuffer, SERVER_FULL_MESSAGE};

#[tokio::main]
async fn main() -> Result<()> {
    stable_eyre::install()?;
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut prompt_ui = StdioUi::default();
    let username = match args.username {
        Some(username) => username,
        None => {
            prompt_ui.status("enter a username");
            prompt_ui
                .read_line()
                .ok_or_else(|| eyre!("no username supplied"))?
        }
    };

    let addr = format!("{}:{}", args.server_ip, args.port);
    let stream = TcpStream::connect(&addr)
        .await
        .wrap_err_with(|| format!("failed to connect to {addr}"))?;
    tracing::info!(%addr, "connected");

    let participant = Arc::new(Mutex::new(ParticipantState::new(username.clone())));
    let (mut read_half, write_half) = stream.into_split();

    let join = ClientFrame::AuthenticateAndJoin(JoinPayload {
        username: username.clone(),
        public_key: participant.lock().unwrap().public_key,
    });

    let mut writer_half = write_half;
    send_frame(&mut writer_half, &join.to_json_bytes())
        .await
        .wrap_err("failed to send join frame")?;

    let mut recv_buf = RecvBuffer::new();
    let first = recv_buf
        .recv_frame(&mut read_half)
        .await
        .wrap_err("connection closed before server responded to join")?;
    if first.as_slice() == SERVER_FULL_MESSAGE {
        return Err(eyre!("server is full"));
    }

    prompt_ui.status(&format!("joined as {username}"));
    let ui: Arc<Mutex<dyn groupchat_net::client::Ui>> = Arc::new(Mutex::new(prompt_ui));

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    // The first frame the server sent after join is a real protocol frame
    // (S2C_GROUP_MEMBERS_LIST), not consumed by `reader::run`'s own loop, so
    // feed it through the same handling path before entering the loop.
    if let Ok(frame) = serde_json::from_slice(&first) {
        reader::handle(frame, &participant, &ui, &tx);
    }

    let sender_task = tokio::spawn(sender::run(writer_half, rx));
    let reader_task = tokio::spawn(reader::run(
        read_half,
        Arc::clone(&participant),
        Arc::clone(&ui),
        tx.clone(),
        recv_buf,
    ));
    let writer_handle = {
        let participant = Arc::clone(&participant);
        let ui = Arc::clone(&ui);
        tokio::task::spawn_blocking(move || writer::run(participant, ui, tx))
    };

    let _ = tokio::join!(sender_task, reader_task, writer_handle);
    Ok(())
}
