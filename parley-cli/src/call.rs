use anyhow::{Context, Result};
use colored::*;
use dialoguer::Input;
use parley_client::{
    CallEvent, Coordinator, CoordinatorConfig, MediaConstraints, ReconnectPolicy, RelayClient,
    StaticMediaSource, WebrtcConnector, spawn_signal_pump,
};
use std::sync::Arc;
use tracing::debug;

#[derive(clap::Args)]
pub struct CallArgs {
    /// Relay WebSocket URL, e.g. ws://localhost:3000/ws
    #[arg(long)]
    url: String,

    /// Room to join. Prompted for when omitted.
    #[arg(long)]
    room: Option<String>,

    #[arg(long)]
    no_audio: bool,

    #[arg(long)]
    no_video: bool,

    /// Camera device id.
    #[arg(long)]
    camera: Option<String>,

    /// STUN server URL; repeat for several. Replaces the defaults.
    #[arg(long)]
    stun: Vec<String>,
}

pub async fn run(args: CallArgs) -> Result<()> {
    let room = match args.room {
        Some(room) => room,
        None => prompt_room()?,
    };

    let mut config = CoordinatorConfig::from_env().with_stun(args.stun);
    config.media = MediaConstraints {
        audio: !args.no_audio,
        video: !args.no_video,
        camera: args.camera.clone(),
    };

    let media = match args.camera {
        Some(camera) => StaticMediaSource::new(vec![camera]),
        None => StaticMediaSource::default(),
    };

    let (relay, incoming) = RelayClient::connect(&args.url, &ReconnectPolicy::default())
        .await
        .with_context(|| format!("Failed to reach relay at {}", args.url))?;

    let (coordinator, mut events) = Coordinator::new(
        config.clone(),
        Arc::new(WebrtcConnector::from_config(&config)),
        Arc::new(media),
        Arc::new(relay),
    );
    let coordinator = Arc::new(coordinator);
    let pump = spawn_signal_pump(Arc::clone(&coordinator), incoming);

    println!("{} {}", "📞 Joining room".cyan().bold(), room.bold());
    coordinator
        .start_call(room.as_str())
        .await
        .context("Failed to start call")?;
    println!("   {}", "Press Ctrl-C to hang up".dimmed());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Hanging up...".yellow());
                coordinator.end_call().await;
            }
            event = events.recv() => match event {
                Some(CallEvent::Closed(reason)) => {
                    print_closed(reason.as_ref());
                    break;
                }
                Some(event) => print_event(&event),
                None => break,
            },
        }
    }

    pump.abort();
    debug!("Call finished");
    Ok(())
}

fn prompt_room() -> Result<String> {
    let room: String = Input::new()
        .with_prompt("Room name")
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("room name must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read room name")?;
    Ok(room.trim().to_owned())
}

fn print_event(event: &CallEvent) {
    match event {
        CallEvent::StateChanged(state) => println!("{} {}", "●".cyan(), state),
        CallEvent::RemoteMedia(track) => println!(
            "{} remote {} track {}",
            "🎥".green(),
            track.kind,
            track.id.dimmed()
        ),
        CallEvent::Dropped(err) => println!("{} {}", "⚠".yellow(), err.to_string().yellow()),
        CallEvent::Closed(reason) => print_closed(reason.as_ref()),
    }
}

fn print_closed(reason: Option<&parley_client::CallError>) {
    match reason {
        Some(err) => println!("{} {}", "✖ Call ended:".red().bold(), err),
        None => println!("{}", "✔ Call ended".green().bold()),
    }
}
