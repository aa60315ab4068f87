use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use statusboard_client::cli::{Cli, Command, DisplayArgs, HoursCommand, NotesCommand, PresetsCommand};
use statusboard_client::display::REFRESH_INTERVAL_MS;
use statusboard_client::presets::{self, PresetTarget};
use statusboard_client::{ApiClient, DisplayBoard, RelayClient};
use statusboard_types::api::{
    Note, PersonSchedule, Preset, UpdateNoteRequest, UpdatePresetRequest, UpsertDayRequest,
    day_rank, display_name,
};
use statusboard_types::events::{DisplayMessage, SignalMessage};
use statusboard_types::Priority;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so the board owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statusboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new(cli.server)?;

    match cli.command {
        Command::Display(args) => run_display(api, args).await,
        Command::Notes(cmd) => run_notes(&api, cmd).await,
        Command::Presets(cmd) => run_presets(&api, cmd).await,
        Command::Hours(cmd) => run_hours(&api, cmd).await,
        Command::Send { text, priority } => {
            let text = text.trim();
            if text.is_empty() {
                bail!("message text is required");
            }
            let message = SignalMessage::DisplayMessage(DisplayMessage::popup(
                text,
                priority.unwrap_or_default(),
            ));
            let peers = push(&api, &message).await?;
            println!("Sent to {} connected display(s)", peers);
            Ok(())
        }
        Command::Signal { frame } => {
            let message: SignalMessage = serde_json::from_str(&frame)
                .context("frame must be an offer, answer, ice-candidate or display-message")?;
            let peers = push(&api, &message).await?;
            println!("Relayed {} to {} peer(s)", message.kind(), peers);
            Ok(())
        }
    }
}

// -- Display --

async fn run_display(api: ApiClient, args: DisplayArgs) -> Result<()> {
    let relay_url = api.relay_url()?;
    let mut board = DisplayBoard::new();
    let mut relay: Option<RelayClient> = None;

    let mut refresh = tokio::time::interval(Duration::from_millis(REFRESH_INTERVAL_MS as u64));
    let mut redraw = tokio::time::interval(Duration::from_secs(1));
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!("Display polling {} every {}ms", api.base_url(), REFRESH_INTERVAL_MS);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                board.refresh(&api, Utc::now()).await;
                if relay.is_none() && !args.no_relay {
                    relay = join_relay(&relay_url).await;
                }
                draw(&mut board);
            }
            _ = redraw.tick() => {
                // Only the popup countdown changes between refreshes
                if board.active_popup(Utc::now()).is_some() {
                    draw(&mut board);
                }
            }
            incoming = next_signal(&mut relay) => match incoming {
                Ok(Some(SignalMessage::DisplayMessage(message))) => {
                    info!("Display message: {}", message.text);
                    board.show_message(message, Utc::now());
                    draw(&mut board);
                }
                Ok(Some(other)) => debug!("No video sink, ignoring {}", other.kind()),
                Ok(None) => {
                    warn!("Relay closed, polling only until it is back");
                    relay = None;
                }
                Err(e) => {
                    warn!("Relay error: {:#}", e);
                    relay = None;
                }
            },
            line = stdin.next_line(), if stdin_open => match line {
                // Enter dismisses the popup
                Ok(Some(_)) => {
                    board.dismiss_popup();
                    draw(&mut board);
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    if let Some(relay) = relay {
        relay.close().await.ok();
    }
    Ok(())
}

async fn join_relay(url: &str) -> Option<RelayClient> {
    match RelayClient::connect(url).await {
        Ok(relay) => {
            info!("Joined relay as {}", relay.connection_id());
            Some(relay)
        }
        Err(e) => {
            debug!("Relay unavailable: {:#}", e);
            None
        }
    }
}

async fn next_signal(relay: &mut Option<RelayClient>) -> Result<Option<SignalMessage>> {
    match relay {
        Some(relay) => relay.recv().await,
        None => std::future::pending().await,
    }
}

fn draw(board: &mut DisplayBoard) {
    // Clear screen and home the cursor
    print!("\x1B[2J\x1B[H{}", board.render(Utc::now()));
}

/// Send one frame over the relay. Returns how many displays were there to
/// receive it.
async fn push(api: &ApiClient, message: &SignalMessage) -> Result<usize> {
    let mut relay = RelayClient::connect(&api.relay_url()?).await?;
    relay.send(message).await?;
    let peers = relay.peers();
    relay.close().await?;
    Ok(peers)
}

// -- Admin --

async fn run_notes(api: &ApiClient, cmd: NotesCommand) -> Result<()> {
    match cmd {
        NotesCommand::List => {
            let notes = api.notes().await?;
            if notes.is_empty() {
                println!("No notes");
            }
            for note in &notes {
                print_note(note);
            }
        }
        NotesCommand::Add { message, priority } => {
            let note = api.create_note(&message, priority).await?;
            print_note(&note);
        }
        NotesCommand::Edit {
            id,
            message,
            priority,
        } => {
            let note = api
                .update_note(id, &UpdateNoteRequest { message, priority })
                .await?;
            print_note(&note);
        }
        NotesCommand::Rm { id } => println!("{}", api.delete_note(id).await?.message),
        NotesCommand::Clear => println!("{}", api.clear_notes().await?.message),
    }
    Ok(())
}

async fn run_presets(api: &ApiClient, cmd: PresetsCommand) -> Result<()> {
    match cmd {
        PresetsCommand::List => {
            let presets = api.presets().await?;
            if presets.is_empty() {
                println!("No presets");
            }
            for preset in &presets {
                print_preset(preset);
            }
        }
        PresetsCommand::Add { text, priority } => {
            print_preset(&api.create_preset(&text, priority).await?);
        }
        PresetsCommand::Edit { id, text, priority } => {
            let preset = api
                .update_preset(id, &UpdatePresetRequest { text, priority })
                .await?;
            print_preset(&preset);
        }
        PresetsCommand::Rm { id } => println!("{}", api.delete_preset(id).await?.message),
        PresetsCommand::Use { id, target } => {
            let preset = api.preset(id).await?;
            match PresetTarget::from(target) {
                PresetTarget::Note => {
                    let req = presets::as_note(&preset);
                    let note = api.create_note(&req.message, req.priority).await?;
                    print_note(&note);
                }
                PresetTarget::Message => {
                    let peers = push(api, &presets::as_message(&preset)).await?;
                    println!("Sent \"{}\" to {} connected display(s)", preset.text, peers);
                }
            }
        }
    }
    Ok(())
}

async fn run_hours(api: &ApiClient, cmd: HoursCommand) -> Result<()> {
    match cmd {
        HoursCommand::Show { person: Some(person) } => {
            let schedule = api.person_schedule(&person.to_lowercase()).await?;
            print_schedule(&person.to_lowercase(), &schedule);
        }
        HoursCommand::Show { person: None } => {
            for (key, schedule) in api.working_hours().await? {
                print_schedule(&key, &schedule);
            }
        }
        HoursCommand::SetDay {
            person,
            day,
            location,
            hours,
        } => {
            if location.is_none() && hours.is_none() {
                bail!("nothing to set: pass --location and/or --hours");
            }
            let entry = api
                .upsert_day(&person, &day, &UpsertDayRequest { location, hours })
                .await?;
            println!(
                "{} {}: {} / {}",
                display_name(&entry.person),
                display_name(&entry.day),
                entry.location.as_deref().unwrap_or("-"),
                entry.hours.as_deref().unwrap_or("-"),
            );
        }
    }
    Ok(())
}

fn print_note(note: &Note) {
    println!(
        "#{:<4} {:<7} {}  ({})",
        note.id,
        priority_tag(note.priority),
        note.message,
        note.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
}

fn print_preset(preset: &Preset) {
    println!(
        "#{:<4} {:<7} {}",
        preset.id,
        priority_tag(preset.priority),
        preset.text
    );
}

fn print_schedule(key: &str, person: &PersonSchedule) {
    let name = if person.name.is_empty() {
        display_name(key)
    } else {
        person.name.clone()
    };
    println!("{}", name);

    let mut days: Vec<_> = person.schedule.iter().collect();
    days.sort_by_key(|(day, _)| day_rank(day));
    for (day, entry) in days {
        println!(
            "  {:<10} {:<16} {}",
            display_name(day),
            entry.location.as_deref().unwrap_or("-"),
            entry.hours.as_deref().unwrap_or("-"),
        );
    }
}

fn priority_tag(priority: Priority) -> String {
    format!("[{}]", priority)
}
