use clap::{Args, Parser, Subcommand, ValueEnum};

use statusboard_types::Priority;

use crate::presets::PresetTarget;

/// Office status board: display and admin client
#[derive(Parser, Debug)]
#[command(name = "statusboard", version, about)]
pub struct Cli {
    /// Server base URL
    #[arg(
        long,
        global = true,
        env = "STATUSBOARD_URL",
        default_value = "http://localhost:3000"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the always-on board in this terminal
    Display(DisplayArgs),

    /// Manage notes
    #[command(subcommand)]
    Notes(NotesCommand),

    /// Manage quick-message presets
    #[command(subcommand)]
    Presets(PresetsCommand),

    /// Show or edit working hours
    #[command(subcommand)]
    Hours(HoursCommand),

    /// Pop a message up on every connected display
    Send {
        text: String,
        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Relay a raw signaling frame, e.g. '{"type":"offer","data":{...}}'
    Signal { frame: String },
}

#[derive(Args, Debug)]
pub struct DisplayArgs {
    /// Poll only; don't join the relay for pushed messages
    #[arg(long)]
    pub no_relay: bool,
}

#[derive(Subcommand, Debug)]
pub enum NotesCommand {
    /// List notes, newest first
    List,
    Add {
        message: String,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    Edit {
        id: i64,
        #[arg(short, long)]
        message: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    #[command(alias = "delete")]
    Rm { id: i64 },
    /// Delete every note
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum PresetsCommand {
    List,
    Add {
        text: String,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    Edit {
        id: i64,
        #[arg(short, long)]
        text: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    #[command(alias = "delete")]
    Rm { id: i64 },
    /// Post a preset as a note, or push it to displays
    Use {
        id: i64,
        #[arg(long = "as", value_enum, default_value_t = UseAs::Note)]
        target: UseAs,
    },
}

#[derive(Subcommand, Debug)]
pub enum HoursCommand {
    /// Everyone's schedule, or one person's
    Show { person: Option<String> },
    /// Set location and/or hours for one day
    SetDay {
        person: String,
        day: String,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(long)]
        hours: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseAs {
    Note,
    Message,
}

impl From<UseAs> for PresetTarget {
    fn from(value: UseAs) -> Self {
        match value {
            UseAs::Note => PresetTarget::Note,
            UseAs::Message => PresetTarget::Message,
        }
    }
}
