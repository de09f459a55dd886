//! Clap derive structures for the `visor` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// visor -- talk to a vision-inference backend from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "visor",
    version,
    about = "Query and drive a vision-inference backend from the command line",
    long_about = "One-shot calls against every backend endpoint (health, detections,\n\
        faces, emotion, analytics, records), a polling `watch` mode, and a\n\
        face-ID `login` that runs the same authentication gate as the dashboard.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend base URL (overrides the config file)
    #[arg(long, short = 'u', env = "VISOR_URL", global = true)]
    pub url: Option<String>,

    /// Config file to load instead of the default location
    #[arg(long, env = "VISOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VISOR_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VISOR_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, env = "VISOR_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Backend component health
    Health,

    /// Objects detected in the latest frame
    #[command(alias = "det")]
    Detections,

    /// Capture the current frame and upload it
    Capture,

    /// Register, recognize, or inspect faces
    Face(FaceArgs),

    /// Analyze the facial expression of the live camera or an image
    Emotion(ImageArgs),

    /// Latest action recognition result
    Action,

    /// Latest audio classification result
    Audio,

    /// Unknown faces currently tracked, and their frames
    #[command(alias = "sec")]
    Security(SecurityArgs),

    /// Recent recognition events
    Timeline(LimitArgs),

    /// Attendance records
    Attendance(LimitArgs),

    /// Save frames from the live MJPEG stream
    Stream(StreamArgs),

    /// Poll a panel and print it every period
    Watch(WatchArgs),

    /// Run the face-ID gate until a session is established
    Login(LoginArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Face ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FaceArgs {
    #[command(subcommand)]
    pub command: FaceCommand,
}

#[derive(Debug, Subcommand)]
pub enum FaceCommand {
    /// Register a face under a name
    Register {
        /// Name to register
        name: String,

        #[command(flatten)]
        image: ImageArgs,
    },

    /// Recognize the face in the live camera or an image
    Recognize(ImageArgs),

    /// Latest automatic recognition result
    Last,
}

/// Image input shared by face and emotion commands.
#[derive(Debug, Args)]
pub struct ImageArgs {
    /// Image file to upload; the live camera is used when omitted
    #[arg(long, short = 'i')]
    pub image: Option<PathBuf>,
}

// ── Security ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SecurityArgs {
    #[command(subcommand)]
    pub command: Option<SecurityCommand>,
}

#[derive(Debug, Subcommand)]
pub enum SecurityCommand {
    /// List tracked unknown faces (default)
    Status,

    /// Download the latest frame of an unknown face
    Frame {
        /// Unknown face id
        id: u64,

        /// Output file
        #[arg(long, short = 'O', default_value = "unknown.jpg")]
        out: PathBuf,
    },
}

// ── Records ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LimitArgs {
    /// Maximum number of rows requested
    #[arg(long, short = 'n')]
    pub limit: Option<u32>,
}

// ── Stream ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Number of frames to save
    #[arg(long, short = 'n', default_value = "1")]
    pub frames: u32,

    /// Directory the frames are written to
    #[arg(long, short = 'd', default_value = ".")]
    pub dir: PathBuf,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WatchPanel {
    Health,
    Detections,
    Action,
    Audio,
    Security,
    Timeline,
    Attendance,
    Face,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Panel to poll
    pub panel: WatchPanel,

    /// Poll period (e.g. "800ms", "3s"); defaults to the panel's configured period
    #[arg(long, value_parser = humantime::parse_duration)]
    pub every: Option<Duration>,

    /// Stop after this many results
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Give up after this long (e.g. "30s")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub wait: Option<Duration>,

    /// Minimum best-match score accepted (overrides the config file)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Make a single attempt instead of scanning every period
    #[arg(long)]
    pub once: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Backend base URL to store
        #[arg(long)]
        url: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
