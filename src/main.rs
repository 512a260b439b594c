use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::exit,
    time::Instant,
};

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::warn;

use omnipost::{
    api::ApiClient,
    composer::{schedule::SchedulePicker, Composer},
    config::Config,
    draft::Attachment,
    view::{DestinationKind, DestinationListView, NO_RECENT_POSTS},
};

#[derive(Parser)]
#[clap(version, about)]
struct Args {
    /// Toml configuration with `base_url` and `cookies`.
    #[clap(short, long, value_parser, default_value = "omnipost.toml")]
    config: String,

    /// Server root. Overrides `base_url` from the config.
    #[clap(long, value_parser)]
    base_url: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List saved VK groups and Telegram channels.
    Groups,
    /// Show recently published and scheduled posts.
    Recent,
    /// Save a VK group together with its access token.
    AddVk {
        #[clap(value_parser)]
        group_id: String,
        #[clap(value_parser)]
        token: String,
    },
    /// Save a Telegram channel (`@name` or numeric id).
    AddTg {
        #[clap(value_parser)]
        channel_id: String,
    },
    /// Delete a saved VK group.
    RemoveVk {
        #[clap(value_parser)]
        group_id: String,
        /// Do not ask for confirmation.
        #[clap(short, long, action)]
        yes: bool,
    },
    /// Delete a saved Telegram channel.
    RemoveTg {
        #[clap(value_parser)]
        channel_id: String,
        /// Do not ask for confirmation.
        #[clap(short, long, action)]
        yes: bool,
    },
    /// Publish now, or schedule when --date or --time is given.
    Publish {
        #[clap(short, long, value_parser, default_value = "")]
        text: String,
        /// Attach a file. Repeatable.
        #[clap(short, long = "file", value_parser)]
        files: Vec<PathBuf>,
        /// VK group id. Repeatable.
        #[clap(long = "vk", value_parser)]
        vk_groups: Vec<String>,
        /// Telegram channel id. Repeatable.
        #[clap(long = "tg", value_parser)]
        tg_channels: Vec<String>,
        /// YYYY-MM-DD, local time. Defaults to today.
        #[clap(long, value_parser)]
        date: Option<String>,
        /// HH:MM, local time. Defaults to now.
        #[clap(long, value_parser)]
        time: Option<String>,
    },
    /// Start Telegram login: request a login code.
    TgSendCode {
        #[clap(value_parser)]
        phone: String,
    },
    /// Finish Telegram login with the received code.
    TgVerify {
        #[clap(value_parser)]
        code: String,
        /// Two-step verification password, if the account has one.
        #[clap(long, value_parser, default_value = "")]
        password: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omnipost=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{e:#}");
        exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut cfg = Config::load(&args.config).with_context(|| format!("loading {}", args.config))?;
    if let Some(base_url) = args.base_url {
        cfg.base_url = base_url;
    }

    let mut composer = Composer::new(ApiClient::from_config(&cfg));

    match args.command {
        Command::Groups => {
            composer.load_saved_groups().await;
            print_destinations(&composer.destination_view(DestinationKind::Vk));
            print_destinations(&composer.destination_view(DestinationKind::Telegram));
        }
        Command::Recent => {
            composer.load_recent_posts().await;
            let posts = composer.recent_view(&Local);
            if posts.is_empty() {
                println!("{NO_RECENT_POSTS}");
            }
            for post in posts {
                println!("[{}] {}  {}", post.status_label, post.time, post.platforms);
                println!("    {}", post.text);
            }
        }
        Command::AddVk { group_id, token } => {
            println!("{}", composer.add_vk_group(&group_id, &token).await?);
        }
        Command::AddTg { channel_id } => {
            println!("{}", composer.add_tg_channel(&channel_id).await?);
        }
        Command::RemoveVk { group_id, yes } => {
            remove(&mut composer, DestinationKind::Vk, &group_id, yes).await?;
        }
        Command::RemoveTg { channel_id, yes } => {
            remove(&mut composer, DestinationKind::Telegram, &channel_id, yes).await?;
        }
        Command::Publish { text, files, vk_groups, tg_channels, date, time } => {
            composer.load_saved_groups().await;

            composer.draft.text = text;
            for path in files {
                let file = Attachment::from_path(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                composer.attach(file);
            }
            let requested = [
                (DestinationKind::Vk, vk_groups),
                (DestinationKind::Telegram, tg_channels),
            ];
            for (kind, ids) in requested {
                for id in ids {
                    if !composer.destinations(kind).iter().any(|d| d.id == id) {
                        warn!(
                            id = %id,
                            kind = kind.short_name(),
                            "destination is not saved on the server"
                        );
                    }
                    composer.toggle(kind, &id);
                }
            }
            if !composer.draft.files.is_empty() {
                println!("Attached: {}", composer.draft.file_names());
            }

            let later = date.is_some() || time.is_some();
            composer.schedule = SchedulePicker { date, time };

            let outcome = if later {
                let preview = composer.open_schedule(Instant::now(), &Local::now());
                println!("{preview}");
                composer.publish_later(Instant::now(), &Local::now()).await?
            } else {
                composer.publish_now(Instant::now()).await?
            };

            println!("{outcome}");
        }
        Command::TgSendCode { phone } => {
            composer.open_tg_login(Instant::now());
            composer.send_tg_code(&phone).await?;
            println!("Code sent. Run `tg-verify <code>` to finish.");
        }
        Command::TgVerify { code, password } => {
            composer.open_tg_login(Instant::now());
            composer.verify_tg_code(&code, &password).await?;
            println!("Telegram account connected");
        }
    }

    Ok(())
}

async fn remove(
    composer: &mut Composer<ApiClient>,
    kind: DestinationKind,
    id: &str,
    yes: bool,
) -> anyhow::Result<()> {
    let deleted = composer
        .delete_destination(kind, id, |question| yes || ask(question))
        .await?;

    if deleted {
        println!("Deleted {id}");
    }
    Ok(())
}

fn ask(question: &str) -> bool {
    print!("{question} [y/N] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }

    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn print_destinations(view: &DestinationListView) {
    let title = match view.kind {
        DestinationKind::Vk => "VK groups",
        DestinationKind::Telegram => "Telegram channels",
    };
    println!("{title}:");

    if let Some(label) = view.empty_label() {
        println!("    {label}");
        return;
    }

    for row in &view.rows {
        println!("    {} ({})", row.name, row.id);
    }
}
