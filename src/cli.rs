use std::{env, path::PathBuf, sync::Arc};

use calshare::config::NotifyMode;
use calshare::notify::{InviteNotifier, LogNotifier, WebhookNotifier};
use calshare::{Config, Service, Store};

pub enum CliCommand {
    Init,
    Sweep,
}

pub struct CliOptions {
    pub command: CliCommand,
    pub db_path: Option<PathBuf>,
}

pub fn parse_cli() -> Result<CliOptions, String> {
    let mut command = None;
    let mut db_path = None;
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "init" => command = Some(CliCommand::Init),
            "sweep" => command = Some(CliCommand::Sweep),
            "--db" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--db requires a path".to_string())?;
                db_path = Some(PathBuf::from(value));
            }
            "--help" => {
                println!("Usage: calshare [--db PATH] <init|sweep>");
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    let command = command.ok_or_else(|| "Missing command".to_string())?;
    Ok(CliOptions { command, db_path })
}

pub fn build_service(config: &Config, db_path: Option<&PathBuf>) -> anyhow::Result<Service> {
    let path = db_path.unwrap_or(&config.database.path);
    let store = Store::open(path)?;
    store.initialize()?;

    let notifier: Arc<dyn InviteNotifier> = match config.notify.mode {
        NotifyMode::Log => Arc::new(LogNotifier),
        NotifyMode::Webhook => Arc::new(WebhookNotifier::new(
            config.notify.webhook_url.clone(),
            config.invites.accept_base_url.clone(),
        )),
    };

    Ok(Service::new(store, notifier, config.invites.clone()))
}

pub async fn run(options: CliOptions) -> anyhow::Result<()> {
    let config = Config::load_or_create()?;
    let service = build_service(&config, options.db_path.as_ref())?;

    match options.command {
        CliCommand::Init => {
            println!("Schema ready at {}", options
                .db_path
                .unwrap_or(config.database.path)
                .display());
        }
        CliCommand::Sweep => {
            let swept = service.sweep_expired_invites()?;
            println!("Revoked {} expired invite(s)", swept);
        }
    }

    Ok(())
}
