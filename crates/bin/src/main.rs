//! Desktop Drawer
//!
//! Command-line front end for grouped shortcut drawers.

mod console;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::ConsolePrompt;
use drawer_core::{
    data_dir, system_shell, ChangeEvent, Coordinator, DropPayload, IconLoader, ItemId,
    JsonDrawerStore, Settings, SettingsStore, SystemResolver, TieredIconProvider,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long a run waits for icon work before saving and exiting
const ICON_SETTLE: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "drawer")]
#[command(about = "Organize shortcuts into named drawers")]
struct Cli {
    /// Directory holding data.json and settings.json
    #[arg(long, env = "DRAWER_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all drawers and their shortcuts
    List,
    AddDrawer {
        name: String,
    },
    RemoveDrawer {
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    RenameDrawer {
        old: String,
        new: String,
    },
    /// Add files (or link files, which are resolved) to a drawer
    Add {
        drawer: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    Remove {
        drawer: String,
        name: String,
    },
    /// Reorder a shortcut, optionally into another drawer
    MoveItem {
        drawer: String,
        from: usize,
        to: usize,
        #[arg(long)]
        to_drawer: Option<String>,
    },
    MoveDrawer {
        from: usize,
        to: usize,
    },
    Launch {
        drawer: String,
        name: String,
    },
    /// Show a shortcut's target in the file browser
    Reveal {
        drawer: String,
        name: String,
    },
    /// Print the current settings
    Settings,
    /// Change a setting: locked, opacity, icon-size, double-click, startup
    Set {
        key: String,
        value: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let dir = match cli.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create data directory {:?}", dir))?;
            dir
        }
        None => data_dir()?,
    };
    log::debug!("Using data directory {:?}", dir);

    let shell = system_shell();
    let settings_store = SettingsStore::in_dir(&dir);
    let mut settings = settings_store.load(shell.as_ref());

    let provider = Arc::new(TieredIconProvider::new(
        shell.clone(),
        settings.icon_size_px(),
    ));
    let assume_yes = matches!(cli.command, Command::RemoveDrawer { yes: true, .. });
    let mut coordinator = Coordinator::new(
        JsonDrawerStore::in_dir(&dir),
        Arc::new(SystemResolver::new(shell.clone())),
        IconLoader::with_default_workers(provider),
        shell,
        ConsolePrompt::new(assume_yes),
    );
    let events = coordinator.subscribe();

    let result = run(cli.command, &mut coordinator, &mut settings);

    for event in events.try_iter() {
        log::debug!("Changed: {:?}", event);
        if let ChangeEvent::ShortcutAdded { id, .. } = event {
            if let Some(item) = coordinator.item(id) {
                log::info!("Added {} -> {}", item.name, item.path);
            }
        }
    }

    coordinator.wait_for_icons(ICON_SETTLE);
    coordinator.shutdown(&settings_store, &settings);
    result
}

fn run(command: Command, coordinator: &mut Coordinator, settings: &mut Settings) -> Result<()> {
    match command {
        Command::List => list(coordinator),
        Command::AddDrawer { name } => {
            coordinator.add_drawer(&name);
        }
        Command::RemoveDrawer { name, .. } => {
            let index = drawer_index(coordinator, &name)?;
            if !coordinator.delete_drawer(index) {
                println!("Kept drawer '{}'", name);
            }
        }
        Command::RenameDrawer { old, new } => {
            let index = drawer_index(coordinator, &old)?;
            coordinator.rename_drawer(index, &new);
        }
        Command::Add { drawer, paths } => {
            let index = drawer_index(coordinator, &drawer)?;
            let report = coordinator.add_shortcuts(&paths, index);
            println!(
                "Added {} shortcut(s), skipped {} duplicate(s)",
                report.added.len(),
                report.duplicates.len()
            );
        }
        Command::Remove { drawer, name } => {
            let id = item_id(coordinator, &drawer, &name)?;
            coordinator.delete_shortcut(id);
        }
        Command::MoveItem {
            drawer,
            from,
            to,
            to_drawer,
        } => {
            let from_drawer = drawer_index(coordinator, &drawer)?;
            let to_drawer = match to_drawer {
                Some(name) => drawer_index(coordinator, &name)?,
                None => from_drawer,
            };
            let moved = coordinator.handle_drop(DropPayload::Shortcut {
                from_drawer,
                from_index: from,
                to_drawer,
                to_index: to,
            });
            if !moved {
                println!("Nothing moved");
            }
        }
        Command::MoveDrawer { from, to } => {
            if !coordinator.handle_drop(DropPayload::Drawer {
                from_index: from,
                to_index: to,
            }) {
                println!("Nothing moved");
            }
        }
        Command::Launch { drawer, name } => {
            let id = item_id(coordinator, &drawer, &name)?;
            coordinator.launch(id);
        }
        Command::Reveal { drawer, name } => {
            let id = item_id(coordinator, &drawer, &name)?;
            coordinator.reveal(id);
        }
        Command::Settings => {
            let json =
                serde_json::to_string_pretty(settings).context("Failed to format settings")?;
            println!("{}", json);
        }
        Command::Set { key, value } => set(coordinator, settings, &key, &value)?,
    }
    Ok(())
}

fn list(coordinator: &Coordinator) {
    for (d, drawer) in coordinator.drawers().iter().enumerate() {
        let marker = if drawer.is_expanded { "v" } else { ">" };
        println!("{} [{}] {}", marker, d, drawer.name);
        for (i, item) in drawer.items.iter().enumerate() {
            match &item.arguments {
                Some(args) => println!("    [{}] {}  {} {}", i, item.name, item.path, args),
                None => println!("    [{}] {}  {}", i, item.name, item.path),
            }
        }
    }
}

fn set(coordinator: &Coordinator, settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "locked" => settings.is_locked = parse_bool(value)?,
        "opacity" => settings.set_opacity_percent(parse_number(value)?),
        "icon-size" => settings.set_icon_size(parse_number(value)?),
        "double-click" => settings.open_with_double_click = parse_bool(value)?,
        "startup" => {
            coordinator.set_run_at_startup(settings, parse_bool(value)?);
        }
        other => bail!(
            "Unknown setting '{}' (expected locked, opacity, icon-size, double-click, startup)",
            other
        ),
    }
    Ok(())
}

fn drawer_index(coordinator: &Coordinator, name: &str) -> Result<usize> {
    coordinator
        .drawer_index(name)
        .with_context(|| format!("No drawer named '{}'", name))
}

fn item_id(coordinator: &Coordinator, drawer: &str, name: &str) -> Result<ItemId> {
    let index = drawer_index(coordinator, drawer)?;
    coordinator
        .drawer(index)
        .and_then(|d| d.items.iter().find(|i| i.name.eq_ignore_ascii_case(name)))
        .map(|i| i.id)
        .with_context(|| format!("No shortcut named '{}' in '{}'", name, drawer))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("Expected on/off, got '{}'", value),
    }
}

fn parse_number(value: &str) -> Result<f64> {
    value
        .parse()
        .with_context(|| format!("Expected a number, got '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        assert!(parse_bool("On").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
        assert_eq!(parse_number("42.5").unwrap(), 42.5);
        assert!(parse_number("wide").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "drawer", "move-item", "Tools", "0", "2", "--to-drawer", "Docs",
        ])
        .unwrap();
        match cli.command {
            Command::MoveItem {
                drawer,
                from,
                to,
                to_drawer,
            } => {
                assert_eq!(drawer, "Tools");
                assert_eq!((from, to), (0, 2));
                assert_eq!(to_drawer.as_deref(), Some("Docs"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::try_parse_from(["drawer", "remove-drawer", "Tools", "--yes"]).unwrap();
        assert!(matches!(cli.command, Command::RemoveDrawer { yes: true, .. }));
        assert!(Cli::try_parse_from(["drawer", "add", "Tools"]).is_err());
    }
}
