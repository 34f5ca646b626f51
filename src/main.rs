use std::process::ExitCode;

use citysky_core::{AppError, Config, ConfigError};
use citysky_views::{
    DetailsView, LandingView, NetworkStatus, Notice, Notifier, Origin, Route, ViewServices,
};
use citysky_weather::{Cache, WeatherRecord};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// CitySky - current weather for the world's largest cities
#[derive(Parser, Debug)]
#[command(name = "citysky")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Treat the network as down and read only from the cache
    #[arg(long, global = true)]
    offline: bool,

    /// Use a throwaway in-memory cache instead of the cache file
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Weather for every city in the list, sorted by name
    Cities,

    /// Weather for one city
    Search {
        city: String,
    },

    /// Weather at your current location
    Here,

    /// Remove a city from the list
    Remove {
        city: String,
    },

    /// Restore the default city list
    ResetCities,

    /// City details: weather plus saved notes
    City {
        /// City name or a `/city/<name>` path
        target: String,
    },

    /// Manage notes for a city
    Notes {
        city: String,
        #[command(subcommand)]
        action: NotesAction,
    },

    /// Print the details path for a city
    Route {
        city: String,
    },
}

#[derive(Subcommand, Debug)]
enum NotesAction {
    /// Print the saved note
    Show,
    /// Save a new note
    Save { text: String },
    /// Replace the saved note
    Edit { text: String },
    /// Delete the saved note
    Delete,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = citysky_core::init() {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let (config, _) = Config::load_validated().map_err(config_error)?;

    let cache = if cli.ephemeral {
        Cache::in_memory()
    } else {
        let path = config.storage.cache_path();
        tracing::debug!("Opening cache at {}", path.display());
        Cache::open(path)?
    };

    let (notifier, notices) = Notifier::channel();
    let printer = spawn_notice_printer(notices);

    let network = if cli.offline {
        NetworkStatus::Offline
    } else {
        NetworkStatus::Online
    };
    let services = ViewServices::from_config(&config, cache)?
        .with_network(network)
        .with_notifier(notifier);

    let result = dispatch(cli.command, services, config.weather.cities).await;

    // Every notifier clone is gone once the views are, which ends the printer
    if let Err(e) = printer.await {
        tracing::warn!("Notice printer stopped: {}", e);
    }

    result
}

async fn dispatch(
    command: Command,
    services: ViewServices,
    defaults: Vec<String>,
) -> Result<ExitCode, AppError> {
    match command {
        Command::Cities => show_cities(services, defaults).await,
        Command::Search { city } => {
            let mut view = LandingView::new(services, defaults);
            view.set_search_term(city);
            view.search().await;
            if let Some(record) = view.searched().data() {
                print_record(record);
            }
            Ok(exit_for(view.searched().error().is_none()))
        }
        Command::Here => {
            let mut view = LandingView::new(services, defaults);
            view.show_current_location().await;
            if let Some(record) = view.current_location().data() {
                print_record(record);
            }
            Ok(exit_for(view.current_location().error().is_none()))
        }
        Command::Remove { city } => {
            let mut view = LandingView::new(services, defaults);
            if view.remove_city(&city) {
                println!("Removed {}", city);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{} is not in the city list", city);
                Ok(ExitCode::FAILURE)
            }
        }
        Command::ResetCities => {
            let mut view = LandingView::new(services, defaults);
            view.reset_cities();
            for city in view.cities().iter() {
                println!("{}", city);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::City { target } => match resolve_target(&target)? {
            Route::Landing => show_cities(services, defaults).await,
            Route::City(city) => show_details(services, city).await,
        },
        Command::Notes { city, action } => notes(services, &city, action),
        Command::Route { city } => {
            let route = Route::city(&city)
                .ok_or_else(|| AppError::Route("city name is empty".to_string()))?;
            println!("{}", route);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn show_cities(
    services: ViewServices,
    defaults: Vec<String>,
) -> Result<ExitCode, AppError> {
    let mut view = LandingView::new(services, defaults);
    view.load_cities().await;
    if let Some(entries) = view.grid().data() {
        for entry in entries {
            print_record(&entry.record);
        }
    }
    Ok(exit_for(view.grid().error().is_none()))
}

async fn show_details(services: ViewServices, city: String) -> Result<ExitCode, AppError> {
    let mut view = DetailsView::open(services, city);
    view.load().await;

    if let Some(record) = view.weather().data() {
        print_record(record);
        if view.origin() == Some(Origin::Cache) {
            println!("  (cached)");
        }
    }
    match view.notes().saved() {
        Some(note) => println!("Notes: {}", note),
        None => println!("Notes: none"),
    }

    Ok(exit_for(view.weather().error().is_none()))
}

fn notes(services: ViewServices, city: &str, action: NotesAction) -> Result<ExitCode, AppError> {
    let mut view = DetailsView::open(services, city);

    match action {
        NotesAction::Show => match view.notes().saved() {
            Some(note) => println!("{}", note),
            None => println!("No notes for {}", view.city()),
        },
        NotesAction::Save { text } => {
            view.set_draft(text);
            view.save_notes()?;
        }
        NotesAction::Edit { text } => {
            view.edit_notes();
            view.set_draft(text);
            view.save_notes()?;
        }
        NotesAction::Delete => view.delete_notes()?,
    }

    Ok(ExitCode::SUCCESS)
}

/// A bare name is a city; anything starting with `/` is a route path.
fn resolve_target(target: &str) -> Result<Route, AppError> {
    if target.trim_start().starts_with('/') {
        Route::parse(target).map_err(|e| AppError::Route(e.to_string()))
    } else {
        Route::city(target).ok_or_else(|| AppError::Route("city name is empty".to_string()))
    }
}

fn print_record(record: &WeatherRecord) {
    println!(
        "{} {:<20} {:>8}  {}",
        record.condition().symbol(),
        record.name(),
        record.temperature_label(),
        record.description()
    );
}

fn spawn_notice_printer(mut notices: UnboundedReceiver<Notice>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            match notice {
                Notice::Loading(message) => eprintln!("... {}", message),
                Notice::Success(message) => eprintln!("ok  {}", message),
                Notice::Error(message) => eprintln!("err {}", message),
            }
        }
    })
}

fn config_error(e: anyhow::Error) -> AppError {
    match e.downcast::<ConfigError>() {
        Ok(config) => AppError::Config(config),
        Err(other) => AppError::Other(other),
    }
}

fn exit_for(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
