use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Utc};
use serde::Serialize;
use tracing::info;

use holidaze::client::HolidazeClient;
use holidaze::config::Config;
use holidaze::draft::VenueDraft;
use holidaze::engine::{AvailabilityService, StayRequest};
use holidaze::model::{DayRange, Media, ProfileUpdate, RegisterRequest};
use holidaze::session::{Session, SessionStore};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const USAGE: &str = "usage: holidaze <command> [args]

browse:
  venues                                list venues
  search <query>                        search venues
  venue <id>                            show one venue
  calendar <id> [days]                  day-by-day availability from today (default 60 days)
  check <id> <from> <to> <guests>       validate a stay without booking
  watch <id> [secs]                     re-check a venue's bookings periodically

account:
  register <name> <email> <password> [--manager]
  login <email> <password>
  logout
  profile                               refresh and show the logged-in profile
  update-profile [--bio TEXT] [--avatar URL] [--manager true|false]
  bookings                              bookings made by the logged-in profile
  book <id> <from> <to> <guests>

venue managers:
  create-venue <draft.json>
  edit-draft <id>                       print an existing venue as an editable draft
  update-venue <id> <draft.json>
  delete-venue <id>

dates are YYYY-MM-DD";

fn arg<'a>(args: &'a [String], i: usize, name: &str) -> CliResult<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("missing <{name}>\n\n{USAGE}").into())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_draft(path: &str) -> CliResult<VenueDraft> {
    let bytes = std::fs::read(Path::new(path))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn stay_request(args: &[String]) -> CliResult<StayRequest> {
    let guests: u32 = arg(args, 3, "guests")?
        .parse()
        .map_err(|e| format!("guests must be a whole number: {e}"))?;
    Ok(StayRequest::parse(arg(args, 1, "from")?, arg(args, 2, "to")?, guests))
}

fn require_profile_name(session: &Session) -> CliResult<String> {
    session
        .profile()
        .map(|p| p.name.clone())
        .ok_or_else(|| "not logged in; run `holidaze login` first".into())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    // Logs go to stderr so stdout stays clean JSON.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = Config::from_env();
    holidaze::observability::init(config.metrics_port)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let store = SessionStore::new(&config.session_dir);
    let mut session = Session::load(&store)?;
    let client = Arc::new(HolidazeClient::new(&config)?);
    let service = Arc::new(AvailabilityService::new(client.clone(), config.checkout_policy));

    match command.as_str() {
        "venues" => print_json(&client.fetch_venues().await?)?,
        "search" => print_json(&client.search_venues(arg(&args, 1, "query")?).await?)?,
        "venue" => print_json(&client.fetch_venue(arg(&args, 1, "id")?).await?)?,
        "edit-draft" => {
            let venue = client.fetch_venue(arg(&args, 1, "id")?).await?;
            if !session.owns(&venue) {
                tracing::warn!("venue {} is not owned by the logged-in profile", venue.id);
            }
            print_json(&VenueDraft::from_venue(&venue))?;
        }
        "calendar" => {
            let venue_id = arg(&args, 1, "id")?;
            let days: u64 = match args.get(2) {
                Some(raw) => raw.parse().map_err(|e| format!("days must be a whole number: {e}"))?,
                None => 60,
            };
            let today = Utc::now().date_naive();
            let last = today
                .checked_add_days(Days::new(days.saturating_sub(1)))
                .ok_or("calendar window out of range")?;
            let window = DayRange::new(today, last);
            print_json(&service.calendar(venue_id, &window, today).await?)?;
        }
        "check" => {
            let venue_id = arg(&args, 1, "id")?;
            let request = stay_request(&args[1..])?;
            print_json(&service.assess(venue_id, &request).await?)?;
        }
        "book" => {
            let venue_id = arg(&args, 1, "id")?;
            let request = stay_request(&args[1..])?;
            print_json(&service.book(&session, venue_id, &request).await?)?;
        }
        "watch" => {
            let venue_id = arg(&args, 1, "id")?.to_string();
            let secs: u64 = match args.get(2) {
                Some(raw) => raw.parse().map_err(|e| format!("secs must be a whole number: {e}"))?,
                None => 60,
            };
            let watch = holidaze::watch::run_watch(service.clone(), venue_id, Duration::from_secs(secs.max(1)));
            tokio::select! {
                _ = watch => {}
                _ = tokio::signal::ctrl_c() => info!("stopped watching"),
            }
        }
        "register" => {
            let registration = RegisterRequest {
                name: arg(&args, 1, "name")?.to_string(),
                email: arg(&args, 2, "email")?.to_string(),
                password: arg(&args, 3, "password")?.to_string(),
                bio: None,
                avatar: None,
                venue_manager: args.iter().any(|a| a == "--manager"),
            };
            print_json(&client.register(&registration).await?)?;
        }
        "login" => {
            session = client.login(arg(&args, 1, "email")?, arg(&args, 2, "password")?).await?;
            session.save(&store)?;
            print_json(&session.profile())?;
        }
        "logout" => {
            session.clear(&store)?;
            info!("logged out");
        }
        "profile" => {
            let name = require_profile_name(&session)?;
            let profile = client.fetch_profile(&session, &name).await?;
            session.set_profile(profile.clone());
            session.save(&store)?;
            print_json(&profile)?;
        }
        "update-profile" => {
            let name = require_profile_name(&session)?;
            let mut update = ProfileUpdate::default();
            let mut rest = args[1..].iter();
            while let Some(flag) = rest.next() {
                let value = rest.next().ok_or_else(|| format!("{flag} needs a value"))?;
                match flag.as_str() {
                    "--bio" => update.bio = Some(value.clone()),
                    "--avatar" => {
                        update.avatar = Some(Media {
                            url: value.clone(),
                            alt: None,
                        })
                    }
                    "--manager" => {
                        update.venue_manager =
                            Some(value.parse().map_err(|_| "--manager takes true or false")?)
                    }
                    other => return Err(format!("unknown flag {other}\n\n{USAGE}").into()),
                }
            }
            let profile = client.update_profile(&session, &name, &update).await?;
            session.set_profile(profile.clone());
            session.save(&store)?;
            print_json(&profile)?;
        }
        "bookings" => print_json(&client.fetch_customer_bookings(&session).await?)?,
        "create-venue" => {
            let draft = read_draft(arg(&args, 1, "draft.json")?)?;
            print_json(&client.create_venue(&session, &draft).await?)?;
        }
        "update-venue" => {
            let venue_id = arg(&args, 1, "id")?;
            let draft = read_draft(arg(&args, 2, "draft.json")?)?;
            print_json(&client.update_venue(&session, venue_id, &draft).await?)?;
            service.invalidate(venue_id);
        }
        "delete-venue" => {
            let venue_id = arg(&args, 1, "id")?;
            client.delete_venue(&session, venue_id).await?;
            service.invalidate(venue_id);
        }
        "help" | "--help" | "-h" => println!("{USAGE}"),
        other => return Err(format!("unknown command: {other}\n\n{USAGE}").into()),
    }

    Ok(())
}
