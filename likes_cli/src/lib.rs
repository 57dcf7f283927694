#![doc(hidden)]
//! Implementation of the `likes` command line tool.
//!
//! Not a stable interface; it exists so the commands can be tested
//! without spawning the binary. Every command works on the state kept
//! in a `.likes` directory.
use std::path::{Path, PathBuf};

use likes::analytics::{self, AnalyticsParams, LikesPerDay};
use likes::config::Settings;
use likes::db::{self, Connection, ConnectionSpec};
use likes::guard::{self, LikeOutcome, UnlikeOutcome};
use likes::models::{self, Model, Post, PostId, User, UserId};
use likes::policy::Caller;
use likes::posts::{self, NewPost};
use likes::query::BoolExpr;
use likes::users::{self, NewUser, UserActivity};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Name of the state directory.
pub const STATE_DIR: &str = ".likes";

/// The state directory under the current working directory.
pub fn base_dir() -> Result<PathBuf> {
    std::env::current_dir()
        .map(|d| d.join(STATE_DIR))
        .map_err(|e| e.into())
}

/// Create the state directory with settings for `connstr` and set up
/// the schema.
pub fn init(base: &Path, backend: &str, connstr: &str, utc_offset_minutes: i32) -> Result<()> {
    if db::get_backend(backend).is_none() {
        anyhow::bail!("Unknown backend {backend}");
    }
    let mut settings = Settings::new(ConnectionSpec::new(backend, connstr));
    settings.utc_offset_minutes = utc_offset_minutes;
    settings.offset()?;
    let conn = db::connect(&settings.connection)?;
    models::setup_schema(&conn)?;
    std::fs::create_dir_all(base)?;
    settings.save(base)?;
    log::info!("initialized {} with {backend} {connstr}", base.display());
    Ok(())
}

/// Load the settings saved by [`init`].
pub fn load_settings(base: &Path) -> Result<Settings> {
    if !base.exists() {
        anyhow::bail!("No likes state found in {}. Did you run likes init?", base.display());
    }
    Ok(Settings::load(base)?)
}

/// An open connection together with the settings it came from.
pub struct Session {
    pub settings: Settings,
    pub conn: Connection,
}

impl Session {
    pub fn open(base: &Path) -> Result<Self> {
        let settings = load_settings(base)?;
        let conn = db::connect(&settings.connection)?;
        Ok(Session { settings, conn })
    }

    /// Resolve `who`, a username or user id, to a caller, recording the
    /// request on the user.
    pub fn caller(&self, who: &str) -> Result<Caller> {
        let user = find_user(&self.conn, who)?;
        users::reset_last_request(&self.conn, user.id, self.settings.now()?)?;
        Ok(Caller::from(&user))
    }
}

fn find_user(conn: &Connection, who: &str) -> Result<User> {
    if let Ok(id) = who.parse::<UserId>() {
        return Ok(users::get_user(conn, id)?);
    }
    User::load(conn, Some(BoolExpr::eq("username", who)), None)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No user named {who}"))
}

fn parse_post(id: &str) -> Result<PostId> {
    id.parse()
        .map_err(|_| anyhow::anyhow!("\"{id}\" is not a valid post id"))
}

pub fn add_user(session: &Session, username: &str, email: &str, superuser: bool) -> Result<User> {
    let user = users::create_user(
        &session.conn,
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            is_superuser: superuser,
        },
    )?;
    Ok(user)
}

/// Record a login for `who` now.
pub fn login(session: &Session, who: &str) -> Result<()> {
    let user = find_user(&session.conn, who)?;
    users::reset_last_login(&session.conn, user.id, session.settings.now()?)?;
    Ok(())
}

pub fn activity(session: &Session, who: &str, user: Option<&str>) -> Result<UserActivity> {
    let caller = session.caller(who)?;
    Ok(users::user_activity(&session.conn, &caller, user)?)
}

/// Delete `user` as `who`, who must be that user or a superuser.
pub fn delete_user(session: &mut Session, who: &str, user: &str) -> Result<()> {
    let caller = session.caller(who)?;
    let user = find_user(&session.conn, user)?;
    users::delete_user(&mut session.conn, &caller, user.id)?;
    Ok(())
}

pub fn add_post(session: &Session, who: &str, title: &str, content: &str) -> Result<Post> {
    let caller = session.caller(who)?;
    let post = posts::create_post_at(
        &session.conn,
        &caller,
        NewPost {
            title: title.to_string(),
            content: content.to_string(),
        },
        session.settings.now()?,
    )?;
    Ok(post)
}

pub fn list_posts(session: &Session, owner: Option<&str>) -> Result<Vec<Post>> {
    let owner = match owner {
        Some(who) => Some(find_user(&session.conn, who)?.id),
        None => None,
    };
    Ok(posts::list_posts(&session.conn, owner)?)
}

pub fn delete_post(session: &Session, who: &str, post: &str) -> Result<()> {
    let caller = session.caller(who)?;
    posts::delete_post(&session.conn, &caller, parse_post(post)?)?;
    Ok(())
}

pub fn like(session: &mut Session, who: &str, post: &str) -> Result<LikeOutcome> {
    let caller = session.caller(who)?;
    let now = session.settings.now()?;
    Ok(guard::like_at(&mut session.conn, &caller, parse_post(post)?, now)?)
}

pub fn unlike(session: &mut Session, who: &str, post: &str) -> Result<UnlikeOutcome> {
    let caller = session.caller(who)?;
    Ok(guard::unlike(&mut session.conn, &caller, parse_post(post)?)?)
}

pub fn analytics(
    session: &Session,
    who: &str,
    params: &AnalyticsParams,
) -> Result<Vec<LikesPerDay>> {
    let caller = session.caller(who)?;
    Ok(analytics::likes_per_day(&session.conn, &caller, params)?)
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn handle_error(r: Result<()>) {
    if let Err(e) = r {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
