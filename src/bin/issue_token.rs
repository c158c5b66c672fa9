use kanban_views::auth::jwt;
use kanban_views::config::Config;
use kanban_views::infrastructure::db;

const DEFAULT_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// Prints a bearer token for `<user>` signed with the server's key.
///
/// Usage: `issue-token <user> [ttl_secs]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let user = args
        .next()
        .ok_or("usage: issue-token <user> [ttl_secs]")?;
    let ttl_secs = match args.next() {
        Some(raw) => raw.parse::<usize>()?,
        None => DEFAULT_TTL_SECS,
    };

    let config = Config::from_env()?;
    let pool = db::init_db(&config.database_url).await?;
    let key = jwt::get_or_create_signing_key(&pool).await?;

    println!("{}", jwt::create_token(&key, &user, ttl_secs)?);
    Ok(())
}
