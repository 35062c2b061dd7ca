mod accounts;
mod config;
mod db;
mod error;
mod utils;

use std::env;
use color_eyre::Result;
use eyre::eyre;
use dotenv::dotenv;
use log::info;
use getopts::{Matches, Options};
use crate::accounts::{NewUser, UserAccountManager};
use crate::accounts::roles::RoleRegistry;
use crate::accounts::validation::parse_date_of_birth;
use crate::config::Config;
use crate::db::Pool;

// Management commands for the things the web admin can't
// bootstrap, like the very first superuser.

fn print_usage(program: &str, opts: &Options) {
  let brief = format!("Usage: {} [options]", program);
  print!("{}", opts.usage(&brief));
}

fn options() -> Options {
  let mut opts = Options::new();
  opts.optflag("m", "migrate", "Create the database tables if missing");
  opts.optflag("", "create-superuser", "Create a staff superuser account");
  opts.optflag("", "create-user", "Create a regular account");
  opts.optopt("", "archive-user", "Archive the account with that login", "LOGIN");
  opts.optopt("", "set-password", "Set the password of an account", "LOGIN");
  opts.optopt("e", "email", "Account email", "EMAIL");
  opts.optopt("l", "login", "Account login", "LOGIN");
  opts.optopt("n", "name", "Account name, in Cyrillic", "NAME");
  opts.optopt("b", "birth-date", "Date of birth", "YYYY-MM-DD");
  opts.optopt("p", "password", "Account password", "PASSWORD");
  opts.optopt("r", "role", "Role title, created if it doesn't exist", "ROLE");
  opts.optflag("h", "help", "Program usage");
  opts
}

fn new_user(matches: &Matches, roles: &RoleRegistry) -> Result<NewUser> {
  let date_of_birth = match matches.opt_str("birth-date") {
    Some(date) => Some(parse_date_of_birth(&date)?),
    None => None
  };
  let role_id = match matches.opt_str("role") {
    Some(title) => Some(roles.create_or_get(&title)?.id),
    None => None
  };
  Ok(NewUser {
    email: matches.opt_str("email"),
    password: matches.opt_str("password"),
    name: matches.opt_str("name"),
    date_of_birth,
    login: matches.opt_str("login"),
    role_id
  })
}

fn run_command(matches: &Matches, pool: &Pool) -> Result<bool> {
  let roles = RoleRegistry::new(pool.clone());
  let accounts = UserAccountManager::new(pool.clone(), roles.clone());

  if matches.opt_present("create-superuser") {
    let user = accounts.create_superuser(new_user(matches, &roles)?)?;
    println!("Superuser {} created with id {}", user.login, user.id);
  } else if matches.opt_present("create-user") {
    let user = accounts.create_user(new_user(matches, &roles)?)?;
    println!("User {} created with id {}", user.login, user.id);
  } else if let Some(login) = matches.opt_str("archive-user") {
    let user = accounts.by_login(&login)?;
    accounts.archive(user.id)?;
    println!("User {} archived", login);
  } else if let Some(login) = matches.opt_str("set-password") {
    let password = matches.opt_str("password")
      .ok_or_else(|| eyre!("--set-password needs --password"))?;
    let user = accounts.by_login(&login)?;
    accounts.set_password(user.id, &password)?;
    println!("Password updated for {}", login);
  } else {
    return Ok(false);
  }
  Ok(true)
}

fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let opts = options();
  let matches = opts.parse(&args[1..])?;
  if matches.opt_present("h") {
    print_usage(&program, &opts);
    return Ok(());
  }

  let config = Config::from_env()?;
  let pool = db::open_pool(&config.db_path)?;
  // Always safe, the schema only creates what's missing.
  db::migrate(&pool)?;
  if matches.opt_present("migrate") {
    info!("Database schema is up to date at {}", config.db_path);
    println!("Migrations applied to {}", config.db_path);
    return Ok(());
  }

  if !run_command(&matches, &pool)? {
    print_usage(&program, &opts);
  }
  Ok(())
}
