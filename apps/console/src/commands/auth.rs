//! `login`, `logout`, `whoami`, `register`.

use clap::Args;

use super::Outcome;
use crate::output::{print_details, print_json, print_notice};
use libris_client::views::Notice;
use libris_client::{ClientResult, Library};
use libris_core::{RegisterRequest, Role};

#[derive(Args, Debug)]
pub struct LoginArgs {
    pub username: String,

    /// Password (prefer the environment variable over the flag)
    #[arg(long, env = "LIBRIS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,

    #[arg(long, env = "LIBRIS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// ADMIN or LIBRARIAN
    #[arg(long, default_value = "LIBRARIAN")]
    pub role: Role,
}

pub async fn login(library: &Library, args: LoginArgs, json: bool) -> ClientResult<Outcome> {
    match library.login(&args.username, &args.password).await {
        Ok(session) => {
            tracing::debug!(username = %session.username, "Logged in");
            if json {
                print_json(&serde_json::json!({
                    "username": session.username,
                    "role": session.role,
                }))?;
                return Ok(Outcome::Done);
            }
            print_notice(&Notice::success("Login successful"), false)?;
            println!("Signed in as {} ({})", session.username, session.role);
            Ok(Outcome::Done)
        }
        // Missing fields are reported per field by the caller
        Err(e) if e.form_errors().is_some() => Err(e),
        Err(e) => {
            print_notice(&Notice::failure("Login failed", &e), json)?;
            Ok(Outcome::Failed)
        }
    }
}

pub async fn logout(library: &Library) -> ClientResult<Outcome> {
    library.logout().await?;
    println!("Logged out");
    Ok(Outcome::Done)
}

pub async fn whoami(library: &Library, json: bool) -> ClientResult<Outcome> {
    let session = library.context().session().await;
    if json {
        print_json(&session.map(|s| {
            serde_json::json!({ "username": s.username, "role": s.role })
        }))?;
        return Ok(Outcome::Done);
    }
    match session {
        Some(s) => print_details(&[("Username", s.username), ("Role", s.role.to_string())]),
        None => println!("Not logged in"),
    }
    Ok(Outcome::Done)
}

pub async fn register(library: &Library, args: RegisterArgs, json: bool) -> ClientResult<Outcome> {
    let request = RegisterRequest {
        username: args.username,
        password: args.password,
        role: args.role,
    };
    let response = library.register(&request).await?;
    if json {
        print_json(&response)?;
    } else {
        println!("{}", response.message);
    }
    Ok(Outcome::Done)
}
