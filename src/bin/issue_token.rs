//! CLI tool to mint bearer tokens for operators.
//!
//! Usage:
//!   cargo run --bin issue-token -- --user-id 1 --role admin
//!
//! The token is signed with `JWT_SECRET` from the environment (or `.env`).

use std::env;

use vod_media_lib::auth::{JwtSecret, Role, TOKEN_TTL_HOURS, issue_token};
use vod_media_lib::config::Config;

fn print_usage() {
    eprintln!("Usage: issue-token --user-id <id> [--role admin|user]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -u, --user-id <id>   Numeric user id stored in the token (required)");
    eprintln!("  -r, --role <role>    admin or user (default: admin)");
    eprintln!("  -h, --help           Show this message");
}

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    let mut user_id: Option<String> = None;
    let mut role = "admin".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user-id" | "-u" => {
                i += 1;
                if i < args.len() {
                    user_id = Some(args[i].clone());
                }
            }
            "--role" | "-r" => {
                i += 1;
                if i < args.len() {
                    role = args[i].clone();
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let user_id = match user_id.as_deref().map(str::parse::<i32>) {
        Some(Ok(id)) => id,
        Some(Err(_)) => {
            eprintln!("Error: --user-id must be an integer");
            std::process::exit(1);
        }
        None => {
            eprintln!("Error: --user-id is required");
            print_usage();
            std::process::exit(1);
        }
    };

    let Some(role) = Role::parse(&role) else {
        eprintln!("Error: --role must be 'admin' or 'user'");
        std::process::exit(1);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match issue_token(user_id, role, &JwtSecret::new(config.jwt_secret)) {
        Ok(token) => {
            eprintln!(
                "Token for user {} ({}), valid for {} hours:",
                user_id,
                role.as_str(),
                TOKEN_TTL_HOURS
            );
            println!("{}", token);
        }
        Err(e) => {
            eprintln!("Failed to issue token: {}", e);
            std::process::exit(1);
        }
    }
}
