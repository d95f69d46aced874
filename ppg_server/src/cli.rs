use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current configuration, and returns true.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "PPG_HOST",
        "PPG_PORT",
        "PPG_DATABASE_URL",
        "PPG_ENVIRONMENT",
        "PPG_PUBLIC_BASE_URL",
        "PPG_NOTIFICATION_URL",
        "PPG_TRUST_RETURN_STATUS",
        "PPG_CURRENCY",
        "PPG_PLANS_FILE",
        "PPG_PROCESSOR_API_URL",
        "PPG_PROCESSOR_TIMEOUT_SECS",
        "PPG_PROCESSOR_SANDBOX",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
