use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_recovery_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL, allowed as the CORS origin")
                .env("CHIAVI_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session cookie TTL in seconds")
                .env("CHIAVI_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("session-cookie")
                .long("session-cookie")
                .help("Name of the session cookie")
                .env("CHIAVI_SESSION_COOKIE")
                .default_value("chiavi_session"),
        )
}

fn with_recovery_args(command: Command) -> Command {
    command.arg(
        Arg::new("recovery-ttl-seconds")
            .long("recovery-ttl-seconds")
            .help("Recovery token TTL in seconds")
            .env("CHIAVI_RECOVERY_TTL_SECONDS")
            .default_value("900")
            .value_parser(clap::value_parser!(i64)),
    )
}
