use std::any::Any;
use std::io::Write;
use std::panic::{self, Location};

use log::{error, info};

const SEPARATOR_WIDTH: usize = 60;

/// Sets up env_logger with the configured filter, e.g. `info` or `mizuki_bot=debug,serenity=warn`.
pub fn init(filter: &str) {
    env_logger::Builder::new()
        .parse_filters(filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:<5} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

pub fn separator() {
    info!("{}", "=".repeat(SEPARATOR_WIDTH));
}

pub fn header(title: &str) {
    separator();
    info!("🌙 {}", title);
    separator();
}

pub fn bot_ready(tag: &str, guilds: usize, users: usize) {
    info!("🌙 {} está lista! Servidores: {} | Usuarios: {}", tag, guilds, users);
}

pub fn command_executed(command: &str, user: &str, guild: Option<&str>) {
    match guild {
        Some(guild) => info!("🌙 Comando ejecutado: {} por {} en {}", command, user, guild),
        None => info!("🌙 Comando ejecutado: {} por {}", command, user),
    }
}

/// Sends panic reports through the logger instead of stderr. Panics that the
/// dispatcher or the event bus contain are logged again with their context.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        error!("💥 {}", panic_report(info.payload(), info.location()));
    }));
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

fn panic_report(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
    match location {
        Some(location) => format!("{} at {}:{}", panic_message(payload), location.file(), location.line()),
        None => panic_message(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_described() {
        assert_eq!(panic_message(&"boom"), "panicked: boom");
        assert_eq!(panic_message(&"boom".to_string()), "panicked: boom");
        assert_eq!(panic_message(&42_u8), "panicked");
    }

    #[test]
    fn panic_report_names_the_location() {
        let report = panic_report(&"boom", Some(Location::caller()));
        assert!(report.starts_with("panicked: boom at "));
        assert!(report.contains("logging.rs"));
        assert_eq!(panic_report(&"boom", None), "panicked: boom");
    }
}
