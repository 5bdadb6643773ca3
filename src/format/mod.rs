//! Message rendering
//!
//! Every message is rendered twice: once for the console (styled segments,
//! short time) and once for files (plain text, full date). Both functions are
//! total: any `Message` renders, with or without content or failure.

pub mod console;

use std::path::PathBuf;
use std::time::Duration;

use crossterm::style::{Color, ContentStyle};

use crate::message::{Message, Severity};

pub use console::ConsoleText;
use console::style;

/// Time format for console tags
pub const CONSOLE_TIME_FORMAT: &str = "%H:%M";

/// Time format for file tags
pub const FILE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

const WARN_SEPARATOR: &str = "================================";
const ERROR_SEPARATOR: &str = "##############################";
const NO_DETAILS: &str = "No details available.";

/// Values shared by all renderings of a session
#[derive(Debug, Clone)]
pub struct FormatContext {
    /// Logger display name, shown as the label tag
    pub name: String,
    /// Directory named in the shutdown notice
    pub full_dir: PathBuf,
    /// Delay announced in the shutdown notice
    pub shutdown_delay: Duration,
}

impl FormatContext {
    pub fn new(name: impl Into<String>, full_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            full_dir: full_dir.into(),
            shutdown_delay: Duration::from_secs(10),
        }
    }

    fn shutdown_notice(&self) -> String {
        format!(
            "{} is shutting down in {} seconds. Log saved to {}.",
            self.name,
            self.shutdown_delay.as_secs(),
            self.full_dir.display()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Console,
    File,
}

/// Body lines of a WARN or ERROR block, without tags
fn block_lines(msg: &Message, ctx: &FormatContext, target: Target) -> Vec<String> {
    let mut lines = Vec::new();
    let details = match (msg.content(), msg.severity(), target) {
        (Some(content), _, _) => format!("Details: {}", content),
        (None, Severity::Error, Target::Console) => NO_DETAILS.to_string(),
        (None, _, _) => format!("Details: {}", NO_DETAILS),
    };
    lines.push(details);

    if let Some(failure) = msg.failure() {
        lines.push(format!("Message: {}", failure.message));
        if target == Target::File {
            if let Some(cause) = &failure.cause {
                lines.push(format!("Cause: {}", cause));
            }
        }
        lines.extend(failure.frames.iter().map(|f| f.to_string()));
    }

    match msg.severity() {
        Severity::Error => {
            lines.push(ctx.shutdown_notice());
            let mut framed = vec![format!("[!] {} [!]", ERROR_SEPARATOR)];
            framed.extend(lines.into_iter().map(|l| format!("[!] {} [!]", l)));
            framed.push(format!("[!] {} [!]", ERROR_SEPARATOR));
            framed
        }
        _ => {
            let mut framed = vec![format!(" {}", WARN_SEPARATOR)];
            framed.extend(lines.into_iter().map(|l| format!(" {}", l)));
            framed.push(format!(" {}", WARN_SEPARATOR));
            framed
        }
    }
}

/// Render a message for log files
pub fn format_file(msg: &Message, ctx: &FormatContext) -> String {
    let tags = format!(
        "[{}][{}][{}]",
        msg.timestamp().format(FILE_TIME_FORMAT),
        ctx.name,
        msg.severity()
    );
    let content = msg.content().unwrap_or_default();

    match msg.severity() {
        Severity::Info => format!("{} {}\n", tags, content),
        Severity::Debug => match msg.origin_short_name() {
            Some(origin) => format!("{}[{}] {}\n", tags, origin, content),
            None => format!("{} {}\n", tags, content),
        },
        Severity::Warn | Severity::Error => block_lines(msg, ctx, Target::File)
            .into_iter()
            .map(|line| format!("{}{}\n", tags, line))
            .collect(),
    }
}

/// Render a message for the console
pub fn format_console(msg: &Message, ctx: &FormatContext) -> ConsoleText {
    let time = format!("[{}]", msg.timestamp().format(CONSOLE_TIME_FORMAT));
    let label = format!("[{}]", ctx.name);
    let severity = format!("[{}]", msg.severity());

    let mut tags = ConsoleText::new();
    let plain = ContentStyle::new();
    let mut out = ConsoleText::new();

    match msg.severity() {
        Severity::Error => {
            let alert = style(Some(Color::White), Some(Color::Red));
            tags.push(alert, time + &label + &severity);
            for line in block_lines(msg, ctx, Target::Console) {
                out.extend(&tags);
                out.push(alert, line);
                out.push(plain, "\n");
            }
            return out;
        }
        _ => {
            let tone = match msg.severity() {
                Severity::Debug => Color::Magenta,
                Severity::Warn => Color::Yellow,
                _ => Color::Black,
            };
            tags.push(style(Some(Color::Black), Some(Color::White)), time);
            tags.push(style(Some(Color::Cyan), Some(Color::White)), label);
            tags.push(style(Some(tone), Some(Color::White)), severity);
        }
    }

    let content = msg.content().unwrap_or_default();
    match msg.severity() {
        Severity::Debug => {
            out.extend(&tags);
            let cyan = style(Some(Color::Cyan), None);
            if let Some(origin) = msg.origin_short_name() {
                out.push(cyan, format!("[{}]", origin));
            }
            out.push(cyan, format!(" {}", content));
            out.push(plain, "\n");
        }
        Severity::Warn => {
            let yellow = style(Some(Color::Yellow), None);
            for line in block_lines(msg, ctx, Target::Console) {
                out.extend(&tags);
                out.push(yellow, line);
                out.push(plain, "\n");
            }
        }
        _ => {
            out.extend(&tags);
            out.push(plain, format!(" {}\n", content));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Failure, Frame};
    use chrono::{Local, TimeZone};

    fn ctx() -> FormatContext {
        FormatContext::new("Relay", "/var/log/relay/full")
    }

    fn at_noon(msg: Message) -> Message {
        let ts = Local.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap();
        msg.with_timestamp(ts)
    }

    fn failure() -> Failure {
        Failure::new("connection refused")
            .with_cause("port closed")
            .with_frame(Frame::new("app::net::connect").at("src/net.rs", 40))
            .with_frame(Frame::new("app::main").at("src/main.rs", 7))
    }

    #[test]
    fn test_info_line() {
        let msg = at_noon(Message::new(Severity::Info, Some("ready".into())));
        assert_eq!(
            format_file(&msg, &ctx()),
            "[15-03-2024 12:30:45][Relay][INFO] ready\n"
        );
        assert_eq!(
            format_console(&msg, &ctx()).plain(),
            "[12:30][Relay][INFO] ready\n"
        );
    }

    #[test]
    fn test_debug_includes_origin() {
        let msg = at_noon(Message::new(Severity::Debug, Some("tick".into())))
            .with_origin("app::scheduler::Scheduler");
        assert_eq!(
            format_file(&msg, &ctx()),
            "[15-03-2024 12:30:45][Relay][DEBUG][Scheduler] tick\n"
        );
        assert_eq!(
            format_console(&msg, &ctx()).plain(),
            "[12:30][Relay][DEBUG][Scheduler] tick\n"
        );
    }

    #[test]
    fn test_warn_file_block_lists_every_frame() {
        let msg = at_noon(Message::new(Severity::Warn, Some("retrying".into())))
            .with_failure(failure());
        let tags = "[15-03-2024 12:30:45][Relay][WARN]";
        let expected = [
            format!("{} ================================", tags),
            format!("{} Details: retrying", tags),
            format!("{} Message: connection refused", tags),
            format!("{} Cause: port closed", tags),
            format!("{} app::net::connect(src/net.rs:40)", tags),
            format!("{} app::main(src/main.rs:7)", tags),
            format!("{} ================================", tags),
        ];
        let rendered = format_file(&msg, &ctx());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_warn_console_omits_cause() {
        let msg = at_noon(Message::new(Severity::Warn, None)).with_failure(failure());
        let plain = format_console(&msg, &ctx()).plain();
        assert!(plain.contains("[12:30][Relay][WARN] Details: No details available.\n"));
        assert!(plain.contains("[12:30][Relay][WARN] Message: connection refused\n"));
        assert!(plain.contains("[12:30][Relay][WARN] app::main(src/main.rs:7)\n"));
        assert!(!plain.contains("Cause"));
    }

    #[test]
    fn test_error_block() {
        let msg = at_noon(Message::new(Severity::Error, Some("cannot continue".into())))
            .with_failure(failure());
        let rendered = format_file(&msg, &ctx());
        let lines: Vec<&str> = rendered.lines().collect();
        let tags = "[15-03-2024 12:30:45][Relay][ERROR]";

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], format!("{}[!] ############################## [!]", tags));
        assert_eq!(lines[1], format!("{}[!] Details: cannot continue [!]", tags));
        assert_eq!(lines[2], format!("{}[!] Message: connection refused [!]", tags));
        assert_eq!(lines[3], format!("{}[!] Cause: port closed [!]", tags));
        assert_eq!(
            lines[4],
            format!("{}[!] app::net::connect(src/net.rs:40) [!]", tags)
        );
        assert_eq!(
            lines[6],
            format!(
                "{}[!] Relay is shutting down in 10 seconds. Log saved to /var/log/relay/full. [!]",
                tags
            )
        );
        assert_eq!(lines[7], lines[0]);
    }

    #[test]
    fn test_error_without_content_or_failure() {
        let msg = at_noon(Message::new(Severity::Error, None));
        let file = format_file(&msg, &ctx());
        assert!(file.contains("[!] Details: No details available. [!]"));
        assert!(!file.contains("Message:"));

        let console = format_console(&msg, &ctx()).plain();
        assert!(console.contains("[12:30][Relay][ERROR][!] No details available. [!]\n"));
    }

    #[test]
    fn test_renders_without_failure_or_frames() {
        for severity in [Severity::Info, Severity::Debug, Severity::Warn, Severity::Error] {
            let bare = Message::new(severity, None);
            assert!(!format_file(&bare, &ctx()).is_empty());
            assert!(!format_console(&bare, &ctx()).plain().is_empty());

            let empty = Message::new(severity, None).with_failure(Failure::new(""));
            assert!(!format_file(&empty, &ctx()).is_empty());
            assert!(!format_console(&empty, &ctx()).plain().is_empty());
        }
    }

    #[test]
    fn test_file_output_has_no_escape_codes() {
        let msg = Message::new(Severity::Warn, Some("x".into())).with_failure(failure());
        assert!(!format_file(&msg, &ctx()).contains('\u{1b}'));
    }
}
