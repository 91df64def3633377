use crate::dispatch::ExecutionMode;
use anyhow::Result;
use std::process::Command;

/// Send a desktop notification. In user mode notify-send runs directly;
/// in root mode it is run as the owner of the first graphical session with
/// that session's D-Bus address. Fails silently without a session.
pub fn send(mode: ExecutionMode, title: &str, body: &str) -> Result<()> {
    match mode {
        ExecutionMode::User => {
            Command::new("notify-send").args([title, body]).status()?;
            Ok(())
        }
        ExecutionMode::Root => send_to_session(title, body),
    }
}

fn send_to_session(title: &str, body: &str) -> Result<()> {
    let output = Command::new("loginctl")
        .args(["list-sessions", "--no-legend", "--no-pager"])
        .output()?;
    if !output.status.success() {
        return Ok(());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let Some((uid, user)) = stdout.lines().find_map(graphical_session) else {
        tracing::debug!("no graphical session to notify");
        return Ok(());
    };

    let bus = format!("unix:path=/run/user/{}/bus", uid);
    Command::new("runuser")
        .args(["-u", &user, "--", "notify-send", title, body])
        .env("DBUS_SESSION_BUS_ADDRESS", &bus)
        .status()?;
    Ok(())
}

/// `(uid, user)` of a `loginctl list-sessions` line if that session runs
/// wayland or x11.
fn graphical_session(line: &str) -> Option<(String, String)> {
    let mut fields = line.split_whitespace();
    let (session, uid, user) = (fields.next()?, fields.next()?, fields.next()?);

    let output = Command::new("loginctl")
        .args(["show-session", session, "--property=Type", "--value"])
        .output()
        .ok()?;
    let session_type = String::from_utf8_lossy(&output.stdout);

    matches!(session_type.trim(), "wayland" | "x11").then(|| (uid.to_string(), user.to_string()))
}
