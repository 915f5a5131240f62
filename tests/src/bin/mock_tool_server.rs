//! Stdio MCP server used by the integration tests.
//!
//! Prints a banner and a coloured log line before serving, and pings the
//! client once before answering the first `tools/list`. When
//! `MOCK_TOOL_SERVER_PID_FILE` is set the process id is written there.

use serde_json::{Value, json};
use std::fs;
use std::io::{self, BufRead, Write};
use toolpilot_tests::mock::{PID_FILE_ENV, Reply, handle};

fn main() -> io::Result<()> {
    if let Ok(path) = std::env::var(PID_FILE_ENV) {
        fs::write(path, std::process::id().to_string())?;
    }
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "mock-tool-server starting")?;
    writeln!(stdout, "\x1b[32mINFO\x1b[0m ready")?;
    stdout.flush()?;

    let mut pinged = false;
    for line in stdin.lock().lines() {
        let line = line?;
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        if !pinged && message.get("method").and_then(Value::as_str) == Some("tools/list") {
            pinged = true;
            let ping = json!({"jsonrpc": "2.0", "id": "srv-ping", "method": "ping"});
            writeln!(stdout, "{ping}")?;
        }
        match handle(&message) {
            Reply::Respond(reply) => {
                writeln!(stdout, "{reply}")?;
                stdout.flush()?;
            }
            Reply::Silent | Reply::Stall => {}
            Reply::Crash => std::process::exit(3),
        }
    }
    Ok(())
}
