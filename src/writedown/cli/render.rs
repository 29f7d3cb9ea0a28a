use colored::Colorize;
use std::io::{self, Write};
use writedown::callable::Value;
use writedown::error::Result;
use writedown::model::{CmdMessage, CmdResult, MessageLevel};

/// Exit status when stdout goes away mid-write (EX_IOERR).
const EX_IOERR: i32 = 74;

/// Prints a reply. A closed pipe on stdout ends the process quietly.
pub(super) fn print_value(value: &Value) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match write_value(&mut out, value).and_then(|_| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => std::process::exit(EX_IOERR),
        other => other.map_err(Into::into),
    }
}

fn write_value<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    match value {
        Value::Nil => Ok(()),
        Value::Bool(b) => writeln!(out, "{}", b),
        Value::Int(n) => writeln!(out, "{}", n),
        Value::Text(text) => writeln!(out, "{}", text.trim_end()),
        Value::Reply(result) => write_result(out, result),
    }
}

fn write_result<W: Write>(out: &mut W, result: &CmdResult) -> io::Result<()> {
    for line in &result.lines {
        writeln!(out, "{}", line)?;
    }
    write_messages(out, &result.messages)
}

fn write_messages<W: Write>(out: &mut W, messages: &[CmdMessage]) -> io::Result<()> {
    for message in messages {
        match message.level {
            MessageLevel::Info => writeln!(out, "{}", message.content.dimmed())?,
            MessageLevel::Success => writeln!(out, "{}", message.content.green())?,
            MessageLevel::Warning => writeln!(out, "{}", message.content.yellow())?,
            MessageLevel::Error => writeln!(out, "{}", message.content.red())?,
        }
    }
    Ok(())
}
