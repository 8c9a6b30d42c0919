//! The line protocol spoken between clients and [`crate::Server`].
//!
//! Every message is a single line. Fields inside `COLUMNS` and `ROW` lines are separated by tabs,
//! with tabs, newlines, carriage returns and backslashes escaped. `NULL` is sent as `\N`.
//!
//! ```text
//! S: HELLO embsql/<version>
//! C: AUTH <username> <password>
//! S: OK <username> | ERR <message>
//! C: <request>
//! S: COLUMNS <name>... ROW <value>... DONE <n> | ERR <message>
//! C: QUIT
//! S: BYE
//! ```

use std::fmt;
use std::io::{self, BufRead, Read, Write};

use embsql::MaterializedQueryOutput;
use embsql_core::{Error, Result, Value};
use itertools::Itertools;

use crate::auth::Credentials;

pub const PROTOCOL_NAME: &str = "embsql";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The longest line, terminator included, either side will read.
pub const MAX_LINE_LEN: usize = 1 << 20;

const NULL: &str = "\\N";

pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn unescape(s: &str) -> Result<String> {
    let mut unescaped = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }

        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('t') => unescaped.push('\t'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some(c) => return Err(Error::Parse(format!("unknown escape sequence `\\{c}`"))),
            None => return Err(Error::Parse("dangling escape at end of field".into())),
        }
    }
    Ok(unescaped)
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => NULL.to_owned(),
        value => escape(&value.to_string()),
    }
}

fn decode_field(field: &str) -> Result<Option<String>> {
    if field == NULL {
        return Ok(None);
    }
    unescape(field).map(Some)
}

/// Read one line without its terminator. Returns `None` at end of stream.
///
/// Fails with [`io::ErrorKind::InvalidData`] if the line is longer than [`MAX_LINE_LEN`] or is
/// not valid utf-8.
pub fn read_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    let n = reader.by_ref().take(MAX_LINE_LEN as u64 + 1).read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }

    if n > MAX_LINE_LEN && !line.ends_with('\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {MAX_LINE_LEN} bytes"),
        ));
    }

    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);
    Ok(Some(line))
}

/// A line sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Auth(Credentials),
    Quit,
    Request(String),
}

impl ClientMessage {
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        let (command, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        if command.eq_ignore_ascii_case("QUIT") && rest.is_empty() {
            return Ok(ClientMessage::Quit);
        }

        if command.eq_ignore_ascii_case("AUTH") {
            let mut parts = rest.split_whitespace();
            return match (parts.next(), parts.next(), parts.next()) {
                (Some(username), Some(password), None) => {
                    Ok(ClientMessage::Auth(Credentials::new(username, password)))
                }
                _ => Err(Error::Parse("expected `AUTH <username> <password>`".into())),
            };
        }

        Ok(ClientMessage::Request(trimmed.to_owned()))
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Auth(credentials) => {
                write!(f, "AUTH {} {}", credentials.username(), credentials.password())
            }
            ClientMessage::Quit => write!(f, "QUIT"),
            ClientMessage::Request(request) => write!(f, "{request}"),
        }
    }
}

/// A line sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Hello { version: String },
    Ok { username: String },
    Err { message: String },
    Columns(Vec<String>),
    Row(Vec<Option<String>>),
    Done(u64),
    Bye,
}

impl ServerMessage {
    pub fn hello() -> Self {
        ServerMessage::Hello { version: VERSION.to_owned() }
    }

    pub fn error(err: impl fmt::Display) -> Self {
        // messages are a single line
        let message = err.to_string().lines().join(" ");
        ServerMessage::Err { message }
    }

    pub fn parse(line: &str) -> Result<Self> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let fields = |rest: &str| rest.split('\t').map(decode_field).collect::<Result<Vec<_>>>();
        let message = match command {
            "HELLO" => {
                let version = rest.strip_prefix(PROTOCOL_NAME).and_then(|v| v.strip_prefix('/'));
                let version = version
                    .ok_or_else(|| Error::Parse(format!("unexpected greeting `{line}`")))?;
                ServerMessage::Hello { version: version.to_owned() }
            }
            "OK" => ServerMessage::Ok { username: rest.to_owned() },
            "ERR" => ServerMessage::Err { message: rest.to_owned() },
            "COLUMNS" if rest.is_empty() => ServerMessage::Columns(vec![]),
            "COLUMNS" => ServerMessage::Columns(fields(rest)?.into_iter().flatten().collect()),
            "ROW" => ServerMessage::Row(fields(rest)?),
            "DONE" => ServerMessage::Done(
                rest.parse().map_err(|_| Error::Parse(format!("invalid row count `{rest}`")))?,
            ),
            "BYE" => ServerMessage::Bye,
            _ => return Err(Error::Parse(format!("unexpected server message `{line}`"))),
        };
        Ok(message)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |field: &Option<String>| match field {
            Some(s) => escape(s),
            None => NULL.to_owned(),
        };
        match self {
            ServerMessage::Hello { version } => write!(f, "HELLO {PROTOCOL_NAME}/{version}"),
            ServerMessage::Ok { username } => write!(f, "OK {username}"),
            ServerMessage::Err { message } => write!(f, "ERR {message}"),
            ServerMessage::Columns(columns) if columns.is_empty() => write!(f, "COLUMNS"),
            ServerMessage::Columns(columns) => {
                write!(f, "COLUMNS {}", columns.iter().map(|c| escape(c)).join("\t"))
            }
            ServerMessage::Row(values) => write!(f, "ROW {}", values.iter().map(field).join("\t")),
            ServerMessage::Done(n) => write!(f, "DONE {n}"),
            ServerMessage::Bye => write!(f, "BYE"),
        }
    }
}

pub fn write_message(writer: &mut impl Write, message: &ServerMessage) -> io::Result<()> {
    writeln!(writer, "{message}")
}

/// Write the `COLUMNS`, `ROW` and `DONE` lines for a successful request.
pub fn write_output(writer: &mut impl Write, output: &MaterializedQueryOutput) -> io::Result<()> {
    let columns = output.columns.iter().map(|column| escape(column)).join("\t");
    if columns.is_empty() {
        writeln!(writer, "COLUMNS")?;
    } else {
        writeln!(writer, "COLUMNS {columns}")?;
    }

    for row in &output.rows {
        writeln!(writer, "ROW {}", row.values().map(encode_value).join("\t"))?;
    }
    write_message(writer, &ServerMessage::Done(output.rows.len() as u64))?;
    writer.flush()
}
