//! A blocking client for the line protocol.

use std::io::{self, BufReader, Write};

use crate::auth::Credentials;
use crate::listener::{LocalAddr, Stream};
use crate::protocol::{self, ClientMessage, ServerMessage};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an `ERR` line.
    #[error("server error: {0}")]
    Server(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug)]
pub struct Client {
    reader: BufReader<Stream>,
    writer: Stream,
    server_version: String,
    username: String,
}

impl Client {
    /// Connect to `addr` and authenticate.
    pub fn connect(addr: &LocalAddr, credentials: &Credentials) -> Result<Self, ClientError> {
        let writer = addr.connect()?;
        let reader = BufReader::new(writer.try_clone()?);
        let mut client =
            Self { reader, writer, server_version: String::new(), username: String::new() };

        client.server_version = match client.receive()? {
            ServerMessage::Hello { version } => version,
            message => return Err(unexpected(&message)),
        };

        client.send(&ClientMessage::Auth(credentials.clone()))?;
        client.username = match client.receive()? {
            ServerMessage::Ok { username } => username,
            ServerMessage::Err { message } => return Err(ClientError::Server(message)),
            message => return Err(unexpected(&message)),
        };
        Ok(client)
    }

    #[inline]
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send a line as-is, bypassing request validation.
    pub fn send_raw(&mut self, line: &str) -> Result<(), ClientError> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        self.send_raw(&message.to_string())
    }

    /// Read the next server message.
    pub fn receive(&mut self) -> Result<ServerMessage, ClientError> {
        let line = protocol::read_line(&mut self.reader)?.ok_or_else(|| {
            ClientError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "server hung up"))
        })?;
        ServerMessage::parse(&line).map_err(|err| ClientError::Protocol(err.to_string()))
    }

    /// Execute a request. A server side error leaves the connection usable.
    pub fn query(&mut self, request: &str) -> Result<QueryResult, ClientError> {
        if request.contains(['\n', '\r']) {
            return Err(ClientError::Protocol("requests must fit on a single line".into()));
        }
        self.send(&ClientMessage::Request(request.to_owned()))?;

        let columns = match self.receive()? {
            ServerMessage::Columns(columns) => columns,
            ServerMessage::Err { message } => return Err(ClientError::Server(message)),
            message => return Err(unexpected(&message)),
        };

        let mut result = QueryResult { columns, rows: vec![] };
        loop {
            match self.receive()? {
                ServerMessage::Row(row) => result.rows.push(row),
                ServerMessage::Done(n) if n == result.rows.len() as u64 => return Ok(result),
                ServerMessage::Done(n) => {
                    return Err(ClientError::Protocol(format!(
                        "server reported {n} rows but sent {}",
                        result.rows.len()
                    )));
                }
                message => return Err(unexpected(&message)),
            }
        }
    }

    pub fn quit(mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::Quit)?;
        match self.receive()? {
            ServerMessage::Bye => Ok(()),
            message => Err(unexpected(&message)),
        }
    }
}

fn unexpected(message: &ServerMessage) -> ClientError {
    ClientError::Protocol(format!("unexpected message `{message}`"))
}
