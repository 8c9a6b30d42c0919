use std::io::{self, BufRead, Write};

use embsql::{Principal, QueryEngine};
use embsql_core::Result;

use crate::auth::{AuthError, Authenticator};
use crate::protocol::{self, ClientMessage, ServerMessage};

/// Serve a single client until it quits, hangs up, or fails to authenticate.
///
/// Errors returned by requests are reported to the client and the connection stays open.
/// Only I/O errors end the connection early.
pub fn serve(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    engine: &dyn QueryEngine,
    auth: &dyn Authenticator,
    peer: &str,
) -> io::Result<()> {
    protocol::write_message(writer, &ServerMessage::hello())?;
    writer.flush()?;

    let line = loop {
        match next_line(reader, writer)? {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line,
            None => {
                tracing::debug!(%peer, "client hung up before authenticating");
                return Ok(());
            }
        }
    };

    let principal = match authenticate(auth, &line) {
        Ok(principal) => principal,
        Err(err) => {
            tracing::info!(%peer, error = %err, "authentication failed");
            protocol::write_message(writer, &ServerMessage::error(err))?;
            return writer.flush();
        }
    };

    let username = principal.username().to_owned();
    protocol::write_message(writer, &ServerMessage::Ok { username: username.clone() })?;
    writer.flush()?;

    let mut session = engine.connect(principal);
    tracing::info!(%peer, user = %username, session = session.id(), "client authenticated");

    while let Some(line) = next_line(reader, writer)? {
        if line.trim().is_empty() {
            continue;
        }

        match ClientMessage::parse(&line) {
            Ok(ClientMessage::Quit) => {
                protocol::write_message(writer, &ServerMessage::Bye)?;
                return writer.flush();
            }
            Ok(ClientMessage::Auth(_)) => {
                protocol::write_message(writer, &ServerMessage::error("already authenticated"))?;
            }
            Ok(ClientMessage::Request(request)) => match engine.execute(&mut session, &request) {
                Ok(output) => protocol::write_output(writer, &output)?,
                Err(err) => {
                    tracing::debug!(session = session.id(), error = %err, "request failed");
                    protocol::write_message(writer, &ServerMessage::error(err))?;
                }
            },
            Err(err) => protocol::write_message(writer, &ServerMessage::error(err))?,
        }
        writer.flush()?;
    }

    tracing::debug!(session = session.id(), "client hung up");
    Ok(())
}

/// Read the next line, telling the client why before giving up on a malformed one.
fn next_line(reader: &mut impl BufRead, writer: &mut impl Write) -> io::Result<Option<String>> {
    match protocol::read_line(reader) {
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            protocol::write_message(writer, &ServerMessage::error(&err))?;
            writer.flush()?;
            Err(err)
        }
        result => result,
    }
}

fn authenticate(auth: &dyn Authenticator, line: &str) -> Result<Principal, AuthError> {
    match ClientMessage::parse(line) {
        Ok(ClientMessage::Auth(credentials)) => auth.authenticate(&credentials),
        _ => Err(AuthError::Malformed("expected `AUTH <username> <password>`".into())),
    }
}
