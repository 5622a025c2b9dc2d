use std::net::SocketAddr;
use std::sync::Arc;

use gatehouse_net::{Limits, ParseErrorKind, ParseStatus, RequestParser};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, timeout_at};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::response::{failure_response, greeting_response};

const READ_BUFFER_SIZE: usize = 8192;

#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
}

#[derive(Debug)]
struct ServerState {
    limits: Limits,
    greeting: String,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = config.listen.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| ServerError::Runtime(format!("failed to bind {addr}: {err}")))?;
        tracing::info!(address = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            state: Arc::new(ServerState {
                limits: config.limits,
                greeting: config.greeting,
            }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|err| ServerError::Runtime(err.to_string()))?;
            tracing::debug!(%peer, "accepted connection");
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(err) = handle_connection(state, stream, peer).await {
                    tracing::error!(%peer, error = %err, "connection failed");
                }
            });
        }
    }
}

async fn handle_connection(
    state: Arc<ServerState>,
    mut stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), ServerError> {
    let mut parser = RequestParser::with_limits(state.limits);
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut served = 0usize;

    loop {
        let deadline = Instant::from_std(parser.deadline());
        let mut status = match timeout_at(deadline, stream.read(&mut buffer)).await {
            Ok(Ok(0)) => parser.push_eof(),
            Ok(Ok(n)) => parser.push(&buffer[..n]),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) if served > 0 && parser.is_idle() => {
                tracing::debug!(%peer, served, "closing idle keep-alive connection");
                return Ok(());
            }
            Err(_) => parser.poll_idle(),
        };

        loop {
            match status {
                ParseStatus::NeedMore { .. } => break,
                ParseStatus::Closed => {
                    tracing::debug!(%peer, served, "peer closed connection");
                    return Ok(());
                }
                ParseStatus::Complete { request } => {
                    let close = request.wants_close();
                    tracing::debug!(
                        %peer,
                        method = request.line.method.as_str(),
                        path = %request.path(),
                        body_bytes = request.body.len(),
                        "request accepted"
                    );
                    stream
                        .write_all(&greeting_response(&state.greeting, close))
                        .await?;
                    served += 1;
                    if close {
                        stream.shutdown().await?;
                        return Ok(());
                    }
                    status = parser.resume();
                }
                ParseStatus::Error { error } => {
                    let code = error.category().status();
                    if error.kind == ParseErrorKind::IdleTimeout {
                        tracing::warn!(%peer, status = code.as_u16(), "request timed out");
                    } else {
                        tracing::warn!(
                            %peer,
                            status = code.as_u16(),
                            offset = error.offset,
                            "rejected request: {}",
                            error.kind
                        );
                    }
                    stream.write_all(&failure_response(code)).await?;
                    stream.shutdown().await?;
                    return Ok(());
                }
            }
        }
    }
}
